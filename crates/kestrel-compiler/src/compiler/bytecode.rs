//! Bytecode container.

use super::instructions::Instructions;
use super::serialize;
use crate::config::CompilerConfig;
use crate::error::SerializationError;
use crate::runtime::value::Value;
use std::fmt;
use tracing::debug;

/// The output of one compilation: the top-level instruction stream and the
/// constant pool shared by every function in the program.
///
/// A container never changes once built; it can be handed to any number of
/// execution engines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    instructions: Instructions,
    constants: Vec<Value>,
}

impl Bytecode {
    /// Creates a container.
    pub fn new(instructions: Instructions, constants: Vec<Value>) -> Self {
        Self {
            instructions,
            constants,
        }
    }

    /// The top-level instruction stream.
    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    /// The constant pool, in the order constants were first needed.
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Splits the container into its parts.
    pub fn into_parts(self) -> (Instructions, Vec<Value>) {
        (self.instructions, self.constants)
    }

    /// Encodes the container into its canonical binary form with the
    /// default configuration.
    pub fn encode(&self) -> Result<Vec<u8>, SerializationError> {
        self.encode_with_config(&CompilerConfig::default())
    }

    /// Encodes the container, bounding value nesting by
    /// `config.max_decode_depth` so that anything written can be read back
    /// with the same configuration.
    pub fn encode_with_config(&self, config: &CompilerConfig) -> Result<Vec<u8>, SerializationError> {
        let bytes = serialize::encode(self, config.max_decode_depth)?;
        debug!(
            instruction_bytes = self.instructions.len(),
            constants = self.constants.len(),
            encoded_bytes = bytes.len(),
            "encoded bytecode"
        );
        Ok(bytes)
    }

    /// Decodes a container with the default configuration.
    pub fn decode(bytes: &[u8]) -> Result<Self, SerializationError> {
        Self::decode_with_config(bytes, &CompilerConfig::default())
    }

    /// Decodes a container, bounding value nesting by
    /// `config.max_decode_depth`.
    ///
    /// Fails on truncation, unknown tags, inconsistent length prefixes,
    /// undecodable instruction streams and trailing bytes. Never returns a
    /// partially populated container.
    pub fn decode_with_config(bytes: &[u8], config: &CompilerConfig) -> Result<Self, SerializationError> {
        let bytecode = serialize::decode(bytes, config.max_decode_depth)?;
        debug!(
            encoded_bytes = bytes.len(),
            instruction_bytes = bytecode.instructions.len(),
            constants = bytecode.constants.len(),
            "decoded bytecode"
        );
        Ok(bytecode)
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instructions)?;
        for (i, constant) in self.constants.iter().enumerate() {
            match constant {
                Value::CompiledFunction(function) => {
                    writeln!(
                        f,
                        "[{:3}] compiled-function (params: {}, locals: {})",
                        i, function.num_params, function.num_locals
                    )?;
                    for line in function.instructions.to_string().lines() {
                        writeln!(f, "      {}", line)?;
                    }
                }
                other => writeln!(f, "[{:3}] {} ({})", i, other, other.type_name())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::instructions::make;
    use crate::compiler::opcode::OpCode;
    use crate::runtime::CompiledFunction;

    #[test]
    fn test_empty_round_trip() {
        let empty = Bytecode::default();
        let bytes = empty.encode().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Bytecode::decode(&bytes).unwrap(), empty);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = Bytecode::default().encode().unwrap();
        bytes.push(0);
        assert_eq!(
            Bytecode::decode(&bytes),
            Err(SerializationError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_corrupt_instruction_stream_rejected() {
        // one-byte stream holding a Constant opcode without its operand
        let bytes = [0, 0, 0, 1, OpCode::Constant as u8, 0, 0, 0, 0];
        assert!(matches!(
            Bytecode::decode(&bytes),
            Err(SerializationError::Instructions(_))
        ));
    }

    #[test]
    fn test_display() {
        let function = CompiledFunction::new(
            vec![make(OpCode::Return, &[]).unwrap()].into_iter().collect(),
            0,
            0,
        );
        let bytecode = Bytecode::new(
            vec![make(OpCode::Constant, &[0]).unwrap()].into_iter().collect(),
            vec![Value::function(function), Value::Int(3)],
        );
        assert_eq!(
            bytecode.to_string(),
            "0000 Constant 0\n\
             [  0] compiled-function (params: 0, locals: 0)\n      0000 Return\n\
             [  1] 3 (int)\n"
        );
    }
}
