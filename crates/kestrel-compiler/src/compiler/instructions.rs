//! Instruction encoding and decoding.
//!
//! [`make`] is the single place where operand widths are applied, and
//! [`InstructionDecoder`] the single place where they are read back. The
//! decoder is bounds-checked: a truncated or unknown instruction yields an
//! [`InstructionError`] rather than reading past the buffer.

use crate::compiler::opcode::OpCode;
use crate::error::InstructionError;
use kestrel_macros::ensure;
use std::fmt;

/// Largest operand value an operand field of `width` bytes can hold.
pub fn operand_limit(width: usize) -> usize {
    if width >= std::mem::size_of::<usize>() {
        usize::MAX
    } else {
        (1usize << (8 * width)) - 1
    }
}

/// Encodes one instruction.
///
/// Fails if the operand count disagrees with the opcode table or an operand
/// does not fit its width. Operands are never truncated.
pub fn make(op: OpCode, operands: &[usize]) -> Result<Vec<u8>, InstructionError> {
    let widths = op.operand_widths();
    ensure!(
        operands.len() == widths.len(),
        InstructionError::OperandCount {
            op,
            expected: widths.len(),
            actual: operands.len(),
        }
    );

    let mut out = Vec::with_capacity(op.instruction_width());
    out.push(op as u8);
    for (&operand, &width) in operands.iter().zip(widths) {
        ensure!(
            operand <= operand_limit(width),
            InstructionError::OperandOutOfRange { op, operand, width }
        );
        let bytes = (operand as u64).to_be_bytes();
        out.extend_from_slice(&bytes[bytes.len() - width..]);
    }
    Ok(out)
}

/// Reads the operands of `op` from `bytes`, which starts right after the
/// opcode byte. Returns the operands and the number of bytes consumed, or
/// `None` if `bytes` is too short.
pub fn read_operands(op: OpCode, bytes: &[u8]) -> Option<(Vec<usize>, usize)> {
    let widths = op.operand_widths();
    let mut operands = Vec::with_capacity(widths.len());
    let mut offset = 0;
    for &width in widths {
        let field = bytes.get(offset..offset + width)?;
        let value = field
            .iter()
            .fold(0usize, |acc, &byte| (acc << 8) | byte as usize);
        operands.push(value);
        offset += width;
    }
    Some((operands, offset))
}

/// An instruction decoded from a byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Byte offset of the opcode
    pub offset: usize,
    /// The operation
    pub op: OpCode,
    /// Operand values, widened to `usize`
    pub operands: Vec<usize>,
}

impl DecodedInstruction {
    /// Encoded size in bytes.
    pub fn width(&self) -> usize {
        self.op.instruction_width()
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} {}", self.offset, self.op)?;
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// Decodes the instruction starting at `offset`.
pub fn decode_at(bytes: &[u8], offset: usize) -> Result<DecodedInstruction, InstructionError> {
    let byte = bytes.get(offset).copied().ok_or(InstructionError::UnknownOpcode {
        byte: 0,
        offset,
    })?;
    let op = OpCode::try_from(byte).map_err(|byte| InstructionError::UnknownOpcode { byte, offset })?;
    let (operands, _) = read_operands(op, &bytes[offset + 1..])
        .ok_or(InstructionError::Truncated { op, offset })?;
    Ok(DecodedInstruction {
        offset,
        op,
        operands,
    })
}

/// Iterates over the instructions in a byte stream.
///
/// Yields at most one error, after which iteration stops.
pub struct InstructionDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> InstructionDecoder<'a> {
    /// Creates a decoder positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Current byte offset in the stream.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Whether the decoder has reached the end of the stream.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

impl Iterator for InstructionDecoder<'_> {
    type Item = Result<DecodedInstruction, InstructionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_at_end() {
            return None;
        }
        match decode_at(self.bytes, self.pos) {
            Ok(instruction) => {
                self.pos += instruction.width();
                Some(Ok(instruction))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// A flat, encoded instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Instructions(Vec<u8>);

impl Instructions {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the stream, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the stream holds no instructions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends an encoded instruction and returns its offset.
    pub fn push(&mut self, encoded: &[u8]) -> usize {
        let position = self.0.len();
        self.0.extend_from_slice(encoded);
        position
    }

    /// Overwrites the instruction at `position` with one of equal width.
    pub(crate) fn replace(&mut self, position: usize, encoded: &[u8]) {
        self.0[position..position + encoded.len()].copy_from_slice(encoded);
    }

    /// Iterates over the decoded instructions.
    pub fn iter(&self) -> InstructionDecoder<'_> {
        InstructionDecoder::new(&self.0)
    }

    /// Checks that the stream decodes cleanly from start to end.
    pub fn validate(&self) -> Result<(), InstructionError> {
        self.iter().try_for_each(|instruction| instruction.map(drop))
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Instructions(bytes)
    }
}

impl FromIterator<Vec<u8>> for Instructions {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Instructions(iter.into_iter().flatten().collect())
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decoder = self.iter();
        while let Some(instruction) = decoder.next() {
            match instruction {
                Ok(instruction) => writeln!(f, "{}", instruction)?,
                Err(err) => writeln!(f, "{:04} <{}>", decoder.offset(), err)?,
            }
        }
        Ok(())
    }
}
