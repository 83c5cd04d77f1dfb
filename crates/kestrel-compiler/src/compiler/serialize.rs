//! Binary encoding of bytecode containers.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! container := u32 instruction_len, bytes, u32 constant_count, value*
//! value     := u8 tag, payload
//!
//! tag payload
//!  0  Undefined         (none)
//!  1  Int               i64
//!  2  Float             u64 (IEEE-754 bits)
//!  3  String            u32 len, UTF-8
//!  4  Bool              u8 (0 or 1)
//!  5  Char              u32 len, UTF-8 of one scalar value
//!  6  Array             u32 count, value*
//!  7  Map               u32 count, (u32 len, UTF-8 key, value)*  keys ascending
//!  8  CompiledFunction  u32 params, u32 locals, u32 len, instructions
//!  9  Closure           function payload, u32 count, value*
//! ```
//!
//! Map entries are written in key order, so equal containers always encode
//! to identical bytes.

use crate::compiler::bytecode::Bytecode;
use crate::compiler::instructions::Instructions;
use crate::error::SerializationError;
use crate::runtime::{Closure, CompiledFunction, Value, ValueKind};
use kestrel_macros::ensure;
use rustc_hash::FxHashMap;
use std::sync::Arc;

type SerializeResult<T> = Result<T, SerializationError>;

/// Upper bound on capacity reserved from an untrusted count prefix.
const MAX_PREALLOCATION: usize = 4096;

/// Encodes a container, refusing values nested deeper than `max_depth`.
pub(crate) fn encode(bytecode: &Bytecode, max_depth: usize) -> SerializeResult<Vec<u8>> {
    let mut writer = Writer::new(max_depth);
    writer.instructions(bytecode.instructions())?;
    writer.len("constant pool", bytecode.constants().len())?;
    for constant in bytecode.constants() {
        writer.value(constant, 0)?;
    }
    Ok(writer.buf)
}

/// Decodes a container, rejecting anything but one exact encoding.
pub(crate) fn decode(bytes: &[u8], max_depth: usize) -> SerializeResult<Bytecode> {
    let mut reader = Reader::new(bytes, max_depth);
    let instructions = reader.instructions()?;
    let count = reader.count()?;
    let mut constants = Vec::with_capacity(count.min(MAX_PREALLOCATION));
    for _ in 0..count {
        constants.push(reader.value(0)?);
    }
    ensure!(
        reader.remaining() == 0,
        SerializationError::TrailingBytes(reader.remaining())
    );
    Ok(Bytecode::new(instructions, constants))
}

struct Writer {
    buf: Vec<u8>,
    max_depth: usize,
}

impl Writer {
    fn new(max_depth: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_depth,
        }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Writes a length or count, failing if it needs more than 32 bits.
    fn len(&mut self, what: &'static str, len: usize) -> SerializeResult<()> {
        let v = u32::try_from(len).map_err(|_| SerializationError::TooLarge { what, len })?;
        self.u32(v);
        Ok(())
    }

    fn bytes(&mut self, what: &'static str, bytes: &[u8]) -> SerializeResult<()> {
        self.len(what, bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn instructions(&mut self, instructions: &Instructions) -> SerializeResult<()> {
        self.bytes("instruction stream", instructions.as_bytes())
    }

    fn function(&mut self, function: &CompiledFunction) -> SerializeResult<()> {
        self.len("parameter count", function.num_params)?;
        self.len("local count", function.num_locals)?;
        self.instructions(&function.instructions)
    }

    fn values(&mut self, what: &'static str, values: &[Value], depth: usize) -> SerializeResult<()> {
        self.len(what, values.len())?;
        values.iter().try_for_each(|value| self.value(value, depth + 1))
    }

    /// Writes one value. Nesting is bounded the same way the reader bounds it.
    fn value(&mut self, value: &Value, depth: usize) -> SerializeResult<()> {
        ensure!(
            depth <= self.max_depth,
            SerializationError::NestingTooDeep {
                limit: self.max_depth
            }
        );

        self.u8(value.kind() as u8);
        match value {
            Value::Undefined => {}
            Value::Int(n) => self.buf.extend_from_slice(&n.to_be_bytes()),
            Value::Float(n) => self.buf.extend_from_slice(&n.to_bits().to_be_bytes()),
            Value::String(s) => self.bytes("string", s.as_bytes())?,
            Value::Bool(b) => self.u8(u8::from(*b)),
            Value::Char(c) => {
                let mut utf8 = [0; 4];
                self.bytes("char", c.encode_utf8(&mut utf8).as_bytes())?;
            }
            Value::Array(items) => self.values("array", &items.read(), depth)?,
            Value::Map(entries) => {
                let entries = entries.read();
                let mut sorted: Vec<(&String, &Value)> = entries.iter().collect();
                sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
                self.len("map", sorted.len())?;
                for (key, value) in sorted {
                    self.bytes("map key", key.as_bytes())?;
                    self.value(value, depth + 1)?;
                }
            }
            Value::CompiledFunction(function) => self.function(function)?,
            Value::Closure(closure) => {
                self.function(&closure.func)?;
                self.values("captured values", &closure.free, depth)?;
            }
        }
        Ok(())
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            data,
            pos: 0,
            max_depth,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> SerializeResult<&'a [u8]> {
        ensure!(
            needed <= self.remaining(),
            SerializationError::Truncated {
                offset: self.pos,
                needed,
                remaining: self.remaining(),
            }
        );
        let bytes = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> SerializeResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> SerializeResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> SerializeResult<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn i64(&mut self) -> SerializeResult<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    fn f64(&mut self) -> SerializeResult<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(self.array()?)))
    }

    /// Reads a count prefix. Every counted item takes at least one byte, so
    /// a count larger than the rest of the buffer is already corrupt.
    fn count(&mut self) -> SerializeResult<usize> {
        let offset = self.pos;
        let declared = self.u32()? as usize;
        ensure!(
            declared <= self.remaining(),
            SerializationError::LengthOverflow {
                offset,
                declared,
                remaining: self.remaining(),
            }
        );
        Ok(declared)
    }

    /// Reads a length-prefixed byte run.
    fn bytes(&mut self) -> SerializeResult<&'a [u8]> {
        let len = self.count()?;
        self.take(len)
    }

    fn str(&mut self) -> SerializeResult<&'a str> {
        let offset = self.pos;
        let bytes = self.bytes()?;
        std::str::from_utf8(bytes).map_err(|_| SerializationError::InvalidUtf8 { offset })
    }

    fn instructions(&mut self) -> SerializeResult<Instructions> {
        let instructions = Instructions::from(self.bytes()?.to_vec());
        instructions.validate()?;
        Ok(instructions)
    }

    fn function(&mut self) -> SerializeResult<CompiledFunction> {
        let num_params = self.u32()? as usize;
        let num_locals = self.u32()? as usize;
        let instructions = self.instructions()?;
        Ok(CompiledFunction::new(instructions, num_params, num_locals))
    }

    fn values(&mut self, depth: usize) -> SerializeResult<Vec<Value>> {
        let count = self.count()?;
        let mut values = Vec::with_capacity(count.min(MAX_PREALLOCATION));
        for _ in 0..count {
            values.push(self.value(depth + 1)?);
        }
        Ok(values)
    }

    fn value(&mut self, depth: usize) -> SerializeResult<Value> {
        ensure!(
            depth <= self.max_depth,
            SerializationError::NestingTooDeep {
                limit: self.max_depth
            }
        );

        let offset = self.pos;
        let tag = self.u8()?;
        let kind =
            ValueKind::try_from(tag).map_err(|tag| SerializationError::UnknownTag { tag, offset })?;

        let value = match kind {
            ValueKind::Undefined => Value::Undefined,
            ValueKind::Int => Value::Int(self.i64()?),
            ValueKind::Float => Value::Float(self.f64()?),
            ValueKind::String => Value::string(self.str()?),
            ValueKind::Bool => {
                let offset = self.pos;
                match self.u8()? {
                    0 => Value::Bool(false),
                    1 => Value::Bool(true),
                    byte => return Err(SerializationError::InvalidBool { byte, offset }),
                }
            }
            ValueKind::Char => {
                let offset = self.pos;
                let mut chars = self.str()?.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => return Err(SerializationError::InvalidChar { offset }),
                }
            }
            ValueKind::Array => Value::array(self.values(depth)?),
            ValueKind::Map => {
                let count = self.count()?;
                let mut entries = FxHashMap::default();
                entries.reserve(count.min(MAX_PREALLOCATION));
                for _ in 0..count {
                    let offset = self.pos;
                    let key = self.str()?.to_string();
                    let value = self.value(depth + 1)?;
                    if entries.contains_key(&key) {
                        return Err(SerializationError::DuplicateKey { key, offset });
                    }
                    entries.insert(key, value);
                }
                Value::map(entries)
            }
            ValueKind::CompiledFunction => Value::function(self.function()?),
            ValueKind::Closure => {
                let func = Arc::new(self.function()?);
                let free = self.values(depth)?;
                Value::closure(Closure::new(func, free))
            }
        };
        Ok(value)
    }
}
