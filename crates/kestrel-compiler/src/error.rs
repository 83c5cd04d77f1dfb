//! Error types for compilation and bytecode serialization.
//!
//! Compilation and decoding both abort on the first error; neither produces
//! partial output.

use thiserror::Error;

use crate::compiler::opcode::OpCode;

/// Result type for compiler and serializer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The program could not be compiled
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A serialized bytecode stream could not be encoded or decoded
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl Error {
    /// The failure kind, independent of the message details.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Compile(err) => err.kind(),
            Error::Serialization(_) => ErrorKind::SerializationCorruption,
        }
    }
}

/// Coarse classification of every failure this crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A name resolved to no binding
    UnresolvedIdentifier,
    /// Assignment to something that is not an lvalue
    InvalidAssignmentTarget,
    /// `break`/`continue` outside a loop, `return` outside a function
    MalformedControlFlow,
    /// A name defined twice in the same scope
    Redeclared,
    /// Slice bounds that can never be valid
    MalformedSlice,
    /// An operand that does not fit its encoded width
    OperandOverflow,
    /// Invariant violation inside the compiler itself
    Internal,
    /// A byte stream that is not a valid encoded container
    SerializationCorruption,
}

/// A compile-time failure.
///
/// Errors carry no source position; positions belong to the parser layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Resolve found no lexical or builtin binding
    #[error("unresolved reference '{0}'")]
    UnresolvedIdentifier(String),

    /// Assignment to a non-assignable expression
    #[error("invalid assignment target: {0}")]
    InvalidAssignmentTarget(String),

    /// Control-flow statement in a position where it has no target
    #[error("{0}")]
    MalformedControlFlow(String),

    /// Name already defined in the current scope
    #[error("'{0}' redeclared in this block")]
    Redeclared(String),

    /// Slice expression with impossible constant bounds
    #[error("malformed slice: {0}")]
    MalformedSlice(String),

    /// Operand exceeds what its encoded width can hold
    #[error("operand {operand} of {op} exceeds limit {limit}")]
    OperandOverflow {
        /// The instruction being emitted
        op: OpCode,
        /// The offending operand
        operand: usize,
        /// Largest encodable value
        limit: usize,
    },

    /// Broken compiler invariant
    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    /// The failure kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::UnresolvedIdentifier(_) => ErrorKind::UnresolvedIdentifier,
            CompileError::InvalidAssignmentTarget(_) => ErrorKind::InvalidAssignmentTarget,
            CompileError::MalformedControlFlow(_) => ErrorKind::MalformedControlFlow,
            CompileError::Redeclared(_) => ErrorKind::Redeclared,
            CompileError::MalformedSlice(_) => ErrorKind::MalformedSlice,
            CompileError::OperandOverflow { .. } => ErrorKind::OperandOverflow,
            CompileError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<InstructionError> for CompileError {
    fn from(err: InstructionError) -> Self {
        match err {
            InstructionError::OperandOutOfRange { op, operand, width } => {
                CompileError::OperandOverflow {
                    op,
                    operand,
                    limit: crate::compiler::instructions::operand_limit(width),
                }
            }
            other => CompileError::Internal(other.to_string()),
        }
    }
}

/// Failure to encode or decode a single instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    /// Byte does not name an opcode
    #[error("unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode {
        /// The unrecognized byte
        byte: u8,
        /// Offset of the byte in the stream
        offset: usize,
    },

    /// Wrong number of operands passed to the encoder
    #[error("{op} expects {expected} operand(s), got {actual}")]
    OperandCount {
        /// The instruction being encoded
        op: OpCode,
        /// Operand count from the opcode table
        expected: usize,
        /// Operand count supplied
        actual: usize,
    },

    /// Operand too large for its encoded width
    #[error("operand {operand} of {op} does not fit in {width} byte(s)")]
    OperandOutOfRange {
        /// The instruction being encoded
        op: OpCode,
        /// The offending operand
        operand: usize,
        /// Width of the operand field in bytes
        width: usize,
    },

    /// Stream ends inside an instruction's operands
    #[error("truncated {op} instruction at offset {offset}")]
    Truncated {
        /// The partially present instruction
        op: OpCode,
        /// Offset of its opcode byte
        offset: usize,
    },
}

/// Failure to encode or decode a bytecode container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Input ends before a fixed-width field
    #[error("unexpected end of input at offset {offset}: needed {needed} byte(s), {remaining} remaining")]
    Truncated {
        /// Read position
        offset: usize,
        /// Bytes the field requires
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// Length or count prefix larger than the rest of the buffer
    #[error("length prefix {declared} at offset {offset} exceeds the {remaining} remaining byte(s)")]
    LengthOverflow {
        /// Position of the prefix
        offset: usize,
        /// Declared length or count
        declared: usize,
        /// Bytes left after the prefix
        remaining: usize,
    },

    /// Value tag byte outside the known set
    #[error("unknown value tag {tag} at offset {offset}")]
    UnknownTag {
        /// The unrecognized tag
        tag: u8,
        /// Position of the tag byte
        offset: usize,
    },

    /// Bool payload other than 0 or 1
    #[error("invalid bool byte {byte} at offset {offset}")]
    InvalidBool {
        /// The payload byte
        byte: u8,
        /// Position of the payload byte
        offset: usize,
    },

    /// String or key payload is not UTF-8
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 {
        /// Start of the payload
        offset: usize,
    },

    /// Char payload is not exactly one code point
    #[error("char payload at offset {offset} is not exactly one code point")]
    InvalidChar {
        /// Start of the payload
        offset: usize,
    },

    /// Map payload repeats a key
    #[error("duplicate map key '{key}' at offset {offset}")]
    DuplicateKey {
        /// The repeated key
        key: String,
        /// Position of the second occurrence
        offset: usize,
    },

    /// Values nested beyond the configured depth
    #[error("values nested deeper than {limit} levels")]
    NestingTooDeep {
        /// Configured nesting limit
        limit: usize,
    },

    /// Bytes left over after the constant pool
    #[error("{0} trailing byte(s) after the constant pool")]
    TrailingBytes(usize),

    /// An embedded instruction stream does not decode
    #[error("corrupt instruction stream: {0}")]
    Instructions(#[from] InstructionError),

    /// A length that the 32-bit length field cannot represent (encode only)
    #[error("{what} of {len} does not fit a 32-bit length field")]
    TooLarge {
        /// What was being measured
        what: &'static str,
        /// The measured length
        len: usize,
    },
}
