//! Bytecode compiler for Kestrel.
//!
//! Transforms AST into bytecode that can be executed by the VM.
//!
//! # Module Structure
//!
//! - `opcode`: the opcode table and operand widths
//! - `instructions`: instruction encoding, decoding and disassembly
//! - `bytecode`: the compiled container
//! - `serialize`: the container's binary encoding
//! - `codegen`: code generation from AST
//!   - `codegen::scope`: symbol resolution and closure captures

pub mod bytecode;
pub mod codegen;
pub mod instructions;
pub mod opcode;
mod serialize;

pub use bytecode::Bytecode;
pub use codegen::{Compiler, Symbol, SymbolScope, SymbolTable};
pub use instructions::{DecodedInstruction, InstructionDecoder, Instructions, decode_at, make, read_operands};
pub use opcode::OpCode;
