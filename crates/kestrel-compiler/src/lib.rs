// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # kestrel-compiler
//!
//! The compilation core of the Kestrel embeddable scripting language.
//!
//! ## Overview
//!
//! This crate turns a parsed program into bytecode for a stack-based VM:
//! - A closed value model shared with the execution engine
//! - An instruction encoder with a fixed operand layout per opcode
//! - A symbol table resolving globals, locals, captured variables and builtins
//! - A single-pass compiler with closures and tail calls
//! - A canonical, lossless binary encoding of the compiled bytecode
//!
//! Lexing, parsing and execution live elsewhere.
//!
//! ## Quick Start
//!
//! ```rust
//! use kestrel_compiler::ast::{Expression, Program, Statement};
//! use kestrel_compiler::{Bytecode, compile};
//!
//! // f := func(x) { return x + 1 }; f(5)
//! let program = Program::new(vec![
//!     Statement::define(
//!         "f",
//!         Expression::function(
//!             &["x"],
//!             vec![Statement::return_value(Expression::binary(
//!                 kestrel_compiler::ast::BinaryOperator::Add,
//!                 Expression::ident("x"),
//!                 Expression::int(1),
//!             ))],
//!         ),
//!     ),
//!     Statement::expression(Expression::call(Expression::ident("f"), vec![Expression::int(5)])),
//! ]);
//!
//! let bytecode = compile(&program)?;
//! let bytes = bytecode.encode()?;
//! assert_eq!(Bytecode::decode(&bytes)?, bytecode);
//! # Ok::<(), kestrel_compiler::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod config;
pub mod error;
pub mod runtime;

// Re-exports for convenience
pub use compiler::{Bytecode, Compiler, Instructions, OpCode, make};
pub use config::CompilerConfig;
pub use error::{CompileError, Error, ErrorKind, InstructionError, Result, SerializationError};
pub use runtime::value::Value;

/// Compiles a program with the default configuration.
pub fn compile(program: &ast::Program) -> Result<Bytecode> {
    Compiler::new().compile(program)
}
