//! Code generation from AST to bytecode.
//!
//! This module contains the [`Compiler`], which walks a parsed [`Program`]
//! once and produces a [`Bytecode`] container: the top-level instruction
//! stream plus a constant pool shared by every function in the program.
//!
//! # Module Structure
//!
//! - `scope`: symbol table and scope tree
//! - `statements`: statement compilation
//! - `expressions`: expression compilation

mod expressions;
mod scope;
mod statements;


pub use scope::{FunctionScope, Symbol, SymbolScope, SymbolTable};

use crate::ast::{FunctionLiteral, Program};
use crate::compiler::bytecode::Bytecode;
use crate::compiler::instructions::{Instructions, make};
use crate::compiler::opcode::OpCode;
use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::runtime::{CompiledFunction, Value};
use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

type CompileResult<T> = std::result::Result<T, CompileError>;

/// The last instruction written to a function's buffer.
#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    op: OpCode,
    position: usize,
}

/// A forward jump whose target is not known yet.
#[derive(Debug)]
#[must_use = "a jump label must be bound"]
struct Label {
    op: OpCode,
    position: usize,
}

/// Pending `break`/`continue` jumps of one loop.
#[derive(Debug, Default)]
struct LoopContext {
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

/// Per-function emission state.
#[derive(Debug, Default)]
struct FunctionContext {
    instructions: Instructions,
    last: Option<EmittedInstruction>,
    /// Every offset some jump in this function lands on
    jump_targets: FxHashSet<usize>,
    loops: Vec<LoopContext>,
}

/// Compiles AST to bytecode.
///
/// A compiler holds the state of exactly one compilation and is consumed by
/// [`Compiler::compile`].
#[derive(Debug)]
pub struct Compiler {
    config: CompilerConfig,
    /// Constant pool shared by all functions of the program
    constants: Vec<Value>,
    symbols: SymbolTable,
    /// The function currently being emitted
    context: FunctionContext,
    /// Suspended contexts of the enclosing functions, innermost last
    enclosing: Vec<FunctionContext>,
}

impl Compiler {
    /// Creates a new compiler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    /// Creates a new compiler with the given configuration.
    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            config,
            constants: Vec::new(),
            symbols: SymbolTable::new(),
            context: FunctionContext::default(),
            enclosing: Vec::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    // ========================================================================
    // Main Compilation Entry Point
    // ========================================================================

    /// Compiles a program AST to bytecode.
    ///
    /// Stops at the first error; no partial bytecode is returned.
    #[instrument(skip_all, fields(statements = program.body.len()))]
    pub fn compile(mut self, program: &Program) -> Result<Bytecode> {
        debug!(tail_calls = self.config.tail_calls, "compiling program");

        for stmt in &program.body {
            self.compile_statement(stmt, false)?;
        }

        let bytecode = Bytecode::new(self.context.instructions, self.constants);
        debug!(
            instruction_bytes = bytecode.instructions().len(),
            constants = bytecode.constants().len(),
            globals = self.symbols.num_globals(),
            "compiled program"
        );
        Ok(bytecode)
    }

    // ========================================================================
    // Emission
    // ========================================================================

    /// Encodes and appends one instruction, returning its offset.
    fn emit(&mut self, op: OpCode, operands: &[usize]) -> CompileResult<usize> {
        let encoded = make(op, operands)?;
        let position = self.context.instructions.push(&encoded);
        self.context.last = Some(EmittedInstruction { op, position });
        Ok(position)
    }

    /// Appends `value` to the constant pool and returns its index.
    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn emit_constant(&mut self, value: Value) -> CompileResult<usize> {
        let index = self.add_constant(value);
        self.emit(OpCode::Constant, &[index])
    }

    /// Offset the next instruction will be written at.
    fn current_position(&self) -> usize {
        self.context.instructions.len()
    }

    /// Emits a jump with a placeholder target.
    fn emit_jump(&mut self, op: OpCode) -> CompileResult<Label> {
        let position = self.emit(op, &[0])?;
        Ok(Label { op, position })
    }

    /// Emits a jump to an already known offset.
    fn emit_jump_to(&mut self, op: OpCode, target: usize) -> CompileResult<usize> {
        let position = self.emit(op, &[target])?;
        self.context.jump_targets.insert(target);
        Ok(position)
    }

    /// Points `label` at the current end of the stream.
    fn bind(&mut self, label: Label) -> CompileResult<()> {
        let target = self.current_position();
        self.patch_jump(label.op, label.position, target)
    }

    /// Overwrites the target of the jump at `position`.
    fn patch_jump(&mut self, op: OpCode, position: usize, target: usize) -> CompileResult<()> {
        let encoded = make(op, &[target])?;
        self.context.instructions.replace(position, &encoded);
        self.context.jump_targets.insert(target);
        Ok(())
    }

    fn emit_load(&mut self, symbol: &Symbol) -> CompileResult<usize> {
        let op = match symbol.scope {
            SymbolScope::Global => OpCode::GetGlobal,
            SymbolScope::Local => OpCode::GetLocal,
            SymbolScope::Free => OpCode::GetFree,
            SymbolScope::Builtin => OpCode::GetBuiltin,
        };
        self.emit(op, &[symbol.index])
    }

    fn emit_store(&mut self, symbol: &Symbol) -> CompileResult<usize> {
        let op = match symbol.scope {
            SymbolScope::Global => OpCode::SetGlobal,
            SymbolScope::Local => OpCode::SetLocal,
            SymbolScope::Free => OpCode::SetFree,
            SymbolScope::Builtin => {
                return Err(CompileError::InvalidAssignmentTarget(format!(
                    "cannot assign to builtin '{}'",
                    symbol.name
                )));
            }
        };
        self.emit(op, &[symbol.index])
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn enter_function(&mut self) {
        self.symbols.push_function();
        let outer = std::mem::take(&mut self.context);
        self.enclosing.push(outer);
    }

    fn leave_function(&mut self) -> CompileResult<(Instructions, FunctionScope)> {
        let scope = self.symbols.pop_function()?;
        let outer = self
            .enclosing
            .pop()
            .ok_or_else(|| CompileError::Internal("no enclosing function context".into()))?;
        let finished = std::mem::replace(&mut self.context, outer);
        Ok((finished.instructions, scope))
    }

    /// A function body needs a trailing `Return` unless its last instruction
    /// already leaves the frame and no jump lands past it.
    fn needs_implicit_return(&self) -> bool {
        match self.context.last {
            Some(last) if last.op.is_return() => {
                let end = self.current_position();
                debug_assert!(last.position < end);
                self.context.jump_targets.contains(&end)
            }
            _ => true,
        }
    }

    /// Compiles a function literal into the shared constant pool and emits
    /// the code that pushes it: a plain `Constant`, or the captured values
    /// followed by `Closure`.
    fn compile_function(&mut self, function: &FunctionLiteral) -> CompileResult<()> {
        self.enter_function();
        for param in &function.params {
            self.symbols.define(&param.name)?;
        }
        self.compile_block(&function.body, true)?;
        if self.needs_implicit_return() {
            self.emit(OpCode::Return, &[])?;
        }
        let (instructions, scope) = self.leave_function()?;

        debug!(
            params = function.params.len(),
            locals = scope.num_locals,
            free = scope.free_symbols.len(),
            instruction_bytes = instructions.len(),
            "compiled function"
        );

        let compiled = CompiledFunction::new(instructions, function.params.len(), scope.num_locals);
        let index = self.add_constant(Value::function(compiled));

        if scope.free_symbols.is_empty() {
            self.emit(OpCode::Constant, &[index])?;
        } else {
            for symbol in &scope.free_symbols {
                self.emit_load(symbol)?;
            }
            self.emit(OpCode::Closure, &[index, scope.free_symbols.len()])?;
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
