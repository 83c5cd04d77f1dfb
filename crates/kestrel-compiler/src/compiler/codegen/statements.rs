//! Statement compilation.
//!
//! | Statement | Key Operations | Notes |
//! |-----------|----------------|-------|
//! | expression | ..., `Pop` | result discarded |
//! | `x := v` / `x = v` | `Set{Global,Local,Free}` | `:=` defines before `v` is compiled |
//! | `m.a[i] = v` | `SetSel{Global,Local,Free}` | selectors pushed right to left |
//! | `x += v`, `x++` | load, `v`, op, store | |
//! | `if` | `JumpFalsy`, `Jump` | init statement scoped to the whole chain |
//! | `for` | `JumpFalsy`, `Jump` (back) | |
//! | `for in` | `IteratorInit`, `IteratorNext`, ... | iterator in hidden slot `:it` |
//! | `break` / `continue` | `Jump` (patched later) | |
//! | `return` | `Return`, `ReturnValue`, `TailCall` | |
//!
//! ## Control Flow Layout
//!
//! ```text
//! if init; cond { then } else { else }
//!
//!   [init]
//!   [cond]
//!   JumpFalsy -> else_label
//!   [then]
//!   Jump -> end_label
//! else_label:
//!   [else]
//! end_label:
//! ```
//!
//! ```text
//! for init; cond; post { body }
//!
//!   [init]
//! cond_label:
//!   [cond]
//!   JumpFalsy -> exit_label
//!   [body]                      ; break -> exit_label
//! post_label:                   ; continue -> post_label
//!   [post]
//!   Jump -> cond_label
//! exit_label:
//! ```
//!
//! ## Tail Position
//!
//! Every statement is compiled with a `tail` flag. Only the last statement
//! of a function body starts out in tail position; blocks pass it to their
//! last statement and `if` passes it to every branch. `return f(...)` in
//! tail position becomes `TailCall`.

use super::{CompileResult, Compiler, LoopContext, SymbolScope};
use crate::ast::*;
use crate::compiler::opcode::OpCode;
use crate::error::CompileError;
use crate::runtime::Value;
use kestrel_macros::ensure;

/// Hidden binding holding a for-in loop's iterator.
const ITERATOR_SLOT: &str = ":it";

/// Placeholder name that discards a for-in key or value.
const BLANK_IDENTIFIER: &str = "_";

/// One step of a selector chain on the left of an assignment.
enum Selector<'a> {
    Field(&'a str),
    Index(&'a Expression),
}

#[derive(Clone, Copy)]
enum Branch {
    Break,
    Continue,
}

impl Compiler {
    pub(super) fn compile_statement(&mut self, stmt: &Statement, tail: bool) -> CompileResult<()> {
        match stmt {
            Statement::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(OpCode::Pop, &[])?;
            }
            Statement::Assign(assign) => {
                self.compile_assign(&assign.target, assign.operator, &assign.value)?
            }
            Statement::IncDec(inc_dec) => {
                let operator = match inc_dec.operator {
                    UpdateOperator::Increment => AssignOperator::Add,
                    UpdateOperator::Decrement => AssignOperator::Subtract,
                };
                self.compile_assign(&inc_dec.target, operator, &Expression::int(1))?;
            }
            Statement::Block(block) => self.compile_block(block, tail)?,
            Statement::If(if_stmt) => self.compile_if(if_stmt, tail)?,
            Statement::For(for_stmt) => self.compile_for(for_stmt)?,
            Statement::ForIn(for_in) => self.compile_for_in(for_in)?,
            Statement::Return(ret) => self.compile_return(ret, tail)?,
            Statement::Break => self.compile_branch(Branch::Break)?,
            Statement::Continue => self.compile_branch(Branch::Continue)?,
            Statement::Empty => {}
        }
        Ok(())
    }

    pub(super) fn compile_block(&mut self, block: &BlockStatement, tail: bool) -> CompileResult<()> {
        if block.body.is_empty() {
            return Ok(());
        }

        self.symbols.push_block();
        let last = block.body.len() - 1;
        for (i, stmt) in block.body.iter().enumerate() {
            self.compile_statement(stmt, tail && i == last)?;
        }
        self.symbols.pop_block()
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    fn compile_assign(
        &mut self,
        target: &Expression,
        operator: AssignOperator,
        value: &Expression,
    ) -> CompileResult<()> {
        let (name, selectors) = assign_target(target)?;

        let symbol = if operator == AssignOperator::Define {
            ensure!(
                selectors.is_empty(),
                CompileError::InvalidAssignmentTarget(format!(
                    "operator ':=' not allowed with selector on '{}'",
                    name
                ))
            );
            self.symbols.define(name)?
        } else {
            let symbol = self.symbols.resolve(name)?;
            ensure!(
                symbol.scope != SymbolScope::Builtin,
                CompileError::InvalidAssignmentTarget(format!("cannot assign to builtin '{}'", name))
            );
            symbol
        };

        match compound_opcode(operator) {
            Some(op) => {
                self.compile_expression(target)?;
                self.compile_expression(value)?;
                self.emit(op, &[])?;
            }
            None => self.compile_expression(value)?,
        }

        if selectors.is_empty() {
            self.emit_store(&symbol)?;
            return Ok(());
        }

        for selector in &selectors {
            match selector {
                Selector::Field(field) => {
                    self.emit_constant(Value::string(*field))?;
                }
                Selector::Index(index) => self.compile_expression(index)?,
            }
        }
        let op = match symbol.scope {
            SymbolScope::Global => OpCode::SetSelGlobal,
            SymbolScope::Local => OpCode::SetSelLocal,
            SymbolScope::Free => OpCode::SetSelFree,
            SymbolScope::Builtin => {
                return Err(CompileError::InvalidAssignmentTarget(format!(
                    "cannot assign to builtin '{}'",
                    name
                )));
            }
        };
        self.emit(op, &[symbol.index, selectors.len()])?;
        Ok(())
    }

    // ========================================================================
    // Control Flow
    // ========================================================================

    fn compile_if(&mut self, stmt: &IfStatement, tail: bool) -> CompileResult<()> {
        self.symbols.push_block();

        if let Some(init) = &stmt.init {
            self.compile_statement(init, false)?;
        }
        self.compile_expression(&stmt.test)?;
        let else_label = self.emit_jump(OpCode::JumpFalsy)?;

        self.compile_block(&stmt.consequent, tail)?;

        match &stmt.alternate {
            Some(alternate) => {
                let end_label = self.emit_jump(OpCode::Jump)?;
                self.bind(else_label)?;
                self.compile_statement(alternate, tail)?;
                self.bind(end_label)?;
            }
            None => self.bind(else_label)?,
        }

        self.symbols.pop_block()
    }

    fn compile_for(&mut self, stmt: &ForStatement) -> CompileResult<()> {
        self.symbols.push_block();

        if let Some(init) = &stmt.init {
            self.compile_statement(init, false)?;
        }

        let cond_position = self.current_position();
        let exit_label = match &stmt.test {
            Some(test) => {
                self.compile_expression(test)?;
                Some(self.emit_jump(OpCode::JumpFalsy)?)
            }
            None => None,
        };

        self.context.loops.push(LoopContext::default());
        self.compile_block(&stmt.body, false)?;
        let pending = self.leave_loop()?;

        let post_position = self.current_position();
        if let Some(update) = &stmt.update {
            self.compile_statement(update, false)?;
        }
        self.emit_jump_to(OpCode::Jump, cond_position)?;

        let exit_position = self.current_position();
        if let Some(label) = exit_label {
            self.bind(label)?;
        }
        self.patch_loop(pending, exit_position, post_position)?;

        self.symbols.pop_block()
    }

    fn compile_for_in(&mut self, stmt: &ForInStatement) -> CompileResult<()> {
        self.symbols.push_block();

        self.compile_expression(&stmt.iterable)?;
        self.emit(OpCode::IteratorInit, &[])?;
        let iterator = self.symbols.define(ITERATOR_SLOT)?;
        self.emit_store(&iterator)?;

        let cond_position = self.current_position();
        self.emit_load(&iterator)?;
        self.emit(OpCode::IteratorNext, &[])?;
        let exit_label = self.emit_jump(OpCode::JumpFalsy)?;

        self.context.loops.push(LoopContext::default());

        if let Some(key) = bound_name(&stmt.key) {
            let symbol = self.symbols.define(key)?;
            self.emit_load(&iterator)?;
            self.emit(OpCode::IteratorKey, &[])?;
            self.emit_store(&symbol)?;
        }
        if let Some(value) = bound_name(&stmt.value) {
            let symbol = self.symbols.define(value)?;
            self.emit_load(&iterator)?;
            self.emit(OpCode::IteratorValue, &[])?;
            self.emit_store(&symbol)?;
        }

        self.compile_block(&stmt.body, false)?;
        let pending = self.leave_loop()?;

        let post_position = self.current_position();
        self.emit_jump_to(OpCode::Jump, cond_position)?;

        let exit_position = self.current_position();
        self.bind(exit_label)?;
        self.patch_loop(pending, exit_position, post_position)?;

        self.symbols.pop_block()
    }

    fn leave_loop(&mut self) -> CompileResult<LoopContext> {
        self.context
            .loops
            .pop()
            .ok_or_else(|| CompileError::Internal("loop stack is empty".into()))
    }

    fn patch_loop(
        &mut self,
        pending: LoopContext,
        exit_position: usize,
        post_position: usize,
    ) -> CompileResult<()> {
        for position in pending.breaks {
            self.patch_jump(OpCode::Jump, position, exit_position)?;
        }
        for position in pending.continues {
            self.patch_jump(OpCode::Jump, position, post_position)?;
        }
        Ok(())
    }

    fn compile_branch(&mut self, branch: Branch) -> CompileResult<()> {
        let keyword = match branch {
            Branch::Break => "break",
            Branch::Continue => "continue",
        };
        ensure!(
            !self.context.loops.is_empty(),
            CompileError::MalformedControlFlow(format!("{} not allowed outside loop", keyword))
        );

        let position = self.emit(OpCode::Jump, &[0])?;
        if let Some(pending) = self.context.loops.last_mut() {
            match branch {
                Branch::Break => pending.breaks.push(position),
                Branch::Continue => pending.continues.push(position),
            }
        }
        Ok(())
    }

    fn compile_return(&mut self, stmt: &ReturnStatement, tail: bool) -> CompileResult<()> {
        ensure!(
            self.symbols.in_function(),
            CompileError::MalformedControlFlow("return not allowed outside function".into())
        );

        match &stmt.argument {
            None => {
                self.emit(OpCode::Return, &[])?;
            }
            Some(Expression::Call(call)) if tail && self.config.tail_calls => {
                self.compile_call_operands(call)?;
                self.emit(OpCode::TailCall, &[call.arguments.len()])?;
            }
            Some(value) => {
                self.compile_expression(value)?;
                self.emit(OpCode::ReturnValue, &[])?;
            }
        }
        Ok(())
    }
}

/// Splits an assignment target into its root name and selector chain.
///
/// Selectors are collected from the right, which is also the order they are
/// pushed in.
fn assign_target(target: &Expression) -> CompileResult<(&str, Vec<Selector<'_>>)> {
    let mut selectors = Vec::new();
    let mut current = target;
    loop {
        match current {
            Expression::Identifier(ident) => return Ok((&ident.name, selectors)),
            Expression::Selector(sel) => {
                selectors.push(Selector::Field(&sel.property.name));
                current = &*sel.object;
            }
            Expression::Index(idx) => {
                selectors.push(Selector::Index(&*idx.index));
                current = &*idx.object;
            }
            other => {
                return Err(CompileError::InvalidAssignmentTarget(format!(
                    "cannot assign to {}",
                    describe(other)
                )));
            }
        }
    }
}

/// The name a for-in binding introduces; `_` binds nothing.
fn bound_name(binding: &Option<Identifier>) -> Option<&str> {
    binding
        .as_ref()
        .map(|ident| ident.name.as_str())
        .filter(|name| *name != BLANK_IDENTIFIER)
}

fn describe(expr: &Expression) -> &'static str {
    match expr {
        Expression::Literal(_) => "literal",
        Expression::Identifier(_) => "identifier",
        Expression::Array(_) => "array literal",
        Expression::Map(_) => "map literal",
        Expression::Binary(_) => "binary expression",
        Expression::Unary(_) => "unary expression",
        Expression::Conditional(_) => "conditional expression",
        Expression::Index(_) => "index expression",
        Expression::Selector(_) => "selector expression",
        Expression::Slice(_) => "slice expression",
        Expression::Call(_) => "call expression",
        Expression::Function(_) => "function literal",
    }
}

fn compound_opcode(operator: AssignOperator) -> Option<OpCode> {
    match operator {
        AssignOperator::Define | AssignOperator::Assign => None,
        AssignOperator::Add => Some(OpCode::Add),
        AssignOperator::Subtract => Some(OpCode::Sub),
        AssignOperator::Multiply => Some(OpCode::Mul),
        AssignOperator::Divide => Some(OpCode::Div),
        AssignOperator::Modulo => Some(OpCode::Rem),
        AssignOperator::BitwiseAnd => Some(OpCode::BAnd),
        AssignOperator::BitwiseOr => Some(OpCode::BOr),
        AssignOperator::BitwiseXor => Some(OpCode::BXor),
        AssignOperator::BitwiseAndNot => Some(OpCode::BAndNot),
        AssignOperator::LeftShift => Some(OpCode::BShiftLeft),
        AssignOperator::RightShift => Some(OpCode::BShiftRight),
    }
}
