//! Expression compilation.
//!
//! Every expression leaves exactly one value on the stack.
//!
//! | Expression | Key Operations | Stack Effect |
//! |------------|----------------|--------------|
//! | Literal | `Constant`, `True`, `False`, `Null` | Push value |
//! | Identifier | `GetGlobal`/`GetLocal`/`GetFree`/`GetBuiltin` | Push value |
//! | Binary | `Add`/`Sub`/etc | Pop 2, push 1 |
//! | `&&` / `\|\|` | `AndJump` / `OrJump` | Short-circuit |
//! | Unary | `Minus`/`LNot`/`BComplement` | Pop 1, push 1 |
//! | Array | `Array n` | Pop n, push 1 |
//! | Map | `Map 2n` | Pop 2n, push 1 |
//! | Index / Selector | `Index` | Pop 2, push 1 |
//! | Slice | `SliceIndex` | Pop 3, push 1 |
//! | Call | `Call argc` | Pop argc + 1, push result |
//! | Function | `Constant` or `Closure` | Push callable |
//! | Conditional | `JumpFalsy`, `Jump` | Pop 1, push 1 |
//!
//! `a < b` is emitted as `b > a` (and `<=` as swapped `>=`), so the VM only
//! implements the two greater-than comparisons.

use super::{CompileResult, Compiler};
use crate::ast::*;
use crate::compiler::opcode::OpCode;
use crate::error::CompileError;
use crate::runtime::Value;
use kestrel_macros::ensure;

impl Compiler {
    pub(super) fn compile_expression(&mut self, expr: &Expression) -> CompileResult<()> {
        match expr {
            Expression::Literal(literal) => self.compile_literal(literal)?,
            Expression::Identifier(ident) => {
                let symbol = self.symbols.resolve(&ident.name)?;
                self.emit_load(&symbol)?;
            }
            Expression::Array(array) => {
                for element in &array.elements {
                    self.compile_expression(element)?;
                }
                self.emit(OpCode::Array, &[array.elements.len()])?;
            }
            Expression::Map(map) => {
                for element in &map.elements {
                    self.emit_constant(Value::string(element.key.as_str()))?;
                    self.compile_expression(&element.value)?;
                }
                self.emit(OpCode::Map, &[map.elements.len() * 2])?;
            }
            Expression::Binary(binary) => self.compile_binary(binary)?,
            Expression::Unary(unary) => {
                self.compile_expression(&unary.argument)?;
                match unary.operator {
                    UnaryOperator::Minus => {
                        self.emit(OpCode::Minus, &[])?;
                    }
                    UnaryOperator::LogicalNot => {
                        self.emit(OpCode::LNot, &[])?;
                    }
                    UnaryOperator::BitwiseNot => {
                        self.emit(OpCode::BComplement, &[])?;
                    }
                    UnaryOperator::Plus => {}
                }
            }
            Expression::Conditional(cond) => {
                self.compile_expression(&cond.test)?;
                let else_label = self.emit_jump(OpCode::JumpFalsy)?;
                self.compile_expression(&cond.consequent)?;
                let end_label = self.emit_jump(OpCode::Jump)?;
                self.bind(else_label)?;
                self.compile_expression(&cond.alternate)?;
                self.bind(end_label)?;
            }
            Expression::Index(index) => {
                self.compile_expression(&index.object)?;
                self.compile_expression(&index.index)?;
                self.emit(OpCode::Index, &[])?;
            }
            Expression::Selector(selector) => {
                self.compile_expression(&selector.object)?;
                self.emit_constant(Value::string(selector.property.name.as_str()))?;
                self.emit(OpCode::Index, &[])?;
            }
            Expression::Slice(slice) => self.compile_slice(slice)?,
            Expression::Call(call) => {
                self.compile_call_operands(call)?;
                self.emit(OpCode::Call, &[call.arguments.len()])?;
            }
            Expression::Function(function) => self.compile_function(function)?,
        }
        Ok(())
    }

    fn compile_literal(&mut self, literal: &Literal) -> CompileResult<()> {
        match literal {
            Literal::Int(n) => self.emit_constant(Value::Int(*n))?,
            Literal::Float(n) => self.emit_constant(Value::Float(*n))?,
            Literal::String(s) => self.emit_constant(Value::string(s.as_str()))?,
            Literal::Char(c) => self.emit_constant(Value::Char(*c))?,
            Literal::Bool(true) => self.emit(OpCode::True, &[])?,
            Literal::Bool(false) => self.emit(OpCode::False, &[])?,
            Literal::Undefined => self.emit(OpCode::Null, &[])?,
        };
        Ok(())
    }

    fn compile_binary(&mut self, expr: &BinaryExpression) -> CompileResult<()> {
        let op = match expr.operator {
            BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => {
                let jump = if expr.operator == BinaryOperator::LogicalAnd {
                    OpCode::AndJump
                } else {
                    OpCode::OrJump
                };
                self.compile_expression(&expr.left)?;
                let end_label = self.emit_jump(jump)?;
                self.compile_expression(&expr.right)?;
                return self.bind(end_label);
            }
            BinaryOperator::LessThan | BinaryOperator::LessThanEqual => {
                self.compile_expression(&expr.right)?;
                self.compile_expression(&expr.left)?;
                let op = if expr.operator == BinaryOperator::LessThan {
                    OpCode::GreaterThan
                } else {
                    OpCode::GreaterThanEqual
                };
                self.emit(op, &[])?;
                return Ok(());
            }
            BinaryOperator::Add => OpCode::Add,
            BinaryOperator::Subtract => OpCode::Sub,
            BinaryOperator::Multiply => OpCode::Mul,
            BinaryOperator::Divide => OpCode::Div,
            BinaryOperator::Modulo => OpCode::Rem,
            BinaryOperator::BitwiseAnd => OpCode::BAnd,
            BinaryOperator::BitwiseOr => OpCode::BOr,
            BinaryOperator::BitwiseXor => OpCode::BXor,
            BinaryOperator::BitwiseAndNot => OpCode::BAndNot,
            BinaryOperator::LeftShift => OpCode::BShiftLeft,
            BinaryOperator::RightShift => OpCode::BShiftRight,
            BinaryOperator::Equal => OpCode::Equal,
            BinaryOperator::NotEqual => OpCode::NotEqual,
            BinaryOperator::GreaterThan => OpCode::GreaterThan,
            BinaryOperator::GreaterThanEqual => OpCode::GreaterThanEqual,
        };

        self.compile_expression(&expr.left)?;
        self.compile_expression(&expr.right)?;
        self.emit(op, &[])?;
        Ok(())
    }

    /// Pushes the container, then each bound or `undefined` in its place.
    fn compile_slice(&mut self, expr: &SliceExpression) -> CompileResult<()> {
        check_slice_bounds(expr.low.as_deref(), expr.high.as_deref())?;

        self.compile_expression(&expr.object)?;
        for bound in [&expr.low, &expr.high] {
            match bound {
                Some(bound) => self.compile_expression(bound)?,
                None => {
                    self.emit(OpCode::Null, &[])?;
                }
            }
        }
        self.emit(OpCode::SliceIndex, &[])?;
        Ok(())
    }

    /// Pushes the callee followed by its arguments, left to right.
    pub(super) fn compile_call_operands(&mut self, call: &CallExpression) -> CompileResult<()> {
        self.compile_expression(&call.callee)?;
        for argument in &call.arguments {
            self.compile_expression(argument)?;
        }
        Ok(())
    }
}

/// Rejects literal bounds that no runtime value could make valid.
fn check_slice_bounds(low: Option<&Expression>, high: Option<&Expression>) -> CompileResult<()> {
    fn literal_bound(bound: Option<&Expression>) -> CompileResult<Option<i64>> {
        match bound {
            Some(Expression::Literal(Literal::Int(n))) => Ok(Some(*n)),
            Some(Expression::Literal(other)) => Err(CompileError::MalformedSlice(format!(
                "non-integer bound {:?}",
                other
            ))),
            _ => Ok(None),
        }
    }

    if let (Some(low), Some(high)) = (literal_bound(low)?, literal_bound(high)?) {
        ensure!(
            low <= high,
            CompileError::MalformedSlice(format!("low bound {} exceeds high bound {}", low, high))
        );
    }
    Ok(())
}
