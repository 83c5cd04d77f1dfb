//! Compiled function representation.

use super::value::Value;
use crate::compiler::instructions::Instructions;
use std::sync::Arc;

/// A function body produced by the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFunction {
    /// The function's own instruction stream
    pub instructions: Instructions,
    /// Number of declared parameters
    pub num_params: usize,
    /// Local slots needed, parameters included
    pub num_locals: usize,
}

impl CompiledFunction {
    /// Creates a new compiled function.
    pub fn new(instructions: Instructions, num_params: usize, num_locals: usize) -> Self {
        Self {
            instructions,
            num_params,
            num_locals,
        }
    }
}

/// A compiled function paired with the values it captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    /// The function body
    pub func: Arc<CompiledFunction>,
    /// Captured values, in free-index order
    pub free: Vec<Value>,
}

impl Closure {
    /// Creates a new closure.
    pub fn new(func: Arc<CompiledFunction>, free: Vec<Value>) -> Self {
        Self { func, free }
    }
}
