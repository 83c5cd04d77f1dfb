//! Runtime value types shared by the compiler and its consumers.

pub mod function;
pub mod value;

pub use function::{Closure, CompiledFunction};
pub use value::{Value, ValueKind};
