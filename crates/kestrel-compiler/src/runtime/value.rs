//! Script value representation.

use super::function::{Closure, CompiledFunction};
use kestrel_macros::int_enum;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

int_enum! {
    /// Type of a [`Value`].
    ///
    /// The discriminant doubles as the value's tag byte in encoded bytecode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ValueKind: u8 {
        /// `undefined`
        Undefined = 0,
        /// 64-bit signed integer
        Int = 1,
        /// 64-bit float
        Float = 2,
        /// Immutable string
        String = 3,
        /// Boolean
        Bool = 4,
        /// Unicode scalar value
        Char = 5,
        /// Ordered sequence
        Array = 6,
        /// String-keyed map
        Map = 7,
        /// Compiled function with no captures
        CompiledFunction = 8,
        /// Compiled function plus captured values
        Closure = 9,
    }
}

impl ValueKind {
    /// Name reported by `type_name()` in scripts.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bool => "bool",
            ValueKind::Char => "char",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::CompiledFunction => "compiled-function",
            ValueKind::Closure => "closure",
        }
    }
}

/// Shared, mutable array storage.
pub type ArrayRef = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable map storage.
pub type MapRef = Arc<RwLock<FxHashMap<String, Value>>>;

/// A script value.
///
/// Scalars are held inline. Arrays and maps share their storage between
/// clones; [`Value::deep_copy`] gives the copy-on-assignment behaviour the
/// language exposes through the `copy` builtin.
#[derive(Debug, Clone)]
pub enum Value {
    /// undefined
    Undefined,
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(Arc<str>),
    /// Boolean
    Bool(bool),
    /// Character
    Char(char),
    /// Array
    Array(ArrayRef),
    /// Map
    Map(MapRef),
    /// Function without captures
    CompiledFunction(Arc<CompiledFunction>),
    /// Function with captured free variables
    Closure(Arc<Closure>),
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Creates an array value owning `elements`.
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Arc::new(RwLock::new(elements)))
    }

    /// Creates a map value from key/value pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Map(Arc::new(RwLock::new(map)))
    }

    /// Wraps a compiled function.
    pub fn function(function: CompiledFunction) -> Self {
        Value::CompiledFunction(Arc::new(function))
    }

    /// Wraps a closure.
    pub fn closure(closure: Closure) -> Self {
        Value::Closure(Arc::new(closure))
    }

    /// The type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::CompiledFunction(_) => ValueKind::CompiledFunction,
            Value::Closure(_) => ValueKind::Closure,
        }
    }

    /// The script-visible type name.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value can be called.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::CompiledFunction(_) | Value::Closure(_))
    }

    /// Only `undefined` and `false` are falsy.
    pub fn is_falsy(&self) -> bool {
        matches!(self, Value::Undefined | Value::Bool(false))
    }

    /// Negation of [`Value::is_falsy`].
    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    /// The compiled function, if this value is one.
    pub fn as_compiled_function(&self) -> Option<&Arc<CompiledFunction>> {
        match self {
            Value::CompiledFunction(f) => Some(f),
            _ => None,
        }
    }

    /// Copies this value, giving arrays and maps fresh storage all the way
    /// down. Functions and closures stay shared.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Array(items) => {
                Value::array(items.read().iter().map(Value::deep_copy).collect())
            }
            Value::Map(entries) => Value::map(
                entries
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy())),
            ),
            other => other.clone(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            // Encoded constants must compare equal after a round trip, NaN included.
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => {
                Arc::ptr_eq(a, b) || a == b
            }
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "<undefined>"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                let entries = entries.read();
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, entries[key])?;
                }
                write!(f, "}}")
            }
            Value::CompiledFunction(_) => write!(f, "<compiled-function>"),
            Value::Closure(_) => write!(f, "<closure>"),
        }
    }
}
