//! Scope management for variable resolution during compilation.
//!
//! Scopes form a tree that is only ever walked from a leaf towards the root.
//! They are kept in a stack (`Vec<ScopeRecord>`) whose entries point at their
//! parent by index, so no scope owns another and resolution is a plain loop.
//!
//! Three kinds of scope exist:
//!
//! - the root scope, whose definitions are globals;
//! - function scopes, whose definitions are locals of that function's frame;
//! - block scopes, which share their enclosing function's (or the root's)
//!   slot space and hand out indices after everything the parent has defined.

use crate::builtins::builtin_index;
use crate::error::CompileError;
use kestrel_macros::ensure;
use rustc_hash::FxHashMap;
use tracing::trace;

/// Where a symbol's value lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    /// Global slot table
    Global,
    /// Local slot of the current frame
    Local,
    /// Captured-value array of the current closure
    Free,
    /// Builtin table
    Builtin,
}

/// A resolved binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The bound name
    pub name: String,
    /// Storage kind
    pub scope: SymbolScope,
    /// Index within that storage
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Function,
    Block,
}

#[derive(Debug)]
struct ScopeRecord {
    kind: ScopeKind,
    parent: Option<usize>,
    store: FxHashMap<String, Symbol>,
    /// Definitions made directly in this scope
    num_definitions: usize,
    /// High-water mark of slots used by this scope and its blocks
    max_definitions: usize,
    /// Captured symbols, as seen from the enclosing function
    free_symbols: Vec<Symbol>,
}

impl ScopeRecord {
    fn new(kind: ScopeKind, parent: Option<usize>) -> Self {
        Self {
            kind,
            parent,
            store: FxHashMap::default(),
            num_definitions: 0,
            max_definitions: 0,
            free_symbols: Vec::new(),
        }
    }

    /// Records a capture of `original` and returns the Free symbol that
    /// refers to it from inside this function.
    fn define_free(&mut self, original: Symbol) -> Symbol {
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: self.free_symbols.len(),
        };
        self.free_symbols.push(original);
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }
}

/// What a finished function scope needs to build its closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionScope {
    /// Local slots used by the function, parameters and blocks included
    pub num_locals: usize,
    /// Captured symbols in free-index order, resolved in the enclosing scope
    pub free_symbols: Vec<Symbol>,
}

/// Resolves names to [`Symbol`]s while the compiler walks the tree.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<ScopeRecord>,
}

impl SymbolTable {
    /// Creates a table holding only the root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeRecord::new(ScopeKind::Root, None)],
        }
    }

    fn current(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Enter a new function scope.
    pub fn push_function(&mut self) {
        let parent = self.current();
        self.scopes
            .push(ScopeRecord::new(ScopeKind::Function, Some(parent)));
    }

    /// Enter a new block scope.
    pub fn push_block(&mut self) {
        let parent = self.current();
        self.scopes
            .push(ScopeRecord::new(ScopeKind::Block, Some(parent)));
    }

    /// Leave the current block scope.
    pub fn pop_block(&mut self) -> Result<(), CompileError> {
        self.pop(ScopeKind::Block).map(drop)
    }

    /// Leave the current function scope, returning its slot count and
    /// captures.
    pub fn pop_function(&mut self) -> Result<FunctionScope, CompileError> {
        let record = self.pop(ScopeKind::Function)?;
        Ok(FunctionScope {
            num_locals: record.max_definitions,
            free_symbols: record.free_symbols,
        })
    }

    fn pop(&mut self, kind: ScopeKind) -> Result<ScopeRecord, CompileError> {
        ensure!(
            self.scopes.len() > 1 && self.scopes[self.current()].kind == kind,
            CompileError::Internal(format!("scope stack does not end in a {:?} scope", kind))
        );
        self.scopes
            .pop()
            .ok_or_else(|| CompileError::Internal("scope stack is empty".into()))
    }

    /// Returns true while compiling inside a function body.
    pub fn in_function(&self) -> bool {
        self.scopes.iter().any(|s| s.kind == ScopeKind::Function)
    }

    /// Slots the root scope and its blocks have used so far.
    pub fn num_globals(&self) -> usize {
        self.scopes[0].max_definitions
    }

    /// Defines `name` in the innermost scope.
    ///
    /// The symbol is Global when no function encloses the scope and Local
    /// otherwise; its index is the next free slot of that storage.
    pub fn define(&mut self, name: &str) -> Result<Symbol, CompileError> {
        let current = self.current();
        ensure!(
            !self.scopes[current].store.contains_key(name),
            CompileError::Redeclared(name.to_string())
        );

        let mut index = 0;
        let mut cursor = current;
        loop {
            let record = &self.scopes[cursor];
            index += record.num_definitions;
            match (record.kind, record.parent) {
                (ScopeKind::Block, Some(parent)) => cursor = parent,
                _ => break,
            }
        }
        let scope = match self.scopes[cursor].kind {
            ScopeKind::Function => SymbolScope::Local,
            _ => SymbolScope::Global,
        };

        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index,
        };
        let record = &mut self.scopes[current];
        record.num_definitions += 1;
        record.store.insert(name.to_string(), symbol.clone());
        self.update_max_definitions(current, index + 1);
        Ok(symbol)
    }

    fn update_max_definitions(&mut self, from: usize, count: usize) {
        let mut cursor = Some(from);
        while let Some(idx) = cursor {
            let record = &mut self.scopes[idx];
            record.max_definitions = record.max_definitions.max(count);
            cursor = match record.kind {
                ScopeKind::Block => record.parent,
                _ => None,
            };
        }
    }

    /// Resolves `name` from the innermost scope outwards.
    ///
    /// A Local found outside the current function becomes Free: every
    /// function scope crossed on the way records the capture, outermost
    /// first, so each level captures from its immediate parent. Names with
    /// no lexical binding fall back to the builtin table.
    pub fn resolve(&mut self, name: &str) -> Result<Symbol, CompileError> {
        let mut crossed: Vec<usize> = Vec::new();
        let mut cursor = Some(self.current());

        while let Some(idx) = cursor {
            let record = &self.scopes[idx];
            if let Some(found) = record.store.get(name) {
                let mut symbol = found.clone();
                if matches!(symbol.scope, SymbolScope::Global | SymbolScope::Builtin) {
                    return Ok(symbol);
                }
                for &function in crossed.iter().rev() {
                    symbol = self.scopes[function].define_free(symbol);
                    trace!(name, free_index = symbol.index, "captured free variable");
                }
                return Ok(symbol);
            }
            if record.kind == ScopeKind::Function {
                crossed.push(idx);
            }
            cursor = record.parent;
        }

        builtin_index(name)
            .map(|index| Symbol {
                name: name.to_string(),
                scope: SymbolScope::Builtin,
                index,
            })
            .ok_or_else(|| CompileError::UnresolvedIdentifier(name.to_string()))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
