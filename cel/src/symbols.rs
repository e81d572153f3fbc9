//! Declared symbols: named, optionally parametrized expression bodies
use crate::context::Node;

use std::collections::HashMap;

/// A declared symbol: formal parameter names plus a body expression.
///
/// A symbol with no parameters acts as a named constant or a named target
/// expression; one with parameters acts as a function.
#[derive(Clone, Debug)]
pub struct Symbol {
    /// Formal parameter names, in declaration order
    pub params: Vec<String>,
    /// Root node of the body expression
    pub body: Node,
}

/// The global symbol table of a script.
///
/// One table exists per script; builtins are installed at construction by
/// [`install_builtins`](crate::builtins::install_builtins) and user
/// declarations are added as the script is loaded.  Evaluation never writes
/// to the table: call arguments live in per-call scope frames instead.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Builds an empty table, without builtins
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a symbol, replacing any previous declaration of that name
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        params: Vec<String>,
        body: Node,
    ) {
        self.symbols.insert(name.into(), Symbol { params, body });
    }

    /// Declares a zero-parameter symbol
    pub fn declare_value(&mut self, name: impl Into<String>, body: Node) {
        self.declare(name, vec![], body);
    }

    /// Looks up a symbol by name
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Checks whether the given name is declared
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Number of declared symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Checks whether the table has no declarations
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
