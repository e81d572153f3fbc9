//! Module containing the universal error type for this crate
use thiserror::Error;

/// Universal error type for evaluation and pixel-set algebra
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Node is not present in this `Context`
    #[error("node is not present in this `Context`")]
    BadNode,

    /// Symbol is not declared in any visible scope
    #[error("symbol `{0}` is not declared")]
    UndefinedSymbol(String),

    /// A node did not have the kind an operation requires
    #[error("`{name}` is not {expected}")]
    TypeMismatch {
        /// Textual form of the offending expression
        name: String,
        /// What the operation required, e.g. "a target expression"
        expected: &'static str,
    },

    /// Binary pixel-set operations require matching geometry
    #[error("incompatible pixel sets: {0}")]
    IncompatibleSets(String),

    /// Operation is declared but deliberately not implemented
    #[error("operation `{0}` is not implemented")]
    Unimplemented(&'static str),

    /// Call does not match the declared parameter list
    #[error("`{name}` takes {expected} argument(s), found {found}")]
    ArityMismatch {
        /// Function being called
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Actual argument count
        found: usize,
    },

    /// The call chain exceeded the evaluation depth limit
    #[error("call depth limit ({0}) exceeded")]
    CallDepthExceeded(usize),

    /// Target resolution produced no renderable names
    #[error("target expression resolved to no targets")]
    EmptyTargetList,

    /// Renderer-side failure, forwarded unchanged
    #[error("render failed: {0}")]
    RenderFailed(String),
}
