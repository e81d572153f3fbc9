use crate::context::Node;
use ordered_float::OrderedFloat;

/// A one-argument math operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum UnaryOpcode {
    Neg,
    Plus,
    Sqrt,
    Square,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Trunc,
}

impl UnaryOpcode {
    pub(crate) fn apply(self, a: f64) -> f64 {
        match self {
            UnaryOpcode::Neg => -a,
            UnaryOpcode::Plus => a,
            UnaryOpcode::Sqrt => a.sqrt(),
            UnaryOpcode::Square => a * a,
            UnaryOpcode::Sin => a.sin(),
            UnaryOpcode::Cos => a.cos(),
            UnaryOpcode::Tan => a.tan(),
            UnaryOpcode::Asin => a.asin(),
            UnaryOpcode::Acos => a.acos(),
            UnaryOpcode::Atan => a.atan(),
            UnaryOpcode::Exp => a.exp(),
            UnaryOpcode::Trunc => a.trunc(),
        }
    }
}

/// A two-argument math operation
///
/// `Pow` is a declared-but-unimplemented sentinel: it evaluates to `+∞`
/// rather than computing a power or raising an error.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum BinaryOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Atan2,
    Pow,
}

impl BinaryOpcode {
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOpcode::Add => a + b,
            BinaryOpcode::Sub => a - b,
            BinaryOpcode::Mul => a * b,
            BinaryOpcode::Div => a / b,
            BinaryOpcode::Atan2 => a.atan2(b),
            BinaryOpcode::Pow => f64::INFINITY,
        }
    }
}

/// A relational predicate, evaluating to 1.0 (true) or 0.0 (false)
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum CompareOpcode {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CompareOpcode {
    pub(crate) fn apply(self, a: f64, b: f64) -> bool {
        match self {
            CompareOpcode::Eq => a == b,
            CompareOpcode::Ne => a != b,
            CompareOpcode::Ge => a >= b,
            CompareOpcode::Le => a <= b,
            CompareOpcode::Gt => a > b,
            CompareOpcode::Lt => a < b,
        }
    }
}

/// Closed-interval membership (`In`) or exclusion (`Out`)
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum RangeOpcode {
    In,
    Out,
}

/// A viewport dimension, sourced from the renderer at evaluation time
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ViewportDim {
    Width,
    Height,
}

/// A scalar query over a single rendered pixel set
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum PixelScalarOpcode {
    Count,
    MinX,
    MaxX,
    MinY,
    MaxY,
}

/// A binary pixel-set combination
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum PixelBinaryOpcode {
    Overlap,
    CoveredBy,
    Left,
    Right,
    Above,
    Below,
}

/// Represents an operation in the expression arena.
///
/// `Op`s should be constructed by calling functions on
/// [`Context`](crate::context::Context), e.g.
/// [`Context::add`](crate::context::Context::add) will generate an
/// `Op::Binary(BinaryOpcode::Add, .., ..)` node and return an opaque handle.
///
/// Each `Op` is tightly coupled to the [`Context`](crate::context::Context)
/// which generated it, and will not be valid for a different `Context`.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Op {
    /// Numeric literal
    Num(OrderedFloat<f64>),
    /// Viewport width or height, read from the renderer on every evaluation
    Viewport(ViewportDim),
    Unary(UnaryOpcode, Node),
    Binary(BinaryOpcode, Node, Node),
    Compare(CompareOpcode, Node, Node),
    /// `Range(op, v, lo, hi)` tests `v` against the closed interval `[lo, hi]`
    Range(RangeOpcode, Node, Node, Node),
    /// `Cond(c, t, f)`: evaluate `c`; nonzero selects `t`, zero selects `f`
    Cond(Node, Node, Node),
    /// Function call; a zero-argument call doubles as a symbol reference
    Call(String, Vec<Node>),
    /// Scalar accessor over one rendered pixel set
    PixelScalar(PixelScalarOpcode, Node),
    /// Minimum boundary distance between two rendered pixel sets
    Distance(Node, Node),
    /// Render the resolved targets into a planar pixel set
    Render(Node),
    /// Render the resolved targets into a six-face cube pixel set
    CubeRender(Node),
    PixelBinary(PixelBinaryOpcode, Node, Node),
    /// Declared but deliberately unimplemented
    Silhouette(Node),
    /// Concrete renderable name
    Target(String),
    /// Ordered list of target expressions, flattened on resolution
    TargetVec(Vec<Node>),
    /// Complement marker covering its whole subtree
    TargetNot(Node),
    /// Symbol indirection resolved through the environment
    TargetFn(String),
    /// Auxiliary view-volume marker, named by the renderer
    ViewVolume(String),
    /// Auxiliary screen-aligned quad marker, named by the renderer
    QuadFrame(String),
}
