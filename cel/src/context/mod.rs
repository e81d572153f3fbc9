//! Infrastructure for representing camera-metric expressions as graphs
pub(crate) mod indexed;
mod op;

use indexed::{define_index, IndexMap};
pub use op::{
    BinaryOpcode, CompareOpcode, Op, PixelBinaryOpcode, PixelScalarOpcode,
    RangeOpcode, UnaryOpcode, ViewportDim,
};

use crate::Error;

use std::fmt::Write;

use ordered_float::OrderedFloat;

define_index!(Node, "An index in the `Context::ops` map");

/// A `Context` holds a set of deduplicated expression nodes.
///
/// It should be used like an arena allocator: it grows while a script is
/// loaded, is evaluated repeatedly without self-mutation, then frees all of
/// its contents when dropped.
#[derive(Debug, Default)]
pub struct Context {
    ops: IndexMap<Op, Node>,
}

impl Context {
    /// Build a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the context
    ///
    /// All [`Node`] handles from this context are invalidated.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Returns the number of [`Op`] nodes in the context
    ///
    /// ```
    /// # use cel::Context;
    /// let mut ctx = Context::new();
    /// let a = ctx.num(1.0);
    /// assert_eq!(ctx.len(), 1);
    /// let b = ctx.num(2.0);
    /// assert_eq!(ctx.len(), 2);
    /// let c = ctx.num(1.0); // deduplicated
    /// assert_eq!(ctx.len(), 2);
    /// assert_eq!(a, c);
    /// ```
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Checks whether the context is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Looks up an operation by [`Node`] handle
    pub fn get_op(&self, node: Node) -> Option<&Op> {
        self.ops.get_by_index(node)
    }

    /// Checks whether the given [`Node`] is valid in this context
    pub(crate) fn check_node(&self, node: Node) -> Result<(), Error> {
        self.get_op(node).ok_or(Error::BadNode).map(|_| ())
    }

    /// Looks up the numeric literal associated with the given node.
    ///
    /// If the node is invalid for this context, returns an error; if the node
    /// is not a literal, returns `Ok(None)`.
    pub fn num_value(&self, n: Node) -> Result<Option<f64>, Error> {
        match self.get_op(n) {
            Some(Op::Num(c)) => Ok(Some(c.0)),
            Some(_) => Ok(None),
            _ => Err(Error::BadNode),
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Primitives

    /// Returns a node representing the given numeric literal
    pub fn num(&mut self, f: f64) -> Node {
        self.ops.insert(Op::Num(OrderedFloat(f)))
    }

    /// Viewport width in pixels, read from the renderer on every evaluation
    pub fn image_width(&mut self) -> Node {
        self.ops.insert(Op::Viewport(ViewportDim::Width))
    }

    /// Viewport height in pixels, read from the renderer on every evaluation
    pub fn image_height(&mut self) -> Node {
        self.ops.insert(Op::Viewport(ViewportDim::Height))
    }

    ////////////////////////////////////////////////////////////////////////
    // Math operators, with constant folding over literal operands

    /// Find or create a [Node] for the given unary operation, with constant
    /// folding.
    pub fn op_unary(
        &mut self,
        op: UnaryOpcode,
        a: Node,
    ) -> Result<Node, Error> {
        let n = match self.num_value(a)? {
            Some(v) => self.num(op.apply(v)),
            None => self.ops.insert(Op::Unary(op, a)),
        };
        Ok(n)
    }

    /// Find or create a [Node] for the given binary operation, with constant
    /// folding.
    pub fn op_binary(
        &mut self,
        op: BinaryOpcode,
        a: Node,
        b: Node,
    ) -> Result<Node, Error> {
        let n = match (self.num_value(a)?, self.num_value(b)?) {
            (Some(va), Some(vb)) => self.num(op.apply(va, vb)),
            _ => self.ops.insert(Op::Binary(op, a, b)),
        };
        Ok(n)
    }

    /// Builds an addition node
    /// ```
    /// # let mut ctx = cel::Context::new();
    /// let a = ctx.num(1.0);
    /// let sum = ctx.add(a, 2.0).unwrap();
    /// assert_eq!(ctx.num_value(sum).unwrap(), Some(3.0)); // folded
    /// ```
    pub fn add<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        self.op_binary(BinaryOpcode::Add, a, b)
    }

    /// Builds a subtraction node
    pub fn sub<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        self.op_binary(BinaryOpcode::Sub, a, b)
    }

    /// Builds a multiplication node
    pub fn mul<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        self.op_binary(BinaryOpcode::Mul, a, b)
    }

    /// Builds a division node
    pub fn div<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        self.op_binary(BinaryOpcode::Div, a, b)
    }

    /// Builds a power node
    ///
    /// This operation is an explicit unimplemented sentinel: it evaluates to
    /// `+∞` rather than computing a power.
    pub fn pow<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        self.op_binary(BinaryOpcode::Pow, a, b)
    }

    /// Builds a two-argument arctangent node
    pub fn atan2<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        self.op_binary(BinaryOpcode::Atan2, a, b)
    }

    /// Builds a unary negation node
    pub fn neg<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Neg, a)
    }

    /// Builds a unary plus node, which passes its input through unchanged
    pub fn plus<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Plus, a)
    }

    /// Builds a square-root node
    pub fn sqrt<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Sqrt, a)
    }

    /// Builds a node which squares its input
    pub fn square<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Square, a)
    }

    /// Builds a sine node
    pub fn sin<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Sin, a)
    }

    /// Builds a cosine node
    pub fn cos<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Cos, a)
    }

    /// Builds a tangent node
    pub fn tan<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Tan, a)
    }

    /// Builds an arcsine node
    pub fn asin<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Asin, a)
    }

    /// Builds an arccosine node
    pub fn acos<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Acos, a)
    }

    /// Builds an arctangent node
    pub fn atan<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Atan, a)
    }

    /// Builds an exponential node
    pub fn exp<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Exp, a)
    }

    /// Builds a node which truncates its input toward zero
    pub fn trunc<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        self.op_unary(UnaryOpcode::Trunc, a)
    }

    ////////////////////////////////////////////////////////////////////////
    // Predicates and control flow

    /// Builds a relational predicate node, evaluating to 1.0 or 0.0
    pub fn compare<A: IntoNode, B: IntoNode>(
        &mut self,
        op: CompareOpcode,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        Ok(self.ops.insert(Op::Compare(op, a, b)))
    }

    /// Builds a closed-interval membership test: `lo <= v && v <= hi`
    pub fn within<V: IntoNode>(
        &mut self,
        v: V,
        lo: Node,
        hi: Node,
    ) -> Result<Node, Error> {
        let v = v.into_node(self)?;
        self.check_node(lo)?;
        self.check_node(hi)?;
        Ok(self.ops.insert(Op::Range(RangeOpcode::In, v, lo, hi)))
    }

    /// Builds a closed-interval exclusion test: `v <= lo || v >= hi`
    pub fn without<V: IntoNode>(
        &mut self,
        v: V,
        lo: Node,
        hi: Node,
    ) -> Result<Node, Error> {
        let v = v.into_node(self)?;
        self.check_node(lo)?;
        self.check_node(hi)?;
        Ok(self.ops.insert(Op::Range(RangeOpcode::Out, v, lo, hi)))
    }

    /// Builds a conditional node: nonzero condition selects `t`, else `f`
    pub fn cond(
        &mut self,
        c: Node,
        t: Node,
        f: Node,
    ) -> Result<Node, Error> {
        self.check_node(c)?;
        self.check_node(t)?;
        self.check_node(f)?;
        Ok(self.ops.insert(Op::Cond(c, t, f)))
    }

    /// Builds a function-call node
    ///
    /// A zero-argument call doubles as a reference to a parameter or to a
    /// declared symbol.
    pub fn call(
        &mut self,
        name: impl Into<String>,
        args: &[Node],
    ) -> Result<Node, Error> {
        args.iter().try_for_each(|a| self.check_node(*a))?;
        Ok(self.ops.insert(Op::Call(name.into(), args.to_vec())))
    }

    ////////////////////////////////////////////////////////////////////////
    // Pixel-set queries

    fn pixel_scalar(
        &mut self,
        op: PixelScalarOpcode,
        a: Node,
    ) -> Result<Node, Error> {
        self.check_node(a)?;
        Ok(self.ops.insert(Op::PixelScalar(op, a)))
    }

    /// Cardinality of the rendered pixel set
    pub fn count(&mut self, a: Node) -> Result<Node, Error> {
        self.pixel_scalar(PixelScalarOpcode::Count, a)
    }

    /// Minimum member x coordinate of the rendered pixel set
    pub fn min_x(&mut self, a: Node) -> Result<Node, Error> {
        self.pixel_scalar(PixelScalarOpcode::MinX, a)
    }

    /// Maximum member x coordinate of the rendered pixel set
    pub fn max_x(&mut self, a: Node) -> Result<Node, Error> {
        self.pixel_scalar(PixelScalarOpcode::MaxX, a)
    }

    /// Minimum member y coordinate of the rendered pixel set
    pub fn min_y(&mut self, a: Node) -> Result<Node, Error> {
        self.pixel_scalar(PixelScalarOpcode::MinY, a)
    }

    /// Maximum member y coordinate of the rendered pixel set
    pub fn max_y(&mut self, a: Node) -> Result<Node, Error> {
        self.pixel_scalar(PixelScalarOpcode::MaxY, a)
    }

    /// Minimum boundary distance between two rendered pixel sets
    pub fn distance(&mut self, a: Node, b: Node) -> Result<Node, Error> {
        self.check_node(a)?;
        self.check_node(b)?;
        Ok(self.ops.insert(Op::Distance(a, b)))
    }

    ////////////////////////////////////////////////////////////////////////
    // Pixel-set producers

    /// Renders the resolved targets into a planar pixel set
    pub fn render(&mut self, t: Node) -> Result<Node, Error> {
        self.check_node(t)?;
        Ok(self.ops.insert(Op::Render(t)))
    }

    /// Renders the resolved targets into a six-face cube pixel set
    pub fn cube_render(&mut self, t: Node) -> Result<Node, Error> {
        self.check_node(t)?;
        Ok(self.ops.insert(Op::CubeRender(t)))
    }

    fn pixel_binary(
        &mut self,
        op: PixelBinaryOpcode,
        a: Node,
        b: Node,
    ) -> Result<Node, Error> {
        self.check_node(a)?;
        self.check_node(b)?;
        Ok(self.ops.insert(Op::PixelBinary(op, a, b)))
    }

    /// Coordinates member in both operands
    pub fn overlap(&mut self, a: Node, b: Node) -> Result<Node, Error> {
        self.pixel_binary(PixelBinaryOpcode::Overlap, a, b)
    }

    /// Coordinates member in both operands where `a` lies behind `b`
    pub fn covered_by(&mut self, a: Node, b: Node) -> Result<Node, Error> {
        self.pixel_binary(PixelBinaryOpcode::CoveredBy, a, b)
    }

    /// Members of `a` strictly left of `b`'s bounding box
    pub fn left(&mut self, a: Node, b: Node) -> Result<Node, Error> {
        self.pixel_binary(PixelBinaryOpcode::Left, a, b)
    }

    /// Members of `a` strictly right of `b`'s bounding box
    pub fn right(&mut self, a: Node, b: Node) -> Result<Node, Error> {
        self.pixel_binary(PixelBinaryOpcode::Right, a, b)
    }

    /// Members of `a` strictly above `b`'s bounding box
    pub fn above(&mut self, a: Node, b: Node) -> Result<Node, Error> {
        self.pixel_binary(PixelBinaryOpcode::Above, a, b)
    }

    /// Members of `a` strictly below `b`'s bounding box
    pub fn below(&mut self, a: Node, b: Node) -> Result<Node, Error> {
        self.pixel_binary(PixelBinaryOpcode::Below, a, b)
    }

    /// Declared but deliberately unimplemented; rendering it fails with
    /// [`Error::Unimplemented`]
    pub fn silhouette(&mut self, a: Node) -> Result<Node, Error> {
        self.check_node(a)?;
        Ok(self.ops.insert(Op::Silhouette(a)))
    }

    ////////////////////////////////////////////////////////////////////////
    // Target expressions

    /// A concrete renderable name
    pub fn target(&mut self, name: impl Into<String>) -> Node {
        self.ops.insert(Op::Target(name.into()))
    }

    /// An ordered list of target expressions, flattened on resolution
    pub fn target_vec(&mut self, ts: &[Node]) -> Result<Node, Error> {
        ts.iter().try_for_each(|t| self.check_node(*t))?;
        Ok(self.ops.insert(Op::TargetVec(ts.to_vec())))
    }

    /// Marks the complement of its whole subtree
    pub fn target_not(&mut self, t: Node) -> Result<Node, Error> {
        self.check_node(t)?;
        Ok(self.ops.insert(Op::TargetNot(t)))
    }

    /// Symbol indirection: the named symbol must resolve to a target
    /// expression when this node is visited
    pub fn target_fn(&mut self, name: impl Into<String>) -> Node {
        self.ops.insert(Op::TargetFn(name.into()))
    }

    /// An auxiliary view-volume marker, named by the renderer
    pub fn view_volume(&mut self, name: impl Into<String>) -> Node {
        self.ops.insert(Op::ViewVolume(name.into()))
    }

    /// An auxiliary screen-aligned quad marker, named by the renderer
    pub fn quad_frame(&mut self, name: impl Into<String>) -> Node {
        self.ops.insert(Op::QuadFrame(name.into()))
    }

    ////////////////////////////////////////////////////////////////////////

    /// Renders the expression rooted at `node` as diagnostic text
    pub fn to_text(&self, node: Node) -> String {
        let mut out = String::new();
        self.write_node(&mut out, node);
        out
    }

    fn write_node(&self, out: &mut String, node: Node) {
        let Some(op) = self.get_op(node) else {
            out.push_str("<bad node>");
            return;
        };
        let bin = |out: &mut String, name: &str, a: Node, b: Node| {
            out.push_str(name);
            out.push('(');
            self.write_node(out, a);
            out.push(',');
            self.write_node(out, b);
            out.push(')');
        };
        match op {
            Op::Num(c) => write!(out, "{}", c.0).unwrap(),
            Op::Viewport(ViewportDim::Width) => out.push_str("[ImageWidth]"),
            Op::Viewport(ViewportDim::Height) => out.push_str("[ImageHeight]"),
            Op::Unary(op, a) => {
                let name = match op {
                    UnaryOpcode::Neg => {
                        out.push('-');
                        self.write_node(out, *a);
                        return;
                    }
                    UnaryOpcode::Plus => {
                        self.write_node(out, *a);
                        return;
                    }
                    UnaryOpcode::Sqrt => "sqrt",
                    UnaryOpcode::Square => "sqr",
                    UnaryOpcode::Sin => "sin",
                    UnaryOpcode::Cos => "cos",
                    UnaryOpcode::Tan => "tan",
                    UnaryOpcode::Asin => "asin",
                    UnaryOpcode::Acos => "acos",
                    UnaryOpcode::Atan => "atan",
                    UnaryOpcode::Exp => "exp",
                    UnaryOpcode::Trunc => "trunc",
                };
                out.push_str(name);
                out.push('(');
                self.write_node(out, *a);
                out.push(')');
            }
            Op::Binary(op, a, b) => match op {
                BinaryOpcode::Atan2 => bin(out, "atan2", *a, *b),
                BinaryOpcode::Pow => bin(out, "pow", *a, *b),
                _ => {
                    let sym = match op {
                        BinaryOpcode::Add => "+",
                        BinaryOpcode::Sub => "-",
                        BinaryOpcode::Mul => "*",
                        BinaryOpcode::Div => "/",
                        _ => unreachable!(),
                    };
                    self.write_node(out, *a);
                    out.push_str(sym);
                    self.write_node(out, *b);
                }
            },
            Op::Compare(op, a, b) => {
                let sym = match op {
                    CompareOpcode::Eq => "==",
                    CompareOpcode::Ne => "!=",
                    CompareOpcode::Ge => ">=",
                    CompareOpcode::Le => "<=",
                    CompareOpcode::Gt => ">",
                    CompareOpcode::Lt => "<",
                };
                self.write_node(out, *a);
                out.push_str(sym);
                self.write_node(out, *b);
            }
            Op::Range(op, v, lo, hi) => {
                self.write_node(out, *v);
                out.push_str(match op {
                    RangeOpcode::In => " IN [",
                    RangeOpcode::Out => " OUT [",
                });
                self.write_node(out, *lo);
                out.push(',');
                self.write_node(out, *hi);
                out.push(']');
            }
            Op::Cond(c, t, f) => {
                out.push_str("if(");
                self.write_node(out, *c);
                out.push(',');
                self.write_node(out, *t);
                out.push(',');
                self.write_node(out, *f);
                out.push(')');
            }
            Op::Call(name, args) => {
                out.push_str(name);
                if !args.is_empty() {
                    out.push('(');
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        self.write_node(out, *a);
                    }
                    out.push(')');
                }
            }
            Op::PixelScalar(op, a) => {
                let name = match op {
                    PixelScalarOpcode::Count => "Count",
                    PixelScalarOpcode::MinX => "MinX",
                    PixelScalarOpcode::MaxX => "MaxX",
                    PixelScalarOpcode::MinY => "MinY",
                    PixelScalarOpcode::MaxY => "MaxY",
                };
                out.push_str(name);
                out.push('(');
                self.write_node(out, *a);
                out.push(')');
            }
            Op::Distance(a, b) => bin(out, "Distance", *a, *b),
            Op::Render(t) => {
                out.push_str("R(");
                self.write_node(out, *t);
                out.push(')');
            }
            Op::CubeRender(t) => {
                out.push_str("CR(");
                self.write_node(out, *t);
                out.push(')');
            }
            Op::PixelBinary(op, a, b) => {
                let name = match op {
                    PixelBinaryOpcode::Overlap => "Overlap",
                    PixelBinaryOpcode::CoveredBy => "CoveredBy",
                    PixelBinaryOpcode::Left => "Left",
                    PixelBinaryOpcode::Right => "Right",
                    PixelBinaryOpcode::Above => "Above",
                    PixelBinaryOpcode::Below => "Below",
                };
                bin(out, name, *a, *b)
            }
            Op::Silhouette(a) => {
                out.push_str("Silhouette(");
                self.write_node(out, *a);
                out.push(')');
            }
            Op::Target(name) => write!(out, "\"{name}\"").unwrap(),
            Op::TargetVec(ts) => {
                out.push('[');
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_node(out, *t);
                }
                out.push(']');
            }
            Op::TargetNot(t) => {
                out.push('!');
                self.write_node(out, *t);
            }
            Op::TargetFn(name) => out.push_str(name),
            Op::ViewVolume(name) | Op::QuadFrame(name) => {
                write!(out, "\"{name}\"").unwrap()
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Helper trait for things that can be converted into a [`Node`] given a
/// [`Context`].
///
/// This trait allows you to write
/// ```
/// # let mut ctx = cel::Context::new();
/// let a = ctx.num(2.0);
/// let sum = ctx.add(a, 1.0).unwrap();
/// ```
/// instead of the more verbose
/// ```
/// # let mut ctx = cel::Context::new();
/// let a = ctx.num(2.0);
/// let num = ctx.num(1.0);
/// let sum = ctx.add(a, num).unwrap();
/// ```
pub trait IntoNode {
    /// Converts the given value into a node
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error>;
}

impl IntoNode for Node {
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error> {
        ctx.check_node(self)?;
        Ok(self)
    }
}

impl IntoNode for f64 {
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error> {
        Ok(ctx.num(self))
    }
}

////////////////////////////////////////////////////////////////////////////////
