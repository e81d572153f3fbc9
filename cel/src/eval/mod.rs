//! Expression evaluation and target resolution
//!
//! Evaluation is a plain recursive walk over the [`Context`] arena.  There is
//! deliberately no memoization: a node's value depends on the ambient scope
//! stack, and pixel-set nodes must re-render on every reference.
use crate::{
    context::{
        Context, Node, Op, PixelBinaryOpcode, PixelScalarOpcode, RangeOpcode,
        ViewportDim,
    },
    pixelset::PixelSet,
    render::{RenderMode, Renderer},
    symbols::SymbolTable,
    Error,
};

use std::collections::HashMap;

use log::trace;

/// Maximum depth of the call chain before evaluation fails with
/// [`Error::CallDepthExceeded`].
///
/// Per-call scope frames make self-reference structurally sound, so a cyclic
/// declaration chain would otherwise recurse without bound.
pub const MAX_CALL_DEPTH: usize = 256;

/// Everything one evaluation needs besides the expression arena: the global
/// symbol table, the rendering backend, and the scope stack.
///
/// Build a fresh `EvalContext` per top-level evaluation; independent
/// evaluation sessions are then independent by construction.
pub struct EvalContext<'a, R> {
    symbols: &'a SymbolTable,
    renderer: &'a mut R,
    /// Call frames, innermost last; each maps a formal parameter to the
    /// unevaluated actual-argument node
    frames: Vec<HashMap<String, Node>>,
    depth: usize,
}

impl<'a, R> EvalContext<'a, R> {
    pub fn new(symbols: &'a SymbolTable, renderer: &'a mut R) -> Self {
        Self {
            symbols,
            renderer,
            frames: vec![],
            depth: 0,
        }
    }

    /// Resolves a name against the scope stack, innermost frame first.
    ///
    /// Global symbols are not consulted here; the caller falls back to the
    /// symbol table when no frame binds the name.
    fn lookup_binding(&self, name: &str) -> Option<Node> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.get(name))
            .copied()
    }

    fn push_frame(&mut self, frame: HashMap<String, Node>) {
        self.frames.push(frame);
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Error::CallDepthExceeded(MAX_CALL_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

impl Context {
    /// Evaluates the scalar expression rooted at `node`.
    ///
    /// Pixel-set children are rendered, queried, and dropped on the spot; a
    /// root node that itself produces a pixel set (or a target expression)
    /// fails with [`Error::TypeMismatch`].
    pub fn eval<R: Renderer>(
        &self,
        node: Node,
        env: &mut EvalContext<R>,
    ) -> Result<f64, Error> {
        let op = self.get_op(node).ok_or(Error::BadNode)?;
        match op {
            Op::Num(c) => Ok(c.0),
            Op::Viewport(ViewportDim::Width) => {
                Ok(env.renderer.viewport_width() as f64)
            }
            Op::Viewport(ViewportDim::Height) => {
                Ok(env.renderer.viewport_height() as f64)
            }
            Op::Unary(op, a) => {
                let a = self.eval(*a, env)?;
                Ok(op.apply(a))
            }
            Op::Binary(op, a, b) => {
                let a = self.eval(*a, env)?;
                let b = self.eval(*b, env)?;
                Ok(op.apply(a, b))
            }
            Op::Compare(op, a, b) => {
                let a = self.eval(*a, env)?;
                let b = self.eval(*b, env)?;
                Ok(if op.apply(a, b) { 1.0 } else { 0.0 })
            }
            Op::Range(op, v, lo, hi) => {
                let v = self.eval(*v, env)?;
                let lo = self.eval(*lo, env)?;
                let hi = self.eval(*hi, env)?;
                let hit = match op {
                    RangeOpcode::In => lo <= v && v <= hi,
                    RangeOpcode::Out => v <= lo || v >= hi,
                };
                Ok(if hit { 1.0 } else { 0.0 })
            }
            Op::Cond(c, t, f) => {
                let branch = if self.eval(*c, env)? != 0.0 { *t } else { *f };
                self.eval(branch, env)
            }
            Op::Call(name, args) => self.eval_call(name, args, env),
            Op::PixelScalar(op, a) => {
                let ps = self.eval_pixels(*a, env)?;
                Ok(match op {
                    PixelScalarOpcode::Count => ps.count() as f64,
                    PixelScalarOpcode::MinX => ps.min_x() as f64,
                    PixelScalarOpcode::MaxX => ps.max_x() as f64,
                    PixelScalarOpcode::MinY => ps.min_y() as f64,
                    PixelScalarOpcode::MaxY => ps.max_y() as f64,
                })
            }
            Op::Distance(a, b) => {
                let pa = self.eval_pixels(*a, env)?;
                let pb = self.eval_pixels(*b, env)?;
                Ok(pa.distance(&pb))
            }
            _ => Err(Error::TypeMismatch {
                name: self.to_text(node),
                expected: "a scalar expression",
            }),
        }
    }

    /// Evaluates a pixel-set expression rooted at `node`, rendering through
    /// the environment's backend.
    pub fn eval_pixels<R: Renderer>(
        &self,
        node: Node,
        env: &mut EvalContext<R>,
    ) -> Result<PixelSet, Error> {
        let op = self.get_op(node).ok_or(Error::BadNode)?;
        match op {
            Op::Render(t) => {
                let (targets, negated) = resolve_targets(self, *t, env)?;
                let mode = if negated {
                    RenderMode::AllButNode
                } else {
                    RenderMode::Node
                };
                let img = env.renderer.render(&targets, mode)?;
                Ok(PixelSet::from_image(img, self.to_text(node)))
            }
            Op::CubeRender(t) => {
                let (targets, negated) = resolve_targets(self, *t, env)?;
                let mode = if negated {
                    RenderMode::AllButNode
                } else {
                    RenderMode::Node
                };
                let img = env.renderer.cube_render(&targets, mode)?;
                Ok(PixelSet::from_image(img, self.to_text(node)))
            }
            Op::PixelBinary(op, a, b) => {
                let pa = self.eval_pixels(*a, env)?;
                let pb = self.eval_pixels(*b, env)?;
                match op {
                    PixelBinaryOpcode::Overlap => pa.overlap(&pb),
                    PixelBinaryOpcode::CoveredBy => pa.covered_by(&pb),
                    PixelBinaryOpcode::Left => Ok(pa.left(&pb)),
                    PixelBinaryOpcode::Right => Ok(pa.right(&pb)),
                    PixelBinaryOpcode::Above => Ok(pa.above(&pb)),
                    PixelBinaryOpcode::Below => Ok(pa.below(&pb)),
                }
            }
            Op::Silhouette(_) => Err(Error::Unimplemented("Silhouette")),
            Op::Call(name, args) => self.render_call(name, args, env),
            _ => Err(Error::TypeMismatch {
                name: self.to_text(node),
                expected: "a pixel-set expression",
            }),
        }
    }

    fn eval_call<R: Renderer>(
        &self,
        name: &str,
        args: &[Node],
        env: &mut EvalContext<R>,
    ) -> Result<f64, Error> {
        env.enter()?;
        let r = match self.enter_call(name, args, env) {
            Ok((body, pushed)) => {
                let r = self.eval(body, env);
                if pushed {
                    env.pop_frame();
                }
                r
            }
            Err(e) => Err(e),
        };
        env.leave();
        r
    }

    fn render_call<R: Renderer>(
        &self,
        name: &str,
        args: &[Node],
        env: &mut EvalContext<R>,
    ) -> Result<PixelSet, Error> {
        env.enter()?;
        let r = match self.enter_call(name, args, env) {
            Ok((body, pushed)) => {
                let r = self.eval_pixels(body, env);
                if pushed {
                    env.pop_frame();
                }
                r
            }
            Err(e) => Err(e),
        };
        env.leave();
        r
    }

    /// Shared call protocol.
    ///
    /// Returns the node to evaluate next and whether a frame was pushed (and
    /// must be popped by the caller once that node has been evaluated).
    ///
    /// A zero-argument call that resolves to a frame binding evaluates the
    /// bound actual-argument expression in the current environment, so the
    /// argument is re-evaluated at every reference (call by expression).
    fn enter_call<R: Renderer>(
        &self,
        name: &str,
        args: &[Node],
        env: &mut EvalContext<R>,
    ) -> Result<(Node, bool), Error> {
        if args.is_empty() {
            if let Some(bound) = env.lookup_binding(name) {
                trace!("`{name}` resolved to a frame binding");
                return Ok((bound, false));
            }
        }

        let symbols = env.symbols;
        let sym = symbols
            .get(name)
            .ok_or_else(|| Error::UndefinedSymbol(name.to_owned()))?;
        if sym.params.len() != args.len() {
            return Err(Error::ArityMismatch {
                name: name.to_owned(),
                expected: sym.params.len(),
                found: args.len(),
            });
        }

        let mut frame = HashMap::with_capacity(args.len());
        for (param, &arg) in sym.params.iter().zip(args) {
            frame.insert(param.clone(), self.forward_argument(arg, env));
        }
        trace!("calling `{name}` at depth {}", env.depth);
        env.push_frame(frame);
        Ok((sym.body, true))
    }

    /// One level of argument forwarding: an actual argument that is itself a
    /// bare zero-argument reference is replaced by the expression it is bound
    /// to, so passing a name forwards its definition rather than a dangling
    /// reference into the callee's scope.
    fn forward_argument<R>(&self, arg: Node, env: &EvalContext<R>) -> Node {
        if let Some(Op::Call(name, inner)) = self.get_op(arg) {
            if inner.is_empty() {
                if let Some(bound) = env.lookup_binding(name) {
                    return bound;
                }
                if let Some(sym) = env.symbols.get(name) {
                    if sym.params.is_empty() {
                        return sym.body;
                    }
                }
            }
        }
        arg
    }
}

/// Resolves a target expression to renderable names plus a negation flag.
///
/// Names accumulate in visit order.  A single flag covers the whole subtree:
/// any `TargetNot` anywhere marks the full resolved list as negated, which is
/// an intentional simplification of per-name complement.
///
/// Symbol indirection (`TargetFn` or a zero-argument call) resolves through
/// the environment; a symbol that resolves to a non-target node fails with
/// [`Error::TypeMismatch`] naming the offending expression.
pub fn resolve_targets<R>(
    ctx: &Context,
    node: Node,
    env: &EvalContext<R>,
) -> Result<(Vec<String>, bool), Error> {
    let mut names = vec![];
    let mut negated = false;
    visit_target(ctx, node, env, &mut names, &mut negated)?;
    if names.is_empty() {
        return Err(Error::EmptyTargetList);
    }
    Ok((names, negated))
}

fn visit_target<R>(
    ctx: &Context,
    node: Node,
    env: &EvalContext<R>,
    names: &mut Vec<String>,
    negated: &mut bool,
) -> Result<(), Error> {
    let indirect = |name: &str,
                    names: &mut Vec<String>,
                    negated: &mut bool|
     -> Result<(), Error> {
        if let Some(bound) = env.lookup_binding(name) {
            return visit_target(ctx, bound, env, names, negated);
        }
        let sym = env
            .symbols
            .get(name)
            .ok_or_else(|| Error::UndefinedSymbol(name.to_owned()))?;
        if !sym.params.is_empty() {
            return Err(Error::ArityMismatch {
                name: name.to_owned(),
                expected: sym.params.len(),
                found: 0,
            });
        }
        visit_target(ctx, sym.body, env, names, negated)
    };

    match ctx.get_op(node).ok_or(Error::BadNode)? {
        Op::Target(name) | Op::ViewVolume(name) | Op::QuadFrame(name) => {
            names.push(name.clone());
            Ok(())
        }
        Op::TargetVec(ts) => {
            for t in ts {
                visit_target(ctx, *t, env, names, negated)?;
            }
            Ok(())
        }
        Op::TargetNot(t) => {
            *negated = true;
            visit_target(ctx, *t, env, names, negated)
        }
        Op::TargetFn(name) => indirect(name, names, negated),
        Op::Call(name, args) if args.is_empty() => {
            indirect(name, names, negated)
        }
        _ => Err(Error::TypeMismatch {
            name: ctx.to_text(node),
            expected: "a target expression",
        }),
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        pixelset::{DepthImage, Layout},
        render::mock::MockRenderer,
    };

    fn image(members: &[(usize, usize)]) -> DepthImage {
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        for &(x, y) in members {
            img.set(x, y, 0.5);
        }
        img
    }

    #[test]
    fn test_eval_arithmetic() {
        let mut ctx = Context::new();
        let w = ctx.image_width();
        let e = ctx.add(w, 2.0).unwrap();
        let symbols = SymbolTable::new();
        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 10.0);

        let p = ctx.plus(w).unwrap();
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(ctx.eval(p, &mut env).unwrap(), 8.0);
    }

    #[test]
    fn test_eval_pow_sentinel() {
        let mut ctx = Context::new();
        let w = ctx.image_width();
        let e = ctx.pow(w, 2.0).unwrap();
        let symbols = SymbolTable::new();
        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_eval_cond_and_range() {
        let mut ctx = Context::new();
        let w = ctx.image_width(); // 8, not folded
        let lo = ctx.num(0.0);
        let hi = ctx.num(10.0);
        let c = ctx.within(w, lo, hi).unwrap();
        let t = ctx.num(1.5);
        let f = ctx.num(-1.5);
        let e = ctx.cond(c, t, f).unwrap();

        let symbols = SymbolTable::new();
        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 1.5);

        let out = ctx.without(w, lo, hi).unwrap();
        let e = ctx.cond(out, t, f).unwrap();
        assert_eq!(ctx.eval(e, &mut env).unwrap(), -1.5);
    }

    #[test]
    fn test_call_with_argument() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();

        // F(p) = p * 2
        let p = ctx.call("p", &[]).unwrap();
        let body = ctx.mul(p, 2.0).unwrap();
        symbols.declare("F", vec!["p".to_owned()], body);

        let three = ctx.num(3.0);
        let e = ctx.call("F", &[three]).unwrap();

        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 6.0);
        assert!(env.frames.is_empty());
    }

    #[test]
    fn test_call_undefined() {
        let mut ctx = Context::new();
        let e = ctx.call("Nope", &[]).unwrap();
        let symbols = SymbolTable::new();
        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(
            ctx.eval(e, &mut env),
            Err(Error::UndefinedSymbol("Nope".to_owned()))
        );
    }

    #[test]
    fn test_call_arity() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();
        let p = ctx.call("p", &[]).unwrap();
        symbols.declare("F", vec!["p".to_owned()], p);

        let a = ctx.num(1.0);
        let b = ctx.num(2.0);
        let e = ctx.call("F", &[a, b]).unwrap();
        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(
            ctx.eval(e, &mut env),
            Err(Error::ArityMismatch {
                name: "F".to_owned(),
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_argument_forwarding() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();

        // G = 5
        let five = ctx.num(5.0);
        symbols.declare_value("G", five);

        // F(p) = p * 2; F(G) forwards G's body into the frame
        let p = ctx.call("p", &[]).unwrap();
        let body = ctx.mul(p, 2.0).unwrap();
        symbols.declare("F", vec!["p".to_owned()], body);

        let g = ctx.call("G", &[]).unwrap();
        let e = ctx.call("F", &[g]).unwrap();

        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 10.0);
    }

    #[test]
    fn test_nested_call_forwards_parameter() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();

        // H(q) = q + 1
        let q = ctx.call("q", &[]).unwrap();
        let h_body = ctx.add(q, 1.0).unwrap();
        symbols.declare("H", vec!["q".to_owned()], h_body);

        // F(p) = H(p): the actual `p` is a frame binding, forwarded into
        // H's frame so `q` sees the original argument
        let p = ctx.call("p", &[]).unwrap();
        let f_body = ctx.call("H", &[p]).unwrap();
        symbols.declare("F", vec!["p".to_owned()], f_body);

        let three = ctx.num(3.0);
        let e = ctx.call("F", &[three]).unwrap();

        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 4.0);
    }

    #[test]
    fn test_shadowing() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();

        // Inner(p) = p + 1, Outer(p) = Inner(p * 10) + p.
        // Both use the name `p`; the inner frame shadows the outer one
        // inside Inner's body, and the outer binding is intact afterwards.
        let p = ctx.call("p", &[]).unwrap();
        let inner_body = ctx.add(p, 1.0).unwrap();
        symbols.declare("Inner", vec!["p".to_owned()], inner_body);

        let p10 = ctx.mul(p, 10.0).unwrap();
        let call_inner = ctx.call("Inner", &[p10]).unwrap();
        let outer_body = ctx.add(call_inner, p).unwrap();
        symbols.declare("Outer", vec!["p".to_owned()], outer_body);

        let two = ctx.num(2.0);
        let e = ctx.call("Outer", &[two]).unwrap();

        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        // Inner(20) + 2 = 21 + 2
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 23.0);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();

        let body = ctx.call("Loop", &[]).unwrap();
        symbols.declare_value("Loop", body);

        let mut r = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut r);
        assert_eq!(
            ctx.eval(body, &mut env),
            Err(Error::CallDepthExceeded(MAX_CALL_DEPTH))
        );
    }

    #[test]
    fn test_render_and_count() {
        let mut ctx = Context::new();
        let t = ctx.target("house");
        let r = ctx.render(t).unwrap();
        let e = ctx.count(r).unwrap();

        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        mock.insert_planar("house", image(&[(1, 1), (2, 1), (3, 1)]));
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 3.0);
    }

    #[test]
    fn test_no_memoization_re_renders() {
        let mut ctx = Context::new();
        let t = ctx.target("house");
        let r = ctx.render(t).unwrap();
        let c = ctx.count(r).unwrap();
        // the two Count(R("house")) children deduplicate to one node, and
        // it must still render twice
        let e = ctx.add(c, c).unwrap();

        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        mock.insert_planar("house", image(&[(1, 1)]));
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 2.0);
        assert_eq!(env.renderer.calls.len(), 2);
    }

    #[test]
    fn test_resolve_target_vec() {
        let mut ctx = Context::new();
        let a = ctx.target("a");
        let b = ctx.target("b");
        let inner = ctx.target_vec(&[b]).unwrap();
        let v = ctx.target_vec(&[a, inner]).unwrap();

        let symbols = SymbolTable::new();
        let mut r = MockRenderer::new(8, 8);
        let env = EvalContext::new(&symbols, &mut r);
        let (names, negated) = resolve_targets(&ctx, v, &env).unwrap();
        assert_eq!(names, vec!["a".to_owned(), "b".to_owned()]);
        assert!(!negated);
    }

    #[test]
    fn test_resolve_negation() {
        let mut ctx = Context::new();
        let a = ctx.target("a");
        let n = ctx.target_not(a).unwrap();

        let symbols = SymbolTable::new();
        let mut r = MockRenderer::new(8, 8);
        let env = EvalContext::new(&symbols, &mut r);
        let (names, negated) = resolve_targets(&ctx, n, &env).unwrap();
        assert_eq!(names, vec!["a".to_owned()]);
        assert!(negated);
    }

    #[test]
    fn test_resolve_through_symbol() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();
        let a = ctx.target("tree");
        symbols.declare_value("Subject", a);

        let f = ctx.target_fn("Subject");
        let mut r = MockRenderer::new(8, 8);
        let env = EvalContext::new(&symbols, &mut r);
        let (names, _) = resolve_targets(&ctx, f, &env).unwrap();
        assert_eq!(names, vec!["tree".to_owned()]);
    }

    #[test]
    fn test_resolve_non_target() {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();
        let n = ctx.num(1.0);
        symbols.declare_value("Oops", n);

        let f = ctx.target_fn("Oops");
        let mut r = MockRenderer::new(8, 8);
        let env = EvalContext::new(&symbols, &mut r);
        assert_eq!(
            resolve_targets(&ctx, f, &env),
            Err(Error::TypeMismatch {
                name: "1".to_owned(),
                expected: "a target expression",
            })
        );
    }

    #[test]
    fn test_resolve_empty_vec() {
        let mut ctx = Context::new();
        let v = ctx.target_vec(&[]).unwrap();
        let symbols = SymbolTable::new();
        let mut r = MockRenderer::new(8, 8);
        let env = EvalContext::new(&symbols, &mut r);
        assert_eq!(
            resolve_targets(&ctx, v, &env),
            Err(Error::EmptyTargetList)
        );
    }

    #[test]
    fn test_negated_render_uses_all_but_node() {
        let mut ctx = Context::new();
        let a = ctx.target("a");
        let n = ctx.target_not(a).unwrap();
        let r = ctx.render(n).unwrap();
        let e = ctx.count(r).unwrap();

        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        mock.insert_planar("!a", image(&[(0, 0), (1, 0)]));
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 2.0);
        assert_eq!(
            env.renderer.calls,
            vec![(vec!["a".to_owned()], RenderMode::AllButNode)]
        );
    }

    #[test]
    fn test_cube_render_eval() {
        let mut ctx = Context::new();
        let t = ctx.target("house");
        let r = ctx.cube_render(t).unwrap();
        let e = ctx.count(r).unwrap();

        // members on two faces; count spans both
        let mut img = DepthImage::empty(8, 8, Layout::Cubic);
        img.set_on_face(1, 1, crate::pixelset::face::FRONT, 0.5);
        img.set_on_face(2, 2, crate::pixelset::face::LEFT, 0.5);
        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        mock.insert_cubic("house", img);
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 2.0);
        assert_eq!(
            env.renderer.calls,
            vec![(vec!["house".to_owned()], RenderMode::Node)]
        );
    }

    #[test]
    fn test_view_volume_marker() {
        let mut mock = MockRenderer::new(8, 8);
        let name = mock.add_view_volume("main").unwrap();
        mock.insert_planar(&name, image(&[(0, 0), (1, 0), (2, 0)]));

        // the registered name renders like any other target
        let mut ctx = Context::new();
        let v = ctx.view_volume(&name);
        let r = ctx.render(v).unwrap();
        let e = ctx.count(r).unwrap();

        let symbols = SymbolTable::new();
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 3.0);
    }

    #[test]
    fn test_quad_frame_marker() {
        use nalgebra::Point2;

        let mut mock = MockRenderer::new(8, 8);
        let name = mock
            .add_quad_frame(Point2::new(0.25, 0.25), Point2::new(0.75, 0.75))
            .unwrap();
        // a quad frame mixes with ordinary targets in a vector
        mock.insert_planar(&format!("{name}+house"), image(&[(3, 3)]));

        let mut ctx = Context::new();
        let q = ctx.quad_frame(&name);
        let h = ctx.target("house");
        let v = ctx.target_vec(&[q, h]).unwrap();
        let r = ctx.render(v).unwrap();
        let e = ctx.count(r).unwrap();

        let symbols = SymbolTable::new();
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 1.0);
        assert_eq!(
            env.renderer.calls,
            vec![(vec![name, "house".to_owned()], RenderMode::Node)]
        );
    }

    #[test]
    fn test_silhouette_unimplemented() {
        let mut ctx = Context::new();
        let t = ctx.target("a");
        let r = ctx.render(t).unwrap();
        let s = ctx.silhouette(r).unwrap();
        let e = ctx.count(s).unwrap();

        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(
            ctx.eval(e, &mut env),
            Err(Error::Unimplemented("Silhouette"))
        );
    }

    #[test]
    fn test_scalar_in_pixel_position() {
        let mut ctx = Context::new();
        let n = ctx.num(4.0);
        let e = ctx.count(n).unwrap();
        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert!(matches!(
            ctx.eval(e, &mut env),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_pixel_in_scalar_position() {
        let mut ctx = Context::new();
        let t = ctx.target("a");
        let r = ctx.render(t).unwrap();
        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert!(matches!(
            ctx.eval(r, &mut env),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_render_through_call() {
        // Subject = "house"; Count(R(Subject)) resolves the indirection
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();
        let t = ctx.target("house");
        symbols.declare_value("Subject", t);

        let s = ctx.call("Subject", &[]).unwrap();
        let r = ctx.render(s).unwrap();
        let e = ctx.count(r).unwrap();

        let mut mock = MockRenderer::new(8, 8);
        mock.insert_planar("house", image(&[(2, 2)]));
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 1.0);
    }

    #[test]
    fn test_distance_eval() {
        let mut ctx = Context::new();
        let ta = ctx.target("a");
        let tb = ctx.target("b");
        let ra = ctx.render(ta).unwrap();
        let rb = ctx.render(tb).unwrap();
        let e = ctx.distance(ra, rb).unwrap();

        let symbols = SymbolTable::new();
        let mut mock = MockRenderer::new(8, 8);
        mock.insert_planar("a", image(&[(0, 0)]));
        mock.insert_planar("b", image(&[(4, 0)]));
        let mut env = EvalContext::new(&symbols, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 4.0);
    }
}
