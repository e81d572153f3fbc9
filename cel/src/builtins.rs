//! Built-in metric functions, declared as ordinary symbols
//!
//! Builtins are not special-cased by the evaluator: they are expression
//! bodies built through the public [`Context`] API and installed into the
//! symbol table before any user declaration, so a script may shadow them.
//!
//! Most of them normalize a pixel query by the viewport or by a set's own
//! cardinality, yielding dimensionless scores.
use crate::{
    context::{Context, Node},
    symbols::SymbolTable,
    Error,
};

/// Declares the built-in metric functions into `table`.
///
/// | Name | Meaning |
/// |------|---------|
/// | `ToInt(val)` | truncate toward zero |
/// | `Width(T)` | horizontal extent of `T`, as a fraction of the viewport |
/// | `Height(T)` | vertical extent of `T`, as a fraction of the viewport |
/// | `ScreenSeparation(T1,T2)` | boundary distance, as a fraction of the viewport width |
/// | `LeftOf(T1,T2)` | fraction of `T1` strictly left of `T2` |
/// | `RightOf(T1,T2)` | fraction of `T1` strictly right of `T2` |
/// | `AboveOf(T1,T2)` | fraction of `T1` strictly above `T2` |
/// | `BelowOf(T1,T2)` | fraction of `T1` strictly below `T2` |
/// | `InFrontOf(T1,T2)` | fraction of the shared region where `T1` is occluded |
/// | `InsideOf(T1,T2)` | fraction of `T1` occluded by `T2` |
pub fn install_builtins(
    ctx: &mut Context,
    table: &mut SymbolTable,
) -> Result<(), Error> {
    // ToInt(val) = trunc(val)
    let val = ctx.call("val", &[])?;
    let body = ctx.trunc(val)?;
    table.declare("ToInt", vec!["val".to_owned()], body);

    let t = ctx.call("T", &[])?;
    let r = ctx.render(t)?;
    let w = ctx.image_width();
    let h = ctx.image_height();

    // Width(T) = (MaxX(R(T)) - MinX(R(T))) / ImageWidth
    let max_x = ctx.max_x(r)?;
    let min_x = ctx.min_x(r)?;
    let extent = ctx.sub(max_x, min_x)?;
    let body = ctx.div(extent, w)?;
    table.declare("Width", vec!["T".to_owned()], body);

    // Height(T) = (MaxY(R(T)) - MinY(R(T))) / ImageHeight
    let max_y = ctx.max_y(r)?;
    let min_y = ctx.min_y(r)?;
    let extent = ctx.sub(max_y, min_y)?;
    let body = ctx.div(extent, h)?;
    table.declare("Height", vec!["T".to_owned()], body);

    let t1 = ctx.call("T1", &[])?;
    let t2 = ctx.call("T2", &[])?;
    let r1 = ctx.render(t1)?;
    let r2 = ctx.render(t2)?;
    let two_targets = || vec!["T1".to_owned(), "T2".to_owned()];

    // ScreenSeparation(T1,T2) = Distance(R(T1), R(T2)) / ImageWidth
    let d = ctx.distance(r1, r2)?;
    let body = ctx.div(d, w)?;
    table.declare("ScreenSeparation", two_targets(), body);

    // LeftOf(T1,T2) = Count(Left(R(T1),R(T2))) / Count(R(T1)),
    // and likewise for the other three slices
    let slices: [(&str, fn(&mut Context, Node, Node) -> Result<Node, Error>);
        4] = [
        ("LeftOf", Context::left),
        ("RightOf", Context::right),
        ("AboveOf", Context::above),
        ("BelowOf", Context::below),
    ];
    for (name, slice) in slices {
        let s = slice(ctx, r1, r2)?;
        let num = ctx.count(s)?;
        let den = ctx.count(r1)?;
        let body = ctx.div(num, den)?;
        table.declare(name, two_targets(), body);
    }

    // InFrontOf(T1,T2): the fraction of the shared screen region where T1
    // lies behind T2.  The overlap carries T1's depth, so the occlusion
    // test must run against R(T2).
    let shared = ctx.overlap(r1, r2)?;
    let occluded = ctx.covered_by(shared, r2)?;
    let num = ctx.count(occluded)?;
    let den = ctx.count(shared)?;
    let body = ctx.div(num, den)?;
    table.declare("InFrontOf", two_targets(), body);

    // InsideOf(T1,T2) = Count(CoveredBy(R(T1),R(T2))) / Count(R(T1))
    let occluded = ctx.covered_by(r1, r2)?;
    let num = ctx.count(occluded)?;
    let den = ctx.count(r1)?;
    let body = ctx.div(num, den)?;
    table.declare("InsideOf", two_targets(), body);

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        eval::EvalContext,
        pixelset::{DepthImage, Layout},
        render::mock::MockRenderer,
    };

    fn rect(
        img: &mut DepthImage,
        x0: usize,
        x1: usize,
        y0: usize,
        y1: usize,
        z: f32,
    ) {
        for x in x0..=x1 {
            for y in y0..=y1 {
                img.set(x, y, z);
            }
        }
    }

    fn setup() -> (Context, SymbolTable, MockRenderer) {
        let mut ctx = Context::new();
        let mut table = SymbolTable::new();
        install_builtins(&mut ctx, &mut table).unwrap();
        (ctx, table, MockRenderer::new(8, 8))
    }

    #[test]
    fn test_to_int() {
        let (mut ctx, table, mut mock) = setup();
        let w = ctx.image_width();
        let v = ctx.div(w, 3.0).unwrap();
        let e = ctx.call("ToInt", &[v]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 2.0);
    }

    #[test]
    fn test_width() {
        let (mut ctx, table, mut mock) = setup();
        // "house" spans x in [2, 5]: Width = (5 - 2) / 8
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 2, 5, 3, 4, 0.5);
        mock.insert_planar("house", img);

        let t = ctx.target("house");
        let e = ctx.call("Width", &[t]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 0.375);
    }

    #[test]
    fn test_height() {
        let (mut ctx, table, mut mock) = setup();
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 2, 5, 3, 4, 0.5);
        mock.insert_planar("house", img);

        let t = ctx.target("house");
        let e = ctx.call("Height", &[t]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 0.125);
    }

    #[test]
    fn test_left_of() {
        let (mut ctx, table, mut mock) = setup();
        // house: x in [0, 3]; tree: x in [2, 5].  Half of house's 8 pixels
        // sit strictly left of tree's bounding box.
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 0, 3, 2, 3, 0.5);
        mock.insert_planar("house", img);
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 2, 5, 2, 3, 0.5);
        mock.insert_planar("tree", img);

        let t1 = ctx.target("house");
        let t2 = ctx.target("tree");
        let e = ctx.call("LeftOf", &[t1, t2]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 0.5);

        let e = ctx.call("RightOf", &[t1, t2]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 0.0);
    }

    #[test]
    fn test_screen_separation() {
        let (mut ctx, table, mut mock) = setup();
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        img.set(0, 0, 0.5);
        mock.insert_planar("a", img);
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        img.set(4, 0, 0.5);
        mock.insert_planar("b", img);

        let t1 = ctx.target("a");
        let t2 = ctx.target("b");
        let e = ctx.call("ScreenSeparation", &[t1, t2]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 0.5);
    }

    #[test]
    fn test_inside_of() {
        let (mut ctx, table, mut mock) = setup();
        // house at depth 0.8, fully behind tree (depth 0.2) on half of its
        // pixels
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 0, 3, 2, 2, 0.8);
        mock.insert_planar("house", img);
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 2, 3, 2, 2, 0.2);
        mock.insert_planar("tree", img);

        let t1 = ctx.target("house");
        let t2 = ctx.target("tree");
        let e = ctx.call("InsideOf", &[t1, t2]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 0.5);
    }

    #[test]
    fn test_in_front_of() {
        let (mut ctx, table, mut mock) = setup();
        // shared region is x in [2, 3]; house is behind tree on all of it
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 0, 3, 2, 2, 0.8);
        mock.insert_planar("house", img);
        let mut img = DepthImage::empty(8, 8, Layout::Planar);
        rect(&mut img, 2, 5, 2, 2, 0.2);
        mock.insert_planar("tree", img);

        let t1 = ctx.target("house");
        let t2 = ctx.target("tree");
        let e = ctx.call("InFrontOf", &[t1, t2]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 1.0);
    }

    #[test]
    fn test_user_declaration_shadows_builtin() {
        let (mut ctx, mut table, mut mock) = setup();
        let val = ctx.call("val", &[]).unwrap();
        table.declare("ToInt", vec!["val".to_owned()], val);

        let x = ctx.num(1.9);
        let e = ctx.call("ToInt", &[x]).unwrap();
        let mut env = EvalContext::new(&table, &mut mock);
        // the user's identity version, not the truncating builtin
        assert_eq!(ctx.eval(e, &mut env).unwrap(), 1.9);
    }
}
