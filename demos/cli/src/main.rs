mod flat;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use cel::Script;
use flat::FlatRenderer;

/// Scores a few camera-framing metrics over a built-in demo scene
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Viewport size in pixels (square)
    #[clap(short, long, default_value_t = 64)]
    size: u32,

    /// Horizontal offset of the subject, in pixels
    #[clap(long, default_value_t = 0, allow_hyphen_values = true)]
    subject_x: i32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();
    let args = Args::parse();

    let s = args.size as i32;
    let mut renderer = FlatRenderer::new(args.size, args.size);
    renderer.add_rect(
        "subject",
        s / 8 + args.subject_x,
        s / 4,
        s / 2 + args.subject_x,
        3 * s / 4,
        0.5,
    );
    renderer.add_rect("obstacle", 3 * s / 8, s / 4, 5 * s / 8, 3 * s / 4, 0.3);
    renderer.add_rect("backdrop", 0, 0, s - 1, s - 1, 0.9);

    let mut script = Script::new()?;

    // A user-declared metric on top of the builtins
    let t = script.ctx.call("T", &[])?;
    let w = script.ctx.call("Width", &[t])?;
    let h = script.ctx.call("Height", &[t])?;
    let body = script.ctx.mul(w, h)?;
    script.symbols.declare("ScreenArea", vec!["T".to_owned()], body);

    let subject = script.ctx.target("subject");
    let obstacle = script.ctx.target("obstacle");

    let mut evaluators = vec![];
    for name in ["Width", "Height", "ScreenArea"] {
        evaluators.push(script.ctx.call(name, &[subject])?);
    }
    for name in
        ["LeftOf", "RightOf", "ScreenSeparation", "InFrontOf", "InsideOf"]
    {
        evaluators.push(script.ctx.call(name, &[subject, obstacle])?);
    }
    for &e in &evaluators {
        script.register_evaluator(e)?;
    }

    info!(
        "evaluating {} metrics over a {}x{} viewport",
        evaluators.len(),
        args.size,
        args.size
    );
    script.evaluate_all(&mut renderer);

    for (node, r) in evaluators.iter().zip(script.evaluations()) {
        match r {
            Ok(v) => println!("{} = {v:.4}", script.ctx.to_text(*node)),
            Err(e) => println!("{} failed: {e}", script.ctx.to_text(*node)),
        }
    }
    Ok(())
}
