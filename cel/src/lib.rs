//! A small language for scoring camera framings of a 3D scene.
//!
//! Scripts declare named, optionally parametrized expressions and register
//! top-level evaluators which reduce to scalar scores.  Expressions mix
//! ordinary math with queries over *pixel sets*: rasterized depth samples of
//! named scene targets, combined with a small spatial algebra (overlap,
//! occlusion, directional slices, boundary distance).
//!
//! The crate deliberately stops at the rendering seam: anything that draws
//! pixels implements the [`render::Renderer`] trait, and the engine only ever
//! sees the depth buffers it returns.
//!
//! ```
//! use cel::{Script, render::Renderer};
//!
//! # fn demo<R: Renderer>(renderer: &mut R) -> Result<(), cel::Error> {
//! let mut script = Script::new()?;
//!
//! // Score how much of the subject sits left of the obstacle
//! let subject = script.ctx.target("subject");
//! let obstacle = script.ctx.target("obstacle");
//! let e = script.ctx.call("LeftOf", &[subject, obstacle])?;
//! script.register_evaluator(e)?;
//!
//! script.evaluate_all(renderer);
//! script.log_evaluations();
//! # Ok(())
//! # }
//! ```
pub mod builtins;
pub mod context;
pub mod eval;
pub mod pixelset;
pub mod render;
pub mod script;
pub mod symbols;

mod error;

pub use context::{Context, IntoNode, Node};
pub use error::Error;
pub use script::Script;
