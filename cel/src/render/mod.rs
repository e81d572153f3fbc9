//! Interface between the evaluation engine and a rendering backend
//!
//! The engine never draws anything itself; it asks a [`Renderer`] for depth
//! buffers and adopts them as [`PixelSet`](crate::pixelset::PixelSet)s.  The
//! production backend wraps a scene graph and a camera; tests use a mock with
//! canned images, and the demo binary ships a small software rasterizer.
use crate::{pixelset::DepthImage, Error};

use nalgebra::Point2;

/// Selects which part of the scene a render call draws
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RenderMode {
    /// Only the named targets
    Node,
    /// The whole scene
    All,
    /// The whole scene except the named targets
    AllButNode,
}

/// A rendering backend
///
/// `render` and `cube_render` are synchronous and may be called many times
/// per evaluation; the engine performs no caching, so a backend that is slow
/// to redraw should cache on its own side of this interface.
pub trait Renderer {
    /// Renders the named targets from the active camera into a planar
    /// depth image
    fn render(
        &mut self,
        targets: &[String],
        mode: RenderMode,
    ) -> Result<DepthImage, Error>;

    /// Renders the named targets into a six-face cube depth image, with a
    /// fixed 90° field of view per face
    fn cube_render(
        &mut self,
        targets: &[String],
        mode: RenderMode,
    ) -> Result<DepthImage, Error>;

    /// Viewport width in pixels
    fn viewport_width(&self) -> u32;

    /// Viewport height in pixels
    fn viewport_height(&self) -> u32;

    /// Registers a renderable volume covering the named camera's view
    /// frustum, returning the name it can be rendered under
    fn add_view_volume(&mut self, camera: &str) -> Result<String, Error>;

    /// Registers a screen-aligned quad between the given viewport-space
    /// corners, returning the name it can be rendered under
    fn add_quad_frame(
        &mut self,
        upper_left: Point2<f32>,
        lower_right: Point2<f32>,
    ) -> Result<String, Error>;
}
