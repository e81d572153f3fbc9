//! A minimal software renderer: named axis-aligned rectangles at fixed
//! depths, rasterized into depth buffers.
//!
//! Enough of a backend to run real metrics over a demo scene without a GPU
//! or a scene graph.
use cel::{
    pixelset::{face, DepthImage, Layout},
    render::{RenderMode, Renderer},
    Error,
};

use nalgebra::Point2;

struct Rect {
    name: String,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    z: f32,
}

pub struct FlatRenderer {
    width: u32,
    height: u32,
    rects: Vec<Rect>,
    aux: usize,
}

impl FlatRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rects: vec![],
            aux: 0,
        }
    }

    /// Adds a named rectangle spanning `[x0, x1] × [y0, y1]` at depth `z`
    /// (smaller is nearer the camera; must be positive)
    pub fn add_rect(
        &mut self,
        name: &str,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        z: f32,
    ) {
        assert!(z > 0.0);
        self.rects.push(Rect {
            name: name.to_owned(),
            x0,
            y0,
            x1,
            y1,
            z,
        });
    }

    fn rasterize(&self, targets: &[String], mode: RenderMode) -> DepthImage {
        let w = self.width as i32;
        let h = self.height as i32;
        let mut img =
            DepthImage::empty(self.width as usize, self.height as usize, Layout::Planar);
        for rect in &self.rects {
            let named = targets.iter().any(|t| *t == rect.name);
            let drawn = match mode {
                RenderMode::Node => named,
                RenderMode::All => true,
                RenderMode::AllButNode => !named,
            };
            if !drawn {
                continue;
            }
            for x in rect.x0.max(0)..=rect.x1.min(w - 1) {
                for y in rect.y0.max(0)..=rect.y1.min(h - 1) {
                    let i = y as usize * self.width as usize + x as usize;
                    // nearest surface wins
                    if img.data[i] == 0.0 || rect.z < img.data[i] {
                        img.data[i] = rect.z;
                    }
                }
            }
        }
        img
    }
}

impl Renderer for FlatRenderer {
    fn render(
        &mut self,
        targets: &[String],
        mode: RenderMode,
    ) -> Result<DepthImage, Error> {
        Ok(self.rasterize(targets, mode))
    }

    fn cube_render(
        &mut self,
        targets: &[String],
        mode: RenderMode,
    ) -> Result<DepthImage, Error> {
        // A flat scene only ever fills the front face
        let planar = self.rasterize(targets, mode);
        let mut img = DepthImage::empty(
            self.width as usize,
            self.height as usize,
            Layout::Cubic,
        );
        for x in 0..self.width as usize {
            for y in 0..self.height as usize {
                let z = planar.data[y * self.width as usize + x];
                if z > 0.0 {
                    img.set_on_face(x, y, face::FRONT, z);
                }
            }
        }
        Ok(img)
    }

    fn viewport_width(&self) -> u32 {
        self.width
    }

    fn viewport_height(&self) -> u32 {
        self.height
    }

    fn add_view_volume(&mut self, _camera: &str) -> Result<String, Error> {
        // this camera sees the whole viewport, all the way back
        let name = format!("view-volume-{}", self.aux);
        self.aux += 1;
        self.add_rect(
            &name,
            0,
            0,
            self.width as i32 - 1,
            self.height as i32 - 1,
            1.0,
        );
        Ok(name)
    }

    fn add_quad_frame(
        &mut self,
        upper_left: Point2<f32>,
        lower_right: Point2<f32>,
    ) -> Result<String, Error> {
        let name = format!("quad-frame-{}", self.aux);
        self.aux += 1;
        // corners are viewport fractions in [0, 1]
        self.add_rect(
            &name,
            (upper_left.x * self.width as f32) as i32,
            (upper_left.y * self.height as f32) as i32,
            (lower_right.x * self.width as f32) as i32,
            (lower_right.y * self.height as f32) as i32,
            0.01,
        );
        Ok(name)
    }
}
