//! Rasterized pixel sets and their spatial algebra
//!
//! A [`PixelSet`] is a rasterized depth sample for one rendered target,
//! treated as a mathematical set of pixel coordinates: a pixel belongs to the
//! set when its depth value is greater than zero.  Sets support cardinality
//! and bounding queries, binary combination (overlap, occlusion), directional
//! slicing against another set's bounding box, and minimum boundary distance.
use crate::Error;

use std::cell::OnceCell;

use log::debug;

/// Buffer layout: one planar face, or the six faces of a cube map
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Layout {
    /// Regular 2D buffer
    Planar,
    /// Six buffers representing the faces of a cube map
    Cubic,
}

impl Layout {
    /// Number of faces in this layout
    pub fn faces(&self) -> usize {
        match self {
            Layout::Planar => 1,
            Layout::Cubic => 6,
        }
    }
}

/// Cube-face indexing, following the usual render-to-cubemap convention:
/// +X (0), -X (1), +Y (2), -Y (3), +Z (4), -Z (5)
pub mod face {
    pub const RIGHT: usize = 0;
    pub const LEFT: usize = 1;
    pub const UP: usize = 2;
    pub const DOWN: usize = 3;
    pub const BACK: usize = 4;
    pub const FRONT: usize = 5;
}

/// A depth buffer handed over by the renderer
///
/// `data` holds `width * height * layout.faces()` values in face-major,
/// row-major order; `0.0` marks an absent pixel.
#[derive(Clone, Debug)]
pub struct DepthImage {
    pub width: usize,
    pub height: usize,
    pub layout: Layout,
    pub data: Vec<f32>,
}

impl DepthImage {
    /// Builds an all-absent image of the given geometry
    pub fn empty(width: usize, height: usize, layout: Layout) -> Self {
        Self {
            width,
            height,
            layout,
            data: vec![0.0; width * height * layout.faces()],
        }
    }

    /// Sets the depth value at `(x, y)` on face 0
    pub fn set(&mut self, x: usize, y: usize, z: f32) {
        self.set_on_face(x, y, 0, z);
    }

    /// Sets the depth value at `(x, y)` on the given face
    pub fn set_on_face(&mut self, x: usize, y: usize, face: usize, z: f32) {
        let i = (face * self.height + y) * self.width + x;
        self.data[i] = z;
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct Stats {
    count: usize,
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
    min_z: f32,
    max_z: f32,
}

/// A pixel set: the coordinates (optionally per cube face) whose depth value
/// is greater than zero.
///
/// Statistics (cardinality and bounding extents) are computed by one full
/// scan at construction and are O(1) thereafter.  Edge pixels are found
/// lazily on the first [`distance`](PixelSet::distance) query and cached.
///
/// Pixel sets have single-owner value semantics: an evaluation produces one,
/// extracts a scalar or a derived set, and drops it.  Nothing is cached
/// across evaluations.
#[derive(Debug)]
pub struct PixelSet {
    name: String,
    image: DepthImage,
    stats: Stats,
    edges: OnceCell<Vec<(i32, i32)>>,
}

impl PixelSet {
    /// Adopts a rendered depth image, computing statistics in one scan
    pub fn from_image(image: DepthImage, name: impl Into<String>) -> Self {
        let mut out = Self {
            name: name.into(),
            image,
            stats: Stats::default(),
            edges: OnceCell::new(),
        };
        out.compute_statistics();
        out.log_statistics();
        out
    }

    /// Builds an empty set of the given geometry
    pub fn empty(
        width: usize,
        height: usize,
        layout: Layout,
        name: impl Into<String>,
    ) -> Self {
        Self::from_image(DepthImage::empty(width, height, layout), name)
    }

    /// Diagnostic label, e.g. `Overlap(a,b)`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.image.width
    }

    pub fn height(&self) -> usize {
        self.image.height
    }

    pub fn layout(&self) -> Layout {
        self.image.layout
    }

    /// Depth value at `(x, y, face)`; `0.0` means the pixel is absent
    pub fn depth_at(&self, x: i32, y: i32, face: usize) -> f32 {
        debug_assert!(x >= 0 && (x as usize) < self.image.width);
        debug_assert!(y >= 0 && (y as usize) < self.image.height);
        let i = (face * self.image.height + y as usize) * self.image.width
            + x as usize;
        self.image.data[i]
    }

    /// Number of member pixels, over all faces
    pub fn count(&self) -> usize {
        self.stats.count
    }

    /// Minimum member x coordinate, or -1 if the set is empty
    pub fn min_x(&self) -> i32 {
        self.stats.min_x
    }

    /// Maximum member x coordinate, or -1 if the set is empty
    pub fn max_x(&self) -> i32 {
        self.stats.max_x
    }

    /// Minimum member y coordinate, or -1 if the set is empty
    pub fn min_y(&self) -> i32 {
        self.stats.min_y
    }

    /// Maximum member y coordinate, or -1 if the set is empty
    pub fn max_y(&self) -> i32 {
        self.stats.max_y
    }

    /// Minimum member depth, or -1 if the set is empty
    pub fn min_z(&self) -> f32 {
        self.stats.min_z
    }

    /// Maximum member depth, or -1 if the set is empty
    pub fn max_z(&self) -> f32 {
        self.stats.max_z
    }

    fn check_compatible(&self, other: &PixelSet) -> Result<(), Error> {
        if self.layout() != other.layout() {
            return Err(Error::IncompatibleSets(format!(
                "`{}` and `{}` differ in layout",
                self.name, other.name
            )));
        }
        if self.width() != other.width() || self.height() != other.height() {
            return Err(Error::IncompatibleSets(format!(
                "`{}` is {}x{}, `{}` is {}x{}",
                self.name,
                self.width(),
                self.height(),
                other.name,
                other.width(),
                other.height()
            )));
        }
        Ok(())
    }

    /// Coordinates where both `self` and `other` are members.
    ///
    /// The result carries `self`'s depth values.  Requires matching layout
    /// and geometry.
    ///
    /// For planar sets the scan is restricted to `self`'s bounding box; for
    /// cube sets all six faces are scanned in full.
    pub fn overlap(&self, other: &PixelSet) -> Result<PixelSet, Error> {
        self.check_compatible(other)?;

        let name = format!("Overlap({},{})", self.name, other.name);
        let mut out = DepthImage::empty(self.width(), self.height(), self.layout());

        if self.stats.count > 0 {
            for face in 0..self.layout().faces() {
                let (x0, x1, y0, y1) = match self.layout() {
                    Layout::Planar => (
                        self.stats.min_x,
                        self.stats.max_x,
                        self.stats.min_y,
                        self.stats.max_y,
                    ),
                    Layout::Cubic => (
                        0,
                        self.width() as i32 - 1,
                        0,
                        self.height() as i32 - 1,
                    ),
                };
                for x in x0..=x1 {
                    for y in y0..=y1 {
                        let z = self.depth_at(x, y, face);
                        if z > 0.0 && other.depth_at(x, y, face) > 0.0 {
                            out.set_on_face(x as usize, y as usize, face, z);
                        }
                    }
                }
            }
        }

        Ok(PixelSet::from_image(out, name))
    }

    /// Coordinates member in both sets where `self`'s depth is strictly
    /// greater than `other`'s, i.e. `self` lies farther along the view ray
    /// and would be occluded by `other` in a joint rendering.
    pub fn covered_by(&self, other: &PixelSet) -> Result<PixelSet, Error> {
        self.check_compatible(other)?;

        let name = format!("CoveredBy({},{})", self.name, other.name);
        let mut out = DepthImage::empty(self.width(), self.height(), self.layout());

        if self.stats.count > 0 {
            for face in 0..self.layout().faces() {
                for x in self.stats.min_x..=self.stats.max_x {
                    for y in self.stats.min_y..=self.stats.max_y {
                        let z = self.depth_at(x, y, face);
                        let w = other.depth_at(x, y, face);
                        if z > 0.0 && w > 0.0 && z > w {
                            out.set_on_face(x as usize, y as usize, face, z);
                        }
                    }
                }
            }
        }

        Ok(PixelSet::from_image(out, name))
    }

    /// Members of `self` strictly left of `other`'s bounding box
    /// (`x < other.min_x`)
    pub fn left(&self, other: &PixelSet) -> PixelSet {
        let name = format!("Left({},{})", self.name, other.name);
        self.rect_slice(
            name,
            self.stats.min_x,
            other.stats.min_x - 1,
            self.stats.min_y,
            self.stats.max_y,
        )
    }

    /// Members of `self` strictly right of `other`'s bounding box
    /// (`x > other.max_x`)
    pub fn right(&self, other: &PixelSet) -> PixelSet {
        let name = format!("Right({},{})", self.name, other.name);
        self.rect_slice(
            name,
            other.stats.max_x + 1,
            self.stats.max_x,
            self.stats.min_y,
            self.stats.max_y,
        )
    }

    /// Members of `self` strictly above `other`'s bounding box
    /// (`y > other.max_y`)
    pub fn above(&self, other: &PixelSet) -> PixelSet {
        let name = format!("Above({},{})", self.name, other.name);
        self.rect_slice(
            name,
            self.stats.min_x,
            self.stats.max_x,
            other.stats.max_y + 1,
            self.stats.max_y,
        )
    }

    /// Members of `self` strictly below `other`'s bounding box
    /// (`y < other.min_y`)
    pub fn below(&self, other: &PixelSet) -> PixelSet {
        let name = format!("Below({},{})", self.name, other.name);
        self.rect_slice(
            name,
            self.stats.min_x,
            self.stats.max_x,
            self.stats.min_y,
            other.stats.min_y - 1,
        )
    }

    /// Shared slice primitive behind the directional relations: members of
    /// `self` (face 0) inside the inclusive window
    /// `[min_x, max_x] × [min_y, max_y]`, as a planar set.
    ///
    /// The window is clipped to the buffer.  Against an empty reference
    /// (bounds all -1) the clipping is one-sided: `left`/`below` collapse to
    /// an empty window, while `right`/`above` open at 0 and return all of
    /// `self`.
    fn rect_slice(
        &self,
        name: String,
        min_x: i32,
        max_x: i32,
        min_y: i32,
        max_y: i32,
    ) -> PixelSet {
        let mut out = DepthImage::empty(self.width(), self.height(), Layout::Planar);

        let x0 = min_x.max(0);
        let x1 = max_x.min(self.width() as i32 - 1);
        let y0 = min_y.max(0);
        let y1 = max_y.min(self.height() as i32 - 1);

        for x in x0..=x1 {
            for y in y0..=y1 {
                let z = self.depth_at(x, y, 0);
                if z > 0.0 {
                    out.set(x as usize, y as usize, z);
                }
            }
        }

        PixelSet::from_image(out, name)
    }

    /// Minimum Euclidean distance between any edge pixel of `self` and any
    /// edge pixel of `other`, by exhaustive cross scan of both edge lists.
    ///
    /// Returns `0.0` when the sets touch and `+∞` when either set has no
    /// edge pixels.
    pub fn distance(&self, other: &PixelSet) -> f64 {
        let a = self.edge_pixels();
        let b = other.edge_pixels();
        if a.is_empty() || b.is_empty() {
            return f64::INFINITY;
        }

        let mut min_sq = i64::MAX;
        for (ax, ay) in a {
            for (bx, by) in b {
                let dx = (ax - bx) as i64;
                let dy = (ay - by) as i64;
                min_sq = min_sq.min(dx * dx + dy * dy);
            }
        }

        if min_sq > 0 {
            (min_sq as f64).sqrt()
        } else {
            0.0
        }
    }

    /// Edge pixels on face 0, computed lazily and cached.
    ///
    /// An edge pixel is a member with at least one of its 8 neighbors absent
    /// or outside the guard band near the buffer border.
    fn edge_pixels(&self) -> &[(i32, i32)] {
        self.edges.get_or_init(|| self.find_edge_pixels())
    }

    fn find_edge_pixels(&self) -> Vec<(i32, i32)> {
        let mut edges = Vec::new();
        if self.stats.count == 0 {
            return edges;
        }
        let w = self.width() as i32;
        let h = self.height() as i32;
        let at = |x: i32, y: i32| self.depth_at(x, y, 0) > 0.0;

        for x in self.stats.min_x..=self.stats.max_x {
            for y in self.stats.min_y..=self.stats.max_y {
                if !at(x, y) {
                    continue;
                }
                let interior = (x > 0 && y > 0 && at(x - 1, y - 1))
                    && (x > 0 && at(x - 1, y))
                    && (x > 0 && y < h - 2 && at(x - 1, y + 1))
                    && (y > 0 && at(x, y - 1))
                    && (y < h - 2 && at(x, y + 1))
                    && (x < w - 2 && y > 0 && at(x + 1, y - 1))
                    && (x < w - 2 && at(x + 1, y))
                    && (x < w - 2 && y < h - 2 && at(x + 1, y + 1));
                if !interior {
                    edges.push((x, y));
                }
            }
        }
        edges
    }

    /// One full scan over every face, filling cardinality and bounds.
    ///
    /// For cube sets only the front face contributes to the bounding
    /// extents; the count spans all six faces.
    fn compute_statistics(&mut self) {
        let mut s = Stats {
            count: 0,
            min_x: i32::MAX,
            max_x: i32::MIN,
            min_y: i32::MAX,
            max_y: i32::MIN,
            min_z: f32::MAX,
            max_z: f32::MIN,
        };

        for f in 0..self.layout().faces() {
            let relevant_face =
                self.layout() == Layout::Planar || f == face::FRONT;
            for x in 0..self.width() as i32 {
                for y in 0..self.height() as i32 {
                    let z = self.depth_at(x, y, f);
                    if z > 0.0 {
                        s.count += 1;
                        if relevant_face {
                            s.min_x = s.min_x.min(x);
                            s.max_x = s.max_x.max(x);
                            s.min_y = s.min_y.min(y);
                            s.max_y = s.max_y.max(y);
                            s.min_z = s.min_z.min(z);
                            s.max_z = s.max_z.max(z);
                        }
                    }
                }
            }
        }

        if s.count == 0 {
            s = Stats {
                count: 0,
                min_x: -1,
                max_x: -1,
                min_y: -1,
                max_y: -1,
                min_z: -1.0,
                max_z: -1.0,
            };
        }
        self.stats = s;
    }

    fn log_statistics(&self) {
        debug!(
            "pixel set `{}`: count={} x=[{},{}] y=[{},{}] z=[{},{}]",
            self.name,
            self.stats.count,
            self.stats.min_x,
            self.stats.max_x,
            self.stats.min_y,
            self.stats.max_y,
            self.stats.min_z,
            self.stats.max_z,
        );
    }
}

////////////////////////////////////////////////////////////////////////////////
