// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The branching tree.  Unlike the two escape-time sets the tree has no
//! formula to evaluate per point: it is drawn once, as a white stroke
//! path on a black bitmap, and the mesh builder then reads each grid
//! corner's height straight out of the pixels.
//!
//! Each branch is a line from its start in the direction of its angle,
//! measured in degrees from the +y axis (which points down the bitmap,
//! away from the root at the top edge).  A branch longer than the
//! minimum sprouts two children from its tip, each a little shorter and
//! turned by the spread to either side.

use image::{GrayImage, Pixel};

use error::{MeshError, Result};

/// Guards against parameter sets whose recursion would never bottom
/// out in practice.
const MAX_DEPTH: u32 = 24;

/// How to draw the tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeParams {
    /// Bitmap width in pixels.
    pub width: u32,
    /// Bitmap height in pixels.
    pub height: u32,
    /// Root of the trunk, in pixel coordinates.
    pub start: (f64, f64),
    /// Length of the trunk.
    pub length: f64,
    /// Direction of the trunk in degrees.
    pub angle_deg: f64,
    /// Width of the painted stroke.
    pub stroke_width: f64,
    /// How far each child turns away from its parent, in degrees.
    pub spread_deg: f64,
    /// How much shorter each child is than its parent.
    pub shrink: f64,
    /// Branches this short or shorter have no children.
    pub min_length: f64,
}

impl Default for TreeParams {
    fn default() -> TreeParams {
        TreeParams {
            width: 300,
            height: 300,
            start: (150.0, 0.0),
            length: 60.0,
            angle_deg: 0.0,
            stroke_width: 3.0,
            spread_deg: 18.0,
            shrink: 6.0,
            min_length: 4.0,
        }
    }
}

impl TreeParams {
    /// The default tree scaled onto a bitmap of `size`×`size` pixels,
    /// so a grid of any size sees the whole tree, one pixel per corner.
    pub fn for_grid(size: u32) -> TreeParams {
        let base = TreeParams::default();
        let k = f64::from(size) / f64::from(base.width);
        TreeParams {
            width: size,
            height: size,
            start: (base.start.0 * k, base.start.1 * k),
            length: base.length * k,
            stroke_width: base.stroke_width * k,
            shrink: base.shrink * k,
            min_length: base.min_length * k,
            ..base
        }
    }

    /// Rejects trees that cannot be drawn.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MeshError::InvalidParams(format!(
                "tree bitmap must have a nonzero area, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.stroke_width > 0.0) {
            return Err(MeshError::InvalidParams("stroke width must be positive".to_string()));
        }
        if !(self.shrink > 0.0) {
            return Err(MeshError::InvalidParams("branch shrink must be positive".to_string()));
        }
        let finite = [
            self.start.0,
            self.start.1,
            self.length,
            self.angle_deg,
            self.spread_deg,
            self.min_length,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(MeshError::InvalidParams("tree parameters must be finite".to_string()));
        }
        if self.depth() > MAX_DEPTH {
            return Err(MeshError::InvalidParams(format!(
                "tree would recurse {} levels deep, limit is {}",
                self.depth(),
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    /// Number of generations below the trunk.
    pub fn depth(&self) -> u32 {
        let mut length = self.length;
        let mut depth = 0;
        while length > self.min_length && depth <= MAX_DEPTH {
            length -= self.shrink;
            depth += 1;
        }
        depth
    }
}

/// One straight piece of the stroke path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    /// Where the branch starts.
    pub from: (f64, f64),
    /// Where the branch ends and its children start.
    pub to: (f64, f64),
}

/// Brings any angle into [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle % 360.0;
    if a < 0.0 {
        a + 360.0
    } else {
        a
    }
}

/// The offset from a branch's start to its tip.  Angle zero points
/// along +y; positive angles turn toward -x.
pub fn branch_offset(length: f64, angle_deg: f64) -> (f64, f64) {
    let rad = normalize_degrees(angle_deg).to_radians();
    (-rad.sin() * length, rad.cos() * length)
}

fn draw_branch(
    params: &TreeParams,
    start: (f64, f64),
    length: f64,
    angle: f64,
    segments: &mut Vec<Segment>,
) {
    let (dx, dy) = branch_offset(length, angle);
    let tip = (start.0 + dx, start.1 + dy);
    segments.push(Segment { from: start, to: tip });

    if length > params.min_length {
        draw_branch(params, tip, length - params.shrink, angle + params.spread_deg, segments);
        draw_branch(params, tip, length - params.shrink, angle - params.spread_deg, segments);
    }
}

/// Every segment of the tree, depth first, left child before right.
pub fn branches(params: &TreeParams) -> Vec<Segment> {
    let mut segments = Vec::new();
    draw_branch(params, params.start, params.length, params.angle_deg, &mut segments);
    segments
}

/// An 8-bit grayscale image of the tree, ready to be sampled.
#[derive(Clone, Debug)]
pub struct TreeBitmap {
    image: GrayImage,
}

impl TreeBitmap {
    /// Wraps an already drawn image.
    pub fn from_image(image: GrayImage) -> TreeBitmap {
        TreeBitmap { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The underlying image.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Intensity of the pixel at x, y.  Grid corners run one past the
    /// last pixel, so anything outside the bitmap is simply zero.
    pub fn sample_height(&self, x: u32, y: u32) -> u32 {
        if x >= self.image.width() || y >= self.image.height() {
            return 0;
        }
        u32::from(self.image.get_pixel(x, y).channels()[0])
    }

    fn stroke(&mut self, segment: &Segment, width: f64) {
        let radius = width / 2.0;
        let (w, h) = (self.image.width(), self.image.height());
        let lo_x = (segment.from.0.min(segment.to.0) - radius).floor().max(0.0);
        let hi_x = (segment.from.0.max(segment.to.0) + radius).ceil();
        let lo_y = (segment.from.1.min(segment.to.1) - radius).floor().max(0.0);
        let hi_y = (segment.from.1.max(segment.to.1) + radius).ceil();
        if hi_x < 0.0 || hi_y < 0.0 || lo_x >= f64::from(w) || lo_y >= f64::from(h) {
            return;
        }
        let hi_x = (hi_x as u32).min(w - 1);
        let hi_y = (hi_y as u32).min(h - 1);

        for y in (lo_y as u32)..=hi_y {
            for x in (lo_x as u32)..=hi_x {
                let center = (f64::from(x) + 0.5, f64::from(y) + 0.5);
                if distance_to_segment(center, segment) <= radius {
                    self.image.get_pixel_mut(x, y).channels_mut()[0] = 255;
                }
            }
        }
    }
}

fn distance_to_segment(p: (f64, f64), segment: &Segment) -> f64 {
    let (ax, ay) = segment.from;
    let (bx, by) = segment.to;
    let (dx, dy) = (bx - ax, by - ay);
    let len_sqr = dx * dx + dy * dy;
    let t = if len_sqr == 0.0 {
        0.0
    } else {
        (((p.0 - ax) * dx + (p.1 - ay) * dy) / len_sqr).max(0.0).min(1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((p.0 - cx) * (p.0 - cx) + (p.1 - cy) * (p.1 - cy)).sqrt()
}

/// Draws the tree.  Must happen once, before any heights are sampled.
pub fn render_tree_bitmap(params: &TreeParams) -> Result<TreeBitmap> {
    params.validate()?;
    let segments = branches(params);
    debug!(
        "drawing tree of {} segments into a {}x{} bitmap",
        segments.len(),
        params.width,
        params.height
    );
    let mut bitmap = TreeBitmap::from_image(GrayImage::new(params.width, params.height));
    for segment in &segments {
        bitmap.stroke(segment, params.stroke_width);
    }
    Ok(bitmap)
}
