// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the GridMapper struct, which describes the relationship
//! between the integral lattice of a height-field mesh, with corners
//! running from 0,0 to N,N, and a window on the complex plane whose
//! width is set by a zoom factor and whose middle is set by a center
//! offset.
use num::Complex;

use params::FractalParams;

/// Horizontal stretch of the window relative to its height.  The
/// real axis is sampled half again as wide as the imaginary one so the
/// Mandelbrot set's bulk fits across the grid.
pub const REAL_SCALE: f64 = 1.5;

/// Vertical scale of the window.
pub const IMAG_SCALE: f64 = 1.0;

/// Describes the x, y of one lattice corner.  The lattice of an N×N
/// grid has corners 0..=N along each axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GridPoint(pub u32, pub u32);

/// Maps lattice corners to points on the complex plane.
#[derive(Copy, Clone, Debug)]
pub struct GridMapper {
    /// Number of cells along one side of the grid.
    pub size: u32,
    /// The complex point that sits at the middle of the grid.
    pub center: Complex<f64>,
    // Half the grid, rounded down the way integer division does it.
    half: i64,
    // Number of cells spanning one unit of the complex plane, before
    // the per-axis scale is applied.
    span: f64,
}

impl GridMapper {
    /// Constructor.  Takes the number of cells along one side and the
    /// zoom and center of the fractal view.  The parameters are assumed
    /// to have been validated.
    pub fn new(size: u32, params: &FractalParams) -> GridMapper {
        GridMapper {
            size,
            center: params.center,
            half: i64::from(size / 2),
            span: 0.5 * params.zoom * f64::from(size),
        }
    }

    /// Given a corner of the lattice, return the complex number that
    /// corresponds to it.  Corners may lie past N; the mapping simply
    /// keeps going.
    pub fn grid_to_point(&self, corner: GridPoint) -> Complex<f64> {
        let dx = (i64::from(corner.0) - self.half) as f64;
        let dy = (i64::from(corner.1) - self.half) as f64;
        Complex::new(
            REAL_SCALE * dx / self.span + self.center.re,
            IMAG_SCALE * dy / self.span + self.center.im,
        )
    }

    /// The complex window covered by the lattice, as the corners
    /// (0,0) and (N,N).
    pub fn bounds(&self) -> (Complex<f64>, Complex<f64>) {
        (
            self.grid_to_point(GridPoint(0, 0)),
            self.grid_to_point(GridPoint(self.size, self.size)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use params::FractalKind;

    fn view(zoom: f64, re: f64, im: f64) -> FractalParams {
        let mut params = FractalParams::for_kind(FractalKind::Mandelbrot);
        params.zoom = zoom;
        params.center = Complex::new(re, im);
        params
    }

    #[test]
    fn middle_of_grid_maps_to_center() {
        let gm = GridMapper::new(300, &view(1.0, -0.5, 0.0));
        assert_eq!(gm.grid_to_point(GridPoint(150, 150)), Complex::new(-0.5, 0.0));
    }

    #[test]
    fn default_view_places_origin_at_200_150() {
        let gm = GridMapper::new(300, &view(1.0, -0.5, 0.0));
        assert_eq!(gm.grid_to_point(GridPoint(200, 150)), Complex::new(0.0, 0.0));
    }

    #[test]
    fn real_axis_is_wider_than_imaginary() {
        let gm = GridMapper::new(4, &view(1.0, 0.0, 0.0));
        let (lo, hi) = gm.bounds();
        assert_eq!(lo, Complex::new(-1.5, -1.0));
        assert_eq!(hi, Complex::new(1.5, 1.0));
    }

    #[test]
    fn zoom_narrows_the_window() {
        let gm = GridMapper::new(4, &view(2.0, 0.0, 0.0));
        let (lo, hi) = gm.bounds();
        assert_eq!(lo, Complex::new(-0.75, -0.5));
        assert_eq!(hi, Complex::new(0.75, 0.5));
    }

    #[test]
    fn odd_sizes_round_half_down() {
        let gm = GridMapper::new(5, &view(1.0, 0.0, 0.0));
        // half is 2, so corner 2 is the center
        assert_eq!(gm.grid_to_point(GridPoint(2, 2)), Complex::new(0.0, 0.0));
    }
}
