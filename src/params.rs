// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-fractal parameters and the constants shared by every build.

use num::Complex;
use std::fmt;
use std::str::FromStr;

use error::{MeshError, Result};

/// Default number of cells along each side of the grid.
pub const FRACTAL_SIZE: u32 = 300;

/// An orbit is considered escaped once |z|² exceeds this.
pub const ESCAPE_RADIUS_SQR: f64 = 4.0;

/// Which fractal a build renders.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FractalKind {
    /// z ← z² + point, starting at zero.
    Mandelbrot,
    /// z ← z² + c, starting at the point.
    Julia,
    /// A branching stroke path rasterised into a bitmap.
    Tree,
}

impl FractalKind {
    /// Every kind, in menu order.
    pub const ALL: [FractalKind; 3] = [FractalKind::Mandelbrot, FractalKind::Julia, FractalKind::Tree];

    /// The lowercase name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            FractalKind::Mandelbrot => "mandelbrot",
            FractalKind::Julia => "julia",
            FractalKind::Tree => "tree",
        }
    }
}

impl fmt::Display for FractalKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FractalKind {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<FractalKind> {
        FractalKind::ALL
            .iter()
            .cloned()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MeshError::InvalidParams(format!("unknown fractal kind '{}'", s)))
    }
}

/// The knobs of one fractal view.  `constant` only matters for the
/// Julia set; for the tree, `max_iterations` is the intensity ceiling
/// the palette measures heights against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FractalParams {
    /// Width of the sampling window shrinks as this grows.
    pub zoom: f64,
    /// Offset of the window's center on the complex plane.
    pub center: Complex<f64>,
    /// The additive constant c of the Julia iteration.
    pub constant: Complex<f64>,
    /// The iteration cap.
    pub max_iterations: u32,
}

impl FractalParams {
    /// The default view for a fractal kind.
    pub fn for_kind(kind: FractalKind) -> FractalParams {
        match kind {
            FractalKind::Mandelbrot => FractalParams {
                zoom: 1.0,
                center: Complex::new(-0.5, 0.0),
                constant: Complex::new(0.0, 0.0),
                max_iterations: 250,
            },
            FractalKind::Julia => FractalParams {
                zoom: 1.0,
                center: Complex::new(0.0, 0.0),
                constant: Complex::new(-0.7, 0.27015),
                max_iterations: 255,
            },
            FractalKind::Tree => FractalParams {
                zoom: 1.0,
                center: Complex::new(0.0, 0.0),
                constant: Complex::new(0.0, 0.0),
                max_iterations: 255,
            },
        }
    }

    /// Rejects values that would produce a degenerate mesh.
    pub fn validate(&self) -> Result<()> {
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(MeshError::InvalidParams(format!(
                "zoom must be a positive number, got {}",
                self.zoom
            )));
        }
        if self.max_iterations == 0 {
            return Err(MeshError::InvalidParams(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        let finite = |c: &Complex<f64>| c.re.is_finite() && c.im.is_finite();
        if !finite(&self.center) || !finite(&self.constant) {
            return Err(MeshError::InvalidParams(
                "center and constant must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        for kind in FractalKind::ALL.iter() {
            assert!(FractalParams::for_kind(*kind).validate().is_ok());
        }
    }

    #[test]
    fn zero_zoom_is_rejected() {
        let mut params = FractalParams::for_kind(FractalKind::Mandelbrot);
        params.zoom = 0.0;
        assert!(params.validate().is_err());
        params.zoom = -2.0;
        assert!(params.validate().is_err());
        params.zoom = ::std::f64::NAN;
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let mut params = FractalParams::for_kind(FractalKind::Julia);
        params.max_iterations = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn kinds_parse_by_name() {
        assert_eq!("Julia".parse::<FractalKind>().unwrap(), FractalKind::Julia);
        assert_eq!("tree".parse::<FractalKind>().unwrap(), FractalKind::Tree);
        assert!("sierpinski".parse::<FractalKind>().is_err());
    }
}
