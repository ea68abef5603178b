// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time evaluation for the Mandelbrot and Julia sets.
//!
//! Both sets iterate z ← z² + c and ask how long the orbit stays
//! inside the circle of radius 2.  The Mandelbrot set starts every
//! orbit at zero and adds the point being tested; the Julia set starts
//! the orbit at the point and adds a fixed constant.
//!
//! The count reported is the number of iterations applied before |z|²
//! first exceeds 4, with the starting value checked as well.  An orbit
//! that never leaves reports the iteration cap.

use num::Complex;

use error::{MeshError, Result};
use mesh::HeightSampler;
use params::{FractalKind, FractalParams, ESCAPE_RADIUS_SQR};
use planes::{GridMapper, GridPoint};

/// Counts the iterations of z ← z² + point, starting at zero, until the
/// orbit escapes or `max_iterations` is reached.
pub fn mandelbrot(point: Complex<f64>, max_iterations: u32) -> u32 {
    let mut z = Complex::new(0.0_f64, 0.0_f64);
    for i in 0..max_iterations {
        if z.norm_sqr() > ESCAPE_RADIUS_SQR {
            return i;
        }
        z = z * z + point;
    }
    max_iterations
}

/// Counts the iterations of z ← z² + c, starting at `start`.  The loop
/// runs a countdown of the iterations left and reports how many were
/// used.
pub fn julia(start: Complex<f64>, c: Complex<f64>, max_iterations: u32) -> u32 {
    let mut z = start;
    let mut remaining = max_iterations;
    while remaining > 0 {
        if z.norm_sqr() > ESCAPE_RADIUS_SQR {
            break;
        }
        z = z * z + c;
        remaining -= 1;
    }
    max_iterations - remaining
}

/// Which orbit a sampler iterates.  The tree has no orbit, so it has no
/// variant here.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Orbit {
    Mandelbrot,
    Julia(Complex<f64>),
}

/// A height sampler that evaluates escape times on a fixed grid.
#[derive(Copy, Clone, Debug)]
pub struct EscapeTime {
    mapper: GridMapper,
    orbit: Orbit,
    max_iterations: u32,
}

impl EscapeTime {
    /// Evaluates `kind` with `params` on an N×N grid.  Fails for an
    /// empty grid, for parameters that do not validate, and for the
    /// tree, which is sampled from a bitmap instead.
    pub fn new(size: u32, kind: FractalKind, params: FractalParams) -> Result<EscapeTime> {
        let orbit = match kind {
            FractalKind::Mandelbrot => Orbit::Mandelbrot,
            FractalKind::Julia => Orbit::Julia(params.constant),
            FractalKind::Tree => {
                return Err(MeshError::InvalidParams(
                    "the tree has no escape time; sample its bitmap".to_string(),
                ))
            }
        };
        if size == 0 {
            return Err(MeshError::InvalidParams("grid size must be at least 1".to_string()));
        }
        params.validate()?;
        Ok(EscapeTime {
            mapper: GridMapper::new(size, &params),
            orbit,
            max_iterations: params.max_iterations,
        })
    }
}

impl HeightSampler for EscapeTime {
    fn height(&self, corner: GridPoint) -> u32 {
        let point = self.mapper.grid_to_point(corner);
        match self.orbit {
            Orbit::Mandelbrot => mandelbrot(point, self.max_iterations),
            Orbit::Julia(c) => julia(point, c, self.max_iterations),
        }
    }
}

/// Evaluates one lattice corner of an N×N grid.  Builds a sampler for
/// the one call, so it checks its arguments the same way.
pub fn evaluate(
    grid_x: u32,
    grid_y: u32,
    kind: FractalKind,
    params: &FractalParams,
    size: u32,
) -> Result<u32> {
    let sampler = EscapeTime::new(size, kind, *params)?;
    Ok(sampler.height(GridPoint(grid_x, grid_y)))
}
