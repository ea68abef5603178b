#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fractal height-field meshes
//!
//! Lay an N×N grid of square cells over a fractal and give every corner
//! of the grid a height: for the Mandelbrot and Julia sets that height
//! is the escape time of the corresponding point on the complex plane,
//! and for the branching tree it is the intensity of a pixel in a
//! bitmap the tree was drawn into.  Raise each corner to its height,
//! colour it by how quickly it escaped, and the grid becomes a colourful
//! relief, ready to be handed to a renderer as a vertex buffer and an
//! index buffer.
//!
//! The heavy part is the sampling, which runs on as many threads as
//! you ask for.  `MeshWorker` moves the whole build onto a background
//! thread, abandoning builds that a newer request has made pointless.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate tempfile;

pub mod error;
pub mod escape;
pub mod export;
pub mod mesh;
pub mod palette;
pub mod params;
pub mod planes;
pub mod tree;
pub mod worker;

pub use error::{MeshError, Result};
pub use escape::{evaluate, EscapeTime};
pub use mesh::{
    assemble, build, build_fractal, build_threaded, sampler_for, BuildRequest, HeightField,
    HeightSampler, Mesh, MeshCapacity, Topology, Vertex,
};
pub use palette::color_for;
pub use params::{FractalKind, FractalParams, FRACTAL_SIZE};
pub use planes::{GridMapper, GridPoint};
pub use tree::{render_tree_bitmap, TreeBitmap, TreeParams};
pub use worker::{BuildOutcome, MeshWorker};
