// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Height-field mesh construction.
//!
//! The grid is N×N cells over the unit square.  Every lattice corner is
//! sampled exactly once into a `HeightField`, then each cell, in scan
//! order (x outer, y inner), emits four fresh vertices and the index
//! pattern of the chosen topology.  Corners shared between cells are
//! emitted once per cell; only the sampling is shared.
//!
//! Both buffers have a fixed capacity.  An append past capacity does
//! nothing except bump a counter, so a build always finishes and the
//! caller can see exactly how much was lost.

use crossbeam;
use itertools::iproduct;
use std::fmt;
use std::str::FromStr;

use error::{MeshError, Result};
use escape::EscapeTime;
use palette::Palette;
use params::{FractalKind, FractalParams, FRACTAL_SIZE};
use planes::GridPoint;
use tree::{render_tree_bitmap, TreeBitmap, TreeParams};

/// Anything that can give the height of a lattice corner.  Samplers
/// are shared between sampling threads, so they must be `Sync`.
pub trait HeightSampler: Sync {
    /// Height of one corner.  Must depend on nothing but the corner.
    fn height(&self, corner: GridPoint) -> u32;
}

impl<F> HeightSampler for F
where
    F: Fn(GridPoint) -> u32 + Sync,
{
    fn height(&self, corner: GridPoint) -> u32 {
        self(corner)
    }
}

impl HeightSampler for TreeBitmap {
    fn height(&self, corner: GridPoint) -> u32 {
        self.sample_height(corner.0, corner.1)
    }
}

/// One vertex as a renderer expects it: position, then colour.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    /// Grid x over N.
    pub x: f32,
    /// Height over 255.
    pub y: f32,
    /// Grid y over N.
    pub z: f32,
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
}

/// Offsets of the four corners of a cell, in the order their vertices
/// are emitted.
pub const CELL_CORNERS: [(u32, u32); 4] = [(0, 1), (0, 0), (1, 1), (1, 0)];

const TRIANGLE_PATTERN: [u32; 6] = [0, 1, 2, 1, 3, 2];
const LINE_PATTERN: [u32; 10] = [0, 1, 1, 2, 2, 0, 1, 3, 3, 2];

/// How a cell's four vertices are connected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Two filled triangles per cell.
    Triangles,
    /// Line pairs tracing both triangles' edges, the shared diagonal
    /// drawn once.
    Lines,
}

impl Default for Topology {
    fn default() -> Topology {
        Topology::Triangles
    }
}

impl Topology {
    /// Indices one cell contributes, relative to its first vertex.
    pub fn pattern(self) -> &'static [u32] {
        match self {
            Topology::Triangles => &TRIANGLE_PATTERN,
            Topology::Lines => &LINE_PATTERN,
        }
    }

    /// The lowercase name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Topology::Triangles => "triangles",
            Topology::Lines => "lines",
        }
    }

    // Index buffer entries reserved per cell.  Filled triangles reserve
    // twice what they use.
    fn reserved_per_cell(self) -> usize {
        match self {
            Topology::Triangles => 12,
            Topology::Lines => 10,
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topology {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Topology> {
        match s.to_ascii_lowercase().as_str() {
            "triangles" => Ok(Topology::Triangles),
            "lines" => Ok(Topology::Lines),
            _ => Err(MeshError::InvalidParams(format!("unknown topology '{}'", s))),
        }
    }
}

/// Upper bounds on the two buffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshCapacity {
    /// Most vertices the mesh will hold.
    pub vertices: usize,
    /// Most indices the mesh will hold.
    pub indices: usize,
}

impl MeshCapacity {
    /// Room for every cell of an N×N grid.
    pub fn for_grid(size: u32, topology: Topology) -> MeshCapacity {
        let cells = (size as usize) * (size as usize);
        MeshCapacity {
            vertices: cells * 4,
            indices: cells * topology.reserved_per_cell(),
        }
    }
}

/// Everything one build needs besides the sampler.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BuildRequest {
    /// Cells along each side.
    pub size: u32,
    /// What to render.
    pub kind: FractalKind,
    /// The view.
    pub params: FractalParams,
    /// How to connect each cell.
    pub topology: Topology,
    /// Buffer bounds; `None` means room for the whole grid.
    pub capacity: Option<MeshCapacity>,
}

impl BuildRequest {
    /// The default view of a kind on the default grid.
    pub fn new(kind: FractalKind) -> BuildRequest {
        BuildRequest {
            size: FRACTAL_SIZE,
            kind,
            params: FractalParams::for_kind(kind),
            topology: Topology::default(),
            capacity: None,
        }
    }

    /// Same request on a grid of a different size.
    pub fn with_size(mut self, size: u32) -> BuildRequest {
        self.size = size;
        self
    }

    /// Checks the grid and the view.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(MeshError::InvalidParams("grid size must be at least 1".to_string()));
        }
        let vertices = 4 * u64::from(self.size) * u64::from(self.size);
        if vertices > u64::from(u32::max_value()) {
            return Err(MeshError::GridTooLarge(self.size));
        }
        self.params.validate()
    }

    /// The effective buffer bounds.
    pub fn capacity(&self) -> MeshCapacity {
        self.capacity
            .unwrap_or_else(|| MeshCapacity::for_grid(self.size, self.topology))
    }
}

/// The sampled heights of every lattice corner of an N×N grid, stored
/// column by column: (N+1) columns of (N+1) corners.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    size: u32,
    heights: Vec<u32>,
}

impl HeightField {
    /// Samples every corner on the calling thread.
    pub fn sample<S: HeightSampler + ?Sized>(size: u32, sampler: &S) -> HeightField {
        let side = size + 1;
        let heights = iproduct!(0..side, 0..side)
            .map(|(x, y)| sampler.height(GridPoint(x, y)))
            .collect();
        HeightField { size, heights }
    }

    /// Samples every corner, splitting the columns between `threads`
    /// scoped threads.  `is_cancelled` is polled between columns; once
    /// it answers true the remaining columns are skipped and the whole
    /// call fails with `Cancelled`.
    pub fn sample_threaded<S: HeightSampler + ?Sized>(
        size: u32,
        sampler: &S,
        threads: usize,
        is_cancelled: &(dyn Fn() -> bool + Sync),
    ) -> Result<HeightField> {
        let side = (size + 1) as usize;
        let threads = threads.max(1).min(side);
        let columns_per_thread = (side + threads - 1) / threads;
        let mut heights = vec![0u32; side * side];

        let outcome = crossbeam::scope(|spawner| {
            let regions: Vec<&mut [u32]> = heights.chunks_mut(columns_per_thread * side).collect();
            let handles: Vec<_> = regions
                .into_iter()
                .enumerate()
                .map(|(i, region)| {
                    let first_column = i * columns_per_thread;
                    spawner.spawn(move |_| {
                        for (offset, column) in region.chunks_mut(side).enumerate() {
                            if is_cancelled() {
                                return false;
                            }
                            let x = (first_column + offset) as u32;
                            for (y, height) in column.iter_mut().enumerate() {
                                *height = sampler.height(GridPoint(x, y as u32));
                            }
                        }
                        true
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(false))
                .fold(true, |all, finished| all && finished)
        });

        match outcome {
            Err(_) => Err(MeshError::WorkerPanic),
            Ok(false) if is_cancelled() => Err(MeshError::Cancelled),
            Ok(false) => Err(MeshError::WorkerPanic),
            Ok(true) => Ok(HeightField { size, heights }),
        }
    }

    /// Cells along each side.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Height of a corner; both coordinates run 0..=N.
    pub fn get(&self, x: u32, y: u32) -> u32 {
        let side = self.size as usize + 1;
        self.heights[x as usize * side + y as usize]
    }
}

/// The output of a build.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Vertices in emission order.
    pub vertices: Vec<Vertex>,
    /// Indices into `vertices`.
    pub indices: Vec<u32>,
    /// How the indices are to be read.
    pub topology: Topology,
    /// The bounds the buffers were built under.
    pub capacity: MeshCapacity,
    /// Vertices that did not fit.
    pub dropped_vertices: usize,
    /// Indices that did not fit.
    pub dropped_indices: usize,
}

impl Mesh {
    /// An empty mesh bounded by `capacity`.  Storage is reserved for
    /// what an N×N grid can actually emit, however generous the bound.
    pub fn with_capacity(capacity: MeshCapacity, topology: Topology, size: u32) -> Mesh {
        let cells = u64::from(size) * u64::from(size);
        let reserve = |bound: usize, per_cell: usize| {
            let needed = cells.saturating_mul(per_cell as u64);
            if needed < bound as u64 {
                needed as usize
            } else {
                bound
            }
        };
        Mesh {
            vertices: Vec::with_capacity(reserve(capacity.vertices, CELL_CORNERS.len())),
            indices: Vec::with_capacity(reserve(capacity.indices, topology.pattern().len())),
            topology,
            capacity,
            dropped_vertices: 0,
            dropped_indices: 0,
        }
    }

    /// Vertices actually written.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Indices actually written.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether anything was dropped for lack of room.
    pub fn is_truncated(&self) -> bool {
        self.dropped_vertices > 0 || self.dropped_indices > 0
    }

    fn push_vertex(&mut self, vertex: Vertex) {
        if self.vertices.len() < self.capacity.vertices {
            self.vertices.push(vertex);
        } else {
            self.dropped_vertices += 1;
        }
    }

    fn push_index(&mut self, index: u32) {
        if self.indices.len() < self.capacity.indices {
            self.indices.push(index);
        } else {
            self.dropped_indices += 1;
        }
    }

    /// The vertex buffer as packed little-endian f32s, six per vertex.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.vertices.len() * 24);
        for v in &self.vertices {
            for f in &[v.x, v.y, v.z, v.r, v.g, v.b] {
                bytes.extend_from_slice(&f.to_bits().to_le_bytes());
            }
        }
        bytes
    }

    /// The index buffer as packed little-endian u32s.
    pub fn index_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.indices.len() * 4);
        for i in &self.indices {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes
    }
}

/// Turns a sampled height field into a mesh.
pub fn assemble(request: &BuildRequest, field: &HeightField) -> Mesh {
    let size = field.size();
    let delta = 1.0 / size as f32;
    let palette = Palette::for_kind(request.kind);
    let max = request.params.max_iterations;
    let pattern = request.topology.pattern();
    let mut mesh = Mesh::with_capacity(request.capacity(), request.topology, size);

    for (x, y) in iproduct!(0..size, 0..size) {
        let base = mesh.vertex_count() as u32;
        // a cell whose vertices won't all fit contributes no indices, so
        // every index written names a vertex that was written
        if mesh.vertex_count() + CELL_CORNERS.len() <= mesh.capacity.vertices {
            for offset in pattern {
                mesh.push_index(base + offset);
            }
        } else {
            mesh.dropped_indices += pattern.len();
        }
        for &(dx, dy) in &CELL_CORNERS {
            let (gx, gy) = (x + dx, y + dy);
            let height = field.get(gx, gy);
            let [r, g, b] = palette.color(height, max);
            mesh.push_vertex(Vertex {
                x: gx as f32 * delta,
                y: height as f32 / 255.0,
                z: gy as f32 * delta,
                r,
                g,
                b,
            });
        }
    }

    if mesh.is_truncated() {
        warn!(
            "mesh truncated: dropped {} vertices and {} indices",
            mesh.dropped_vertices, mesh.dropped_indices
        );
    }
    mesh
}

/// Builds a mesh on the calling thread.
pub fn build<S: HeightSampler + ?Sized>(request: &BuildRequest, sampler: &S) -> Result<Mesh> {
    request.validate()?;
    debug!("building {} mesh of {}x{} cells", request.kind, request.size, request.size);
    let field = HeightField::sample(request.size, sampler);
    Ok(assemble(request, &field))
}

/// Builds a mesh, sampling on `threads` threads.  The result is
/// identical to `build`.
pub fn build_threaded<S: HeightSampler + ?Sized>(
    request: &BuildRequest,
    sampler: &S,
    threads: usize,
) -> Result<Mesh> {
    build_cancellable(request, sampler, threads, &|| false)
}

/// Like `build_threaded`, abandoning the build once `is_cancelled`
/// answers true.
pub fn build_cancellable<S: HeightSampler + ?Sized>(
    request: &BuildRequest,
    sampler: &S,
    threads: usize,
    is_cancelled: &(dyn Fn() -> bool + Sync),
) -> Result<Mesh> {
    request.validate()?;
    debug!(
        "building {} mesh of {}x{} cells on {} threads",
        request.kind, request.size, request.size, threads
    );
    let field = HeightField::sample_threaded(request.size, sampler, threads, is_cancelled)?;
    let mesh = assemble(request, &field);
    info!(
        "{} mesh built: {} vertices, {} indices",
        request.kind,
        mesh.vertex_count(),
        mesh.index_count()
    );
    Ok(mesh)
}

/// The sampler a kind is drawn with: an escape-time evaluator, or the
/// tree drawn to fit the grid.
pub fn sampler_for(request: &BuildRequest) -> Result<Box<dyn HeightSampler>> {
    match request.kind {
        FractalKind::Mandelbrot | FractalKind::Julia => Ok(Box::new(EscapeTime::new(
            request.size,
            request.kind,
            request.params,
        )?)),
        FractalKind::Tree => Ok(Box::new(render_tree_bitmap(&TreeParams::for_grid(request.size))?)),
    }
}

/// Builds the mesh a request describes with its kind's own sampler.
pub fn build_fractal(request: &BuildRequest, threads: usize) -> Result<Mesh> {
    request.validate()?;
    let sampler = sampler_for(request)?;
    build_threaded(request, &*sampler, threads)
}
