// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writes meshes and height fields to disk: the mesh as a Wavefront
//! OBJ file with per-vertex colour, the heights as an 8-bit binary
//! graymap.

use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use error::Result;
use mesh::{HeightField, Mesh, Topology};
use tree::TreeBitmap;

/// Writes `mesh` as OBJ text.  Indices are 1-based in OBJ; primitives
/// that point past the vertices a truncated mesh managed to keep are
/// left out.  Returns the number of primitives written.
pub fn write_obj<W: Write>(out: &mut W, mesh: &Mesh, comment: &str) -> Result<usize> {
    writeln!(out, "# {}", comment)?;
    writeln!(
        out,
        "# {} vertices, {} indices, {}",
        mesh.vertex_count(),
        mesh.index_count(),
        mesh.topology
    )?;
    for v in &mesh.vertices {
        writeln!(out, "v {} {} {} {} {} {}", v.x, v.y, v.z, v.r, v.g, v.b)?;
    }

    let (arity, prefix) = match mesh.topology {
        Topology::Triangles => (3, "f"),
        Topology::Lines => (2, "l"),
    };
    let limit = mesh.vertex_count() as u32;
    let mut written = 0;
    for primitive in mesh.indices.chunks(arity) {
        if primitive.len() < arity || primitive.iter().any(|&i| i >= limit) {
            continue;
        }
        write!(out, "{}", prefix)?;
        for i in primitive {
            write!(out, " {}", i + 1)?;
        }
        writeln!(out)?;
        written += 1;
    }
    Ok(written)
}

/// Writes `mesh` to an OBJ file at `path`.
pub fn save_obj<P: AsRef<Path>>(path: P, mesh: &Mesh, comment: &str) -> Result<usize> {
    let mut out = BufWriter::new(File::create(path)?);
    let written = write_obj(&mut out, mesh, comment)?;
    out.flush()?;
    Ok(written)
}

fn write_graymap<P: AsRef<Path>>(path: P, pixels: &[u8], bounds: (u32, u32)) -> Result<()> {
    let output = File::create(path)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary));
    encoder.encode(pixels, bounds.0, bounds.1, ColorType::Gray(8))?;
    Ok(())
}

/// Scales every corner of `field` so `max` maps to white, laid out with
/// grid x across and grid y down.
pub fn heightmap_pixels(field: &HeightField, max: u32) -> Vec<u8> {
    let side = field.size() + 1;
    let max = u64::from(max.max(1));
    let mut pixels = Vec::with_capacity((side * side) as usize);
    for y in 0..side {
        for x in 0..side {
            let h = u64::from(field.get(x, y)).min(max);
            pixels.push((h * 255 / max) as u8);
        }
    }
    pixels
}

/// Writes the height field as a binary PGM of (N+1)×(N+1) pixels.
pub fn save_heightmap<P: AsRef<Path>>(path: P, field: &HeightField, max: u32) -> Result<()> {
    let side = field.size() + 1;
    write_graymap(path, &heightmap_pixels(field, max), (side, side))
}

/// Writes the tree bitmap as a binary PGM.
pub fn save_tree_bitmap<P: AsRef<Path>>(path: P, bitmap: &TreeBitmap) -> Result<()> {
    write_graymap(
        path,
        &**bitmap.image(),
        (bitmap.width(), bitmap.height()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh::{assemble, BuildRequest, MeshCapacity};
    use params::FractalKind;
    use planes::GridPoint;
    use std::fs;
    use tempfile::tempdir;
    use tree::{render_tree_bitmap, TreeParams};

    fn ramp() -> HeightField {
        HeightField::sample(2, &|c: GridPoint| c.0 * 100 + c.1)
    }

    #[test]
    fn obj_lists_every_vertex_and_triangle() {
        let request = BuildRequest::new(FractalKind::Mandelbrot).with_size(2);
        let mesh = assemble(&request, &ramp());
        let mut out = Vec::new();
        let written = write_obj(&mut out, &mesh, "test").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(written, 8);
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 16);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 8);
        assert!(text.contains("\nf 1 2 3\n"));
        assert!(text.contains("\nf 2 4 3\n"));
    }

    #[test]
    fn obj_uses_line_primitives_for_wireframes() {
        let mut request = BuildRequest::new(FractalKind::Julia).with_size(2);
        request.topology = Topology::Lines;
        let mesh = assemble(&request, &ramp());
        let mut out = Vec::new();
        assert_eq!(write_obj(&mut out, &mesh, "lines").unwrap(), 20);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\nl 1 2\n"));
        assert!(!text.contains("\nf "));
    }

    #[test]
    fn obj_skips_primitives_past_a_truncated_vertex_buffer() {
        let mut request = BuildRequest::new(FractalKind::Mandelbrot).with_size(2);
        request.capacity = Some(MeshCapacity { vertices: 6, indices: 48 });
        let mesh = assemble(&request, &ramp());
        let mut out = Vec::new();
        // only the first cell's two triangles reference kept vertices
        assert_eq!(write_obj(&mut out, &mesh, "short").unwrap(), 2);
    }

    #[test]
    fn heightmap_scales_to_white() {
        let field = HeightField::sample(1, &|c: GridPoint| if c == GridPoint(1, 0) { 250 } else { 0 });
        assert_eq!(heightmap_pixels(&field, 250), vec![0, 255, 0, 0]);
    }

    #[test]
    fn files_land_on_disk() {
        let dir = tempdir().unwrap();
        let request = BuildRequest::new(FractalKind::Tree).with_size(2);
        let mesh = assemble(&request, &ramp());
        save_obj(dir.path().join("m.obj"), &mesh, "disk").unwrap();
        save_heightmap(dir.path().join("h.pgm"), &ramp(), 255).unwrap();

        let pgm = fs::read(dir.path().join("h.pgm")).unwrap();
        assert!(pgm.starts_with(b"P5"));
        assert_eq!(&pgm[pgm.len() - 9..], &heightmap_pixels(&ramp(), 255)[..]);
        assert!(fs::metadata(dir.path().join("m.obj")).unwrap().len() > 0);
    }

    #[test]
    fn tree_bitmap_round_trips_through_pgm() {
        let dir = tempdir().unwrap();
        let bitmap = render_tree_bitmap(&TreeParams::for_grid(40)).unwrap();
        save_tree_bitmap(dir.path().join("t.pgm"), &bitmap).unwrap();
        let pgm = fs::read(dir.path().join("t.pgm")).unwrap();
        assert!(pgm.starts_with(b"P5"));
        assert_eq!(&pgm[pgm.len() - 40 * 40..], &**bitmap.image());
    }
}
