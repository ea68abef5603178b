// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#[macro_use]
extern crate criterion;
extern crate fractalmesh;

use criterion::Criterion;
use fractalmesh::{build_fractal, render_tree_bitmap, BuildRequest, FractalKind, TreeParams};

fn mandelbrot_mesh(c: &mut Criterion) {
    let request = BuildRequest::new(FractalKind::Mandelbrot).with_size(100);
    c.bench_function("mandelbrot 100x100", move |b| {
        b.iter(|| build_fractal(&request, 1).unwrap())
    });
}

fn julia_mesh_threaded(c: &mut Criterion) {
    let request = BuildRequest::new(FractalKind::Julia).with_size(100);
    c.bench_function("julia 100x100, 4 threads", move |b| {
        b.iter(|| build_fractal(&request, 4).unwrap())
    });
}

fn tree_bitmap(c: &mut Criterion) {
    c.bench_function("tree bitmap 300x300", |b| {
        b.iter(|| render_tree_bitmap(&TreeParams::default()).unwrap())
    });
}

criterion_group!(benches, mandelbrot_mesh, julia_mesh_threaded, tree_bitmap);
criterion_main!(benches);
