// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate fractalmesh;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use num::Complex;
use std::str::FromStr;

use fractalmesh::export::{save_heightmap, save_obj};
use fractalmesh::{assemble, sampler_for, BuildRequest, FractalKind, HeightField, Topology};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_named<T>(s: &str) -> Result<(), String>
where
    T: FromStr,
    T::Err: ToString,
{
    T::from_str(s).map(|_| ()).map_err(|e| e.to_string())
}

const KIND: &str = "kind";
const SIZE: &str = "size";
const ZOOM: &str = "zoom";
const CENTER: &str = "center";
const CONSTANT: &str = "constant";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const TOPOLOGY: &str = "topology";
const OUTPUT: &str = "output";
const HEIGHTMAP: &str = "heightmap";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("fractalmesh")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Fractal height-field mesh generator")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output OBJ file"),
        )
        .arg(
            Arg::with_name(KIND)
                .required(false)
                .long(KIND)
                .short("k")
                .takes_value(true)
                .default_value("mandelbrot")
                .validator(|s| validate_named::<FractalKind>(&s))
                .help("Fractal to raise: mandelbrot, julia or tree"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        4096,
                        "Could not parse grid size",
                        "Grid size must be between 1 and 4096",
                    )
                })
                .help("Number of cells along each side of the grid [default: 300]"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        ::std::f64::MIN_POSITIVE,
                        ::std::f64::MAX,
                        "Could not parse zoom",
                        "Zoom must be a positive number",
                    )
                })
                .help("Zoom factor; larger values look closer"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Center of the view on the complex plane, as re,im"),
        )
        .arg(
            Arg::with_name(CONSTANT)
                .required(false)
                .long(CONSTANT)
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse Julia constant"))
                .help("Additive constant of the Julia set, as re,im"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 200000",
                    )
                })
                .help("Iteration cap; the tree uses it as its brightest height"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to sample heights with"),
        )
        .arg(
            Arg::with_name(TOPOLOGY)
                .required(false)
                .long(TOPOLOGY)
                .takes_value(true)
                .default_value("triangles")
                .validator(|s| validate_named::<Topology>(&s))
                .help("Primitive to emit: triangles or lines"),
        )
        .arg(
            Arg::with_name(HEIGHTMAP)
                .required(false)
                .long(HEIGHTMAP)
                .takes_value(true)
                .help("Also write the heights as a PGM graymap"),
        )
        .get_matches()
}

// Every value reaching here has already passed its validator.
fn request_from(matches: &ArgMatches) -> fractalmesh::Result<BuildRequest> {
    let kind = FractalKind::from_str(matches.value_of(KIND).unwrap_or("mandelbrot"))?;
    let mut request = BuildRequest::new(kind);
    if let Some(size) = matches.value_of(SIZE).and_then(|s| u32::from_str(s).ok()) {
        request.size = size;
    }
    if let Some(topology) = matches.value_of(TOPOLOGY) {
        request.topology = Topology::from_str(topology)?;
    }
    if let Some(zoom) = matches.value_of(ZOOM).and_then(|s| f64::from_str(s).ok()) {
        request.params.zoom = zoom;
    }
    if let Some(center) = matches.value_of(CENTER).and_then(parse_complex) {
        request.params.center = center;
    }
    if let Some(constant) = matches.value_of(CONSTANT).and_then(parse_complex) {
        request.params.constant = constant;
    }
    if let Some(iterations) = matches.value_of(ITERATIONS).and_then(|s| u32::from_str(s).ok()) {
        request.params.max_iterations = iterations;
    }
    request.validate()?;
    Ok(request)
}

fn run(matches: &ArgMatches) -> fractalmesh::Result<()> {
    let request = request_from(matches)?;
    let threads = matches
        .value_of(THREADS)
        .and_then(|s| usize::from_str(s).ok())
        .unwrap_or(1);

    let sampler = sampler_for(&request)?;
    let field = HeightField::sample_threaded(request.size, &*sampler, threads, &|| false)?;
    let mesh = assemble(&request, &field);

    let output = matches.value_of(OUTPUT).unwrap_or("fractal.obj");
    let comment = format!(
        "{} {}x{} zoom {} center {},{}",
        request.kind,
        request.size,
        request.size,
        request.params.zoom,
        request.params.center.re,
        request.params.center.im
    );
    let primitives = save_obj(output, &mesh, &comment)?;
    info!("wrote {} primitives to {}", primitives, output);

    if let Some(heightmap) = matches.value_of(HEIGHTMAP) {
        save_heightmap(heightmap, &field, request.params.max_iterations)?;
        info!("wrote height map to {}", heightmap);
    }

    println!(
        "{} vertices, {} indices ({})",
        mesh.vertex_count(),
        mesh.index_count(),
        mesh.topology
    );
    if mesh.is_truncated() {
        println!(
            "dropped {} vertices, {} indices",
            mesh.dropped_vertices, mesh.dropped_indices
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Mesh failure: {}", e);
        std::process::exit(1);
    }
}
