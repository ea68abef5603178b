// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type every fallible operation in the crate returns.

use std::io;

/// Everything that can go wrong while building or exporting a mesh.
/// Buffer overflow is deliberately *not* here: a mesh that runs out
/// of room reports how much it dropped and is still returned.
#[derive(Debug, Fail)]
pub enum MeshError {
    /// A parameter failed validation before any work was done.
    #[fail(display = "invalid parameters: {}", _0)]
    InvalidParams(String),

    /// The grid has so many cells that vertex indices would not fit in
    /// a u32.
    #[fail(display = "grid of size {} cannot be indexed with 32-bit indices", _0)]
    GridTooLarge(u32),

    /// A build was abandoned because a newer request replaced it.
    #[fail(display = "build superseded by a newer request")]
    Cancelled,

    /// One of the sampling threads panicked.
    #[fail(display = "a sampling thread panicked")]
    WorkerPanic,

    /// Writing an export file failed.
    #[fail(display = "i/o error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for MeshError {
    fn from(err: io::Error) -> MeshError {
        MeshError::Io(err)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = ::std::result::Result<T, MeshError>;
