//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use std::io;
use thiserror::Error;
use tile_grid::OutOfRange;

/// Errors of the tile generation pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid zoom range, step or output path
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Area of interest not readable or without usable extent
    #[error("Area of interest error: {0}")]
    AreaOfInterest(String),

    /// Coordinate outside of the projection domain
    #[error("Projection error: {0}")]
    ProjectionRange(#[from] OutOfRange),

    /// Renderer failed, timed out or returned an image of wrong size
    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn io<P: AsRef<str>>(path: P, source: io::Error) -> Error {
        Error::Io {
            path: path.as_ref().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
