//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate log;

pub mod generator;
mod qgs_reader;
pub use generator::{BatchFailure, GenerateSummary, TileGenerator};
pub use qgs_reader::read_visible_layers;
