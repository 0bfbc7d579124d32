//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod area;
pub mod config;
pub mod error;
pub mod settings;
pub mod stats;

pub use self::area::AreaOfInterest;
pub use self::config::{parse_config, read_config, ApplicationCfg, Config};
pub use self::error::{Error, Result};
pub use self::settings::GenerateSettings;

#[cfg(test)]
mod config_test;
