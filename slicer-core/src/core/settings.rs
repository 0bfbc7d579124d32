//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::{Config, GenerateCfg};
use crate::slicer::Naming;
use std::time::Duration;
use tile_grid::{Grid, TILE_SIZE};

pub const DEFAULT_STEP: u32 = 16;
pub const DEFAULT_BORDER: u32 = 2;
pub const DEFAULT_RENDER_TIMEOUT: u64 = 300;
/// Maximal width and height of a regional tile in pixels
pub const MAX_REGIONAL_SIZE: u64 = 32768;

/// Validated parameters of a generation run
#[derive(Clone, Debug)]
pub struct GenerateSettings {
    pub minzoom: u8,
    pub maxzoom: u8,
    pub step: u32,
    pub border: u32,
    pub output: String,
    pub naming: Naming,
    pub threads: usize,
    pub render_timeout: Duration,
    pub keep_regional: bool,
    pub progress: bool,
}

impl<'a> Config<'a, GenerateCfg> for GenerateSettings {
    fn from_config(cfg: &GenerateCfg) -> Result<Self, String> {
        let minzoom = cfg.minzoom.ok_or("Missing minzoom".to_string())?;
        let maxzoom = cfg.maxzoom.ok_or("Missing maxzoom".to_string())?;
        let grid_maxzoom = Grid::web_mercator().maxzoom();
        if maxzoom > grid_maxzoom {
            return Err(format!(
                "maxzoom {} exceeds maximal zoom level {}",
                maxzoom, grid_maxzoom
            ));
        }
        if minzoom > maxzoom {
            return Err(format!(
                "minzoom {} is greater than maxzoom {}",
                minzoom, maxzoom
            ));
        }
        let step = cfg.step.unwrap_or(DEFAULT_STEP);
        if step == 0 {
            return Err("step must be greater than 0".to_string());
        }
        let border = cfg.border.unwrap_or(DEFAULT_BORDER);
        let regional_size = TILE_SIZE as u64 * (step as u64 + 2 * border as u64);
        if regional_size > MAX_REGIONAL_SIZE {
            return Err(format!(
                "Regional tile size {}px (step {}, border {}) exceeds maximum of {}px",
                regional_size, step, border, MAX_REGIONAL_SIZE
            ));
        }
        let output = match cfg.output {
            Some(ref output) if !output.is_empty() => output.clone(),
            _ => return Err("Missing output directory".to_string()),
        };
        let naming = match cfg.naming {
            Some(ref naming) => naming.parse::<Naming>()?,
            None => Naming::Tms,
        };
        let threads = cfg.threads.unwrap_or(1);
        if threads == 0 {
            return Err("threads must be at least 1".to_string());
        }
        Ok(GenerateSettings {
            minzoom,
            maxzoom,
            step,
            border,
            output,
            naming,
            threads,
            render_timeout: Duration::from_secs(
                cfg.render_timeout.unwrap_or(DEFAULT_RENDER_TIMEOUT),
            ),
            keep_regional: cfg.keep_regional.unwrap_or(true),
            progress: false,
        })
    }
    fn gen_config() -> String {
        let toml = r#"
[generate]
minzoom = 10
maxzoom = 15
# Number of map tiles along one edge of a regional tile
step = 16
# Number of extra map tiles rendered around a regional tile
border = 2
# Directory for regional tiles and tile pyramid
output = "/tmp/tiles"
# Row numbering: tms or google
naming = "tms"
# Number of regional tiles rendered in parallel
#threads = 1
# Render timeout in seconds
#render_timeout = 300
# Keep regional tiles after slicing
#keep_regional = true
"#;
        toml.to_string()
    }
    fn gen_runtime_config(&self) -> String {
        format!(
            r#"
[generate]
minzoom = {}
maxzoom = {}
step = {}
border = {}
output = "{}"
naming = "{}"
threads = {}
render_timeout = {}
keep_regional = {}
"#,
            self.minzoom,
            self.maxzoom,
            self.step,
            self.border,
            self.output,
            self.naming,
            self.threads,
            self.render_timeout.as_secs(),
            self.keep_regional
        )
    }
}
