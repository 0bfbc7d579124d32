//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::cache::Filecache;
use crate::core::error::{Error, Result};
use crate::render::encode_png;
use image::imageops;
use image::RgbaImage;
use std::fmt;
use std::str::FromStr;
use tile_grid::{Grid, TileBatch, TILE_SIZE};

/// Row numbering of output tiles
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Naming {
    /// row = 2^zoom - y - 1
    Tms,
    /// row = y
    Google,
}

impl FromStr for Naming {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tms" => Ok(Naming::Tms),
            "google" => Ok(Naming::Google),
            _ => Err(format!(
                "Unknown tile naming '{}' (expected tms or google)",
                s
            )),
        }
    }
}

impl fmt::Display for Naming {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Naming::Tms => write!(f, "tms"),
            Naming::Google => write!(f, "google"),
        }
    }
}

#[derive(PartialEq, Default, Clone, Copy, Debug)]
pub struct SliceStats {
    pub written: u64,
    /// Tiles already present
    pub skipped: u64,
}

/// Cuts regional images into output tiles `{zoom}/{x}/{row}.png`
#[derive(Clone, Debug)]
pub struct TileSlicer {
    cache: Filecache,
    grid: Grid,
    naming: Naming,
}

impl TileSlicer {
    pub fn new(cache: Filecache, naming: Naming) -> TileSlicer {
        TileSlicer {
            cache,
            grid: Grid::web_mercator(),
            naming,
        }
    }
    /// Pixel position of tile (x, y) within the regional image of `batch`
    pub fn crop_origin(batch: &TileBatch, x: u32, y: u32) -> (u32, u32) {
        let px = TILE_SIZE * (batch.border + (x - batch.x));
        // image rows grow southward, tile rows northward
        let py = TILE_SIZE * (batch.border + (batch.step - 1 - (y - batch.y)));
        (px, py)
    }
    pub fn row(&self, y: u32, zoom: u8) -> u32 {
        match self.naming {
            Naming::Tms => self.grid.ytile_flipped(y, zoom),
            Naming::Google => y,
        }
    }
    pub fn tile_path(zoom: u8, x: u32, row: u32) -> String {
        format!("{}/{}/{}.png", zoom, x, row)
    }
    /// Interior tiles of `batch` inside the grid, with their output path
    fn grid_tiles<'a>(&'a self, batch: &TileBatch) -> impl Iterator<Item = (u32, u32, String)> + 'a {
        let zoom = batch.zoom;
        let (maxx, maxy) = self.grid.level_limit(zoom);
        batch
            .tiles()
            .filter(move |&(x, y)| x < maxx && y < maxy)
            .map(move |(x, y)| (x, y, Self::tile_path(zoom, x, self.row(y, zoom))))
    }
    /// Number of interior tiles of `batch` inside the grid
    pub fn grid_tile_count(&self, batch: &TileBatch) -> usize {
        self.grid_tiles(batch).count()
    }
    /// Number of tiles of `batch` not written yet
    pub fn pending_tiles(&self, batch: &TileBatch) -> usize {
        self.grid_tiles(batch)
            .filter(|(_, _, path)| !self.cache.exists(path))
            .count()
    }
    /// Write all missing tiles of `batch` from its regional image
    pub fn slice(&self, batch: &TileBatch, raster: &RgbaImage) -> Result<SliceStats> {
        if raster.dimensions() != (batch.pixel_size(), batch.pixel_size()) {
            return Err(Error::Render(format!(
                "Regional image of {:?} has size {:?}",
                batch,
                raster.dimensions()
            )));
        }
        let mut stats = SliceStats::default();
        for (x, y, path) in self.grid_tiles(batch) {
            if self.cache.exists(&path) {
                debug!("{} - tile exists", path);
                stats.skipped += 1;
                continue;
            }
            let (px, py) = Self::crop_origin(batch, x, y);
            let tile = imageops::crop_imm(raster, px, py, TILE_SIZE, TILE_SIZE).to_image();
            let png = encode_png(&tile)?;
            let written = self.cache.write(&path, &png).map_err(|e| {
                Error::io(self.cache.fullpath(&path).to_string_lossy(), e)
            })?;
            if written {
                stats.written += 1;
            } else {
                stats.skipped += 1;
            }
        }
        let outside = batch.tiles().count() as u64 - stats.written - stats.skipped;
        if outside > 0 {
            debug!("{:?} - {} tiles outside of grid", batch, outside);
        }
        Ok(stats)
    }
}
