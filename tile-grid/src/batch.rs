//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Regional tile batches

use crate::grid::{extent_wgs84_to_merc, Extent, ExtentInt, Grid, OutOfRange, TILE_SIZE};

/// Block of `step` x `step` tiles rendered as one regional image.
///
/// The regional image is padded with `border` tiles on every side, which are
/// discarded when slicing.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct TileBatch {
    pub zoom: u8,
    /// Column of the lower left interior tile
    pub x: u32,
    /// Row of the lower left interior tile
    pub y: u32,
    pub step: u32,
    pub border: u32,
}

impl TileBatch {
    /// Number of tiles along one edge of the regional image
    pub fn tiles_per_side(&self) -> u32 {
        self.step + 2 * self.border
    }
    /// Width and height of the regional image in pixels
    pub fn pixel_size(&self) -> u32 {
        TILE_SIZE * self.tiles_per_side()
    }
    /// Projected extent of the regional image including its border
    pub fn render_extent(&self, grid: &Grid) -> Extent {
        let border = self.border as i64;
        let lower_left = grid.tile_extent(
            self.x as i64 - border,
            self.y as i64 - border,
            self.zoom,
        );
        let upper_right = grid.tile_extent(
            self.x as i64 + self.step as i64 + border - 1,
            self.y as i64 + self.step as i64 + border - 1,
            self.zoom,
        );
        Extent {
            minx: lower_left.minx,
            miny: lower_left.miny,
            maxx: upper_right.maxx,
            maxy: upper_right.maxy,
        }
    }
    /// Interior tiles `(x, y)`, column by column
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32)> {
        let (x0, y0, step) = (self.x, self.y, self.step);
        (x0..x0 + step).flat_map(move |x| (y0..y0 + step).map(move |y| (x, y)))
    }
}

/// Level iterator over the regional batches covering tile limits
pub struct BatchIterator {
    zoom: u8,
    step: u32,
    border: u32,
    limits: ExtentInt,
    x: u32,
    y: u32,
    finished: bool,
}

impl BatchIterator {
    pub fn new(zoom: u8, limits: ExtentInt, step: u32, border: u32) -> BatchIterator {
        // Return "empty" iterator for invalid parameters
        let finished = step == 0 || limits.minx > limits.maxx || limits.miny > limits.maxy;
        BatchIterator {
            zoom,
            step,
            border,
            x: limits.minx,
            y: limits.miny,
            limits,
            finished,
        }
    }
    /// Batches covering a geographic (EPSG:4326) extent
    pub fn for_extent(
        grid: &Grid,
        extent: &Extent,
        zoom: u8,
        step: u32,
        border: u32,
    ) -> Result<BatchIterator, OutOfRange> {
        let extent_merc = extent_wgs84_to_merc(extent)?;
        let limits = grid.tile_limits(&extent_merc, zoom);
        Ok(BatchIterator::new(zoom, limits, step, border))
    }
    pub fn limits(&self) -> &ExtentInt {
        &self.limits
    }
    /// Number of batches (columns, rows)
    pub fn batch_counts(&self) -> (u32, u32) {
        if self.step == 0 {
            return (0, 0);
        }
        (
            (self.limits.width() + self.step - 1) / self.step,
            (self.limits.height() + self.step - 1) / self.step,
        )
    }
    /// Total number of batches of a fresh iterator
    pub fn num_batches(&self) -> u64 {
        let (cols, rows) = self.batch_counts();
        cols as u64 * rows as u64
    }
}

impl Iterator for BatchIterator {
    type Item = TileBatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let current = TileBatch {
            zoom: self.zoom,
            x: self.x,
            y: self.y,
            step: self.step,
            border: self.border,
        };
        let next_y = self.y as u64 + self.step as u64;
        let next_x = self.x as u64 + self.step as u64;
        if next_y <= self.limits.maxy as u64 {
            self.y = next_y as u32;
        } else if next_x <= self.limits.maxx as u64 {
            self.x = next_x as u32;
            self.y = self.limits.miny;
        } else {
            self.finished = true;
        }
        Some(current)
    }
}
