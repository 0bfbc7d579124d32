//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Regional tile cache

use crate::cache::filecache::Filecache;
use crate::core::error::{Error, Result};
use crate::render::{decode_png, encode_png, RenderRequest, Renderer};
use image::RgbaImage;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tile_grid::{Grid, TileBatch};

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum CacheStatus {
    /// Loaded from an existing regional tile
    Hit,
    /// Rendered and stored
    Rendered,
}

/// Rendered regional images, one file per batch
#[derive(Clone)]
pub struct RegionalCache {
    cache: Filecache,
    grid: Grid,
    renderer: Arc<dyn Renderer>,
    layers: Vec<String>,
    timeout: Duration,
}

impl RegionalCache {
    pub fn new(
        cache: Filecache,
        renderer: Arc<dyn Renderer>,
        layers: Vec<String>,
        timeout: Duration,
    ) -> RegionalCache {
        RegionalCache {
            cache,
            grid: Grid::web_mercator(),
            renderer,
            layers,
            timeout,
        }
    }
    /// Relative path of a regional tile: `{zoom}_{x}_{y}_s{step}_b{border}.png`
    pub fn path(batch: &TileBatch) -> String {
        format!(
            "{}_{}_{}_s{}_b{}.png",
            batch.zoom, batch.x, batch.y, batch.step, batch.border
        )
    }
    pub fn exists(&self, batch: &TileBatch) -> bool {
        self.cache.exists(&Self::path(batch))
    }
    pub fn remove(&self, batch: &TileBatch) -> Result<()> {
        let path = Self::path(batch);
        self.cache
            .remove(&path)
            .map_err(|e| Error::io(self.cache.fullpath(&path).to_string_lossy(), e))
    }
    /// Render request of a batch
    pub fn render_request(&self, batch: &TileBatch) -> RenderRequest {
        RenderRequest {
            extent: batch.render_extent(&self.grid),
            srid: self.grid.srid,
            width: batch.pixel_size(),
            height: batch.pixel_size(),
            layers: self.layers.clone(),
            timeout: self.timeout,
        }
    }
    /// Regional image of a batch, rendered and stored if not cached yet
    pub fn obtain_raster(&self, batch: &TileBatch) -> Result<(RgbaImage, CacheStatus)> {
        let path = Self::path(batch);
        let fullpath = self.cache.fullpath(&path).to_string_lossy().to_string();
        if let Some(data) = self.cache.read(&path).map_err(|e| Error::io(&fullpath, e))? {
            debug!("{} - regional tile exists", path);
            let image = decode_png(&data).map_err(|e| {
                Error::io(&fullpath, io::Error::new(io::ErrorKind::InvalidData, e))
            })?;
            if image.dimensions() != (batch.pixel_size(), batch.pixel_size()) {
                return Err(Error::io(
                    &fullpath,
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "cached image has size {:?}, expected {}x{}",
                            image.dimensions(),
                            batch.pixel_size(),
                            batch.pixel_size()
                        ),
                    ),
                ));
            }
            return Ok((image, CacheStatus::Hit));
        }

        let request = self.render_request(batch);
        debug!("{} - rendering {:?}", path, request.extent);
        let started = Instant::now();
        let image = self.renderer.render(&request).map_err(|e| match e {
            Error::Render(msg) => Error::Render(format!("{}: {}", path, msg)),
            e => e,
        })?;
        let elapsed = started.elapsed();
        if elapsed > self.timeout {
            return Err(Error::Render(format!(
                "{}: rendering took {:?}, timeout is {:?}",
                path, elapsed, self.timeout
            )));
        }
        if image.dimensions() != (request.width, request.height) {
            return Err(Error::Render(format!(
                "{}: renderer returned {:?}, expected {}x{}",
                path,
                image.dimensions(),
                request.width,
                request.height
            )));
        }
        let png = encode_png(&image)?;
        if !self
            .cache
            .write(&path, &png)
            .map_err(|e| Error::io(&fullpath, e))?
        {
            debug!("{} - stored by concurrent writer", path);
        }
        Ok((image, CacheStatus::Rendered))
    }
}
