//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::qgs_reader::read_visible_layers;
use pbr::ProgressBar;
use slicer_core::cache::{CacheStatus, Filecache, RegionalCache};
use slicer_core::core::config::ApplicationCfg;
use slicer_core::core::stats::Statistics;
use slicer_core::core::{AreaOfInterest, Config, GenerateSettings};
use slicer_core::render::{renderer_from_config, Renderer, WmsRenderer};
use slicer_core::slicer::{SliceStats, TileSlicer};
use slicer_core::{Error, Result};
use std::fs;
use std::io::Stdout;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tile_grid::{extent_wgs84_to_merc, BatchIterator, Grid, TileBatch};
use tokio::task;

/// Failed regional tile
#[derive(Clone, Debug)]
pub struct BatchFailure {
    pub batch: TileBatch,
    pub message: String,
}

/// Counters of a generation run
#[derive(Default, Clone, Debug)]
pub struct GenerateSummary {
    pub batches_rendered: u64,
    pub batches_cached: u64,
    /// Batches with all tiles present
    pub batches_skipped: u64,
    pub failures: Vec<BatchFailure>,
    /// Worker tasks which didn't return a result
    pub task_errors: u64,
    pub tiles_written: u64,
    pub tiles_skipped: u64,
}

impl GenerateSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.task_errors == 0
    }
    fn add(&mut self, batch: TileBatch, outcome: Result<BatchOutcome>) {
        match outcome {
            Ok(BatchOutcome::Skipped { tiles }) => {
                self.batches_skipped += 1;
                self.tiles_skipped += tiles;
            }
            Ok(BatchOutcome::Sliced { status, stats, .. }) => {
                match status {
                    CacheStatus::Hit => self.batches_cached += 1,
                    CacheStatus::Rendered => self.batches_rendered += 1,
                }
                self.tiles_written += stats.written;
                self.tiles_skipped += stats.skipped;
            }
            Err(e) => {
                error!(
                    "Regional tile {}/{}/{} failed: {}",
                    batch.zoom, batch.x, batch.y, e
                );
                self.failures.push(BatchFailure {
                    batch,
                    message: e.to_string(),
                });
            }
        }
    }
}

#[derive(Debug)]
enum BatchOutcome {
    Skipped {
        tiles: u64,
    },
    Sliced {
        status: CacheStatus,
        stats: SliceStats,
        render_ms: Option<u64>,
    },
}

/// Work on a single regional tile
struct BatchProcessor {
    regional: RegionalCache,
    slicer: TileSlicer,
    keep_regional: bool,
}

impl BatchProcessor {
    fn process(&self, batch: &TileBatch) -> Result<BatchOutcome> {
        if self.slicer.pending_tiles(batch) == 0 {
            debug!(
                "{} - all tiles exist, skipping",
                RegionalCache::path(batch)
            );
            if !self.keep_regional && self.regional.exists(batch) {
                self.regional.remove(batch)?;
            }
            return Ok(BatchOutcome::Skipped {
                tiles: self.slicer.grid_tile_count(batch) as u64,
            });
        }
        let started = Instant::now();
        let (raster, status) = self.regional.obtain_raster(batch)?;
        let render_ms = match status {
            CacheStatus::Rendered => Some(started.elapsed().as_millis() as u64),
            CacheStatus::Hit => None,
        };
        let stats = self.slicer.slice(batch, &raster)?;
        if !self.keep_regional {
            self.regional.remove(batch)?;
        }
        Ok(BatchOutcome::Sliced {
            status,
            stats,
            render_ms,
        })
    }
}

/// Renders regional tiles of an area and slices them into a tile pyramid
pub struct TileGenerator {
    settings: GenerateSettings,
    area: AreaOfInterest,
    grid: Grid,
    processor: Arc<BatchProcessor>,
}

impl TileGenerator {
    pub fn new(
        settings: GenerateSettings,
        area: AreaOfInterest,
        renderer: Arc<dyn Renderer>,
        layers: Vec<String>,
    ) -> Result<TileGenerator> {
        // Fail early for areas outside of the Mercator range
        extent_wgs84_to_merc(&area.extent)?;
        let cache = Filecache::new(&settings.output);
        let regional = RegionalCache::new(
            cache.clone(),
            renderer,
            layers,
            settings.render_timeout,
        );
        let slicer = TileSlicer::new(cache, settings.naming);
        let processor = Arc::new(BatchProcessor {
            regional,
            slicer,
            keep_regional: settings.keep_regional,
        });
        Ok(TileGenerator {
            settings,
            area,
            grid: Grid::web_mercator(),
            processor,
        })
    }

    /// Generator for an application configuration
    pub fn from_app_config(config: &ApplicationCfg) -> Result<TileGenerator> {
        let settings =
            GenerateSettings::from_config(&config.generate).map_err(Error::Configuration)?;
        let area = AreaOfInterest::from_config(&config.area)?;
        let renderer = renderer_from_config(&config.renderer)?;
        let layers = if !config.renderer.layers.is_empty() {
            config.renderer.layers.clone()
        } else if let Some(ref qgs) = config.renderer.qgs {
            read_visible_layers(qgs).map_err(Error::Configuration)?
        } else {
            Vec::new()
        };
        info!("{}", renderer.info());
        debug!("Visible layers: {:?}", layers);
        TileGenerator::new(settings, area, renderer, layers)
    }

    pub fn settings(&self) -> &GenerateSettings {
        &self.settings
    }

    pub fn set_progress(&mut self, progress: bool) {
        self.settings.progress = progress;
    }

    /// Batches of a zoom level
    pub fn batches(&self, zoom: u8) -> Result<BatchIterator> {
        let batches = BatchIterator::for_extent(
            &self.grid,
            &self.area.extent,
            zoom,
            self.settings.step,
            self.settings.border,
        )?;
        Ok(batches)
    }

    fn progress_bar(&self, zoom: u8, batches: u64) -> ProgressBar<Stdout> {
        let mut pb = ProgressBar::new(batches);
        pb.message(&format!("Level {}: ", zoom));
        pb.show_speed = false;
        pb.show_percent = false;
        pb.show_time_left = false;
        pb
    }

    /// Generate all zoom levels.
    ///
    /// Failed regional tiles are reported in the summary, the remaining
    /// regional tiles are processed nevertheless.
    pub fn generate(&self) -> Result<GenerateSummary> {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| Error::io("tokio runtime", e))?;
        info!(
            "Tile directory: {} ({} naming)",
            self.settings.output, self.settings.naming
        );
        let mut summary = GenerateSummary::default();
        let mut stats = Statistics::new();
        for zoom in self.settings.minzoom..=self.settings.maxzoom {
            let batches = self.batches(zoom)?;
            let limits = batches.limits().clone();
            let (cols, rows) = batches.batch_counts();
            info!(
                "Level {}: {} tiles ({}x{}) in {} regional tiles of {}px",
                zoom,
                limits.num_tiles(),
                limits.width(),
                limits.height(),
                batches.num_batches(),
                TileBatch {
                    zoom,
                    x: 0,
                    y: 0,
                    step: self.settings.step,
                    border: self.settings.border
                }
                .pixel_size()
            );
            if cols * self.settings.step > limits.width()
                || rows * self.settings.step > limits.height()
            {
                warn!(
                    "Level {}: last regional tiles extend beyond the area of interest",
                    zoom
                );
            }
            let zoom_dir = Path::new(&self.settings.output).join(zoom.to_string());
            fs::create_dir_all(&zoom_dir)
                .map_err(|e| Error::io(zoom_dir.to_string_lossy(), e))?;
            rt.block_on(self.generate_zoom(zoom, batches, &mut summary, &mut stats));
        }
        if self.settings.progress {
            println!();
        }
        debug!("Render statistics:\n{:?}", stats);
        info!(
            "{} regional tiles rendered, {} loaded from cache, {} complete, {} failed",
            summary.batches_rendered,
            summary.batches_cached,
            summary.batches_skipped,
            summary.failures.len()
        );
        info!(
            "{} tiles written, {} tiles existing",
            summary.tiles_written, summary.tiles_skipped
        );
        Ok(summary)
    }

    /// Process the regional tiles of a zoom level in parallel
    async fn generate_zoom(
        &self,
        zoom: u8,
        batches: BatchIterator,
        summary: &mut GenerateSummary,
        stats: &mut Statistics,
    ) {
        let task_queue_size = self.settings.threads;
        let mut tasks = Vec::with_capacity(task_queue_size);
        let mut pb = if self.settings.progress {
            let mut pb = self.progress_bar(zoom, batches.num_batches());
            pb.tick();
            Some(pb)
        } else {
            None
        };
        let stats_key = format!("Level {}", zoom);
        for batch in batches {
            let processor = self.processor.clone();
            tasks.push(task::spawn(async move {
                // Renderers may block on I/O
                let outcome = task::spawn_blocking(move || processor.process(&batch)).await;
                (batch, outcome)
            }));
            if tasks.len() >= task_queue_size {
                let (result, remaining) = await_one_task(tasks).await;
                tasks = remaining;
                collect_result(result, summary, stats, &stats_key, pb.as_mut());
            }
        }
        // Finish remaining tasks
        for result in futures_util::future::join_all(tasks).await {
            collect_result(result, summary, stats, &stats_key, pb.as_mut());
        }
        if let Some(ref mut pb) = pb {
            pb.finish();
        }
    }
}

type TaskResult = (
    TileBatch,
    std::result::Result<Result<BatchOutcome>, task::JoinError>,
);

fn collect_result(
    result: std::result::Result<TaskResult, task::JoinError>,
    summary: &mut GenerateSummary,
    stats: &mut Statistics,
    stats_key: &str,
    pb: Option<&mut ProgressBar<Stdout>>,
) {
    match result {
        Ok((batch, Ok(outcome))) => {
            if let Ok(BatchOutcome::Sliced {
                render_ms: Some(ms),
                ..
            }) = &outcome
            {
                stats.add(stats_key, *ms);
            }
            summary.add(batch, outcome);
        }
        Ok((batch, Err(e))) => {
            error!(
                "Regional tile {}/{}/{}: task failed: {}",
                batch.zoom, batch.x, batch.y, e
            );
            summary.task_errors += 1;
        }
        Err(e) => {
            error!("Task failed: {}", e);
            summary.task_errors += 1;
        }
    }
    if let Some(pb) = pb {
        pb.inc();
    }
}

async fn await_one_task<T>(
    tasks: Vec<task::JoinHandle<T>>,
) -> (
    std::result::Result<T, task::JoinError>,
    Vec<task::JoinHandle<T>>,
) {
    let (result, _index, remaining) = futures_util::future::select_all(tasks).await;
    (result, remaining)
}

impl<'a> Config<'a, ApplicationCfg> for TileGenerator {
    fn from_config(config: &ApplicationCfg) -> std::result::Result<Self, String> {
        TileGenerator::from_app_config(config).map_err(|e| e.to_string())
    }
    fn gen_config() -> String {
        let mut config = String::new();
        config.push_str(&GenerateSettings::gen_config());
        config.push_str(
            r#"
[area]
# Extent of the area of interest
extent = { minx = 5.9, miny = 45.8, maxx = 10.5, maxy = 47.8 }
# EPSG code of extent (4326 or 3857)
#srid = 4326
# Or bounding box of a GeoJSON file
#path = "aoi.geojson"

[renderer]
# Visible layers (Default: visible layers of the QGIS project or all layers)
#layers = ["landuse", "roads", "labels"]
# QGIS project with the visible layers checked
#qgs = "/data/project.qgs"
"#,
        );
        config.push_str(&WmsRenderer::gen_config());
        config
    }
}
