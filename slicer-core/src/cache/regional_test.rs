//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::cache::filecache::Filecache;
use crate::cache::regional::{CacheStatus, RegionalCache};
use crate::core::error::{Error, Result};
use crate::render::{encode_png, RenderRequest, Renderer};
use image::{Rgba, RgbaImage};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tile_grid::TileBatch;

#[derive(Default)]
struct MockRenderer {
    calls: AtomicUsize,
    requests: Mutex<Vec<RenderRequest>>,
    /// Returned image is this many pixels too small
    shrink: u32,
    fail: bool,
    delay: Option<Duration>,
}

impl Renderer for MockRenderer {
    fn info(&self) -> String {
        "Mock renderer".to_string()
    }
    fn render(&self, request: &RenderRequest) -> Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.fail {
            return Err(Error::Render("server error".to_string()));
        }
        Ok(RgbaImage::from_pixel(
            request.width - self.shrink,
            request.height - self.shrink,
            Rgba([255, 0, 0, 255]),
        ))
    }
}

fn batch() -> TileBatch {
    TileBatch {
        zoom: 10,
        x: 100,
        y: 200,
        step: 2,
        border: 1,
    }
}

fn regional_cache(dir: &TempDir, renderer: Arc<MockRenderer>) -> RegionalCache {
    RegionalCache::new(
        Filecache::new(dir.path()),
        renderer,
        vec!["roads".to_string()],
        Duration::from_secs(10),
    )
}

#[test]
fn test_path() {
    assert_eq!(RegionalCache::path(&batch()), "10_100_200_s2_b1.png");
}

#[test]
fn test_render_and_hit() {
    let dir = TempDir::new().unwrap();
    let renderer = Arc::new(MockRenderer::default());
    let cache = regional_cache(&dir, renderer.clone());
    assert!(!cache.exists(&batch()));

    let (image, status) = cache.obtain_raster(&batch()).unwrap();
    assert_eq!(status, CacheStatus::Rendered);
    assert_eq!(image.dimensions(), (1024, 1024));
    assert!(dir.path().join("10_100_200_s2_b1.png").is_file());
    assert!(cache.exists(&batch()));

    {
        let requests = renderer.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!((request.width, request.height), (1024, 1024));
        assert_eq!(request.srid, 3857);
        assert_eq!(request.layers, vec!["roads".to_string()]);
        assert_eq!(request.timeout, Duration::from_secs(10));
    }

    // Second call is served from the cache file
    let (image, status) = cache.obtain_raster(&batch()).unwrap();
    assert_eq!(status, CacheStatus::Hit);
    assert_eq!(image.get_pixel(512, 512), &Rgba([255, 0, 0, 255]));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);

    cache.remove(&batch()).unwrap();
    assert!(!cache.exists(&batch()));
}

#[test]
fn test_render_failure() {
    let dir = TempDir::new().unwrap();
    let renderer = Arc::new(MockRenderer {
        fail: true,
        ..Default::default()
    });
    let cache = regional_cache(&dir, renderer);
    let err = cache.obtain_raster(&batch()).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Render error: 10_100_200_s2_b1.png: server error"
    );
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_size_mismatch() {
    let dir = TempDir::new().unwrap();
    let renderer = Arc::new(MockRenderer {
        shrink: 1,
        ..Default::default()
    });
    let cache = regional_cache(&dir, renderer);
    let err = cache.obtain_raster(&batch()).err().unwrap();
    assert!(err.to_string().contains("expected 1024x1024"));
    assert!(!cache.exists(&batch()));
}

#[test]
fn test_timeout() {
    let dir = TempDir::new().unwrap();
    let renderer = Arc::new(MockRenderer {
        delay: Some(Duration::from_millis(50)),
        ..Default::default()
    });
    let cache = RegionalCache::new(
        Filecache::new(dir.path()),
        renderer,
        Vec::new(),
        Duration::from_millis(1),
    );
    let err = cache.obtain_raster(&batch()).err().unwrap();
    assert!(err.to_string().contains("timeout"));
    assert!(!cache.exists(&batch()));
}

#[test]
fn test_invalid_cache_file() {
    let dir = TempDir::new().unwrap();
    let renderer = Arc::new(MockRenderer::default());
    let cache = regional_cache(&dir, renderer.clone());

    fs::write(dir.path().join("10_100_200_s2_b1.png"), "no png").unwrap();
    match cache.obtain_raster(&batch()) {
        Err(Error::Io { path, .. }) => assert!(path.ends_with("10_100_200_s2_b1.png")),
        _ => panic!("Io error expected"),
    }

    // PNG with wrong size
    let png = encode_png(&RgbaImage::new(256, 256)).unwrap();
    fs::write(dir.path().join("10_100_200_s2_b1.png"), png).unwrap();
    assert!(cache.obtain_raster(&batch()).is_err());
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}
