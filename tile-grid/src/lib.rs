//! A library for Web Mercator tile grid calculations
//!
//! ## Projection
//!
//! ```rust
//! use tile_grid::{lonlat_to_merc, Grid};
//!
//! let grid = Grid::web_mercator();
//! let (mx, my) = lonlat_to_merc(8.5, 47.4).unwrap();
//! let (x, y) = grid.tile_index(mx, my, 10);
//! let (lat_min, lon_min, lat_max, lon_max) = grid.tile_latlon_bounds(x as i64, y as i64, 10);
//! assert!(lat_min <= 47.4 && 47.4 <= lat_max);
//! assert!(lon_min <= 8.5 && 8.5 <= lon_max);
//! ```
//!
//! ## Regional batches
//!
//! ```rust
//! use tile_grid::{BatchIterator, Extent, Grid};
//!
//! let grid = Grid::web_mercator();
//! let extent = Extent {
//!     minx: 5.9,
//!     miny: 45.8,
//!     maxx: 10.5,
//!     maxy: 47.8,
//! };
//! let batches = BatchIterator::for_extent(&grid, &extent, 8, 4, 1).unwrap();
//! for batch in batches {
//!     println!("Batch {}/{}/{} ({} px)", batch.zoom, batch.x, batch.y, batch.pixel_size());
//! }
//! ```

mod batch;
mod grid;

pub use batch::{BatchIterator, TileBatch};
pub use grid::{
    extent_merc_to_wgs84, extent_wgs84_to_merc, lonlat_to_merc, merc_to_lonlat, Extent,
    ExtentInt, Grid, OutOfRange, MAX_LATITUDE, TILE_SIZE,
};
