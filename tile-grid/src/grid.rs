//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Web Mercator tile grid and projection math

use std::error::Error;
use std::f64::consts;
use std::fmt;

/// Width and height of a grid tile, in pixels.
pub const TILE_SIZE: u32 = 256;

/// Northernmost (and, negated, southernmost) latitude covered by the grid.
pub const MAX_LATITUDE: f64 = 85.0511287798066;

const EARTH_RADIUS: f64 = 6378137.0;

/// Geographic extent
#[derive(PartialEq, Clone, Debug)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Extent {
    /// Extent with min/max swapped where necessary
    pub fn normalized(&self) -> Extent {
        Extent {
            minx: self.minx.min(self.maxx),
            miny: self.miny.min(self.maxy),
            maxx: self.minx.max(self.maxx),
            maxy: self.miny.max(self.maxy),
        }
    }
}

/// Min and max grid cell numbers (inclusive)
#[derive(PartialEq, Clone, Debug)]
pub struct ExtentInt {
    pub minx: u32,
    pub miny: u32,
    pub maxx: u32,
    pub maxy: u32,
}

impl ExtentInt {
    pub fn width(&self) -> u32 {
        self.maxx - self.minx + 1
    }
    pub fn height(&self) -> u32 {
        self.maxy - self.miny + 1
    }
    pub fn num_tiles(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// Coordinate outside of the projection domain
#[derive(PartialEq, Clone, Debug)]
pub struct OutOfRange {
    pub lon: f64,
    pub lat: f64,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "coordinate ({}, {}) outside of Web Mercator range (lon ±180, lat ±{:.4})",
            self.lon, self.lat, MAX_LATITUDE
        )
    }
}

impl Error for OutOfRange {}

/// Tile grid with origin at the bottom left
#[derive(Clone, Debug)]
pub struct Grid {
    /// The width of an individual tile, in pixels.
    width: u16,
    /// The height of an individual tile, in pixels.
    height: u16,
    /// The geographical extent covered by the grid, in meters.
    /// The (minx,miny) point defines the origin of the grid, i.e. the pixel at the bottom left of the
    /// bottom-left most tile is always placed on the (minx,miny) geographical point.
    pub extent: Extent,
    /// Spatial reference system (EPSG code).
    pub srid: i32,
    /// Meters per pixel for each zoom level, ordered from largest to smallest.
    resolutions: Vec<f64>,
}

impl Grid {
    /// Web Mercator grid (Google maps compatible)
    pub fn web_mercator() -> Grid {
        Grid {
            width: TILE_SIZE as u16,
            height: TILE_SIZE as u16,
            extent: Extent {
                minx: -20037508.3427892480,
                miny: -20037508.3427892480,
                maxx: 20037508.3427892480,
                maxy: 20037508.3427892480,
            },
            srid: 3857,
            // for calculation see fn test_resolutions
            resolutions: vec![
                156543.0339280410,
                78271.5169640205,
                39135.75848201025,
                19567.879241005125,
                9783.939620502562,
                4891.969810251281,
                2445.9849051256406,
                1222.9924525628203,
                611.4962262814101,
                305.7481131407051,
                152.87405657035254,
                76.43702828517627,
                38.218514142588134,
                19.109257071294067,
                9.554628535647034,
                4.777314267823517,
                2.3886571339117584,
                1.1943285669558792,
                0.5971642834779396,
                0.2985821417389698,
                0.1492910708694849,
                0.07464553543474245,
                0.037322767717371225,
            ],
        }
    }
    pub fn nlevels(&self) -> u8 {
        self.resolutions.len() as u8
    }
    pub fn maxzoom(&self) -> u8 {
        self.nlevels() - 1
    }
    /// Meters per pixel
    pub fn pixel_width(&self, zoom: u8) -> f64 {
        self.resolutions[zoom as usize]
    }
    /// Extent of a given tile in meters.
    ///
    /// Indices may lie outside of the grid (e.g. border tiles of a regional image
    /// at the antimeridian), the extent is extrapolated.
    pub fn tile_extent(&self, xtile: i64, ytile: i64, zoom: u8) -> Extent {
        let res = self.resolutions[zoom as usize];
        let tile_sx = self.width as f64;
        let tile_sy = self.height as f64;
        Extent {
            minx: self.extent.minx + (res * xtile as f64 * tile_sx),
            miny: self.extent.miny + (res * ytile as f64 * tile_sy),
            maxx: self.extent.minx + (res * (xtile + 1) as f64 * tile_sx),
            maxy: self.extent.miny + (res * (ytile + 1) as f64 * tile_sy),
        }
    }
    /// Row number counted from the opposite grid edge
    pub fn ytile_flipped(&self, ytile: u32, zoom: u8) -> u32 {
        // y = maxy-ytile-1
        let maxy = self.level_limit(zoom).1;
        maxy.saturating_sub(ytile).saturating_sub(1)
    }
    /// Number of tiles (columns, rows) of grid level
    pub fn level_limit(&self, zoom: u8) -> (u32, u32) {
        let res = self.resolutions[zoom as usize];
        let unitheight = self.height as f64 * res;
        let unitwidth = self.width as f64 * res;

        let maxy =
            ((self.extent.maxy - self.extent.miny - 0.01 * unitheight) / unitheight).ceil() as u32;
        let maxx =
            ((self.extent.maxx - self.extent.minx - 0.01 * unitwidth) / unitwidth).ceil() as u32;
        (maxx, maxy)
    }
    /// Index of the tile containing the point (mx, my) in meters.
    ///
    /// A tile owns the points of its extent `(min, max]`, points outside of the
    /// grid belong to the nearest outer tile.
    pub fn tile_index(&self, mx: f64, my: f64, zoom: u8) -> (u32, u32) {
        let res = self.resolutions[zoom as usize];
        let unitheight = self.height as f64 * res;
        let unitwidth = self.width as f64 * res;
        let (level_maxx, level_maxy) = self.level_limit(zoom);

        let x = ((mx - self.extent.minx) / unitwidth).floor() as i64;
        let y = ((my - self.extent.miny) / unitheight).floor() as i64;
        let x = x.max(0).min(level_maxx as i64 - 1);
        let y = y.max(0).min(level_maxy as i64 - 1);
        // the division may be off by one at tile edges
        let edge_x = |i: i64| self.extent.minx + (res * i as f64 * self.width as f64);
        let edge_y = |i: i64| self.extent.miny + (res * i as f64 * self.height as f64);
        let x = snap_index(x, level_maxx as i64, edge_x, mx);
        let y = snap_index(y, level_maxy as i64, edge_y, my);
        (x as u32, y as u32)
    }
    /// Tile index limits covering a projected extent.
    ///
    /// The corners are normalized, so an extent given with swapped min/max values
    /// yields the same limits.
    pub fn tile_limits(&self, extent: &Extent, zoom: u8) -> ExtentInt {
        let (x1, y1) = self.tile_index(extent.minx, extent.miny, zoom);
        let (x2, y2) = self.tile_index(extent.maxx, extent.maxy, zoom);
        ExtentInt {
            minx: x1.min(x2),
            miny: y1.min(y2),
            maxx: x1.max(x2),
            maxy: y1.max(y2),
        }
    }
    /// Geographic bounds of a tile as (lat_min, lon_min, lat_max, lon_max).
    ///
    /// The bounds enclose every position which `tile_index` assigns to the tile.
    /// Outer tiles of the grid extend to the limits of the projection.
    pub fn tile_latlon_bounds(&self, xtile: i64, ytile: i64, zoom: u8) -> (f64, f64, f64, f64) {
        let extent = self.tile_extent(xtile, ytile, zoom);
        let (lon_min, lat_min) = merc_to_lonlat(extent.minx, extent.miny);
        let (lon_max, lat_max) = merc_to_lonlat(extent.maxx, extent.maxy);
        let (level_maxx, level_maxy) = self.level_limit(zoom);

        let lon_min = if xtile <= 0 {
            lon_min.min(-180.0)
        } else {
            first_above(extent.minx, lon_min, lon_to_merc)
        };
        let lon_max = if xtile >= level_maxx as i64 - 1 {
            lon_max.max(180.0)
        } else {
            last_not_above(extent.maxx, lon_max, lon_to_merc)
        };
        let lat_min = if ytile <= 0 {
            lat_min.min(-MAX_LATITUDE)
        } else {
            first_above(extent.miny, lat_min, lat_to_merc)
        };
        let lat_max = if ytile >= level_maxy as i64 - 1 {
            lat_max.max(MAX_LATITUDE)
        } else {
            last_not_above(extent.maxy, lat_max, lat_to_merc)
        };
        (lat_min, lon_min, lat_max, lon_max)
    }
}

/// Returns the Spherical Mercator (x, y) in meters
pub fn lonlat_to_merc(lon: f64, lat: f64) -> Result<(f64, f64), OutOfRange> {
    if !(lon.abs() <= 180.0 && lat.abs() <= MAX_LATITUDE) {
        return Err(OutOfRange { lon, lat });
    }
    Ok((lon_to_merc(lon), lat_to_merc(lat)))
}

fn lon_to_merc(lon: f64) -> f64 {
    EARTH_RADIUS * lon.to_radians()
}

fn lat_to_merc(lat: f64) -> f64 {
    EARTH_RADIUS * ((consts::PI * 0.25) + (0.5 * lat.to_radians())).tan().ln()
}

/// Moves `index` to the cell `(edge(i), edge(i+1)]` containing `v`, staying within `0..count`
fn snap_index(index: i64, count: i64, edge: impl Fn(i64) -> f64, v: f64) -> i64 {
    let mut index = index;
    while index > 0 && v <= edge(index) {
        index -= 1;
    }
    while index < count - 1 && v > edge(index + 1) {
        index += 1;
    }
    index
}

const MAX_ULP_STEPS: usize = 64;

fn next_up(v: f64) -> f64 {
    if v.is_nan() || v == f64::INFINITY {
        v
    } else if v == 0.0 {
        f64::from_bits(1)
    } else if v > 0.0 {
        f64::from_bits(v.to_bits() + 1)
    } else {
        f64::from_bits(v.to_bits() - 1)
    }
}

fn next_down(v: f64) -> f64 {
    -next_up(-v)
}

/// Smallest coordinate projected above `bound`, searched from the estimate `start`
fn first_above(bound: f64, start: f64, project: fn(f64) -> f64) -> f64 {
    let mut v = start;
    for _ in 0..MAX_ULP_STEPS {
        if project(v) <= bound {
            break;
        }
        v = next_down(v);
    }
    for _ in 0..MAX_ULP_STEPS {
        if project(v) > bound {
            break;
        }
        v = next_up(v);
    }
    v
}

/// Largest coordinate projected onto or below `bound`, searched from the estimate `start`
fn last_not_above(bound: f64, start: f64, project: fn(f64) -> f64) -> f64 {
    let mut v = start;
    for _ in 0..MAX_ULP_STEPS {
        if project(v) > bound {
            break;
        }
        v = next_up(v);
    }
    for _ in 0..MAX_ULP_STEPS {
        if project(v) <= bound {
            break;
        }
        v = next_down(v);
    }
    v
}

/// Returns (lon, lat) of a Spherical Mercator position
pub fn merc_to_lonlat(mx: f64, my: f64) -> (f64, f64) {
    let lon = (mx / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (my / EARTH_RADIUS).exp().atan() - consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// Projected extent
pub fn extent_wgs84_to_merc(extent: &Extent) -> Result<Extent, OutOfRange> {
    let (minx, miny) = lonlat_to_merc(extent.minx, extent.miny)?;
    let (maxx, maxy) = lonlat_to_merc(extent.maxx, extent.maxy)?;
    Ok(Extent {
        minx,
        miny,
        maxx,
        maxy,
    })
}

/// Geographic extent of a Spherical Mercator extent
pub fn extent_merc_to_wgs84(extent: &Extent) -> Extent {
    let (minx, miny) = merc_to_lonlat(extent.minx, extent.miny);
    let (maxx, maxy) = merc_to_lonlat(extent.maxx, extent.maxy);
    Extent {
        minx,
        miny,
        maxx,
        maxy,
    }
}
