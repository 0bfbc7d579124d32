//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Area of interest

use crate::core::config::AreaCfg;
use crate::core::error::{Error, Result};
use serde_json::Value;
use std::fs;
use tile_grid::{extent_merc_to_wgs84, Extent};

#[derive(Deserialize, Clone, Debug)]
pub struct ExtentCfg {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl From<&ExtentCfg> for Extent {
    fn from(cfg: &ExtentCfg) -> Extent {
        Extent {
            minx: cfg.minx,
            miny: cfg.miny,
            maxx: cfg.maxx,
            maxy: cfg.maxy,
        }
    }
}

/// Bounding box of the region to generate, in geographic coordinates (EPSG:4326)
#[derive(PartialEq, Clone, Debug)]
pub struct AreaOfInterest {
    pub extent: Extent,
}

impl AreaOfInterest {
    /// Area from an extent in EPSG:4326 or EPSG:3857
    pub fn from_extent(extent: &Extent, srid: i32) -> Result<AreaOfInterest> {
        let values = [extent.minx, extent.miny, extent.maxx, extent.maxy];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::AreaOfInterest(format!(
                "Invalid extent {:?}",
                extent
            )));
        }
        let extent = match srid {
            4326 => extent.normalized(),
            3857 => extent_merc_to_wgs84(&extent.normalized()),
            _ => {
                return Err(Error::AreaOfInterest(format!(
                    "Unsupported SRID {} (expected 4326 or 3857)",
                    srid
                )))
            }
        };
        Ok(AreaOfInterest { extent })
    }

    /// Bounding box of a GeoJSON file
    pub fn from_geojson(path: &str) -> Result<AreaOfInterest> {
        let json = fs::read_to_string(path)
            .map_err(|e| Error::AreaOfInterest(format!("Error reading {}: {}", path, e)))?;
        Self::from_geojson_str(&json)
            .map_err(|e| Error::AreaOfInterest(format!("{} - {}", path, e)))
    }

    /// Bounding box of a GeoJSON FeatureCollection, Feature or Geometry
    pub fn from_geojson_str(json: &str) -> std::result::Result<AreaOfInterest, String> {
        let geojson: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let srid = geojson_srid(&geojson)?;
        let extent = match bbox_member(&geojson) {
            Some(extent) => extent,
            None => {
                let mut bbox = None;
                collect_positions(&geojson, &mut bbox);
                bbox.ok_or("No coordinates found".to_string())?
            }
        };
        Self::from_extent(&extent, srid).map_err(|e| match e {
            Error::AreaOfInterest(msg) => msg,
            e => e.to_string(),
        })
    }

    pub fn from_config(cfg: &AreaCfg) -> Result<AreaOfInterest> {
        if let Some(ref path) = cfg.path {
            Self::from_geojson(path)
        } else if let Some(ref extent) = cfg.extent {
            Self::from_extent(&Extent::from(extent), cfg.srid.unwrap_or(4326))
        } else {
            Err(Error::AreaOfInterest(
                "Missing area of interest ([area] extent or path)".to_string(),
            ))
        }
    }
}

/// EPSG code of a legacy `crs` member, GeoJSON default is EPSG:4326
fn geojson_srid(geojson: &Value) -> std::result::Result<i32, String> {
    let name = match geojson.pointer("/crs/properties/name").and_then(Value::as_str) {
        Some(name) => name,
        None => return Ok(4326),
    };
    if name.ends_with("CRS84") {
        return Ok(4326);
    }
    name.rsplit(':')
        .next()
        .and_then(|code| code.parse::<i32>().ok())
        .ok_or(format!("Unsupported crs '{}'", name))
}

fn bbox_member(geojson: &Value) -> Option<Extent> {
    let bbox = geojson.get("bbox")?.as_array()?;
    // malformed bbox members are ignored
    let values = bbox
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()?;
    match values.len() {
        4 => Some(Extent {
            minx: values[0],
            miny: values[1],
            maxx: values[2],
            maxy: values[3],
        }),
        // 3D bbox
        6 => Some(Extent {
            minx: values[0],
            miny: values[1],
            maxx: values[3],
            maxy: values[4],
        }),
        _ => None,
    }
}

fn collect_positions(value: &Value, bbox: &mut Option<Extent>) {
    match value {
        Value::Object(map) => {
            if let Some(coords) = map.get("coordinates") {
                collect_coordinates(coords, bbox);
            }
            for key in &["features", "geometries", "geometry"] {
                if let Some(member) = map.get(*key) {
                    collect_positions(member, bbox);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_positions(item, bbox);
            }
        }
        _ => {}
    }
}

fn collect_coordinates(value: &Value, bbox: &mut Option<Extent>) {
    if let Value::Array(items) = value {
        match (items.get(0).and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
            (Some(x), Some(y)) => expand(bbox, x, y),
            _ => {
                for item in items {
                    collect_coordinates(item, bbox);
                }
            }
        }
    }
}

fn expand(bbox: &mut Option<Extent>, x: f64, y: f64) {
    match bbox {
        Some(ext) => {
            ext.minx = ext.minx.min(x);
            ext.miny = ext.miny.min(y);
            ext.maxx = ext.maxx.max(x);
            ext.maxy = ext.maxy.max(y);
        }
        None => {
            *bbox = Some(Extent {
                minx: x,
                miny: y,
                maxx: x,
                maxy: y,
            })
        }
    }
}
