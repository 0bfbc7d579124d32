//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::area::ExtentCfg;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::prelude::*;
use tera::{Context, Tera};
use toml::Value;

pub trait Config<'a, C: Deserialize<'a>>
where
    Self: std::marker::Sized,
{
    /// Read configuration
    fn from_config(config: &C) -> Result<Self, String>;
    /// Generate configuration template
    fn gen_config() -> String;
    /// Generate configuration template with runtime information
    fn gen_runtime_config(&self) -> String {
        Self::gen_config()
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApplicationCfg {
    #[serde(default)]
    pub generate: GenerateCfg,
    #[serde(default)]
    pub area: AreaCfg,
    #[serde(default)]
    pub renderer: RendererCfg,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct GenerateCfg {
    pub minzoom: Option<u8>,
    pub maxzoom: Option<u8>,
    /// Number of map tiles along one edge of a regional tile
    pub step: Option<u32>,
    /// Number of extra map tiles rendered along each edge of a regional tile
    pub border: Option<u32>,
    /// Directory for regional tiles and zoom level subdirectories
    pub output: Option<String>,
    /// Row numbering of output tiles (tms, google)
    pub naming: Option<String>,
    /// Number of regional tiles rendered in parallel
    pub threads: Option<usize>,
    /// Render timeout in seconds
    pub render_timeout: Option<u64>,
    /// Keep regional tiles after slicing
    pub keep_regional: Option<bool>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AreaCfg {
    /// Extent of the area of interest
    pub extent: Option<ExtentCfg>,
    /// EPSG code of `extent` (Default: 4326)
    pub srid: Option<i32>,
    /// GeoJSON file whose bounding box defines the area of interest
    pub path: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RendererCfg {
    /// Visible layers passed to the renderer
    #[serde(default)]
    pub layers: Vec<String>,
    /// QGIS project file listing the visible layers
    pub qgs: Option<String>,
    pub wms: Option<WmsCfg>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct WmsCfg {
    /// GetMap base URL, e.g. http://localhost/cgi-bin/qgis_mapserv.fcgi?MAP=/data/project.qgs
    pub url: String,
    /// Rendering resolution (Default: 96)
    pub dpi: Option<u32>,
    /// Image format (Default: image/png)
    pub format: Option<String>,
}

pub const DEFAULT_CONFIG: &'static str = r#"
[generate]
minzoom = 10
maxzoom = 15
step = 16
border = 2
output = "/tmp/tiles"
naming = "tms"

[area]
extent = { minx = 5.9, miny = 45.8, maxx = 10.5, maxy = 47.8 }

[renderer]
layers = []

[renderer.wms]
url = "http://localhost/cgi-bin/qgis_mapserv.fcgi"
"#;

/// Load and parse the config file into an config struct.
pub fn read_config<'a, T: Deserialize<'a>>(path: &str) -> Result<T, String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            return Err("Could not find config file!".to_string());
        }
    };
    let mut config_toml = String::new();
    if let Err(err) = file.read_to_string(&mut config_toml) {
        return Err(format!("Error while reading config: [{}]", err));
    };

    parse_config(config_toml, path)
}

/// Parse the configuration into an config struct.
pub fn parse_config<'a, T: Deserialize<'a>>(config_toml: String, path: &str) -> Result<T, String> {
    // Check for old ${var} expressions
    let re = Regex::new(r"\$\{([[:alnum:]]+)\}").map_err(|e| e.to_string())?;
    if re.is_match(&config_toml) {
        return Err(
            "Replace old environment variable syntax ${VARNAME} with `{{env.VARNAME}}`".to_string(),
        );
    }

    // Parse template
    let mut tera = Tera::default();
    tera.add_raw_template(path, &config_toml)
        .map_err(|e| format!("Template error: {}", e))?;
    let mut context = Context::new();
    let mut env = HashMap::new();
    for (key, value) in env::vars() {
        env.insert(key, value);
    }
    context.insert("env", &env);
    let toml = tera.render(path, &context).map_err(|e| match e.source() {
        Some(source) => format!("Template error: {}", source),
        None => format!("Template error: {}", e),
    })?;

    toml.parse::<Value>()
        .and_then(|cfg| cfg.try_into::<T>())
        .map_err(|err| format!("{} - {}", path, err))
}
