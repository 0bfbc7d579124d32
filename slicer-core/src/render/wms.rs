//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! WMS GetMap renderer (QGIS Server, MapServer, ...)

use crate::core::config::WmsCfg;
use crate::core::error::{Error, Result};
use crate::core::Config;
use crate::render::renderer::{RenderRequest, Renderer};
use image::RgbaImage;
use reqwest::blocking::Client;

const DEFAULT_DPI: u32 = 96;
const DEFAULT_FORMAT: &str = "image/png";

pub struct WmsRenderer {
    client: Client,
    url: String,
    dpi: u32,
    format: String,
}

impl WmsRenderer {
    pub fn new(url: &str, dpi: Option<u32>, format: Option<String>) -> Result<WmsRenderer> {
        let client = Client::builder()
            .user_agent(concat!("tile-slicer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(WmsRenderer {
            client,
            url: url.to_string(),
            dpi: dpi.unwrap_or(DEFAULT_DPI),
            format: format.unwrap_or(DEFAULT_FORMAT.to_string()),
        })
    }

    /// GetMap query parameters
    pub fn getmap_params(&self, request: &RenderRequest) -> Vec<(&'static str, String)> {
        let ext = &request.extent;
        vec![
            ("SERVICE", "WMS".to_string()),
            ("VERSION", "1.3.0".to_string()),
            ("REQUEST", "GetMap".to_string()),
            ("LAYERS", request.layers.join(",")),
            ("STYLES", "".to_string()),
            ("CRS", format!("EPSG:{}", request.srid)),
            (
                "BBOX",
                format!("{},{},{},{}", ext.minx, ext.miny, ext.maxx, ext.maxy),
            ),
            ("WIDTH", request.width.to_string()),
            ("HEIGHT", request.height.to_string()),
            ("FORMAT", self.format.clone()),
            ("TRANSPARENT", "TRUE".to_string()),
            ("DPI", self.dpi.to_string()),
        ]
    }
}

impl Renderer for WmsRenderer {
    fn info(&self) -> String {
        format!("WMS renderer: {}", self.url)
    }

    fn render(&self, request: &RenderRequest) -> Result<RgbaImage> {
        let response = self
            .client
            .get(&self.url)
            .query(&self.getmap_params(request))
            .timeout(request.timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Render(format!("GetMap timed out after {:?}", request.timeout))
                } else {
                    Error::Render(format!("GetMap request failed: {}", e))
                }
            })?;
        if !response.status().is_success() {
            return Err(Error::Render(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }
        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.starts_with("image/"));
        let body = response
            .bytes()
            .map_err(|e| Error::Render(format!("Failed to read response: {}", e)))?;
        if !is_image {
            // WMS service exceptions are returned as XML
            return Err(Error::Render(format!(
                "Unexpected response: {}",
                String::from_utf8_lossy(&body).trim()
            )));
        }
        image::load_from_memory(&body)
            .map(|img| img.to_rgba8())
            .map_err(|e| Error::Render(format!("Invalid image: {}", e)))
    }
}

impl<'a> Config<'a, WmsCfg> for WmsRenderer {
    fn from_config(cfg: &WmsCfg) -> std::result::Result<Self, String> {
        WmsRenderer::new(&cfg.url, cfg.dpi, cfg.format.clone()).map_err(|e| e.to_string())
    }
    fn gen_config() -> String {
        let toml = r#"
[renderer.wms]
# GetMap URL of a WMS server, e.g. QGIS Server with the project to publish
url = "http://localhost/cgi-bin/qgis_mapserv.fcgi?MAP=/data/project.qgs"
#dpi = 96
#format = "image/png"
"#;
        toml.to_string()
    }
}
