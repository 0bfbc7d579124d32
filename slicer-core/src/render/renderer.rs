//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{load_from_memory_with_format, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use std::time::Duration;
use tile_grid::Extent;

/// Map image request
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// Extent in rendering CRS
    pub extent: Extent,
    /// EPSG code of the rendering CRS
    pub srid: i32,
    pub width: u32,
    pub height: u32,
    /// Identifiers of the layers to draw
    pub layers: Vec<String>,
    /// Maximal duration of the render call
    pub timeout: Duration,
}

/// Map rendering engine.
///
/// Implementations return an RGBA image of exactly the requested size, transparent
/// where no layer content is drawn.
pub trait Renderer: Send + Sync {
    fn info(&self) -> String;
    fn render(&self, request: &RenderRequest) -> Result<RgbaImage>;
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer: Vec<u8> = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| Error::Render(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// Decode PNG data of any color type into RGBA
pub fn decode_png(data: &[u8]) -> std::result::Result<RgbaImage, image::ImageError> {
    Ok(load_from_memory_with_format(data, ImageFormat::Png)?.to_rgba8())
}
