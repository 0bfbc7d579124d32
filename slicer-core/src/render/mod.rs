//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

mod renderer;
pub mod wms;

#[cfg(test)]
mod wms_test;

pub use self::renderer::{decode_png, encode_png, RenderRequest, Renderer};
pub use self::wms::WmsRenderer;
use crate::core::config::RendererCfg;
use crate::core::error::{Error, Result};
use crate::core::Config;
use std::sync::Arc;

/// Renderer configured in `[renderer]`
pub fn renderer_from_config(cfg: &RendererCfg) -> Result<Arc<dyn Renderer>> {
    match cfg.wms {
        Some(ref wms_cfg) => {
            let renderer = WmsRenderer::from_config(wms_cfg).map_err(Error::Configuration)?;
            Ok(Arc::new(renderer))
        }
        None => Err(Error::Configuration(
            "Missing renderer configuration [renderer.wms]".to_string(),
        )),
    }
}
