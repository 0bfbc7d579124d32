//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::{RendererCfg, WmsCfg};
use crate::render::{renderer_from_config, RenderRequest, Renderer, WmsRenderer};
use std::collections::HashMap;
use std::time::Duration;
use tile_grid::Extent;

#[test]
fn test_getmap_params() {
    let renderer = WmsRenderer::new("http://localhost/wms?MAP=/data/map.qgs", Some(72), None)
        .unwrap();
    let request = RenderRequest {
        extent: Extent {
            minx: -1017529.7205322683,
            miny: 7005300.768279836,
            maxx: -978393.9620502554,
            maxy: 7044436.526761845,
        },
        srid: 3857,
        width: 1024,
        height: 1024,
        layers: vec!["roads".to_string(), "labels".to_string()],
        timeout: Duration::from_secs(10),
    };
    let params: HashMap<_, _> = renderer.getmap_params(&request).into_iter().collect();
    assert_eq!(params["REQUEST"], "GetMap");
    assert_eq!(params["LAYERS"], "roads,labels");
    assert_eq!(params["CRS"], "EPSG:3857");
    assert_eq!(
        params["BBOX"],
        "-1017529.7205322683,7005300.768279836,-978393.9620502554,7044436.526761845"
    );
    assert_eq!(params["WIDTH"], "1024");
    assert_eq!(params["HEIGHT"], "1024");
    assert_eq!(params["FORMAT"], "image/png");
    assert_eq!(params["TRANSPARENT"], "TRUE");
    assert_eq!(params["DPI"], "72");
    assert_eq!(
        renderer.info(),
        "WMS renderer: http://localhost/wms?MAP=/data/map.qgs"
    );
}

#[test]
fn test_renderer_from_config() {
    let cfg = RendererCfg::default();
    assert_eq!(
        renderer_from_config(&cfg).err().unwrap().to_string(),
        "Configuration error: Missing renderer configuration [renderer.wms]"
    );

    let cfg = RendererCfg {
        layers: Vec::new(),
        qgs: None,
        wms: Some(WmsCfg {
            url: "http://localhost/wms".to_string(),
            dpi: None,
            format: None,
        }),
    };
    let renderer = renderer_from_config(&cfg).unwrap();
    assert_eq!(renderer.info(), "WMS renderer: http://localhost/wms");
}
