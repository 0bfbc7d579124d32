//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::{parse_config, read_config, ApplicationCfg, GenerateCfg, DEFAULT_CONFIG};
use crate::core::{Config, GenerateSettings};
use crate::slicer::Naming;
use std::env;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config: ApplicationCfg = parse_config(DEFAULT_CONFIG.to_string(), "").unwrap();
    assert_eq!(config.generate.minzoom, Some(10));
    assert_eq!(config.generate.maxzoom, Some(15));
    assert_eq!(config.generate.naming, Some("tms".to_string()));
    assert_eq!(config.area.extent.unwrap().maxy, 47.8);
    assert!(config.renderer.layers.is_empty());
    assert_eq!(
        config.renderer.wms.unwrap().url,
        "http://localhost/cgi-bin/qgis_mapserv.fcgi"
    );
}

#[test]
fn test_gen_config() {
    let toml = format!("{}\n[area]\npath = \"aoi.geojson\"\n", GenerateSettings::gen_config());
    let config: ApplicationCfg = parse_config(toml, "").unwrap();
    let settings = GenerateSettings::from_config(&config.generate).unwrap();
    assert_eq!(settings.step, 16);
    assert_eq!(settings.output, "/tmp/tiles");
    assert_eq!(config.area.path, Some("aoi.geojson".to_string()));
}

#[test]
fn test_parse_error() {
    let config: Result<ApplicationCfg, _> = read_config("src/core/mod.rs");
    assert!(config.err().unwrap().starts_with("src/core/mod.rs - "));

    let config: Result<ApplicationCfg, _> = read_config("wrongfile");
    assert_eq!("Could not find config file!", config.err().unwrap());

    let toml = r#"
        [generate]
        minzoom = "ten"
        "#;
    let config: Result<ApplicationCfg, _> = parse_config(toml.to_string(), "test.toml");
    let err = config.err().unwrap();
    assert!(err.starts_with("test.toml - invalid type"), "{}", err);
}

#[test]
fn test_env_vars() {
    env::set_var("SLICER_TEST_OUTPUT", "/data/tiles");
    let toml = r#"
        [generate]
        output = "{{ env.SLICER_TEST_OUTPUT }}"
        "#;
    let config: ApplicationCfg = parse_config(toml.to_string(), "").unwrap();
    assert_eq!(config.generate.output, Some("/data/tiles".to_string()));

    let toml = r#"
        [generate]
        output = "${SLICER_TEST_OUTPUT}"
        "#;
    let config: Result<ApplicationCfg, _> = parse_config(toml.to_string(), "");
    assert_eq!(
        config.err().unwrap(),
        "Replace old environment variable syntax ${VARNAME} with `{{env.VARNAME}}`"
    );

    let toml = r#"
        [generate]
        output = "{{ env.SLICER_TEST_UNDEFINED }}"
        "#;
    let config: Result<ApplicationCfg, _> = parse_config(toml.to_string(), "");
    assert!(config.err().unwrap().starts_with("Template error: "));
}

fn generate_cfg() -> GenerateCfg {
    GenerateCfg {
        minzoom: Some(10),
        maxzoom: Some(12),
        output: Some("/tmp/tiles".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_settings_defaults() {
    let settings = GenerateSettings::from_config(&generate_cfg()).unwrap();
    assert_eq!((settings.minzoom, settings.maxzoom), (10, 12));
    assert_eq!(settings.step, 16);
    assert_eq!(settings.border, 2);
    assert_eq!(settings.naming, Naming::Tms);
    assert_eq!(settings.threads, 1);
    assert_eq!(settings.render_timeout, Duration::from_secs(300));
    assert!(settings.keep_regional);

    let toml = settings.gen_runtime_config();
    let config: ApplicationCfg = parse_config(toml, "").unwrap();
    assert_eq!(config.generate.naming, Some("tms".to_string()));
    assert_eq!(config.generate.render_timeout, Some(300));
}

#[test]
fn test_settings_validation() {
    let cfg = GenerateCfg {
        minzoom: Some(13),
        ..generate_cfg()
    };
    assert_eq!(
        GenerateSettings::from_config(&cfg).err(),
        Some("minzoom 13 is greater than maxzoom 12".to_string())
    );

    let cfg = GenerateCfg {
        maxzoom: Some(23),
        ..generate_cfg()
    };
    assert_eq!(
        GenerateSettings::from_config(&cfg).err(),
        Some("maxzoom 23 exceeds maximal zoom level 22".to_string())
    );

    let cfg = GenerateCfg {
        step: Some(0),
        ..generate_cfg()
    };
    assert_eq!(
        GenerateSettings::from_config(&cfg).err(),
        Some("step must be greater than 0".to_string())
    );

    let cfg = GenerateCfg {
        step: Some(1 << 24),
        ..generate_cfg()
    };
    assert_eq!(
        GenerateSettings::from_config(&cfg).err(),
        Some(
            "Regional tile size 4294968320px (step 16777216, border 2) exceeds maximum of 32768px"
                .to_string()
        )
    );

    let cfg = GenerateCfg {
        step: Some(1),
        border: Some(u32::MAX),
        ..generate_cfg()
    };
    assert!(GenerateSettings::from_config(&cfg).is_err());

    // largest accepted regional tile
    let cfg = GenerateCfg {
        step: Some(124),
        border: Some(2),
        ..generate_cfg()
    };
    let settings = GenerateSettings::from_config(&cfg).unwrap();
    assert_eq!(settings.step, 124);

    let cfg = GenerateCfg {
        output: None,
        ..generate_cfg()
    };
    assert_eq!(
        GenerateSettings::from_config(&cfg).err(),
        Some("Missing output directory".to_string())
    );

    let cfg = GenerateCfg {
        naming: Some("osm".to_string()),
        ..generate_cfg()
    };
    assert!(GenerateSettings::from_config(&cfg).is_err());

    let cfg = GenerateCfg {
        minzoom: None,
        ..generate_cfg()
    };
    assert_eq!(
        GenerateSettings::from_config(&cfg).err(),
        Some("Missing minzoom".to_string())
    );

    let cfg = GenerateCfg {
        border: Some(0),
        naming: Some("google".to_string()),
        ..generate_cfg()
    };
    let settings = GenerateSettings::from_config(&cfg).unwrap();
    assert_eq!(settings.border, 0);
    assert_eq!(settings.naming, Naming::Google);
}
