//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use clap::{App, AppSettings, ArgMatches, SubCommand};
use dotenv::dotenv;
use env_logger::Builder;
use log::Record;
use slicer_core::core::area::ExtentCfg;
use slicer_core::core::config::{ApplicationCfg, WmsCfg};
use slicer_core::core::{read_config, Config};
use slicer_service::TileGenerator;
use std::env;
use std::io::Write;
use std::process;
use std::str::FromStr;
use time;

fn init_logger(args: &ArgMatches<'_>) {
    let mut builder = Builder::new();
    builder.format(|buf, record: &Record<'_>| {
        let t = time::now();
        writeln!(
            buf,
            "{}.{:03} {} {}",
            time::strftime("%Y-%m-%d %H:%M:%S", &t).unwrap_or_default(),
            t.tm_nsec / 1000_000,
            record.level(),
            record.args()
        )
    });

    let rust_log = match (args.value_of("loglevel"), env::var("RUST_LOG")) {
        (None, Ok(rust_log_env)) => rust_log_env,
        (loglevel, _) => match loglevel.unwrap_or("info") {
            "debug" => "debug,tokio=info,reqwest=info".to_string(),
            loglevel => loglevel.to_string(),
        },
    };
    builder.parse_filters(&rust_log);

    builder.init();
}

fn parse_arg<T: FromStr>(args: &ArgMatches<'_>, name: &str) -> Result<Option<T>, String> {
    match args.value_of(name) {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Error parsing '{}' value '{}'", name, s)),
        None => Ok(None),
    }
}

/// Extent `minx,miny,maxx,maxy[,srid]`
fn parse_extent(numlist: &str) -> Result<(ExtentCfg, Option<i32>), String> {
    let arr: Vec<&str> = numlist.split(',').map(|v| v.trim()).collect();
    if arr.len() != 4 && arr.len() != 5 {
        return Err(format!(
            "Error parsing 'extent' {}: expected minx,miny,maxx,maxy[,srid]",
            numlist
        ));
    }
    let mut coords = Vec::with_capacity(4);
    for v in &arr[0..4] {
        coords.push(
            v.parse::<f64>()
                .map_err(|_| "Error parsing 'extent' as list of float values".to_string())?,
        );
    }
    let srid = match arr.get(4) {
        Some(srid) => Some(
            srid.parse::<i32>()
                .map_err(|_| "Error parsing 'srid' in 'extent' as integer".to_string())?,
        ),
        None => None,
    };
    let extent = ExtentCfg {
        minx: coords[0],
        miny: coords[1],
        maxx: coords[2],
        maxy: coords[3],
    };
    Ok((extent, srid))
}

/// Configuration file values overridden by command line arguments
fn config_from_args(args: &ArgMatches<'_>) -> Result<ApplicationCfg, String> {
    let mut config: ApplicationCfg = match args.value_of("config") {
        Some(cfgpath) => {
            info!("Reading configuration from '{}'", cfgpath);
            read_config(cfgpath)?
        }
        None => ApplicationCfg::default(),
    };
    let generate = &mut config.generate;
    if let Some(minzoom) = parse_arg(args, "minzoom")? {
        generate.minzoom = Some(minzoom);
    }
    if let Some(maxzoom) = parse_arg(args, "maxzoom")? {
        generate.maxzoom = Some(maxzoom);
    }
    if let Some(step) = parse_arg(args, "step")? {
        generate.step = Some(step);
    }
    if let Some(border) = parse_arg(args, "border")? {
        generate.border = Some(border);
    }
    if let Some(threads) = parse_arg(args, "threads")? {
        generate.threads = Some(threads);
    }
    if let Some(timeout) = parse_arg(args, "render-timeout")? {
        generate.render_timeout = Some(timeout);
    }
    if let Some(keep_regional) = parse_arg(args, "keep-regional")? {
        generate.keep_regional = Some(keep_regional);
    }
    if let Some(output) = args.value_of("output") {
        generate.output = Some(output.to_string());
    }
    if let Some(naming) = args.value_of("naming") {
        generate.naming = Some(naming.to_string());
    }

    if let Some(numlist) = args.value_of("extent") {
        let (extent, srid) = parse_extent(numlist)?;
        config.area.extent = Some(extent);
        config.area.srid = srid;
        config.area.path = None;
    }
    if let Some(aoi) = args.value_of("aoi") {
        config.area.path = Some(aoi.to_string());
    }

    if let Some(url) = args.value_of("wms") {
        let wms = config.renderer.wms.take();
        config.renderer.wms = Some(WmsCfg {
            url: url.to_string(),
            dpi: wms.as_ref().and_then(|cfg| cfg.dpi),
            format: wms.and_then(|cfg| cfg.format),
        });
    }
    if let Some(qgs) = args.value_of("qgs") {
        config.renderer.qgs = Some(qgs.to_string());
    }
    if let Some(layers) = args.value_of("layers") {
        config.renderer.layers = layers.split(',').map(|l| l.trim().to_string()).collect();
    }
    Ok(config)
}

/// Run generation, returns `false` if regional tiles failed
fn generate(args: &ArgMatches<'_>) -> Result<bool, String> {
    let config = config_from_args(args)?;
    let mut generator = TileGenerator::from_app_config(&config).map_err(|e| e.to_string())?;
    let progress = parse_arg(args, "progress")?.unwrap_or(true);
    generator.set_progress(progress);
    let summary = generator.generate().map_err(|e| e.to_string())?;
    for failure in &summary.failures {
        let batch = &failure.batch;
        warn!(
            "Incomplete: level {} tiles {}..{} / {}..{}",
            batch.zoom,
            batch.x,
            batch.x + batch.step - 1,
            batch.y,
            batch.y + batch.step - 1
        );
    }
    if summary.task_errors > 0 {
        warn!("{} regional tile tasks failed", summary.task_errors);
    }
    Ok(summary.is_success())
}

fn main() {
    dotenv().ok();
    // http://kbknapp.github.io/clap-rs/clap/
    let mut app = App::new("tile_slicer")
        .version(crate_version!())
        .author("Pirmin Kalberer <pka@sourcepole.ch>")
        .about("Renders large regional images of a map and slices them into a tile pyramid")
        .subcommand(SubCommand::with_name("genconfig")
                        .args_from_usage("--loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'")
                        .about("Generate configuration template"))
        .subcommand(SubCommand::with_name("generate")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=[FILE] 'Load from custom config file'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                                              --minzoom=[LEVEL] 'Minimum zoom level'
                                              --maxzoom=[LEVEL] 'Maximum zoom level'
                                              --step=[NUM] 'Tiles along one edge of a regional tile'
                                              --border=[NUM] 'Extra tiles rendered around a regional tile'
                                              --output=[DIR] 'Output directory'
                                              --naming=[tms|google] 'Row numbering of output tiles'
                                              --extent=[minx,miny,maxx,maxy[,srid]] 'Extent of area of interest'
                                              --aoi=[FILE] 'GeoJSON file with area of interest'
                                              --wms=[URL] 'WMS GetMap URL of the map renderer'
                                              --qgs=[FILE] 'QGIS project file with visible layers'
                                              --layers=[NAME,..] 'Visible layers'
                                              --threads=[NUM] 'Number of regional tiles rendered in parallel'
                                              --render-timeout=[SECONDS] 'Render timeout'
                                              --progress=[true|false] 'Show progress bar'
                                              --keep-regional=[true|false] 'Keep regional tiles after slicing'")
                        .about("Generate tiles"));

    match app.get_matches_from_safe_borrow(env::args()) {
        //app.get_matches() prohibits later call of app.print_help()
        Result::Err(e) => {
            println!("{}", e);
        }
        Result::Ok(matches) => match matches.subcommand() {
            ("genconfig", Some(sub_m)) => {
                init_logger(sub_m);
                println!("{}", TileGenerator::gen_config());
            }
            ("generate", Some(sub_m)) => {
                init_logger(sub_m);
                match generate(sub_m) {
                    Ok(true) => {}
                    Ok(false) => process::exit(1),
                    Err(e) => {
                        error!("{}", e);
                        process::exit(1);
                    }
                }
            }
            _ => {
                let _ = app.print_help();
                println!("");
            }
        },
    }
}
