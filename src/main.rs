//! `envi-info`: print the geometry and band setup of ENVI images.
//!
//! Usage: `envi-info <image>...`. Settings are read from the JSON file named
//! by `ENVI_CUBE_CONFIG`, if set.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use envi_cube::config::StorageConfig;
use envi_cube::{EnviImage, open};

const CONFIG_ENV: &str = "ENVI_CUBE_CONFIG";

fn load_config() -> StorageConfig {
    let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) else {
        return StorageConfig::default();
    };
    match StorageConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            StorageConfig::default()
        }
    }
}

fn summarize(image: &EnviImage) {
    let (lines, samples, bands) = image.shape();
    println!("{}", image.path().display());
    println!("  kind:       {:?} ({:?})", image.kind(), image.layout());
    println!("  shape:      {lines} lines x {samples} samples x {bands} bands");
    if bands != image.header().physical_bands() {
        println!("  on disk:    {} bands", image.header().physical_bands());
    }
    println!("  data type:  {}", image.encoding());
    println!("  byte order: {:?}", image.file_byte_order());
    if let Some(wavelengths) = image.wavelength()
        && let (Some(first), Some(last)) = (wavelengths.first(), wavelengths.last())
    {
        let units = image.header().wavelength_units().unwrap_or_default();
        println!("  wavelength: {first} .. {last} {units}");
    }
    if let Some(names) = image.spectra_names() {
        println!("  spectra:    {}", names.join(", "));
    }
    if let Some(names) = image.class_names() {
        println!("  classes:    {}", names.join(", "));
    }
}

fn inspect(path: &Path, config: &StorageConfig) -> envi_cube::Result<()> {
    let image = open(path, &config.open)?;
    summarize(&image);
    Ok(())
}

fn main() -> ExitCode {
    let config = load_config();
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: envi-info <image>...");
        return ExitCode::FAILURE;
    }

    let mut status = ExitCode::SUCCESS;
    for path in &paths {
        if let Err(e) = inspect(path, &config) {
            log::error!("{}: {e}", path.display());
            status = ExitCode::FAILURE;
        }
    }
    status
}
