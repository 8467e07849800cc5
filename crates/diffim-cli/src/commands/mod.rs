pub mod config;
pub mod convolve;
pub mod info;
pub mod subtract;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use diffim_core::config::SubtractionConfig;

/// Sample type used for in-memory planes.
#[derive(Clone, Copy, ValueEnum)]
pub enum PrecisionArg {
    F32,
    F64,
}

/// Read a TOML config, or fall back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<SubtractionConfig> {
    let Some(path) = path else {
        return Ok(SubtractionConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Invalid subtraction config {}", path.display()))
}
