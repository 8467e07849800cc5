use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use diffim_core::config::{KernelConfig, SubtractionConfig};
use diffim_core::convolve::convolve_masked;
use diffim_core::io::image_io::{load_masked_image, save_preview};
use diffim_core::io::mimg::write_mimg;
use diffim_core::{mask, Pixel};

use super::{load_config, PrecisionArg};

#[derive(Args)]
pub struct ConvolveArgs {
    /// Input image (.mimg, TIFF or PNG)
    pub input: PathBuf,

    /// Config file (TOML); only the kernel and variance model are used
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replace the configured kernel with a Gaussian of this sigma
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Gaussian kernel size used with --sigma (odd)
    #[arg(long, default_value = "11")]
    pub size: usize,

    /// Sample precision of the in-memory planes
    #[arg(long, value_enum, default_value = "f32")]
    pub precision: PrecisionArg,

    /// Output file path
    #[arg(short, long, default_value = "convolved.mimg")]
    pub output: PathBuf,

    /// Stretched PNG/TIFF preview, scaled between 0 and 1
    #[arg(long)]
    pub preview: Option<PathBuf>,
}

pub fn run(args: &ConvolveArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(sigma) = args.sigma {
        config.kernel = KernelConfig::Gaussian {
            size: args.size,
            sigma,
        };
    }

    match args.precision {
        PrecisionArg::F32 => convolve_as::<f32>(args, &config),
        PrecisionArg::F64 => convolve_as::<f64>(args, &config),
    }
}

fn convolve_as<P: Pixel>(args: &ConvolveArgs, config: &SubtractionConfig) -> Result<()> {
    let kernel = config.kernel.build().context("Invalid kernel config")?;
    let input = load_masked_image::<P>(&args.input, &config.variance)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    println!(
        "Convolving {}x{} image with {}",
        input.width(),
        input.height(),
        config.kernel
    );

    let out = convolve_masked(&input, kernel.as_ref()).context("Convolution failed")?;

    write_mimg(&out, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    if let Some(ref path) = args.preview {
        save_preview(&out.image, 0.0, 1.0, path)
            .with_context(|| format!("Failed to write preview {}", path.display()))?;
    }

    println!(
        "Edge pixels: {} of {}",
        out.count_masked(mask::EDGE),
        out.width() * out.height()
    );
    println!("Saved to {}", args.output.display());
    Ok(())
}
