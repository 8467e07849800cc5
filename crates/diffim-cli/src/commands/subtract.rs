use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use diffim_core::config::{BackgroundConfig, KernelConfig, SubtractionConfig};
use diffim_core::io::image_io::{load_masked_image, save_mask_png, save_preview};
use diffim_core::io::mimg::write_mimg;
use diffim_core::stats::DifferenceStats;
use diffim_core::subtract::{subtract_images, ConvolutionTarget};
use diffim_core::Pixel;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::{load_config, PrecisionArg};

#[derive(Clone, ValueEnum)]
pub enum TargetArg {
    Template,
    Science,
}

#[derive(Args)]
pub struct SubtractArgs {
    /// Template image (.mimg, TIFF or PNG)
    pub template: PathBuf,

    /// Science image (.mimg, TIFF or PNG)
    pub science: PathBuf,

    /// Subtraction config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replace the configured kernel with a Gaussian of this sigma
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Gaussian kernel size used with --sigma (odd)
    #[arg(long, default_value = "11")]
    pub size: usize,

    /// Constant background to subtract
    #[arg(long)]
    pub background: Option<f64>,

    /// Which image the kernel is applied to
    #[arg(long, value_enum)]
    pub target: Option<TargetArg>,

    /// Write model - science instead of science - model
    #[arg(long)]
    pub no_invert: bool,

    /// Sample precision of the in-memory planes
    #[arg(long, value_enum, default_value = "f32")]
    pub precision: PrecisionArg,

    /// Output file path
    #[arg(short, long, default_value = "diff.mimg")]
    pub output: PathBuf,

    /// Stretched PNG/TIFF preview of the difference image
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// PNG marking pixels that carry a bad-mask plane
    #[arg(long)]
    pub mask_preview: Option<PathBuf>,
}

pub fn run(args: &SubtractArgs) -> Result<()> {
    let config = apply_overrides(load_config(args.config.as_deref())?, args);

    crate::summary::print_subtract_summary(&config, &args.template, &args.science, &args.output);

    match args.precision {
        PrecisionArg::F32 => subtract_as::<f32>(args, &config),
        PrecisionArg::F64 => subtract_as::<f64>(args, &config),
    }
}

fn apply_overrides(mut config: SubtractionConfig, args: &SubtractArgs) -> SubtractionConfig {
    if let Some(sigma) = args.sigma {
        config.kernel = KernelConfig::Gaussian {
            size: args.size,
            sigma,
        };
    }
    if let Some(value) = args.background {
        config.background = BackgroundConfig::Constant { value };
    }
    if let Some(ref target) = args.target {
        config.target = match target {
            TargetArg::Template => ConvolutionTarget::Template,
            TargetArg::Science => ConvolutionTarget::Science,
        };
    }
    if args.no_invert {
        config.invert = false;
    }
    config
}

fn subtract_as<P: Pixel>(args: &SubtractArgs, config: &SubtractionConfig) -> Result<()> {
    let kernel = config.kernel.build().context("Invalid kernel config")?;
    let background = config
        .background
        .build()
        .context("Invalid background config")?;
    let bad_mask = config.bad_mask().context("Invalid bad_mask_planes")?;

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    pb.set_message("Loading template");
    let template = load_masked_image::<P>(&args.template, &config.variance)
        .with_context(|| format!("Failed to load {}", args.template.display()))?;
    pb.inc(1);

    pb.set_message("Loading science");
    let science = load_masked_image::<P>(&args.science, &config.variance)
        .with_context(|| format!("Failed to load {}", args.science.display()))?;
    pb.inc(1);

    pb.set_message("Subtracting");
    let diff = subtract_images(
        &template,
        &science,
        kernel.as_ref(),
        background.as_background(),
        &config.options(),
    )
    .context("Subtraction failed")?;
    pb.inc(1);

    pb.set_message("Writing");
    write_mimg(&diff, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    pb.inc(1);
    pb.finish_with_message("Done");

    if let Some(ref path) = args.preview {
        save_preview(&diff.image, config.preview.low, config.preview.high, path)
            .with_context(|| format!("Failed to write preview {}", path.display()))?;
    }
    if let Some(ref path) = args.mask_preview {
        save_mask_png(&diff.mask, bad_mask, path)
            .with_context(|| format!("Failed to write mask preview {}", path.display()))?;
    }

    let stats = DifferenceStats::compute(&diff, bad_mask);
    info!(
        mean = stats.mean,
        rms = stats.rms,
        std_normalized = stats.std_normalized,
        n_used = stats.n_used,
        "Residual statistics"
    );
    crate::summary::print_difference_stats(&stats, diff.bbox());

    println!("\nDifference saved to {}", args.output.display());
    Ok(())
}
