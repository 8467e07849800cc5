use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use diffim_core::image::MaskedImage;
use diffim_core::io::image_io::{is_mimg, load_image};
use diffim_core::io::mimg::MimgReader;
use diffim_core::{mask, Pixel};

#[derive(Args)]
pub struct InfoArgs {
    /// Input file (.mimg, or a TIFF/PNG image)
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    if !is_mimg(&args.file) {
        let image = load_image::<f32>(&args.file)
            .with_context(|| format!("Failed to load {}", args.file.display()))?;
        println!("File:        {}", args.file.display());
        println!("Dimensions:  {}x{}", image.width(), image.height());
        println!("Planes:      image only");
        return Ok(());
    }

    let reader = MimgReader::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let header = &reader.header;

    println!("File:        {}", args.file.display());
    println!("Version:     {}", header.version);
    println!("Pixel type:  {}", header.pixel_type_name());
    println!("Dimensions:  {}x{}", header.width, header.height);
    println!("Bounds:      {}", header.bbox());
    let total_mb = header.file_size() as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    let counts = if header.pixel_type == f64::TYPE_CODE {
        plane_counts(&reader.read::<f64>()?)
    } else {
        plane_counts(&reader.read::<f32>()?)
    };

    println!();
    println!("Mask planes:");
    for (name, count) in counts {
        println!("  {:<10}{}", name, count);
    }

    Ok(())
}

fn plane_counts<P: Pixel>(image: &MaskedImage<P>) -> Vec<(&'static str, usize)> {
    mask::PLANES
        .iter()
        .map(|&(name, bit)| (name, image.count_masked(bit)))
        .collect()
}
