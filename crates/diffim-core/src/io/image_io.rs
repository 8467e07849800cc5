use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;

use crate::config::VarianceModel;
use crate::error::{DiffimError, Result};
use crate::image::{Image, MaskPixel, MaskedImage};
use crate::pixel::Pixel;

use super::mimg::read_mimg;

/// Load a grayscale image file. Pixel values are normalised to [0.0, 1.0].
pub fn load_image<P: Pixel>(path: &Path) -> Result<Image<P>> {
    let img = image::open(path)?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let mut data = Array2::<P>::zeros((h as usize, w as usize));

    for (x, y, pixel) in gray.enumerate_pixels() {
        data[[y as usize, x as usize]] = P::narrow(pixel.0[0] as f64 / 65535.0);
    }

    Ok(Image::new(data))
}

/// Load a masked image: `.mimg` files carry all three planes, any other
/// format is read as an image with an empty mask and variance from `model`.
pub fn load_masked_image<P: Pixel>(path: &Path, model: &VarianceModel) -> Result<MaskedImage<P>> {
    if is_mimg(path) {
        return read_mimg(path);
    }
    let image = load_image::<P>(path)?;
    let variance = model.variance_for(&image)?;
    let mask = Array2::zeros(image.data.dim());
    MaskedImage::new(image, mask, variance)
}

pub fn is_mimg(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("mimg"))
}

/// Map `[low, high]` onto `[0, 1]`, clamping outside values.
fn stretch<P: Pixel>(value: P, low: f32, high: f32) -> f32 {
    let span = (high - low).max(f32::EPSILON);
    let v = value.widen() as f32;
    if v.is_finite() {
        ((v - low) / span).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Save an image as 16-bit grayscale TIFF, linearly stretched.
pub fn save_tiff<P: Pixel>(image: &Image<P>, low: f32, high: f32, path: &Path) -> Result<()> {
    let (h, w) = image.data.dim();
    let pixels: Vec<u16> = image
        .data
        .iter()
        .map(|&v| (stretch(v, low, high) * 65535.0) as u16)
        .collect();

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or(DiffimError::InvalidDimensions {
            width: w,
            height: h,
        })?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save an image as 8-bit grayscale PNG, linearly stretched.
pub fn save_png<P: Pixel>(image: &Image<P>, low: f32, high: f32, path: &Path) -> Result<()> {
    let (h, w) = image.data.dim();
    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &v) in image.data.indexed_iter() {
        let val = (stretch(v, low, high) * 255.0) as u8;
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a preview, choosing format from file extension.
pub fn save_preview<P: Pixel>(image: &Image<P>, low: f32, high: f32, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tiff" | "tif") => save_tiff(image, low, high, path),
        Some("png") => save_png(image, low, high, path),
        _ => save_tiff(image, low, high, path),
    }
}

/// Save an 8-bit PNG where pixels carrying any of `bits` are white.
pub fn save_mask_png(mask: &Array2<MaskPixel>, bits: MaskPixel, path: &Path) -> Result<()> {
    let (h, w) = mask.dim();
    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &m) in mask.indexed_iter() {
        let val = if m & bits != 0 { 255 } else { 0 };
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_clamps_and_handles_nan() {
        assert_eq!(stretch(-1.0f64, 0.0, 1.0), 0.0);
        assert_eq!(stretch(2.0f64, 0.0, 1.0), 1.0);
        assert!((stretch(0.0f32, -0.05, 0.05) - 0.5).abs() < 1e-6);
        assert_eq!(stretch(f32::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_stretch_degenerate_range() {
        // Equal bounds must not divide by zero.
        let v = stretch(0.3f64, 0.3, 0.3);
        assert!(v.is_finite());
    }
}
