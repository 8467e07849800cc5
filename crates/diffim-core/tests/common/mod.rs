#![allow(dead_code)]

use ndarray::Array2;

use diffim_core::image::{Image, MaskedImage};
use diffim_core::pixel::Pixel;

/// Masked image filled with one value and one variance, origin at (0, 0).
pub fn flat_masked<P: Pixel>(
    width: usize,
    height: usize,
    value: f64,
    variance: f64,
) -> MaskedImage<P> {
    MaskedImage::from_elem(width, height, P::narrow(value), P::narrow(variance))
}

/// Image whose pixel at local (col, row) is `f(col, row)`.
pub fn image_from_fn<P: Pixel>(
    width: usize,
    height: usize,
    f: impl Fn(usize, usize) -> f64,
) -> Image<P> {
    Image::new(Array2::from_shape_fn((height, width), |(row, col)| {
        P::narrow(f(col, row))
    }))
}

/// Masked image with pixel values from `f`, empty mask and the given variance.
pub fn masked_from_fn<P: Pixel>(
    width: usize,
    height: usize,
    variance: f64,
    f: impl Fn(usize, usize) -> f64,
) -> MaskedImage<P> {
    let image = image_from_fn(width, height, f);
    MaskedImage::new(
        image,
        Array2::zeros((height, width)),
        Array2::from_elem((height, width), P::narrow(variance)),
    )
    .expect("planes share a shape")
}

/// True if `(col, row)` lies within `kw/2` columns or `kh/2` rows of the border.
pub fn in_edge_band(
    col: usize,
    row: usize,
    width: usize,
    height: usize,
    kw: usize,
    kh: usize,
) -> bool {
    let hx = kw / 2;
    let hy = kh / 2;
    col < hx || row < hy || col + hx >= width || row + hy >= height
}
