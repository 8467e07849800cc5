//! Convolution kernels.
//!
//! A kernel is an odd-sized stencil. Its centre defaults to
//! `(width / 2, height / 2)`; the convolution aligns that pixel with the
//! output pixel, so an off-centre kernel shifts the image.
//! Spatially varying kernels are evaluated at the parent coordinate of each
//! output pixel; the convolution code only ever asks for coefficients.

mod fixed;
mod linear;

pub use fixed::{DeltaFunctionKernel, FixedKernel, GaussianKernel};
pub use linear::LinearCombinationKernel;

use ndarray::Array2;

use crate::error::{DiffimError, Result};

pub trait Kernel: Send + Sync {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Local `(col, row)` of the pixel aligned with each output pixel.
    fn center(&self) -> (usize, usize) {
        (self.width() / 2, self.height() / 2)
    }

    fn is_spatially_varying(&self) -> bool {
        false
    }

    /// Write the coefficients at parent coordinate `(x, y)` into `out`,
    /// which has shape `(height, width)`.
    fn compute(&self, x: f64, y: f64, out: &mut Array2<f64>);

    fn compute_array(&self, x: f64, y: f64) -> Array2<f64> {
        let mut out = Array2::zeros((self.height(), self.width()));
        self.compute(x, y, &mut out);
        out
    }

    /// Sum of the coefficients at `(x, y)`.
    fn sum_at(&self, x: f64, y: f64) -> f64 {
        self.compute_array(x, y).sum()
    }

    fn validate(&self) -> Result<()> {
        validate_dimensions(self.width(), self.height())?;
        let (cx, cy) = self.center();
        if cx >= self.width() || cy >= self.height() {
            return Err(DiffimError::invalid_kernel(
                self.width(),
                self.height(),
                format!("centre ({cx}, {cy}) outside kernel"),
            ));
        }
        Ok(())
    }
}

/// Kernels must have non-zero, odd width and height.
pub fn validate_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DiffimError::invalid_kernel(
            width,
            height,
            "dimensions must be non-zero",
        ));
    }
    if width % 2 == 0 || height % 2 == 0 {
        return Err(DiffimError::invalid_kernel(
            width,
            height,
            "dimensions must be odd",
        ));
    }
    Ok(())
}
