use ndarray::Array2;

use crate::error::{DiffimError, Result};

use super::{validate_dimensions, Kernel};

/// Spatially invariant kernel backed by an explicit coefficient array.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedKernel {
    coefficients: Array2<f64>,
}

impl FixedKernel {
    /// `coefficients` has shape `(height, width)`.
    pub fn new(coefficients: Array2<f64>) -> Result<Self> {
        let (h, w) = coefficients.dim();
        validate_dimensions(w, h)?;
        Ok(Self { coefficients })
    }

    /// Build from a row-major coefficient list.
    pub fn from_vec(width: usize, height: usize, values: Vec<f64>) -> Result<Self> {
        validate_dimensions(width, height)?;
        let n = values.len();
        let coefficients = Array2::from_shape_vec((height, width), values).map_err(|_| {
            DiffimError::invalid_kernel(
                width,
                height,
                format!("expected {} coefficients, got {}", width * height, n),
            )
        })?;
        Ok(Self { coefficients })
    }

    /// Snapshot any kernel at one position.
    pub fn from_kernel(kernel: &dyn Kernel, x: f64, y: f64) -> Result<Self> {
        kernel.validate()?;
        Ok(Self {
            coefficients: kernel.compute_array(x, y),
        })
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    pub fn sum(&self) -> f64 {
        self.coefficients.sum()
    }
}

impl Kernel for FixedKernel {
    fn width(&self) -> usize {
        self.coefficients.ncols()
    }

    fn height(&self) -> usize {
        self.coefficients.nrows()
    }

    fn compute(&self, _x: f64, _y: f64, out: &mut Array2<f64>) {
        out.assign(&self.coefficients);
    }

    fn sum_at(&self, _x: f64, _y: f64) -> f64 {
        self.sum()
    }
}

/// A kernel that is zero everywhere except one unit pixel.
///
/// With the unit pixel at the centre this is the identity; off-centre it
/// shifts the image by an integer offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeltaFunctionKernel {
    width: usize,
    height: usize,
    pixel: (usize, usize),
}

impl DeltaFunctionKernel {
    /// `pixel` is the local `(col, row)` of the unit coefficient.
    pub fn new(width: usize, height: usize, pixel: (usize, usize)) -> Result<Self> {
        validate_dimensions(width, height)?;
        if pixel.0 >= width || pixel.1 >= height {
            return Err(DiffimError::invalid_kernel(
                width,
                height,
                format!("delta pixel {:?} outside kernel", pixel),
            ));
        }
        Ok(Self {
            width,
            height,
            pixel,
        })
    }

    /// Centred delta function of the given size.
    pub fn centered(width: usize, height: usize) -> Result<Self> {
        Self::new(width, height, (width / 2, height / 2))
    }

    /// The 1x1 identity kernel.
    pub fn identity() -> Self {
        Self {
            width: 1,
            height: 1,
            pixel: (0, 0),
        }
    }
}

impl Kernel for DeltaFunctionKernel {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn compute(&self, _x: f64, _y: f64, out: &mut Array2<f64>) {
        out.fill(0.0);
        out[[self.pixel.1, self.pixel.0]] = 1.0;
    }

    fn sum_at(&self, _x: f64, _y: f64) -> f64 {
        1.0
    }
}

/// Circular Gaussian sampled on an odd square stencil, normalised to unit sum.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianKernel {
    inner: FixedKernel,
}

impl GaussianKernel {
    pub fn new(size: usize, sigma: f64) -> Result<Self> {
        validate_dimensions(size, size)?;
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(DiffimError::InvalidParameters(format!(
                "Gaussian sigma must be positive, got {sigma}"
            )));
        }

        let radius = (size / 2) as f64;
        let s2 = 2.0 * sigma * sigma;
        let mut coefficients = Array2::<f64>::zeros((size, size));
        for ((row, col), v) in coefficients.indexed_iter_mut() {
            let dx = col as f64 - radius;
            let dy = row as f64 - radius;
            *v = (-(dx * dx + dy * dy) / s2).exp();
        }
        let sum = coefficients.sum();
        coefficients.mapv_inplace(|v| v / sum);

        Ok(Self {
            inner: FixedKernel { coefficients },
        })
    }
}

impl Kernel for GaussianKernel {
    fn width(&self) -> usize {
        self.inner.width()
    }

    fn height(&self) -> usize {
        self.inner.height()
    }

    fn compute(&self, x: f64, y: f64, out: &mut Array2<f64>) {
        self.inner.compute(x, y, out);
    }

    fn sum_at(&self, _x: f64, _y: f64) -> f64 {
        self.inner.sum()
    }
}
