use ndarray::Array2;

use crate::error::{DiffimError, Result};
use crate::math::function::{Function2, PolynomialFunction2};

use super::{FixedKernel, Kernel};

/// Spatially varying kernel: `K(x, y) = sum_i f_i(x, y) * B_i`.
///
/// Each basis kernel `B_i` is fixed; its weight `f_i` is a function of the
/// parent coordinate of the output pixel.
pub struct LinearCombinationKernel {
    basis: Vec<Array2<f64>>,
    spatial: Vec<Box<dyn Function2>>,
    width: usize,
    height: usize,
}

impl LinearCombinationKernel {
    pub fn new(basis: Vec<FixedKernel>, spatial: Vec<Box<dyn Function2>>) -> Result<Self> {
        let first = basis.first().ok_or_else(|| {
            DiffimError::InvalidParameters(
                "linear combination needs at least one basis kernel".into(),
            )
        })?;
        let (width, height) = (first.width(), first.height());

        if let Some(bad) = basis
            .iter()
            .find(|k| k.width() != width || k.height() != height)
        {
            return Err(DiffimError::InvalidParameters(format!(
                "basis kernels must share one size: {}x{} vs {}x{}",
                width,
                height,
                bad.width(),
                bad.height()
            )));
        }
        if spatial.len() != basis.len() {
            return Err(DiffimError::InvalidParameters(format!(
                "{} basis kernels but {} spatial functions",
                basis.len(),
                spatial.len()
            )));
        }

        Ok(Self {
            basis: basis.into_iter().map(|k| k.coefficients().clone()).collect(),
            spatial,
            width,
            height,
        })
    }

    /// Spatially constant weights.
    pub fn with_weights(basis: Vec<FixedKernel>, weights: &[f64]) -> Result<Self> {
        let spatial = weights
            .iter()
            .map(|&w| Box::new(PolynomialFunction2::constant(w)) as Box<dyn Function2>)
            .collect();
        Self::new(basis, spatial)
    }

    pub fn n_basis(&self) -> usize {
        self.basis.len()
    }

    /// Basis weights at `(x, y)`.
    pub fn weights_at(&self, x: f64, y: f64) -> Vec<f64> {
        self.spatial.iter().map(|f| f.evaluate(x, y)).collect()
    }
}

impl Kernel for LinearCombinationKernel {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_spatially_varying(&self) -> bool {
        true
    }

    fn compute(&self, x: f64, y: f64, out: &mut Array2<f64>) {
        out.fill(0.0);
        for (b, f) in self.basis.iter().zip(&self.spatial) {
            let w = f.evaluate(x, y);
            if w != 0.0 {
                out.scaled_add(w, b);
            }
        }
    }
}

impl std::fmt::Debug for LinearCombinationKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearCombinationKernel")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("n_basis", &self.basis.len())
            .finish()
    }
}
