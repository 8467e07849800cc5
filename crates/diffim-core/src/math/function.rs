use crate::error::{DiffimError, Result};

/// A smooth scalar function of parent pixel coordinates.
pub trait Function2: Send + Sync {
    fn evaluate(&self, x: f64, y: f64) -> f64;
}

impl<F> Function2 for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// 2D polynomial with terms ordered `1, x, y, x², xy, y², x³, x²y, ...`.
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialFunction2 {
    order: usize,
    coefficients: Vec<f64>,
}

impl PolynomialFunction2 {
    pub fn new(order: usize, coefficients: Vec<f64>) -> Result<Self> {
        let expected = Self::n_parameters(order);
        if coefficients.len() != expected {
            return Err(DiffimError::InvalidParameters(format!(
                "order {order} polynomial needs {expected} coefficients, got {}",
                coefficients.len()
            )));
        }
        Ok(Self {
            order,
            coefficients,
        })
    }

    /// Polynomial of the given order with every coefficient zero.
    pub fn zeros(order: usize) -> Self {
        Self {
            order,
            coefficients: vec![0.0; Self::n_parameters(order)],
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            order: 0,
            coefficients: vec![value],
        }
    }

    pub fn n_parameters(order: usize) -> usize {
        (order + 1) * (order + 2) / 2
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Function2 for PolynomialFunction2 {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        let mut idx = 0;
        for degree in 0..=self.order {
            // Terms of this degree: x^(degree-k) * y^k for k = 0..=degree.
            for k in 0..=degree {
                sum += self.coefficients[idx]
                    * x.powi((degree - k) as i32)
                    * y.powi(k as i32);
                idx += 1;
            }
        }
        sum
    }
}
