use crate::math::function::Function2;

/// Differential background removed alongside the convolved template.
#[derive(Clone, Copy)]
pub enum Background<'a> {
    Constant(f64),
    Function(&'a dyn Function2),
}

impl<'a> Background<'a> {
    pub fn zero() -> Self {
        Self::Constant(0.0)
    }

    /// Background level at parent coordinate `(x, y)`.
    #[inline]
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Function(f) => f.evaluate(x, y),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

impl Default for Background<'_> {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<f64> for Background<'_> {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl<'a, F: Function2> From<&'a F> for Background<'a> {
    fn from(f: &'a F) -> Self {
        Self::Function(f)
    }
}

impl std::fmt::Debug for Background<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "Constant({v})"),
            Self::Function(_) => write!(f, "Function(..)"),
        }
    }
}
