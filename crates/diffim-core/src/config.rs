use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::background::Background;
use crate::consts::{DEFAULT_BAD_MASK_PLANES, DEFAULT_PREVIEW_HIGH, DEFAULT_PREVIEW_LOW};
use crate::error::{DiffimError, Result};
use crate::image::{mask, Image, MaskPixel};
use crate::kernel::{
    DeltaFunctionKernel, FixedKernel, GaussianKernel, Kernel, LinearCombinationKernel,
};
use crate::math::function::{Function2, PolynomialFunction2};
use crate::pixel::Pixel;
use crate::subtract::{ConvolutionTarget, SubtractOptions};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubtractionConfig {
    pub kernel: KernelConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default = "default_invert")]
    pub invert: bool,
    #[serde(default)]
    pub target: ConvolutionTarget,
    #[serde(default)]
    pub require_same_dimensions: bool,
    #[serde(default)]
    pub variance: VarianceModel,
    #[serde(default = "default_bad_mask_planes")]
    pub bad_mask_planes: Vec<String>,
    #[serde(default)]
    pub preview: PreviewConfig,
}

fn default_invert() -> bool {
    true
}

fn default_bad_mask_planes() -> Vec<String> {
    DEFAULT_BAD_MASK_PLANES.iter().map(|s| s.to_string()).collect()
}

impl Default for SubtractionConfig {
    fn default() -> Self {
        Self {
            kernel: KernelConfig::default(),
            background: BackgroundConfig::default(),
            invert: true,
            target: ConvolutionTarget::default(),
            require_same_dimensions: false,
            variance: VarianceModel::default(),
            bad_mask_planes: default_bad_mask_planes(),
            preview: PreviewConfig::default(),
        }
    }
}

impl SubtractionConfig {
    pub fn options(&self) -> SubtractOptions {
        SubtractOptions {
            invert: self.invert,
            target: self.target,
            require_same_dimensions: self.require_same_dimensions,
        }
    }

    /// Bits of `bad_mask_planes`, for residual statistics.
    pub fn bad_mask(&self) -> Result<MaskPixel> {
        mask::bits_for(self.bad_mask_planes.as_slice())
    }
}

/// Polynomial coefficients, ordered `1, x, y, x², xy, y², ...`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolynomialConfig {
    pub order: usize,
    pub coefficients: Vec<f64>,
}

impl PolynomialConfig {
    pub fn build(&self) -> Result<PolynomialFunction2> {
        PolynomialFunction2::new(self.order, self.coefficients.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KernelConfig {
    /// Centred delta function; the identity at any odd size.
    Delta { width: usize, height: usize },
    Gaussian { size: usize, sigma: f64 },
    /// Explicit row-major coefficients.
    Fixed {
        width: usize,
        height: usize,
        values: Vec<f64>,
    },
    /// Spatially varying sum of fixed basis kernels.
    LinearCombination {
        basis: Vec<KernelConfig>,
        spatial: Vec<PolynomialConfig>,
    },
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::Gaussian {
            size: 11,
            sigma: 1.5,
        }
    }
}

impl std::fmt::Display for KernelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delta { width, height } => write!(f, "Delta ({width}x{height})"),
            Self::Gaussian { size, sigma } => {
                write!(f, "Gaussian ({size}x{size}, sigma={sigma})")
            }
            Self::Fixed { width, height, .. } => write!(f, "Fixed ({width}x{height})"),
            Self::LinearCombination { basis, .. } => {
                write!(f, "Linear combination ({} basis kernels)", basis.len())
            }
        }
    }
}

impl KernelConfig {
    pub fn build(&self) -> Result<Box<dyn Kernel>> {
        let kernel: Box<dyn Kernel> = match self {
            Self::Delta { width, height } => {
                Box::new(DeltaFunctionKernel::centered(*width, *height)?)
            }
            Self::Gaussian { size, sigma } => Box::new(GaussianKernel::new(*size, *sigma)?),
            Self::Fixed {
                width,
                height,
                values,
            } => Box::new(FixedKernel::from_vec(*width, *height, values.clone())?),
            Self::LinearCombination { basis, spatial } => {
                let basis = basis
                    .iter()
                    .map(|b| {
                        let k = b.build()?;
                        if k.is_spatially_varying() {
                            return Err(DiffimError::InvalidParameters(
                                "basis kernels must be spatially invariant".into(),
                            ));
                        }
                        FixedKernel::from_kernel(k.as_ref(), 0.0, 0.0)
                    })
                    .collect::<Result<Vec<_>>>()?;
                let spatial = spatial
                    .iter()
                    .map(|p| Ok(Box::new(p.build()?) as Box<dyn Function2>))
                    .collect::<Result<Vec<_>>>()?;
                Box::new(LinearCombinationKernel::new(basis, spatial)?)
            }
        };
        Ok(kernel)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum BackgroundConfig {
    Constant {
        value: f64,
    },
    Polynomial(PolynomialConfig),
    #[default]
    None,
}

impl std::fmt::Display for BackgroundConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant { value } => write!(f, "Constant ({value})"),
            Self::Polynomial(p) => write!(f, "Polynomial (order {})", p.order),
            Self::None => write!(f, "None"),
        }
    }
}

impl BackgroundConfig {
    pub fn build(&self) -> Result<BackgroundModel> {
        Ok(match self {
            Self::Constant { value } => BackgroundModel::Constant(*value),
            Self::Polynomial(p) => BackgroundModel::Polynomial(p.build()?),
            Self::None => BackgroundModel::Constant(0.0),
        })
    }
}

/// Owned background, lent out as a [`Background`] for one subtraction.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundModel {
    Constant(f64),
    Polynomial(PolynomialFunction2),
}

impl BackgroundModel {
    pub fn as_background(&self) -> Background<'_> {
        match self {
            Self::Constant(v) => Background::Constant(*v),
            Self::Polynomial(p) => Background::Function(p),
        }
    }
}

/// Variance assigned to images loaded from formats without a variance plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum VarianceModel {
    #[default]
    Zero,
    /// `max(value, 0) / gain + read_noise²`, with `gain` in electrons per
    /// image unit and `read_noise` in image units.
    Poisson { gain: f64, read_noise: f64 },
}

impl VarianceModel {
    pub fn variance_for<P: Pixel>(&self, image: &Image<P>) -> Result<Array2<P>> {
        match *self {
            Self::Zero => Ok(Array2::from_elem(image.data.dim(), P::zero())),
            Self::Poisson { gain, read_noise } => {
                if !(gain > 0.0) {
                    return Err(DiffimError::InvalidParameters(format!(
                        "gain must be positive, got {gain}"
                    )));
                }
                let floor = read_noise * read_noise;
                Ok(image
                    .data
                    .mapv(|v| P::narrow(v.widen().max(0.0) / gain + floor)))
            }
        }
    }
}

impl std::fmt::Display for VarianceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zero => write!(f, "Zero"),
            Self::Poisson { gain, read_noise } => {
                write!(f, "Poisson (gain={gain}, read_noise={read_noise})")
            }
        }
    }
}

/// Linear stretch applied when writing PNG/TIFF previews.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub low: f32,
    pub high: f32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            low: DEFAULT_PREVIEW_LOW,
            high: DEFAULT_PREVIEW_HIGH,
        }
    }
}
