//! Convolve-and-subtract image differencing.
//!
//! A template image is convolved with a matching kernel and subtracted,
//! together with a differential background, from a science image. The
//! result is a masked difference image whose mask and variance planes are
//! propagated from both operands.

pub mod background;
pub mod config;
pub mod consts;
pub mod convolve;
pub mod error;
pub mod geom;
pub mod image;
pub mod io;
pub mod kernel;
pub mod math;
pub mod pixel;
pub mod stats;
pub mod subtract;

pub use background::Background;
pub use error::{DiffimError, Result};
pub use geom::BoundingBox;
pub use image::{mask, ConvolutionInput, Image, MaskPixel, MaskedImage};
pub use kernel::Kernel;
pub use pixel::Pixel;
pub use subtract::{convolve_and_subtract, subtract_images, subtract_matched, SubtractOptions};
