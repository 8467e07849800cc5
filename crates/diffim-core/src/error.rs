use thiserror::Error;

use crate::geom::BoundingBox;

#[derive(Error, Debug)]
pub enum DiffimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid kernel {width}x{height}: {reason}")]
    InvalidKernel {
        width: usize,
        height: usize,
        reason: String,
    },

    /// The template/science overlap is smaller than the kernel.
    ///
    /// This is a dimension mismatch, but it is not the `DimensionMismatch`
    /// variant: match both, or call [`DiffimError::is_dimension_mismatch`],
    /// to catch every operand-geometry failure.
    #[error(
        "Overlap of template {template} and science {science} \
         is smaller than a {kernel_width}x{kernel_height} kernel"
    )]
    InsufficientOverlap {
        template: BoundingBox,
        science: BoundingBox,
        kernel_width: usize,
        kernel_height: usize,
    },

    /// Unequal bounding boxes, planes of differing shape, or a region smaller
    /// than the kernel. See also `InsufficientOverlap`.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Pixel type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Unknown mask plane: {0}")]
    UnknownMaskPlane(String),

    #[error("Invalid masked image file: {0}")]
    InvalidFile(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl DiffimError {
    pub(crate) fn invalid_kernel(width: usize, height: usize, reason: impl Into<String>) -> Self {
        Self::InvalidKernel {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// True for both flavours of operand-geometry failure.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::InsufficientOverlap { .. } | Self::DimensionMismatch(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DiffimError>;
