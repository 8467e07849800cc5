use ndarray::Array2;

use crate::error::{DiffimError, Result};
use crate::geom::BoundingBox;
use crate::pixel::Pixel;

/// Element type of the mask plane.
pub type MaskPixel = u32;

/// Mask-plane bit definitions.
pub mod mask {
    use super::MaskPixel;
    use crate::error::{DiffimError, Result};

    /// Bad detector pixel.
    pub const BAD: MaskPixel = 1 << 0;
    /// Saturated pixel.
    pub const SAT: MaskPixel = 1 << 1;
    /// Interpolated pixel.
    pub const INTRP: MaskPixel = 1 << 2;
    /// Cosmic ray.
    pub const CR: MaskPixel = 1 << 3;
    /// Convolution footprint left the input image.
    pub const EDGE: MaskPixel = 1 << 4;
    /// Pixel belongs to a detected source.
    pub const DETECTED: MaskPixel = 1 << 5;
    /// No data was recorded.
    pub const NO_DATA: MaskPixel = 1 << 8;

    /// Every named plane, in bit order.
    pub const PLANES: [(&str, MaskPixel); 7] = [
        ("BAD", BAD),
        ("SAT", SAT),
        ("INTRP", INTRP),
        ("CR", CR),
        ("EDGE", EDGE),
        ("DETECTED", DETECTED),
        ("NO_DATA", NO_DATA),
    ];

    /// Look up a plane bit by name (case-insensitive).
    pub fn plane_bit(name: &str) -> Result<MaskPixel> {
        PLANES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, bit)| *bit)
            .ok_or_else(|| DiffimError::UnknownMaskPlane(name.to_string()))
    }

    /// OR together the bits of several named planes.
    pub fn bits_for<S: AsRef<str>>(names: &[S]) -> Result<MaskPixel> {
        names
            .iter()
            .try_fold(0, |acc, name| -> Result<MaskPixel> {
                Ok(acc | plane_bit(name.as_ref())?)
            })
    }
}

/// A single-plane image with a parent-coordinate origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<P: Pixel> {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<P>,
    pub x0: i32,
    pub y0: i32,
}

impl<P: Pixel> Image<P> {
    pub fn new(data: Array2<P>) -> Self {
        Self { data, x0: 0, y0: 0 }
    }

    pub fn with_origin(data: Array2<P>, x0: i32, y0: i32) -> Self {
        Self { data, x0, y0 }
    }

    pub fn from_elem(width: usize, height: usize, value: P) -> Self {
        Self::new(Array2::from_elem((height, width), value))
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x0, self.y0, self.width(), self.height())
    }
}

/// Image plus mask and variance planes sharing one bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskedImage<P: Pixel> {
    pub image: Image<P>,
    pub mask: Array2<MaskPixel>,
    pub variance: Array2<P>,
}

impl<P: Pixel> MaskedImage<P> {
    /// Bundle three planes, checking that their shapes agree.
    pub fn new(image: Image<P>, mask: Array2<MaskPixel>, variance: Array2<P>) -> Result<Self> {
        let out = Self {
            image,
            mask,
            variance,
        };
        out.check_planes()?;
        Ok(out)
    }

    pub fn from_elem(width: usize, height: usize, value: P, variance: P) -> Self {
        Self {
            image: Image::from_elem(width, height, value),
            mask: Array2::zeros((height, width)),
            variance: Array2::from_elem((height, width), variance),
        }
    }

    pub fn set_origin(&mut self, x0: i32, y0: i32) {
        self.image.x0 = x0;
        self.image.y0 = y0;
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn bbox(&self) -> BoundingBox {
        self.image.bbox()
    }

    /// Number of pixels carrying any of `bits`.
    pub fn count_masked(&self, bits: MaskPixel) -> usize {
        self.mask.iter().filter(|&&m| m & bits != 0).count()
    }
}

/// Anything that can be convolved: a plain image or a masked image.
///
/// A plain image contributes no mask bits and no variance.
pub trait ConvolutionInput<P: Pixel>: Sync {
    fn image(&self) -> &Image<P>;
    fn mask(&self) -> Option<&Array2<MaskPixel>>;
    fn variance(&self) -> Option<&Array2<P>>;

    fn bbox(&self) -> BoundingBox {
        self.image().bbox()
    }

    /// Fail unless the mask and variance planes match the image shape.
    ///
    /// The planes are public fields, so a caller can swap one out after
    /// construction.
    fn check_planes(&self) -> Result<()> {
        let shape = self.image().data.dim();
        let mask = self.mask().map(|m| m.dim());
        let variance = self.variance().map(|v| v.dim());
        if mask.is_some_and(|d| d != shape) || variance.is_some_and(|d| d != shape) {
            return Err(DiffimError::DimensionMismatch(format!(
                "image {:?}, mask {:?}, variance {:?}",
                shape, mask, variance
            )));
        }
        Ok(())
    }
}

impl<P: Pixel> ConvolutionInput<P> for Image<P> {
    fn image(&self) -> &Image<P> {
        self
    }

    fn mask(&self) -> Option<&Array2<MaskPixel>> {
        None
    }

    fn variance(&self) -> Option<&Array2<P>> {
        None
    }
}

impl<P: Pixel> ConvolutionInput<P> for MaskedImage<P> {
    fn image(&self) -> &Image<P> {
        &self.image
    }

    fn mask(&self) -> Option<&Array2<MaskPixel>> {
        Some(&self.mask)
    }

    fn variance(&self) -> Option<&Array2<P>> {
        Some(&self.variance)
    }
}
