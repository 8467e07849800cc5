use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{DiffimError, Result};
use crate::geom::BoundingBox;
use crate::image::{mask, ConvolutionInput, Image, MaskPixel, MaskedImage};
use crate::kernel::Kernel;
use crate::pixel::Pixel;

/// Kernel-weighted sums at one output pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    /// Sum of K * image over the footprint.
    pub value: f64,
    /// Sum of K² * variance over the footprint (zero for plain images).
    pub variance: f64,
    /// OR of every mask pixel under the footprint, plus `EDGE` when the
    /// footprint left the input.
    pub mask: MaskPixel,
}

/// Convolve a masked image. Mask bits spread over the kernel footprint and
/// the variance is convolved with the squared kernel. The kernel is not
/// normalised.
pub fn convolve_masked<P: Pixel>(
    input: &MaskedImage<P>,
    kernel: &dyn Kernel,
) -> Result<MaskedImage<P>> {
    input.check_planes()?;
    check_fits(kernel, input.bbox())?;
    Ok(convolve_region(input, kernel, input.bbox(), |_, _, s| {
        (P::narrow(s.value), s.mask, P::narrow(s.variance))
    }))
}

/// Convolve a plain image; the `EDGE` band is not reported.
pub fn convolve_image<P: Pixel>(input: &Image<P>, kernel: &dyn Kernel) -> Result<Image<P>> {
    check_fits(kernel, input.bbox())?;
    let out = convolve_region(input, kernel, input.bbox(), |_, _, s| {
        (P::narrow(s.value), s.mask, P::zero())
    });
    Ok(out.image)
}

/// Fail unless the kernel is well formed and fits inside `region`.
pub(crate) fn check_fits(kernel: &dyn Kernel, region: BoundingBox) -> Result<()> {
    kernel.validate()?;
    if region.width < kernel.width() || region.height < kernel.height() {
        return Err(DiffimError::DimensionMismatch(format!(
            "region {} smaller than {}x{} kernel",
            region,
            kernel.width(),
            kernel.height()
        )));
    }
    Ok(())
}

/// Borrowed planes of a convolution input, addressed in local pixels.
struct Footprint<'a, P: Pixel> {
    image: &'a Array2<P>,
    mask: Option<&'a Array2<MaskPixel>>,
    variance: Option<&'a Array2<P>>,
    bbox: BoundingBox,
}

impl<'a, P: Pixel> Footprint<'a, P> {
    fn new<I: ConvolutionInput<P> + ?Sized>(input: &'a I) -> Self {
        Self {
            image: &input.image().data,
            mask: input.mask(),
            variance: input.variance(),
            bbox: input.bbox(),
        }
    }

    /// Convolution sums at parent coordinate `(x, y)`.
    ///
    /// Source pixels outside the input clamp to the nearest edge pixel, so
    /// edge values are still produced; they are marked with `EDGE`.
    ///
    /// `center` is the local `(col, row)` of the kernel pixel aligned with the
    /// output pixel.
    fn sample(&self, x: i64, y: i64, stencil: &Array2<f64>, center: (usize, usize)) -> Sample {
        let (kh, kw) = stencil.dim();
        let cx = center.0 as i64;
        let cy = center.1 as i64;
        let w = self.bbox.width as i64;
        let h = self.bbox.height as i64;
        let lx = x - self.bbox.x0 as i64;
        let ly = y - self.bbox.y0 as i64;

        let mut value = 0.0f64;
        let mut variance = 0.0f64;
        let mut bits: MaskPixel = 0;

        for j in 0..kh {
            let sy = (ly + cy - j as i64).clamp(0, h - 1) as usize;
            for i in 0..kw {
                let k = stencil[[j, i]];
                let sx = (lx + cx - i as i64).clamp(0, w - 1) as usize;
                value += k * self.image[[sy, sx]].widen();
                if let Some(var) = self.variance {
                    variance += k * k * var[[sy, sx]].widen();
                }
                if let Some(m) = self.mask {
                    bits |= m[[sy, sx]];
                }
            }
        }

        // Source offsets run from +c down to c - (k - 1).
        if lx + cx - (kw as i64 - 1) < 0
            || lx + cx >= w
            || ly + cy - (kh as i64 - 1) < 0
            || ly + cy >= h
        {
            bits |= mask::EDGE;
        }

        Sample {
            value,
            variance,
            mask: bits,
        }
    }
}

/// Convolve `input` over `region` (parent coordinates, inside the input) and
/// map each sample to output pixel, mask and variance with `finish`.
///
/// `finish` receives the parent coordinate of the output pixel.
pub(crate) fn convolve_region<P, I, F>(
    input: &I,
    kernel: &dyn Kernel,
    region: BoundingBox,
    finish: F,
) -> MaskedImage<P>
where
    P: Pixel,
    I: ConvolutionInput<P> + ?Sized,
    F: Fn(i64, i64, Sample) -> (P, MaskPixel, P) + Sync,
{
    let footprint = Footprint::new(input);
    let (h, w) = (region.height, region.width);
    let varying = kernel.is_spatially_varying();
    let center = kernel.center();
    let fixed_stencil = if varying {
        None
    } else {
        Some(kernel.compute_array(0.0, 0.0))
    };

    debug!(
        region = %region,
        kernel_width = kernel.width(),
        kernel_height = kernel.height(),
        spatially_varying = varying,
        "Convolving"
    );

    let row_fn = |row: usize| -> Vec<(P, MaskPixel, P)> {
        let y = region.y0 as i64 + row as i64;
        let mut scratch = Array2::<f64>::zeros((kernel.height(), kernel.width()));
        (0..w)
            .map(|col| {
                let x = region.x0 as i64 + col as i64;
                let stencil = match &fixed_stencil {
                    Some(s) => s,
                    None => {
                        kernel.compute(x as f64, y as f64, &mut scratch);
                        &scratch
                    }
                };
                finish(x, y, footprint.sample(x, y, stencil, center))
            })
            .collect()
    };

    let rows: Vec<Vec<(P, MaskPixel, P)>> = if region.area() >= PARALLEL_PIXEL_THRESHOLD {
        (0..h).into_par_iter().map(row_fn).collect()
    } else {
        (0..h).map(row_fn).collect()
    };

    let mut image = Array2::<P>::zeros((h, w));
    let mut mask_plane = Array2::<MaskPixel>::zeros((h, w));
    let mut variance = Array2::<P>::zeros((h, w));
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, (v, m, var)) in row_data.into_iter().enumerate() {
            image[[row, col]] = v;
            mask_plane[[row, col]] = m;
            variance[[row, col]] = var;
        }
    }

    MaskedImage {
        image: Image::with_origin(image, region.x0, region.y0),
        mask: mask_plane,
        variance,
    }
}
