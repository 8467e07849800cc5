use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::background::Background;
use crate::consts::KERNEL_SUM_EPSILON;
use crate::convolve::{check_fits, convolve_region};
use crate::error::{DiffimError, Result};
use crate::geom::BoundingBox;
use crate::image::{ConvolutionInput, MaskedImage};
use crate::kernel::Kernel;
use crate::pixel::Pixel;

/// Which operand the matching kernel is applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvolutionTarget {
    /// Convolve the template; the usual case when the science PSF is broader.
    #[default]
    Template,
    /// Convolve the science image and rescale back to the template's photometry.
    Science,
}

impl std::fmt::Display for ConvolutionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template => write!(f, "Template"),
            Self::Science => write!(f, "Science"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtractOptions {
    /// `true`: science - model. `false`: model - science.
    pub invert: bool,
    pub target: ConvolutionTarget,
    /// Reject operands whose bounding boxes differ.
    pub require_same_dimensions: bool,
}

impl Default for SubtractOptions {
    fn default() -> Self {
        Self {
            invert: true,
            target: ConvolutionTarget::Template,
            require_same_dimensions: false,
        }
    }
}

/// Convolve the template with `kernel` and subtract it and the background
/// from the science image.
///
/// With `invert` the result is `science - (kernel * template) - background`;
/// without it the sign is flipped. The output covers the overlap of the two
/// operands. Its variance is the template variance convolved with the
/// squared kernel plus the science variance, and its mask is the OR of the
/// template mask under the kernel footprint and the science mask. Pixels
/// whose footprint leaves the template carry `EDGE`.
pub fn convolve_and_subtract<P, T>(
    template: &T,
    science: &MaskedImage<P>,
    kernel: &dyn Kernel,
    background: Background<'_>,
    invert: bool,
) -> Result<MaskedImage<P>>
where
    P: Pixel,
    T: ConvolutionInput<P> + ?Sized,
{
    let region = overlap(template, science, kernel)?;
    let sci_box = science.bbox();

    let out = convolve_region(template, kernel, region, |x, y, s| {
        let (col, row) = local(sci_box, x, y);
        let sci = science.image.data[[row, col]].widen();
        let model = s.value + background.evaluate(x as f64, y as f64);
        let diff = if invert { sci - model } else { model - sci };
        (
            P::narrow(diff),
            s.mask | science.mask[[row, col]],
            P::narrow(s.variance + science.variance[[row, col]].widen()),
        )
    });

    info!(
        bbox = %out.bbox(),
        invert,
        constant_background = background.is_constant(),
        "Convolve-and-subtract complete"
    );
    Ok(out)
}

/// `science - matched - background` for a template that was already
/// convolved. Both operands must share one bounding box.
pub fn subtract_matched<P: Pixel>(
    science: &MaskedImage<P>,
    matched: &MaskedImage<P>,
    background: Background<'_>,
) -> Result<MaskedImage<P>> {
    science.check_planes()?;
    matched.check_planes()?;
    if science.bbox() != matched.bbox() {
        return Err(DiffimError::DimensionMismatch(format!(
            "science {} vs matched {}",
            science.bbox(),
            matched.bbox()
        )));
    }

    let mut out = science.clone();
    let (x0, y0) = (science.image.x0 as f64, science.image.y0 as f64);
    for ((row, col), v) in out.image.data.indexed_iter_mut() {
        let bg = background.evaluate(x0 + col as f64, y0 + row as f64);
        *v = P::narrow(v.widen() - matched.image.data[[row, col]].widen() - bg);
    }
    out.variance
        .zip_mut_with(&matched.variance, |a, &b| *a = *a + b);
    out.mask.zip_mut_with(&matched.mask, |a, &b| *a |= b);
    Ok(out)
}

/// Direction-aware subtraction.
///
/// With [`ConvolutionTarget::Template`] this is [`convolve_and_subtract`].
/// With [`ConvolutionTarget::Science`] the science image is convolved
/// instead and the background is added to it. The difference is then
/// negated, so positive residuals still mean excess science flux, and
/// divided by the kernel sum at the centre of the overlap to return to the
/// template's photometric scale.
pub fn subtract_images<P: Pixel>(
    template: &MaskedImage<P>,
    science: &MaskedImage<P>,
    kernel: &dyn Kernel,
    background: Background<'_>,
    options: &SubtractOptions,
) -> Result<MaskedImage<P>> {
    if options.require_same_dimensions && template.bbox() != science.bbox() {
        return Err(DiffimError::DimensionMismatch(format!(
            "template {} vs science {}",
            template.bbox(),
            science.bbox()
        )));
    }

    match options.target {
        ConvolutionTarget::Template => {
            convolve_and_subtract(template, science, kernel, background, options.invert)
        }
        ConvolutionTarget::Science => {
            convolve_science(template, science, kernel, background, options.invert)
        }
    }
}

fn convolve_science<P: Pixel>(
    template: &MaskedImage<P>,
    science: &MaskedImage<P>,
    kernel: &dyn Kernel,
    background: Background<'_>,
    invert: bool,
) -> Result<MaskedImage<P>> {
    let region = overlap(template, science, kernel)?;
    let (cx, cy) = region.center();
    let kernel_sum = kernel.sum_at(cx, cy);
    if kernel_sum.abs() < KERNEL_SUM_EPSILON {
        return Err(DiffimError::invalid_kernel(
            kernel.width(),
            kernel.height(),
            "kernel sum is zero; cannot rescale the difference",
        ));
    }
    debug!(kernel_sum, "Rescaling science-convolved difference");

    let tpl_box = template.bbox();
    let out = convolve_region(science, kernel, region, |x, y, s| {
        let (col, row) = local(tpl_box, x, y);
        let tpl = template.image.data[[row, col]].widen();
        // The background belongs to the convolved side of the model.
        let matched = s.value + background.evaluate(x as f64, y as f64);
        let diff = (matched - tpl) / kernel_sum;
        let diff = if invert { diff } else { -diff };
        let var =
            (s.variance + template.variance[[row, col]].widen()) / (kernel_sum * kernel_sum);
        (
            P::narrow(diff),
            s.mask | template.mask[[row, col]],
            P::narrow(var),
        )
    });

    info!(bbox = %out.bbox(), kernel_sum, "Science-convolved subtraction complete");
    Ok(out)
}

/// Overlap of the two operands, checked against the kernel footprint.
///
/// Plane shapes are checked first so no pixel access can go out of bounds.
fn overlap<P, T>(
    template: &T,
    science: &MaskedImage<P>,
    kernel: &dyn Kernel,
) -> Result<BoundingBox>
where
    P: Pixel,
    T: ConvolutionInput<P> + ?Sized,
{
    template.check_planes()?;
    science.check_planes()?;
    kernel.validate()?;
    let (template, science) = (template.bbox(), science.bbox());
    let insufficient = || DiffimError::InsufficientOverlap {
        template,
        science,
        kernel_width: kernel.width(),
        kernel_height: kernel.height(),
    };
    let region = template.intersect(&science).ok_or_else(insufficient)?;
    check_fits(kernel, region).map_err(|_| insufficient())?;

    if region != template || region != science {
        warn!(
            template = %template,
            science = %science,
            overlap = %region,
            "Operands only partially overlap; output covers the overlap"
        );
    }
    Ok(region)
}

fn local(bbox: BoundingBox, x: i64, y: i64) -> (usize, usize) {
    ((x - bbox.x0 as i64) as usize, (y - bbox.y0 as i64) as usize)
}
