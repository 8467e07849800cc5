use tracing::debug;

use crate::image::{MaskPixel, MaskedImage};
use crate::pixel::Pixel;

/// Summary of a difference image over its unmasked pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DifferenceStats {
    pub mean: f64,
    pub rms: f64,
    /// Mean of `value / sqrt(variance)` over pixels with positive variance.
    pub mean_normalized: f64,
    /// Standard deviation of the normalised residuals; ~1 for a good match.
    pub std_normalized: f64,
    pub n_used: usize,
    pub n_rejected: usize,
}

impl DifferenceStats {
    /// Statistics over pixels carrying none of `bad_mask`. Non-finite values
    /// count as rejected.
    pub fn compute<P: Pixel>(diff: &MaskedImage<P>, bad_mask: MaskPixel) -> Self {
        let mut n = 0usize;
        let mut rejected = 0usize;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut n_norm = 0usize;
        let mut norm_sum = 0.0f64;
        let mut norm_sum_sq = 0.0f64;

        let planes = diff
            .image
            .data
            .iter()
            .zip(diff.mask.iter())
            .zip(diff.variance.iter());
        for ((&v, &m), &var) in planes {
            let v = v.widen();
            if m & bad_mask != 0 || !v.is_finite() {
                rejected += 1;
                continue;
            }
            n += 1;
            sum += v;
            sum_sq += v * v;

            let var = var.widen();
            if var > 0.0 && var.is_finite() {
                let z = v / var.sqrt();
                n_norm += 1;
                norm_sum += z;
                norm_sum_sq += z * z;
            }
        }

        if n == 0 {
            return Self {
                n_rejected: rejected,
                ..Self::default()
            };
        }

        let (mean_normalized, std_normalized) = if n_norm > 0 {
            let mean = norm_sum / n_norm as f64;
            let var = (norm_sum_sq / n_norm as f64 - mean * mean).max(0.0);
            (mean, var.sqrt())
        } else {
            (0.0, 0.0)
        };

        let stats = Self {
            mean: sum / n as f64,
            rms: (sum_sq / n as f64).sqrt(),
            mean_normalized,
            std_normalized,
            n_used: n,
            n_rejected: rejected,
        };
        debug!(?stats, "Difference statistics");
        stats
    }
}
