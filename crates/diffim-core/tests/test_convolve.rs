mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use diffim_core::convolve::{convolve_image, convolve_masked};
use diffim_core::error::DiffimError;
use diffim_core::image::{mask, Image};
use diffim_core::kernel::{DeltaFunctionKernel, FixedKernel, GaussianKernel, Kernel};

use common::{flat_masked, in_edge_band, masked_from_fn};

#[test]
fn box_kernel_on_flat_image_preserves_unnormalised_sum() {
    let input = flat_masked::<f32>(6, 6, 2.0, 1.0);
    let kernel = FixedKernel::new(Array2::from_elem((3, 3), 1.0)).unwrap();

    let out = convolve_masked(&input, &kernel).unwrap();

    // Not normalised: nine unit weights.
    assert_abs_diff_eq!(out.image.data[[2, 2]], 18.0, epsilon = 1e-5);
    assert_abs_diff_eq!(out.variance[[2, 2]], 9.0, epsilon = 1e-5);
    assert_eq!(out.bbox(), input.bbox());
}

#[test]
fn edge_band_matches_kernel_half_widths() {
    let input = flat_masked::<f64>(11, 9, 1.0, 0.0);
    let kernel = FixedKernel::new(Array2::from_elem((3, 5), 0.1)).unwrap();

    let out = convolve_masked(&input, &kernel).unwrap();

    for ((row, col), &m) in out.mask.indexed_iter() {
        let expected = in_edge_band(col, row, 11, 9, 5, 3);
        assert_eq!(m & mask::EDGE != 0, expected, "pixel ({col}, {row})");
    }
}

#[test]
fn edge_pixels_use_clamped_neighbours() {
    let input = masked_from_fn::<f64>(5, 5, 0.0, |c, _| c as f64);
    let kernel = FixedKernel::from_vec(3, 1, vec![1.0, 1.0, 1.0]).unwrap();

    let out = convolve_masked(&input, &kernel).unwrap();

    // Column 0 sees columns (0, 0, 1).
    assert_abs_diff_eq!(out.image.data[[2, 0]], 1.0, epsilon = 1e-12);
    assert!(out.image.data.iter().all(|v| v.is_finite()));
}

#[test]
fn mask_bits_spread_over_footprint() {
    let mut input = flat_masked::<f32>(7, 7, 0.0, 0.0);
    input.mask[[3, 3]] = mask::SAT;
    let kernel = GaussianKernel::new(3, 1.0).unwrap();

    let out = convolve_masked(&input, &kernel).unwrap();

    assert_eq!(out.count_masked(mask::SAT), 9);
    assert_ne!(out.mask[[2, 4]] & mask::SAT, 0);
    assert_eq!(out.mask[[1, 3]] & mask::SAT, 0);
}

#[test]
fn origin_is_preserved() {
    let mut input = flat_masked::<f32>(5, 5, 1.0, 0.0);
    input.set_origin(-3, 12);
    let out = convolve_masked(&input, &DeltaFunctionKernel::identity()).unwrap();
    assert_eq!(out.image.x0, -3);
    assert_eq!(out.image.y0, 12);
    assert_eq!(out, input);
}

#[test]
fn plain_image_convolution() {
    let input = Image::from_elem(4, 4, 3.0f64);
    let kernel = FixedKernel::from_vec(1, 3, vec![0.25, 0.5, 0.25]).unwrap();
    let out = convolve_image(&input, &kernel).unwrap();
    assert_abs_diff_eq!(out.data[[0, 0]], 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(out.data[[2, 3]], 3.0, epsilon = 1e-12);
}

#[test]
fn kernel_larger_than_image_is_rejected() {
    let input = flat_masked::<f32>(3, 3, 1.0, 0.0);
    let kernel = GaussianKernel::new(5, 1.0).unwrap();
    let err = convolve_masked(&input, &kernel).unwrap_err();
    assert!(err.is_dimension_mismatch());
}

/// 3x3 stencil with a unit weight at its declared centre.
struct OffsetKernel {
    center: (usize, usize),
}

impl Kernel for OffsetKernel {
    fn width(&self) -> usize {
        3
    }

    fn height(&self) -> usize {
        3
    }

    fn center(&self) -> (usize, usize) {
        self.center
    }

    fn compute(&self, _x: f64, _y: f64, out: &mut Array2<f64>) {
        out.fill(0.0);
        out[[self.center.1, self.center.0]] = 1.0;
    }
}

#[test]
fn declared_centre_aligns_the_footprint() {
    let input = masked_from_fn::<f64>(6, 6, 1.0, |c, r| (r * 10 + c) as f64);
    let kernel = OffsetKernel { center: (0, 0) };

    let out = convolve_masked(&input, &kernel).unwrap();

    // Unit weight on the aligned pixel is the identity.
    assert_abs_diff_eq!(out.image.data[[3, 3]], 33.0);
    assert_eq!(out.image.data, input.image.data);

    // The footprint only reaches two pixels up and to the left.
    for ((row, col), &m) in out.mask.indexed_iter() {
        let expected = col < 2 || row < 2;
        assert_eq!(m & mask::EDGE != 0, expected, "pixel ({col}, {row})");
    }
}

#[test]
fn centre_outside_kernel_is_rejected() {
    let input = flat_masked::<f32>(5, 5, 1.0, 0.0);
    let kernel = OffsetKernel { center: (3, 1) };
    assert!(matches!(kernel.validate(), Err(DiffimError::InvalidKernel { .. })));
    assert!(convolve_masked(&input, &kernel).is_err());
}
