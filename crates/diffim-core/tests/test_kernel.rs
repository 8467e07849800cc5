use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use diffim_core::error::DiffimError;
use diffim_core::kernel::{
    validate_dimensions, DeltaFunctionKernel, FixedKernel, GaussianKernel, Kernel,
    LinearCombinationKernel,
};
use diffim_core::math::function::{Function2, PolynomialFunction2};

#[test]
fn even_and_empty_dimensions_are_invalid() {
    assert!(matches!(
        validate_dimensions(4, 4),
        Err(DiffimError::InvalidKernel { width: 4, height: 4, .. })
    ));
    assert!(validate_dimensions(3, 4).is_err());
    assert!(validate_dimensions(0, 3).is_err());
    assert!(validate_dimensions(1, 1).is_ok());
    assert!(validate_dimensions(5, 3).is_ok());
}

#[test]
fn fixed_kernel_rejects_even_array() {
    let err = FixedKernel::new(Array2::from_elem((4, 4), 1.0)).unwrap_err();
    assert!(matches!(err, DiffimError::InvalidKernel { .. }));
}

#[test]
fn fixed_kernel_from_vec_checks_length() {
    assert!(FixedKernel::from_vec(3, 3, vec![0.0; 8]).is_err());
    let k = FixedKernel::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
    assert_eq!(k.width(), 3);
    assert_eq!(k.height(), 1);
    assert_eq!(k.center(), (1, 0));
    assert_abs_diff_eq!(k.sum(), 6.0);
}

#[test]
fn delta_kernel_places_single_unit_coefficient() {
    let k = DeltaFunctionKernel::new(5, 3, (4, 0)).unwrap();
    let arr = k.compute_array(10.0, 20.0);
    assert_eq!(arr.dim(), (3, 5));
    assert_abs_diff_eq!(arr.sum(), 1.0);
    assert_abs_diff_eq!(arr[[0, 4]], 1.0);
    assert_abs_diff_eq!(k.sum_at(0.0, 0.0), 1.0);
}

#[test]
fn delta_kernel_outside_stencil_is_invalid() {
    assert!(DeltaFunctionKernel::new(3, 3, (3, 0)).is_err());
    assert!(DeltaFunctionKernel::centered(2, 3).is_err());
}

#[test]
fn identity_is_one_by_one() {
    let k = DeltaFunctionKernel::identity();
    assert_eq!((k.width(), k.height()), (1, 1));
    assert_eq!(k.compute_array(0.0, 0.0), array![[1.0]]);
}

#[test]
fn gaussian_kernel_is_normalised_and_symmetric() {
    let k = GaussianKernel::new(7, 1.2).unwrap();
    let arr = k.compute_array(0.0, 0.0);
    assert_abs_diff_eq!(arr.sum(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(arr[[0, 3]], arr[[6, 3]], epsilon = 1e-15);
    assert_abs_diff_eq!(arr[[3, 0]], arr[[3, 6]], epsilon = 1e-15);
    let peak = arr.iter().cloned().fold(f64::MIN, f64::max);
    assert_abs_diff_eq!(arr[[3, 3]], peak);
    assert!(!k.is_spatially_varying());
}

#[test]
fn gaussian_kernel_rejects_bad_sigma() {
    assert!(matches!(
        GaussianKernel::new(5, 0.0),
        Err(DiffimError::InvalidParameters(_))
    ));
    assert!(GaussianKernel::new(5, f64::NAN).is_err());
    assert!(GaussianKernel::new(6, 1.0).is_err());
}

fn two_basis() -> Vec<FixedKernel> {
    vec![
        FixedKernel::new(array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]).unwrap(),
        FixedKernel::new(array![[0.0, 1.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]).unwrap(),
    ]
}

#[test]
fn linear_combination_varies_with_position() {
    let spatial: Vec<Box<dyn Function2>> = vec![
        Box::new(PolynomialFunction2::constant(1.0)),
        Box::new(PolynomialFunction2::new(1, vec![0.0, 0.25, 0.0]).unwrap()),
    ];
    let k = LinearCombinationKernel::new(two_basis(), spatial).unwrap();
    assert!(k.is_spatially_varying());
    assert_eq!(k.n_basis(), 2);

    let at_origin = k.compute_array(0.0, 0.0);
    assert_abs_diff_eq!(at_origin.sum(), 1.0);

    let at_four = k.compute_array(4.0, 100.0);
    assert_abs_diff_eq!(at_four[[1, 1]], 1.0);
    assert_abs_diff_eq!(at_four[[0, 1]], 1.0);
    assert_abs_diff_eq!(k.sum_at(4.0, 0.0), 5.0);
    assert_eq!(k.weights_at(8.0, 0.0), vec![1.0, 2.0]);
}

#[test]
fn linear_combination_with_weights_is_constant() {
    let k = LinearCombinationKernel::with_weights(two_basis(), &[0.5, 0.125]).unwrap();
    let a = k.compute_array(0.0, 0.0);
    let b = k.compute_array(50.0, -20.0);
    assert_eq!(a, b);
    assert_abs_diff_eq!(a.sum(), 1.0);
}

#[test]
fn linear_combination_validates_inputs() {
    assert!(LinearCombinationKernel::with_weights(vec![], &[]).is_err());
    assert!(LinearCombinationKernel::with_weights(two_basis(), &[1.0]).is_err());

    let mixed = vec![
        FixedKernel::new(Array2::from_elem((3, 3), 1.0)).unwrap(),
        FixedKernel::new(Array2::from_elem((5, 5), 1.0)).unwrap(),
    ];
    assert!(matches!(
        LinearCombinationKernel::with_weights(mixed, &[1.0, 1.0]),
        Err(DiffimError::InvalidParameters(_))
    ));
}

#[test]
fn fixed_kernel_snapshot_of_varying_kernel() {
    let k = LinearCombinationKernel::with_weights(two_basis(), &[2.0, 0.0]).unwrap();
    let snap = FixedKernel::from_kernel(&k, 0.0, 0.0).unwrap();
    assert_abs_diff_eq!(snap.coefficients()[[1, 1]], 2.0);
    assert_abs_diff_eq!(snap.sum(), 2.0);
}
