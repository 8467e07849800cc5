use approx::assert_abs_diff_eq;
use ndarray::array;

use diffim_core::config::{
    BackgroundConfig, BackgroundModel, KernelConfig, PolynomialConfig, SubtractionConfig,
    VarianceModel,
};
use diffim_core::error::DiffimError;
use diffim_core::image::{mask, Image};
use diffim_core::subtract::ConvolutionTarget;

#[test]
fn default_config_round_trips_through_toml() {
    let config = SubtractionConfig::default();
    let text = toml::to_string_pretty(&config).unwrap();
    let back: SubtractionConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn config_round_trips_through_json() {
    let config = SubtractionConfig {
        kernel: KernelConfig::LinearCombination {
            basis: vec![
                KernelConfig::Delta {
                    width: 3,
                    height: 3,
                },
                KernelConfig::Gaussian {
                    size: 3,
                    sigma: 0.8,
                },
            ],
            spatial: vec![
                PolynomialConfig {
                    order: 0,
                    coefficients: vec![1.0],
                },
                PolynomialConfig {
                    order: 1,
                    coefficients: vec![0.0, 0.01, -0.01],
                },
            ],
        },
        background: BackgroundConfig::Constant { value: 3.5 },
        target: ConvolutionTarget::Science,
        ..SubtractionConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: SubtractionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn minimal_toml_fills_defaults() {
    let text = r#"
        [kernel.Delta]
        width = 5
        height = 3
    "#;
    let config: SubtractionConfig = toml::from_str(text).unwrap();
    assert!(config.invert);
    assert_eq!(config.target, ConvolutionTarget::Template);
    assert_eq!(config.background, BackgroundConfig::None);
    assert_eq!(config.variance, VarianceModel::Zero);
    assert_eq!(
        config.bad_mask().unwrap(),
        mask::EDGE | mask::BAD | mask::SAT | mask::NO_DATA
    );
    assert!(config.options().invert);
}

#[test]
fn unknown_mask_plane_is_reported() {
    let config = SubtractionConfig {
        bad_mask_planes: vec!["BAD".into(), "GHOST".into()],
        ..SubtractionConfig::default()
    };
    match config.bad_mask() {
        Err(DiffimError::UnknownMaskPlane(name)) => assert_eq!(name, "GHOST"),
        other => panic!("expected UnknownMaskPlane, got {other:?}"),
    }
}

#[test]
fn kernel_configs_build() {
    let delta = KernelConfig::Delta {
        width: 5,
        height: 3,
    }
    .build()
    .unwrap();
    assert_eq!((delta.width(), delta.height()), (5, 3));
    assert_abs_diff_eq!(delta.compute_array(0.0, 0.0)[[1, 2]], 1.0);

    let fixed = KernelConfig::Fixed {
        width: 3,
        height: 1,
        values: vec![0.25, 0.5, 0.25],
    }
    .build()
    .unwrap();
    assert_eq!(fixed.compute_array(0.0, 0.0), array![[0.25, 0.5, 0.25]]);

    let lc = KernelConfig::LinearCombination {
        basis: vec![KernelConfig::Delta {
            width: 3,
            height: 3,
        }],
        spatial: vec![PolynomialConfig {
            order: 1,
            coefficients: vec![1.0, 1.0, 0.0],
        }],
    }
    .build()
    .unwrap();
    assert!(lc.is_spatially_varying());
    assert_abs_diff_eq!(lc.sum_at(2.0, 0.0), 3.0);
}

#[test]
fn invalid_kernel_configs_fail() {
    assert!(matches!(
        KernelConfig::Delta {
            width: 4,
            height: 3
        }
        .build(),
        Err(DiffimError::InvalidKernel { .. })
    ));
    assert!(KernelConfig::Fixed {
        width: 3,
        height: 3,
        values: vec![1.0; 4],
    }
    .build()
    .is_err());

    let nested = KernelConfig::LinearCombination {
        basis: vec![KernelConfig::LinearCombination {
            basis: vec![KernelConfig::Delta {
                width: 3,
                height: 3,
            }],
            spatial: vec![PolynomialConfig {
                order: 0,
                coefficients: vec![1.0],
            }],
        }],
        spatial: vec![PolynomialConfig {
            order: 0,
            coefficients: vec![1.0],
        }],
    };
    assert!(matches!(
        nested.build(),
        Err(DiffimError::InvalidParameters(_))
    ));
}

#[test]
fn background_configs_build() {
    let none = BackgroundConfig::None.build().unwrap();
    assert_eq!(none, BackgroundModel::Constant(0.0));

    let poly = BackgroundConfig::Polynomial(PolynomialConfig {
        order: 1,
        coefficients: vec![1.0, 2.0, 3.0],
    })
    .build()
    .unwrap();
    let bg = poly.as_background();
    assert!(!bg.is_constant());
    assert_abs_diff_eq!(bg.evaluate(1.0, 1.0), 6.0);

    assert!(BackgroundConfig::Polynomial(PolynomialConfig {
        order: 1,
        coefficients: vec![1.0],
    })
    .build()
    .is_err());
}

#[test]
fn poisson_variance_model() {
    let image = Image::new(array![[4.0f64, -1.0], [0.0, 10.0]]);
    let model = VarianceModel::Poisson {
        gain: 2.0,
        read_noise: 0.5,
    };
    let var = model.variance_for(&image).unwrap();
    assert_abs_diff_eq!(var[[0, 0]], 2.25);
    assert_abs_diff_eq!(var[[0, 1]], 0.25);
    assert_abs_diff_eq!(var[[1, 1]], 5.25);

    let zero = VarianceModel::Zero.variance_for(&image).unwrap();
    assert!(zero.iter().all(|&v| v == 0.0));

    let bad = VarianceModel::Poisson {
        gain: 0.0,
        read_noise: 1.0,
    };
    assert!(matches!(
        bad.variance_for(&image),
        Err(DiffimError::InvalidParameters(_))
    ));
}

#[test]
fn display_strings() {
    assert_eq!(
        KernelConfig::default().to_string(),
        "Gaussian (11x11, sigma=1.5)"
    );
    assert_eq!(BackgroundConfig::None.to_string(), "None");
    assert_eq!(
        BackgroundConfig::Constant { value: 2.0 }.to_string(),
        "Constant (2)"
    );
    assert_eq!(
        VarianceModel::Poisson {
            gain: 1.5,
            read_noise: 3.0
        }
        .to_string(),
        "Poisson (gain=1.5, read_noise=3)"
    );
    assert_eq!(ConvolutionTarget::Science.to_string(), "Science");
}
