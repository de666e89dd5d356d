//! Integration test: the in-tree Mie kernel against analytical limits and
//! published reference values.

use std::f64::consts::PI;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use holoscatter_core::coordinates::{transform_to_desired_coordinates, CoordinateSystem};
use holoscatter_core::detector::detector_grid;
use holoscatter_core::theory::mie::{amplitude_s1_s2, cross_sections, layered_coefficients, wiscombe_order};
use holoscatter_core::theory::{fields_from_scat_matrs, Mie, ScatteringTheory};
use holoscatter_core::{calc_cross_sections, calc_field, TheoryChoice};
use holoscatter_geometry::{LayeredSphere, Primitive, Scatterer, Sphere};
use num_complex::Complex64;

fn qsca_qext(m: Complex64, x: f64) -> (f64, f64) {
    let coeffs = layered_coefficients(&[m], &[x], wiscombe_order(x));
    // k = 1, so r = x.
    let c = cross_sections(&coeffs, 1.0);
    let area = PI * x * x;
    (c[0] / area, c[2] / area)
}

/// Small spheres scatter as point dipoles:
/// $Q_{sca} = \tfrac{8}{3} x^4 \left|\tfrac{m^2-1}{m^2+2}\right|^2$.
#[test]
fn test_rayleigh_limit() {
    let m = Complex64::new(1.5, 0.0);
    let x = 0.01;
    let (qsca, _) = qsca_qext(m, x);
    let lorentz = (m * m - 1.0) / (m * m + 2.0);
    let rayleigh = 8.0 / 3.0 * x.powi(4) * lorentz.norm_sqr();
    assert_relative_eq!(qsca, rayleigh, max_relative = 0.01);
}

/// Bohren & Huffman, Appendix A sample output: x = 5.213, m = 1.55.
#[test]
fn test_bohren_huffman_reference() {
    let radius = 0.525;
    let wavelength = 0.6328;
    let x = 2.0 * PI * radius / wavelength;
    let (qsca, qext) = qsca_qext(Complex64::new(1.55, 0.0), x);
    assert_relative_eq!(qsca, 3.10543, max_relative = 1e-4);
    assert_relative_eq!(qext, 3.10543, max_relative = 1e-4);

    let coeffs = layered_coefficients(&[Complex64::new(1.55, 0.0)], &[x], wiscombe_order(x));
    let (s1_back, _) = amplitude_s1_s2(&coeffs, PI);
    let qback = 4.0 * s1_back.norm_sqr() / (x * x);
    assert_relative_eq!(qback, 2.92534, max_relative = 1e-3);
}

#[test]
fn test_optical_theorem() {
    let m = Complex64::new(1.5, 0.1);
    let x = 3.0;
    let coeffs = layered_coefficients(&[m], &[x], wiscombe_order(x));
    let c = cross_sections(&coeffs, 1.0);
    let (s1, s2) = amplitude_s1_s2(&coeffs, 0.0);
    assert_relative_eq!(s1.re, s2.re, max_relative = 1e-12);
    assert_relative_eq!(c[2], 4.0 * PI * s1.re, max_relative = 1e-10);
    // Absorbing spheres absorb.
    assert!(c[1] > 0.0);
}

#[test]
fn test_cross_sections_through_public_api() {
    let sphere: Scatterer = Sphere::new(1.55, 0.525, [0.0; 3]).into();
    let cs = calc_cross_sections(
        &sphere,
        Some(1.0),
        Some(0.6328),
        Some([1.0, 0.0].into()),
        &TheoryChoice::Auto,
    )
    .unwrap();
    let area = PI * 0.525 * 0.525;
    let values = cs.values();
    assert_relative_eq!(values[[0]] / area, 3.10543, max_relative = 1e-4);
    assert_relative_eq!(values[[2]], values[[0]] + values[[1]], max_relative = 1e-12);
    assert!(values[[3]] > 0.0 && values[[3]] < 1.0);
}

#[test]
fn test_identical_layers_match_homogeneous_sphere() {
    let center = [1.0, 1.0, 10.0];
    let layered: Scatterer = Primitive::LayeredSphere(
        LayeredSphere::new(vec![1.59.into(), 1.59.into()], vec![0.3, 0.2], Some(center)).unwrap(),
    )
    .into();
    let homogeneous: Scatterer = Sphere::new(1.59, 0.5, center).into();

    let cs = |s: &Scatterer| {
        calc_cross_sections(s, Some(1.33), Some(0.66), Some([1.0, 0.0].into()), &TheoryChoice::Auto)
            .unwrap()
    };
    let (layered_cs, homogeneous_cs) = (cs(&layered), cs(&homogeneous));
    // Absorption of a lossless sphere is rounding noise, so compare on the
    // scale of extinction.
    let ext = homogeneous_cs.values()[[2]];
    for (a, b) in layered_cs.values().iter().zip(homogeneous_cs.values()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-9 * ext);
    }
    assert_relative_eq!(layered_cs.values()[[3]], homogeneous_cs.values()[[3]], max_relative = 1e-9);

    let detector = detector_grid([5, 5], 0.5).unwrap();
    let field = |s: &Scatterer| {
        calc_field(
            &detector,
            s,
            Some(1.33),
            Some(0.66.into()),
            Some([1.0, 0.0].into()),
            &TheoryChoice::Auto,
        )
        .unwrap()
    };
    for (a, b) in field(&layered).values().iter().zip(field(&homogeneous).values()) {
        assert!((a - b).norm() <= 1e-9 * b.norm().max(1e-12));
    }
}

#[test]
fn test_coated_sphere_differs_from_core() {
    let coated: Scatterer = Primitive::LayeredSphere(
        LayeredSphere::new(vec![1.59.into(), 1.33.into()], vec![0.4, 0.1], Some([0.0; 3])).unwrap(),
    )
    .into();
    let core: Scatterer = Sphere::new(1.59, 0.4, [0.0; 3]).into();
    let cs = |s: &Scatterer| {
        calc_cross_sections(s, Some(1.33), Some(0.66), Some([1.0, 0.0].into()), &TheoryChoice::Auto)
            .unwrap()
            .values()[[0]]
    };
    // An index-matched shell is invisible.
    assert_relative_eq!(cs(&coated), cs(&core), max_relative = 1e-9);
}

/// The direct field kernel and the derivation from scattering matrices agree.
#[test]
fn test_direct_fields_match_matrix_fallback() {
    let mie = Mie::new();
    let center = [1.0, 1.0, 5.0];
    let sphere: Scatterer = Sphere::new(1.6, 0.5, center).into();
    let k = 2.0 * PI * 1.33 / 0.66;
    let detector = detector_grid([20, 20], 0.1).unwrap();
    let positions =
        transform_to_desired_coordinates(&detector, center, k, CoordinateSystem::Spherical).unwrap();

    for polarization in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.6, 0.8, 0.0]] {
        let direct = mie.raw_fields(&positions, &sphere, k, 1.33, polarization).unwrap();
        let derived =
            fields_from_scat_matrs(&mie, &positions, &sphere, k, 1.33, polarization).unwrap();
        assert_eq!(direct.shape(), &[3, 400]);
        for (a, b) in direct.iter().zip(derived.iter()) {
            assert!((a - b).norm() < 1e-12 * (1.0 + b.norm()));
        }
    }
}
