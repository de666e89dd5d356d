//! Lorenz-Mie theory for homogeneous and multilayer spheres.
//!
//! The external field of a sphere is expanded in vector spherical harmonics
//! with coefficients $a_n$, $b_n$. For a homogeneous sphere of relative index
//! $m$ and size parameter $x = k r$,
//!
//! $$
//! a_n = \frac{[D_n(mx)/m + n/x]\,\psi_n(x) - \psi_{n-1}(x)}
//!            {[D_n(mx)/m + n/x]\,\xi_n(x) - \xi_{n-1}(x)}, \qquad
//! b_n = \frac{[m D_n(mx) + n/x]\,\psi_n(x) - \psi_{n-1}(x)}
//!            {[m D_n(mx) + n/x]\,\xi_n(x) - \xi_{n-1}(x)}
//! $$
//!
//! where $\psi_n$, $\xi_n$ are Riccati-Bessel functions and
//! $D_n = \psi_n'/\psi_n$ is computed by downward recurrence. Multilayer
//! spheres replace $D_n(mx)$ by the effective log-derivatives of Yang's
//! recursive algorithm.
//!
//! # References
//! - Bohren & Huffman, *Absorption and Scattering of Light by Small Particles* (1983).
//! - W. Yang, "Improved recursive algorithm for light scattering by a
//!   multilayered sphere", *Appl. Opt.* **42**, 1710 (2003).

use std::f64::consts::PI;

use holoscatter_geometry::{Primitive, Scatterer};
use ndarray::{Array2, Array3};
use num_complex::Complex64;

use super::angular;
use super::{RawKernels, ScatteringTheory, TheoryKind};
use crate::coordinates::{CoordinateSystem, Positions};
use crate::error::ScatteringError;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Mie scattering from spheres and concentric layered spheres.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mie {
    /// Truncation order of the multipole series; the Wiscombe criterion
    /// is used when unset.
    pub max_order: Option<usize>,
}

/// Multipole coefficients; index `n - 1` holds order `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct MieCoefficients {
    pub a: Vec<Complex64>,
    pub b: Vec<Complex64>,
}

impl MieCoefficients {
    pub fn order(&self) -> usize {
        self.a.len()
    }
}

impl Mie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_order(max_order: usize) -> Self {
        Self {
            max_order: Some(max_order),
        }
    }

    /// Coefficients for `scatterer` in a medium of index `medium_index`.
    pub fn coefficients(
        &self,
        scatterer: &Scatterer,
        medium_wavevec: f64,
        medium_index: f64,
    ) -> Result<MieCoefficients, ScatteringError> {
        let (indices, radii) = match scatterer {
            Scatterer::Primitive(Primitive::Sphere(s)) => (vec![s.n.value()?], vec![s.r]),
            Scatterer::Primitive(Primitive::LayeredSphere(s)) => (
                s.n.iter().map(|n| n.value()).collect::<Result<Vec<_>, _>>()?,
                s.radii(),
            ),
            other => {
                return Err(ScatteringError::TheoryNotCompatible {
                    theory: self.name().to_string(),
                    scatterer: other.to_string(),
                })
            }
        };
        let m: Vec<Complex64> = indices.iter().map(|n| n / medium_index).collect();
        let x: Vec<f64> = radii.iter().map(|r| r * medium_wavevec).collect();
        let x_outer = x.last().copied().unwrap_or(0.0);
        if !(x_outer > 0.0) {
            return Err(ScatteringError::InvalidParameter(format!(
                "sphere size parameter must be positive, got {x_outer}"
            )));
        }
        let nstop = self.max_order.unwrap_or_else(|| wiscombe_order(x_outer)).max(1);
        Ok(layered_coefficients(&m, &x, nstop))
    }
}

/// Series truncation `x + 4 x^{1/3} + 2`.
pub fn wiscombe_order(x: f64) -> usize {
    (x + 4.0 * x.cbrt() + 2.0).floor() as usize
}

/// Riccati-Bessel $\psi_n(x)$ and $\xi_n(x)$ for real `x`, orders `0..=nmax`.
fn riccati_bessel(x: f64, nmax: usize) -> (Vec<f64>, Vec<Complex64>) {
    let mut psi = Vec::with_capacity(nmax + 1);
    let mut chi = Vec::with_capacity(nmax + 1);
    let (mut psi_prev, mut chi_prev) = (x.cos(), -x.sin());
    psi.push(x.sin());
    chi.push(x.cos());
    for n in 1..=nmax {
        let f = (2 * n - 1) as f64 / x;
        let psi_n = f * psi[n - 1] - psi_prev;
        let chi_n = f * chi[n - 1] - chi_prev;
        psi_prev = psi[n - 1];
        chi_prev = chi[n - 1];
        psi.push(psi_n);
        chi.push(chi_n);
    }
    let xi = psi
        .iter()
        .zip(&chi)
        .map(|(&p, &c)| Complex64::new(p, -c))
        .collect();
    (psi, xi)
}

/// $D_n(z) = \psi_n'(z)/\psi_n(z)$ for orders `0..=nmax`, by downward recurrence.
fn log_derivative(z: Complex64, nmax: usize) -> Vec<Complex64> {
    let start = nmax.max(z.norm().ceil() as usize) + 16;
    let mut d = vec![ZERO; start + 1];
    for n in (1..=start).rev() {
        let nz = n as f64 / z;
        d[n - 1] = nz - 1.0 / (d[n] + nz);
    }
    d.truncate(nmax + 1);
    d
}

/// $\xi_n'/\xi_n$ and the ratio $\psi_n/\xi_n$ at `z`, given $D_n(z)$.
fn xi_log_derivative_and_ratio(z: Complex64, d1: &[Complex64]) -> (Vec<Complex64>, Vec<Complex64>) {
    let i = Complex64::i();
    let mut d3 = vec![i; d1.len()];
    let mut ratio = vec![0.5 * (1.0 - (-2.0 * i * z).exp()); d1.len()];
    let mut psi_xi = 0.5 * (1.0 - (2.0 * i * z).exp());
    for n in 1..d1.len() {
        let nz = n as f64 / z;
        psi_xi *= (nz - d1[n - 1]) * (nz - d3[n - 1]);
        d3[n] = d1[n] + i / psi_xi;
        ratio[n] = ratio[n - 1] * (nz - d1[n - 1]) / (nz - d3[n - 1]);
    }
    (d3, ratio)
}

/// Coefficients of a concentric sphere, innermost layer first.
///
/// `m` are relative indices and `x` the outer size parameter of each layer.
/// A single layer is a homogeneous sphere.
pub fn layered_coefficients(m: &[Complex64], x: &[f64], nstop: usize) -> MieCoefficients {
    let mut ha = log_derivative(m[0] * x[0], nstop);
    let mut hb = ha.clone();

    for l in 1..m.len().min(x.len()) {
        let z_in = m[l] * x[l - 1];
        let z_out = m[l] * x[l];
        let d1_in = log_derivative(z_in, nstop);
        let d1_out = log_derivative(z_out, nstop);
        let (d3_in, ratio_in) = xi_log_derivative_and_ratio(z_in, &d1_in);
        let (d3_out, ratio_out) = xi_log_derivative_and_ratio(z_out, &d1_out);

        for n in 1..=nstop {
            let q = ratio_in[n] / ratio_out[n];

            let g1 = m[l] * ha[n] - m[l - 1] * d1_in[n];
            let g2 = m[l] * ha[n] - m[l - 1] * d3_in[n];
            ha[n] = (g2 * d1_out[n] - q * g1 * d3_out[n]) / (g2 - q * g1);

            let g1 = m[l - 1] * hb[n] - m[l] * d1_in[n];
            let g2 = m[l - 1] * hb[n] - m[l] * d3_in[n];
            hb[n] = (g2 * d1_out[n] - q * g1 * d3_out[n]) / (g2 - q * g1);
        }
    }

    let last = m.len().min(x.len()) - 1;
    let (m_l, x_l) = (m[last], x[last]);
    let (psi, xi) = riccati_bessel(x_l, nstop);
    let mut a = Vec::with_capacity(nstop);
    let mut b = Vec::with_capacity(nstop);
    for n in 1..=nstop {
        let nx = n as f64 / x_l;
        let da = ha[n] / m_l + nx;
        let db = m_l * hb[n] + nx;
        a.push((da * psi[n] - psi[n - 1]) / (da * xi[n] - xi[n - 1]));
        b.push((db * psi[n] - psi[n - 1]) / (db * xi[n] - xi[n - 1]));
    }
    MieCoefficients { a, b }
}

/// Amplitude scattering matrix elements `(S1, S2)` at polar angle `theta`.
pub fn amplitude_s1_s2(coeffs: &MieCoefficients, theta: f64) -> (Complex64, Complex64) {
    let mu = theta.cos();
    let (mut pi_prev, mut pi) = (0.0, 1.0);
    let (mut s1, mut s2) = (ZERO, ZERO);
    for (idx, (a, b)) in coeffs.a.iter().zip(&coeffs.b).enumerate() {
        let n = (idx + 1) as f64;
        let tau = n * mu * pi - (n + 1.0) * pi_prev;
        let f = (2.0 * n + 1.0) / (n * (n + 1.0));
        s1 += f * (a * pi + b * tau);
        s2 += f * (a * tau + b * pi);
        let pi_next = ((2.0 * n + 1.0) * mu * pi - (n + 1.0) * pi_prev) / n;
        pi_prev = pi;
        pi = pi_next;
    }
    (s1, s2)
}

/// `[scattering, absorption, extinction, asymmetry]` from the coefficients.
pub fn cross_sections(coeffs: &MieCoefficients, medium_wavevec: f64) -> [f64; 4] {
    let k2 = medium_wavevec * medium_wavevec;
    let (a, b) = (&coeffs.a, &coeffs.b);
    let mut sca = 0.0;
    let mut ext = 0.0;
    let mut g_sum = 0.0;
    for i in 0..coeffs.order() {
        let n = (i + 1) as f64;
        sca += (2.0 * n + 1.0) * (a[i].norm_sqr() + b[i].norm_sqr());
        ext += (2.0 * n + 1.0) * (a[i] + b[i]).re;
        g_sum += (2.0 * n + 1.0) / (n * (n + 1.0)) * (a[i] * b[i].conj()).re;
        if i + 1 < coeffs.order() {
            g_sum += n * (n + 2.0) / (n + 1.0)
                * (a[i] * a[i + 1].conj() + b[i] * b[i + 1].conj()).re;
        }
    }
    let c_sca = 2.0 * PI / k2 * sca;
    let c_ext = 2.0 * PI / k2 * ext;
    let asymmetry = if c_sca > 0.0 {
        4.0 * PI / k2 * g_sum / c_sca
    } else {
        0.0
    };
    [c_sca, c_ext - c_sca, c_ext, asymmetry]
}

impl ScatteringTheory for Mie {
    fn kind(&self) -> TheoryKind {
        TheoryKind::Mie
    }

    fn can_handle(&self, scatterer: &Scatterer) -> bool {
        matches!(
            scatterer,
            Scatterer::Primitive(Primitive::Sphere(_) | Primitive::LayeredSphere(_))
        )
    }

    fn kernels(&self) -> RawKernels {
        RawKernels {
            fields: true,
            scat_matrs: true,
            cross_sections: true,
        }
    }

    fn raw_fields(
        &self,
        positions: &Positions,
        scatterer: &Scatterer,
        medium_wavevec: f64,
        medium_index: f64,
        illum_polarization: [f64; 3],
    ) -> Result<Array2<Complex64>, ScatteringError> {
        let coeffs = self.coefficients(scatterer, medium_wavevec, medium_index)?;
        let spherical = positions.to_system(CoordinateSystem::Spherical);
        let mut fields = Array2::zeros((3, spherical.len()));
        for (i, point) in spherical.values.columns().into_iter().enumerate() {
            let (kr, theta, phi) = (point[0], point[1], point[2]);
            let (s1, s2) = amplitude_s1_s2(&coeffs, theta);
            let e = angular::field_at(kr, theta, phi, [s2, ZERO, ZERO, s1], illum_polarization);
            for (c, value) in e.into_iter().enumerate() {
                fields[[c, i]] = value;
            }
        }
        Ok(fields)
    }

    fn raw_scat_matrs(
        &self,
        scatterer: &Scatterer,
        positions: &Positions,
        medium_wavevec: f64,
        medium_index: f64,
    ) -> Result<Array3<Complex64>, ScatteringError> {
        let coeffs = self.coefficients(scatterer, medium_wavevec, medium_index)?;
        let spherical = positions.to_system(CoordinateSystem::Spherical);
        let mut matrices = Array3::zeros((spherical.len(), 2, 2));
        for (i, &theta) in spherical.component(1).iter().enumerate() {
            let (s1, s2) = amplitude_s1_s2(&coeffs, theta);
            matrices[[i, 0, 0]] = s2;
            matrices[[i, 1, 1]] = s1;
        }
        Ok(matrices)
    }

    fn raw_cross_sections(
        &self,
        scatterer: &Scatterer,
        medium_wavevec: f64,
        medium_index: f64,
        _illum_polarization: [f64; 3],
    ) -> Result<[f64; 4], ScatteringError> {
        let coeffs = self.coefficients(scatterer, medium_wavevec, medium_index)?;
        Ok(cross_sections(&coeffs, medium_wavevec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn homogeneous(m: f64, x: f64) -> MieCoefficients {
        layered_coefficients(&[Complex64::new(m, 0.0)], &[x], wiscombe_order(x))
    }

    #[test]
    fn test_riccati_bessel_low_orders() {
        let x = 1.3;
        let (psi, xi) = riccati_bessel(x, 2);
        assert_relative_eq!(psi[1], x.sin() / x - x.cos(), epsilon = 1e-12);
        // chi_1 = cos(x)/x + sin(x)
        assert_relative_eq!(-xi[1].im, x.cos() / x + x.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_log_derivative_of_real_argument() {
        let z = Complex64::new(2.0, 0.0);
        let d = log_derivative(z, 3);
        // D_0 = cot z
        assert_relative_eq!(d[0].re, 1.0 / 2.0_f64.tan(), epsilon = 1e-10);
        assert!(d[0].im.abs() < 1e-12);
    }

    #[test]
    fn test_nonabsorbing_sphere_does_not_absorb() {
        let c = cross_sections(&homogeneous(1.5, 3.0), 1.0);
        assert!(c[1].abs() < 1e-10 * c[2]);
        assert!(c[3] > 0.0 && c[3] < 1.0);
    }

    #[test]
    fn test_forward_amplitudes_are_equal() {
        let coeffs = homogeneous(1.2, 4.0);
        let (s1, s2) = amplitude_s1_s2(&coeffs, 0.0);
        assert_relative_eq!(s1.re, s2.re, epsilon = 1e-12);
        assert_relative_eq!(s1.im, s2.im, epsilon = 1e-12);
    }

    #[test]
    fn test_max_order_override() {
        let s: Scatterer = holoscatter_geometry::Sphere::new(1.59, 0.5, [0.0; 3]).into();
        let coeffs = Mie::with_max_order(3).coefficients(&s, 10.0, 1.33).unwrap();
        assert_eq!(coeffs.order(), 3);
    }

    #[test]
    fn test_can_handle_spheres_only() {
        let mie = Mie::new();
        let s: Scatterer = holoscatter_geometry::Sphere::new(1.59, 0.5, [0.0; 3]).into();
        assert!(mie.can_handle(&s));
        assert!(!mie.can_handle(&Scatterer::spheres(vec![
            holoscatter_geometry::Sphere::new(1.59, 0.5, [0.0; 3])
        ])));
    }
}
