//! Far-field fields from amplitude scattering matrices.
//!
//! For an incident polarization $(p_x, p_y)$ the components parallel and
//! perpendicular to the scattering plane at azimuth $\phi$ are
//!
//! $$ E_{\parallel i} = p_x\cos\phi + p_y\sin\phi, \qquad
//!    E_{\perp i} = p_x\sin\phi - p_y\cos\phi $$
//!
//! and the scattered field is
//!
//! $$ \begin{pmatrix} E_{\parallel s} \\ E_{\perp s} \end{pmatrix} =
//!    \frac{e^{ikr}}{-ikr}
//!    \begin{pmatrix} S_2 & S_3 \\ S_4 & S_1 \end{pmatrix}
//!    \begin{pmatrix} E_{\parallel i} \\ E_{\perp i} \end{pmatrix} $$
//!
//! with $E_\theta = E_{\parallel s}$ and $E_\phi = -E_{\perp s}$
//! (Bohren & Huffman §3.4).

use ndarray::{Array2, Array3, Axis};
use num_complex::Complex64;

use crate::coordinates::{CoordinateSystem, Positions};
use crate::error::ScatteringError;

/// Radial factor `exp(ikr) / (-ikr)`, or its angular part `i` at infinity.
pub fn radial_prefactor(kr: f64) -> Complex64 {
    let i = Complex64::i();
    if kr.is_finite() {
        i * Complex64::from_polar(1.0, kr) / kr
    } else {
        i
    }
}

/// Spherical components `(E_θ, E_φ)` of the scattered far field.
///
/// `matrix` is `[S2, S3, S4, S1]` in row-major order.
pub fn calc_scat_field_at(
    kr: f64,
    phi: f64,
    matrix: [Complex64; 4],
    polarization: [f64; 2],
) -> [Complex64; 2] {
    let [s2, s3, s4, s1] = matrix;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let e_par_i = polarization[0] * cos_phi + polarization[1] * sin_phi;
    let e_perp_i = polarization[0] * sin_phi - polarization[1] * cos_phi;

    let prefactor = radial_prefactor(kr);
    let e_par_s = prefactor * (s2 * e_par_i + s3 * e_perp_i);
    let e_perp_s = prefactor * (s4 * e_par_i + s1 * e_perp_i);
    [e_par_s, -e_perp_s]
}

/// Rotate `(E_θ, E_φ)` into Cartesian components in the detector frame.
///
/// Theory coordinates have z reversed relative to the detector, so the z
/// component changes sign on the way back.
pub fn fields_to_cart(field: [Complex64; 2], theta: f64, phi: f64) -> [Complex64; 3] {
    let [e_theta, e_phi] = field;
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    [
        e_theta * (cos_t * cos_p) - e_phi * sin_p,
        e_theta * (cos_t * sin_p) + e_phi * cos_p,
        e_theta * sin_t,
    ]
}

/// Cartesian far field at one point from its scattering matrix.
pub fn field_at(
    kr: f64,
    theta: f64,
    phi: f64,
    matrix: [Complex64; 4],
    polarization: [f64; 3],
) -> [Complex64; 3] {
    let spherical = calc_scat_field_at(kr, phi, matrix, [polarization[0], polarization[1]]);
    fields_to_cart(spherical, theta, phi)
}

/// Fields `(3, N)` for spherical `positions` and matrices `(N, 2, 2)`.
pub fn calc_scat_field(
    positions: &Positions,
    matrices: &Array3<Complex64>,
    polarization: [f64; 3],
) -> Result<Array2<Complex64>, ScatteringError> {
    if positions.system != CoordinateSystem::Spherical {
        return Err(ScatteringError::InvalidParameter(
            "scattering matrices can only be applied at spherical positions".into(),
        ));
    }
    let n = positions.len();
    if matrices.shape() != [n, 2, 2] {
        return Err(ScatteringError::ShapeMismatch(format!(
            "expected {n} 2x2 scattering matrices, got shape {:?}",
            matrices.shape()
        )));
    }

    let mut fields = Array2::zeros((3, n));
    for (i, (point, m)) in positions
        .values
        .columns()
        .into_iter()
        .zip(matrices.axis_iter(Axis(0)))
        .enumerate()
    {
        let matrix = [m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]];
        let e = field_at(point[0], point[1], point[2], matrix, polarization);
        for (c, value) in e.into_iter().enumerate() {
            fields[[c, i]] = value;
        }
    }
    Ok(fields)
}
