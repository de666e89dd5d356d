//! Coordinate transformation from detector geometry to theory positions.
//!
//! Theories see detector points as dimensionless positions relative to the
//! scatterer: lengths are multiplied by the wavevector $k$ and the z axis is
//! inverted so that it points against the direction of propagation,
//!
//! $$ (x', y', z') = k\,(x - c_x,\; y - c_y,\; c_z - z). $$
//!
//! Positions are stored as a `(3, N)` array, one column per point, in either
//! Cartesian `(x, y, z)` or spherical `(r, θ, φ)` form.

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView1, Axis};

use crate::detector::{flat, DetectorView};
use crate::error::ScatteringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    Cartesian,
    #[default]
    Spherical,
}

/// Dimensionless point positions, one column per point.
#[derive(Debug, Clone, PartialEq)]
pub struct Positions {
    pub system: CoordinateSystem,
    pub values: Array2<f64>,
}

impl Positions {
    pub fn new(system: CoordinateSystem, values: Array2<f64>) -> Result<Self, ScatteringError> {
        if values.nrows() != 3 {
            return Err(ScatteringError::ShapeMismatch(format!(
                "positions need 3 rows, got {}",
                values.nrows()
            )));
        }
        Ok(Self { system, values })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One row of the position array (`0` = x or r, and so on).
    pub fn component(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(0), i)
    }

    /// Re-express these positions in `system`.
    pub fn to_system(&self, system: CoordinateSystem) -> Positions {
        let convert = find_transformation_function(self.system, system);
        Positions {
            system,
            values: convert(&self.values),
        }
    }
}

/// A conversion between coordinate systems acting on `(3, N)` arrays.
pub type Conversion = fn(&Array2<f64>) -> Array2<f64>;

/// Look up the conversion routine between two coordinate systems.
pub fn find_transformation_function(from: CoordinateSystem, to: CoordinateSystem) -> Conversion {
    match (from, to) {
        (CoordinateSystem::Cartesian, CoordinateSystem::Spherical) => cartesian_to_spherical,
        (CoordinateSystem::Spherical, CoordinateSystem::Cartesian) => spherical_to_cartesian,
        _ => Array2::clone,
    }
}

/// `(x, y, z)` columns to `(r, θ, φ)` with `φ` in `[0, 2π)`.
pub fn cartesian_to_spherical(xyz: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(xyz.raw_dim());
    for (src, mut dst) in xyz.columns().into_iter().zip(out.columns_mut()) {
        let (x, y, z) = (src[0], src[1], src[2]);
        let rho = x.hypot(y);
        dst[0] = rho.hypot(z);
        dst[1] = rho.atan2(z);
        dst[2] = y.atan2(x).rem_euclid(2.0 * PI);
    }
    out
}

/// `(r, θ, φ)` columns to `(x, y, z)`.
pub fn spherical_to_cartesian(rtp: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(rtp.raw_dim());
    for (src, mut dst) in rtp.columns().into_iter().zip(out.columns_mut()) {
        let (r, theta, phi) = (src[0], src[1], src[2]);
        dst[0] = r * theta.sin() * phi.cos();
        dst[1] = r * theta.sin() * phi.sin();
        dst[2] = r * theta.cos();
    }
    out
}

/// Positions of the detector points as seen by a theory.
///
/// Detectors carrying `theta` and `phi` coordinates are spherical: the first
/// component is `r·k`, or `+∞` (far field) when there is no `r`. Any other
/// detector is flattened and must carry `x`, `y` and `z`.
pub fn transform_to_desired_coordinates(
    detector: &DetectorView,
    origin: [f64; 3],
    wavevec: f64,
    desired: CoordinateSystem,
) -> Result<Positions, ScatteringError> {
    let view = flat(detector);
    let positions = if view.has_coord("theta") && view.has_coord("phi") {
        let theta = required(&view, "theta")?;
        let phi = required(&view, "phi")?;
        let n = theta.len();
        let mut values = Array2::zeros((3, n));
        match view.float_coord("r") {
            Some(r) => values.row_mut(0).assign(&(r * wavevec)),
            None => values.row_mut(0).fill(f64::INFINITY),
        }
        values.row_mut(1).assign(theta);
        values.row_mut(2).assign(phi);
        Positions::new(CoordinateSystem::Spherical, values)?
    } else {
        let x = required(&view, "x")?;
        let y = required(&view, "y")?;
        let z = required(&view, "z")?;
        let mut values = Array2::zeros((3, x.len()));
        values.row_mut(0).assign(&x.mapv(|x| wavevec * (x - origin[0])));
        values.row_mut(1).assign(&y.mapv(|y| wavevec * (y - origin[1])));
        values.row_mut(2).assign(&z.mapv(|z| wavevec * (origin[2] - z)));
        Positions::new(CoordinateSystem::Cartesian, values)?
    };
    Ok(positions.to_system(desired))
}

fn required<'a>(
    view: &'a DetectorView,
    name: &str,
) -> Result<&'a ndarray::Array1<f64>, ScatteringError> {
    view.float_coord(name).ok_or_else(|| {
        ScatteringError::InvalidDetector(format!(
            "detector has neither spherical nor Cartesian coordinates (missing '{name}')"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{detector_grid, detector_points, detector_points_spherical};
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_cartesian_positions_are_scaled_and_z_inverted() {
        let d = detector_points(vec![1.0], vec![2.0], vec![0.0]).unwrap();
        let p = transform_to_desired_coordinates(&d, [0.5, 0.5, 4.0], 2.0, CoordinateSystem::Cartesian)
            .unwrap();
        assert_eq!(p.system, CoordinateSystem::Cartesian);
        assert_abs_diff_eq!(p.values[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.values[[1, 0]], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.values[[2, 0]], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_is_flattened_first() {
        let d = detector_grid([3, 2], 1.0).unwrap();
        let p = transform_to_desired_coordinates(&d, [0.0; 3], 1.0, CoordinateSystem::Cartesian)
            .unwrap();
        assert_eq!(p.len(), 6);
        assert_eq!(p.component(0).to_vec(), vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(p.component(1).to_vec(), vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_spherical_detector_without_r_is_far_field() {
        let d = detector_points_spherical(None, vec![0.1, 0.2], vec![0.0, 1.0]).unwrap();
        let p = transform_to_desired_coordinates(&d, [9.0; 3], 3.0, CoordinateSystem::Spherical)
            .unwrap();
        assert!(p.values[[0, 0]].is_infinite());
        assert_eq!(p.values[[1, 1]], 0.2);
        assert_eq!(p.values[[2, 1]], 1.0);
    }

    #[test]
    fn test_spherical_detector_scales_r() {
        let d = detector_points_spherical(Some(vec![10.0]), vec![0.1], vec![0.0]).unwrap();
        let p = transform_to_desired_coordinates(&d, [0.0; 3], 3.0, CoordinateSystem::Spherical)
            .unwrap();
        assert_eq!(p.values[[0, 0]], 30.0);
    }

    #[test]
    fn test_cartesian_spherical_conversions() {
        let xyz = array![[0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]];
        let rtp = cartesian_to_spherical(&xyz);
        assert_abs_diff_eq!(rtp[[1, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rtp[[1, 1]], FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(rtp[[2, 1]], 0.0, epsilon = 1e-12);
        // phi of -y wraps into [0, 2π).
        assert_abs_diff_eq!(rtp[[2, 2]], 3.0 * FRAC_PI_2, epsilon = 1e-12);
        let back = spherical_to_cartesian(&rtp);
        for (a, b) in back.iter().zip(xyz.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_identity_when_systems_match() {
        let xyz = array![[1.0], [2.0], [3.0]];
        let f = find_transformation_function(CoordinateSystem::Cartesian, CoordinateSystem::Cartesian);
        assert_eq!(f(&xyz), xyz);
    }

    #[test]
    fn test_detector_without_coordinates_is_rejected() {
        let values = ndarray::Array1::<f64>::zeros(1).into_dyn();
        let bare = crate::labeled::LabeledArray::new(values, &["point"]).unwrap();
        let err = transform_to_desired_coordinates(&bare, [0.0; 3], 1.0, CoordinateSystem::Spherical);
        assert!(matches!(err, Err(ScatteringError::InvalidDetector(_))));
    }
}
