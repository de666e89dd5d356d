//! Rigid transformations for positioning scatterers.
//!
//! Rotations use the z-y-z Euler convention common in light scattering codes:
//! rotate by `alpha` about z, then `beta` about the new y, then `gamma` about
//! the new z.

use nalgebra::{Matrix3, Rotation3, Vector3};

/// An affine transformation: rotation matrix + translation.
#[derive(Debug, Clone)]
pub struct Transform {
    /// 3x3 rotation matrix.
    pub matrix: Matrix3<f64>,
    /// Translation vector.
    pub translation: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }
}

impl Transform {
    /// Create a pure translation.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix3::identity(),
            translation: Vector3::new(dx, dy, dz),
        }
    }

    /// Rotation about the origin by z-y-z Euler angles (radians).
    pub fn euler_zyz(alpha: f64, beta: f64, gamma: f64) -> Self {
        let r = Rotation3::from_axis_angle(&Vector3::z_axis(), alpha)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), beta)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), gamma);
        Self {
            matrix: r.into_inner(),
            translation: Vector3::zeros(),
        }
    }

    /// The same rotation, but about `pivot` instead of the origin.
    pub fn about(&self, pivot: &[f64; 3]) -> Transform {
        let p = Vector3::new(pivot[0], pivot[1], pivot[2]);
        Transform::translation(-p.x, -p.y, -p.z)
            .then(self)
            .then(&Transform::translation(p.x, p.y, p.z))
    }

    /// Apply this transformation to a 3D point.
    pub fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        let v = Vector3::new(point[0], point[1], point[2]);
        let result = self.matrix * v + self.translation;
        [result.x, result.y, result.z]
    }

    /// Compose two transforms: self followed by other.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            matrix: other.matrix * self.matrix,
            translation: other.matrix * self.translation + other.translation,
        }
    }
}
