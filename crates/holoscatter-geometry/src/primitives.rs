//! Parametric scatterer primitives.
//!
//! Each primitive is a homogeneous (or, for [`LayeredSphere`], piecewise
//! homogeneous) object with a refractive index and an optional centre. The
//! centre is optional because scatterers are often described before they are
//! placed; field calculations refuse to run until it is set.
//!
//! Lengths are in the same units as the illumination wavelength.

use num_complex::Complex64;

use crate::error::GeometryError;
use crate::scatterer::ScattererKind;
use crate::transform::Transform;

/// Refractive index of a scatterer material.
///
/// Dispersive materials may carry one value per illumination color, keyed by
/// the color label used in the illumination metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum RefractiveIndex {
    Fixed(Complex64),
    ByIllumination(Vec<(String, Complex64)>),
}

impl RefractiveIndex {
    /// A lossless index.
    pub fn real(n: f64) -> Self {
        RefractiveIndex::Fixed(Complex64::new(n, 0.0))
    }

    /// The index value, if it does not depend on illumination.
    pub fn value(&self) -> Result<Complex64, GeometryError> {
        match self {
            RefractiveIndex::Fixed(n) => Ok(*n),
            RefractiveIndex::ByIllumination(_) => Err(GeometryError::UnresolvedIndex),
        }
    }

    /// Resolve the index for one illumination color.
    pub fn select(&self, label: &str) -> Result<RefractiveIndex, GeometryError> {
        match self {
            RefractiveIndex::Fixed(_) => Ok(self.clone()),
            RefractiveIndex::ByIllumination(values) => values
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, n)| RefractiveIndex::Fixed(*n))
                .ok_or_else(|| GeometryError::MissingIllumination {
                    label: label.to_string(),
                }),
        }
    }
}

impl From<f64> for RefractiveIndex {
    fn from(n: f64) -> Self {
        RefractiveIndex::real(n)
    }
}

impl From<Complex64> for RefractiveIndex {
    fn from(n: Complex64) -> Self {
        RefractiveIndex::Fixed(n)
    }
}

/// A primitive (non-composite) scatterer.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Sphere(Sphere),
    LayeredSphere(LayeredSphere),
    Spheroid(Spheroid),
    Cylinder(Cylinder),
    Ellipsoid(Ellipsoid),
}

/// A homogeneous sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub n: RefractiveIndex,
    /// Radius.
    pub r: f64,
    pub center: Option<[f64; 3]>,
}

impl Sphere {
    pub fn new(n: impl Into<RefractiveIndex>, r: f64, center: [f64; 3]) -> Self {
        Self {
            n: n.into(),
            r,
            center: Some(center),
        }
    }
}

/// A concentric multilayer sphere, innermost layer first.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredSphere {
    /// Index of each layer.
    pub n: Vec<RefractiveIndex>,
    /// Thickness of each layer; the first entry is the core radius.
    pub t: Vec<f64>,
    pub center: Option<[f64; 3]>,
}

impl LayeredSphere {
    pub fn new(
        n: Vec<RefractiveIndex>,
        t: Vec<f64>,
        center: Option<[f64; 3]>,
    ) -> Result<Self, GeometryError> {
        if n.is_empty() || n.len() != t.len() {
            return Err(GeometryError::InvalidScatterer(format!(
                "layered sphere needs one index per layer ({} indices, {} thicknesses)",
                n.len(),
                t.len()
            )));
        }
        if t.iter().any(|&ti| !(ti > 0.0)) {
            return Err(GeometryError::InvalidScatterer(
                "layer thicknesses must be positive".into(),
            ));
        }
        Ok(Self { n, t, center })
    }

    /// Outer radius of each layer.
    pub fn radii(&self) -> Vec<f64> {
        self.t
            .iter()
            .scan(0.0, |acc, &t| {
                *acc += t;
                Some(*acc)
            })
            .collect()
    }
}

/// A spheroid with its symmetry axis along z before rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Spheroid {
    pub n: RefractiveIndex,
    /// Equatorial and polar semi-axes.
    pub r: [f64; 2],
    /// z-y-z Euler angles (radians).
    pub rotation: [f64; 3],
    pub center: Option<[f64; 3]>,
}

/// A finite right circular cylinder with its axis along z before rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub n: RefractiveIndex,
    /// Diameter.
    pub d: f64,
    /// Height.
    pub h: f64,
    pub rotation: [f64; 3],
    pub center: Option<[f64; 3]>,
}

/// A general triaxial ellipsoid.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    pub n: RefractiveIndex,
    /// Semi-axis lengths along x, y, z before rotation.
    pub r: [f64; 3],
    pub rotation: [f64; 3],
    pub center: Option<[f64; 3]>,
}

impl Primitive {
    pub fn kind(&self) -> ScattererKind {
        match self {
            Primitive::Sphere(_) => ScattererKind::Sphere,
            Primitive::LayeredSphere(_) => ScattererKind::LayeredSphere,
            Primitive::Spheroid(_) => ScattererKind::Spheroid,
            Primitive::Cylinder(_) => ScattererKind::Cylinder,
            Primitive::Ellipsoid(_) => ScattererKind::Ellipsoid,
        }
    }

    pub fn center(&self) -> Option<[f64; 3]> {
        match self {
            Primitive::Sphere(s) => s.center,
            Primitive::LayeredSphere(s) => s.center,
            Primitive::Spheroid(s) => s.center,
            Primitive::Cylinder(c) => c.center,
            Primitive::Ellipsoid(e) => e.center,
        }
    }

    fn center_mut(&mut self) -> &mut Option<[f64; 3]> {
        match self {
            Primitive::Sphere(s) => &mut s.center,
            Primitive::LayeredSphere(s) => &mut s.center,
            Primitive::Spheroid(s) => &mut s.center,
            Primitive::Cylinder(c) => &mut c.center,
            Primitive::Ellipsoid(e) => &mut e.center,
        }
    }

    /// A copy with every refractive index resolved for one illumination color.
    pub fn select_by_illumination(&self, label: &str) -> Result<Primitive, GeometryError> {
        let mut selected = self.clone();
        match &mut selected {
            Primitive::Sphere(s) => s.n = s.n.select(label)?,
            Primitive::LayeredSphere(s) => {
                s.n = s
                    .n
                    .iter()
                    .map(|n| n.select(label))
                    .collect::<Result<_, _>>()?;
            }
            Primitive::Spheroid(s) => s.n = s.n.select(label)?,
            Primitive::Cylinder(c) => c.n = c.n.select(label)?,
            Primitive::Ellipsoid(e) => e.n = e.n.select(label)?,
        }
        Ok(selected)
    }

    /// A copy whose centre has been mapped through `transform`.
    ///
    /// Primitives without a centre are returned unchanged.
    pub fn transformed(&self, transform: &Transform) -> Primitive {
        let mut moved = self.clone();
        let center = moved.center_mut();
        if let Some(c) = center.as_ref() {
            *center = Some(transform.apply(c));
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layered_sphere_radii_accumulate() {
        let s = LayeredSphere::new(
            vec![1.5.into(), 1.6.into(), 1.7.into()],
            vec![0.1, 0.2, 0.3],
            None,
        )
        .unwrap();
        let radii = s.radii();
        assert!((radii[0] - 0.1).abs() < 1e-12);
        assert!((radii[1] - 0.3).abs() < 1e-12);
        assert!((radii[2] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_layered_sphere_rejects_mismatched_layers() {
        let err = LayeredSphere::new(vec![1.5.into()], vec![0.1, 0.2], None).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidScatterer(_)));
    }

    #[test]
    fn test_index_selection_by_illumination() {
        let n = RefractiveIndex::ByIllumination(vec![
            ("red".into(), Complex64::new(1.58, 0.0)),
            ("green".into(), Complex64::new(1.60, 0.0)),
        ]);
        assert_eq!(n.value(), Err(GeometryError::UnresolvedIndex));
        assert_eq!(n.select("green").unwrap(), RefractiveIndex::real(1.60));
        assert_eq!(
            n.select("blue"),
            Err(GeometryError::MissingIllumination { label: "blue".into() })
        );
        // Fixed indices pass through any selection.
        assert_eq!(RefractiveIndex::real(1.5).select("blue").unwrap(), RefractiveIndex::real(1.5));
    }

    #[test]
    fn test_transformed_moves_center_only_when_set() {
        let t = Transform::translation(1.0, -1.0, 2.0);
        let placed = Primitive::Sphere(Sphere::new(1.59, 0.5, [0.0, 0.0, 10.0]));
        assert_eq!(placed.transformed(&t).center(), Some([1.0, -1.0, 12.0]));

        let unplaced = Primitive::Spheroid(Spheroid {
            n: 1.33.into(),
            r: [1.0, 2.0],
            rotation: [0.0; 3],
            center: None,
        });
        assert_eq!(unplaced.transformed(&t).center(), None);
    }
}
