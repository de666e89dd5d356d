//! Primitive and composite scatterers.
//!
//! A [`Scatterer`] is either a single [`Primitive`] or an ordered composite of
//! other scatterers. Composites can always be flattened into their primitive
//! leaves with [`Scatterer::get_component_list`], which is what theories that
//! only understand single particles use to build a coherent superposition.

use std::fmt;

use nalgebra::Vector3;

use crate::error::GeometryError;
use crate::primitives::{Primitive, Sphere};
use crate::transform::Transform;

/// Geometric class of a scatterer, used for theory dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScattererKind {
    Sphere,
    LayeredSphere,
    Spheroid,
    Cylinder,
    Ellipsoid,
    /// A non-empty cluster made only of homogeneous spheres.
    Spheres,
    /// Any other composite.
    Composite,
}

impl ScattererKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScattererKind::Sphere => "Sphere",
            ScattererKind::LayeredSphere => "LayeredSphere",
            ScattererKind::Spheroid => "Spheroid",
            ScattererKind::Cylinder => "Cylinder",
            ScattererKind::Ellipsoid => "Ellipsoid",
            ScattererKind::Spheres => "Spheres",
            ScattererKind::Composite => "Composite",
        }
    }
}

impl fmt::Display for ScattererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An object that scatters light.
#[derive(Debug, Clone, PartialEq)]
pub enum Scatterer {
    Primitive(Primitive),
    Composite(Vec<Scatterer>),
}

impl From<Primitive> for Scatterer {
    fn from(p: Primitive) -> Self {
        Scatterer::Primitive(p)
    }
}

impl From<Sphere> for Scatterer {
    fn from(s: Sphere) -> Self {
        Scatterer::Primitive(Primitive::Sphere(s))
    }
}

impl Scatterer {
    /// A cluster of homogeneous spheres.
    pub fn spheres(spheres: Vec<Sphere>) -> Self {
        Scatterer::Composite(spheres.into_iter().map(Scatterer::from).collect())
    }

    pub fn kind(&self) -> ScattererKind {
        match self {
            Scatterer::Primitive(p) => p.kind(),
            Scatterer::Composite(components) => {
                let leaves = self.get_component_list();
                let all_spheres = leaves
                    .iter()
                    .all(|s| matches!(s, Scatterer::Primitive(Primitive::Sphere(_))));
                if !components.is_empty() && all_spheres {
                    ScattererKind::Spheres
                } else {
                    ScattererKind::Composite
                }
            }
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Scatterer::Composite(_))
    }

    /// Position of the scatterer.
    ///
    /// A composite is centred on the mean of its components' centres, and has
    /// no centre if it is empty or if any component lacks one.
    pub fn center(&self) -> Option<[f64; 3]> {
        match self {
            Scatterer::Primitive(p) => p.center(),
            Scatterer::Composite(components) => {
                if components.is_empty() {
                    return None;
                }
                let mut sum = Vector3::zeros();
                for c in components {
                    let [x, y, z] = c.center()?;
                    sum += Vector3::new(x, y, z);
                }
                let mean = sum / components.len() as f64;
                Some([mean.x, mean.y, mean.z])
            }
        }
    }

    /// Flatten into the ordered list of primitive leaves.
    pub fn get_component_list(&self) -> Vec<&Scatterer> {
        match self {
            Scatterer::Primitive(_) => vec![self],
            Scatterer::Composite(components) => components
                .iter()
                .flat_map(|c| c.get_component_list())
                .collect(),
        }
    }

    /// The variant of this scatterer seen under one illumination color.
    pub fn select_by_illumination(&self, label: &str) -> Result<Scatterer, GeometryError> {
        match self {
            Scatterer::Primitive(p) => Ok(Scatterer::Primitive(p.select_by_illumination(label)?)),
            Scatterer::Composite(components) => Ok(Scatterer::Composite(
                components
                    .iter()
                    .map(|c| c.select_by_illumination(label))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }

    /// Map every centre through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Scatterer {
        match self {
            Scatterer::Primitive(p) => Scatterer::Primitive(p.transformed(transform)),
            Scatterer::Composite(components) => Scatterer::Composite(
                components.iter().map(|c| c.transformed(transform)).collect(),
            ),
        }
    }

    pub fn translated(&self, offset: [f64; 3]) -> Scatterer {
        self.transformed(&Transform::translation(offset[0], offset[1], offset[2]))
    }

    /// Rotate the arrangement of components about the scatterer's centre.
    ///
    /// Only positions move; the body-frame orientation of anisotropic
    /// components is left as it is.
    pub fn rotated(&self, alpha: f64, beta: f64, gamma: f64) -> Scatterer {
        match self.center() {
            Some(center) => {
                self.transformed(&Transform::euler_zyz(alpha, beta, gamma).about(&center))
            }
            None => self.clone(),
        }
    }
}

impl fmt::Display for Scatterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scatterer::Composite(components) => {
                write!(f, "{} of {} components", self.kind(), components.len())
            }
            Scatterer::Primitive(p) => match p.center() {
                Some([x, y, z]) => write!(f, "{} at ({}, {}, {})", p.kind(), x, y, z),
                None => write!(f, "{} without center", p.kind()),
            },
        }
    }
}
