//! # Holoscatter Geometry
//!
//! Scatterer descriptions for the holoscatter framework. This crate provides:
//!
//! - **Primitives** ([`primitives`]): Spheres, layered spheres, spheroids,
//!   cylinders, and ellipsoids, each with a refractive index and an optional
//!   centre.
//! - **Scatterers** ([`scatterer`]): A closed variant over primitives and
//!   composite clusters, with flattening into primitive components and
//!   per-illumination selection of refractive indices.
//! - **Transformations** ([`transform`]): Translations and Euler rotations
//!   used to position clusters.

pub mod error;
pub mod primitives;
pub mod scatterer;
pub mod transform;

pub use error::GeometryError;
pub use primitives::{
    Cylinder, Ellipsoid, LayeredSphere, Primitive, RefractiveIndex, Sphere, Spheroid,
};
pub use scatterer::{Scatterer, ScattererKind};
