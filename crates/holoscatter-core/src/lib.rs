//! # Holoscatter Core
//!
//! Electromagnetic scattering observables for particles seen by a detector:
//! scattered fields, holograms, intensities, cross sections, and amplitude
//! scattering matrices.
//!
//! ## Architecture
//!
//! Every numerical method implements the [`theory::ScatteringTheory`] trait.
//! The computation core positions the detector relative to the scatterer,
//! splits multi-color illumination, superposes composite scatterers, and packs
//! raw kernel output into [`labeled::LabeledArray`]s that keep the detector's
//! coordinates. The in-tree kernel is Lorenz-Mie theory
//! ([`theory::Mie`]); multisphere and T-matrix kernels are injected through
//! [`theory::NumericKernel`].
//!
//! ## Modules
//!
//! - [`calculations`]: `calc_field`, `calc_holo`, `calc_intensity`,
//!   `calc_cross_sections`, `calc_scat_matrix`.
//! - [`compute`]: Scattered field, scattering matrix and cross-section core.
//! - [`coordinates`]: Detector-to-theory coordinate transformation.
//! - [`detector`]: Detector geometries and point/flat views.
//! - [`dispatch`]: Default theory registry and theory resolution.
//! - [`labeled`]: Arrays with named dimensions and coordinates.
//! - [`pack`]: Labeled packing of raw kernel results.
//! - [`schema`]: Illumination metadata and schema preparation.
//! - [`theory`]: Theory trait, Mie, Multisphere and Tmatrix.
//! - [`config`]: TOML calculation settings.

pub mod calculations;
pub mod compute;
pub mod config;
pub mod coordinates;
pub mod detector;
pub mod dispatch;
pub mod error;
pub mod labeled;
pub mod pack;
pub mod schema;
pub mod theory;

pub use calculations::{
    calc_cross_sections, calc_field, calc_holo, calc_intensity, calc_scat_matrix, finalize,
    scattered_field_to_hologram,
};
pub use dispatch::TheoryChoice;
pub use error::ScatteringError;
pub use schema::{prep_schema, Polarization, Wavelength};
