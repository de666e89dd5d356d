//! Scattering theory abstraction and implementations.
//!
//! The [`ScatteringTheory`] trait is the seam between the computation core and
//! the numerical methods. A theory declares which scatterers it can handle and
//! which raw kernels it provides:
//!
//! - `raw_fields`: scattered field at each position, shape `(3, N)`.
//! - `raw_scat_matrs`: amplitude scattering matrices, shape `(N, 2, 2)`.
//! - `raw_cross_sections`: `[scattering, absorption, extinction, asymmetry]`.
//!
//! Providing either of the first two is enough for fields, holograms and
//! intensities: when only matrices are available, fields are derived from them
//! in the far-field approximation by [`fields_from_scat_matrs`].
//!
//! [`mie::Mie`] is implemented in-tree. [`multisphere::Multisphere`] and
//! [`tmatrix::Tmatrix`] delegate to an injected [`NumericKernel`].

pub mod angular;
pub mod mie;
pub mod multisphere;
pub mod tmatrix;

use std::fmt;
use std::sync::Arc;

use holoscatter_geometry::Scatterer;
use ndarray::{Array2, Array3};
use num_complex::Complex64;

use crate::coordinates::{CoordinateSystem, Positions};
use crate::error::ScatteringError;

pub use mie::Mie;
pub use multisphere::Multisphere;
pub use tmatrix::Tmatrix;

/// Which raw kernels a theory or numeric backend implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawKernels {
    pub fields: bool,
    pub scat_matrs: bool,
    pub cross_sections: bool,
}

impl RawKernels {
    /// Enough to compute fields, holograms and intensities.
    pub fn can_compute_fields(&self) -> bool {
        self.fields || self.scat_matrs
    }
}

/// The built-in theory classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TheoryKind {
    Mie,
    Multisphere,
    Tmatrix,
}

impl TheoryKind {
    pub fn name(&self) -> &'static str {
        match self {
            TheoryKind::Mie => "Mie",
            TheoryKind::Multisphere => "Multisphere",
            TheoryKind::Tmatrix => "Tmatrix",
        }
    }

    /// The default-configured instance of this theory class.
    pub fn instantiate(&self) -> Arc<dyn ScatteringTheory> {
        match self {
            TheoryKind::Mie => Arc::new(Mie::default()),
            TheoryKind::Multisphere => Arc::new(Multisphere::default()),
            TheoryKind::Tmatrix => Arc::new(Tmatrix::default()),
        }
    }
}

impl fmt::Display for TheoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A method for computing light scattering.
///
/// Positions passed to the raw kernels are dimensionless (lengths times the
/// medium wavevector), relative to the scatterer's centre, with z pointing
/// against the direction of propagation, and expressed in
/// [`desired_coordinate_system`](Self::desired_coordinate_system).
pub trait ScatteringTheory: fmt::Debug + Send + Sync {
    fn kind(&self) -> TheoryKind;

    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Whether this theory can compute scattering from `scatterer` directly.
    fn can_handle(&self, scatterer: &Scatterer) -> bool;

    fn desired_coordinate_system(&self) -> CoordinateSystem {
        CoordinateSystem::Spherical
    }

    /// The raw kernels this instance actually implements.
    fn kernels(&self) -> RawKernels;

    /// Scattered field at each position, shape `(3, N)`.
    ///
    /// The default derives fields from [`raw_scat_matrs`](Self::raw_scat_matrs).
    fn raw_fields(
        &self,
        positions: &Positions,
        scatterer: &Scatterer,
        medium_wavevec: f64,
        medium_index: f64,
        illum_polarization: [f64; 3],
    ) -> Result<Array2<Complex64>, ScatteringError> {
        fields_from_scat_matrs(
            self,
            positions,
            scatterer,
            medium_wavevec,
            medium_index,
            illum_polarization,
        )
    }

    /// Amplitude scattering matrices `[[S2, S3], [S4, S1]]`, shape `(N, 2, 2)`.
    fn raw_scat_matrs(
        &self,
        _scatterer: &Scatterer,
        _positions: &Positions,
        _medium_wavevec: f64,
        _medium_index: f64,
    ) -> Result<Array3<Complex64>, ScatteringError> {
        Err(ScatteringError::KernelNotImplemented {
            theory: self.name().to_string(),
            kernel: "raw_scat_matrs",
        })
    }

    /// `[scattering, absorption, extinction, asymmetry]`.
    fn raw_cross_sections(
        &self,
        _scatterer: &Scatterer,
        _medium_wavevec: f64,
        _medium_index: f64,
        _illum_polarization: [f64; 3],
    ) -> Result<[f64; 4], ScatteringError> {
        Err(ScatteringError::KernelNotImplemented {
            theory: self.name().to_string(),
            kernel: "raw_cross_sections",
        })
    }
}

/// Far-field scattered fields computed from a theory's scattering matrices.
///
/// Each point's matrix is applied to the incident polarization projected
/// onto the scattering plane, then rotated into Cartesian components.
pub fn fields_from_scat_matrs<T: ScatteringTheory + ?Sized>(
    theory: &T,
    positions: &Positions,
    scatterer: &Scatterer,
    medium_wavevec: f64,
    medium_index: f64,
    illum_polarization: [f64; 3],
) -> Result<Array2<Complex64>, ScatteringError> {
    let spherical = positions.to_system(CoordinateSystem::Spherical);
    let matrices = theory.raw_scat_matrs(scatterer, &spherical, medium_wavevec, medium_index)?;
    angular::calc_scat_field(&spherical, &matrices, illum_polarization)
}

/// An external numerical backend for theories without an in-tree kernel.
pub trait NumericKernel: fmt::Debug + Send + Sync {
    fn provides(&self) -> RawKernels;

    fn coordinate_system(&self) -> CoordinateSystem {
        CoordinateSystem::Spherical
    }

    fn raw_fields(
        &self,
        _positions: &Positions,
        _scatterer: &Scatterer,
        _medium_wavevec: f64,
        _medium_index: f64,
        _illum_polarization: [f64; 3],
    ) -> Result<Array2<Complex64>, ScatteringError> {
        Err(ScatteringError::KernelNotImplemented {
            theory: format!("{self:?}"),
            kernel: "raw_fields",
        })
    }

    fn raw_scat_matrs(
        &self,
        _scatterer: &Scatterer,
        _positions: &Positions,
        _medium_wavevec: f64,
        _medium_index: f64,
    ) -> Result<Array3<Complex64>, ScatteringError> {
        Err(ScatteringError::KernelNotImplemented {
            theory: format!("{self:?}"),
            kernel: "raw_scat_matrs",
        })
    }

    fn raw_cross_sections(
        &self,
        _scatterer: &Scatterer,
        _medium_wavevec: f64,
        _medium_index: f64,
        _illum_polarization: [f64; 3],
    ) -> Result<[f64; 4], ScatteringError> {
        Err(ScatteringError::KernelNotImplemented {
            theory: format!("{self:?}"),
            kernel: "raw_cross_sections",
        })
    }
}

/// Shared plumbing for theories that forward to an optional [`NumericKernel`].
#[derive(Debug, Clone, Default)]
pub(crate) struct KernelSlot(Option<Arc<dyn NumericKernel>>);

impl KernelSlot {
    pub(crate) fn new(kernel: Arc<dyn NumericKernel>) -> Self {
        Self(Some(kernel))
    }

    pub(crate) fn provides(&self) -> RawKernels {
        self.0.as_ref().map(|k| k.provides()).unwrap_or_default()
    }

    pub(crate) fn coordinate_system(&self) -> CoordinateSystem {
        self.0
            .as_ref()
            .map(|k| k.coordinate_system())
            .unwrap_or_default()
    }

    pub(crate) fn get(
        &self,
        theory: TheoryKind,
        kernel: &'static str,
    ) -> Result<&dyn NumericKernel, ScatteringError> {
        self.0
            .as_deref()
            .ok_or_else(|| ScatteringError::KernelNotImplemented {
                theory: theory.name().to_string(),
                kernel,
            })
    }
}
