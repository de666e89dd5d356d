//! Extended boundary condition T-matrix method for axisymmetric particles.
//!
//! Handles spheres, spheroids and finite cylinders. The T-matrix computation
//! is performed by an injected numeric backend, which usually only provides
//! scattering matrices; fields are then derived in the far-field
//! approximation.

use std::sync::Arc;

use holoscatter_geometry::{Primitive, Scatterer};
use ndarray::{Array2, Array3};
use num_complex::Complex64;

use super::{fields_from_scat_matrs, KernelSlot, NumericKernel, RawKernels, ScatteringTheory, TheoryKind};
use crate::coordinates::{CoordinateSystem, Positions};
use crate::error::ScatteringError;

#[derive(Debug, Clone, Default)]
pub struct Tmatrix {
    kernel: KernelSlot,
}

impl Tmatrix {
    pub fn with_kernel(kernel: Arc<dyn NumericKernel>) -> Self {
        Self {
            kernel: KernelSlot::new(kernel),
        }
    }
}

impl ScatteringTheory for Tmatrix {
    fn kind(&self) -> TheoryKind {
        TheoryKind::Tmatrix
    }

    fn can_handle(&self, scatterer: &Scatterer) -> bool {
        matches!(
            scatterer,
            Scatterer::Primitive(Primitive::Sphere(_) | Primitive::Spheroid(_) | Primitive::Cylinder(_))
        )
    }

    fn desired_coordinate_system(&self) -> CoordinateSystem {
        self.kernel.coordinate_system()
    }

    fn kernels(&self) -> RawKernels {
        self.kernel.provides()
    }

    fn raw_fields(
        &self,
        positions: &Positions,
        scatterer: &Scatterer,
        medium_wavevec: f64,
        medium_index: f64,
        illum_polarization: [f64; 3],
    ) -> Result<Array2<Complex64>, ScatteringError> {
        if self.kernels().fields {
            self.kernel.get(self.kind(), "raw_fields")?.raw_fields(
                positions,
                scatterer,
                medium_wavevec,
                medium_index,
                illum_polarization,
            )
        } else {
            fields_from_scat_matrs(
                self,
                positions,
                scatterer,
                medium_wavevec,
                medium_index,
                illum_polarization,
            )
        }
    }

    fn raw_scat_matrs(
        &self,
        scatterer: &Scatterer,
        positions: &Positions,
        medium_wavevec: f64,
        medium_index: f64,
    ) -> Result<Array3<Complex64>, ScatteringError> {
        self.kernel
            .get(self.kind(), "raw_scat_matrs")?
            .raw_scat_matrs(scatterer, positions, medium_wavevec, medium_index)
    }

    fn raw_cross_sections(
        &self,
        scatterer: &Scatterer,
        medium_wavevec: f64,
        medium_index: f64,
        illum_polarization: [f64; 3],
    ) -> Result<[f64; 4], ScatteringError> {
        self.kernel
            .get(self.kind(), "raw_cross_sections")?
            .raw_cross_sections(scatterer, medium_wavevec, medium_index, illum_polarization)
    }
}
