//! Exact multiple scattering from clusters of spheres.
//!
//! The superposition T-matrix solution itself lives in an external numeric
//! backend; this type handles dispatch and forwards the raw kernels.

use std::sync::Arc;

use holoscatter_geometry::{Scatterer, ScattererKind};
use ndarray::{Array2, Array3};
use num_complex::Complex64;

use super::{fields_from_scat_matrs, KernelSlot, NumericKernel, RawKernels, ScatteringTheory, TheoryKind};
use crate::coordinates::{CoordinateSystem, Positions};
use crate::error::ScatteringError;

#[derive(Debug, Clone, Default)]
pub struct Multisphere {
    kernel: KernelSlot,
}

impl Multisphere {
    pub fn with_kernel(kernel: Arc<dyn NumericKernel>) -> Self {
        Self {
            kernel: KernelSlot::new(kernel),
        }
    }
}

impl ScatteringTheory for Multisphere {
    fn kind(&self) -> TheoryKind {
        TheoryKind::Multisphere
    }

    fn can_handle(&self, scatterer: &Scatterer) -> bool {
        scatterer.kind() == ScattererKind::Spheres
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

#[cfg(test)]
mod tests {
    use super::*;
    use holoscatter_geometry::Sphere;

    #[test]
    fn test_handles_sphere_clusters_only() {
        let theory = Multisphere::default();
        let cluster = Scatterer::spheres(vec![
            Sphere::new(1.59, 0.5, [0.0, 0.0, 5.0]),
            Sphere::new(1.59, 0.5, [1.0, 0.0, 5.0]),
        ]);
        assert!(theory.can_handle(&cluster));
        assert!(!theory.can_handle(&Sphere::new(1.59, 0.5, [0.0; 3]).into()));
    }

    #[test]
    fn test_without_kernel_nothing_is_provided() {
        let theory = Multisphere::default();
        assert_eq!(theory.kernels(), RawKernels::default());
        let cluster = Scatterer::spheres(vec![Sphere::new(1.59, 0.5, [0.0; 3])]);
        assert!(matches!(
            theory.raw_cross_sections(&cluster, 1.0, 1.33, [1.0, 0.0, 0.0]),
            Err(ScatteringError::KernelNotImplemented { kernel: "raw_cross_sections", .. })
        ));
    }
}
