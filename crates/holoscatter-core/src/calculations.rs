//! High-level calculation API.
//!
//! Each `calc_*` function resolves the theory, builds a schema from the
//! detector and illumination parameters, runs the computation core, and
//! reshapes flattened results back onto the detector grid.
//!
//! A hologram is the intensity of the scattered field interfering with the
//! reference (incident) field,
//!
//! $$ I = \sum_{c \in \{x,y,z\}} \left| \alpha\, E_{s,c} + E_{r,c} \right|^2 $$
//!
//! where $\alpha$ is the scattered-field scaling and $E_r$ is the unit
//! illumination polarization.

use std::f64::consts::PI;
use std::sync::Arc;

use holoscatter_geometry::Scatterer;
use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::compute::{calculate_cross_sections, calculate_scattered_field, calculate_scattering_matrix};
use crate::detector::DetectorView;
use crate::dispatch::{check_kernels, interpret_theory, TheoryChoice};
use crate::error::ScatteringError;
use crate::labeled::{Coordinate, LabeledArray, FLAT, ILLUMINATION, VECTOR};
use crate::schema::{prep_schema, prep_unpolarized_schema, Illumination, Polarization, Schema, Wavelength};
use crate::theory::ScatteringTheory;

fn resolve(
    scatterer: &Scatterer,
    theory: &TheoryChoice,
) -> Result<Arc<dyn ScatteringTheory>, ScatteringError> {
    let theory = interpret_theory(scatterer, theory)?;
    check_kernels(theory.as_ref())?;
    Ok(theory)
}

/// Scattered electric field at the detector.
pub fn calc_field(
    detector: &DetectorView,
    scatterer: &Scatterer,
    medium_index: Option<f64>,
    wavelength: Option<Wavelength>,
    polarization: Option<Polarization>,
    theory: &TheoryChoice,
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    let theory = resolve(scatterer, theory)?;
    let schema = prep_schema(detector.clone(), medium_index, wavelength, polarization)?;
    let field = calculate_scattered_field(theory.as_ref(), scatterer, &schema)?;
    finalize(detector, field)
}

/// In-line hologram: scattered field interfering with the illumination.
pub fn calc_holo(
    detector: &DetectorView,
    scatterer: &Scatterer,
    medium_index: Option<f64>,
    wavelength: Option<Wavelength>,
    polarization: Option<Polarization>,
    theory: &TheoryChoice,
    scaling: f64,
) -> Result<LabeledArray<f64>, ScatteringError> {
    let theory = resolve(scatterer, theory)?;
    let schema = prep_schema(detector.clone(), medium_index, wavelength, polarization)?;
    let scattered = calculate_scattered_field(theory.as_ref(), scatterer, &schema)?;
    let reference = reference_field(&schema)?;
    let holo = scattered_field_to_hologram(&scattered.map(|e| e * scaling), &reference)?;
    finalize(detector, holo)
}

/// Intensity of the scattered field alone.
pub fn calc_intensity(
    detector: &DetectorView,
    scatterer: &Scatterer,
    medium_index: Option<f64>,
    wavelength: Option<Wavelength>,
    polarization: Option<Polarization>,
    theory: &TheoryChoice,
) -> Result<LabeledArray<f64>, ScatteringError> {
    let theory = resolve(scatterer, theory)?;
    let schema = prep_schema(detector.clone(), medium_index, wavelength, polarization)?;
    let field = calculate_scattered_field(theory.as_ref(), scatterer, &schema)?;
    let intensity = field.map(|e| e.norm_sqr()).sum_over(VECTOR)?;
    finalize(detector, intensity)
}

/// Scattering, absorption and extinction cross sections and the asymmetry
/// parameter.
pub fn calc_cross_sections(
    scatterer: &Scatterer,
    medium_index: Option<f64>,
    wavelength: Option<f64>,
    polarization: Option<Polarization>,
    theory: &TheoryChoice,
) -> Result<LabeledArray<f64>, ScatteringError> {
    let theory = resolve(scatterer, theory)?;
    let medium_index =
        medium_index.ok_or_else(|| ScatteringError::MissingParameter("medium_index".into()))?;
    let wavelength =
        wavelength.ok_or_else(|| ScatteringError::MissingParameter("wavelength".into()))?;
    let polarization = match polarization {
        Some(Polarization::Single(p)) => match *p.as_slice() {
            [x, y] => [x, y, 0.0],
            [x, y, z] => [x, y, z],
            _ => {
                return Err(ScatteringError::InvalidParameter(format!(
                    "polarization must have 2 or 3 components, got {}",
                    p.len()
                )))
            }
        },
        Some(Polarization::Labeled(_)) => {
            return Err(ScatteringError::InvalidParameter(
                "cross sections take a single polarization".into(),
            ))
        }
        None => return Err(ScatteringError::MissingParameter("polarization".into())),
    };
    let medium_wavevec = 2.0 * PI * medium_index / wavelength;
    calculate_cross_sections(
        theory.as_ref(),
        scatterer,
        medium_wavevec,
        medium_index,
        polarization,
    )
}

/// Amplitude scattering matrices at the detector points.
pub fn calc_scat_matrix(
    detector: &DetectorView,
    scatterer: &Scatterer,
    medium_index: Option<f64>,
    wavelength: Option<Wavelength>,
    theory: &TheoryChoice,
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    let theory = resolve(scatterer, theory)?;
    let schema = prep_unpolarized_schema(detector.clone(), medium_index, wavelength)?;
    let matrices = calculate_scattering_matrix(theory.as_ref(), scatterer, &schema)?;
    finalize(detector, matrices)
}

/// $\sum_{vector} |E_s + E_r|^2$, broadcasting `reference` over the field's
/// other dimensions by name.
pub fn scattered_field_to_hologram(
    scattered: &LabeledArray<Complex64>,
    reference: &LabeledArray<Complex64>,
) -> Result<LabeledArray<f64>, ScatteringError> {
    scattered
        .zip_with(reference, |s, r| (s + r).norm_sqr())?
        .sum_over(VECTOR)
}

/// The illumination polarization as a field, one vector per color.
fn reference_field(schema: &Schema) -> Result<LabeledArray<Complex64>, ScatteringError> {
    let xyz = Coordinate::along(VECTOR, &["x", "y", "z"][..]);
    let as_field = |p: [f64; 3]| p.map(|c| Complex64::new(c, 0.0));
    match schema.illumination() {
        Illumination::Single { .. } => {
            let p = as_field(schema.polarization()?);
            LabeledArray::new(Array1::from(p.to_vec()).into_dyn(), &[VECTOR])?
                .with_coord(VECTOR, xyz)
        }
        Illumination::Multi(colors) => {
            let mut values = Array2::zeros((colors.len(), 3));
            for (i, color) in colors.iter().enumerate() {
                let p = color.polarization.ok_or_else(|| {
                    ScatteringError::MissingParameter(format!(
                        "polarization for illumination '{}'",
                        color.label
                    ))
                })?;
                for (c, value) in as_field(p).into_iter().enumerate() {
                    values[[i, c]] = value;
                }
            }
            let labels: Vec<String> = colors.iter().map(|c| c.label.clone()).collect();
            LabeledArray::new(values.into_dyn(), &[ILLUMINATION, VECTOR])?
                .with_coord(ILLUMINATION, Coordinate::along(ILLUMINATION, labels))?
                .with_coord(VECTOR, xyz)
        }
    }
}

/// Reshape a result computed on the flattened detector back onto the
/// detector's own dimensions.
pub fn finalize<T: Clone>(
    detector: &DetectorView,
    result: LabeledArray<T>,
) -> Result<LabeledArray<T>, ScatteringError> {
    if result.has_dim(FLAT) && !detector.has_dim(FLAT) {
        result.unstacked(FLAT, detector)
    } else {
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: [f64; 3]) -> LabeledArray<Complex64> {
        let v: Vec<Complex64> = values.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        LabeledArray::new(Array1::from(v).into_dyn(), &[VECTOR]).unwrap()
    }

    #[test]
    fn test_hologram_of_plane_waves() {
        let holo = scattered_field_to_hologram(&vector([1.0, 0.0, 0.0]), &vector([1.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(holo.shape(), &[] as &[usize]);
        assert!((holo.values().iter().next().unwrap() - 4.0).abs() < 1e-15);
    }

    #[test]
    fn test_finalize_leaves_point_results_alone() {
        let detector = crate::detector::detector_points(vec![0.0], vec![0.0], vec![1.0]).unwrap();
        let result = detector.clone();
        assert_eq!(finalize(&detector, result.clone()).unwrap(), result);
    }
}
