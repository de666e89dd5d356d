//! Scattered fields, scattering matrices and cross sections.
//!
//! These functions sit between the high-level `calc_*` API and the raw theory
//! kernels. They position the detector relative to the scatterer, split
//! multi-color illumination into single colors, superpose composite
//! scatterers that a theory cannot treat as a whole, and pack the results.
//!
//! Fields are referenced to the plane $z = 0$ by the phase factor
//! $e^{-i k c_z}$, where $c_z$ is the z coordinate of the scatterer's centre.

use holoscatter_geometry::Scatterer;
use log::{debug, warn};
use ndarray::Array2;
use num_complex::Complex64;

use crate::coordinates::{transform_to_desired_coordinates, CoordinateSystem};
use crate::error::ScatteringError;
use crate::labeled::{LabeledArray, ILLUMINATION};
use crate::pack::{pack_cross_sections, pack_field, pack_scattering_matrix};
use crate::schema::{Color, Schema};
use crate::theory::ScatteringTheory;

/// Scattered field of `scatterer` at the detector points of `schema`.
///
/// Multi-color schemas produce a leading `illumination` dimension, with each
/// slice computed under that color's wavelength, polarization and refractive
/// indices.
pub fn calculate_scattered_field(
    theory: &dyn ScatteringTheory,
    scatterer: &Scatterer,
    schema: &Schema,
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    if scatterer.center().is_none() {
        return Err(ScatteringError::MissingParameter("center".into()));
    }
    match schema.colors() {
        Some(colors) => calculate_multiple_color_scattered_field(theory, scatterer, schema, colors),
        None => calculate_single_color_scattered_field(theory, scatterer, schema),
    }
}

fn calculate_multiple_color_scattered_field(
    theory: &dyn ScatteringTheory,
    scatterer: &Scatterer,
    schema: &Schema,
    colors: &[Color],
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    let mut fields = Vec::with_capacity(colors.len());
    for color in colors {
        debug!(
            "Computing {} field for illumination '{}' ({})",
            theory.name(),
            color.label,
            color.wavelength
        );
        let this_schema = schema.with_single_color(color);
        let this_scatterer = scatterer.select_by_illumination(&color.label)?;
        fields.push(calculate_single_color_scattered_field(
            theory,
            &this_scatterer,
            &this_schema,
        )?);
    }
    let labels = colors.iter().map(|c| c.label.clone()).collect();
    Ok(LabeledArray::concat(&fields, ILLUMINATION, labels)?.with_attrs(schema.metadata.clone()))
}

fn calculate_single_color_scattered_field(
    theory: &dyn ScatteringTheory,
    scatterer: &Scatterer,
    schema: &Schema,
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    let polarization = schema.polarization()?;
    if polarization[2] != 0.0 {
        warn!(
            "Illumination polarization has a z component ({}); only x and y are used",
            polarization[2]
        );
    }
    let field = raw_single_color_field(theory, scatterer, schema)?;
    pack_field(field, schema)
}

/// Raw `(N, 3)` field, superposing components the theory cannot handle
/// together.
fn raw_single_color_field(
    theory: &dyn ScatteringTheory,
    scatterer: &Scatterer,
    schema: &Schema,
) -> Result<Array2<Complex64>, ScatteringError> {
    if theory.can_handle(scatterer) {
        get_field_from(theory, scatterer, schema)
    } else if scatterer.is_composite() {
        calculate_scattered_field_from_superposition(theory, &scatterer.get_component_list(), schema)
    } else {
        Err(incompatible(theory, scatterer))
    }
}

fn calculate_scattered_field_from_superposition(
    theory: &dyn ScatteringTheory,
    components: &[&Scatterer],
    schema: &Schema,
) -> Result<Array2<Complex64>, ScatteringError> {
    debug!(
        "Superposing {} components with {}",
        components.len(),
        theory.name()
    );
    let (first, rest) = components.split_first().ok_or_else(|| {
        ScatteringError::InvalidParameter("composite scatterer has no components".into())
    })?;
    let mut total = raw_single_color_field(theory, first, schema)?;
    for component in rest {
        total += &raw_single_color_field(theory, component, schema)?;
    }
    Ok(total)
}

/// Field `(N, 3)` from the theory's raw kernel, phased to the `z = 0` plane.
pub fn get_field_from(
    theory: &dyn ScatteringTheory,
    scatterer: &Scatterer,
    schema: &Schema,
) -> Result<Array2<Complex64>, ScatteringError> {
    let center = scatterer
        .center()
        .ok_or_else(|| ScatteringError::MissingParameter("center".into()))?;
    let wavevector = schema.wavevector()?;
    let polarization = schema.polarization()?;

    let positions = transform_to_desired_coordinates(
        &schema.detector,
        center,
        wavevector,
        theory.desired_coordinate_system(),
    )?;
    let raw = theory.raw_fields(
        &positions,
        scatterer,
        wavevector,
        schema.medium_index(),
        polarization,
    )?;
    if raw.shape() != [3, positions.len()] {
        return Err(ScatteringError::ShapeMismatch(format!(
            "{} returned fields of shape {:?} for {} points",
            theory.name(),
            raw.shape(),
            positions.len()
        )));
    }

    let phase = Complex64::from_polar(1.0, -wavevector * center[2]);
    Ok(raw.reversed_axes().mapv(|e| e * phase))
}

/// Amplitude scattering matrices at the detector points.
///
/// Only single-color schemas are accepted. Positions are scaled by the
/// wavevector, so a detector with `r` coordinates yields `kr` in the packed
/// `r` column.
pub fn calculate_scattering_matrix(
    theory: &dyn ScatteringTheory,
    scatterer: &Scatterer,
    schema: &Schema,
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    if schema.is_multicolor() {
        return Err(ScatteringError::InvalidParameter(
            "scattering matrices can only be computed for a single illumination color".into(),
        ));
    }
    let center = scatterer
        .center()
        .ok_or_else(|| ScatteringError::MissingParameter("center".into()))?;
    if !theory.can_handle(scatterer) {
        return Err(incompatible(theory, scatterer));
    }

    let wavevector = schema.wavevector()?;
    let positions = transform_to_desired_coordinates(
        &schema.detector,
        center,
        wavevector,
        theory.desired_coordinate_system(),
    )?;
    let matrices =
        theory.raw_scat_matrs(scatterer, &positions, wavevector, schema.medium_index())?;
    pack_scattering_matrix(matrices, &positions.to_system(CoordinateSystem::Spherical), schema)
}

/// Cross sections `[scattering, absorption, extinction, asymmetry]`.
pub fn calculate_cross_sections(
    theory: &dyn ScatteringTheory,
    scatterer: &Scatterer,
    medium_wavevec: f64,
    medium_index: f64,
    illum_polarization: [f64; 3],
) -> Result<LabeledArray<f64>, ScatteringError> {
    if !theory.can_handle(scatterer) {
        return Err(incompatible(theory, scatterer));
    }
    let raw =
        theory.raw_cross_sections(scatterer, medium_wavevec, medium_index, illum_polarization)?;
    pack_cross_sections(raw)
}

fn incompatible(theory: &dyn ScatteringTheory, scatterer: &Scatterer) -> ScatteringError {
    ScatteringError::TheoryNotCompatible {
        theory: theory.name().to_string(),
        scatterer: scatterer.to_string(),
    }
}
