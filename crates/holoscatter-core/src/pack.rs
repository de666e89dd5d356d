//! Packing raw kernel output into labeled arrays.
//!
//! Row `i` of every raw array belongs to point `i` of the flattened detector,
//! so packing is a matter of attaching the flattened detector's coordinates
//! and the physical dimension labels.

use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;

use crate::coordinates::{CoordinateSystem, Positions};
use crate::detector::{classify, flat};
use crate::error::ScatteringError;
use crate::labeled::{Coordinate, LabeledArray, VECTOR};
use crate::schema::Schema;

/// Dimension of packed cross sections.
pub const CROSS_SECTION: &str = "cross_section";
/// Order of the entries of a cross-section array.
pub const CROSS_SECTION_LABELS: [&str; 4] = ["scattering", "absorption", "extinction", "asymmetry"];

pub const EPAR: &str = "Epar";
pub const EPERP: &str = "Eperp";

/// Wrap fields of shape `(N, 3)` as `[point|flat, vector]`.
pub fn pack_field(
    fields: Array2<Complex64>,
    schema: &Schema,
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    let view = flat(&schema.detector);
    let dim = classify(&view)?.dim();
    let n = view.dim_len(dim).unwrap_or(0);
    if fields.shape() != [n, 3] {
        return Err(ScatteringError::ShapeMismatch(format!(
            "fields of shape {:?} for {n} detector points",
            fields.shape()
        )));
    }

    let mut packed = LabeledArray::new(fields.into_dyn(), &[dim, VECTOR])?;
    for (name, coord) in view.coords() {
        packed = packed.with_coord(name, coord.clone())?;
    }
    Ok(packed
        .with_coord(VECTOR, Coordinate::along(VECTOR, &["x", "y", "z"][..]))?
        .with_attrs(schema.metadata.clone()))
}

/// Wrap scattering matrices of shape `(N, 2, 2)` as `[point|flat, Epar, Eperp]`.
///
/// `positions` are the points the matrices were computed at; their spherical
/// form supplies the `r`, `theta` and `phi` coordinates.
pub fn pack_scattering_matrix(
    matrices: Array3<Complex64>,
    positions: &Positions,
    schema: &Schema,
) -> Result<LabeledArray<Complex64>, ScatteringError> {
    let view = flat(&schema.detector);
    let dim = classify(&view)?.dim();
    let n = view.dim_len(dim).unwrap_or(0);
    if matrices.shape() != [n, 2, 2] || positions.len() != n {
        return Err(ScatteringError::ShapeMismatch(format!(
            "{} matrices at {} positions for {n} detector points",
            matrices.shape()[0],
            positions.len()
        )));
    }

    let rtp = positions.to_system(CoordinateSystem::Spherical);
    let mut packed = LabeledArray::new(matrices.into_dyn(), &[dim, EPAR, EPERP])?;
    for (name, coord) in view.coords() {
        packed = packed.with_coord(name, coord.clone())?;
    }
    for (i, name) in ["r", "theta", "phi"].into_iter().enumerate() {
        let column: Array1<f64> = rtp.component(i).to_owned();
        packed = packed.with_coord(name, Coordinate::along(dim, column))?;
    }
    Ok(packed
        .with_coord(EPAR, Coordinate::along(EPAR, &["S2", "S3"][..]))?
        .with_coord(EPERP, Coordinate::along(EPERP, &["S4", "S1"][..]))?
        .with_attrs(schema.metadata.clone()))
}

/// Wrap `[scattering, absorption, extinction, asymmetry]`.
pub fn pack_cross_sections(raw: [f64; 4]) -> Result<LabeledArray<f64>, ScatteringError> {
    LabeledArray::new(Array1::from(raw.to_vec()).into_dyn(), &[CROSS_SECTION])?
        .with_coord(CROSS_SECTION, Coordinate::along(CROSS_SECTION, &CROSS_SECTION_LABELS[..]))
}
