//! Detector geometries and their 1D point views.
//!
//! A detector is a [`LabeledArray`] whose coordinates say where each pixel or
//! observation point sits. Two layouts occur in practice:
//!
//! - **Grids** with dims `x`, `y` and a scalar `z` coordinate (camera images).
//! - **Point lists** with a single `point` dim carrying `x`, `y`, `z` or
//!   `r`, `theta`, `phi` coordinates.
//!
//! Calculations work on a 1D view of the detector: a point list as-is, or a
//! grid collapsed into a `flat` dimension by [`flat`].

use ndarray::{Array1, Array2};

use crate::error::ScatteringError;
use crate::labeled::{Coordinate, LabeledArray, FLAT, POINT};

/// A detector geometry (values are placeholders; the coordinates matter).
pub type DetectorView = LabeledArray<f64>;

/// How a 1D detector view is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Point,
    Flat,
}

impl ViewKind {
    /// Name of the indexing dimension.
    pub fn dim(&self) -> &'static str {
        match self {
            ViewKind::Point => POINT,
            ViewKind::Flat => FLAT,
        }
    }
}

/// A rectangular grid of pixels in the `z = 0` plane.
///
/// Pixel `(i, j)` sits at `x = i·spacing`, `y = j·spacing`.
pub fn detector_grid(shape: [usize; 2], spacing: f64) -> Result<DetectorView, ScatteringError> {
    let [nx, ny] = shape;
    if nx == 0 || ny == 0 {
        return Err(ScatteringError::InvalidDetector(format!(
            "grid shape {shape:?} has no pixels"
        )));
    }
    let x: Vec<f64> = (0..nx).map(|i| i as f64 * spacing).collect();
    let y: Vec<f64> = (0..ny).map(|j| j as f64 * spacing).collect();
    LabeledArray::new(Array2::zeros((nx, ny)).into_dyn(), &["x", "y"])?
        .with_coord("x", Coordinate::along("x", x))?
        .with_coord("y", Coordinate::along("y", y))?
        .with_coord("z", Coordinate::scalar(0.0))
}

/// An explicit list of Cartesian observation points.
pub fn detector_points(
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
) -> Result<DetectorView, ScatteringError> {
    point_list(vec![("x", x), ("y", y), ("z", z)])
}

/// An explicit list of observation directions, optionally with distances.
///
/// Without `r` the points are taken to be in the far field.
pub fn detector_points_spherical(
    r: Option<Vec<f64>>,
    theta: Vec<f64>,
    phi: Vec<f64>,
) -> Result<DetectorView, ScatteringError> {
    let mut columns = Vec::with_capacity(3);
    if let Some(r) = r {
        columns.push(("r", r));
    }
    columns.push(("theta", theta));
    columns.push(("phi", phi));
    point_list(columns)
}

fn point_list(columns: Vec<(&str, Vec<f64>)>) -> Result<DetectorView, ScatteringError> {
    let n = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
    if let Some((name, c)) = columns.iter().find(|(_, c)| c.len() != n) {
        return Err(ScatteringError::InvalidDetector(format!(
            "coordinate '{name}' has {} points, expected {n}",
            c.len()
        )));
    }
    let mut view = LabeledArray::new(Array1::zeros(n).into_dyn(), &[POINT])?;
    for (name, values) in columns {
        view = view.with_coord(name, Coordinate::along(POINT, values))?;
    }
    Ok(view)
}

/// Decide whether a set of dimension names describes a point or flat view.
///
/// `flat` takes precedence over `point`; anything else has not been
/// flattened yet.
pub fn classify_dims<S: AsRef<str>>(dims: &[S]) -> Result<ViewKind, ScatteringError> {
    if dims.iter().any(|d| d.as_ref() == FLAT) {
        Ok(ViewKind::Flat)
    } else if dims.iter().any(|d| d.as_ref() == POINT) {
        Ok(ViewKind::Point)
    } else {
        Err(ScatteringError::InvalidDetector(
            "detector view is not a 1D list of coordinates; call `flat` first".into(),
        ))
    }
}

/// Classify an array by its dimension names.
pub fn classify<T>(view: &LabeledArray<T>) -> Result<ViewKind, ScatteringError> {
    classify_dims(view.dims())
}

/// The 1D view of a detector.
///
/// Point and already-flat views keep their layout, with scalar coordinates
/// repeated once per point; anything else is collapsed into a `flat`
/// dimension in row-major order.
pub fn flat(detector: &DetectorView) -> DetectorView {
    if detector.has_dim(FLAT) {
        detector.with_scalars_along(FLAT)
    } else if detector.has_dim(POINT) {
        detector.with_scalars_along(POINT)
    } else {
        detector.stacked(FLAT)
    }
}
