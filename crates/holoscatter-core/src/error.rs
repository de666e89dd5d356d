//! Error type shared by every calculation in this crate.

use holoscatter_geometry::GeometryError;
use thiserror::Error;

/// Errors that abort a scattering calculation.
#[derive(Debug, Error)]
pub enum ScatteringError {
    /// A required physical parameter was not supplied.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("{theory} cannot handle scatterer {scatterer}")]
    TheoryNotCompatible { theory: String, scatterer: String },

    /// The detector view is neither a point list, a flattenable grid, nor a
    /// spherical direction list.
    #[error("Invalid detector: {0}")]
    InvalidDetector(String),

    /// No default theory exists for this scatterer class.
    #[error("No default theory for scatterer type {0}; pass a theory explicitly")]
    UnsupportedScatterer(String),

    #[error("{theory} does not implement {kernel}")]
    KernelNotImplemented { theory: String, kernel: &'static str },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] toml::de::Error),
}

impl From<ndarray::ShapeError> for ScatteringError {
    fn from(e: ndarray::ShapeError) -> Self {
        ScatteringError::ShapeMismatch(e.to_string())
    }
}
