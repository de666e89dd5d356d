//! Errors raised while building or specialising scatterers.

use thiserror::Error;

/// Errors from scatterer construction and illumination selection.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("No refractive index given for illumination '{label}'")]
    MissingIllumination { label: String },

    #[error("Refractive index varies by illumination; select an illumination first")]
    UnresolvedIndex,

    #[error("Invalid scatterer: {0}")]
    InvalidScatterer(String),
}
