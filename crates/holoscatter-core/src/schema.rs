//! Illumination metadata and calculation schemas.
//!
//! A [`Schema`] pairs a detector geometry with the [`Metadata`] needed to
//! compute anything on it: the medium index and the illumination, which is
//! either a single color or a list of labeled colors each with its own
//! wavelength and polarization.
//!
//! The wavevector in the medium for a color of vacuum wavelength $\lambda$ is
//!
//! $$ k = \frac{2\pi}{\lambda / n_{med}} $$

use std::f64::consts::PI;

use crate::detector::DetectorView;
use crate::error::ScatteringError;

/// Wavevector in a medium of index `medium_index`.
pub fn get_wavevec(wavelength: f64, medium_index: f64) -> f64 {
    2.0 * PI / (wavelength / medium_index)
}

/// Wavelength argument of [`prep_schema`].
#[derive(Debug, Clone, PartialEq)]
pub enum Wavelength {
    Single(f64),
    Labeled(Vec<(String, f64)>),
    /// A list of wavelengths labeled by their own formatted values.
    Unlabeled(Vec<f64>),
}

impl From<f64> for Wavelength {
    fn from(w: f64) -> Self {
        Wavelength::Single(w)
    }
}

/// Polarization argument of [`prep_schema`].
///
/// Vectors may have 2 (x, y) or 3 (x, y, z) components.
#[derive(Debug, Clone, PartialEq)]
pub enum Polarization {
    Single(Vec<f64>),
    Labeled(Vec<(String, Vec<f64>)>),
}

impl From<[f64; 2]> for Polarization {
    fn from(p: [f64; 2]) -> Self {
        Polarization::Single(p.to_vec())
    }
}

impl From<[f64; 3]> for Polarization {
    fn from(p: [f64; 3]) -> Self {
        Polarization::Single(p.to_vec())
    }
}

/// One labeled illumination color.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub label: String,
    pub wavelength: f64,
    pub polarization: Option<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Illumination {
    Single {
        wavelength: f64,
        polarization: Option<[f64; 3]>,
    },
    Multi(Vec<Color>),
}

/// Physical parameters attached to a schema and to every packed result.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub medium_index: f64,
    pub illumination: Illumination,
}

/// A detector geometry plus the illumination it is observed under.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub detector: DetectorView,
    pub metadata: Metadata,
}

impl Schema {
    pub fn new(detector: DetectorView, metadata: Metadata) -> Self {
        Self { detector, metadata }
    }

    pub fn medium_index(&self) -> f64 {
        self.metadata.medium_index
    }

    pub fn illumination(&self) -> &Illumination {
        &self.metadata.illumination
    }

    /// The labeled colors, or `None` for single-color illumination.
    pub fn colors(&self) -> Option<&[Color]> {
        match &self.metadata.illumination {
            Illumination::Multi(colors) => Some(colors),
            Illumination::Single { .. } => None,
        }
    }

    pub fn is_multicolor(&self) -> bool {
        self.colors().is_some()
    }

    pub fn wavelength(&self) -> Result<f64, ScatteringError> {
        match &self.metadata.illumination {
            Illumination::Single { wavelength, .. } => Ok(*wavelength),
            Illumination::Multi(_) => Err(ScatteringError::InvalidParameter(
                "schema has several illumination colors; select one first".into(),
            )),
        }
    }

    /// Wavevector in the medium, for single-color schemas.
    pub fn wavevector(&self) -> Result<f64, ScatteringError> {
        Ok(get_wavevec(self.wavelength()?, self.medium_index()))
    }

    /// Incident polarization, for single-color schemas.
    pub fn polarization(&self) -> Result<[f64; 3], ScatteringError> {
        match &self.metadata.illumination {
            Illumination::Single {
                polarization: Some(p),
                ..
            } => Ok(*p),
            Illumination::Single { polarization: None, .. } => {
                Err(ScatteringError::MissingParameter("polarization".into()))
            }
            Illumination::Multi(_) => Err(ScatteringError::InvalidParameter(
                "schema has several illumination colors; select one first".into(),
            )),
        }
    }

    /// A copy of this schema lit by `color` alone.
    pub fn with_single_color(&self, color: &Color) -> Schema {
        Schema {
            detector: self.detector.clone(),
            metadata: Metadata {
                medium_index: self.metadata.medium_index,
                illumination: Illumination::Single {
                    wavelength: color.wavelength,
                    polarization: color.polarization,
                },
            },
        }
    }
}

/// Build a schema, validating and broadcasting the illumination parameters.
///
/// Medium index, wavelength and polarization are all required. A scalar
/// wavelength or polarization is shared by every color of the other
/// argument; two labeled arguments must name the same colors. If only one
/// color results, the schema is single-color.
pub fn prep_schema(
    detector: DetectorView,
    medium_index: Option<f64>,
    wavelength: Option<Wavelength>,
    polarization: Option<Polarization>,
) -> Result<Schema, ScatteringError> {
    let polarization =
        polarization.ok_or_else(|| ScatteringError::MissingParameter("polarization".into()))?;
    build_schema(detector, medium_index, wavelength, Some(polarization))
}

/// Like [`prep_schema`], for calculations that do not depend on polarization.
pub(crate) fn prep_unpolarized_schema(
    detector: DetectorView,
    medium_index: Option<f64>,
    wavelength: Option<Wavelength>,
) -> Result<Schema, ScatteringError> {
    build_schema(detector, medium_index, wavelength, None)
}

enum PerColor<T> {
    Shared(T),
    Labeled(Vec<(String, T)>),
}

fn build_schema(
    detector: DetectorView,
    medium_index: Option<f64>,
    wavelength: Option<Wavelength>,
    polarization: Option<Polarization>,
) -> Result<Schema, ScatteringError> {
    let medium_index =
        medium_index.ok_or_else(|| ScatteringError::MissingParameter("medium_index".into()))?;
    let wavelength =
        wavelength.ok_or_else(|| ScatteringError::MissingParameter("wavelength".into()))?;
    if !(medium_index > 0.0) {
        return Err(ScatteringError::InvalidParameter(format!(
            "medium index must be positive, got {medium_index}"
        )));
    }

    let wavelengths = match wavelength {
        Wavelength::Single(w) => PerColor::Shared(w),
        Wavelength::Labeled(ws) => PerColor::Labeled(ws),
        Wavelength::Unlabeled(ws) => {
            PerColor::Labeled(ws.into_iter().map(|w| (format!("{w}"), w)).collect())
        }
    };
    let polarizations = match polarization {
        None => PerColor::Shared(None),
        Some(Polarization::Single(p)) => PerColor::Shared(Some(as_vector(&p)?)),
        Some(Polarization::Labeled(ps)) => PerColor::Labeled(
            ps.into_iter()
                .map(|(l, p)| Ok((l, Some(as_vector(&p)?))))
                .collect::<Result<_, ScatteringError>>()?,
        ),
    };

    let mut colors = match (wavelengths, polarizations) {
        (PerColor::Shared(wavelength), PerColor::Shared(polarization)) => {
            check_wavelength(wavelength)?;
            return Ok(Schema::new(
                detector,
                Metadata {
                    medium_index,
                    illumination: Illumination::Single {
                        wavelength,
                        polarization,
                    },
                },
            ));
        }
        (PerColor::Labeled(ws), PerColor::Shared(polarization)) => ws
            .into_iter()
            .map(|(label, wavelength)| Color {
                label,
                wavelength,
                polarization,
            })
            .collect::<Vec<_>>(),
        (PerColor::Shared(wavelength), PerColor::Labeled(ps)) => ps
            .into_iter()
            .map(|(label, polarization)| Color {
                label,
                wavelength,
                polarization,
            })
            .collect(),
        (PerColor::Labeled(ws), PerColor::Labeled(ps)) => {
            if ws.len() != ps.len() {
                return Err(ScatteringError::InvalidParameter(format!(
                    "{} wavelengths but {} polarizations",
                    ws.len(),
                    ps.len()
                )));
            }
            ws.into_iter()
                .map(|(label, wavelength)| {
                    let polarization = ps
                        .iter()
                        .find(|(l, _)| *l == label)
                        .map(|(_, p)| *p)
                        .ok_or_else(|| {
                            ScatteringError::InvalidParameter(format!(
                                "no polarization given for illumination '{label}'"
                            ))
                        })?;
                    Ok(Color {
                        label,
                        wavelength,
                        polarization,
                    })
                })
                .collect::<Result<_, ScatteringError>>()?
        }
    };

    for (i, c) in colors.iter().enumerate() {
        check_wavelength(c.wavelength)?;
        if colors[..i].iter().any(|o| o.label == c.label) {
            return Err(ScatteringError::InvalidParameter(format!(
                "illumination label '{}' appears twice",
                c.label
            )));
        }
    }

    let illumination = match colors.len() {
        0 => {
            return Err(ScatteringError::InvalidParameter(
                "illumination needs at least one color".into(),
            ))
        }
        1 => {
            let c = colors.remove(0);
            Illumination::Single {
                wavelength: c.wavelength,
                polarization: c.polarization,
            }
        }
        _ => Illumination::Multi(colors),
    };

    Ok(Schema::new(
        detector,
        Metadata {
            medium_index,
            illumination,
        },
    ))
}

fn check_wavelength(wavelength: f64) -> Result<(), ScatteringError> {
    if wavelength > 0.0 && wavelength.is_finite() {
        Ok(())
    } else {
        Err(ScatteringError::InvalidParameter(format!(
            "wavelength must be positive, got {wavelength}"
        )))
    }
}

fn as_vector(p: &[f64]) -> Result<[f64; 3], ScatteringError> {
    match *p {
        [x, y] => Ok([x, y, 0.0]),
        [x, y, z] => Ok([x, y, z]),
        _ => Err(ScatteringError::InvalidParameter(format!(
            "polarization must have 2 or 3 components, got {}",
            p.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::detector_grid;

    fn grid() -> DetectorView {
        detector_grid([2, 2], 0.1).unwrap()
    }

    #[test]
    fn test_wavevector_in_medium() {
        let k = get_wavevec(0.66, 1.33);
        assert!((k - 2.0 * PI * 1.33 / 0.66).abs() < 1e-12);
    }

    #[test]
    fn test_missing_parameters() {
        let err = prep_schema(grid(), None, Some(0.66.into()), Some([1.0, 0.0].into()));
        assert!(matches!(err, Err(ScatteringError::MissingParameter(p)) if p == "medium_index"));
        let err = prep_schema(grid(), Some(1.33), None, Some([1.0, 0.0].into()));
        assert!(matches!(err, Err(ScatteringError::MissingParameter(p)) if p == "wavelength"));
        let err = prep_schema(grid(), Some(1.33), Some(0.66.into()), None);
        assert!(matches!(err, Err(ScatteringError::MissingParameter(p)) if p == "polarization"));
    }

    #[test]
    fn test_single_color() {
        let s = prep_schema(grid(), Some(1.33), Some(0.66.into()), Some([0.0, 1.0].into())).unwrap();
        assert!(!s.is_multicolor());
        assert_eq!(s.polarization().unwrap(), [0.0, 1.0, 0.0]);
        assert!((s.wavelength().unwrap() - 0.66).abs() < 1e-15);
    }

    #[test]
    fn test_multicolor_from_polarization() {
        let pol = Polarization::Labeled(vec![
            ("red".into(), vec![1.0, 0.0]),
            ("green".into(), vec![0.0, 1.0]),
        ]);
        let s = prep_schema(grid(), Some(1.33), Some(0.66.into()), Some(pol)).unwrap();
        let colors = s.colors().unwrap();
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[1].label, "green");
        assert_eq!(colors[1].wavelength, 0.66);
        assert_eq!(colors[1].polarization, Some([0.0, 1.0, 0.0]));
        assert!(s.wavevector().is_err());
    }

    #[test]
    fn test_multicolor_from_unlabeled_wavelengths() {
        let s = prep_schema(
            grid(),
            Some(1.33),
            Some(Wavelength::Unlabeled(vec![0.5, 0.7])),
            Some([1.0, 0.0].into()),
        )
        .unwrap();
        let labels: Vec<&str> = s.colors().unwrap().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["0.5", "0.7"]);
    }

    #[test]
    fn test_labeled_sets_must_agree() {
        let err = prep_schema(
            grid(),
            Some(1.33),
            Some(Wavelength::Labeled(vec![("red".into(), 0.66), ("blue".into(), 0.45)])),
            Some(Polarization::Labeled(vec![
                ("red".into(), vec![1.0, 0.0]),
                ("green".into(), vec![0.0, 1.0]),
            ])),
        );
        assert!(matches!(err, Err(ScatteringError::InvalidParameter(_))));
    }

    #[test]
    fn test_one_labeled_color_collapses_to_single() {
        let s = prep_schema(
            grid(),
            Some(1.33),
            Some(Wavelength::Labeled(vec![("red".into(), 0.66)])),
            Some([1.0, 0.0].into()),
        )
        .unwrap();
        assert!(!s.is_multicolor());
    }

    #[test]
    fn test_bad_polarization_length() {
        let err = prep_schema(
            grid(),
            Some(1.33),
            Some(0.66.into()),
            Some(Polarization::Single(vec![1.0])),
        );
        assert!(matches!(err, Err(ScatteringError::InvalidParameter(_))));
    }

    #[test]
    fn test_unpolarized_schema_has_no_polarization() {
        let s = prep_unpolarized_schema(grid(), Some(1.33), Some(0.66.into())).unwrap();
        assert!(matches!(s.polarization(), Err(ScatteringError::MissingParameter(_))));
        assert!(s.wavevector().is_ok());
    }
}
