//! TOML settings for scattering calculations.
//!
//! ```toml
//! theory = "mie"
//! scaling = 0.9
//!
//! [mie]
//! max_order = 40
//!
//! [illumination]
//! medium_index = 1.33
//! wavelength = 0.66
//! polarization = [1.0, 0.0]
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatch::TheoryChoice;
use crate::error::ScatteringError;
use crate::schema::{Polarization, Wavelength};
use crate::theory::{Mie, TheoryKind};

/// Theory selection in settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TheorySetting {
    #[default]
    Auto,
    Mie,
    Multisphere,
    Tmatrix,
}

/// Top-level calculation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcSettings {
    #[serde(default)]
    pub theory: TheorySetting,
    /// Scattered-field scaling used by holograms (default: 1.0).
    #[serde(default = "default_scaling")]
    pub scaling: f64,
    #[serde(default)]
    pub mie: MieSettings,
    #[serde(default)]
    pub illumination: IlluminationSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MieSettings {
    #[serde(default)]
    pub max_order: Option<usize>,
}

/// Optional defaults for the illumination parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IlluminationSettings {
    #[serde(default)]
    pub medium_index: Option<f64>,
    #[serde(default)]
    pub wavelength: Option<WavelengthSpec>,
    #[serde(default)]
    pub polarization: Option<Vec<f64>>,
}

/// A single wavelength or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WavelengthSpec {
    Single(f64),
    List(Vec<f64>),
}

fn default_scaling() -> f64 {
    1.0
}

impl Default for CalcSettings {
    fn default() -> Self {
        Self {
            theory: TheorySetting::Auto,
            scaling: default_scaling(),
            mie: MieSettings::default(),
            illumination: IlluminationSettings::default(),
        }
    }
}

impl CalcSettings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ScatteringError> {
        let settings: CalcSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ScatteringError> {
        if !self.scaling.is_finite() {
            return Err(ScatteringError::Configuration(format!(
                "scaling must be finite, got {}",
                self.scaling
            )));
        }
        if self.mie.max_order == Some(0) {
            return Err(ScatteringError::Configuration(
                "mie.max_order must be at least 1".into(),
            ));
        }
        if let Some(p) = &self.illumination.polarization {
            if !(2..=3).contains(&p.len()) {
                return Err(ScatteringError::Configuration(format!(
                    "illumination.polarization must have 2 or 3 components, got {}",
                    p.len()
                )));
            }
        }
        Ok(())
    }

    /// The theory these settings ask for.
    pub fn theory_choice(&self) -> TheoryChoice {
        match self.theory {
            TheorySetting::Auto => TheoryChoice::Auto,
            TheorySetting::Mie => match self.mie.max_order {
                Some(n) => TheoryChoice::Instance(Arc::new(Mie::with_max_order(n))),
                None => TheoryChoice::Class(TheoryKind::Mie),
            },
            TheorySetting::Multisphere => TheoryChoice::Class(TheoryKind::Multisphere),
            TheorySetting::Tmatrix => TheoryChoice::Class(TheoryKind::Tmatrix),
        }
    }

    pub fn wavelength(&self) -> Option<Wavelength> {
        self.illumination.wavelength.as_ref().map(|w| match w {
            WavelengthSpec::Single(w) => Wavelength::Single(*w),
            WavelengthSpec::List(ws) => Wavelength::Unlabeled(ws.clone()),
        })
    }

    pub fn polarization(&self) -> Option<Polarization> {
        self.illumination
            .polarization
            .as_ref()
            .map(|p| Polarization::Single(p.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::ScatteringTheory;

    #[test]
    fn test_defaults() {
        let s = CalcSettings::from_toml_str("").unwrap();
        assert_eq!(s, CalcSettings::default());
        assert_eq!(s.scaling, 1.0);
        assert!(matches!(s.theory_choice(), TheoryChoice::Auto));
    }

    #[test]
    fn test_full_settings() {
        let s = CalcSettings::from_toml_str(
            r#"
            theory = "mie"
            scaling = 0.8

            [mie]
            max_order = 12

            [illumination]
            medium_index = 1.33
            wavelength = [0.5, 0.66]
            polarization = [0.0, 1.0]
            "#,
        )
        .unwrap();
        assert_eq!(s.scaling, 0.8);
        match s.theory_choice() {
            TheoryChoice::Instance(theory) => assert_eq!(theory.name(), "Mie"),
            other => panic!("expected a configured Mie instance, got {other:?}"),
        }
        assert_eq!(s.wavelength(), Some(Wavelength::Unlabeled(vec![0.5, 0.66])));
        assert_eq!(s.polarization(), Some(Polarization::Single(vec![0.0, 1.0])));
    }

    #[test]
    fn test_theory_class() {
        let s = CalcSettings::from_toml_str("theory = \"tmatrix\"").unwrap();
        assert!(matches!(s.theory_choice(), TheoryChoice::Class(TheoryKind::Tmatrix)));
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            CalcSettings::from_toml_str("theory = \"dda\""),
            Err(ScatteringError::Settings(_))
        ));
        assert!(matches!(
            CalcSettings::from_toml_str("[mie]\nmax_order = 0"),
            Err(ScatteringError::Configuration(_))
        ));
        assert!(matches!(
            CalcSettings::from_toml_str("[illumination]\npolarization = [1.0]"),
            Err(ScatteringError::Configuration(_))
        ));
    }
}
