//! Theory selection.
//!
//! Callers name a theory by instance, by class, or not at all. When no theory
//! is given the scatterer's geometric class is looked up in a static registry.

use std::fmt;
use std::sync::Arc;

use holoscatter_geometry::{Scatterer, ScattererKind};
use log::debug;

use crate::error::ScatteringError;
use crate::theory::{ScatteringTheory, TheoryKind};

/// Default theory class for each scatterer class that has one.
pub const DEFAULT_THEORIES: &[(ScattererKind, TheoryKind)] = &[
    (ScattererKind::Sphere, TheoryKind::Mie),
    (ScattererKind::LayeredSphere, TheoryKind::Mie),
    (ScattererKind::Spheres, TheoryKind::Multisphere),
    (ScattererKind::Spheroid, TheoryKind::Tmatrix),
    (ScattererKind::Cylinder, TheoryKind::Tmatrix),
];

/// How a calculation names its theory.
#[derive(Clone, Default)]
pub enum TheoryChoice {
    /// Pick the registered default for the scatterer.
    #[default]
    Auto,
    /// The default instance of a theory class.
    Class(TheoryKind),
    /// A configured instance, used as-is.
    Instance(Arc<dyn ScatteringTheory>),
}

impl fmt::Debug for TheoryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheoryChoice::Auto => f.write_str("Auto"),
            TheoryChoice::Class(kind) => f.debug_tuple("Class").field(kind).finish(),
            TheoryChoice::Instance(theory) => f.debug_tuple("Instance").field(theory).finish(),
        }
    }
}

impl From<TheoryKind> for TheoryChoice {
    fn from(kind: TheoryKind) -> Self {
        TheoryChoice::Class(kind)
    }
}

impl<T: ScatteringTheory + 'static> From<Arc<T>> for TheoryChoice {
    fn from(theory: Arc<T>) -> Self {
        TheoryChoice::Instance(theory)
    }
}

/// Registered default theory class for `scatterer`.
pub fn determine_default_theory_for(scatterer: &Scatterer) -> Result<TheoryKind, ScatteringError> {
    let kind = scatterer.kind();
    DEFAULT_THEORIES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, theory)| *theory)
        .ok_or_else(|| ScatteringError::UnsupportedScatterer(kind.to_string()))
}

/// Resolve a theory choice into an instance.
///
/// No compatibility check happens here; the computation core reports
/// incompatible scatterers when it is asked to do something with them.
pub fn interpret_theory(
    scatterer: &Scatterer,
    choice: &TheoryChoice,
) -> Result<Arc<dyn ScatteringTheory>, ScatteringError> {
    let theory = match choice {
        TheoryChoice::Auto => determine_default_theory_for(scatterer)?.instantiate(),
        TheoryChoice::Class(kind) => kind.instantiate(),
        TheoryChoice::Instance(theory) => Arc::clone(theory),
    };
    debug!("Using {} theory for {}", theory.name(), scatterer);
    Ok(theory)
}

/// Reject theories that can compute neither fields nor scattering matrices.
pub fn check_kernels(theory: &dyn ScatteringTheory) -> Result<(), ScatteringError> {
    if theory.kernels().can_compute_fields() {
        Ok(())
    } else {
        Err(ScatteringError::Configuration(format!(
            "{} provides neither raw fields nor scattering matrices; \
             construct it with a numeric kernel",
            theory.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::Mie;
    use holoscatter_geometry::{Cylinder, Ellipsoid, LayeredSphere, Primitive, Sphere, Spheroid};

    fn sphere() -> Scatterer {
        Sphere::new(1.59, 0.5, [5.0, 5.0, 5.0]).into()
    }

    #[test]
    fn test_default_theories() {
        assert_eq!(determine_default_theory_for(&sphere()).unwrap(), TheoryKind::Mie);

        let layered = Primitive::LayeredSphere(
            LayeredSphere::new(vec![1.5.into(), 1.6.into()], vec![0.2, 0.1], Some([0.0; 3]))
                .unwrap(),
        );
        assert_eq!(determine_default_theory_for(&layered.into()).unwrap(), TheoryKind::Mie);

        let cluster = Scatterer::spheres(vec![
            Sphere::new(1.59, 0.5, [0.0; 3]),
            Sphere::new(1.59, 0.5, [1.0, 0.0, 0.0]),
        ]);
        assert_eq!(determine_default_theory_for(&cluster).unwrap(), TheoryKind::Multisphere);

        let spheroid = Primitive::Spheroid(Spheroid {
            n: 1.5.into(),
            r: [0.5, 1.0],
            rotation: [0.0; 3],
            center: None,
        });
        assert_eq!(determine_default_theory_for(&spheroid.into()).unwrap(), TheoryKind::Tmatrix);

        let cylinder = Primitive::Cylinder(Cylinder {
            n: 1.5.into(),
            d: 1.0,
            h: 2.0,
            rotation: [0.0; 3],
            center: None,
        });
        assert_eq!(determine_default_theory_for(&cylinder.into()).unwrap(), TheoryKind::Tmatrix);
    }

    #[test]
    fn test_unregistered_scatterer_is_unsupported() {
        let ellipsoid: Scatterer = Primitive::Ellipsoid(Ellipsoid {
            n: 1.5.into(),
            r: [0.5, 1.0, 1.5],
            rotation: [0.0; 3],
            center: None,
        })
        .into();
        assert!(matches!(
            determine_default_theory_for(&ellipsoid),
            Err(ScatteringError::UnsupportedScatterer(k)) if k == "Ellipsoid"
        ));
        let mixed = Scatterer::Composite(vec![sphere(), ellipsoid]);
        assert!(determine_default_theory_for(&mixed).is_err());
    }

    #[test]
    fn test_interpret_theory() {
        let auto = interpret_theory(&sphere(), &TheoryChoice::Auto).unwrap();
        assert_eq!(auto.kind(), TheoryKind::Mie);

        let by_class = interpret_theory(&sphere(), &TheoryKind::Tmatrix.into()).unwrap();
        assert_eq!(by_class.kind(), TheoryKind::Tmatrix);

        let configured: Arc<dyn ScatteringTheory> = Arc::new(Mie::with_max_order(4));
        let chosen = TheoryChoice::Instance(Arc::clone(&configured));
        let resolved = interpret_theory(&sphere(), &chosen).unwrap();
        assert!(Arc::ptr_eq(&resolved, &configured));
    }

    #[test]
    fn test_check_kernels() {
        assert!(check_kernels(&Mie::new()).is_ok());
        let bare = TheoryKind::Multisphere.instantiate();
        assert!(matches!(
            check_kernels(bare.as_ref()),
            Err(ScatteringError::Configuration(_))
        ));
    }
}
