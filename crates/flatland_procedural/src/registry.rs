//! # Manipulator Registry
//!
//! Named terrain transformations registered once at startup and dispatched
//! by name with a string parameter bag.
//!
//! ## Execution Contract
//!
//! 1. The region is validated against the flat.
//! 2. The name is resolved; unknown names list every registered one.
//! 3. The manipulator runs on a working copy of the flat.
//! 4. Only a successful run is committed back, so a failed call leaves the
//!    flat untouched.

use std::collections::BTreeMap;

use flatland_core::{Flat, FlatError, FlatResult};

use crate::painter::Painter;
use crate::params::Params;
use crate::region::Region;

/// Everything a manipulator sees during one call.
pub struct ManipulatorContext<'a> {
    /// Working copy of the flat.
    pub flat: &'a mut Flat,
    /// Region to operate on, already validated.
    pub region: Region,
    registry: &'a ManipulatorRegistry,
}

impl<'a> ManipulatorContext<'a> {
    /// Painter clipped to the call's region.
    pub fn painter(&mut self) -> Painter<'_> {
        Painter::new(self.flat, self.region)
    }

    /// The registry that dispatched this call, for meta-manipulators.
    #[must_use]
    pub fn registry(&self) -> &'a ManipulatorRegistry {
        self.registry
    }
}

/// A named, region-scoped terrain transformation.
///
/// Implementations parse their typed configuration from `params` at the
/// start of [`Manipulator::apply`], clamping out-of-range values.
pub trait Manipulator: Send + Sync {
    /// Registry name, e.g. `"crater"`.
    fn name(&self) -> &str;

    /// Transforms `ctx.flat` inside `ctx.region` and returns a short summary.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidArgument`] for malformed required parameters.
    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String>;
}

/// Name to manipulator table.
#[derive(Default)]
pub struct ManipulatorRegistry {
    manipulators: BTreeMap<String, Box<dyn Manipulator>>,
}

impl ManipulatorRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in manipulator.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::manipulators::register_defaults(&mut registry);
        registry
    }

    /// Registers a manipulator. Returns `Ok(false)` when the name was taken;
    /// the first registration stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidArgument`] for a blank name.
    pub fn register(&mut self, manipulator: Box<dyn Manipulator>) -> FlatResult<bool> {
        let name = manipulator.name().trim().to_string();
        if name.is_empty() {
            return Err(FlatError::invalid("manipulator name must not be blank"));
        }
        if self.manipulators.contains_key(&name) {
            tracing::warn!(name = %name, "duplicate manipulator registration ignored");
            return Ok(false);
        }
        self.manipulators.insert(name, manipulator);
        Ok(true)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.manipulators.keys().map(String::as_str)
    }

    /// Looks up a manipulator.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Manipulator> {
        self.manipulators.get(name).map(Box::as_ref)
    }

    /// Number of registered manipulators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.manipulators.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manipulators.is_empty()
    }

    /// Runs a manipulator over a region of `flat`.
    ///
    /// # Errors
    ///
    /// - [`FlatError::InvalidRegion`] if the region does not fit the flat
    /// - [`FlatError::UnknownManipulator`] if `name` is not registered
    /// - [`FlatError::ManipulatorFailed`] wrapping the manipulator's own error
    ///
    /// `flat` is unchanged in every error case.
    pub fn execute(
        &self,
        name: &str,
        flat: &mut Flat,
        region: Region,
        params: &Params,
    ) -> FlatResult<String> {
        region.validate(flat)?;
        let manipulator = self.get(name).ok_or_else(|| FlatError::UnknownManipulator {
            name: name.to_string(),
            known: self.names().collect::<Vec<_>>().join(", "),
        })?;

        let mut work = flat.clone();
        let mut ctx = ManipulatorContext {
            flat: &mut work,
            region,
            registry: self,
        };
        match manipulator.apply(&mut ctx, params) {
            Ok(summary) => {
                *flat = work;
                tracing::debug!(manipulator = name, flat = flat.id(), %summary, "manipulator applied");
                Ok(summary)
            }
            Err(source) => Err(FlatError::ManipulatorFailed {
                name: name.to_string(),
                source: Box::new(source),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fill(&'static str, u8);

    impl Manipulator for Fill {
        fn name(&self) -> &str {
            self.0
        }

        fn apply(&self, ctx: &mut ManipulatorContext<'_>, _params: &Params) -> FlatResult<String> {
            let region = ctx.region;
            ctx.painter()
                .fill_rectangle(region.x, region.z, region.max_x(), region.max_z(), i32::from(self.1));
            Ok("filled".into())
        }
    }

    struct HalfwayFailure;

    impl Manipulator for HalfwayFailure {
        fn name(&self) -> &str {
            "broken"
        }

        fn apply(&self, ctx: &mut ManipulatorContext<'_>, _params: &Params) -> FlatResult<String> {
            ctx.painter().fill_rectangle(0, 0, 3, 3, 99);
            Err(FlatError::invalid("boom"))
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = ManipulatorRegistry::new();
        assert!(registry.register(Box::new(Fill("fill", 1))).unwrap());
        assert!(!registry.register(Box::new(Fill("fill", 2))).unwrap());
        assert!(registry.register(Box::new(Fill("  ", 3))).is_err());
        assert_eq!(registry.len(), 1);

        let mut flat = Flat::new("w", "l", "f", 4, 4);
        registry
            .execute("fill", &mut flat, Region::new(0, 0, 4, 4), &Params::new())
            .unwrap();
        assert_eq!(flat.level(2, 2), 1);
    }

    #[test]
    fn test_unknown_name_lists_known() {
        let mut registry = ManipulatorRegistry::new();
        registry.register(Box::new(Fill("alpha", 1))).unwrap();
        registry.register(Box::new(Fill("beta", 1))).unwrap();
        let mut flat = Flat::new("w", "l", "f", 4, 4);
        let err = registry
            .execute("gamma", &mut flat, Region::new(0, 0, 4, 4), &Params::new())
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("alpha, beta"));
    }

    #[test]
    fn test_invalid_region_leaves_flat_unchanged() {
        let mut registry = ManipulatorRegistry::new();
        registry.register(Box::new(Fill("fill", 7))).unwrap();
        let mut flat = Flat::new("w", "l", "f", 4, 4);
        let before = flat.clone();
        let err = registry
            .execute("fill", &mut flat, Region::new(1, 0, 4, 4), &Params::new())
            .unwrap_err();
        assert!(matches!(err, FlatError::InvalidRegion { .. }));
        assert_eq!(flat, before);
    }

    #[test]
    fn test_failure_is_wrapped_and_rolled_back() {
        let mut registry = ManipulatorRegistry::new();
        registry.register(Box::new(HalfwayFailure)).unwrap();
        let mut flat = Flat::new("w", "l", "f", 4, 4);
        let before = flat.clone();
        let err = registry
            .execute("broken", &mut flat, Region::new(0, 0, 4, 4), &Params::new())
            .unwrap_err();
        assert!(matches!(err, FlatError::ManipulatorFailed { ref name, .. } if name == "broken"));
        assert!(err.is_invalid_argument());
        assert_eq!(flat, before);
    }

    #[test]
    fn test_defaults_are_registered() {
        let registry = ManipulatorRegistry::with_defaults();
        for name in ["flat", "normal", "hilly", "mountain", "crater", "composition", "set-material"] {
            assert!(registry.get(name).is_some(), "{name} missing");
        }
    }
}
