//! # Flat Service
//!
//! Entry point for the job layer: load a flat, run one manipulator over a
//! region, persist the result once.
//!
//! Persistence goes through [`FlatRepository::update`], which rejects the
//! write when another caller updated the same flat in between. A failed
//! manipulator or a conflict leaves the stored flat untouched.

use std::fmt;

use flatland_core::{Flat, FlatError, FlatRepository, FlatResult};

use crate::params::Params;
use crate::region::Region;
use crate::registry::ManipulatorRegistry;

/// One manipulator invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManipulateRequest {
    /// Storage id of the flat.
    pub flat_id: String,
    /// Registered manipulator name.
    pub manipulator: String,
    /// Columns to touch; the whole flat when `None`.
    pub region: Option<Region>,
    /// Free-form parameters.
    pub params: Params,
}

impl ManipulateRequest {
    /// Whole-flat request without parameters.
    #[must_use]
    pub fn new(flat_id: impl Into<String>, manipulator: impl Into<String>) -> Self {
        Self {
            flat_id: flat_id.into(),
            manipulator: manipulator.into(),
            region: None,
            params: Params::new(),
        }
    }

    /// Restricts the request to a region.
    #[must_use]
    pub fn in_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Result of a successful invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManipulateOutcome {
    /// Manipulator summary line.
    pub summary: String,
    /// Version of the stored flat after the update.
    pub version: u64,
}

/// Registry plus persistence.
pub struct FlatService<'a> {
    registry: &'a ManipulatorRegistry,
    repository: &'a dyn FlatRepository,
}

impl fmt::Debug for FlatService<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatService")
            .field("manipulators", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<'a> FlatService<'a> {
    /// Binds the service to its collaborators.
    #[must_use]
    pub fn new(registry: &'a ManipulatorRegistry, repository: &'a dyn FlatRepository) -> Self {
        Self { registry, repository }
    }

    /// Loads a flat by storage id.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::NotFound`] for an unknown id.
    pub fn load(&self, flat_id: &str) -> FlatResult<Flat> {
        self.repository
            .find_by_id(flat_id)?
            .ok_or_else(|| FlatError::not_found("flat", flat_id))
    }

    /// Runs one manipulator and persists the flat.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::NotFound`] for an unknown flat, any registry
    /// error (bad region, unknown name, failed manipulator), and
    /// [`FlatError::Conflict`] when the flat changed while running. Nothing
    /// is stored in any of these cases.
    pub fn manipulate(&self, request: &ManipulateRequest) -> FlatResult<ManipulateOutcome> {
        let mut flat = self.load(&request.flat_id)?;
        let region = request.region.unwrap_or_else(|| Region::whole(&flat));

        let summary = match self
            .registry
            .execute(&request.manipulator, &mut flat, region, &request.params)
        {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(
                    flat = %request.flat_id,
                    manipulator = %request.manipulator,
                    error = %err,
                    "manipulation rejected"
                );
                return Err(err);
            }
        };

        let stored = self.repository.update(&flat)?;
        tracing::debug!(
            flat = stored.id(),
            manipulator = %request.manipulator,
            version = stored.version,
            %summary,
            "manipulation stored"
        );
        Ok(ManipulateOutcome {
            summary,
            version: stored.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use flatland_core::material::GRASS;
    use flatland_core::MemoryFlatRepository;

    use super::*;

    fn stored_flat(repository: &MemoryFlatRepository) -> Flat {
        let mut flat = Flat::new("main", "ground", "f", 6, 6);
        flat.ocean_level = 10;
        for z in 0..6 {
            for x in 0..6 {
                flat.set_column(x, z, GRASS);
            }
        }
        repository.create(flat).unwrap()
    }

    #[test]
    fn test_manipulate_persists_and_bumps_version() {
        let repository = MemoryFlatRepository::new();
        let flat = stored_flat(&repository);
        let registry = ManipulatorRegistry::with_defaults();
        let service = FlatService::new(&registry, &repository);

        let request = ManipulateRequest::new(flat.id(), "flat")
            .with_params(Params::new().with("groundLevel", 40));
        let outcome = service.manipulate(&request).unwrap();
        assert_eq!(outcome.version, 2);

        let stored = service.load(flat.id()).unwrap();
        assert!(stored.levels().iter().all(|&l| l == 40));
    }

    #[test]
    fn test_region_limits_the_change() {
        let repository = MemoryFlatRepository::new();
        let flat = stored_flat(&repository);
        let registry = ManipulatorRegistry::with_defaults();
        let service = FlatService::new(&registry, &repository);

        let request = ManipulateRequest::new(flat.id(), "flat")
            .in_region(Region::new(1, 1, 2, 2))
            .with_params(Params::new().with("groundLevel", 50));
        service.manipulate(&request).unwrap();

        let stored = service.load(flat.id()).unwrap();
        assert_eq!(stored.level(1, 1), 50);
        assert_eq!(stored.level(2, 2), 50);
        assert_eq!(stored.level(3, 3), 0);
    }

    #[test]
    fn test_failures_store_nothing() {
        let repository = MemoryFlatRepository::new();
        let flat = stored_flat(&repository);
        let registry = ManipulatorRegistry::with_defaults();
        let service = FlatService::new(&registry, &repository);

        let missing = service.manipulate(&ManipulateRequest::new("main/ground/none", "flat"));
        assert!(matches!(missing, Err(FlatError::NotFound { .. })));

        let unknown = service.manipulate(&ManipulateRequest::new(flat.id(), "terraform"));
        assert!(matches!(unknown, Err(FlatError::UnknownManipulator { .. })));

        let outside = service.manipulate(
            &ManipulateRequest::new(flat.id(), "flat").in_region(Region::new(4, 4, 3, 3)),
        );
        assert!(outside.unwrap_err().is_invalid_argument());

        let stored = service.load(flat.id()).unwrap();
        assert_eq!(stored.version, 1);
        assert!(stored.levels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_concurrent_update_conflicts() {
        let repository = MemoryFlatRepository::new();
        let flat = stored_flat(&repository);
        let registry = ManipulatorRegistry::with_defaults();
        let service = FlatService::new(&registry, &repository);

        // Someone else stores a newer version after our load.
        let mut loaded = service.load(flat.id()).unwrap();
        repository.update(&loaded).unwrap();
        loaded.set_level(0, 0, 9);
        let err = repository.update(&loaded).unwrap_err();
        assert!(matches!(err, FlatError::Conflict { expected: 1, found: 2, .. }));
        assert!(!err.is_invalid_argument());

        // A fresh load goes through.
        let outcome = service.manipulate(&ManipulateRequest::new(flat.id(), "flat")).unwrap();
        assert_eq!(outcome.version, 3);
    }
}
