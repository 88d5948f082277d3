//! Variant-driven discovery: one delegate loader per variant.
//!
//! [`MuxSuiteLoader`] reads a variant description, enumerates its variants
//! and, for each one, builds the loader the variant asks for, runs it and
//! tags the resulting tests with the variant. Type-label and decorator
//! mappings reported by the delegates are merged with last-writer-wins.

use crate::config::Settings;
use crate::error::{DiscoveryError, LoaderError};
use crate::loader::resolver::{string_param, TEST_REFERENCE};
use crate::loader::{
    resolve_loader, DiscoveredTest, LabelMapping, LabelMappings, Loader, LoaderRegistry,
    VariantParams, WhichTests,
};
use crate::variant::{build, ResolvedParams, VariantFilter, Variants, RUN_LOOKUP};
use log::{debug, info};
use std::rc::Rc;

/// Owner name parameter lookups are reported under.
pub const LOADER_NAME: &str = "mux_suite";

/// Tests and label mappings produced by one discovery run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteDiscovery {
    pub tests: Vec<DiscoveredTest>,
    pub labels: LabelMappings,
}

impl SuiteDiscovery {
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Append another run's tests and overlay its mappings.
    pub fn extend(&mut self, other: SuiteDiscovery) {
        self.tests.extend(other.tests);
        self.labels.merge(other.labels);
    }
}

/// Loader that delegates to other loaders once per variant.
#[derive(Debug)]
pub struct MuxSuiteLoader {
    settings: Settings,
    registry: LoaderRegistry,
    last_labels: LabelMappings,
}

impl MuxSuiteLoader {
    pub fn new(settings: Settings, registry: LoaderRegistry) -> Self {
        Self {
            settings,
            registry,
            last_labels: LabelMappings::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Discover the suite described by `reference`.
    ///
    /// A missing or malformed description, or filters that leave no
    /// variant, give an empty result. An unknown loader name, an invalid
    /// resolver parameter or a failing delegate abort the whole call.
    pub fn collect(
        &self,
        reference: &str,
        which: WhichTests,
    ) -> Result<SuiteDiscovery, DiscoveryError> {
        let tree = match build(&[reference], false) {
            Ok(tree) => tree,
            Err(e) => return empty_or_error(reference, e.into()),
        };

        let filter = VariantFilter::from_settings(&self.settings)?;
        let variants = match Variants::new(&tree, filter) {
            Ok(variants) => variants,
            Err(e) => return empty_or_error(reference, e),
        };

        let lookup_paths = vec![RUN_LOOKUP.to_string()];
        let mut suite = SuiteDiscovery::default();

        for variant in &variants {
            let variant = Rc::new(variant);
            let params = ResolvedParams::new(&variant, LOADER_NAME, lookup_paths.clone());

            let test_reference = string_param(&params, TEST_REFERENCE)?.unwrap_or(reference);
            let Some(mut loader) = resolve_loader(&params, &self.registry, &self.settings)? else {
                continue;
            };

            let tests = match loader.discover(test_reference, which) {
                Ok(tests) => tests,
                Err(source) => {
                    return Err(DiscoveryError::Loader {
                        loader: loader.name().to_string(),
                        variant: variant.id().to_string(),
                        source,
                    });
                }
            };
            suite.labels.merge_from(loader.as_ref());

            let count = tests.len();
            debug!("{variant}: {count} tests from {}", loader.name());
            for mut test in tests {
                test.params = Some(VariantParams {
                    variant: Rc::clone(&variant),
                    lookup_paths: lookup_paths.clone(),
                });
                suite.tests.push(test);
            }
        }

        let count = suite.tests.len();
        info!("{LOADER_NAME}: discovered {count} tests from {reference}");
        Ok(suite)
    }
}

/// Missing descriptions and fully filtered trees give an empty suite.
fn empty_or_error(
    reference: &str,
    error: DiscoveryError,
) -> Result<SuiteDiscovery, DiscoveryError> {
    if error.is_empty_suite() {
        debug!("{LOADER_NAME}: no variants from {reference}: {error}");
        Ok(SuiteDiscovery::default())
    } else {
        Err(error)
    }
}

impl Loader for MuxSuiteLoader {
    fn name(&self) -> &str {
        LOADER_NAME
    }

    fn discover(
        &mut self,
        reference: &str,
        which: WhichTests,
    ) -> Result<Vec<DiscoveredTest>, LoaderError> {
        let suite = self
            .collect(reference, which)
            .map_err(|e| LoaderError::Delegate(Box::new(e)))?;
        self.last_labels = suite.labels;
        Ok(suite.tests)
    }

    fn full_type_label_mapping(&self) -> LabelMapping {
        self.last_labels.type_labels.clone()
    }

    fn full_decorator_mapping(&self) -> LabelMapping {
        self.last_labels.decorators.clone()
    }
}
