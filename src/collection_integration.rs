//! Host-side loader chain and result display.
//!
//! Each reference is offered to the [`MuxSuiteLoader`] first. References it
//! finds nothing in are passed on to the default file loader.

use crate::discovery::{MuxSuiteLoader, SuiteDiscovery};
use crate::error::DiscoveryError;
use crate::loader::{LabelMappings, LoaderRegistry, WhichTests, DEFAULT_LOADER};
use crate::variant::ParamMap;
use log::debug;

/// Options for suite collection
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionOptions {
    pub which: WhichTests,
    /// Do not fall back to the file loader for references without variants.
    pub mux_only: bool,
}

/// Collect the suite for every reference, in order.
pub fn collect_suite(
    loader: &MuxSuiteLoader,
    references: &[String],
    options: &CollectionOptions,
) -> Result<SuiteDiscovery, DiscoveryError> {
    let mut suite = SuiteDiscovery::default();

    for reference in references {
        let found = loader.collect(reference, options.which)?;
        if !found.is_empty() || options.mux_only {
            suite.extend(found);
            continue;
        }

        debug!("{reference}: no variants, falling back to {DEFAULT_LOADER}");
        suite.extend(fallback(loader, reference, options.which)?);
    }

    Ok(suite)
}

fn fallback(
    loader: &MuxSuiteLoader,
    reference: &str,
    which: WhichTests,
) -> Result<SuiteDiscovery, DiscoveryError> {
    let registry: &LoaderRegistry = loader.registry();
    let settings = loader.settings().clone();
    let Some(built) = registry.create(DEFAULT_LOADER, settings, ParamMap::new()) else {
        return Ok(SuiteDiscovery::default());
    };
    let to_error = |source| DiscoveryError::Fallback {
        loader: DEFAULT_LOADER.to_string(),
        source,
    };

    let mut file_loader = built.map_err(to_error)?;
    let tests = file_loader.discover(reference, which).map_err(to_error)?;
    let mut labels = LabelMappings::default();
    labels.merge_from(file_loader.as_ref());
    Ok(SuiteDiscovery { tests, labels })
}

/// Print each collected test with its type label and variant.
pub fn display_collection_results(suite: &SuiteDiscovery) {
    const BOLD: &str = "\x1b[1m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    if suite.tests.is_empty() {
        println!("No tests collected.");
        return;
    }

    println!("{BOLD}Type{RESET}            {BOLD}Test{RESET}");
    for test in &suite.tests {
        let label = suite
            .labels
            .type_labels
            .get(&test.kind)
            .map(String::as_str)
            .unwrap_or(test.kind.as_str());
        match &test.params {
            Some(params) => println!(
                "{label:<15} {} {YELLOW}[{}]{RESET}",
                test.name,
                params.variant.id()
            ),
            None => println!("{label:<15} {}", test.name),
        }
    }

    let count = suite.tests.len();
    println!();
    let plural = if count == 1 { "" } else { "s" };
    println!("collected {count} item{plural}");
}

/// JSON manifest handed to the test runner.
pub fn suite_manifest(suite: &SuiteDiscovery) -> serde_json::Value {
    serde_json::json!({
        "tests": suite.tests,
        "type_labels": suite.labels.type_labels,
        "decorators": suite.labels.decorators,
    })
}
