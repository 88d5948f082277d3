//! Variant-driven test discovery.
//!
//! A YAML variant description is expanded into variants; each variant names
//! the loader that discovers its tests and the settings that loader runs
//! with. The results are merged into one suite.

pub mod cli;
pub mod collection_integration;
pub mod config;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod variant;

pub use collection_integration::{
    collect_suite, display_collection_results, suite_manifest, CollectionOptions,
};
pub use config::Settings;
pub use discovery::{MuxSuiteLoader, SuiteDiscovery};
pub use error::{ConfigError, DiscoveryError, LoaderError, RegistryError, TreeBuildError};
pub use loader::{DiscoveredTest, LabelMapping, LabelMappings, Loader, LoaderRegistry, WhichTests};
pub use variant::{ResolvedParams, Variant, VariantFilter, VariantTree, Variants};
