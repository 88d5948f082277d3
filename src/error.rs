//! Error types for tree building, settings, loaders and suite discovery.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning a variant description into a [`VariantTree`].
///
/// The discoverer swallows these: a missing or malformed description means
/// "no tests from this source", not a fatal condition.
///
/// [`VariantTree`]: crate::variant::VariantTree
#[derive(Debug, Error)]
pub enum TreeBuildError {
    #[error("cannot read variant description {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("top level of {path} must be a mapping")]
    NotAMapping { path: PathBuf },

    #[error("non-string key in scope {scope}")]
    InvalidKey { scope: String },

    #[error("invalid scope name {name:?}")]
    InvalidScopeName { name: String },

    #[error("duplicate scope {path}")]
    DuplicatePath { path: String },

    #[error("parameter {name} defined twice in {path}")]
    DuplicateBinding { path: String, name: String },

    #[error("unsupported value for {name} in {path}: {source}")]
    Value {
        path: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while loading or reading [`Settings`](crate::config::Settings).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot convert settings: {0}")]
    Value(#[from] serde_json::Error),

    #[error("setting {key} must be {wanted}")]
    InvalidType { key: String, wanted: &'static str },
}

/// Failure raised by a loader while it is constructed or discovering.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid file pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("extra parameter {name} {reason}")]
    InvalidExtra { name: String, reason: String },

    #[error(transparent)]
    Delegate(Box<DiscoveryError>),
}

/// Failure while registering a loader factory.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("loader already registered: {0}")]
    Duplicate(String),
}

/// Failure of a whole suite discovery call.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    TreeBuild(#[from] TreeBuildError),

    #[error("no variants left after filtering")]
    EmptySuite,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to resolve loader defined by test_reference_resolver_class '{class}'")]
    BackendResolution { class: String },

    #[error("parameter {name} in variant {variant} {reason}")]
    InvalidParam {
        name: String,
        variant: String,
        reason: String,
    },

    #[error("loader {loader} failed for variant {variant}: {source}")]
    Loader {
        loader: String,
        variant: String,
        #[source]
        source: LoaderError,
    },

    #[error("fallback loader {loader} failed: {source}")]
    Fallback {
        loader: String,
        #[source]
        source: LoaderError,
    },
}

impl DiscoveryError {
    /// True for the conditions that mean "this source has no tests" rather
    /// than a configuration error.
    pub fn is_empty_suite(&self) -> bool {
        matches!(
            self,
            DiscoveryError::TreeBuild(_) | DiscoveryError::EmptySuite
        )
    }
}
