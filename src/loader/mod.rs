//! Discovery loaders and the values they produce.
//!
//! A loader turns a test reference into [`DiscoveredTest`]s and reports the
//! labels for the test types and decorators it has seen. Loaders are built by
//! name through the [`LoaderRegistry`].

pub mod external;
pub mod file;
pub mod registry;
pub mod resolver;

use crate::error::LoaderError;
use crate::variant::{ParamMap, Variant};
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;

pub use external::ExternalLoader;
pub use file::FileLoader;
pub use registry::{LoaderFactory, LoaderRegistry, DEFAULT_LOADER};
pub use resolver::resolve_loader;

/// Map from a test type (or decorator) name to its label.
pub type LabelMapping = BTreeMap<String, String>;

/// Which discovered entries a loader should report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WhichTests {
    /// Runnable tests only.
    #[default]
    Default,
    /// Runnable tests and tests that are present but cannot run.
    Available,
    /// Everything the loader looked at.
    All,
}

/// Variant that produced a test plus the lookup paths it was resolved with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantParams {
    pub variant: Rc<Variant>,
    pub lookup_paths: Vec<String>,
}

/// A test as reported by a loader.
///
/// `kind`, `name` and `metadata` belong to the loader; discovery only fills
/// in `params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredTest {
    pub kind: String,
    pub name: String,
    pub metadata: ParamMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<VariantParams>,
}

impl DiscoveredTest {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            metadata: ParamMap::new(),
            params: None,
        }
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A pluggable discovery backend.
pub trait Loader {
    /// Registry name of this loader.
    fn name(&self) -> &str;

    fn discover(
        &mut self,
        reference: &str,
        which: WhichTests,
    ) -> Result<Vec<DiscoveredTest>, LoaderError>;

    /// Type labels for everything reported so far.
    fn full_type_label_mapping(&self) -> LabelMapping;

    /// Decorators for everything reported so far.
    fn full_decorator_mapping(&self) -> LabelMapping;
}

/// Type-label and decorator mappings accumulated over one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelMappings {
    pub type_labels: LabelMapping,
    pub decorators: LabelMapping,
}

impl LabelMappings {
    /// Overlay `loader`'s mappings; existing keys are overwritten.
    pub fn merge_from(&mut self, loader: &dyn Loader) {
        self.type_labels.extend(loader.full_type_label_mapping());
        self.decorators.extend(loader.full_decorator_mapping());
    }

    pub fn merge(&mut self, other: LabelMappings) {
        self.type_labels.extend(other.type_labels);
        self.decorators.extend(other.decorators);
    }

    pub fn is_empty(&self) -> bool {
        self.type_labels.is_empty() && self.decorators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(&'static str, &'static str);

    impl Loader for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn discover(&mut self, _: &str, _: WhichTests) -> Result<Vec<DiscoveredTest>, LoaderError> {
            Ok(vec![])
        }

        fn full_type_label_mapping(&self) -> LabelMapping {
            [(self.0.to_string(), self.1.to_string())].into()
        }

        fn full_decorator_mapping(&self) -> LabelMapping {
            LabelMapping::new()
        }
    }

    #[test]
    fn test_merge_is_last_writer_wins() {
        let mut mappings = LabelMappings::default();
        mappings.merge_from(&Fixed("simple", "first"));
        mappings.merge_from(&Fixed("other", "kept"));
        mappings.merge_from(&Fixed("simple", "second"));

        let labels = &mappings.type_labels;
        assert_eq!(labels.get("simple").map(String::as_str), Some("second"));
        assert_eq!(labels.get("other").map(String::as_str), Some("kept"));
        assert!(mappings.decorators.is_empty());
    }

    #[test]
    fn test_discovered_test_builder() {
        let test = DiscoveredTest::new("simple", "tests/test_a")
            .with_metadata("path", "tests/test_a");
        assert_eq!(test.metadata.get("path"), Some(&json!("tests/test_a")));
        assert!(test.params.is_none());
    }
}
