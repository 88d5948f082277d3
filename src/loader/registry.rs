//! Name → factory registry for loaders.

use super::{ExternalLoader, FileLoader, Loader};
use crate::config::Settings;
use crate::error::{LoaderError, RegistryError};
use crate::variant::ParamMap;
use std::collections::BTreeMap;
use std::fmt;

/// Loader used when a variant names a test reference but no loader.
pub const DEFAULT_LOADER: &str = "file";

/// Builds a loader from its settings and loader-specific extra parameters.
pub type LoaderFactory = Box<dyn Fn(Settings, ParamMap) -> Result<Box<dyn Loader>, LoaderError>>;

/// Registered loader factories, keyed by name.
#[derive(Default)]
pub struct LoaderRegistry {
    factories: BTreeMap<String, LoaderFactory>,
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `file` and `external` loaders.
    pub fn with_builtin_loaders() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, LoaderFactory); 2] = [
            (FileLoader::NAME, Box::new(build_file_loader)),
            (ExternalLoader::NAME, Box::new(build_external_loader)),
        ];
        for (name, factory) in builtins {
            registry.factories.insert(name.to_string(), factory);
        }
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(Settings, ParamMap) -> Result<Box<dyn Loader>, LoaderError> + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LoaderFactory> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the named loader.
    pub fn create(
        &self,
        name: &str,
        settings: Settings,
        extra: ParamMap,
    ) -> Option<Result<Box<dyn Loader>, LoaderError>> {
        self.get(name).map(|factory| factory(settings, extra))
    }
}

fn build_file_loader(settings: Settings, extra: ParamMap) -> Result<Box<dyn Loader>, LoaderError> {
    Ok(Box::new(FileLoader::new(&settings, &extra)?))
}

fn build_external_loader(
    settings: Settings,
    extra: ParamMap,
) -> Result<Box<dyn Loader>, LoaderError> {
    Ok(Box::new(ExternalLoader::new(&settings, &extra)?))
}
