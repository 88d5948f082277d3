//! Common test utilities and helpers.

use muxsuite::config::Settings;
use muxsuite::error::LoaderError;
use muxsuite::loader::{DiscoveredTest, LabelMapping, Loader, LoaderRegistry, WhichTests};
use muxsuite::variant::ParamMap;
use serde_json::Value;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Settings and extra parameters each fake loader was built with.
pub type Constructions = Rc<RefCell<Vec<(String, Settings, ParamMap)>>>;

/// Creates a temporary project containing the given files.
///
/// Each entry is `(relative path, contents, executable)`.
#[allow(dead_code)]
pub fn create_test_project(files: &[(&str, &str, bool)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    for (relative, content, executable) in files {
        let path = temp_dir.path().join(relative);
        write_file(&path, content, *executable);
    }
    temp_dir
}

/// Writes a file, creating parent directories as needed.
#[allow(dead_code)]
pub fn write_file(path: &Path, content: &str, executable: bool) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(path, content).expect("Failed to write file");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = if executable { 0o755 } else { 0o644 };
        let permissions = fs::Permissions::from_mode(mode);
        fs::set_permissions(path, permissions).expect("Failed to set permissions");
    }
}

/// Writes a variant description into `dir` and returns its path as a string.
#[allow(dead_code)]
pub fn write_suite(dir: &Path, name: &str, content: &str) -> String {
    let path: PathBuf = dir.join(name);
    write_file(&path, content, false);
    path.to_string_lossy().into_owned()
}

/// Loader whose tests and labels come from its extra parameters.
///
/// Extra parameters: `tests` (list of names), `kind` (type name, default
/// `static`), `label` (type label, default the uppercased kind).
#[allow(dead_code)]
pub struct StaticLoader {
    name: String,
    settings: Settings,
    extra: ParamMap,
    type_labels: LabelMapping,
    decorators: LabelMapping,
}

impl Loader for StaticLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(
        &mut self,
        reference: &str,
        _which: WhichTests,
    ) -> Result<Vec<DiscoveredTest>, LoaderError> {
        let kind = self
            .extra
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or("static")
            .to_string();
        let label = self
            .extra
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| kind.to_uppercase());
        let runner = self
            .settings
            .get_str("external_runner")?
            .unwrap_or("none")
            .to_string();

        let tests = self
            .extra
            .get("tests")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|name| {
                        DiscoveredTest::new(kind.clone(), format!("{reference}::{name}"))
                            .with_metadata("runner", runner.clone())
                            .with_metadata("loader", self.name.clone())
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        self.type_labels.insert(kind.clone(), label);
        self.decorators.insert(kind, format!("decorated-by-{}", self.name));
        Ok(tests)
    }

    fn full_type_label_mapping(&self) -> LabelMapping {
        self.type_labels.clone()
    }

    fn full_decorator_mapping(&self) -> LabelMapping {
        self.decorators.clone()
    }
}

/// Loader that always fails.
#[allow(dead_code)]
pub struct FailingLoader;

impl Loader for FailingLoader {
    fn name(&self) -> &str {
        "fake.failing"
    }

    fn discover(
        &mut self,
        reference: &str,
        _which: WhichTests,
    ) -> Result<Vec<DiscoveredTest>, LoaderError> {
        Err(LoaderError::InvalidExtra {
            name: reference.to_string(),
            reason: "cannot be discovered".to_string(),
        })
    }

    fn full_type_label_mapping(&self) -> LabelMapping {
        LabelMapping::new()
    }

    fn full_decorator_mapping(&self) -> LabelMapping {
        LabelMapping::new()
    }
}

fn build_failing_loader(_: Settings, _: ParamMap) -> Result<Box<dyn Loader>, LoaderError> {
    Ok(Box::new(FailingLoader))
}

/// Built-in loaders plus `fake.alpha`, `fake.beta` and `fake.failing`.
#[allow(dead_code)]
pub fn fake_registry() -> (LoaderRegistry, Constructions) {
    let constructions = Constructions::default();
    let mut registry = LoaderRegistry::with_builtin_loaders();

    for name in ["fake.alpha", "fake.beta"] {
        let seen = Rc::clone(&constructions);
        registry
            .register(name, move |settings, extra| {
                seen.borrow_mut()
                    .push((name.to_string(), settings.clone(), extra.clone()));
                Ok(Box::new(StaticLoader {
                    name: name.to_string(),
                    settings,
                    extra,
                    type_labels: LabelMapping::new(),
                    decorators: LabelMapping::new(),
                }) as Box<dyn Loader>)
            })
            .expect("Failed to register fake loader");
    }
    registry
        .register("fake.failing", build_failing_loader)
        .expect("Failed to register failing loader");

    (registry, constructions)
}
