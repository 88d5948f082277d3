//! File-based discovery: every matching file under a reference is a test.

use super::{DiscoveredTest, LabelMapping, Loader, WhichTests};
use crate::config::Settings;
use crate::error::LoaderError;
use crate::variant::ParamMap;
use glob::Pattern;
use log::debug;
use serde_json::Value;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const DEFAULT_FILE_PATTERNS: &[&str] = &["test_*"];
const DEFAULT_NORECURSEDIRS: &[&str] = &[".*", "__pycache__", "target", "node_modules"];

/// Kind of entry the file loader reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Simple,
    NotExecutable,
    NotATest,
    Missing,
}

impl FileKind {
    fn name(self) -> &'static str {
        match self {
            FileKind::Simple => "simple",
            FileKind::NotExecutable => "not_executable",
            FileKind::NotATest => "not_a_test",
            FileKind::Missing => "missing",
        }
    }

    fn label(self) -> &'static str {
        match self {
            FileKind::Simple => "SIMPLE",
            FileKind::NotExecutable => "NOT_EXECUTABLE",
            FileKind::NotATest => "NOT_A_TEST",
            FileKind::Missing => "MISSING",
        }
    }

    fn decorator(self) -> &'static str {
        match self {
            FileKind::Simple => "healthy",
            FileKind::NotExecutable => "warning",
            FileKind::NotATest | FileKind::Missing => "fail",
        }
    }

    fn wanted(self, which: WhichTests) -> bool {
        match self {
            FileKind::Simple => true,
            FileKind::NotExecutable => which != WhichTests::Default,
            FileKind::NotATest | FileKind::Missing => which == WhichTests::All,
        }
    }
}

/// Discovers executable files matching `file_patterns`.
///
/// Settings: `file_patterns`, `norecursedirs`, `ignore`. Extra parameters:
/// `root`, the directory relative references are resolved against.
#[derive(Debug)]
pub struct FileLoader {
    root: Option<PathBuf>,
    file_patterns: Vec<Pattern>,
    norecursedirs: Vec<Pattern>,
    ignore_patterns: Vec<String>,
    type_labels: LabelMapping,
    decorators: LabelMapping,
}

impl FileLoader {
    pub const NAME: &'static str = "file";

    pub fn new(settings: &Settings, extra: &ParamMap) -> Result<Self, LoaderError> {
        let file_patterns = settings
            .get_string_list("file_patterns")?
            .unwrap_or_else(|| to_strings(DEFAULT_FILE_PATTERNS));
        let norecursedirs = settings
            .get_string_list("norecursedirs")?
            .unwrap_or_else(|| to_strings(DEFAULT_NORECURSEDIRS));
        let ignore_patterns = settings.get_string_list("ignore")?.unwrap_or_default();

        let root = match extra.get("root") {
            None | Some(Value::Null) => None,
            Some(Value::String(root)) => Some(PathBuf::from(root)),
            Some(_) => {
                return Err(LoaderError::InvalidExtra {
                    name: "root".into(),
                    reason: "must be a string".into(),
                })
            }
        };

        Ok(Self {
            root,
            file_patterns: compile(&file_patterns)?,
            norecursedirs: compile(&norecursedirs)?,
            ignore_patterns,
            type_labels: LabelMapping::new(),
            decorators: LabelMapping::new(),
        })
    }

    fn should_ignore_path(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        if self.ignore_patterns.iter().any(|p| path_str.contains(p)) {
            return true;
        }

        if path.is_dir() {
            let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            return self.norecursedirs.iter().any(|p| p.matches(dir_name));
        }

        false
    }

    fn is_test_file(&self, path: &Path) -> bool {
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.file_patterns.iter().any(|p| p.matches(filename))
    }

    fn classify(&self, path: &Path, explicit: bool) -> Result<FileKind, LoaderError> {
        if !explicit && !self.is_test_file(path) {
            return Ok(FileKind::NotATest);
        }
        let metadata = std::fs::metadata(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if is_executable(&metadata) {
            Ok(FileKind::Simple)
        } else {
            Ok(FileKind::NotExecutable)
        }
    }

    fn report(&mut self, kind: FileKind, path: &Path) -> DiscoveredTest {
        self.type_labels
            .insert(kind.name().to_string(), kind.label().to_string());
        self.decorators
            .insert(kind.name().to_string(), kind.decorator().to_string());
        let name = path.to_string_lossy().into_owned();
        let test = DiscoveredTest::new(kind.name(), name.clone());
        test.with_metadata("path", name)
    }

    /// Directories below the reference are pruned by `norecursedirs`/`ignore`.
    fn prunes(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0 && self.should_ignore_path(entry.path())
    }

    fn resolve_reference(&self, reference: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(reference),
            None => PathBuf::from(reference),
        }
    }
}

impl Loader for FileLoader {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn discover(
        &mut self,
        reference: &str,
        which: WhichTests,
    ) -> Result<Vec<DiscoveredTest>, LoaderError> {
        let path = self.resolve_reference(reference);

        if !path.exists() {
            debug!("file loader: {} does not exist", path.display());
            if FileKind::Missing.wanted(which) {
                return Ok(vec![self.report(FileKind::Missing, &path)]);
            }
            return Ok(vec![]);
        }

        let mut found = Vec::new();
        if path.is_file() {
            found.push((self.classify(&path, true)?, path));
        } else {
            let walker = WalkDir::new(&path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !self.prunes(entry));
            for entry in walker {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                found.push((self.classify(entry.path(), false)?, entry.into_path()));
            }
        }

        Ok(found
            .into_iter()
            .filter(|(kind, _)| kind.wanted(which))
            .map(|(kind, path)| self.report(kind, &path))
            .collect())
    }

    fn full_type_label_mapping(&self) -> LabelMapping {
        self.type_labels.clone()
    }

    fn full_decorator_mapping(&self) -> LabelMapping {
        self.decorators.clone()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, LoaderError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| LoaderError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    true
}
