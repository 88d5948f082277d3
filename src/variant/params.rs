//! Parameter lookup over a single variant.

use super::enumerate::Variant;
use glob::{MatchOptions, Pattern};
use log::trace;
use serde_json::Value;

/// Lookup path matching every scope under `/run`.
pub const RUN_LOOKUP: &str = "/run/*";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Does `pattern` select the scope at `path`?
///
/// `/x/*` selects `/x` and everything below it, `*` and `/*` select every
/// scope, anything else is a glob over the whole path.
pub fn lookup_path_matches(pattern: &str, path: &str) -> bool {
    if pattern == "*" || pattern == "/*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix("/*") {
        if !prefix.contains(['*', '?', '[']) {
            let rest = path.strip_prefix(prefix);
            return path == prefix || rest.is_some_and(|tail| tail.starts_with('/'));
        }
    }
    Pattern::new(pattern)
        .map(|p| p.matches_with(path, MATCH_OPTIONS))
        .unwrap_or(false)
}

/// Read-only parameter view bound to one variant.
#[derive(Debug, Clone)]
pub struct ResolvedParams<'v> {
    variant: &'v Variant,
    owner: String,
    lookup_paths: Vec<String>,
}

impl<'v> ResolvedParams<'v> {
    pub fn new(variant: &'v Variant, owner: impl Into<String>, lookup_paths: Vec<String>) -> Self {
        Self {
            variant,
            owner: owner.into(),
            lookup_paths,
        }
    }

    pub fn variant(&self) -> &'v Variant {
        self.variant
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn lookup_paths(&self) -> &[String] {
        &self.lookup_paths
    }

    /// Look `name` up using the bound lookup paths.
    pub fn get(&self, name: &str) -> Option<&'v Value> {
        self.lookup(name, &self.lookup_paths)
    }

    /// Like [`get`](Self::get), returning `default` when nothing matches.
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.get(name).cloned().unwrap_or(default)
    }

    /// Patterns are tried in order; within a pattern the nearest scope wins.
    pub fn lookup<S: AsRef<str>>(&self, name: &str, lookup_paths: &[S]) -> Option<&'v Value> {
        for pattern in lookup_paths {
            let pattern = pattern.as_ref();
            for scope in self.variant.scopes().iter().rev() {
                if !lookup_path_matches(pattern, &scope.path) {
                    continue;
                }
                if let Some(value) = scope.bindings.get(name) {
                    trace!(
                        "{}: {} = {} (from {} via {})",
                        self.owner,
                        name,
                        value,
                        scope.path,
                        pattern
                    );
                    return Some(value);
                }
            }
        }
        None
    }
}
