//! Lazy enumeration of variants from a [`VariantTree`].

use super::tree::{join_path, ParamMap, Scope, VariantTree};
use crate::config::{Settings, MUX_SUITE_ONLY, MUX_SUITE_OUT};
use crate::error::{ConfigError, DiscoveryError};
use serde::Serialize;
use std::fmt;

/// Bindings contributed by one scope on a variant's path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantScope {
    pub path: String,
    pub bindings: ParamMap,
}

/// One fully-resolved parameter namespace: the scopes on a single
/// root-to-leaf path, root first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    id: String,
    scopes: Vec<VariantScope>,
}

impl Variant {
    /// Leaf path identifying this variant.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Contributing scopes, root first.
    pub fn scopes(&self) -> &[VariantScope] {
        &self.scopes
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|s| s.path.as_str())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Scope filters from `--mux-suite-only` and `--mux-suite-out`.
///
/// An entry starting with `/` names one scope by path; any other entry
/// names every scope with that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantFilter {
    pub only: Vec<String>,
    pub out: Vec<String>,
}

impl VariantFilter {
    pub fn new(only: Vec<String>, out: Vec<String>) -> Self {
        Self { only, out }
    }

    /// Filters stored in the `mux_suite_only` / `mux_suite_out` settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let only = settings.get_string_list(MUX_SUITE_ONLY)?;
        let out = settings.get_string_list(MUX_SUITE_OUT)?;
        Ok(Self {
            only: only.unwrap_or_default(),
            out: out.unwrap_or_default(),
        })
    }

    fn excludes(&self, path: &str, name: &str) -> bool {
        self.out.iter().any(|entry| entry_matches(entry, path, name))
    }

    fn includes(&self, path: &str, name: &str) -> bool {
        self.only.iter().any(|entry| entry_matches(entry, path, name))
    }
}

fn entry_matches(entry: &str, path: &str, name: &str) -> bool {
    if entry.starts_with('/') {
        let entry = entry.trim_end_matches('/');
        let entry = if entry.is_empty() { "/" } else { entry };
        entry == path
    } else {
        !entry.is_empty() && entry == name
    }
}

/// Restartable sequence of the variants of one tree.
#[derive(Debug)]
pub struct Variants<'t> {
    tree: &'t VariantTree,
    filter: VariantFilter,
}

impl<'t> Variants<'t> {
    /// Fails with [`DiscoveryError::EmptySuite`] when the filters leave no
    /// variant.
    pub fn new(tree: &'t VariantTree, filter: VariantFilter) -> Result<Self, DiscoveryError> {
        let variants = Self { tree, filter };
        if variants.iter().next().is_none() {
            return Err(DiscoveryError::EmptySuite);
        }
        Ok(variants)
    }

    /// Start a fresh depth-first traversal.
    ///
    /// The root answers to the path `/`: excluding it empties the suite and
    /// selecting it keeps every leaf.
    pub fn iter(&self) -> VariantIter<'_> {
        let root = self.tree.root();
        let mut stack = Vec::new();
        if !self.filter.excludes("/", &root.name) {
            stack.push(Frame {
                scope: root,
                path: "/".to_string(),
                included: self.filter.includes("/", &root.name),
                next_child: 0,
            });
        }
        VariantIter {
            filter: &self.filter,
            stack,
        }
    }
}

impl<'a, 't> IntoIterator for &'a Variants<'t> {
    type Item = Variant;
    type IntoIter = VariantIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct Frame<'a> {
    scope: &'a Scope,
    path: String,
    /// Whether this scope or an ancestor matched `only`.
    included: bool,
    next_child: usize,
}

/// Depth-first iterator yielding one [`Variant`] per surviving leaf.
pub struct VariantIter<'a> {
    filter: &'a VariantFilter,
    stack: Vec<Frame<'a>>,
}

impl VariantIter<'_> {
    fn current_variant(&self) -> Variant {
        let scopes = self
            .stack
            .iter()
            .map(|frame| VariantScope {
                path: frame.path.clone(),
                bindings: frame.scope.bindings.clone(),
            })
            .collect();
        let id = self
            .stack
            .last()
            .map(|frame| frame.path.clone())
            .unwrap_or_else(|| "/".to_string());
        Variant { id, scopes }
    }
}

impl Iterator for VariantIter<'_> {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        loop {
            let frame = self.stack.last_mut()?;

            if frame.scope.is_leaf() {
                let keep = self.filter.only.is_empty() || frame.included;
                let variant = keep.then(|| self.current_variant());
                self.stack.pop();
                match variant {
                    Some(variant) => return Some(variant),
                    None => continue,
                }
            }

            let Some(child) = frame.scope.children.get(frame.next_child) else {
                self.stack.pop();
                continue;
            };
            frame.next_child += 1;

            let path = join_path(&frame.path, &child.name);
            if self.filter.excludes(&path, &child.name) {
                continue;
            }
            let included = frame.included || self.filter.includes(&path, &child.name);
            self.stack.push(Frame {
                scope: child,
                path,
                included,
                next_child: 0,
            });
        }
    }
}
