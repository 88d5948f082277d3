//! Variant tree: nested parameter scopes.

use crate::error::TreeBuildError;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Parameter bindings defined locally by one scope.
pub type ParamMap = BTreeMap<String, Value>;

/// A named node contributing parameter bindings to the variants below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    pub name: String,
    pub bindings: ParamMap,
    pub children: Vec<Scope>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Scope) -> Self {
        self.children.push(child);
        self
    }

    /// Leaves are scopes declared without children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&Scope> {
        self.children.iter().find(|c| c.name == name)
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut Scope> {
        self.children.iter_mut().find(|c| c.name == name)
    }
}

/// Join a parent path and a child name. The root path is `/`.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Ordered tree of scopes under an anonymous root (`/`).
///
/// Sibling names are unique, so every scope path is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantTree {
    root: Scope,
}

impl VariantTree {
    /// Build a tree from the root's children, validating names and paths.
    pub fn new(children: Vec<Scope>) -> Result<Self, TreeBuildError> {
        let root = Scope {
            name: String::new(),
            bindings: ParamMap::new(),
            children,
        };
        validate_children(&root, "/")?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Find a scope by absolute path, e.g. `/run/a`.
    pub fn find(&self, path: &str) -> Option<&Scope> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(&self.root, |scope, name| scope.child(name))
    }

    /// Paths of every leaf in declared order.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaf_paths(&self.root, "/", &mut paths);
        paths
    }
}

fn collect_leaf_paths(scope: &Scope, path: &str, out: &mut Vec<String>) {
    if scope.is_leaf() {
        out.push(path.to_string());
        return;
    }
    for child in &scope.children {
        collect_leaf_paths(child, &join_path(path, &child.name), out);
    }
}

fn validate_children(scope: &Scope, path: &str) -> Result<(), TreeBuildError> {
    let mut seen = HashSet::new();
    for child in &scope.children {
        if child.name.is_empty() || child.name.contains('/') {
            return Err(TreeBuildError::InvalidScopeName {
                name: child.name.clone(),
            });
        }
        let child_path = join_path(path, &child.name);
        if !seen.insert(child.name.as_str()) {
            return Err(TreeBuildError::DuplicatePath { path: child_path });
        }
        validate_children(child, &child_path)?;
    }
    Ok(())
}
