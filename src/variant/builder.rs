//! Build a [`VariantTree`] from YAML variant descriptions.
//!
//! Every description is mounted under the `run` scope. Inside a description a
//! key whose value is a mapping opens a child scope; everything else is a
//! parameter binding. Mapping-valued parameters are either one of
//! [`MAPPING_PARAMS`] or tagged `!param`. Other tags such as `!mux` are
//! accepted and ignored.

use super::tree::{join_path, Scope, VariantTree};
use crate::error::TreeBuildError;
use serde_yaml::{Mapping, Value as YamlValue};
use std::path::Path;

/// Scope every description is mounted under.
pub const RUN_SCOPE: &str = "run";

/// Tag forcing a mapping value to be read as a parameter.
pub const PARAM_TAG: &str = "param";

/// Parameters whose values are mappings rather than child scopes.
pub const MAPPING_PARAMS: &[&str] = &[
    "test_reference_resolver_args",
    "test_reference_resolver_extra",
];

enum Entry<'a> {
    Child(&'a Mapping),
    Binding(&'a YamlValue),
}

/// Build one tree from `sources`.
///
/// With `merge` off, a parameter or scope defined by more than one source is
/// an error. With `merge` on, later sources override parameters and
/// same-named scopes are merged recursively.
pub fn build<P: AsRef<Path>>(sources: &[P], merge: bool) -> Result<VariantTree, TreeBuildError> {
    let run_path = join_path("/", RUN_SCOPE);
    let mut run = Scope::new(RUN_SCOPE);

    for source in sources {
        let path = source.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TreeBuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = parse_description(&content, path)?;
        merge_scope(&mut run, parsed, &run_path, merge)?;
    }

    VariantTree::new(vec![run])
}

/// Build a tree from in-memory YAML text.
pub fn build_from_str(content: &str) -> Result<VariantTree, TreeBuildError> {
    let run = parse_description(content, Path::new("<string>"))?;
    VariantTree::new(vec![run])
}

fn parse_description(content: &str, path: &Path) -> Result<Scope, TreeBuildError> {
    let parsed = serde_yaml::from_str::<YamlValue>(content);
    let document = parsed.map_err(|source| TreeBuildError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    let mut document = &document;
    while let YamlValue::Tagged(tagged) = document {
        document = &tagged.value;
    }

    let run_path = join_path("/", RUN_SCOPE);
    match document {
        YamlValue::Null => Ok(Scope::new(RUN_SCOPE)),
        YamlValue::Mapping(mapping) => scope_from_mapping(RUN_SCOPE, &run_path, mapping),
        _ => Err(TreeBuildError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

fn scope_from_mapping(name: &str, path: &str, mapping: &Mapping) -> Result<Scope, TreeBuildError> {
    let mut scope = Scope::new(name);

    for (key, value) in mapping {
        let Some(key) = key.as_str() else {
            return Err(TreeBuildError::InvalidKey {
                scope: path.to_string(),
            });
        };

        match classify(key, value) {
            Entry::Child(child) => {
                let child_path = join_path(path, key);
                let child = scope_from_mapping(key, &child_path, child)?;
                scope.children.push(child);
            }
            Entry::Binding(value) => {
                let value = binding_value(path, key, value)?;
                scope.bindings.insert(key.to_string(), value);
            }
        }
    }

    Ok(scope)
}

fn binding_value(
    path: &str,
    name: &str,
    value: &YamlValue,
) -> Result<serde_json::Value, TreeBuildError> {
    serde_json::to_value(strip_tags(value)).map_err(|source| TreeBuildError::Value {
        path: path.to_string(),
        name: name.to_string(),
        source,
    })
}

fn classify<'a>(key: &str, value: &'a YamlValue) -> Entry<'a> {
    match value {
        YamlValue::Tagged(tagged) if tagged.tag == PARAM_TAG => Entry::Binding(&tagged.value),
        YamlValue::Tagged(tagged) => classify(key, &tagged.value),
        YamlValue::Mapping(mapping) if !MAPPING_PARAMS.contains(&key) => Entry::Child(mapping),
        other => Entry::Binding(other),
    }
}

fn strip_tags(value: &YamlValue) -> YamlValue {
    match value {
        YamlValue::Tagged(tagged) => strip_tags(&tagged.value),
        YamlValue::Sequence(items) => YamlValue::Sequence(items.iter().map(strip_tags).collect()),
        YamlValue::Mapping(map) => {
            let stripped = map.iter().map(|(k, v)| (strip_tags(k), strip_tags(v)));
            YamlValue::Mapping(stripped.collect())
        }
        other => other.clone(),
    }
}

fn merge_scope(
    target: &mut Scope,
    source: Scope,
    path: &str,
    merge: bool,
) -> Result<(), TreeBuildError> {
    for (name, value) in source.bindings {
        if !merge && target.bindings.contains_key(&name) {
            return Err(TreeBuildError::DuplicateBinding {
                path: path.to_string(),
                name,
            });
        }
        target.bindings.insert(name, value);
    }

    for child in source.children {
        let child_path = join_path(path, &child.name);
        match target.child_mut(&child.name) {
            Some(existing) if merge => merge_scope(existing, child, &child_path, true)?,
            Some(_) => return Err(TreeBuildError::DuplicatePath { path: child_path }),
            None => target.children.push(child),
        }
    }

    Ok(())
}
