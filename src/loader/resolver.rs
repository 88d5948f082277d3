//! Pick and build the loader for one variant.

use super::registry::{LoaderRegistry, DEFAULT_LOADER};
use super::Loader;
use crate::config::Settings;
use crate::error::DiscoveryError;
use crate::variant::{ParamMap, ResolvedParams};
use log::debug;
use serde_json::{Map, Value};

pub const TEST_REFERENCE: &str = "test_reference";
pub const RESOLVER_CLASS: &str = "test_reference_resolver_class";
pub const RESOLVER_ARGS: &str = "test_reference_resolver_args";
pub const RESOLVER_EXTRA: &str = "test_reference_resolver_extra";

/// Build the loader `params` asks for.
///
/// Returns `Ok(None)` when the variant names neither a loader nor a test
/// reference; such variants are skipped instead of falling back to the
/// default loader. Setting overrides are applied to a derived copy of
/// `ambient`.
pub fn resolve_loader(
    params: &ResolvedParams<'_>,
    registry: &LoaderRegistry,
    ambient: &Settings,
) -> Result<Option<Box<dyn Loader>>, DiscoveryError> {
    let variant = params.variant().id();

    let name = match string_param(params, RESOLVER_CLASS)? {
        Some(name) => name,
        None if string_param(params, TEST_REFERENCE)?.is_some() => DEFAULT_LOADER,
        None => {
            debug!("{variant}: no {TEST_REFERENCE} or {RESOLVER_CLASS}");
            return Ok(None);
        }
    };

    let Some(factory) = registry.get(name) else {
        return Err(DiscoveryError::BackendResolution {
            class: name.to_string(),
        });
    };

    let settings = match mapping_param(params, RESOLVER_ARGS)? {
        Some(overrides) if !overrides.is_empty() => ambient.with_overrides(overrides),
        _ => ambient.clone(),
    };

    let extra: ParamMap = mapping_param(params, RESOLVER_EXTRA)?
        .map(|extra| extra.clone().into_iter().collect())
        .unwrap_or_default();

    debug!("{variant}: using loader {name}");
    match factory(settings, extra) {
        Ok(loader) => Ok(Some(loader)),
        Err(source) => Err(DiscoveryError::Loader {
            loader: name.to_string(),
            variant: variant.to_string(),
            source,
        }),
    }
}

/// Non-empty string parameter; `null` and `""` count as unset.
pub(crate) fn string_param<'v>(
    params: &ResolvedParams<'v>,
    name: &str,
) -> Result<Option<&'v str>, DiscoveryError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(invalid(params, name, "must be a string")),
    }
}

fn mapping_param<'v>(
    params: &ResolvedParams<'v>,
    name: &str,
) -> Result<Option<&'v Map<String, Value>>, DiscoveryError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(invalid(params, name, "must be a mapping")),
    }
}

fn invalid(params: &ResolvedParams<'_>, name: &str, reason: &str) -> DiscoveryError {
    DiscoveryError::InvalidParam {
        name: name.to_string(),
        variant: params.variant().id().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoaderError;
    use crate::loader::{DiscoveredTest, LabelMapping, WhichTests};
    use crate::variant::{build_from_str, Variant, VariantFilter, Variants, RUN_LOOKUP};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording;

    impl Loader for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn discover(&mut self, _: &str, _: WhichTests) -> Result<Vec<DiscoveredTest>, LoaderError> {
            Ok(vec![])
        }

        fn full_type_label_mapping(&self) -> LabelMapping {
            LabelMapping::new()
        }

        fn full_decorator_mapping(&self) -> LabelMapping {
            LabelMapping::new()
        }
    }

    type Seen = Rc<RefCell<Vec<(Settings, ParamMap)>>>;

    fn registry(seen: &Seen) -> LoaderRegistry {
        let mut registry = LoaderRegistry::with_builtin_loaders();
        let seen = Rc::clone(seen);
        registry
            .register("recording", move |settings, extra| {
                seen.borrow_mut().push((settings, extra));
                Ok(Box::new(Recording) as Box<dyn Loader>)
            })
            .expect("register recording loader");
        registry
    }

    fn variant(description: &str) -> Variant {
        let tree = build_from_str(description).expect("valid description");
        let variants = Variants::new(&tree, VariantFilter::default()).expect("variants");
        variants.iter().next().expect("one variant")
    }

    fn resolve(
        description: &str,
        registry: &LoaderRegistry,
        ambient: &Settings,
    ) -> Result<Option<String>, DiscoveryError> {
        let variant = variant(description);
        let params = ResolvedParams::new(&variant, "test", vec![RUN_LOOKUP.into()]);
        let loader = resolve_loader(&params, registry, ambient)?;
        Ok(loader.map(|l| l.name().to_string()))
    }

    #[test]
    fn test_no_reference_no_loader() {
        let registry = registry(&Seen::default());
        let got = resolve("other: 1\n", &registry, &Settings::new()).expect("resolve");
        assert_eq!(got, None);
    }

    #[test]
    fn test_reference_defaults_to_file_loader() {
        let registry = registry(&Seen::default());
        let description = "test_reference: tests/\n";
        let got = resolve(description, &registry, &Settings::new()).expect("resolve");
        assert_eq!(got.as_deref(), Some("file"));
    }

    #[test]
    fn test_unknown_class_is_resolution_error() {
        let registry = registry(&Seen::default());
        let description = "test_reference_resolver_class: no.such.Loader\n";

        let err = resolve(description, &registry, &Settings::new()).unwrap_err();

        assert!(matches!(err, DiscoveryError::BackendResolution { .. }));
        assert!(err.to_string().contains("'no.such.Loader'"));
    }

    #[test]
    fn test_overrides_apply_to_copy() {
        let seen = Seen::default();
        let ambient = Settings::new().with("runner", "/bin/sh").with("keep", 1);
        let description = indoc::indoc! {"
            test_reference_resolver_class: recording
            test_reference_resolver_args:
              runner: /usr/bin/env
            test_reference_resolver_extra:
              flavour: quick
        "};

        let got = resolve(description, &registry(&seen), &ambient).expect("resolve");

        assert_eq!(got.as_deref(), Some("recording"));
        let seen = seen.borrow();
        let (settings, extra) = &seen[0];
        assert_eq!(settings.get("runner"), Some(&json!("/usr/bin/env")));
        assert_eq!(settings.get("keep"), Some(&json!(1)));
        assert_eq!(extra.get("flavour"), Some(&json!("quick")));
        assert_eq!(ambient.get("runner"), Some(&json!("/bin/sh")));
    }

    #[test]
    fn test_extra_defaults_to_empty() {
        let seen = Seen::default();
        let description = "test_reference_resolver_class: recording\n";

        resolve(description, &registry(&seen), &Settings::new()).expect("resolve");

        assert!(seen.borrow()[0].1.is_empty());
    }

    #[test]
    fn test_non_mapping_args_rejected() {
        let registry = registry(&Seen::default());
        let description = indoc::indoc! {"
            test_reference_resolver_class: recording
            test_reference_resolver_args: [1]
        "};

        let err = resolve(description, &registry, &Settings::new()).unwrap_err();

        let DiscoveryError::InvalidParam { name, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(name, RESOLVER_ARGS);
    }

    #[test]
    fn test_factory_error_names_variant() {
        let registry = registry(&Seen::default());
        let description = indoc::indoc! {"
            test_reference_resolver_class: file
            test_reference_resolver_extra:
              root: 5
        "};

        let err = resolve(description, &registry, &Settings::new()).unwrap_err();

        let DiscoveryError::Loader { variant, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(variant, "/run");
    }
}
