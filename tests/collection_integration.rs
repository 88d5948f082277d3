//! Integration tests for the host loader chain.

mod common;

use indoc::indoc;
use muxsuite::collection_integration::{collect_suite, suite_manifest, CollectionOptions};
use muxsuite::config::Settings;
use muxsuite::loader::WhichTests;
use muxsuite::{DiscoveryError, MuxSuiteLoader};
use serde_json::json;

#[test]
fn test_missing_reference_collects_nothing() {
    let (registry, _) = common::fake_registry();
    let loader = MuxSuiteLoader::new(Settings::new(), registry);

    let references = ["missing.yaml".to_string()];
    let options = CollectionOptions::default();

    let suite = collect_suite(&loader, &references, &options).expect("collect");

    assert!(suite.is_empty());
}

#[cfg(unix)]
#[test]
fn test_plain_directory_falls_back_to_file_loader() {
    let dir = common::create_test_project(&[
        ("tests/test_plain", "#!/bin/sh\n", true),
        ("tests/not_a_test", "#!/bin/sh\n", true),
    ]);
    let tests_dir = dir.path().join("tests").to_string_lossy().into_owned();
    let (registry, _) = common::fake_registry();
    let loader = MuxSuiteLoader::new(Settings::new(), registry);

    let options = CollectionOptions::default();

    let suite = collect_suite(&loader, &[tests_dir], &options).expect("collect");

    assert_eq!(suite.tests.len(), 1);
    assert!(suite.tests[0].name.ends_with("test_plain"));
    assert!(suite.tests[0].params.is_none());
}

#[cfg(unix)]
#[test]
fn test_mux_only_disables_fallback() {
    let dir = common::create_test_project(&[("tests/test_plain", "#!/bin/sh\n", true)]);
    let tests_dir = dir.path().join("tests").to_string_lossy().into_owned();
    let (registry, _) = common::fake_registry();
    let loader = MuxSuiteLoader::new(Settings::new(), registry);
    let options = CollectionOptions {
        which: WhichTests::Default,
        mux_only: true,
    };

    let suite = collect_suite(&loader, &[tests_dir], &options).expect("collect");

    assert!(suite.is_empty());
}

#[test]
fn test_references_concatenate_in_order() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let first = common::write_suite(
        dir.path(),
        "first.yaml",
        indoc! {"
            test_reference_resolver_class: fake.alpha
            test_reference_resolver_extra:
              tests: [a]
              kind: shared
              label: FIRST
        "},
    );
    let second = common::write_suite(
        dir.path(),
        "second.yaml",
        indoc! {"
            test_reference_resolver_class: fake.beta
            test_reference_resolver_extra:
              tests: [b]
              kind: shared
              label: SECOND
        "},
    );
    let (registry, _) = common::fake_registry();
    let loader = MuxSuiteLoader::new(Settings::new(), registry);

    let references = [first.clone(), second.clone()];
    let options = CollectionOptions::default();

    let suite = collect_suite(&loader, &references, &options).expect("collect");

    let names: Vec<&str> = suite.tests.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec![format!("{first}::a"), format!("{second}::b")]);
    assert_eq!(suite.labels.type_labels["shared"], "SECOND");

    let manifest = suite_manifest(&suite);
    assert_eq!(manifest["tests"][0]["params"]["variant"]["id"], "/run");
    assert_eq!(manifest["tests"][1]["params"]["lookup_paths"][0], "/run/*");
    assert_eq!(manifest["type_labels"]["shared"], "SECOND");
}

#[test]
fn test_configuration_errors_propagate() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let content = "test_reference_resolver_class: missing.Loader\n";
    let suite_path = common::write_suite(dir.path(), "suite.yaml", content);
    let (registry, _) = common::fake_registry();
    let loader = MuxSuiteLoader::new(Settings::new(), registry);
    let options = CollectionOptions::default();

    let err = collect_suite(&loader, &[suite_path], &options).unwrap_err();

    assert!(err.to_string().contains("missing.Loader"));
}

#[test]
fn test_fallback_loader_errors_name_the_loader() {
    let dir = common::create_test_project(&[("tests/test_plain", "#!/bin/sh\n", true)]);
    let tests_dir = dir.path().join("tests").to_string_lossy().into_owned();
    let settings = Settings::new().with("file_patterns", json!(["[unclosed"]));
    let (registry, _) = common::fake_registry();
    let loader = MuxSuiteLoader::new(settings, registry);
    let options = CollectionOptions::default();

    let err = collect_suite(&loader, &[tests_dir], &options).unwrap_err();

    let DiscoveryError::Fallback { loader, .. } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(loader, "file");
    assert!(err.to_string().starts_with("fallback loader file failed"));
}
