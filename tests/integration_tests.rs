// Integration tests for yang-core using the fixtures under tests/fixtures
use yang_core::analyze;
use std::fs;
use std::path::PathBuf;

fn get_test_file_path(subdir: &str, filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(subdir)
        .join(filename)
}

fn read_test_file(subdir: &str, filename: &str) -> String {
    let path = get_test_file_path(subdir, filename);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {:?}", path))
}

// Modules that should load and compile
mod ok_tests {
    use super::*;

    #[test]
    fn test_scenario_module() {
        let path = get_test_file_path("scenario", "m@2021-01-01.yang");
        let content = read_test_file("scenario", "m@2021-01-01.yang");

        let result = analyze(&content, &path.to_string_lossy());
        assert!(
            result.is_ok(),
            "Should load successfully: {:?}",
            result.err()
        );

        let json = result.unwrap().to_json();
        assert!(json.is_ok(), "Should serialize to JSON");
        let json: serde_json::Value = serde_json::from_str(&json.unwrap()).unwrap();
        assert_eq!(json["revision"], "2021-01-01");
        assert_eq!(json["imports"][0]["name"], "n");
        assert_eq!(json["imports"][0]["revision"], "2020-01-01");
    }

    #[test]
    fn test_import_only_module() {
        let path = get_test_file_path("scenario", "n@2021-06-01.yang");
        let content = read_test_file("scenario", "n@2021-06-01.yang");
        let result = analyze(&content, &path.to_string_lossy()).unwrap();
        let size = result
            .compiled()
            .unwrap()
            .find_path("/registry/size")
            .unwrap();
        let ty = size.type_().unwrap();
        assert_eq!(ty.range.as_deref(), Some("1..65535"));
    }

    #[test]
    fn test_diamond_includes() {
        let path = get_test_file_path("diamond", "top.yang");
        let content = read_test_file("diamond", "top.yang");
        let result = analyze(&content, &path.to_string_lossy());
        assert!(
            result.is_ok(),
            "Should load successfully: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_yin_module() {
        let path = get_test_file_path("yin", "acme.yin");
        let content = read_test_file("yin", "acme.yin");
        let result = analyze(&content, &path.to_string_lossy()).unwrap();

        let compiled = result.compiled().unwrap();
        assert_eq!(compiled.revision.as_deref(), Some("2023-04-01"));
        let port = compiled.find_path("/server/port").unwrap();
        let yaml = result.to_yaml().unwrap();
        assert!(yaml.contains("name: port"));
        match &port.kind {
            yang_core::CompiledNodeKind::Leaf { type_, default, .. } => {
                assert_eq!(default.as_deref(), Some("830"));
                assert_eq!(type_.derived_from[0].name, "port");
                assert_eq!(type_.range.as_deref(), Some("1..65535"));
            }
            other => panic!("expected a leaf, got {other:?}"),
        }
    }
}

// Modules that should be rejected
mod err_tests {
    use super::*;
    use yang_core::{ErrorKind, YangError};

    #[test]
    fn test_bad_revision_date() {
        let content = read_test_file("broken", "bad-date.yang");
        let result = analyze(&content, "bad-date.yang");
        match result {
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::Semantic);
                assert_eq!(err.line(), Some(5));
            }
            Ok(_) => panic!("Should fail on 2021-02-30"),
        }
    }

    #[test]
    fn test_duplicate_typedefs() {
        let content = read_test_file("broken", "dup-typedef.yang");
        let result = analyze(&content, "dup-typedef.yang");
        assert!(matches!(result, Err(YangError::Validation(_))));
    }

    #[test]
    fn test_include_cycle() {
        let path = get_test_file_path("cycle", "main.yang");
        let content = read_test_file("cycle", "main.yang");
        let result = analyze(&content, &path.to_string_lossy());
        match result {
            Err(err) => assert_eq!(err.kind(), ErrorKind::Policy),
            Ok(_) => panic!("Should fail on the include cycle"),
        }
    }

    #[test]
    fn test_missing_submodule() {
        // Without the fixture directory on the search path the submodule is not found.
        let content = read_test_file("scenario", "m@2021-01-01.yang");
        let result = analyze(&content, "m@2021-01-01.yang");
        match result {
            Err(err) => assert_eq!(err.kind(), ErrorKind::NotFound),
            Ok(_) => panic!("Should fail without a search path"),
        }
    }
}
