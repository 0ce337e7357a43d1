//! Tests for project override merging and entry validation.

use atool_config::{
    BuildArgs, BundlerConfig, ConfigError, ConfigSet, ConfigSource, Override, merge,
    merge_custom_config, prepare_with_env, validate,
};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn config(value: Value) -> BundlerConfig {
    BundlerConfig::from_value(value).expect("object config")
}

fn base() -> BundlerConfig {
    config(json!({
        "entry": { "index": "./index.js" },
        "output": { "path": "/dist", "filename": "[name].js" },
        "a": "base"
    }))
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write override");
    path
}

#[test]
fn missing_override_is_identity() {
    let dir = TempDir::new().unwrap();
    let merged =
        merge_custom_config(base(), dir.path().join("webpack.config.json"), None).unwrap();
    assert_eq!(merged, ConfigSet::from(base()));
}

#[test]
fn empty_object_override_is_identity() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "webpack.config.json", "{}");

    let merged = merge_custom_config(base(), &path, None).unwrap();
    assert_eq!(merged, ConfigSet::from(base()));
}

#[test]
fn fragment_replaces_top_level_keys() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "webpack.config.json",
        r#"{ "a": "override", "output": { "path": "/elsewhere" } }"#,
    );

    let merged = merge_custom_config(base(), &path, None).unwrap();
    let merged = merged.as_single().unwrap();
    assert_eq!(merged.get("a"), Some(&json!("override")));
    // Nested objects are replaced, not merged.
    assert_eq!(merged.get("output"), Some(&json!({ "path": "/elsewhere" })));
    assert!(merged.has_entry());
}

#[test]
fn profile_file_branches_on_env() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "webpack.config.json",
        r#"{
            "shared": true,
            "profiles": {
                "production": { "a": "p" },
                "development": { "a": "d" }
            }
        }"#,
    );

    let dev = merge_custom_config(base(), &path, Some("development")).unwrap();
    let prod = merge_custom_config(base(), &path, Some("production")).unwrap();
    let none = merge_custom_config(base(), &path, None).unwrap();

    assert_eq!(dev.as_single().unwrap().get("a"), Some(&json!("d")));
    assert_eq!(prod.as_single().unwrap().get("a"), Some(&json!("p")));
    assert_eq!(none.as_single().unwrap().get("a"), Some(&json!("base")));
    assert_eq!(dev.as_single().unwrap().get("shared"), Some(&json!(true)));
    assert!(dev.as_single().unwrap().get("profiles").is_none());
}

#[test]
fn toml_profiles_are_supported() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "webpack.config.toml",
        r#"
devtool = "eval"

[profiles.production]
devtool = "source-map"
"#,
    );

    let merged = merge_custom_config(base(), &path, Some("production")).unwrap();
    assert_eq!(
        merged.as_single().unwrap().get("devtool"),
        Some(&json!("source-map"))
    );
}

#[test]
fn in_memory_transform_receives_env() {
    let source = ConfigSource::transform(|configs, env| {
        let mut configs = configs;
        for config in configs.iter_mut() {
            config.insert("seen", json!(env.unwrap_or("none")));
        }
        Some(configs)
    });

    let merged = merge(base(), &source, Some("staging")).unwrap();
    assert_eq!(
        merged.as_single().unwrap().get("seen"),
        Some(&json!("staging"))
    );
}

#[test]
fn transform_may_return_a_multi_config() {
    let source = ConfigSource::transform(|configs, _| {
        let single = configs.as_single()?.clone();
        let mut second = single.clone();
        second.insert("name", json!("second"));
        Some(ConfigSet::from(vec![single, second]))
    });

    let merged = merge(base(), &source, None).unwrap();
    assert_eq!(merged.len(), 2);
    assert!(validate(&merged).is_ok());
}

#[test]
fn primitive_override_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "webpack.config.json", "42");

    let err = merge_custom_config(base(), &path, None).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidOverride { found: "a number", .. }));
}

#[test]
fn malformed_override_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "webpack.config.json", "{ \"a\": ");

    let err = merge_custom_config(base(), &path, None).unwrap_err();
    assert_eq!(err.name(), "OverrideParseError");
}

#[test]
fn override_resolution_is_reusable() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "webpack.config.json", r#"{ "a": "x" }"#);

    let resolved = Override::resolve(&ConfigSource::Path(path)).unwrap();
    let first = resolved.apply(ConfigSet::from(base()), None);
    let second = resolved.apply(ConfigSet::from(base()), None);
    assert_eq!(first, second);
}

#[test]
fn no_entry_error_has_fixed_name_and_message() {
    let configs = ConfigSet::from(config(json!({ "output": {} })));
    let err = validate(&configs).unwrap_err();

    assert_eq!(err.name(), "NoEntry");
    assert_eq!(err.to_string(), "no webpack entry found");
}

#[test]
fn override_removing_entry_fails_validation() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{ "entry": { "index": "./index.js" } }"#,
    )
    .unwrap();
    write(&dir, "webpack.config.json", r#"{ "entry": {} }"#);

    let args = BuildArgs::new(dir.path());
    let err = prepare_with_env(&args, None).unwrap_err();
    assert!(matches!(err, ConfigError::NoEntry));
}

#[test]
fn prepare_applies_override_with_args_env() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{ "entry": { "index": "./index.js" } }"#,
    )
    .unwrap();
    write(
        &dir,
        "custom.json",
        r#"{ "profiles": { "ci": { "devtool": "hidden-source-map" } } }"#,
    );

    let mut args = BuildArgs::new(dir.path());
    args.config = Some(ConfigSource::Path(PathBuf::from("custom.json")));
    args.env = Some("ci".into());

    let configs = prepare_with_env(&args, None).unwrap();
    assert_eq!(
        configs.as_single().unwrap().get("devtool"),
        Some(&json!("hidden-source-map"))
    );
}
