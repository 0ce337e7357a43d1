//! Tests for configuration assembly from build arguments.

use atool_config::{BuildArgs, ConfigAssembler, PluginSpec, WatchMode, prepare};
use serde_json::{Value, json};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn project(pkg: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("package.json"), pkg).expect("write package.json");
    dir
}

fn assemble(args: &BuildArgs) -> atool_config::BundlerConfig {
    ConfigAssembler::new(args)
        .with_node_env(None)
        .assemble()
        .expect("assemble")
}

fn node_env_of(config: &atool_config::BundlerConfig) -> Value {
    let define = config
        .plugins()
        .iter()
        .find(|p| PluginSpec::name_of(p) == Some("define"))
        .expect("define plugin");
    define["definitions"]["process.env.NODE_ENV"].clone()
}

#[test]
fn one_shot_compressed_build_minifies_and_dedupes() {
    let dir = project(r#"{ "entry": { "index": "./index.js" } }"#);
    let args = BuildArgs::new(dir.path());

    let config = assemble(&args);
    assert!(config.has_plugin("minify"));
    assert!(config.has_plugin("dedupe"));
    assert!(config.has_plugin("no-errors"));
    assert_eq!(node_env_of(&config), json!("\"production\""));
}

#[test]
fn no_compress_uses_development_define() {
    let dir = project("{}");
    let mut args = BuildArgs::new(dir.path());
    args.compress = false;

    let config = assemble(&args);
    assert!(!config.has_plugin("minify"));
    assert!(config.has_plugin("dedupe"));
    assert_eq!(node_env_of(&config), json!("\"development\""));
}

#[test]
fn watch_skips_minify_and_dedupe_but_keeps_no_errors() {
    let dir = project("{}");
    let mut args = BuildArgs::new(dir.path());
    args.watch = WatchMode::Interval(500);

    let config = assemble(&args);
    assert!(!config.has_plugin("minify"));
    assert!(!config.has_plugin("dedupe"));
    assert!(config.has_plugin("no-errors"));
}

#[test]
fn base_plugins_come_first_in_order() {
    let dir = project("{}");
    let args = BuildArgs::new(dir.path());

    let config = assemble(&args);
    let names: Vec<_> = config
        .plugins()
        .iter()
        .filter_map(PluginSpec::name_of)
        .collect();
    assert_eq!(
        &names[..5],
        &[
            "commons-chunk",
            "extract-css",
            "occurrence-order",
            "case-sensitive-paths",
            "friendly-errors"
        ]
    );
    assert_eq!(names.last(), Some(&"no-errors"));
}

#[test]
fn hash_switches_filenames_and_adds_manifest() {
    let dir = project(r#"{ "name": "demo", "entry": { "index": "./index.js" } }"#);
    let mut args = BuildArgs::new(dir.path());
    args.hash = true;

    let config = assemble(&args);
    assert_eq!(config.output_str("filename"), Some("[name]-[chunkhash:8].js"));
    assert_eq!(
        config.output_str("chunkFilename"),
        Some("[name]-[chunkhash:8].js")
    );

    let manifest = config
        .plugins()
        .iter()
        .find(|p| PluginSpec::name_of(p) == Some("hash-manifest"))
        .expect("hash-manifest plugin");
    assert_eq!(manifest["assetsPath"], "demo");

    let commons = config
        .plugins()
        .iter()
        .find(|p| PluginSpec::name_of(p) == Some("commons-chunk"))
        .expect("commons-chunk plugin");
    assert_eq!(commons["filename"], "common-[chunkhash:8].js");
}

#[test]
fn output_and_public_path_are_applied() {
    let dir = project("{}");
    let mut args = BuildArgs::new(dir.path());
    args.output_path = Some(PathBuf::from("build"));
    args.public_path = Some("/static/".into());

    let config = assemble(&args);
    assert_eq!(config.output_path(), Some(dir.path().join("build")));
    assert_eq!(config.output_str("publicPath"), Some("/static/"));
}

#[test]
fn devtool_is_passed_through() {
    let dir = project("{}");
    let mut args = BuildArgs::new(dir.path());
    args.devtool = Some("source-map".into());

    let config = assemble(&args);
    assert_eq!(config.get("devtool"), Some(&json!("source-map")));
}

#[test]
#[serial]
fn prepare_reads_node_env_from_process() {
    let dir = project(r#"{ "entry": { "index": "./index.js" } }"#);
    let args = BuildArgs::new(dir.path());

    // SAFETY: serialised with every other test touching NODE_ENV.
    unsafe { std::env::set_var("NODE_ENV", "qa") };
    let configs = prepare(&args);
    unsafe { std::env::remove_var("NODE_ENV") };

    let configs = configs.expect("prepare");
    let config = configs.as_single().expect("single config");
    assert_eq!(node_env_of(config), json!("\"qa\""));
}

#[test]
#[serial]
fn empty_node_env_falls_back_to_mode_default() {
    let dir = project(r#"{ "entry": { "index": "./index.js" } }"#);
    let args = BuildArgs::new(dir.path());

    unsafe { std::env::set_var("NODE_ENV", "") };
    let configs = prepare(&args);
    unsafe { std::env::remove_var("NODE_ENV") };

    let configs = configs.expect("prepare");
    let config = configs.as_single().expect("single config");
    assert_eq!(node_env_of(config), json!("\"production\""));
}
