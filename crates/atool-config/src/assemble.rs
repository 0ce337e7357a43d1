//! Assembles the bundler configuration from build arguments.
//!
//! The base configuration (output layout, loader table, resolve rules, base
//! plugins) comes from [`common_config`]; [`ConfigAssembler::assemble`] then
//! layers the mode-dependent plugins on top.

use serde_json::{Map, Value, json};

use crate::args::BuildArgs;
use crate::config::BundlerConfig;
use crate::error::Result;
use crate::loaders::{EMPTY_BUILTINS, RESOLVE_EXTENSIONS, default_rules};
use crate::package::PackageManifest;
use crate::plugin::{MinifyOptions, PluginSpec};

const HASHED_JS: &str = "[name]-[chunkhash:8].js";
const HASHED_CSS: &str = "[name]-[chunkhash:8].css";
const HASHED_COMMON: &str = "common-[chunkhash:8].js";

pub struct ConfigAssembler<'a> {
    args: &'a BuildArgs,
    node_env: Option<String>,
}

impl<'a> ConfigAssembler<'a> {
    /// Assembler reading `NODE_ENV` from the process environment.
    pub fn new(args: &'a BuildArgs) -> Self {
        let node_env = std::env::var("NODE_ENV").ok().filter(|v| !v.is_empty());
        Self { args, node_env }
    }

    /// Replaces the `NODE_ENV` value taken from the environment.
    pub fn with_node_env(mut self, node_env: Option<String>) -> Self {
        self.node_env = node_env;
        self
    }

    pub fn assemble(&self) -> Result<BundlerConfig> {
        let args = self.args;
        let pkg = PackageManifest::load(&args.cwd)?;
        let mut config = common_config(args, &pkg);

        if let Some(output_path) = &args.output_path {
            let path = args.cwd.join(output_path);
            config
                .output_mut()
                .insert("path".into(), json!(path.to_string_lossy()));
        }

        if let Some(public_path) = &args.public_path {
            config
                .output_mut()
                .insert("publicPath".into(), json!(public_path));
        }

        // Incremental rebuilds skip minification.
        if args.compress && !args.watch.is_enabled() {
            config.push_plugin(PluginSpec::Minify(MinifyOptions::default()));
            config.push_plugin(PluginSpec::node_env(self.node_env_or("production")));
        } else {
            config.push_plugin(PluginSpec::node_env(self.node_env_or("development")));
        }

        // Dedupe conflicts with incremental rebuilds.
        if !args.watch.is_enabled() {
            config.push_plugin(PluginSpec::Dedupe);
        }

        config.push_plugin(PluginSpec::NoErrors);

        if args.hash {
            let output = config.output_mut();
            output.insert("filename".into(), json!(HASHED_JS));
            output.insert("chunkFilename".into(), json!(HASHED_JS));
            config.push_plugin(PluginSpec::HashManifest {
                assets_path: pkg.name.clone().unwrap_or_default(),
            });
        }

        tracing::debug!(
            plugins = config.plugins().len(),
            hash = args.hash,
            watch = args.watch.is_enabled(),
            "Assembled bundler config"
        );

        Ok(config)
    }

    fn node_env_or<'s>(&'s self, fallback: &'s str) -> &'s str {
        self.node_env.as_deref().unwrap_or(fallback)
    }
}

/// Base configuration shared by every build mode.
pub fn common_config(args: &BuildArgs, pkg: &PackageManifest) -> BundlerConfig {
    let (js_name, css_name, common_name) = if args.hash {
        (HASHED_JS, HASHED_CSS, HASHED_COMMON)
    } else {
        ("[name].js", "[name].css", "common.js")
    };

    let node: Map<String, Value> = EMPTY_BUILTINS
        .iter()
        .filter(|name| !pkg.maps_builtin(name))
        .map(|name| (name.to_string(), json!("empty")))
        .collect();

    let mut config = BundlerConfig::new();
    config.insert("context", json!(args.cwd.to_string_lossy()));
    config.insert(
        "output",
        json!({
            "path": args.cwd.join("dist").to_string_lossy(),
            "filename": js_name,
            "chunkFilename": js_name,
        }),
    );
    config.insert(
        "devtool",
        args.devtool.as_ref().map_or(Value::Null, |d| json!(d)),
    );
    config.insert(
        "resolve",
        json!({
            "modulesDirectories": ["node_modules"],
            "extensions": RESOLVE_EXTENSIONS,
        }),
    );
    config.insert(
        "resolveLoader",
        json!({ "modulesDirectories": ["node_modules"] }),
    );
    if let Some(entry) = &pkg.entry {
        config.insert("entry", entry.clone());
    }
    config.insert("node", Value::Object(node));
    config.insert(
        "module",
        json!({
            "noParse": [r"moment\.js"],
            "loaders": default_rules(),
        }),
    );

    config.push_plugin(PluginSpec::CommonsChunk {
        name: "common".into(),
        filename: common_name.into(),
    });
    config.push_plugin(PluginSpec::ExtractCss {
        filename: css_name.into(),
        all_chunks: true,
    });
    config.push_plugin(PluginSpec::OccurrenceOrder);
    config.push_plugin(PluginSpec::CaseSensitivePaths);
    config.push_plugin(PluginSpec::FriendlyErrors);

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::WatchMode;
    use std::fs;
    use tempfile::TempDir;

    fn project(pkg: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), pkg).unwrap();
        dir
    }

    #[test]
    fn common_config_reads_entry_from_manifest() {
        let dir = project(r#"{ "name": "demo", "entry": { "index": "./index.js" } }"#);
        let args = BuildArgs::new(dir.path());
        let pkg = PackageManifest::load(dir.path()).unwrap();

        let config = common_config(&args, &pkg);
        assert!(config.has_entry());
        assert_eq!(config.output_str("filename"), Some("[name].js"));
        assert_eq!(config.output_path(), Some(dir.path().join("dist")));
    }

    #[test]
    fn browser_field_keeps_builtin() {
        let dir = project(r#"{ "browser": { "fs": "./shim/fs.js" } }"#);
        let args = BuildArgs::new(dir.path());
        let pkg = PackageManifest::load(dir.path()).unwrap();

        let config = common_config(&args, &pkg);
        let node = config.get("node").and_then(Value::as_object).unwrap();
        assert!(!node.contains_key("fs"));
        assert_eq!(node.get("net"), Some(&json!("empty")));
    }

    #[test]
    fn watch_mode_gets_development_define_without_minify() {
        let dir = project(r#"{ "entry": { "index": "./index.js" } }"#);
        let mut args = BuildArgs::new(dir.path());
        args.watch = WatchMode::Enabled;

        let config = ConfigAssembler::new(&args)
            .with_node_env(None)
            .assemble()
            .unwrap();

        assert!(!config.has_plugin("minify"));
        assert!(!config.has_plugin("dedupe"));
        let define = config
            .plugins()
            .iter()
            .find(|p| PluginSpec::name_of(p) == Some("define"))
            .unwrap();
        assert_eq!(
            define["definitions"]["process.env.NODE_ENV"],
            json!("\"development\"")
        );
    }

    #[test]
    fn existing_node_env_wins_over_mode_default() {
        let dir = project("{}");
        let args = BuildArgs::new(dir.path());

        let config = ConfigAssembler::new(&args)
            .with_node_env(Some("staging".into()))
            .assemble()
            .unwrap();

        let define = config
            .plugins()
            .iter()
            .find(|p| PluginSpec::name_of(p) == Some("define"))
            .unwrap();
        assert_eq!(
            define["definitions"]["process.env.NODE_ENV"],
            json!("\"staging\"")
        );
    }
}
