//! Reads the keys the native compiler acts on out of a [`BundlerConfig`].

use std::path::PathBuf;

use atool_config::loaders::RESOLVE_EXTENSIONS;
use atool_config::{BundlerConfig, LoaderRule, PluginSpec, default_rules};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{CompileError, Result};
use crate::module::LoaderTable;
use crate::transform::MinifySettings;

const DEFAULT_FILENAME: &str = "[name].js";

#[derive(Debug)]
pub struct Entry {
    pub name: String,
    pub requests: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommonsChunk {
    pub name: String,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct ExtractCss {
    pub filename: String,
    pub all_chunks: bool,
}

/// Everything one compile needs from a configuration.
#[derive(Debug)]
pub struct BuildPlan {
    pub context: PathBuf,
    pub output_path: PathBuf,
    pub filename: String,
    pub public_path: String,
    pub entries: Vec<Entry>,
    pub loaders: LoaderTable,
    pub extensions: Vec<String>,
    pub commons: Option<CommonsChunk>,
    pub extract_css: Option<ExtractCss>,
    pub occurrence_order: bool,
    pub case_sensitive: bool,
    pub minify: Option<MinifySettings>,
    pub definitions: IndexMap<String, String>,
    pub dedupe: bool,
    pub no_errors: bool,
    pub hash_manifest: Option<String>,
    /// Warnings raised while reading the configuration.
    pub warnings: Vec<String>,
}

impl BuildPlan {
    pub fn from_config(config: &BundlerConfig) -> Result<Self> {
        let context = match config.context() {
            Some(context) => context,
            None => std::env::current_dir()?,
        };
        let output_path = config
            .output_path()
            .ok_or_else(|| CompileError::InvalidConfig("output.path is required".into()))?;
        let output_path = if output_path.is_absolute() {
            output_path
        } else {
            context.join(output_path)
        };

        let mut plan = Self {
            context,
            output_path,
            filename: config
                .output_str("filename")
                .unwrap_or(DEFAULT_FILENAME)
                .to_string(),
            public_path: config.output_str("publicPath").unwrap_or("").to_string(),
            entries: parse_entries(config)?,
            loaders: LoaderTable::new(&parse_loaders(config)?)?,
            extensions: parse_extensions(config),
            commons: None,
            extract_css: None,
            occurrence_order: false,
            case_sensitive: false,
            minify: None,
            definitions: IndexMap::new(),
            dedupe: false,
            no_errors: false,
            hash_manifest: None,
            warnings: Vec::new(),
        };

        let (specs, unknown) = config.plugin_specs();
        for spec in specs {
            plan.apply_plugin(spec);
        }
        for raw in unknown {
            let name = PluginSpec::name_of(&raw).unwrap_or("<unnamed>");
            plan.warnings
                .push(format!("Unknown plugin '{name}' was ignored"));
        }

        Ok(plan)
    }

    fn apply_plugin(&mut self, spec: PluginSpec) {
        match spec {
            PluginSpec::CommonsChunk { name, filename } => {
                self.commons = Some(CommonsChunk { name, filename });
            }
            PluginSpec::ExtractCss {
                filename,
                all_chunks,
            } => {
                self.extract_css = Some(ExtractCss {
                    filename,
                    all_chunks,
                });
            }
            PluginSpec::OccurrenceOrder => self.occurrence_order = true,
            PluginSpec::CaseSensitivePaths => self.case_sensitive = true,
            // Reporting concern, handled by the caller.
            PluginSpec::FriendlyErrors => {}
            PluginSpec::Minify(options) => {
                self.minify = Some(MinifySettings {
                    ascii_only: options.output.ascii_only,
                });
            }
            PluginSpec::Define { definitions } => self.definitions.extend(definitions),
            PluginSpec::Dedupe => self.dedupe = true,
            PluginSpec::NoErrors => self.no_errors = true,
            PluginSpec::HashManifest { assets_path } => self.hash_manifest = Some(assets_path),
        }
    }
}

/// Chunk name of an entry given as a bare path or list of paths.
const DEFAULT_ENTRY_NAME: &str = "main";

fn parse_entries(config: &BundlerConfig) -> Result<Vec<Entry>> {
    match config.get("entry") {
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(name, value)| entry(name, value))
            .collect(),
        Some(value @ (Value::String(_) | Value::Array(_))) => {
            Ok(vec![entry(DEFAULT_ENTRY_NAME, value)?])
        }
        _ => Ok(Vec::new()),
    }
}

fn entry(name: &str, value: &Value) -> Result<Entry> {
    let requests = match value {
        Value::String(request) => vec![request.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| invalid_entry(name))?,
        _ => return Err(invalid_entry(name)),
    };
    Ok(Entry {
        name: name.to_string(),
        requests,
    })
}

fn invalid_entry(name: &str) -> CompileError {
    CompileError::InvalidConfig(format!(
        "entry '{name}' must be a module path or a list of module paths"
    ))
}

fn parse_loaders(config: &BundlerConfig) -> Result<Vec<LoaderRule>> {
    let loaders = config
        .get("module")
        .and_then(|module| module.get("loaders"));
    match loaders {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| CompileError::InvalidConfig(format!("invalid module.loaders: {e}"))),
        None => Ok(default_rules()),
    }
}

fn parse_extensions(config: &BundlerConfig) -> Vec<String> {
    config
        .get("resolve")
        .and_then(|resolve| resolve.get("extensions"))
        .and_then(Value::as_array)
        .map(|exts| {
            exts.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(|| RESOLVE_EXTENSIONS.iter().map(|e| e.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> BundlerConfig {
        BundlerConfig::from_value(value).unwrap()
    }

    #[test]
    fn reads_entries_and_plugins() {
        let plan = BuildPlan::from_config(&config(json!({
            "context": "/project",
            "entry": { "index": "./index.js", "admin": ["./a.js", "./b.js"] },
            "output": { "path": "dist" },
            "plugins": [
                { "plugin": "dedupe" },
                { "plugin": "define", "definitions": { "A": "1" } },
                { "plugin": "define", "definitions": { "B": "2" } },
                { "plugin": "banner" }
            ]
        })))
        .unwrap();

        assert_eq!(plan.output_path, PathBuf::from("/project/dist"));
        assert_eq!(plan.filename, "[name].js");
        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.entries[1].requests, vec!["./a.js", "./b.js"]);
        assert!(plan.dedupe);
        assert!(!plan.no_errors);
        assert_eq!(plan.definitions.len(), 2);
        assert_eq!(plan.warnings, vec!["Unknown plugin 'banner' was ignored"]);
    }

    #[test]
    fn missing_output_path_is_a_config_error() {
        let err = BuildPlan::from_config(&config(json!({ "context": "/p" }))).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConfig(_)));
    }

    #[test]
    fn bare_entries_become_main_chunk() {
        let single = BuildPlan::from_config(&config(json!({
            "context": "/p",
            "output": { "path": "/p/dist" },
            "entry": "./index.js"
        })))
        .unwrap();
        assert_eq!(single.entries.len(), 1);
        assert_eq!(single.entries[0].name, "main");
        assert_eq!(single.entries[0].requests, vec!["./index.js"]);

        let list = BuildPlan::from_config(&config(json!({
            "context": "/p",
            "output": { "path": "/p/dist" },
            "entry": ["./a.js", "./b.js"]
        })))
        .unwrap();
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entries[0].name, "main");
        assert_eq!(list.entries[0].requests, vec!["./a.js", "./b.js"]);
    }

    #[test]
    fn non_string_entry_is_a_config_error() {
        let err = BuildPlan::from_config(&config(json!({
            "context": "/p",
            "output": { "path": "/p/dist" },
            "entry": { "index": 3 }
        })))
        .unwrap_err();
        assert!(err.to_string().contains("entry 'index'"));
    }
}
