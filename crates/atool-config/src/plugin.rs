//! Declarative plugin descriptors.
//!
//! Plugins live in `BundlerConfig.plugins` as JSON objects tagged by a
//! `"plugin"` field, so overrides can add, drop or reorder them like any other
//! data. The compiler interprets the recognised ones.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin", rename_all = "kebab-case")]
pub enum PluginSpec {
    /// Moves modules shared by several entries into one commons chunk.
    CommonsChunk { name: String, filename: String },

    /// Collects style modules of each chunk into a separate stylesheet.
    #[serde(rename_all = "camelCase")]
    ExtractCss { filename: String, all_chunks: bool },

    OccurrenceOrder,

    CaseSensitivePaths,

    /// Formats compiler errors and warnings and raises notifications.
    FriendlyErrors,

    Minify(MinifyOptions),

    /// Textual replacement of free expressions, e.g. `process.env.NODE_ENV`.
    Define { definitions: IndexMap<String, String> },

    Dedupe,

    /// Keeps a failing module from aborting emission of the other chunks.
    NoErrors,

    /// Emits `map.json`, mapping logical asset names to hashed file names.
    #[serde(rename_all = "camelCase")]
    HashManifest { assets_path: String },
}

impl PluginSpec {
    pub fn name(&self) -> &'static str {
        match self {
            PluginSpec::CommonsChunk { .. } => "commons-chunk",
            PluginSpec::ExtractCss { .. } => "extract-css",
            PluginSpec::OccurrenceOrder => "occurrence-order",
            PluginSpec::CaseSensitivePaths => "case-sensitive-paths",
            PluginSpec::FriendlyErrors => "friendly-errors",
            PluginSpec::Minify(_) => "minify",
            PluginSpec::Define { .. } => "define",
            PluginSpec::Dedupe => "dedupe",
            PluginSpec::NoErrors => "no-errors",
            PluginSpec::HashManifest { .. } => "hash-manifest",
        }
    }

    /// `define` plugin injecting `process.env.NODE_ENV` as a JSON string literal.
    pub fn node_env(value: &str) -> Self {
        let mut definitions = IndexMap::new();
        definitions.insert(
            "process.env.NODE_ENV".to_string(),
            Value::String(value.to_string()).to_string(),
        );
        PluginSpec::Define { definitions }
    }

    pub fn to_value(&self) -> Value {
        // Every variant serialises to a plain JSON object.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Value of the `"plugin"` tag of a raw descriptor.
    pub fn name_of(value: &Value) -> Option<&str> {
        value.get("plugin").and_then(Value::as_str)
    }
}

/// Options of the minification plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifyOptions {
    pub output: MinifyOutput,
    pub mangle: MinifyMangle,
    pub compress: MinifyCompress,
    pub source_map: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifyOutput {
    pub ascii_only: bool,
    pub beautify: bool,
    pub quote_keys: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifyMangle {
    pub screw_ie8: bool,
    pub keep_fnames: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifyCompress {
    pub warnings: bool,
    pub properties: bool,
    pub keep_fnames: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            output: MinifyOutput {
                ascii_only: true,
                beautify: false,
                quote_keys: true,
            },
            mangle: MinifyMangle {
                screw_ie8: false,
                keep_fnames: true,
            },
            compress: MinifyCompress {
                warnings: false,
                properties: false,
                keep_fnames: true,
            },
            source_map: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptors_are_tagged_objects() {
        assert_eq!(PluginSpec::Dedupe.to_value(), json!({ "plugin": "dedupe" }));
        assert_eq!(
            PluginSpec::HashManifest {
                assets_path: "demo".into()
            }
            .to_value(),
            json!({ "plugin": "hash-manifest", "assetsPath": "demo" })
        );
    }

    #[test]
    fn node_env_define_quotes_value() {
        let PluginSpec::Define { definitions } = PluginSpec::node_env("production") else {
            panic!("expected define plugin");
        };
        assert_eq!(
            definitions.get("process.env.NODE_ENV").map(String::as_str),
            Some("\"production\"")
        );
    }

    #[test]
    fn minify_options_keep_fixed_sub_options() {
        let value = PluginSpec::Minify(MinifyOptions::default()).to_value();
        assert_eq!(value["plugin"], "minify");
        assert_eq!(value["output"]["asciiOnly"], true);
        assert_eq!(value["mangle"]["keepFnames"], true);
        assert_eq!(value["compress"]["warnings"], false);
        assert_eq!(value["sourceMap"], false);
    }

    #[test]
    fn names_match_tags() {
        for spec in [
            PluginSpec::Dedupe,
            PluginSpec::NoErrors,
            PluginSpec::node_env("development"),
            PluginSpec::Minify(MinifyOptions::default()),
            PluginSpec::OccurrenceOrder,
        ] {
            assert_eq!(PluginSpec::name_of(&spec.to_value()), Some(spec.name()));
        }
    }

    #[test]
    fn unknown_descriptor_is_not_recognised() {
        assert!(PluginSpec::from_value(&json!({ "plugin": "banner" })).is_none());
        assert_eq!(
            PluginSpec::from_value(&json!({ "plugin": "no-errors" })),
            Some(PluginSpec::NoErrors)
        );
    }
}
