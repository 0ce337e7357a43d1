//! Bundler configuration objects.
//!
//! A [`BundlerConfig`] is an ordered mapping of webpack-shaped keys (`entry`,
//! `output`, `module`, `plugins`, ...) to JSON values. Keeping it untyped lets
//! project overrides add or replace any key; typed accessors cover the keys the
//! assembler and the compiler care about.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::plugin::PluginSpec;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundlerConfig(Map<String, Value>);

impl BundlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConfigError::InvalidValue(format!(
                "bundler config must be an object, got {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Top-level merge: every key of `fragment` replaces the key in `self` wholesale.
    /// Nested objects and arrays are not merged.
    pub fn merge_fragment(&mut self, fragment: &Map<String, Value>) {
        for (key, value) in fragment {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// True for a non-empty entry object, module path or list of paths.
    pub fn has_entry(&self) -> bool {
        match self.0.get("entry") {
            Some(Value::Object(entries)) => !entries.is_empty(),
            Some(Value::Array(requests)) => !requests.is_empty(),
            Some(Value::String(request)) => !request.is_empty(),
            _ => false,
        }
    }

    /// Directory that relative entry paths resolve against.
    pub fn context(&self) -> Option<PathBuf> {
        self.0
            .get("context")
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    pub fn output(&self) -> Option<&Map<String, Value>> {
        self.0.get("output").and_then(Value::as_object)
    }

    /// Mutable `output` object, created when missing or not an object.
    pub fn output_mut(&mut self) -> &mut Map<String, Value> {
        let slot = self
            .0
            .entry("output")
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot {
            Value::Object(map) => map,
            _ => unreachable!("output slot was just normalised to an object"),
        }
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output_str("path").map(PathBuf::from)
    }

    pub fn output_str(&self, key: &str) -> Option<&str> {
        self.output()
            .and_then(|output| output.get(key))
            .and_then(Value::as_str)
    }

    /// Raw plugin descriptors in declaration order.
    pub fn plugins(&self) -> &[Value] {
        self.0
            .get("plugins")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn push_plugin(&mut self, plugin: PluginSpec) {
        let slot = self
            .0
            .entry("plugins")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(plugins) = slot {
            plugins.push(plugin.to_value());
        }
    }

    /// Plugin descriptors split into recognised specs and unrecognised raw values.
    pub fn plugin_specs(&self) -> (Vec<PluginSpec>, Vec<Value>) {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for raw in self.plugins() {
            match PluginSpec::from_value(raw) {
                Some(spec) => known.push(spec),
                None => unknown.push(raw.clone()),
            }
        }
        (known, unknown)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins()
            .iter()
            .any(|raw| PluginSpec::name_of(raw) == Some(name))
    }
}

impl From<Map<String, Value>> for BundlerConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One configuration or an ordered sequence of them (multi-target build).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigSet {
    Single(BundlerConfig),
    Multi(Vec<BundlerConfig>),
}

impl ConfigSet {
    pub fn iter(&self) -> std::slice::Iter<'_, BundlerConfig> {
        match self {
            ConfigSet::Single(config) => std::slice::from_ref(config).iter(),
            ConfigSet::Multi(configs) => configs.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BundlerConfig> {
        match self {
            ConfigSet::Single(config) => std::slice::from_mut(config).iter_mut(),
            ConfigSet::Multi(configs) => configs.iter_mut(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ConfigSet::Single(_) => 1,
            ConfigSet::Multi(configs) => configs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<BundlerConfig> {
        match self {
            ConfigSet::Single(config) => vec![config],
            ConfigSet::Multi(configs) => configs,
        }
    }

    /// Single configuration, if this set holds exactly one.
    pub fn as_single(&self) -> Option<&BundlerConfig> {
        match self {
            ConfigSet::Single(config) => Some(config),
            ConfigSet::Multi(_) => None,
        }
    }
}

impl From<BundlerConfig> for ConfigSet {
    fn from(config: BundlerConfig) -> Self {
        ConfigSet::Single(config)
    }
}

impl From<Vec<BundlerConfig>> for ConfigSet {
    fn from(configs: Vec<BundlerConfig>) -> Self {
        ConfigSet::Multi(configs)
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
