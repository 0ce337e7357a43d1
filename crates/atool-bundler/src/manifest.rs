//! Logical-name to hashed-name mapping (`map.json`).
//!
//! The cache lives as long as the orchestrator that owns it, so entries
//! accumulate across every configuration of a multi-target build and across
//! watch passes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// File name of the manifest written into `output.path`.
pub const MANIFEST_FILE: &str = "map.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestCache {
    entries: IndexMap<String, String>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `logical → hashed`. Returns `true` when the mapping changed.
    pub fn record(&mut self, logical: impl Into<String>, hashed: impl Into<String>) -> bool {
        let hashed = hashed.into();
        match self.entries.insert(logical.into(), hashed.clone()) {
            Some(previous) => previous != hashed,
            None => true,
        }
    }

    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

/// Joins a manifest prefix and a file name; an empty prefix adds nothing.
pub fn manifest_key(assets_path: &str, file: &str) -> String {
    let prefix = assets_path.trim_end_matches('/');
    if prefix.is_empty() {
        file.to_string()
    } else {
        format!("{prefix}/{file}")
    }
}
