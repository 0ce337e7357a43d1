//! Build statistics, the payload of every build result and of the JSON report.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CompileError, Result};
use crate::hash::combined_hash;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Compilation hash over every rendered chunk.
    pub hash: String,
    pub version: String,
    /// Compile time in milliseconds.
    pub time: u64,
    pub output_path: PathBuf,
    #[serde(default)]
    pub public_path: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub assets: Vec<AssetStats>,
    pub chunks: Vec<ChunkStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStats {
    pub name: String,
    pub size: usize,
    pub chunks: Vec<usize>,
    pub chunk_names: Vec<String>,
    /// `false` when the asset was rendered but withheld because of errors.
    pub emitted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkStats {
    pub id: usize,
    pub names: Vec<String>,
    pub files: Vec<String>,
    pub size: usize,
    pub entry: bool,
    pub initial: bool,
    pub hash: String,
    pub modules: Vec<ModuleStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStats {
    pub id: usize,
    pub name: String,
    pub size: usize,
    pub kind: String,
}

impl Stats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn emitted_assets(&self) -> impl Iterator<Item = &AssetStats> {
        self.assets.iter().filter(|asset| asset.emitted)
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|source| CompileError::Serialize {
            what: "stats",
            source,
        })
    }
}

/// Stats of one compile call; one child per configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiStats {
    pub hash: String,
    pub children: Vec<Stats>,
}

impl MultiStats {
    pub fn new(children: Vec<Stats>) -> Self {
        let hash = combined_hash(children.iter().map(|child| child.hash.as_str()));
        Self { hash, children }
    }

    pub fn has_errors(&self) -> bool {
        self.children.iter().any(Stats::has_errors)
    }

    pub fn has_warnings(&self) -> bool {
        self.children.iter().any(Stats::has_warnings)
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.children
            .iter()
            .flat_map(|child| child.errors.iter().map(String::as_str))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.children
            .iter()
            .flat_map(|child| child.warnings.iter().map(String::as_str))
    }

    /// Longest compile time among the children.
    pub fn time(&self) -> u64 {
        self.children.iter().map(|c| c.time).max().unwrap_or(0)
    }

    /// JSON report payload: a single configuration reports its stats directly,
    /// several configurations report `{ hash, children }`.
    pub fn to_json(&self) -> Result<Value> {
        match self.children.as_slice() {
            [only] => only.to_json(),
            _ => serde_json::to_value(self).map_err(|source| CompileError::Serialize {
                what: "stats",
                source,
            }),
        }
    }
}
