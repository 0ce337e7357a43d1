//! Project manifest (`package.json`) fields the assembler reads.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,

    /// Entry mapping, copied verbatim into the bundler configuration.
    #[serde(default)]
    pub entry: Option<Value>,

    /// Browser field; built-ins listed here are not replaced by empty modules.
    #[serde(default)]
    pub browser: Option<Map<String, Value>>,
}

impl PackageManifest {
    /// Reads `cwd/package.json`. A missing manifest yields the empty default.
    pub fn load(cwd: &Path) -> Result<Self> {
        let path = cwd.join("package.json");
        if !path.exists() {
            tracing::debug!("No package.json in {}", cwd.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Manifest { path, source })
    }

    pub fn maps_builtin(&self, name: &str) -> bool {
        self.browser
            .as_ref()
            .is_some_and(|browser| browser.contains_key(name))
    }
}
