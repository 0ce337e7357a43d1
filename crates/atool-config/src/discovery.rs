//! Override file discovery and loading.
//!
//! An override file is JSON (`.json`) or TOML (`.toml`). It resolves to:
//!
//! - a **transform** when its top-level object has a `profiles` table; the
//!   remaining keys form the base fragment and `profiles.<env>` is layered on
//!   top for the requested environment,
//! - a **fragment** when it is any other object,
//! - an error when it holds anything that is not an object.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::args::DEFAULT_OVERRIDE_FILE;
use crate::config::{ConfigSet, value_kind};
use crate::error::{ConfigError, Result};
use crate::merge::Override;

/// Key holding environment-specific fragments.
pub const PROFILES_KEY: &str = "profiles";

const FALLBACK_OVERRIDE_FILE: &str = "webpack.config.toml";

/// Finds the override file of a project directory.
///
/// Searches in this order:
/// 1. `webpack.config.json`
/// 2. `webpack.config.toml`
pub fn find_override(root: &Path) -> Option<PathBuf> {
    [DEFAULT_OVERRIDE_FILE, FALLBACK_OVERRIDE_FILE]
        .into_iter()
        .map(|name| root.join(name))
        .find(|path| path.exists())
}

/// Loads the override at `path`. A missing file resolves to [`Override::Identity`].
pub fn load_override(path: &Path) -> Result<Override> {
    let path = if path.exists() {
        path.to_path_buf()
    } else if is_default_name(path) {
        match path.parent().and_then(find_override) {
            Some(found) => found,
            None => return Ok(Override::Identity),
        }
    } else {
        tracing::debug!("Override file {} not found, skipping", path.display());
        return Ok(Override::Identity);
    };

    let value = read_value(&path)?;
    resolve_value(&path, value)
}

fn is_default_name(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name == DEFAULT_OVERRIDE_FILE)
}

fn read_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension {
        "json" => serde_json::from_str(&content).map_err(|e| ConfigError::OverrideParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        "toml" => {
            let table: toml::Table =
                toml::from_str(&content).map_err(|e| ConfigError::OverrideParse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            serde_json::to_value(table).map_err(|e| ConfigError::OverrideParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        other => Err(ConfigError::UnsupportedFormat(format!(
            "{} (expected .json or .toml, got '{}')",
            path.display(),
            other
        ))),
    }
}

fn resolve_value(path: &Path, value: Value) -> Result<Override> {
    let Value::Object(mut map) = value else {
        return Err(ConfigError::InvalidOverride {
            path: path.to_path_buf(),
            found: value_kind(&value),
        });
    };

    let Some(profiles) = map.shift_remove(PROFILES_KEY) else {
        tracing::debug!("Loaded override fragment from {}", path.display());
        return Ok(Override::Fragment(map));
    };

    let Value::Object(profiles) = profiles else {
        return Err(ConfigError::InvalidOverride {
            path: path.to_path_buf(),
            found: "a non-table `profiles` value",
        });
    };

    tracing::debug!(
        profiles = profiles.len(),
        "Loaded override transform from {}",
        path.display()
    );
    Ok(profile_transform(map, profiles))
}

fn profile_transform(base: Map<String, Value>, profiles: Map<String, Value>) -> Override {
    Override::Transform(Arc::new(move |mut configs: ConfigSet, env: Option<&str>| {
        let profile = env
            .and_then(|name| profiles.get(name))
            .and_then(Value::as_object);

        for config in configs.iter_mut() {
            config.merge_fragment(&base);
            if let Some(profile) = profile {
                config.merge_fragment(profile);
            }
        }
        Some(configs)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_prefers_json_over_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("webpack.config.toml"), "a = 1").unwrap();
        assert_eq!(
            find_override(dir.path()),
            Some(dir.path().join("webpack.config.toml"))
        );

        fs::write(dir.path().join("webpack.config.json"), "{}").unwrap();
        assert_eq!(
            find_override(dir.path()),
            Some(dir.path().join("webpack.config.json"))
        );
    }

    #[test]
    fn default_name_falls_back_to_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("webpack.config.toml"), "a = 2").unwrap();

        let resolved = load_override(&dir.path().join("webpack.config.json")).unwrap();
        assert!(matches!(resolved, Override::Fragment(ref map) if map["a"] == 2));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("webpack.config.yaml");
        fs::write(&path, "a: 1").unwrap();

        let err = load_override(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn profiles_must_be_a_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("webpack.config.json");
        fs::write(&path, r#"{ "profiles": 3 }"#).unwrap();

        let err = load_override(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }
}
