//! Custom configuration merging and validation.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::args::{ConfigSource, TransformFn};
use crate::config::ConfigSet;
use crate::discovery::load_override;
use crate::error::{ConfigError, Result};

/// A project override, resolved once at load time.
#[derive(Clone)]
pub enum Override {
    /// No override present; the configuration passes through unchanged.
    Identity,
    /// Replaces the configuration with the transform's result.
    Transform(TransformFn),
    /// Top-level keys replacing the configuration's keys wholesale.
    Fragment(Map<String, Value>),
}

impl Override {
    /// Resolves an override source. Files are read here; missing files are identity.
    pub fn resolve(source: &ConfigSource) -> Result<Self> {
        match source {
            ConfigSource::Transform(transform) => Ok(Override::Transform(transform.clone())),
            ConfigSource::Path(path) => load_override(path),
        }
    }

    pub fn apply(&self, configs: ConfigSet, env: Option<&str>) -> ConfigSet {
        match self {
            Override::Identity => configs,
            Override::Transform(transform) => {
                let fallback = configs.clone();
                transform(configs, env).unwrap_or(fallback)
            }
            Override::Fragment(fragment) => {
                let mut configs = configs;
                for config in configs.iter_mut() {
                    config.merge_fragment(fragment);
                }
                configs
            }
        }
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Identity => f.write_str("Identity"),
            Override::Transform(_) => f.write_str("Transform(..)"),
            Override::Fragment(map) => f.debug_tuple("Fragment").field(map).finish(),
        }
    }
}

/// Applies the override at `path` to `configs`.
pub fn merge_custom_config(
    configs: impl Into<ConfigSet>,
    path: impl AsRef<Path>,
    env: Option<&str>,
) -> Result<ConfigSet> {
    let resolved = load_override(path.as_ref())?;
    Ok(resolved.apply(configs.into(), env))
}

/// Applies an override from any source.
///
/// A fragment replaces top-level keys of every configuration in the set. A
/// transform receives the whole set; returning `None` keeps the input.
///
/// # Arguments
///
/// * `configs` - A single configuration or a set of them
/// * `source` - Override file or in-memory transform
/// * `env` - Environment name handed to transforms and `profiles` tables
///
/// # Errors
///
/// Returns an error when the override file cannot be read or does not hold
/// an object.
///
/// # Examples
///
/// ```
/// use atool_config::{BundlerConfig, ConfigSource, merge};
/// use serde_json::json;
///
/// let base = BundlerConfig::from_value(json!({ "entry": { "index": "./index.js" } }))?;
/// let source = ConfigSource::transform(|mut configs, env| {
///     for config in configs.iter_mut() {
///         config.insert("devtool", json!(env.unwrap_or("none")));
///     }
///     Some(configs)
/// });
///
/// let merged = merge(base, &source, Some("staging"))?;
/// let config = merged.iter().next().unwrap();
/// assert_eq!(config.get("devtool"), Some(&json!("staging")));
/// # Ok::<(), atool_config::ConfigError>(())
/// ```
pub fn merge(
    configs: impl Into<ConfigSet>,
    source: &ConfigSource,
    env: Option<&str>,
) -> Result<ConfigSet> {
    let resolved = Override::resolve(source)?;
    Ok(resolved.apply(configs.into(), env))
}

/// Every configuration must declare at least one entry point.
pub fn validate(configs: &ConfigSet) -> Result<()> {
    if configs.is_empty() || configs.iter().any(|config| !config.has_entry()) {
        return Err(ConfigError::NoEntry);
    }
    Ok(())
}
