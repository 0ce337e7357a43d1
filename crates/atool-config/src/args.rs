//! Caller-supplied build options.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigSet;

/// Default aggregation delay between a file change and the next watch rebuild.
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 200;

/// Default file name of the JSON stats report.
pub const DEFAULT_JSON_REPORT: &str = "build-bundle.json";

/// Override file looked up in `cwd` when no `config` is supplied.
pub const DEFAULT_OVERRIDE_FILE: &str = "webpack.config.json";

/// In-memory override transform. Receives the assembled configuration and the
/// environment name; returning `None` keeps the input unchanged.
pub type TransformFn = Arc<dyn Fn(ConfigSet, Option<&str>) -> Option<ConfigSet> + Send + Sync>;

/// Watch mode setting.
///
/// Deserialises from `false`, `true` or an interval in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "WatchRepr", into = "WatchRepr")]
pub enum WatchMode {
    #[default]
    Disabled,
    Enabled,
    Interval(u64),
}

impl WatchMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, WatchMode::Disabled)
    }

    /// Aggregation delay for rebuilds, `None` when watching is off.
    pub fn interval(self) -> Option<Duration> {
        match self {
            WatchMode::Disabled => None,
            WatchMode::Enabled => Some(Duration::from_millis(DEFAULT_WATCH_INTERVAL_MS)),
            WatchMode::Interval(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WatchRepr {
    Flag(bool),
    Interval(u64),
}

impl From<WatchRepr> for WatchMode {
    fn from(repr: WatchRepr) -> Self {
        match repr {
            WatchRepr::Flag(false) => WatchMode::Disabled,
            WatchRepr::Flag(true) => WatchMode::Enabled,
            WatchRepr::Interval(ms) => WatchMode::Interval(ms),
        }
    }
}

impl From<WatchMode> for WatchRepr {
    fn from(mode: WatchMode) -> Self {
        match mode {
            WatchMode::Disabled => WatchRepr::Flag(false),
            WatchMode::Enabled => WatchRepr::Flag(true),
            WatchMode::Interval(ms) => WatchRepr::Interval(ms),
        }
    }
}

/// JSON stats report setting.
///
/// Deserialises from `false`, `true` or a file name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "JsonRepr", into = "JsonRepr")]
pub enum JsonReport {
    #[default]
    Disabled,
    Default,
    File(String),
}

impl JsonReport {
    /// Report file name, `None` when no report was requested.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            JsonReport::Disabled => None,
            JsonReport::Default => Some(DEFAULT_JSON_REPORT),
            JsonReport::File(name) => Some(name),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum JsonRepr {
    Flag(bool),
    File(String),
}

impl From<JsonRepr> for JsonReport {
    fn from(repr: JsonRepr) -> Self {
        match repr {
            JsonRepr::Flag(false) => JsonReport::Disabled,
            JsonRepr::Flag(true) => JsonReport::Default,
            JsonRepr::File(name) => JsonReport::File(name),
        }
    }
}

impl From<JsonReport> for JsonRepr {
    fn from(report: JsonReport) -> Self {
        match report {
            JsonReport::Disabled => JsonRepr::Flag(false),
            JsonReport::Default => JsonRepr::Flag(true),
            JsonReport::File(name) => JsonRepr::File(name),
        }
    }
}

/// Where the project-local override comes from.
#[derive(Clone)]
pub enum ConfigSource {
    /// Override file, resolved relative to `cwd`.
    Path(PathBuf),
    /// Transform supplied in memory by the caller.
    Transform(TransformFn),
}

impl ConfigSource {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(ConfigSet, Option<&str>) -> Option<ConfigSet> + Send + Sync + 'static,
    {
        ConfigSource::Transform(Arc::new(f))
    }
}

impl fmt::Debug for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ConfigSource::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Options for one build invocation.
#[derive(Debug, Clone)]
pub struct BuildArgs {
    pub cwd: PathBuf,
    pub output_path: Option<PathBuf>,
    pub public_path: Option<String>,
    pub compress: bool,
    pub watch: WatchMode,
    pub hash: bool,
    pub verbose: bool,
    pub silent: bool,
    pub json: JsonReport,
    pub config: Option<ConfigSource>,
    pub devtool: Option<String>,
    /// Environment name handed to override transforms.
    pub env: Option<String>,
}

impl BuildArgs {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            output_path: None,
            public_path: None,
            compress: true,
            watch: WatchMode::Disabled,
            hash: false,
            verbose: false,
            silent: false,
            json: JsonReport::Disabled,
            config: None,
            devtool: None,
            env: None,
        }
    }

    /// Override source to apply: the configured one, or the default file in `cwd`.
    pub fn config_source(&self) -> ConfigSource {
        match &self.config {
            Some(ConfigSource::Path(path)) => ConfigSource::Path(self.cwd.join(path)),
            Some(source) => source.clone(),
            None => ConfigSource::Path(self.cwd.join(DEFAULT_OVERRIDE_FILE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_mode_deserializes_bool_and_interval() {
        let off: WatchMode = serde_json::from_str("false").unwrap();
        let on: WatchMode = serde_json::from_str("true").unwrap();
        let every: WatchMode = serde_json::from_str("500").unwrap();

        assert_eq!(off, WatchMode::Disabled);
        assert_eq!(on, WatchMode::Enabled);
        assert_eq!(every, WatchMode::Interval(500));
    }

    #[test]
    fn watch_interval_defaults_to_200ms() {
        assert_eq!(WatchMode::Disabled.interval(), None);
        assert_eq!(
            WatchMode::Enabled.interval(),
            Some(Duration::from_millis(200))
        );
        assert_eq!(
            WatchMode::Interval(1000).interval(),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn json_report_file_names() {
        assert_eq!(JsonReport::Disabled.file_name(), None);
        assert_eq!(JsonReport::Default.file_name(), Some("build-bundle.json"));
        assert_eq!(
            JsonReport::File("stats.json".into()).file_name(),
            Some("stats.json")
        );

        let parsed: JsonReport = serde_json::from_str("\"custom.json\"").unwrap();
        assert_eq!(parsed, JsonReport::File("custom.json".into()));
    }

    #[test]
    fn default_args_compress_and_use_default_override() {
        let args = BuildArgs::new("/project");
        assert!(args.compress);
        assert!(!args.watch.is_enabled());

        match args.config_source() {
            ConfigSource::Path(path) => {
                assert_eq!(path, PathBuf::from("/project/webpack.config.json"))
            }
            ConfigSource::Transform(_) => panic!("expected a path source"),
        }
    }

    #[test]
    fn relative_config_path_resolves_against_cwd() {
        let mut args = BuildArgs::new("/project");
        args.config = Some(ConfigSource::Path(PathBuf::from("custom.config.json")));

        match args.config_source() {
            ConfigSource::Path(path) => {
                assert_eq!(path, PathBuf::from("/project/custom.config.json"))
            }
            ConfigSource::Transform(_) => panic!("expected a path source"),
        }
    }
}
