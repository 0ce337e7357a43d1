//! Build settings layered from defaults, `ATOOL_*` environment variables and
//! command-line flags.
//!
//! Priority: flags > environment variables > defaults. Only flags that were
//! actually given take part in the top layer, so `ATOOL_HASH=true` survives a
//! command line without `--hash`.

use std::path::PathBuf;

use atool_config::{ConfigSource, JsonReport, WatchMode};
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::cli::{BuildArgs, CheckArgs, ConfigArgs};
use crate::error::{CliError, Result};

/// Prefix of the environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "ATOOL_";

/// Resolved options of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub cwd: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub public_path: Option<String>,
    pub compress: bool,
    pub watch: WatchMode,
    pub hash: bool,
    pub verbose: bool,
    pub silent: bool,
    pub json: JsonReport,
    pub config: Option<PathBuf>,
    pub devtool: Option<String>,
    pub env: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cwd: None,
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
}

/// The flags that were given on the command line.
#[derive(Debug, Default, Serialize)]
struct FlagLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    watch: Option<WatchMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    silent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    json: Option<JsonReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    devtool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<String>,
}

impl FlagLayer {
    fn from_config_args(args: &ConfigArgs, verbose: bool) -> Self {
        Self {
            cwd: args.cwd.clone(),
            output_path: args.output_path.clone(),
            public_path: args.public_path.clone(),
            compress: args.no_compress.then_some(false),
            hash: args.hash.then_some(true),
            verbose: verbose.then_some(true),
            silent: args.silent.then_some(true),
            config: args.config.clone(),
            devtool: args.devtool.clone(),
            env: args.env.clone(),
            ..Self::default()
        }
    }
}

impl Settings {
    /// Settings for `atool build`.
    pub fn for_build(args: &BuildArgs, verbose: bool) -> Result<Self> {
        let mut flags = FlagLayer::from_config_args(&args.config, verbose);
        flags.watch = args.watch.map(|interval| match interval {
            Some(ms) => WatchMode::Interval(ms),
            None => WatchMode::Enabled,
        });
        flags.json = args.json.clone().map(|file| match file {
            Some(name) => JsonReport::File(name),
            None => JsonReport::Default,
        });
        Self::extract(Self::figment(flags))
    }

    /// Settings for `atool check`. Watch and report settings are ignored.
    pub fn for_check(args: &CheckArgs, verbose: bool) -> Result<Self> {
        let flags = FlagLayer::from_config_args(&args.config, verbose);
        let settings = Self::extract(Self::figment(flags))?;
        Ok(Self {
            watch: WatchMode::Disabled,
            json: JsonReport::Disabled,
            ..settings
        })
    }

    fn figment(flags: FlagLayer) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(flags))
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| CliError::InvalidArgument(format!("invalid settings: {e}")))
    }

    /// Converts to the options the configuration pipeline consumes.
    ///
    /// A relative `cwd` is resolved against the current directory.
    pub fn into_build_args(self) -> Result<atool_config::BuildArgs> {
        let current = std::env::current_dir()?;
        let cwd = match self.cwd {
            Some(cwd) if cwd.is_absolute() => cwd,
            Some(cwd) => current.join(cwd),
            None => current,
        };

        let mut args = atool_config::BuildArgs::new(cwd);
        args.output_path = self.output_path;
        args.public_path = self.public_path;
        args.compress = self.compress;
        args.watch = self.watch;
        args.hash = self.hash;
        args.verbose = self.verbose;
        args.silent = self.silent;
        args.json = self.json;
        args.config = self.config.map(ConfigSource::Path);
        args.devtool = self.devtool;
        args.env = self.env;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            for key in [
                "ATOOL_HASH",
                "ATOOL_COMPRESS",
                "ATOOL_WATCH",
                "ATOOL_JSON",
                "ATOOL_OUTPUT_PATH",
                "ATOOL_ENV",
            ] {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_flags() {
        clear_env();
        let settings = Settings::for_build(&BuildArgs::default(), false).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.compress);
    }

    #[test]
    #[serial]
    fn test_flags_map_onto_settings() {
        clear_env();
        let args = BuildArgs {
            config: ConfigArgs {
                no_compress: true,
                hash: true,
                output_path: Some(PathBuf::from("out")),
                ..ConfigArgs::default()
            },
            watch: Some(Some(500)),
            json: Some(None),
        };

        let settings = Settings::for_build(&args, true).unwrap();
        assert!(!settings.compress);
        assert!(settings.hash);
        assert!(settings.verbose);
        assert_eq!(settings.watch, WatchMode::Interval(500));
        assert_eq!(settings.json, JsonReport::Default);
        assert_eq!(settings.output_path, Some(PathBuf::from("out")));
    }

    #[test]
    #[serial]
    fn test_environment_layer() {
        clear_env();
        unsafe {
            std::env::set_var("ATOOL_HASH", "true");
            std::env::set_var("ATOOL_JSON", "stats.json");
            std::env::set_var("ATOOL_ENV", "staging");
        }

        let settings = Settings::for_build(&BuildArgs::default(), false).unwrap();
        clear_env();

        assert!(settings.hash);
        assert_eq!(settings.json, JsonReport::File("stats.json".into()));
        assert_eq!(settings.env.as_deref(), Some("staging"));
    }

    #[test]
    #[serial]
    fn test_flags_beat_environment() {
        clear_env();
        unsafe {
            std::env::set_var("ATOOL_ENV", "staging");
            std::env::set_var("ATOOL_COMPRESS", "true");
        }
        let args = BuildArgs {
            config: ConfigArgs {
                env: Some("production".into()),
                no_compress: true,
                ..ConfigArgs::default()
            },
            ..BuildArgs::default()
        };

        let settings = Settings::for_build(&args, false).unwrap();
        clear_env();

        assert_eq!(settings.env.as_deref(), Some("production"));
        assert!(!settings.compress);
    }

    #[test]
    #[serial]
    fn test_check_ignores_watch_from_environment() {
        clear_env();
        unsafe { std::env::set_var("ATOOL_WATCH", "true") };

        let settings = Settings::for_check(&CheckArgs::default(), false).unwrap();
        clear_env();

        assert_eq!(settings.watch, WatchMode::Disabled);
    }

    #[test]
    fn test_into_build_args() {
        let settings = Settings {
            cwd: Some(PathBuf::from("/project")),
            config: Some(PathBuf::from("custom.json")),
            hash: true,
            ..Settings::default()
        };

        let args = settings.into_build_args().unwrap();
        assert_eq!(args.cwd, PathBuf::from("/project"));
        assert!(args.hash);
        assert!(matches!(
            args.config_source(),
            ConfigSource::Path(path) if path == PathBuf::from("/project/custom.json")
        ));
    }
}
