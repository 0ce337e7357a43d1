//! Bundler configuration for atool.
//!
//! Turns [`BuildArgs`] into a [`ConfigSet`]: the assembler derives a base
//! configuration from the arguments and `package.json`, the merger applies the
//! project override, and validation rejects configurations without entries.

pub mod args;
pub mod assemble;
pub mod config;
pub mod discovery;
pub mod error;
pub mod loaders;
pub mod merge;
pub mod package;
pub mod pipeline;
pub mod plugin;

pub use args::{
    BuildArgs, ConfigSource, DEFAULT_JSON_REPORT, DEFAULT_OVERRIDE_FILE,
    DEFAULT_WATCH_INTERVAL_MS, JsonReport, TransformFn, WatchMode,
};
pub use assemble::{ConfigAssembler, common_config};
pub use config::{BundlerConfig, ConfigSet};
pub use discovery::{PROFILES_KEY, find_override, load_override};
pub use error::{ConfigError, NO_ENTRY_MESSAGE, Result};
pub use loaders::{LoaderRule, default_rules};
pub use merge::{Override, merge, merge_custom_config, validate};
pub use package::PackageManifest;
pub use pipeline::{prepare, prepare_with_env};
pub use plugin::{MinifyOptions, PluginSpec};
