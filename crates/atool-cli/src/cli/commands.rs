use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available atool subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project
    ///
    /// Assembles the bundler configuration from package.json and the flags,
    /// merges the project override and compiles every configuration. With
    /// --watch the build repeats on every file change until interrupted.
    Build(BuildArgs),

    /// Print the resolved bundler configuration
    ///
    /// Runs the same assembly, override merging and validation as `build`,
    /// then prints the configuration as JSON instead of compiling it.
    Check(CheckArgs),
}

/// Flags shared by every command that resolves a configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Project directory
    ///
    /// package.json and the override file are read from here. Defaults to
    /// the current directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Output directory for bundles
    ///
    /// Defaults to `dist` inside the project directory.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_path: Option<PathBuf>,

    /// Public URL prefix of emitted files
    #[arg(long, value_name = "URL")]
    pub public_path: Option<String>,

    /// Skip minification
    ///
    /// Builds are minified unless this flag is given or watch mode is on.
    #[arg(long)]
    pub no_compress: bool,

    /// Add content hashes to file names and write map.json
    ///
    /// Emits `[name]-[chunkhash:8].js` style names and a manifest mapping the
    /// plain names (prefixed with the package name) to the hashed ones.
    #[arg(long)]
    pub hash: bool,

    /// Override file
    ///
    /// JSON or TOML file whose top-level keys replace the assembled ones.
    /// A `profiles` table selects extra keys per --env. Defaults to
    /// webpack.config.json (then webpack.config.toml) in the project directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Source map style passed through to the bundler configuration
    #[arg(long, value_name = "STR")]
    pub devtool: Option<String>,

    /// Disable desktop notifications
    #[arg(long)]
    pub silent: bool,

    /// Environment name used to pick a profile from the override file
    #[arg(long, value_name = "NAME")]
    pub env: Option<String>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Rebuild on file changes
    ///
    /// Changes are aggregated for MS milliseconds (200 when omitted) before
    /// the next rebuild. Watch builds are never minified or deduplicated.
    ///
    /// Examples:
    ///   atool build --watch
    ///   atool build --watch 500
    #[arg(short = 'w', long, value_name = "MS", num_args = 0..=1)]
    pub watch: Option<Option<u64>>,

    /// Write the stats report as JSON
    ///
    /// The report lands in the output directory of the last configuration,
    /// named FILE or build-bundle.json.
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub json: Option<Option<String>>,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}
