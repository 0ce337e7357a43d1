//! Assemble, merge and validate in one call.

use crate::args::BuildArgs;
use crate::assemble::ConfigAssembler;
use crate::config::ConfigSet;
use crate::error::Result;
use crate::merge::{Override, validate};

/// Resolves the final configuration set for `args`, reading `NODE_ENV` from
/// the process environment.
///
/// Assembles the base configuration from `args` and `package.json`, applies
/// the override named by [`BuildArgs::config_source`] and validates the result.
///
/// # Arguments
///
/// * `args` - Build options; `args.env` is handed to override transforms
///
/// # Errors
///
/// Returns [`ConfigError::NoEntry`](crate::ConfigError::NoEntry) when any
/// configuration ends up without an entry, and a parse error when
/// `package.json` or the override file is malformed.
///
/// # Examples
///
/// ```no_run
/// use atool_config::{BuildArgs, prepare};
///
/// let mut args = BuildArgs::new("/path/to/project");
/// args.hash = true;
///
/// let configs = prepare(&args)?;
/// for config in configs.iter() {
///     println!("{:?}", config.output_path());
/// }
/// # Ok::<(), atool_config::ConfigError>(())
/// ```
pub fn prepare(args: &BuildArgs) -> Result<ConfigSet> {
    resolve(args, ConfigAssembler::new(args))
}

/// Same as [`prepare`] with an explicit `NODE_ENV` value.
pub fn prepare_with_env(args: &BuildArgs, node_env: Option<String>) -> Result<ConfigSet> {
    resolve(args, ConfigAssembler::new(args).with_node_env(node_env))
}

fn resolve(args: &BuildArgs, assembler: ConfigAssembler<'_>) -> Result<ConfigSet> {
    let base = assembler.assemble()?;
    let source = args.config_source();
    let resolved = Override::resolve(&source)?;
    tracing::debug!(source = ?source, resolved = ?resolved, "Resolved config override");

    let configs = resolved.apply(ConfigSet::from(base), args.env.as_deref());
    validate(&configs)?;
    Ok(configs)
}
