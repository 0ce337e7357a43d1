//! The compiler seam between build orchestration and the bundling engine.

use atool_config::BundlerConfig;

use crate::error::Result;
use crate::manifest::ManifestCache;
use crate::stats::MultiStats;

/// A bundling engine.
///
/// `compile` runs one synchronous pass over every configuration. Problems with
/// individual modules are reported through the returned stats; `Err` is kept
/// for failures that stop the pass as a whole (invalid configuration, output
/// that cannot be written).
pub trait Compiler {
    fn compile(
        &mut self,
        configs: &[BundlerConfig],
        ctx: &mut CompileContext<'_>,
    ) -> Result<MultiStats>;
}

impl<C: Compiler + ?Sized> Compiler for Box<C> {
    fn compile(
        &mut self,
        configs: &[BundlerConfig],
        ctx: &mut CompileContext<'_>,
    ) -> Result<MultiStats> {
        (**self).compile(configs, ctx)
    }
}

type ProgressFn<'a> = Box<dyn FnMut(f64, &str) + 'a>;

/// State lent to one compile pass.
pub struct CompileContext<'a> {
    /// Hash manifest shared by every configuration and pass.
    pub manifest: &'a mut ManifestCache,
    progress: Option<ProgressFn<'a>>,
    range: (f64, f64),
}

impl<'a> CompileContext<'a> {
    pub fn new(manifest: &'a mut ManifestCache) -> Self {
        Self {
            manifest,
            progress: None,
            range: (0.0, 1.0),
        }
    }

    /// Receives `(percentage in 0..=1, message)` as the pass advances.
    pub fn with_progress(mut self, progress: impl FnMut(f64, &str) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn progress(&mut self, percentage: f64, message: &str) {
        let (start, end) = self.range;
        let scaled = start + (end - start) * percentage.clamp(0.0, 1.0);
        if let Some(progress) = self.progress.as_mut() {
            progress(scaled, message);
        }
    }

    /// Maps subsequent progress into `start..end` of the whole pass.
    pub(crate) fn set_range(&mut self, start: f64, end: f64) {
        self.range = (start, end);
    }
}
