//! Bundling engine for atool.
//!
//! The [`Compiler`] trait is the seam the build orchestrator drives;
//! [`NativeCompiler`] is the engine shipped with the CLI. A compile pass
//! returns [`MultiStats`] and records hashed file names in the
//! [`ManifestCache`] lent to it through the [`CompileContext`].

pub mod compiler;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod module;
pub mod native;
pub mod plan;
pub mod render;
pub mod stats;
pub mod template;
pub mod transform;
pub mod writer;

pub use compiler::{CompileContext, Compiler};
pub use error::{CompileError, Result};
pub use manifest::{MANIFEST_FILE, ManifestCache};
pub use native::NativeCompiler;
pub use stats::{AssetStats, ChunkStats, ModuleStats, MultiStats, Stats};
