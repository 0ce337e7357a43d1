//! Reference compiler.
//!
//! Reads every entry module from disk, classifies it through the loader table,
//! groups modules into chunks and emits them. There is no dependency graph:
//! a chunk holds exactly the modules its entry lists.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use atool_config::BundlerConfig;
use indexmap::IndexMap;
use serde_json::Value;

use crate::compiler::{CompileContext, Compiler};
use crate::error::{CompileError, Result};
use crate::hash::{combined_hash, content_hash};
use crate::manifest::{MANIFEST_FILE, manifest_key};
use crate::module::{LoaderTable, Module, ModuleKind, Resolver};
use crate::plan::BuildPlan;
use crate::render::{Body, ChunkWriter};
use crate::stats::{AssetStats, ChunkStats, ModuleStats, MultiStats, Stats};
use crate::template::{TemplateVars, render};
use crate::transform::{Definitions, minify_script, minify_style};
use crate::writer::{OutputFile, write_output};

const ASSET_TEMPLATE: &str = "[hash:20].[ext]";

#[derive(Debug, Default)]
pub struct NativeCompiler {
    _private: (),
}

impl NativeCompiler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Compiler for NativeCompiler {
    fn compile(
        &mut self,
        configs: &[BundlerConfig],
        ctx: &mut CompileContext<'_>,
    ) -> Result<MultiStats> {
        let total = configs.len().max(1) as f64;
        let mut children = Vec::with_capacity(configs.len());

        for (index, config) in configs.iter().enumerate() {
            ctx.set_range(index as f64 / total, (index + 1) as f64 / total);
            let stats = compile_config(config, ctx)?;
            tracing::debug!(
                config = index,
                hash = %stats.hash,
                errors = stats.errors.len(),
                warnings = stats.warnings.len(),
                "Compiled configuration"
            );
            children.push(stats);
        }

        ctx.set_range(0.0, 1.0);
        ctx.progress(1.0, "");
        Ok(MultiStats::new(children))
    }
}

/// Modules loaded so far, indexed by path and, with dedupe, by content.
#[derive(Default)]
struct ModuleSet {
    modules: Vec<Module>,
    by_path: HashMap<PathBuf, usize>,
    by_hash: HashMap<String, usize>,
}

impl ModuleSet {
    fn load(
        &mut self,
        request: &str,
        resolver: &Resolver<'_>,
        loaders: &LoaderTable,
        dedupe: bool,
    ) -> std::result::Result<usize, String> {
        let path = resolver.resolve(request)?;
        if let Some(&index) = self.by_path.get(&path) {
            return Ok(index);
        }

        let kind = loaders.classify(&path)?;
        let content = fs::read(&path).map_err(|e| format!("Module build failed: {e}"))?;
        if kind.is_text() && std::str::from_utf8(&content).is_err() {
            return Err(format!(
                "Module build failed: {} is not valid UTF-8",
                path.display()
            ));
        }
        if kind == ModuleKind::Json {
            serde_json::from_slice::<Value>(&content)
                .map_err(|e| format!("Module parse failed: {e}"))?;
        }

        let hash = content_hash(&content);
        if dedupe {
            if let Some(&index) = self.by_hash.get(&hash) {
                tracing::debug!("Deduplicated {} into {}", request, self.modules[index].name);
                self.by_path.insert(path, index);
                return Ok(index);
            }
        }

        let index = self.modules.len();
        self.modules.push(Module {
            id: index,
            name: request.to_string(),
            path: path.clone(),
            kind,
            content,
            hash: hash.clone(),
        });
        self.by_path.insert(path, index);
        self.by_hash.entry(hash).or_insert(index);
        Ok(index)
    }
}

struct ChunkPlan {
    name: String,
    entry: bool,
    template: String,
    modules: Vec<usize>,
    bootstrap: Vec<usize>,
    errors: Vec<String>,
}

impl ChunkPlan {
    fn new(name: &str, template: &str, entry: bool) -> Self {
        Self {
            name: name.to_string(),
            entry,
            template: template.to_string(),
            modules: Vec::new(),
            bootstrap: Vec::new(),
            errors: Vec::new(),
        }
    }
}

struct RenderedChunk {
    js: String,
    hash: String,
    css: Option<(String, String)>,
    files: Vec<OutputFile>,
}

fn compile_config(config: &BundlerConfig, ctx: &mut CompileContext<'_>) -> Result<Stats> {
    let started = Instant::now();
    let plan = BuildPlan::from_config(config)?;
    let definitions = Definitions::new(&plan.definitions)?;
    ctx.progress(0.1, "compile");

    // Build modules
    let resolver = Resolver::new(&plan.context, plan.extensions.clone(), plan.case_sensitive);
    let total = plan
        .entries
        .iter()
        .map(|e| e.requests.len())
        .sum::<usize>()
        .max(1);
    let mut set = ModuleSet::default();
    let mut chunks = Vec::with_capacity(plan.entries.len() + 1);
    let mut done = 0usize;

    for entry in &plan.entries {
        let mut chunk = ChunkPlan::new(&entry.name, &plan.filename, true);
        for request in &entry.requests {
            match set.load(request, &resolver, &plan.loaders, plan.dedupe) {
                Ok(index) => {
                    if !chunk.modules.contains(&index) {
                        chunk.modules.push(index);
                        chunk.bootstrap.push(index);
                    }
                }
                Err(message) => chunk.errors.push(format!("{request}\n{message}")),
            }
            done += 1;
            ctx.progress(0.1 + 0.6 * done as f64 / total as f64, "build modules");
        }
        chunks.push(chunk);
    }

    // Optimize
    ctx.progress(0.75, "optimize");
    let mut modules = set.modules;
    if let Some(commons) = &plan.commons {
        let commons = split_commons(&mut chunks, &commons.name, &commons.filename);
        chunks.insert(0, commons);
    }
    if plan.occurrence_order {
        order_by_occurrence(&mut modules, &chunks);
    }

    let has_commons = plan.commons.is_some();
    let rendered: Vec<RenderedChunk> = chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| {
            let with_runtime = !has_commons || index == 0;
            render_chunk(&plan, &definitions, &modules, chunk, with_runtime)
        })
        .collect();

    let compilation_hash = combined_hash(rendered.iter().flat_map(|r| {
        std::iter::once(r.hash.as_str()).chain(r.css.as_ref().map(|(_, hash)| hash.as_str()))
    }));

    // Emit
    ctx.progress(0.9, "emit");
    let any_errors = chunks.iter().any(|c| !c.errors.is_empty());
    let mut assets: IndexMap<String, AssetStats> = IndexMap::new();
    let mut files: Vec<OutputFile> = Vec::new();
    let mut chunk_stats = Vec::with_capacity(chunks.len());
    let mut manifest_changed = false;

    for (id, (chunk, rendered)) in chunks.iter().zip(rendered).enumerate() {
        let emit = chunk.errors.is_empty() && (!any_errors || plan.no_errors);
        let js_name = render(
            &chunk.template,
            &TemplateVars {
                name: &chunk.name,
                ext: "js",
                hash: &compilation_hash,
                chunkhash: &rendered.hash,
            },
        );
        let mut outputs = vec![(js_name, "js", rendered.js.into_bytes())];
        if let (Some((css, css_hash)), Some(extract)) = (rendered.css, &plan.extract_css) {
            let css_name = render(
                &extract.filename,
                &TemplateVars {
                    name: &chunk.name,
                    ext: "css",
                    hash: &compilation_hash,
                    chunkhash: &css_hash,
                },
            );
            outputs.push((css_name, "css", css.into_bytes()));
        }

        let mut chunk_files = Vec::new();
        for (name, ext, content) in outputs {
            if emit {
                if let Some(assets_path) = &plan.hash_manifest {
                    let logical = manifest_key(assets_path, &format!("{}.{ext}", chunk.name));
                    manifest_changed |= ctx.manifest.record(logical, manifest_key(assets_path, &name));
                }
            }
            add_asset(&mut assets, &name, content.len(), id, &chunk.name, emit);
            if emit {
                files.push(OutputFile::new(name.clone(), content));
            }
            chunk_files.push(name);
        }
        for file in rendered.files {
            add_asset(&mut assets, &file.name, file.content.len(), id, &chunk.name, emit);
            if emit && !files.iter().any(|f| f.name == file.name) {
                files.push(file);
            }
        }

        chunk_stats.push(ChunkStats {
            id,
            names: vec![chunk.name.clone()],
            size: chunk_files
                .first()
                .and_then(|name| assets.get(name))
                .map_or(0, |asset| asset.size),
            files: chunk_files,
            entry: chunk.entry,
            initial: true,
            hash: rendered.hash,
            modules: chunk
                .modules
                .iter()
                .map(|&index| {
                    let module = &modules[index];
                    ModuleStats {
                        id: module.id,
                        name: module.name.clone(),
                        size: module.content.len(),
                        kind: module.kind.label().to_string(),
                    }
                })
                .collect(),
        });
    }

    if manifest_changed {
        let json = ctx
            .manifest
            .to_json_pretty()
            .map_err(|source| CompileError::Serialize {
                what: "hash manifest",
                source,
            })?;
        add_asset(&mut assets, MANIFEST_FILE, json.len(), 0, "", true);
        files.push(OutputFile::new(MANIFEST_FILE, json));
    }

    if !files.is_empty() {
        write_output(&plan.output_path, &files)?;
    }

    let errors: Vec<String> = chunks.iter().flat_map(|c| c.errors.clone()).collect();
    if any_errors && !plan.no_errors {
        tracing::debug!("Errors present, nothing emitted");
    }

    Ok(Stats {
        hash: compilation_hash,
        version: env!("CARGO_PKG_VERSION").to_string(),
        time: started.elapsed().as_millis() as u64,
        output_path: plan.output_path.clone(),
        public_path: plan.public_path.clone(),
        errors,
        warnings: plan.warnings.clone(),
        assets: assets.into_values().collect(),
        chunks: chunk_stats,
    })
}

/// Moves modules listed by two or more entry chunks into a new commons chunk.
fn split_commons(chunks: &mut [ChunkPlan], name: &str, template: &str) -> ChunkPlan {
    let mut counts: IndexMap<usize, usize> = IndexMap::new();
    for chunk in chunks.iter() {
        for &index in &chunk.modules {
            *counts.entry(index).or_default() += 1;
        }
    }

    let mut commons = ChunkPlan::new(name, template, false);
    commons.modules = counts
        .iter()
        .filter(|&(_, &count)| count >= 2)
        .map(|(&index, _)| index)
        .collect();

    for chunk in chunks.iter_mut() {
        chunk.modules.retain(|index| !commons.modules.contains(index));
    }
    commons
}

/// Assigns lower ids to modules referenced by more chunks.
fn order_by_occurrence(modules: &mut [Module], chunks: &[ChunkPlan]) {
    let mut order: Vec<(usize, usize)> = (0..modules.len())
        .map(|index| {
            let count = chunks
                .iter()
                .filter(|chunk| chunk.modules.contains(&index) || chunk.bootstrap.contains(&index))
                .count();
            (index, count)
        })
        .collect();
    // Stable: ties keep first-appearance order.
    order.sort_by(|a, b| b.1.cmp(&a.1));
    for (id, (index, _)) in order.into_iter().enumerate() {
        modules[index].id = id;
    }
}

fn render_chunk(
    plan: &BuildPlan,
    definitions: &Definitions,
    modules: &[Module],
    chunk: &ChunkPlan,
    with_runtime: bool,
) -> RenderedChunk {
    let extract = plan
        .extract_css
        .as_ref()
        .filter(|extract| chunk.entry || extract.all_chunks);
    let mut writer = ChunkWriter::new(&chunk.name, with_runtime);
    let mut styles = String::new();
    let mut files = Vec::new();

    for &index in &chunk.modules {
        let module = &modules[index];
        match &module.kind {
            ModuleKind::Script => {
                let source = module.source();
                let source = if definitions.is_empty() {
                    source.into_owned()
                } else {
                    definitions.apply(&source)
                };
                writer.module(module, Body::Script(&source));
            }
            ModuleKind::Style if extract.is_some() => {
                styles.push_str(&module.source());
                if !styles.ends_with('\n') {
                    styles.push('\n');
                }
            }
            ModuleKind::Style => {
                let css = module.source();
                let css = match plan.minify {
                    Some(_) => minify_style(&css),
                    None => css.into_owned(),
                };
                writer.module(module, Body::InlineStyle(&css));
            }
            ModuleKind::Json => {
                let value = serde_json::from_slice(&module.content).unwrap_or(Value::Null);
                writer.module(module, Body::Json(&value));
            }
            ModuleKind::Asset | ModuleKind::File { .. } => {
                let name = emitted_name(module);
                let url = format!("{}{}", plan.public_path, name);
                writer.module(module, Body::Url(&url));
                files.push(OutputFile::new(name, module.content.clone()));
            }
        }
    }

    let bootstrap: Vec<usize> = chunk.bootstrap.iter().map(|&i| modules[i].id).collect();
    writer.bootstrap(&bootstrap);

    let mut js = writer.finish();
    if let Some(settings) = plan.minify {
        js = minify_script(&js, settings);
    }
    let hash = content_hash(js.as_bytes());

    let css = (!styles.is_empty()).then(|| {
        let css = match plan.minify {
            Some(_) => minify_style(&styles),
            None => styles,
        };
        let hash = content_hash(css.as_bytes());
        (css, hash)
    });

    RenderedChunk {
        js,
        hash,
        css,
        files,
    }
}

fn emitted_name(module: &Module) -> String {
    let path: &Path = &module.path;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let template = match &module.kind {
        ModuleKind::File { name } => name.as_str(),
        _ => ASSET_TEMPLATE,
    };
    render(
        template,
        &TemplateVars {
            name: stem,
            ext,
            hash: &module.hash,
            chunkhash: &module.hash,
        },
    )
}

fn add_asset(
    assets: &mut IndexMap<String, AssetStats>,
    name: &str,
    size: usize,
    chunk: usize,
    chunk_name: &str,
    emitted: bool,
) {
    let asset = assets
        .entry(name.to_string())
        .or_insert_with(|| AssetStats {
            name: name.to_string(),
            size,
            chunks: Vec::new(),
            chunk_names: Vec::new(),
            emitted: false,
        });
    if !chunk_name.is_empty() && !asset.chunks.contains(&chunk) {
        asset.chunks.push(chunk);
        asset.chunk_names.push(chunk_name.to_string());
    }
    asset.emitted |= emitted;
}
