//! Module resolution and loader classification.

use std::fs;
use std::path::{Path, PathBuf};

use atool_config::LoaderRule;
use regex::Regex;
use serde_json::Value;

use crate::error::{CompileError, Result};

/// What a module turns into once its loader chain ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    Script,
    Style,
    Json,
    /// `url` loader: emitted under a content-hashed name.
    Asset,
    /// `file` loader: emitted under the rule's name template.
    File { name: String },
}

impl ModuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModuleKind::Script => "script",
            ModuleKind::Style => "style",
            ModuleKind::Json => "json",
            ModuleKind::Asset => "asset",
            ModuleKind::File { .. } => "file",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ModuleKind::Script | ModuleKind::Style | ModuleKind::Json)
    }
}

/// A loader rule with its patterns compiled.
#[derive(Debug)]
pub struct CompiledRule {
    test: Regex,
    exclude: Option<Regex>,
    loaders: Vec<String>,
    query: Value,
}

impl CompiledRule {
    pub fn compile(rule: &LoaderRule) -> Result<Self> {
        let pattern = |source: &str| {
            Regex::new(source).map_err(|e| {
                CompileError::InvalidConfig(format!("invalid loader pattern '{source}': {e}"))
            })
        };
        Ok(Self {
            test: pattern(&rule.test)?,
            exclude: rule.exclude.as_deref().map(pattern).transpose()?,
            loaders: rule.loaders.clone(),
            query: rule.query.clone(),
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(path))
    }
}

/// Ordered loader table; the first matching rule wins.
#[derive(Debug)]
pub struct LoaderTable {
    rules: Vec<CompiledRule>,
}

impl LoaderTable {
    pub fn new(rules: &[LoaderRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Classifies `path`. The error string is reported as a module error.
    pub fn classify(&self, path: &Path) -> std::result::Result<ModuleKind, String> {
        let display = path.to_string_lossy().replace('\\', "/");
        let Some(rule) = self.rules.iter().find(|rule| rule.matches(&display)) else {
            return Err(format!(
                "Module parse failed: {display}\nYou may need an appropriate loader to handle this file type."
            ));
        };

        // Loaders run right to left; the leftmost one decides the output.
        match rule.loaders.first().map(String::as_str) {
            Some("babel" | "ts") => Ok(ModuleKind::Script),
            Some("css" | "postcss" | "less") => Ok(ModuleKind::Style),
            Some("json") => Ok(ModuleKind::Json),
            Some("url") => Ok(ModuleKind::Asset),
            Some("file") => Ok(ModuleKind::File {
                name: rule
                    .query
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("[hash].[ext]")
                    .to_string(),
            }),
            Some(other) => Err(format!("Module build failed: Cannot find loader '{other}'")),
            None => Err(format!("Module build failed: empty loader chain for {display}")),
        }
    }
}

/// A module read from disk.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: usize,
    /// Request as written in the entry, e.g. `./src/index.js`.
    pub name: String,
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub content: Vec<u8>,
    pub hash: String,
}

impl Module {
    /// Text content; only meaningful for text kinds.
    pub fn source(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Resolves entry requests against `context`, trying each extension in turn.
pub struct Resolver<'a> {
    context: &'a Path,
    extensions: Vec<String>,
    case_sensitive: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(context: &'a Path, extensions: Vec<String>, case_sensitive: bool) -> Self {
        let extensions = if extensions.is_empty() {
            vec![String::new()]
        } else {
            extensions
        };
        Self {
            context,
            extensions,
            case_sensitive,
        }
    }

    pub fn resolve(&self, request: &str) -> std::result::Result<PathBuf, String> {
        let base = self.context.join(request);
        let found = self.extensions.iter().find_map(|ext| {
            let mut candidate = base.clone().into_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            candidate.is_file().then_some(candidate)
        });

        let Some(path) = found else {
            return Err(format!(
                "Module not found: Error: Cannot resolve 'file' or 'directory' {request} in {}",
                self.context.display()
            ));
        };

        if self.case_sensitive {
            check_case(&path)?;
        }
        Ok(path)
    }
}

/// Fails when the on-disk file name differs from `path` in letter case only.
fn check_case(path: &Path) -> std::result::Result<(), String> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(());
    };
    let Ok(entries) = fs::read_dir(parent) else {
        return Ok(());
    };

    let names: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.file_name()))
        .collect();
    if names.iter().any(|n| n == name) {
        return Ok(());
    }

    let wanted = name.to_string_lossy().to_lowercase();
    match names
        .iter()
        .find(|n| n.to_string_lossy().to_lowercase() == wanted)
    {
        Some(actual) => Err(format!(
            "CaseSensitivePaths: {} does not match the corresponding path on disk `{}`",
            path.display(),
            actual.to_string_lossy()
        )),
        None => Ok(()),
    }
}
