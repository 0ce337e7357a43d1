//! Output file-name templates.
//!
//! Supported placeholders: `[name]`, `[ext]`, `[hash]`, `[chunkhash]`, with an
//! optional length suffix on the hashes (`[chunkhash:8]`).

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::hash::short;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(name|ext|hash|chunkhash)(?::(\d+))?\]").expect("placeholder pattern is valid")
});

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars<'a> {
    pub name: &'a str,
    pub ext: &'a str,
    /// Compilation hash.
    pub hash: &'a str,
    /// Hash of the rendered chunk or asset.
    pub chunkhash: &'a str,
}

pub fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let len = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());
            let value = match &caps[1] {
                "name" => return vars.name.to_string(),
                "ext" => return vars.ext.to_string(),
                "hash" => vars.hash,
                _ => vars.chunkhash,
            };
            match len {
                Some(len) => short(value, len).to_string(),
                None => value.to_string(),
            }
        })
        .into_owned()
}

/// Whether the template yields different names for different content.
pub fn is_hashed(template: &str) -> bool {
    PLACEHOLDER
        .captures_iter(template)
        .any(|caps| matches!(&caps[1], "hash" | "chunkhash"))
}
