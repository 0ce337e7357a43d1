//! Source-level transforms: free-expression replacement and minification.

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{CompileError, Result};

/// Replaces each defined expression with its literal text.
pub struct Definitions {
    replacements: Vec<(Regex, String)>,
}

impl Definitions {
    pub fn new(definitions: &IndexMap<String, String>) -> Result<Self> {
        let replacements = definitions
            .iter()
            .map(|(expr, value)| {
                // Identifier boundaries on both sides, so `process.env.NODE_ENV_X` is left alone.
                let pattern = format!(r"(^|[^\w$.]){}($|[^\w$])", regex::escape(expr));
                Regex::new(&pattern)
                    .map(|re| (re, value.clone()))
                    .map_err(|e| {
                        CompileError::InvalidConfig(format!("invalid define key '{expr}': {e}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { replacements })
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    pub fn apply(&self, source: &str) -> String {
        let mut out = source.to_string();
        for (re, value) in &self.replacements {
            // Replacement text is literal apart from the captured boundaries.
            let escaped = value.replace('$', "$$");
            out = re
                .replace_all(&out, format!("${{1}}{escaped}${{2}}").as_str())
                .into_owned();
        }
        out
    }
}

/// Minification switches taken from the minify plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinifySettings {
    pub ascii_only: bool,
}

/// Strips comments and collapses whitespace outside string literals.
///
/// Newlines are kept as statement separators; other whitespace runs collapse to
/// a single space, or to nothing when adjacent to punctuation.
pub fn minify_script(source: &str, settings: MinifySettings) -> String {
    let minified = strip(source, true);
    if settings.ascii_only {
        escape_non_ascii(&minified)
    } else {
        minified
    }
}

/// Stylesheet minification: block comments only, no line comments.
pub fn minify_style(source: &str) -> String {
    strip(source, false)
}

fn strip(source: &str, line_comments: bool) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut pending_space = false;
    let mut pending_newline = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '/' && next == Some('*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i += 2;
            pending_space = true;
            continue;
        }
        if line_comments && c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c.is_whitespace() {
            if c == '\n' {
                pending_newline = true;
            } else {
                pending_space = true;
            }
            i += 1;
            continue;
        }

        if let Some(prev) = out.chars().last() {
            if pending_newline && line_comments {
                out.push('\n');
            } else if (pending_space || pending_newline) && needs_space(prev, c, line_comments) {
                out.push(' ');
            }
        }
        pending_space = false;
        pending_newline = false;

        if matches!(c, '"' | '\'' | '`') {
            i = copy_string(&chars, i, &mut out);
            continue;
        }
        out.push(c);
        i += 1;
    }

    out
}

/// Copies the string literal starting at `start`; returns the index after it.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                out.push(escaped);
                i += 1;
            }
        } else if c == quote {
            break;
        }
    }
    i
}

fn needs_space(prev: char, next: char, script: bool) -> bool {
    if !script {
        // Descendant combinators are whitespace; punctuation never needs it.
        return !matches!(prev, '{' | '}' | ';' | ',' | '>' | ':' | '(')
            && !matches!(next, '{' | '}' | ';' | ',' | '>' | ')' | '!');
    }
    let word = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    (word(prev) && word(next)) || (prev == next && matches!(prev, '+' | '-'))
}

/// Escapes every non-ASCII character as `\uXXXX` (surrogate pairs above the BMP).
pub fn escape_non_ascii(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for c in source.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}
