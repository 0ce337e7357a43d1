//! Textual stats report printed after a build.

use std::fmt::Write as _;
use std::time::Duration;

use atool_bundler::{MultiStats, Stats};
use owo_colors::Style;

use super::{format_duration, format_size, paint};

/// Renders `stats` in the layout of a webpack stats string.
///
/// The asset table, errors and warnings are always present; the hash, the
/// version, chunks and their modules only when `verbose`.
pub fn render_stats(stats: &MultiStats, verbose: bool, colors: bool) -> String {
    match stats.children.as_slice() {
        [only] => render_child(only, verbose, colors),
        children => {
            let mut out = String::new();
            if verbose {
                let _ = writeln!(out, "Hash: {}", paint(&stats.hash, Style::new().bold(), colors));
            }
            for (index, child) in children.iter().enumerate() {
                let _ = writeln!(out, "Child {index}:");
                for line in render_child(child, verbose, colors).lines() {
                    if line.is_empty() {
                        out.push('\n');
                    } else {
                        let _ = writeln!(out, "    {line}");
                    }
                }
            }
            out
        }
    }
}

fn render_child(stats: &Stats, verbose: bool, colors: bool) -> String {
    let mut out = String::new();

    if verbose {
        let _ = writeln!(out, "Hash: {}", paint(&stats.hash, Style::new().bold(), colors));
        let _ = writeln!(out, "Version: atool {}", paint(&stats.version, Style::new().bold(), colors));
    }
    let _ = writeln!(
        out,
        "Time: {}",
        paint(
            format_duration(Duration::from_millis(stats.time)),
            Style::new().bold(),
            colors
        )
    );

    if !stats.assets.is_empty() {
        render_assets(&mut out, stats, colors);
    }

    if verbose {
        for chunk in &stats.chunks {
            let mut flags = Vec::new();
            if chunk.entry {
                flags.push("[entry]");
            }
            if chunk.initial {
                flags.push("[initial]");
            }
            let _ = writeln!(
                out,
                "chunk    {{{}}} {} ({}) {} {}",
                paint(chunk.id, Style::new().yellow(), colors),
                chunk.files.join(", "),
                chunk.names.join(", "),
                format_size(chunk.size as u64),
                flags.join(" ")
            );
            for module in &chunk.modules {
                let _ = writeln!(
                    out,
                    "    [{}] {} {} {{{}}}",
                    module.id,
                    module.name,
                    format_size(module.size as u64),
                    chunk.id
                );
            }
        }
    }

    for error in &stats.errors {
        let _ = writeln!(
            out,
            "\n{} {}",
            paint("ERROR in", Style::new().red().bold(), colors),
            error
        );
    }
    for warning in &stats.warnings {
        let _ = writeln!(
            out,
            "\n{} {}",
            paint("WARNING in", Style::new().yellow().bold(), colors),
            warning
        );
    }

    out
}

fn render_assets(out: &mut String, stats: &Stats, colors: bool) {
    let rows: Vec<(String, String, String)> = stats
        .assets
        .iter()
        .map(|asset| {
            let chunks = asset
                .chunks
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            (asset.name.clone(), format_size(asset.size as u64), chunks)
        })
        .collect();

    let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max("Asset".len());
    let size_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).max("Size".len());
    let chunk_width = rows.iter().map(|r| r.2.len()).max().unwrap_or(0).max("Chunks".len());

    let _ = writeln!(
        out,
        "{:>name_width$}  {:>size_width$}  {:>chunk_width$}  {:9}  Chunk Names",
        "Asset", "Size", "Chunks", ""
    );
    for ((name, size, chunks), asset) in rows.iter().zip(&stats.assets) {
        let emitted = if asset.emitted { "[emitted]" } else { "" };
        let _ = writeln!(
            out,
            "{}  {:>size_width$}  {:>chunk_width$}  {}  {}",
            paint(format!("{name:>name_width$}"), Style::new().green().bold(), colors),
            size,
            chunks,
            paint(format!("{emitted:9}"), Style::new().green(), colors),
            asset.chunk_names.join(", ")
        );
    }
}
