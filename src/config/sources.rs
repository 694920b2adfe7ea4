// src/config/sources.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// Exchanges polled when nothing else is configured.
pub const DEFAULT_SOURCES: &[&str] = &[
    "binancep2p",
    "bybitp2p",
    "bitgetp2p",
    "paxfulp2p",
    "eldoradop2p",
    "coinexp2p",
    "xapo",
];

pub fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}

/// Load the source list from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading quote sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Comma separated list, as given in `QUOTE_SOURCES`.
pub fn parse_sources_csv(s: &str) -> Vec<String> {
    clean_list(s.split(',').map(str::to_string).collect())
}

// The extension picks the parser; unknown extensions try JSON, then TOML.
fn parse_sources(s: &str, ext: &str) -> Result<Vec<String>> {
    match ext {
        "toml" => parse_toml(s),
        "json" => parse_json(s),
        _ => parse_json(s)
            .or_else(|_| parse_toml(s))
            .map_err(|_| anyhow!("unsupported quote sources format")),
    }
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<String>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop empties and duplicates. Order matters for tie-breaking, so the
/// first occurrence wins.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    out
}
