//! Configuration file loading for glyph.
//!
//! Reads `.glyph/glyph.json` and provides typed access to all settings.
//! Falls back to sensible defaults when the config file is missing or
//! incomplete, so a fresh checkout never fails to start for want of a
//! config file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level glyph configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphConfig {
    pub version: String,
    #[serde(default)]
    pub source_extensions: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub ids: IdConfig,
    #[serde(default)]
    pub clang: ClangConfig,
    #[serde(default)]
    pub fts: FtsConfig,
    #[serde(default)]
    pub retriever: RetrieverConfig,
}

/// ID Mint tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default = "default_id_length")]
    pub length: usize,
    #[serde(default = "default_id_sep")]
    pub separator: String,
}

fn default_id_length() -> usize {
    10
}
fn default_id_sep() -> String {
    "|".to_string()
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            length: default_id_length(),
            separator: default_id_sep(),
        }
    }
}

/// Clang bridge tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClangConfig {
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub library_file: Option<String>,
    #[serde(default)]
    pub search_path: Vec<String>,
}

/// Full-text search tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtsConfig {
    #[serde(default = "default_fts_max_terms")]
    pub max_terms: usize,
    #[serde(default = "default_fts_limit")]
    pub default_limit: usize,
}

fn default_fts_max_terms() -> usize {
    6
}
fn default_fts_limit() -> usize {
    50
}

impl Default for FtsConfig {
    fn default() -> Self {
        Self {
            max_terms: default_fts_max_terms(),
            default_limit: default_fts_limit(),
        }
    }
}

/// Retriever tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    #[serde(default = "default_hops")]
    pub hops: usize,
    #[serde(default = "default_per_hop")]
    pub per_hop: usize,
    #[serde(default = "default_surround_lines")]
    pub surround_lines: usize,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_hops() -> usize {
    1
}
fn default_per_hop() -> usize {
    4
}
fn default_surround_lines() -> usize {
    2
}
fn default_max_chars() -> usize {
    14_000
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            hops: default_hops(),
            per_hop: default_per_hop(),
            surround_lines: default_surround_lines(),
            max_chars: default_max_chars(),
        }
    }
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            source_extensions: vec![
                ".c", ".h", ".cc", ".cpp", ".cxx", ".hpp", ".hh", ".hxx",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            ignore_patterns: vec![".git".into(), ".glyph".into(), "build".into()],
            ids: IdConfig::default(),
            clang: ClangConfig::default(),
            fts: FtsConfig::default(),
            retriever: RetrieverConfig::default(),
        }
    }
}

impl GlyphConfig {
    /// Loads configuration from `.glyph/glyph.json` inside the given glyph
    /// directory. Returns defaults if the file doesn't exist or can't be
    /// parsed.
    pub fn load(glyph_dir: &Path) -> Self {
        let config_path = glyph_dir.join("glyph.json");
        let content = match std::fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!(
                    "[glyph] warning: failed to parse {}: {}, using defaults",
                    config_path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Writes this configuration to `.glyph/glyph.json`, creating the
    /// directory if needed.
    pub fn save(&self, glyph_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(glyph_dir)?;
        let content = serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| "{}".to_string());
        std::fs::write(glyph_dir.join("glyph.json"), content)
    }
}
