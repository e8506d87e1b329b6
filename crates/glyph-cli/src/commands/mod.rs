pub mod completion;
pub mod db;
pub mod rewrite;
pub mod scan;

use glyph_core::config::GlyphConfig;

/// Loads `.glyph/glyph.json` relative to the current directory, falling
/// back to defaults when it (or the directory) is absent.
pub(crate) fn load_config() -> GlyphConfig {
    match std::env::current_dir() {
        Ok(cwd) => GlyphConfig::load(&cwd.join(".glyph")),
        Err(_) => GlyphConfig::default(),
    }
}
