//! Clang bridge, entity extraction, marker rewriting, and call graph
//! building for glyph.
//!
//! - [`bridge`] — libclang resolution and translation-unit parsing
//! - [`extract`] — top-level entity classification
//! - [`rewrite`] — idempotent marker insertion and include extraction
//! - [`callgraph`] — intra-TU call edges plus textual fallback
//! - [`walker`] — plain extension+ignore-list source file discovery

pub mod bridge;
pub mod callgraph;
pub mod error;
pub mod extract;
pub mod rewrite;
pub mod walker;

pub use error::{ParseError, Result};

use std::path::Path;

use glyph_core::types::{CallEdge, Entity, IncludeEdge};

/// Everything the pipeline extracts from one translation unit in a single
/// parse: entities, call edges, and include edges (`source bytes → Clang
/// Bridge → Extractor → (rewriter emits bytes; call graph builder emits
/// edges)`).
pub struct IndexedUnit {
    pub entities: Vec<Entity>,
    pub calls: Vec<CallEdge>,
    pub includes: Vec<IncludeEdge>,
}

/// Parses `filename` once and extracts entities, call edges, and include
/// edges from the resulting translation unit. `source` is read from disk
/// when `None`. `id_length`/`id_sep` come from [`glyph_core::config::IdConfig`].
pub fn index_file(
    filename: &Path,
    source: Option<&str>,
    extra_args: &[String],
    id_length: usize,
    id_sep: &str,
) -> Result<(IndexedUnit, Vec<u8>)> {
    let bytes_owned = match source {
        Some(s) => s.as_bytes().to_vec(),
        None => std::fs::read(filename).map_err(|e| ParseError::Io {
            file: filename.display().to_string(),
            source: e,
        })?,
    };

    let unit = bridge::parse_with(filename, source, extra_args, |tu| {
        let entities = extract::extract_entities(tu, filename, &bytes_owned, id_length, id_sep);
        let calls = callgraph::build_call_edges(tu, filename, &bytes_owned, id_length, id_sep);
        let includes = rewrite::extract_includes(tu, &bytes_owned);
        IndexedUnit { entities, calls, includes }
    })?;

    Ok((unit, bytes_owned))
}
