//! Idempotent byte-level marker insertion and `#include`
//! directive extraction (used to populate `Store::persist_includes`).

use std::path::Path;

use clang::{EntityKind as CursorKind, TranslationUnit};

use glyph_core::types::{Entity, IncludeEdge, IncludeKind};

const START_MARK: &[u8] = b"/* GLYPH:S ";
const END_MARK: &[u8] = b"/* GLYPH:E ";

/// True if `source` already contains either marker substring.
pub fn already_marked(source: &[u8]) -> bool {
    contains(source, START_MARK) || contains(source, END_MARK)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Inserts `\n/* GLYPH:S <gid> */\n` and `\n/* GLYPH:E <gid> */\n` around
/// each entity's extent. Entities are visited in descending start order so
/// earlier insertions don't invalidate later offsets; within one entity the
/// end marker goes in before the start marker, also to keep offsets valid.
pub fn insert_markers(source: &[u8], entities: &[Entity]) -> Vec<u8> {
    let mut out = source.to_vec();
    let mut ordered: Vec<&Entity> = entities.iter().collect();
    ordered.sort_by_key(|e| std::cmp::Reverse(e.start));

    for e in ordered {
        let end_line = format!("\n/* GLYPH:E {} */\n", e.gid);
        let start_line = format!("\n/* GLYPH:S {} */\n", e.gid);
        splice(&mut out, e.end, end_line.as_bytes());
        splice(&mut out, e.start, start_line.as_bytes());
    }
    out
}

fn splice(buf: &mut Vec<u8>, at: usize, insert: &[u8]) {
    let at = at.min(buf.len());
    buf.splice(at..at, insert.iter().copied());
}

/// Rewrites `source`, returning the rewritten bytes unchanged (plus an empty
/// entity list) when the file already carries markers — this is the
/// idempotence contract the marker format requires.
pub fn rewrite(source: &[u8], entities: &[Entity]) -> (Vec<u8>, bool) {
    if already_marked(source) {
        return (source.to_vec(), false);
    }
    (insert_markers(source, entities), true)
}

/// Extracts `#include` directives visible as `INCLUSION_DIRECTIVE` cursors
/// (requires detailed preprocessing records, which the bridge always
/// requests). Only directives libclang resolved to a real file are kept.
pub fn extract_includes(tu: &TranslationUnit, source: &[u8]) -> Vec<IncludeEdge> {
    let mut out = Vec::new();
    for cur in tu.get_entity().get_children() {
        if cur.get_kind() != CursorKind::InclusionDirective {
            continue;
        }
        let Some(target) = cur.get_included_file() else { continue };
        let dst_path = target.get_path().to_string_lossy().into_owned();

        let kind = match cur.get_range() {
            Some(range) => {
                let start = range.get_start().get_file_location().offset as usize;
                let end = range.get_end().get_file_location().offset as usize;
                let text = source
                    .get(start..end.min(source.len()))
                    .and_then(|b| std::str::from_utf8(b).ok())
                    .unwrap_or("");
                if text.contains('<') {
                    IncludeKind::Angle
                } else {
                    IncludeKind::Quote
                }
            }
            None => IncludeKind::Unknown,
        };
        out.push(IncludeEdge { dst_path, kind });
    }
    out
}
