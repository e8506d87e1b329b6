//! Intra-TU call graph construction: an AST walk over
//! `CALL_EXPR` cursors within each defined function's extent, plus a
//! textual fallback scan that recovers likely inter-file callees the AST
//! resolution missed.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use clang::{Entity as Cursor, EntityKind as CursorKind, TranslationUnit};

use glyph_core::hash::short_id_with;
use glyph_core::types::CallEdge;

use crate::extract::function_gid;

const KEYWORD_BLACKLIST: &[&str] = &[
    "if", "for", "while", "switch", "return", "sizeof", "typedef", "struct", "union", "enum",
];

fn cursor_file_path(cur: &Cursor) -> Option<PathBuf> {
    cur.get_location()
        .and_then(|loc| loc.get_file_location().file)
        .map(|f| f.get_path())
}

fn extent_offsets(cur: &Cursor) -> Option<(usize, usize)> {
    let range = cur.get_range()?;
    let start = range.get_start().get_file_location().offset as usize;
    let end = range.get_end().get_file_location().offset as usize;
    Some((start, end))
}

fn synthetic_callee_gid(name: &str, filename: &str, id_length: usize, id_sep: &str) -> String {
    short_id_with(&["callee", name, "extern", filename], id_length, id_sep)
}

/// Returns the bytes backing `path`, reusing `main_source` when `path` is
/// the file already being indexed and otherwise reading it from disk once
/// per distinct header, so [`function_gid`] sees the same declaration text
/// `extract_entities` would see when that header is indexed on its own.
fn source_for<'c>(
    path: &Path,
    main_filename: &Path,
    main_source: &'c [u8],
    header_cache: &'c mut HashMap<PathBuf, Vec<u8>>,
) -> &'c [u8] {
    if path == main_filename {
        return main_source;
    }
    header_cache
        .entry(path.to_path_buf())
        .or_insert_with(|| std::fs::read(path).unwrap_or_default())
        .as_slice()
}

/// Recursively visits `cur`'s descendants, recording a `CallEdge` per
/// `CALL_EXPR` encountered.
#[allow(clippy::too_many_arguments)]
fn walk_calls(
    cur: &Cursor,
    src_gid: &str,
    filename: &Path,
    source: &[u8],
    id_length: usize,
    id_sep: &str,
    header_cache: &mut HashMap<PathBuf, Vec<u8>>,
    seen: &mut HashSet<(String, Option<String>, Option<String>)>,
    out: &mut Vec<CallEdge>,
) {
    for child in cur.get_children() {
        if child.get_kind() == CursorKind::CallExpr {
            let reference = child.get_reference();
            let (dst_gid, dst_name) = match &reference {
                Some(r) if r.get_kind() == CursorKind::FunctionDecl => {
                    let ref_path = cursor_file_path(r).unwrap_or_else(|| filename.to_path_buf());
                    let ref_source = source_for(&ref_path, filename, source, header_cache);
                    let ref_filename = ref_path.to_string_lossy().into_owned();
                    let gid = function_gid(r, &ref_filename, ref_source, id_length, id_sep);
                    let name = r.get_name().unwrap_or_else(|| child.get_display_name().unwrap_or_default());
                    (Some(gid), Some(name))
                }
                _ => {
                    let name = reference
                        .as_ref()
                        .and_then(|r| r.get_name())
                        .or_else(|| child.get_display_name())
                        .unwrap_or_else(|| "unknown".to_string());
                    let gid = synthetic_callee_gid(&name, &filename.to_string_lossy(), id_length, id_sep);
                    (Some(gid), Some(name))
                }
            };
            let key = (src_gid.to_string(), dst_gid.clone(), dst_name.clone());
            if seen.insert(key) {
                out.push(CallEdge {
                    src_gid: src_gid.to_string(),
                    dst_gid,
                    dst_name,
                });
            }
        }
        walk_calls(&child, src_gid, filename, source, id_length, id_sep, header_cache, seen, out);
    }
}

/// Scans `text` for identifier-like tokens immediately followed by `(`,
/// excluding keywords and `self_name`, to recover likely callees the AST
/// walk missed (calls into headers whose declarations libclang didn't
/// resolve, K&R-style code, etc).
fn textual_callee_candidates(text: &str, self_name: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && {
                let c = bytes[i] as char;
                c.is_alphanumeric() || c == '_'
            } {
                i += 1;
            }
            let ident = &text[start..i];
            let mut j = i;
            while j < bytes.len() && (bytes[j] as char).is_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'(' {
                if !KEYWORD_BLACKLIST.contains(&ident) && ident != self_name && seen.insert(ident.to_string()) {
                    out.push(ident.to_string());
                }
            }
        } else {
            i += 1;
        }
    }
    out
}

/// Builds the per-function call edges for every defined function in
/// `filename`, combining the AST walk with the textual fallback scan.
/// `source` must be the file's raw bytes (for the textual scan).
pub fn build_call_edges(
    tu: &TranslationUnit,
    filename: &Path,
    source: &[u8],
    id_length: usize,
    id_sep: &str,
) -> Vec<CallEdge> {
    let filename_str = filename.to_string_lossy().into_owned();
    let mut out = Vec::new();
    let mut header_cache: HashMap<PathBuf, Vec<u8>> = HashMap::new();

    for cur in tu.get_entity().get_children() {
        if cur.get_kind() != CursorKind::FunctionDecl || !cur.is_definition() {
            continue;
        }
        let Some(path) = cursor_file_path(&cur) else { continue };
        if path != filename {
            continue;
        }
        let src_gid = function_gid(&cur, &filename_str, source, id_length, id_sep);
        let self_name = cur.get_name().unwrap_or_default();

        let mut seen = HashSet::new();
        walk_calls(
            &cur,
            &src_gid,
            filename,
            source,
            id_length,
            id_sep,
            &mut header_cache,
            &mut seen,
            &mut out,
        );

        if let Some((start, end)) = extent_offsets(&cur) {
            if let Ok(text) = std::str::from_utf8(&source[start.min(source.len())..end.min(source.len())]) {
                for name in textual_callee_candidates(text, &self_name) {
                    let key = (src_gid.clone(), None::<String>, Some(name.clone()));
                    // Skip names the AST walk already resolved a dst_name for,
                    // so the textual scan only contributes genuinely new hints.
                    let already_named = out
                        .iter()
                        .any(|e| e.src_gid == src_gid && e.dst_name.as_deref() == Some(name.as_str()));
                    if !already_named {
                        out.push(CallEdge {
                            src_gid: key.0,
                            dst_gid: None,
                            dst_name: key.2,
                        });
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_scan_skips_keywords_and_self() {
        let text = "int f(int n) { if (n) return f(n-1) + sq(n); }";
        let names = textual_callee_candidates(text, "f");
        assert_eq!(names, vec!["sq".to_string()]);
    }

    #[test]
    fn textual_scan_ignores_non_call_identifiers() {
        let text = "int x; int y = x;";
        assert!(textual_callee_candidates(text, "f").is_empty());
    }
}
