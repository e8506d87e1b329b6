//! Free-text query → seed → neighbour expansion → materialised context.
//! The conversational "ask" layer that drives an LLM over this context is
//! an out-of-scope collaborator; this module only builds the context.

use std::path::Path;

use glyph_core::config::RetrieverConfig;
use glyph_core::store::Store;
use glyph_core::types::StoredEntity;

use crate::error::Result;

/// One materialised piece of context: an entity plus the source text of its
/// extent, expanded to whole lines with a little surrounding context.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContextItem {
    pub gid: String,
    pub name: String,
    pub kind: String,
    pub storage: String,
    pub decl_sig: String,
    pub file_path: String,
    pub start: i64,
    pub end: i64,
    pub snippet: String,
}

fn idents_in_text(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    let mut token = String::new();
    let mut flush = |token: &mut String, out: &mut Vec<String>| {
        if !token.is_empty() {
            let t = std::mem::take(token);
            if t.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') && seen.insert(t.clone()) {
                out.push(t);
            }
        }
    };
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            token.push(c);
        } else {
            flush(&mut token, &mut out);
        }
    }
    flush(&mut token, &mut out);
    out
}

/// Exact-name seed over the query's identifier-like tokens, falling back to
/// FTS over the whole query when no exact names match.
pub fn search(store: &Store, query: &str, limit: usize, fts_max_terms: usize) -> Result<Vec<StoredEntity>> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for ident in idents_in_text(query) {
        for ent in store.lookup_by_name(&ident)? {
            if seen.insert(ent.gid.clone()) {
                out.push(ent);
                if out.len() >= limit {
                    return Ok(out);
                }
            }
        }
    }

    for (gid, ..) in store.fts_search(query, limit, fts_max_terms)? {
        if seen.contains(&gid) {
            continue;
        }
        if let Some(ent) = store.get_entity(&gid)? {
            seen.insert(gid);
            out.push(ent);
            if out.len() >= limit {
                break;
            }
        }
    }
    Ok(out)
}

/// Expands `seeds` by following callers/callees up to `hops` times, fanning
/// out at most `per_hop` edges per direction per node.
pub fn expand_neighbors(
    store: &Store,
    seeds: &[StoredEntity],
    hops: usize,
    per_hop: usize,
) -> Result<Vec<StoredEntity>> {
    let mut out: Vec<StoredEntity> = seeds.to_vec();
    let mut seen: std::collections::HashSet<String> = seeds.iter().map(|e| e.gid.clone()).collect();
    let mut frontier: Vec<String> = seeds.iter().map(|e| e.gid.clone()).collect();

    for _ in 0..hops {
        let mut next = Vec::new();
        for gid in &frontier {
            for (dst_gid, _) in store.callees(gid)?.into_iter().take(per_hop) {
                let Some(dst_gid) = dst_gid else { continue };
                if !seen.insert(dst_gid.clone()) {
                    continue;
                }
                if let Some(ent) = store.get_entity(&dst_gid)? {
                    out.push(ent);
                    next.push(dst_gid);
                }
            }
            for src_gid in store.callers(gid)?.into_iter().take(per_hop) {
                if !seen.insert(src_gid.clone()) {
                    continue;
                }
                if let Some(ent) = store.get_entity(&src_gid)? {
                    out.push(ent);
                    next.push(src_gid);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    Ok(out)
}

/// Reads the owning file's bytes, slices `[start, end)`, and expands to full
/// lines plus `surround_lines` of context on each side.
fn read_span(path: &Path, start: i64, end: i64, surround_lines: usize) -> String {
    let Ok(bytes) = std::fs::read(path) else {
        return String::new();
    };
    let full = String::from_utf8_lossy(&bytes);
    let len = bytes.len() as i64;
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(start as i64, len) as usize;

    let before = full[..start].matches('\n').count();
    let slice = &full[start..end];
    let after = before + slice.matches('\n').count();

    let lines: Vec<&str> = full.lines().collect();
    let lo = before.saturating_sub(surround_lines);
    let hi = (after + 1 + surround_lines).min(lines.len());
    lines[lo..hi].join("\n")
}

/// Materialises entities into [`ContextItem`]s bounded by `max_chars`: once
/// the running total would exceed the budget, the offending snippet is
/// truncated (not dropped) and iteration stops.
pub fn materialize(entities: &[StoredEntity], surround_lines: usize, max_chars: usize) -> Vec<ContextItem> {
    let mut out = Vec::new();
    let mut total = 0usize;
    for e in entities {
        let mut snippet = read_span(Path::new(&e.file_path), e.start, e.end, surround_lines);
        if max_chars > 0 && total + snippet.len() > max_chars {
            let remaining = max_chars.saturating_sub(total);
            snippet.truncate(remaining);
        }
        total += snippet.len();
        out.push(ContextItem {
            gid: e.gid.clone(),
            name: e.name.clone(),
            kind: e.kind.as_str().to_string(),
            storage: e.storage.as_str().to_string(),
            decl_sig: if e.decl_sig.is_empty() { e.name.clone() } else { e.decl_sig.clone() },
            file_path: e.file_path.clone(),
            start: e.start,
            end: e.end,
            snippet,
        });
        if max_chars > 0 && total >= max_chars {
            break;
        }
    }
    out
}

/// Convenience wrapper bundling the three retrieval stages behind the
/// `.glyph/glyph.json` retriever tuning.
pub struct Retriever<'s> {
    store: &'s Store,
    config: RetrieverConfig,
    fts_max_terms: usize,
}

impl<'s> Retriever<'s> {
    pub fn new(store: &'s Store, config: RetrieverConfig, fts_max_terms: usize) -> Self {
        Self { store, config, fts_max_terms }
    }

    pub fn answer_context(&self, query: &str, seed_limit: usize) -> Result<Vec<ContextItem>> {
        let seeds = search(self.store, query, seed_limit, self.fts_max_terms)?;
        let expanded = expand_neighbors(self.store, &seeds, self.config.hops, self.config.per_hop)?;

        let mut seen = std::collections::HashSet::new();
        let mut unique = Vec::new();
        for e in seeds.into_iter().chain(expanded) {
            if seen.insert(e.gid.clone()) {
                unique.push(e);
            }
        }
        Ok(materialize(&unique, self.config.surround_lines, self.config.max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::types::{CallEdge, Entity, EntityKind, Linkage, Storage, StoredEntity};
    use std::path::PathBuf;

    fn fn_entity(name: &str, gid: &str, start: usize, end: usize) -> Entity {
        Entity {
            kind: EntityKind::Fn,
            name: name.to_string(),
            start,
            end,
            storage: Storage::Extern,
            decl_sig: name.to_string(),
            eff_sig: "int ()".to_string(),
            gid: gid.to_string(),
            sig_id: "sig1".to_string(),
            linkage: Linkage::External,
        }
    }

    fn stored(name: &str, gid: &str, file_path: String, start: i64, end: i64) -> StoredEntity {
        StoredEntity {
            gid: gid.to_string(),
            kind: EntityKind::Fn,
            name: name.to_string(),
            storage: Storage::Extern,
            linkage: Linkage::External,
            decl_sig: name.to_string(),
            eff_sig: "int ()".to_string(),
            sig_id: "sig1".to_string(),
            file_path,
            start,
            end,
        }
    }

    #[test]
    fn idents_in_text_dedupes_preserving_order() {
        assert_eq!(idents_in_text("sq(n) + sq(n)"), vec!["sq".to_string(), "n".to_string()]);
    }

    #[test]
    fn search_seeds_by_exact_name_then_fts() {
        let store = Store::in_memory().unwrap();
        store
            .ingest_file(&PathBuf::from("/tmp/a.c"), &[fn_entity("compute_hash", "gid_ch", 0, 20)], &[], &[], None, true)
            .unwrap();

        let hits = search(&store, "compute_hash", 8, 6).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].gid, "gid_ch");
    }

    #[test]
    fn expand_neighbors_follows_callees_and_callers() {
        let store = Store::in_memory().unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/b.c"),
                &[fn_entity("sq", "gid_sq", 0, 20), fn_entity("f", "gid_f", 21, 50)],
                &[CallEdge { src_gid: "gid_f".into(), dst_gid: Some("gid_sq".into()), dst_name: Some("sq".into()) }],
                &[],
                None,
                true,
            )
            .unwrap();

        let seeds = vec![store.get_entity("gid_f").unwrap().unwrap()];
        let expanded = expand_neighbors(&store, &seeds, 1, 4).unwrap();
        assert!(expanded.iter().any(|e| e.gid == "gid_sq"));
    }

    #[test]
    fn materialize_truncates_at_char_budget_instead_of_dropping() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.c");
        std::fs::write(&file, "int f(void){return 0;}\n").unwrap();
        let e = stored("f", "gid_f", file.to_string_lossy().into_owned(), 0, 23);

        let ctx = materialize(&[e], 0, 5);
        assert_eq!(ctx.len(), 1);
        assert!(ctx[0].snippet.len() <= 5);
    }
}
