//! Read-only lookups: entity/callers/callees fetch, name and span lookup,
//! and full-text search.

use std::path::Path;

use rusqlite::params;

use super::Store;
use crate::types::{EntityKind, Linkage, Result, Storage, StoredEntity};

const ENTITY_SELECT: &str = "
  SELECT e.gid, e.kind, e.name, e.storage, e.linkage, e.decl_sig, e.eff_sig, e.sig_id,
         f.path AS file_path, e.start, e.\"end\"
  FROM entities e JOIN files f ON e.file_id = f.id
";

fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<StoredEntity> {
    let kind_str: String = row.get("kind")?;
    let storage_str: String = row.get("storage")?;
    let linkage_str: String = row.get("linkage")?;
    Ok(StoredEntity {
        gid: row.get("gid")?,
        kind: EntityKind::from_str(&kind_str).unwrap_or(EntityKind::Fn),
        name: row.get("name")?,
        storage: Storage::from_str(&storage_str).unwrap_or(Storage::Extern),
        linkage: if linkage_str == "internal" {
            Linkage::Internal
        } else {
            Linkage::External
        },
        decl_sig: row.get("decl_sig")?,
        eff_sig: row.get("eff_sig")?,
        sig_id: row.get("sig_id")?,
        file_path: row.get("file_path")?,
        start: row.get("start")?,
        end: row.get("end")?,
    })
}

fn canon_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Extracts identifier-like words, drops `and`/`or`/`not`/`near`, keeps
/// tokens with an underscore or length >= 4, dedupes preserving order,
/// caps at `max_terms`, and joins as a prefix-match OR expression.
pub fn fts_expr_from_text(query: &str, max_terms: usize) -> String {
    let banned = ["and", "or", "not", "near"];
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    let mut token = String::new();
    let mut tokens = Vec::new();
    for c in query.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_alphanumeric() || c == '_' {
            token.push(c);
        } else if !token.is_empty() {
            tokens.push(std::mem::take(&mut token));
        }
    }
    // Identifiers must start with a letter or underscore, matching
    // `[A-Za-z_][A-Za-z0-9_]*`.
    for t in tokens {
        if !t.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
            continue;
        }
        if banned.contains(&t.to_lowercase().as_str()) {
            continue;
        }
        if t.contains('_') || t.len() >= 4 {
            if seen.insert(t.clone()) {
                out.push(t);
            }
        }
        if out.len() >= max_terms {
            break;
        }
    }

    if out.is_empty() {
        return String::new();
    }
    out.iter()
        .map(|t| format!("{t}*"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

impl Store {
    pub fn get_entity(&self, gid: &str) -> Result<Option<StoredEntity>> {
        let sql = format!("{ENTITY_SELECT} WHERE e.gid = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![gid], row_to_entity)
            .ok())
    }

    pub fn entities_in_file(&self, path: &Path) -> Result<Vec<StoredEntity>> {
        let canon = canon_path(path);
        let file_id: Option<i64> = self
            .conn
            .query_row("SELECT id FROM files WHERE path=?1", params![canon], |r| {
                r.get(0)
            })
            .ok();
        let Some(file_id) = file_id else {
            return Ok(Vec::new());
        };
        let sql = format!("{ENTITY_SELECT} WHERE e.file_id = ?1 ORDER BY e.start");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![file_id], row_to_entity)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn callers(&self, gid: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT src_gid FROM calls WHERE dst_gid=?1")?;
        let rows = stmt
            .query_map(params![gid], |r| r.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn callees(&self, gid: &str) -> Result<Vec<(Option<String>, Option<String>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT dst_gid, dst_name FROM calls WHERE src_gid=?1")?;
        let rows = stmt
            .query_map(params![gid], |r| Ok((r.get(0)?, r.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn lookup_by_name(&self, name: &str) -> Result<Vec<StoredEntity>> {
        let sql = format!("{ENTITY_SELECT} WHERE e.name = ?1 ORDER BY f.path, e.start");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![name], row_to_entity)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Returns the smallest entity in `path` whose extent covers `offset`.
    pub fn lookup_span(&self, path: &Path, offset: i64) -> Result<Option<StoredEntity>> {
        let canon = canon_path(path);
        let file_id: Option<i64> = self
            .conn
            .query_row("SELECT id FROM files WHERE path=?1", params![canon], |r| {
                r.get(0)
            })
            .ok();
        let Some(file_id) = file_id else {
            return Ok(None);
        };
        let sql = format!(
            "{ENTITY_SELECT} WHERE e.file_id = ?1 AND e.start <= ?2 AND e.\"end\" >= ?2
             ORDER BY (e.\"end\" - e.start) ASC LIMIT 1"
        );
        Ok(self
            .conn
            .query_row(&sql, params![file_id, offset], row_to_entity)
            .ok())
    }

    pub fn count_files(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?)
    }

    pub fn count_entities(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM entities", [], |r| r.get(0))?)
    }

    pub fn count_calls(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM calls", [], |r| r.get(0))?)
    }

    pub fn count_unresolved_calls(&self) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM calls WHERE dst_gid IS NULL",
            [],
            |r| r.get(0),
        )?)
    }

    /// Entity count per `kind`, used by `explain`.
    pub fn entity_counts_by_kind(&self) -> Result<std::collections::BTreeMap<String, i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM entities GROUP BY kind")?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Per-`dst_name` count of unresolved calls, used by `status`.
    pub fn unresolved_call_names(&self) -> Result<std::collections::BTreeMap<String, i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(dst_name,'') AS n, COUNT(*) FROM calls
             WHERE dst_gid IS NULL GROUP BY n",
        )?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .filter_map(|r| r.ok())
            .filter(|(name, _)| !name.is_empty())
            .collect();
        Ok(rows)
    }

    /// Full-text search over name/decl_sig/eff_sig. Falls back to a
    /// substring `LIKE` scan if the FTS5 MATCH query itself errors (e.g.
    /// `query` produced no usable terms and the caller still wants a
    /// best-effort result).
    pub fn fts_search(&self, query: &str, limit: usize, max_terms: usize) -> Result<Vec<(String, String, String)>> {
        let expr = fts_expr_from_text(query, max_terms);
        if expr.is_empty() {
            return Ok(Vec::new());
        }
        let result = (|| -> rusqlite::Result<Vec<(String, String, String)>> {
            let mut stmt = self.conn.prepare(
                "SELECT gid, name, decl_sig FROM entities_fts WHERE entities_fts MATCH ?1 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![expr, limit as i64], |r| {
                    Ok((r.get(0)?, r.get(1)?, r.get(2)?))
                })?
                .filter_map(|r| r.ok())
                .collect();
            Ok(rows)
        })();

        match result {
            Ok(rows) => Ok(rows),
            Err(e) => {
                eprintln!("[glyph] fts_search: MATCH query failed, falling back to LIKE: {e}");
                let like = format!("%{}%", query.trim());
                let mut stmt = self.conn.prepare(
                    "SELECT gid, name, decl_sig FROM entities WHERE name LIKE ?1 OR decl_sig LIKE ?1 LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![like, limit as i64], |r| {
                        Ok((r.get(0)?, r.get(1)?, r.get(2)?))
                    })?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(rows)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallEdge, Entity};
    use std::path::PathBuf;

    fn fn_entity(name: &str, gid: &str) -> Entity {
        Entity {
            kind: EntityKind::Fn,
            name: name.to_string(),
            start: 0,
            end: 20,
            storage: Storage::Extern,
            decl_sig: name.to_string(),
            eff_sig: "int ()".to_string(),
            gid: gid.to_string(),
            sig_id: "sig1".to_string(),
            linkage: Linkage::External,
        }
    }

    #[test]
    fn fts_expr_drops_banned_words_and_short_tokens() {
        let expr = fts_expr_from_text("and compute the hash", 6);
        assert_eq!(expr, "compute* OR hash*");
    }

    #[test]
    fn fts_expr_caps_at_max_terms() {
        let expr = fts_expr_from_text("alpha beta gamma delta epsilon", 2);
        assert_eq!(expr, "alpha* OR beta*");
    }

    #[test]
    fn callers_and_callees_roundtrip() {
        let store = Store::in_memory().unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/b.c"),
                &[fn_entity("sq", "gid_sq"), fn_entity("f", "gid_f")],
                &[CallEdge {
                    src_gid: "gid_f".into(),
                    dst_gid: Some("gid_sq".into()),
                    dst_name: Some("sq".into()),
                }],
                &[],
                None,
                true,
            )
            .unwrap();

        assert_eq!(
            store.callees("gid_f").unwrap(),
            vec![(Some("gid_sq".to_string()), Some("sq".to_string()))]
        );
        assert_eq!(store.callers("gid_sq").unwrap(), vec!["gid_f".to_string()]);
    }

    #[test]
    fn fts_search_finds_entity_by_name_token() {
        let store = Store::in_memory().unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/x.c"),
                &[fn_entity("compute_hash", "gid_ch")],
                &[],
                &[],
                None,
                true,
            )
            .unwrap();

        let hits = store.fts_search("compute", 50, 6).unwrap();
        assert!(hits.iter().any(|(gid, ..)| gid == "gid_ch"));

        let misses = store.fts_search("and", 50, 6).unwrap();
        assert!(misses.is_empty());
    }

    #[test]
    fn lookup_span_returns_smallest_covering_entity() {
        let store = Store::in_memory().unwrap();
        let mut outer = fn_entity("outer", "gid_outer");
        outer.start = 0;
        outer.end = 100;
        let mut inner = fn_entity("inner", "gid_inner");
        inner.start = 10;
        inner.end = 20;
        store
            .ingest_file(
                &PathBuf::from("/tmp/y.c"),
                &[outer, inner],
                &[],
                &[],
                None,
                true,
            )
            .unwrap();

        let found = store
            .lookup_span(&PathBuf::from("/tmp/y.c"), 15)
            .unwrap()
            .unwrap();
        assert_eq!(found.gid, "gid_inner");
    }
}
