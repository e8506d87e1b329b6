//! Transactional ingest, call resolution, and reverse-include closure.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use rusqlite::params;
use sha2::{Digest, Sha256};

use super::Store;
use crate::types::{CallEdge, Entity, IncludeEdge, Result};

fn canon_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn file_stat(path: &Path, bytes: Option<&[u8]>) -> (Option<f64>, Option<i64>, Option<String>) {
    let (mtime, size) = match std::fs::metadata(path) {
        Ok(meta) => {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64());
            (mtime, Some(meta.len() as i64))
        }
        Err(_) => (None, None),
    };
    let sha = bytes.map(|b| {
        let mut hasher = Sha256::new();
        hasher.update(b);
        format!("{:x}", hasher.finalize())
    });
    (mtime, size, sha)
}

impl Store {
    /// Upserts the `files` row for `path`, returning its id. `mtime`/`size`
    /// are refreshed from the filesystem; `sha256` is only overwritten when
    /// `bytes` is provided (lets callers register include targets by path
    /// alone, without reading the file).
    fn upsert_file(&self, path: &Path, bytes: Option<&[u8]>) -> Result<i64> {
        let p = canon_path(path);
        let (mtime, size, sha) = file_stat(path, bytes);
        self.conn.execute(
            "INSERT INTO files(path, mtime, size, sha256) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(path) DO UPDATE SET
               mtime=excluded.mtime,
               size=excluded.size,
               sha256=COALESCE(excluded.sha256, files.sha256)",
            params![p, mtime, size, sha],
        )?;
        let id: i64 = self
            .conn
            .query_row("SELECT id FROM files WHERE path=?1", params![p], |r| {
                r.get(0)
            })?;
        Ok(id)
    }

    fn upsert_entities(&self, file_id: i64, entities: &[Entity]) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO entities(gid, kind, name, storage, linkage, decl_sig, eff_sig, sig_id, file_id, start, \"end\")
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(gid) DO UPDATE SET
               kind=excluded.kind,
               name=excluded.name,
               storage=excluded.storage,
               linkage=excluded.linkage,
               decl_sig=excluded.decl_sig,
               eff_sig=excluded.eff_sig,
               sig_id=excluded.sig_id,
               file_id=excluded.file_id,
               start=excluded.start,
               \"end\"=excluded.\"end\"",
        )?;
        for e in entities {
            stmt.execute(params![
                e.gid,
                e.kind.as_str(),
                e.name,
                e.storage.as_str(),
                e.linkage.as_str(),
                e.decl_sig,
                e.eff_sig,
                e.sig_id,
                file_id,
                e.start as i64,
                e.end as i64,
            ])?;
        }
        Ok(())
    }

    fn remove_entities_for_file(&self, file_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM entities WHERE file_id=?1", params![file_id])?;
        Ok(())
    }

    fn clear_calls_from(&self, src_gids: &[String]) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("DELETE FROM calls WHERE src_gid=?1")?;
        for gid in src_gids {
            stmt.execute(params![gid])?;
        }
        Ok(())
    }

    fn persist_includes(&self, src_file_id: i64, includes: &[IncludeEdge]) -> Result<()> {
        self.conn
            .execute("DELETE FROM includes WHERE src_file_id=?1", params![src_file_id])?;
        for inc in includes {
            let dst_id = self.upsert_file(Path::new(&inc.dst_path), None)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO includes(src_file_id, dst_file_id, kind) VALUES (?1, ?2, ?3)",
                params![src_file_id, dst_id, inc.kind.as_str()],
            )?;
        }
        Ok(())
    }

    fn insert_calls(&self, calls: &[CallEdge]) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO calls(src_gid, dst_gid, dst_name) VALUES (?1, ?2, ?3)",
        )?;
        for c in calls {
            stmt.execute(params![c.src_gid, c.dst_gid, c.dst_name])?;
        }
        Ok(())
    }

    /// Best-effort: for every unresolved call from `src_gids`, ensures a
    /// `direct` callsite keyed by `(src_gid, dst_name)` exists, and
    /// backfills `calls.callsite_id`. Swallows its own SQL errors rather
    /// than aborting the surrounding ingest, per the store's best-effort
    /// propagation policy.
    fn link_calls_to_callsites(&self, src_gids: &[String]) {
        for gid in src_gids {
            let result = (|| -> Result<()> {
                let mut stmt = self.conn.prepare(
                    "SELECT DISTINCT dst_name FROM calls
                     WHERE src_gid = ?1 AND dst_name IS NOT NULL AND callsite_id IS NULL",
                )?;
                let names: Vec<String> = stmt
                    .query_map(params![gid], |r| r.get(0))?
                    .filter_map(|r| r.ok())
                    .collect();
                drop(stmt);
                for name in names {
                    self.conn.execute(
                        "INSERT OR IGNORE INTO callsites(src_gid, kind, name_hint) VALUES (?1, 'direct', ?2)",
                        params![gid, name],
                    )?;
                    let callsite_id: i64 = self.conn.query_row(
                        "SELECT id FROM callsites WHERE src_gid=?1 AND IFNULL(name_hint,'')=?2 AND kind='direct'",
                        params![gid, name],
                        |r| r.get(0),
                    )?;
                    self.conn.execute(
                        "UPDATE calls SET callsite_id=?1
                         WHERE src_gid=?2 AND dst_name=?3 AND callsite_id IS NULL",
                        params![callsite_id, gid, name],
                    )?;
                }
                Ok(())
            })();
            if let Err(e) = result {
                eprintln!("[glyph] link_calls_to_callsites: best-effort step failed for {gid}: {e}");
            }
        }
    }

    /// Best-effort: for each direct callsite with a name hint, proposes one
    /// candidate per function definition sharing that name.
    pub fn populate_candidates(&self) {
        let result = (|| -> Result<()> {
            self.conn.execute_batch(
                "INSERT OR IGNORE INTO call_candidates(callsite_id, dst_gid, rank)
                 SELECT cs.id, e.gid, 0
                 FROM callsites cs
                 JOIN entities e ON e.name = cs.name_hint AND e.kind = 'fn'
                 WHERE cs.kind = 'direct' AND cs.name_hint IS NOT NULL",
            )?;
            Ok(())
        })();
        if let Err(e) = result {
            eprintln!("[glyph] populate_candidates: best-effort step failed: {e}");
        }
    }

    /// Ingests one file's entities, calls, and include edges within a
    /// single savepoint. When `replace` is true (the common case), all of
    /// the file's prior entities and their outgoing calls are removed
    /// first.
    pub fn ingest_file(
        &self,
        file_path: &Path,
        entities: &[Entity],
        calls: &[CallEdge],
        includes: &[IncludeEdge],
        file_bytes: Option<&[u8]>,
        replace: bool,
    ) -> Result<()> {
        let sp = self.begin_savepoint()?;

        let file_id = self.upsert_file(file_path, file_bytes)?;

        if replace {
            let prior_gids: Vec<String> = {
                let mut stmt = self
                    .conn
                    .prepare("SELECT gid FROM entities WHERE file_id=?1")?;
                stmt.query_map(params![file_id], |r| r.get(0))?
                    .filter_map(|r| r.ok())
                    .collect()
            };
            if !prior_gids.is_empty() {
                self.clear_calls_from(&prior_gids)?;
            }
            self.remove_entities_for_file(file_id)?;
        }

        self.upsert_entities(file_id, entities)?;
        self.persist_includes(file_id, includes)?;

        if !calls.is_empty() {
            self.insert_calls(calls)?;
        }

        let src_gids: Vec<String> = entities.iter().map(|e| e.gid.clone()).collect();
        self.link_calls_to_callsites(&src_gids);
        self.populate_candidates();

        sp.commit()
    }

    /// Ingests several files inside one outer savepoint, nesting a fresh
    /// savepoint per file via [`Store::ingest_file`].
    pub fn bulk_ingest(
        &self,
        items: impl IntoIterator<
            Item = (
                std::path::PathBuf,
                Vec<Entity>,
                Vec<CallEdge>,
                Vec<IncludeEdge>,
                Option<Vec<u8>>,
            ),
        >,
    ) -> Result<()> {
        let sp = self.begin_savepoint()?;
        for (path, entities, calls, includes, bytes) in items {
            self.ingest_file(
                &path,
                &entities,
                &calls,
                &includes,
                bytes.as_deref(),
                true,
            )?;
        }
        sp.commit()
    }

    /// Links unresolved calls to the unique function definition matching
    /// their `dst_name`, if exactly one exists. Runs candidate population
    /// first, then performs the link inside its own savepoint. Returns the
    /// number of calls updated.
    pub fn resolve_unlinked_calls(&self) -> Result<usize> {
        self.populate_candidates();

        let sp = self.begin_savepoint()?;
        let updated = self.conn.execute(
            "WITH defs AS (
               SELECT name, gid FROM entities WHERE kind='fn'
             ),
             uniq AS (
               SELECT name, gid FROM defs GROUP BY name HAVING COUNT(*) = 1
             )
             UPDATE calls
             SET dst_gid = (SELECT uniq.gid FROM uniq WHERE uniq.name = calls.dst_name)
             WHERE dst_gid IS NULL
               AND EXISTS (SELECT 1 FROM uniq WHERE uniq.name = calls.dst_name)",
            [],
        )?;
        sp.commit()?;
        Ok(updated)
    }

    /// Returns the canonical absolute paths of all files that transitively
    /// include any of `seed_paths`, sorted lexicographically.
    ///
    /// When `transitive` is false, only files that directly include a seed
    /// are returned. `include_self` additionally includes the seeds
    /// themselves (after resolving them to on-disk rows; seeds with no
    /// `files` row are silently dropped, matching the original's
    /// best-effort closure).
    pub fn affected_files(
        &self,
        seed_paths: &[impl AsRef<Path>],
        transitive: bool,
        include_self: bool,
    ) -> Result<Vec<String>> {
        let seed_ids: Vec<i64> = {
            let mut ids = Vec::new();
            for p in seed_paths {
                let canon = canon_path(p.as_ref());
                if let Ok(id) = self.conn.query_row(
                    "SELECT id FROM files WHERE path=?1",
                    params![canon],
                    |r| r.get::<_, i64>(0),
                ) {
                    ids.push(id);
                }
            }
            ids
        };

        let mut result: HashSet<i64> = HashSet::new();
        if include_self {
            result.extend(seed_ids.iter().copied());
        }

        let mut frontier: VecDeque<i64> = seed_ids.into_iter().collect();
        let mut visited: HashSet<i64> = frontier.iter().copied().collect();

        while let Some(current) = frontier.pop_front() {
            let mut stmt = self
                .conn
                .prepare("SELECT src_file_id FROM includes WHERE dst_file_id=?1")?;
            let includers: Vec<i64> = stmt
                .query_map(params![current], |r| r.get(0))?
                .filter_map(|r| r.ok())
                .collect();
            for includer in includers {
                result.insert(includer);
                // Non-transitive mode never refills the frontier, so BFS
                // naturally stops after one hop from the seeds.
                if transitive && visited.insert(includer) {
                    frontier.push_back(includer);
                }
            }
        }

        let mut paths: Vec<String> = Vec::with_capacity(result.len());
        for id in result {
            if let Ok(path) = self.conn.query_row(
                "SELECT path FROM files WHERE id=?1",
                params![id],
                |r| r.get::<_, String>(0),
            ) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityKind, Linkage, Storage};
    use std::path::PathBuf;

    fn fn_entity(name: &str, gid: &str) -> Entity {
        Entity {
            kind: EntityKind::Fn,
            name: name.to_string(),
            start: 0,
            end: 10,
            storage: Storage::Extern,
            decl_sig: name.to_string(),
            eff_sig: "int ()".to_string(),
            gid: gid.to_string(),
            sig_id: "sig1".to_string(),
            linkage: Linkage::External,
        }
    }

    #[test]
    fn ingest_then_reingest_replaces_entities() {
        let store = Store::in_memory().unwrap();
        let path = PathBuf::from("/tmp/does-not-need-to-exist-a.c");
        store
            .ingest_file(&path, &[fn_entity("f", "gid_f")], &[], &[], None, true)
            .unwrap();
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM entities", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        store
            .ingest_file(&path, &[fn_entity("g", "gid_g")], &[], &[], None, true)
            .unwrap();
        let names: Vec<String> = {
            let mut stmt = store.conn.prepare("SELECT name FROM entities").unwrap();
            stmt.query_map([], |r| r.get(0))
                .unwrap()
                .filter_map(|r| r.ok())
                .collect()
        };
        assert_eq!(names, vec!["g".to_string()]);
    }

    #[test]
    fn resolve_unlinked_calls_links_unique_definition() {
        let store = Store::in_memory().unwrap();
        let a = PathBuf::from("/tmp/a.c");
        let b = PathBuf::from("/tmp/b.c");
        store
            .ingest_file(&a, &[fn_entity("f", "gid_f")], &[], &[], None, true)
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO calls(src_gid, dst_gid, dst_name) VALUES ('gid_f', NULL, 'g')",
                [],
            )
            .unwrap();
        store
            .ingest_file(&b, &[fn_entity("g", "gid_g")], &[], &[], None, true)
            .unwrap();

        let updated = store.resolve_unlinked_calls().unwrap();
        assert_eq!(updated, 1);
        let dst: String = store
            .conn
            .query_row("SELECT dst_gid FROM calls WHERE src_gid='gid_f'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(dst, "gid_g");
    }

    #[test]
    fn resolve_unlinked_calls_ignores_ambiguous_names() {
        let store = Store::in_memory().unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/a.c"),
                &[fn_entity("f", "gid_f")],
                &[],
                &[],
                None,
                true,
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO calls(src_gid, dst_gid, dst_name) VALUES ('gid_f', NULL, 'dup')",
                [],
            )
            .unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/b.c"),
                &[fn_entity("dup", "gid_dup1")],
                &[],
                &[],
                None,
                true,
            )
            .unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/c.c"),
                &[fn_entity("dup", "gid_dup2")],
                &[],
                &[],
                None,
                true,
            )
            .unwrap();

        let updated = store.resolve_unlinked_calls().unwrap();
        assert_eq!(updated, 0);
    }
}
