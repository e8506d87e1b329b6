//! Schema creation, FTS triggers, and incremental migration.

use super::Store;
use crate::types::Result;

pub(super) const SCHEMA_VERSION: u32 = 1;

const CREATE_SQL: &str = "
CREATE TABLE IF NOT EXISTS meta (
  key   TEXT PRIMARY KEY,
  value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
  id      INTEGER PRIMARY KEY AUTOINCREMENT,
  path    TEXT NOT NULL UNIQUE,
  mtime   REAL,
  size    INTEGER,
  sha256  TEXT
);

CREATE TABLE IF NOT EXISTS entities (
  gid       TEXT PRIMARY KEY,
  kind      TEXT NOT NULL,
  name      TEXT NOT NULL,
  storage   TEXT NOT NULL,
  linkage   TEXT NOT NULL DEFAULT 'external',
  decl_sig  TEXT NOT NULL DEFAULT '',
  eff_sig   TEXT NOT NULL DEFAULT '',
  sig_id    TEXT NOT NULL DEFAULT '',
  file_id   INTEGER NOT NULL,
  start     INTEGER NOT NULL,
  \"end\"     INTEGER NOT NULL,
  FOREIGN KEY(file_id) REFERENCES files(id) ON DELETE CASCADE
    DEFERRABLE INITIALLY DEFERRED
);
CREATE INDEX IF NOT EXISTS idx_entities_file ON entities(file_id, start);
CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name);
CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);

CREATE TABLE IF NOT EXISTS callsites (
  id         INTEGER PRIMARY KEY AUTOINCREMENT,
  src_gid    TEXT NOT NULL,
  kind       TEXT NOT NULL,
  name_hint  TEXT,
  expr       TEXT,
  sig_id     TEXT,
  FOREIGN KEY(src_gid) REFERENCES entities(gid) ON DELETE CASCADE
    DEFERRABLE INITIALLY DEFERRED
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_callsites_norm
  ON callsites(src_gid, IFNULL(name_hint,''), kind);

CREATE TABLE IF NOT EXISTS calls (
  id           INTEGER PRIMARY KEY AUTOINCREMENT,
  src_gid      TEXT NOT NULL,
  dst_gid      TEXT,
  dst_name     TEXT,
  callsite_id  INTEGER,
  FOREIGN KEY(src_gid) REFERENCES entities(gid) ON DELETE CASCADE
    DEFERRABLE INITIALLY DEFERRED,
  FOREIGN KEY(dst_gid) REFERENCES entities(gid) ON DELETE SET NULL
    DEFERRABLE INITIALLY DEFERRED,
  FOREIGN KEY(callsite_id) REFERENCES callsites(id) ON DELETE SET NULL
    DEFERRABLE INITIALLY DEFERRED
);
CREATE INDEX IF NOT EXISTS idx_calls_src ON calls(src_gid);
CREATE INDEX IF NOT EXISTS idx_calls_dst ON calls(dst_gid);
CREATE INDEX IF NOT EXISTS idx_calls_callsite ON calls(callsite_id);
CREATE UNIQUE INDEX IF NOT EXISTS uq_calls_norm
  ON calls(src_gid, IFNULL(dst_gid,''), IFNULL(dst_name,''));

CREATE TABLE IF NOT EXISTS call_candidates (
  callsite_id  INTEGER NOT NULL,
  dst_gid      TEXT NOT NULL,
  rank         INTEGER NOT NULL DEFAULT 0,
  PRIMARY KEY (callsite_id, dst_gid),
  FOREIGN KEY(callsite_id) REFERENCES callsites(id) ON DELETE CASCADE
    DEFERRABLE INITIALLY DEFERRED,
  FOREIGN KEY(dst_gid) REFERENCES entities(gid) ON DELETE CASCADE
    DEFERRABLE INITIALLY DEFERRED
);
CREATE INDEX IF NOT EXISTS idx_candidates_dst ON call_candidates(dst_gid);

CREATE TABLE IF NOT EXISTS includes (
  src_file_id  INTEGER NOT NULL,
  dst_file_id  INTEGER NOT NULL,
  kind         TEXT NOT NULL DEFAULT '',
  UNIQUE(src_file_id, dst_file_id),
  FOREIGN KEY(src_file_id) REFERENCES files(id) ON DELETE CASCADE
    DEFERRABLE INITIALLY DEFERRED,
  FOREIGN KEY(dst_file_id) REFERENCES files(id) ON DELETE CASCADE
    DEFERRABLE INITIALLY DEFERRED
);
CREATE INDEX IF NOT EXISTS idx_includes_dst ON includes(dst_file_id);
";

const FTS_SQL: &str = "
DROP TRIGGER IF EXISTS trg_entities_fts_upsert;
DROP TRIGGER IF EXISTS trg_entities_fts_update;
DROP TRIGGER IF EXISTS trg_entities_fts_delete;
DROP TABLE   IF EXISTS entities_fts;

CREATE VIRTUAL TABLE entities_fts USING fts5(
  gid UNINDEXED, name, decl_sig, eff_sig,
  content='entities', content_rowid='rowid',
  tokenize='unicode61'
);

CREATE TRIGGER trg_entities_fts_upsert
AFTER INSERT ON entities BEGIN
  INSERT INTO entities_fts(rowid, gid, name, decl_sig, eff_sig)
  VALUES (new.rowid, new.gid, new.name, new.decl_sig, new.eff_sig);
END;

CREATE TRIGGER trg_entities_fts_update
AFTER UPDATE ON entities BEGIN
  INSERT INTO entities_fts(entities_fts, rowid, gid, name, decl_sig, eff_sig)
  VALUES('delete', old.rowid, old.gid, old.name, old.decl_sig, old.eff_sig);
  INSERT INTO entities_fts(rowid, gid, name, decl_sig, eff_sig)
  VALUES (new.rowid, new.gid, new.name, new.decl_sig, new.eff_sig);
END;

CREATE TRIGGER trg_entities_fts_delete
AFTER DELETE ON entities BEGIN
  INSERT INTO entities_fts(entities_fts, rowid, gid, name, decl_sig, eff_sig)
  VALUES('delete', old.rowid, old.gid, old.name, old.decl_sig, old.eff_sig);
END;
";

impl Store {
    pub(super) fn ensure_schema(&self) -> Result<()> {
        let current: Option<u32> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key='schema_version'",
                [],
                |row| row.get::<_, String>(0),
            )
            .ok()
            .and_then(|v| v.parse().ok());

        if current != Some(SCHEMA_VERSION) {
            self.conn.execute_batch(CREATE_SQL)?;
            self.conn.execute_batch(FTS_SQL)?;
            self.conn.execute(
                "INSERT OR REPLACE INTO meta(key, value) VALUES ('schema_version', ?1)",
                [SCHEMA_VERSION.to_string()],
            )?;
        }

        self.migrate_incremental()?;
        self.rebuild_fts_if_empty()?;
        Ok(())
    }

    /// Idempotently adds columns that earlier schema versions lacked.
    /// Runs after the full create script so a fresh database is a no-op;
    /// exists to carry a database created by an older build of this store
    /// forward without a destructive rebuild.
    fn migrate_incremental(&self) -> Result<()> {
        self.add_column_if_missing("entities", "sig_id", "TEXT NOT NULL DEFAULT ''")?;
        self.add_column_if_missing("entities", "linkage", "TEXT NOT NULL DEFAULT 'external'")?;
        self.add_column_if_missing("calls", "callsite_id", "INTEGER")?;
        Ok(())
    }

    fn add_column_if_missing(&self, table: &str, column: &str, decl: &str) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({table})"))?;
        let has_column = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .any(|name| name == column);
        drop(stmt);
        if !has_column {
            self.conn
                .execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"))?;
        }
        Ok(())
    }

    fn rebuild_fts_if_empty(&self) -> Result<()> {
        let fts_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entities_fts", [], |r| r.get(0))
            .unwrap_or(0);
        let entity_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entities", [], |r| r.get(0))
            .unwrap_or(0);
        if fts_count == 0 && entity_count > 0 {
            self.conn.execute_batch(
                "INSERT INTO entities_fts(rowid, gid, name, decl_sig, eff_sig)
                 SELECT rowid, gid, name, decl_sig, eff_sig FROM entities",
            )?;
        }
        Ok(())
    }
}
