//! The single-file SQLite store: schema, transactional ingest, lookups,
//! and maintenance.

mod ingest;
mod maintenance;
mod query;
mod schema;

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use rusqlite::Connection;

use crate::types::{GlyphError, Result};

/// A handle to one glyph database file.
///
/// Holds a single `rusqlite::Connection`; not `Sync`. Multiple `Store`s may
/// open the same WAL-mode file concurrently from separate threads or
/// processes, but a single `Store` must not be shared across threads
/// without external serialisation.
pub struct Store {
    conn: Connection,
    savepoint_counter: AtomicU32,
}

impl Store {
    /// Opens or creates a glyph database at `path`, applying pragmas and
    /// running schema creation/migration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self {
            conn,
            savepoint_counter: AtomicU32::new(0),
        };
        store.apply_pragmas()?;
        store.ensure_schema()?;
        Ok(store)
    }

    /// Opens an in-memory database (for tests and scratch use).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            savepoint_counter: AtomicU32::new(0),
        };
        store.apply_pragmas()?;
        store.ensure_schema()?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys=ON;
             PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA cache_size=-80000;
             PRAGMA recursive_triggers=ON;",
        )?;
        Ok(())
    }

    /// Begins a named savepoint, incrementing the nesting counter. The
    /// returned guard rolls back automatically on drop unless
    /// [`Savepoint::commit`] is called, so any early `?` return during
    /// ingest undoes everything done under it.
    fn begin_savepoint(&self) -> Result<Savepoint<'_>> {
        let n = self.savepoint_counter.fetch_add(1, Ordering::SeqCst);
        let name = format!("glyph_sp{n}");
        self.conn
            .execute_batch(&format!("SAVEPOINT {name}"))?;
        Ok(Savepoint {
            conn: &self.conn,
            name,
            active: true,
        })
    }

    pub fn schema_version(&self) -> Result<u32> {
        let version: String = self.conn.query_row(
            "SELECT value FROM meta WHERE key='schema_version'",
            [],
            |row| row.get(0),
        )?;
        version
            .parse()
            .map_err(|e| GlyphError::Schema(format!("invalid schema_version: {e}")))
    }
}

/// RAII guard over a named `SAVEPOINT`. Rolls back to the savepoint on drop
/// unless explicitly committed, so any early return inside the guard's
/// scope (via `?`) undoes its work without touching outer savepoints.
struct Savepoint<'conn> {
    conn: &'conn Connection,
    name: String,
    active: bool,
}

impl Savepoint<'_> {
    fn commit(mut self) -> Result<()> {
        self.conn
            .execute_batch(&format!("RELEASE {}", self.name))?;
        self.active = false;
        Ok(())
    }
}

impl Drop for Savepoint<'_> {
    fn drop(&mut self) {
        if self.active {
            let _ = self
                .conn
                .execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0}", self.name));
        }
    }
}
