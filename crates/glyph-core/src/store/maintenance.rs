//! `analyze`/`vacuum` upkeep.

use super::Store;
use crate::types::Result;

impl Store {
    /// Runs `ANALYZE` inside its own savepoint.
    pub fn analyze(&self) -> Result<()> {
        let sp = self.begin_savepoint()?;
        self.conn.execute_batch("ANALYZE")?;
        sp.commit()
    }

    /// Runs `VACUUM`. Must execute outside any transaction, so this never
    /// opens a savepoint.
    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_and_vacuum_do_not_error_on_empty_db() {
        let store = Store::in_memory().unwrap();
        store.analyze().unwrap();
        store.vacuum().unwrap();
    }
}
