//! Connection provider.
//!
//! Every call hands back a fresh connection; nothing is pooled or reused.
//! Callers release the handle by dropping it.

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{Result, StoreError};

/// Open the store, creating the file if it does not exist yet.
pub fn open(config: &Config) -> Result<Connection> {
    let path = config.db_path();
    debug!(path = ?path, "opening database");

    Connection::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Open an existing store without write access.
pub fn open_read_only(config: &Config) -> Result<Connection> {
    let path = config.db_path();
    debug!(path = ?path, "opening database read-only");

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    Connection::open_with_flags(path, flags).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Best-effort open for setup scripts: logs the failure and returns `None`.
pub fn try_open(config: &Config) -> Option<Connection> {
    match open(config) {
        Ok(conn) => Some(conn),
        Err(e) => {
            error!(error = %e, "could not open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path().join("jobs.db"));

        let conn = open(&config).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        drop(conn);

        assert!(config.db_path().exists());
    }

    #[test]
    fn test_try_open_swallows_failure() {
        let dir = TempDir::new().unwrap();
        // A directory that does not exist cannot hold a new database file
        let config = Config::new(dir.path().join("missing").join("jobs.db"));

        assert!(try_open(&config).is_none());
        assert!(matches!(open(&config), Err(StoreError::Open { .. })));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path().join("jobs.db"));
        open(&config)
            .unwrap()
            .execute_batch("CREATE TABLE t (x INTEGER)")
            .unwrap();

        let conn = open_read_only(&config).unwrap();
        assert!(conn.execute("INSERT INTO t (x) VALUES (1)", []).is_err());
    }

    #[test]
    fn test_read_only_does_not_create() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path().join("absent.db"));

        assert!(open_read_only(&config).is_err());
        assert!(!config.db_path().exists());
    }
}
