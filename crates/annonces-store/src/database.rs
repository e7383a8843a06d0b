//! The catalog database handle.
//!
//! Opening a [`Database`] always brings the schema up to date, so every
//! typed helper can assume the current tables exist.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// How long a statement waits on another connection's write lock before
/// failing with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One SQLite connection to the catalog file.  Not `Sync`: share it behind
/// a mutex or open one handle per thread.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open `annonces.db` in the platform data directory, creating it on
    /// first use:
    /// - Linux:   `~/.local/share/annonces/annonces.db`
    /// - macOS:   `~/Library/Application Support/ga.annonces.annonces/annonces.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\annonces\annonces\data\annonces.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("ga", "annonces", "annonces").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("annonces.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open `path`, creating the file and its parent directory when missing.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Needed for the listing -> events cascade.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Raw connection for maintenance queries the typed helpers don't cover.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing this handle; `None` for in-memory databases.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
