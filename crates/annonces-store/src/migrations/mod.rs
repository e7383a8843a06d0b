//! Schema migrations, applied when a [`Database`](crate::Database) is opened.
//!
//! `PRAGMA user_version` records the last applied step, so reopening an
//! up-to-date file is a no-op.

pub mod v001_initial;
pub mod v002_accounts;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered schema steps; step `n` brings the file to version `n + 1`.
const STEPS: [(&str, Step); 2] = [
    ("v001_initial", v001_initial::up),
    ("v002_accounts", v002_accounts::up),
];

/// Schema version of a fully migrated catalog.
pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    tracing::info!(
        from = current,
        to = CURRENT_VERSION,
        "catalog schema check"
    );

    for (index, (name, up)) in STEPS.iter().enumerate().skip(current as usize) {
        let version = index as u32 + 1;
        tracing::info!(migration = name, version, "applying schema step");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
