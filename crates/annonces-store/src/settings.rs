//! Key/value site settings and the cached site identity.

use std::collections::BTreeMap;

use annonces_shared::constants::{DEFAULT_COMPANY_NAME, SETTING_COMPANY_NAME, SETTING_LOGO_PATH};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Stored value for `key`, or `default` when the key is absent or null.
    pub fn get_setting(&self, key: &str, default: Option<&str>) -> Result<Option<String>> {
        let stored: Option<Option<String>> = self
            .conn()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(stored.flatten().or_else(|| default.map(str::to_string)))
    }

    /// Upsert `key`.  `None` deletes it.
    pub fn set_setting(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                self.conn().execute(
                    "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
            }
            None => {
                self.conn()
                    .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
            }
        }
        tracing::debug!(key, deleted = value.is_none(), "setting written");
        Ok(())
    }

    pub fn get_all_settings(&self) -> Result<BTreeMap<String, Option<String>>> {
        let mut stmt = self.conn().prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut out = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

/// Site identity shown in page headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub company_name: String,
    pub logo_path: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            logo_path: None,
        }
    }
}

impl SiteSettings {
    pub fn load(db: &Database) -> Result<Self> {
        let company_name = db
            .get_setting(SETTING_COMPANY_NAME, None)?
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string());
        let logo_path = db
            .get_setting(SETTING_LOGO_PATH, None)?
            .filter(|path| !path.trim().is_empty());

        Ok(Self {
            company_name,
            logo_path,
        })
    }

    /// Persist both keys.  A missing logo deletes the stored one.
    pub fn save(&self, db: &Database) -> Result<()> {
        db.set_setting(SETTING_COMPANY_NAME, Some(self.company_name.trim()))?;
        db.set_setting(SETTING_LOGO_PATH, self.logo_path.as_deref())?;
        Ok(())
    }
}

/// Explicit cache in front of [`SiteSettings::load`].
///
/// Values may be stale until [`refresh`](Self::refresh) or
/// [`invalidate`](Self::invalidate) is called.
#[derive(Debug, Default)]
pub struct SettingsCache {
    cached: Option<SiteSettings>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached settings, loading them on first use.
    pub fn get(&mut self, db: &Database) -> Result<SiteSettings> {
        match &self.cached {
            Some(settings) => Ok(settings.clone()),
            None => self.refresh(db),
        }
    }

    /// Reload from the database unconditionally.
    pub fn refresh(&mut self, db: &Database) -> Result<SiteSettings> {
        let settings = SiteSettings::load(db)?;
        self.cached = Some(settings.clone());
        Ok(settings)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
