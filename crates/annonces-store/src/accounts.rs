//! Visitor and back-office accounts.
//!
//! Emails are stored trimmed and lowercased; lookups normalise the same way.
//! Password hashing is the caller's concern.

use annonces_shared::validation::{is_blank, is_valid_email, normalize_email};
use annonces_shared::{StaffRole, ValidationError};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::{opt_ts_from_sql, tag_from_sql, ts_from_sql, ts_to_sql};
use crate::database::Database;
use crate::error::{is_unique_violation, not_found_or_unavailable, Result, StoreError};
use crate::models::{PublicUser, StaffUser};

impl Database {
    // ------------------------------------------------------------------
    // Public users
    // ------------------------------------------------------------------

    /// Register a visitor.  A second account with the same (normalised)
    /// email is a [`StoreError::Conflict`].
    pub fn create_public_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        let email = normalize_email(email);
        check_account(name, &email, &[("password hash", password_hash)])?;

        self.conn()
            .execute(
                "INSERT INTO public_users (name, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name.trim(), email, password_hash, ts_to_sql(&Utc::now())],
            )
            .map_err(|e| conflict_on_duplicate(e, &email))?;

        let id = self.conn().last_insert_rowid();
        tracing::info!(user_id = id, "public user created");
        Ok(id)
    }

    pub fn find_public_user_by_email(&self, email: &str) -> Result<Option<PublicUser>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, name, email, password_hash, created_at
                 FROM public_users WHERE email = ?1",
                params![normalize_email(email)],
                |row| {
                    let created: String = row.get(4)?;
                    Ok(PublicUser {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        password_hash: row.get(3)?,
                        created_at: ts_from_sql(4, &created)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Staff users
    // ------------------------------------------------------------------

    pub fn create_staff_user(&self, email: &str, name: &str, role: StaffRole) -> Result<i64> {
        let email = normalize_email(email);
        check_account(name, &email, &[])?;

        self.conn()
            .execute(
                "INSERT INTO staff_users (email, name, role, active, created_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![email, name.trim(), role.as_str(), ts_to_sql(&Utc::now())],
            )
            .map_err(|e| conflict_on_duplicate(e, &email))?;

        let id = self.conn().last_insert_rowid();
        tracing::info!(user_id = id, role = role.as_str(), "staff user created");
        Ok(id)
    }

    pub fn find_staff_user_by_email(&self, email: &str) -> Result<Option<StaffUser>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, email, name, role, active, created_at, last_login
                 FROM staff_users WHERE email = ?1",
                params![normalize_email(email)],
                row_to_staff_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Stamp `last_login` with the current time.
    pub fn record_staff_login(&self, id: i64) -> Result<StaffUser> {
        let affected = self.conn().execute(
            "UPDATE staff_users SET last_login = ?1 WHERE id = ?2",
            params![ts_to_sql(&Utc::now()), id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.conn()
            .query_row(
                "SELECT id, email, name, role, active, created_at, last_login
                 FROM staff_users WHERE id = ?1",
                params![id],
                row_to_staff_user,
            )
            .map_err(not_found_or_unavailable)
    }
}

fn check_account(name: &str, email: &str, required: &[(&str, &str)]) -> Result<()> {
    let mut reasons = Vec::new();
    if is_blank(name) {
        reasons.push("name is required".to_string());
    }
    if email.is_empty() {
        reasons.push("email is required".to_string());
    } else if !is_valid_email(email) {
        reasons.push(format!("email {email:?} is not a valid address"));
    }
    for (field, value) in required {
        if is_blank(value) {
            reasons.push(format!("{field} is required"));
        }
    }
    ValidationError::check(reasons)?;
    Ok(())
}

fn conflict_on_duplicate(e: rusqlite::Error, email: &str) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::Conflict(format!("an account already exists for {email}"))
    } else {
        StoreError::Unavailable(e)
    }
}

fn row_to_staff_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<StaffUser> {
    let role: String = row.get(3)?;
    let created: String = row.get(5)?;

    Ok(StaffUser {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: tag_from_sql(3, &role)?,
        active: row.get(4)?,
        created_at: ts_from_sql(5, &created)?,
        last_login: opt_ts_from_sql(6, row.get(6)?)?,
    })
}
