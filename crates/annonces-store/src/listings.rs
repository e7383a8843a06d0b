//! CRUD and search operations for [`Listing`] records.

use annonces_shared::constants::DEFAULT_CURRENCY;
use annonces_shared::validation::is_blank;
use annonces_shared::{ListingCriteria, ListingStatus};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::codec::{
    decode_list, decode_map, json_to_sql, opt_ts_from_sql, tag_from_sql, ts_from_sql, ts_to_sql,
};
use crate::database::Database;
use crate::error::{not_found_or_unavailable, Result};
use crate::filters::build_predicate;
use crate::models::{Listing, ListingUpdate, NewListing};

const LISTING_COLUMNS: &str = "id, title, description, category, listing_type, price, currency,
     location_text, city, neighborhood, contact_name, contact_phone, contact_email,
     contact_whatsapp, status, created_at, modified_at, expires_at, views, contact_clicks,
     shares, category_payload, photos, videos";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Validate and insert a listing.  Returns the new id.
    pub fn create_listing(&self, listing: &NewListing) -> Result<i64> {
        listing.validate()?;

        let now = ts_to_sql(&Utc::now());
        let currency = if is_blank(&listing.currency) {
            DEFAULT_CURRENCY
        } else {
            listing.currency.trim()
        };
        let status = listing.status.unwrap_or_default();

        self.conn().execute(
            "INSERT INTO listings (
                title, description, category, listing_type, price, currency,
                location_text, city, neighborhood, contact_name, contact_phone,
                contact_email, contact_whatsapp, status, created_at, modified_at,
                expires_at, category_payload, photos, videos
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                       ?17, ?18, ?19, ?20)",
            params![
                listing.title.trim(),
                listing.description.trim(),
                listing.category.map(|c| c.as_str()),
                listing.listing_type.map(|t| t.as_str()),
                listing.price,
                currency,
                non_blank(listing.location.as_deref()),
                listing.city.trim(),
                non_blank(listing.neighborhood.as_deref()),
                listing.contact_name.trim(),
                listing.contact_phone.trim(),
                non_blank(listing.contact_email.as_deref()),
                non_blank(listing.contact_whatsapp.as_deref()),
                status.as_str(),
                now,
                now,
                listing.expires_at.as_ref().map(ts_to_sql),
                json_to_sql(&listing.category_payload)?,
                json_to_sql(&listing.photos)?,
                json_to_sql(&listing.videos)?,
            ],
        )?;

        let id = self.conn().last_insert_rowid();
        tracing::info!(
            listing_id = id,
            category = ?listing.category,
            status = %status,
            "listing created"
        );
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply the provided fields and refresh `modified_at`.
    ///
    /// Returns `false` when nothing was written: either the update is empty
    /// or no listing has this id.
    pub fn update_listing(&self, id: i64, update: &ListingUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        update.validate()?;

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let mut set = |column: &'static str, value: Value| {
            assignments.push(column);
            values.push(value);
        };

        if let Some(title) = &update.title {
            set("title = ?", text(title.trim()));
        }
        if let Some(description) = &update.description {
            set("description = ?", text(description.trim()));
        }
        if let Some(category) = update.category {
            set("category = ?", text(category.as_str()));
        }
        if let Some(listing_type) = update.listing_type {
            set("listing_type = ?", text(listing_type.as_str()));
        }
        if let Some(price) = update.price {
            set("price = ?", Value::Real(price));
        }
        if let Some(currency) = &update.currency {
            let currency = if is_blank(currency) {
                DEFAULT_CURRENCY
            } else {
                currency.trim()
            };
            set("currency = ?", text(currency));
        }
        if let Some(location) = &update.location {
            set("location_text = ?", nullable_text(location));
        }
        if let Some(city) = &update.city {
            set("city = ?", text(city.trim()));
        }
        if let Some(neighborhood) = &update.neighborhood {
            set("neighborhood = ?", nullable_text(neighborhood));
        }
        if let Some(name) = &update.contact_name {
            set("contact_name = ?", text(name.trim()));
        }
        if let Some(phone) = &update.contact_phone {
            set("contact_phone = ?", text(phone.trim()));
        }
        if let Some(email) = &update.contact_email {
            set("contact_email = ?", nullable_text(email));
        }
        if let Some(whatsapp) = &update.contact_whatsapp {
            set("contact_whatsapp = ?", nullable_text(whatsapp));
        }
        if let Some(status) = update.status {
            set("status = ?", text(status.as_str()));
        }
        if let Some(expires_at) = &update.expires_at {
            let value = match expires_at {
                Some(ts) => Value::Text(ts_to_sql(ts)),
                None => Value::Null,
            };
            set("expires_at = ?", value);
        }
        if let Some(payload) = &update.category_payload {
            set("category_payload = ?", Value::Text(json_to_sql(payload)?));
        }
        if let Some(photos) = &update.photos {
            set("photos = ?", Value::Text(json_to_sql(photos)?));
        }
        if let Some(videos) = &update.videos {
            set("videos = ?", Value::Text(json_to_sql(videos)?));
        }

        set("modified_at = ?", Value::Text(ts_to_sql(&Utc::now())));
        values.push(Value::Integer(id));

        let sql = format!("UPDATE listings SET {} WHERE id = ?", assignments.join(", "));
        let affected = self.conn().execute(&sql, params_from_iter(values.iter()))?;

        tracing::debug!(listing_id = id, columns = assignments.len() - 1, affected, "listing updated");
        Ok(affected > 0)
    }

    /// Move a listing to another lifecycle state (publish, archive, ...).
    pub fn set_listing_status(&self, id: i64, status: ListingStatus) -> Result<bool> {
        let changed = self.update_listing(id, &ListingUpdate::status(status))?;
        if changed {
            tracing::info!(listing_id = id, status = %status, "listing status changed");
        }
        Ok(changed)
    }

    /// Atomically add one to the view counter.  Returns `false` for an
    /// unknown id.
    pub fn increment_views(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("UPDATE listings SET views = views + 1 WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single listing by id.
    pub fn get_listing(&self, id: i64) -> Result<Listing> {
        self.conn()
            .query_row(
                &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
                params![id],
                row_to_listing,
            )
            .map_err(not_found_or_unavailable)
    }

    /// One page of listings matching `criteria`, newest first.
    ///
    /// A page shorter than `limit` is the last one.  An empty vector means
    /// nothing matched; storage failures are reported as errors.
    pub fn query_listings(
        &self,
        criteria: &ListingCriteria,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Listing>> {
        let predicate = build_predicate(criteria);
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            predicate.clause
        );

        let mut values = predicate.params;
        values.push(Value::Integer(i64::from(limit)));
        values.push(Value::Integer(i64::from(offset)));

        tracing::debug!(sql = %sql, params = values.len(), "querying listings");

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_listing)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    /// Number of listings matching `criteria` (same predicate as
    /// [`query_listings`](Self::query_listings)).
    pub fn count_listings(&self, criteria: &ListingCriteria) -> Result<i64> {
        let predicate = build_predicate(criteria);
        let sql = format!("SELECT COUNT(*) FROM listings{}", predicate.clause);
        let count = self.conn().query_row(
            &sql,
            params_from_iter(predicate.params.iter()),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a listing.  Its engagement events go with it (ON DELETE
    /// CASCADE).  Returns `true` if a row was deleted.
    pub fn delete_listing(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM listings WHERE id = ?1", params![id])?;
        if affected > 0 {
            tracing::info!(listing_id = id, "listing deleted");
        }
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn nullable_text(s: &str) -> Value {
    match non_blank(Some(s)) {
        Some(s) => text(s),
        None => Value::Null,
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Map a `rusqlite::Row` selected with [`LISTING_COLUMNS`] to a [`Listing`].
fn row_to_listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<Listing> {
    let id: i64 = row.get(0)?;
    let category: String = row.get(3)?;
    let listing_type: String = row.get(4)?;
    let status: String = row.get(14)?;
    let created_str: String = row.get(15)?;
    let modified_str: String = row.get(16)?;

    Ok(Listing {
        id,
        title: row.get(1)?,
        description: row.get(2)?,
        category: tag_from_sql(3, &category)?,
        listing_type: tag_from_sql(4, &listing_type)?,
        price: row.get(5)?,
        currency: row.get(6)?,
        location: row.get(7)?,
        city: row.get(8)?,
        neighborhood: row.get(9)?,
        contact_name: row.get(10)?,
        contact_phone: row.get(11)?,
        contact_email: row.get(12)?,
        contact_whatsapp: row.get(13)?,
        status: tag_from_sql(14, &status)?,
        created_at: ts_from_sql(15, &created_str)?,
        modified_at: ts_from_sql(16, &modified_str)?,
        expires_at: opt_ts_from_sql(17, row.get(17)?)?,
        views: row.get(18)?,
        contact_clicks: row.get(19)?,
        shares: row.get(20)?,
        category_payload: decode_map(id, "category_payload", row.get(21)?),
        photos: decode_list(id, "photos", row.get(22)?),
        videos: decode_list(id, "videos", row.get(23)?),
    })
}
