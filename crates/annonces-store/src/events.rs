//! Engagement event log.
//!
//! Events are append-only.  Recording a contact click or a share also bumps
//! the matching counter on the listing in the same transaction; view events
//! never touch `views`, which is owned by [`Database::increment_views`].

use annonces_shared::EventKind;
use chrono::Utc;
use rusqlite::params;

use crate::codec::{decode_value, json_to_sql, tag_from_sql, ts_from_sql, ts_to_sql};
use crate::database::Database;
use crate::error::{is_foreign_key_violation, Result, StoreError};
use crate::models::{EngagementEvent, NewEvent};

impl Database {
    /// Append an event and return its id.
    ///
    /// Fails with [`StoreError::NotFound`] when `listing_id` references a
    /// listing that does not exist.
    pub fn record_event(&self, event: &NewEvent) -> Result<i64> {
        let occurred_at = event.occurred_at.unwrap_or_else(Utc::now);
        let extra = event.extra.as_ref().map(json_to_sql).transpose()?;

        let tx = self.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT INTO engagement_events (listing_id, kind, source, ip, user_agent, occurred_at, extra)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.listing_id,
                event.kind.as_str(),
                event.source.as_deref().map(str::trim).filter(|s| !s.is_empty()),
                event.ip,
                event.user_agent,
                ts_to_sql(&occurred_at),
                extra,
            ],
        )
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::NotFound
            } else {
                StoreError::Unavailable(e)
            }
        })?;
        let id = tx.last_insert_rowid();

        if let (Some(listing_id), Some(column)) = (event.listing_id, counter_column(event.kind)) {
            tx.execute(
                &format!("UPDATE listings SET {column} = {column} + 1 WHERE id = ?1"),
                params![listing_id],
            )?;
        }

        tx.commit()?;

        tracing::debug!(
            event_id = id,
            listing_id = ?event.listing_id,
            kind = %event.kind,
            "engagement event recorded"
        );
        Ok(id)
    }

    /// All events of a listing, oldest first.
    pub fn events_for_listing(&self, listing_id: i64) -> Result<Vec<EngagementEvent>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, listing_id, kind, source, ip, user_agent, occurred_at, extra
             FROM engagement_events
             WHERE listing_id = ?1
             ORDER BY occurred_at ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![listing_id], row_to_event)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

/// Listing counter mirrored by each kind, if any.
fn counter_column(kind: EventKind) -> Option<&'static str> {
    match kind {
        EventKind::View => None,
        EventKind::ContactClick => Some("contact_clicks"),
        EventKind::Share => Some("shares"),
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EngagementEvent> {
    let id: i64 = row.get(0)?;
    let kind: String = row.get(2)?;
    let occurred_str: String = row.get(6)?;

    Ok(EngagementEvent {
        id,
        listing_id: row.get(1)?,
        kind: tag_from_sql(2, &kind)?,
        source: row.get(3)?,
        ip: row.get(4)?,
        user_agent: row.get(5)?,
        occurred_at: ts_from_sql(6, &occurred_str)?,
        extra: decode_value(id, "extra", row.get(7)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::test_db;
    use crate::listings::tests::published;
    use annonces_shared::Category;
    use serde_json::json;

    fn listing(db: &Database) -> i64 {
        db.create_listing(&published("Villa A", Category::RealEstate, 1.0))
            .unwrap()
    }

    #[test]
    fn view_events_do_not_bump_the_counter() {
        let (db, _dir) = test_db();
        let id = listing(&db);

        db.record_event(&NewEvent::new(id, EventKind::View)).unwrap();
        assert_eq!(db.get_listing(id).unwrap().views, 0);

        db.increment_views(id).unwrap();
        assert_eq!(db.get_listing(id).unwrap().views, 1);
        assert_eq!(db.events_for_listing(id).unwrap().len(), 1);
    }

    #[test]
    fn clicks_and_shares_bump_their_counters() {
        let (db, _dir) = test_db();
        let id = listing(&db);

        db.record_event(&NewEvent::new(id, EventKind::ContactClick).with_source("whatsapp"))
            .unwrap();
        db.record_event(&NewEvent::new(id, EventKind::ContactClick).with_source("phone"))
            .unwrap();
        db.record_event(&NewEvent::new(id, EventKind::Share).with_source("facebook"))
            .unwrap();

        let stored = db.get_listing(id).unwrap();
        assert_eq!(stored.contact_clicks, 2);
        assert_eq!(stored.shares, 1);
        assert_eq!(stored.views, 0);
    }

    #[test]
    fn event_fields_round_trip() {
        let (db, _dir) = test_db();
        let id = listing(&db);
        let at = Utc::now() - chrono::Duration::days(2);

        let event = NewEvent::new(id, EventKind::Share)
            .with_source(" twitter ")
            .with_requester(Some("10.0.0.1".into()), Some("Mozilla/5.0".into()))
            .with_extra(json!({"campaign": "rentree"}))
            .at(at);
        let event_id = db.record_event(&event).unwrap();

        let stored = &db.events_for_listing(id).unwrap()[0];
        assert_eq!(stored.id, event_id);
        assert_eq!(stored.source.as_deref(), Some("twitter"));
        assert_eq!(stored.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(stored.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(stored.extra, Some(json!({"campaign": "rentree"})));
        assert_eq!(
            stored.occurred_at.timestamp_micros(),
            at.timestamp_micros()
        );
    }

    #[test]
    fn orphan_events_are_accepted() {
        let (db, _dir) = test_db();
        let id = db.record_event(&NewEvent::orphan(EventKind::View)).unwrap();
        assert!(id > 0);
    }

    #[test]
    fn unknown_listing_is_not_found() {
        let (db, _dir) = test_db();
        let err = db
            .record_event(&NewEvent::new(4_242, EventKind::ContactClick))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM engagement_events", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn malformed_extra_is_dropped_on_read() {
        let (db, _dir) = test_db();
        let id = listing(&db);
        db.record_event(&NewEvent::new(id, EventKind::View)).unwrap();
        db.conn()
            .execute("UPDATE engagement_events SET extra = '{oops'", [])
            .unwrap();

        let events = db.events_for_listing(id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].extra, None);
    }

    #[test]
    fn deleting_a_listing_removes_its_events() {
        let (db, _dir) = test_db();
        let id = listing(&db);
        let other = listing(&db);

        db.record_event(&NewEvent::new(id, EventKind::View)).unwrap();
        db.record_event(&NewEvent::new(id, EventKind::View)).unwrap();
        db.record_event(&NewEvent::new(id, EventKind::ContactClick))
            .unwrap();
        db.record_event(&NewEvent::new(id, EventKind::Share)).unwrap();
        db.record_event(&NewEvent::new(other, EventKind::View))
            .unwrap();
        assert_eq!(db.events_for_listing(id).unwrap().len(), 4);

        assert!(db.delete_listing(id).unwrap());

        assert!(db.events_for_listing(id).unwrap().is_empty());
        assert_eq!(db.events_for_listing(other).unwrap().len(), 1);
    }
}
