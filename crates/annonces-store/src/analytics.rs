//! Read-only aggregates over the engagement log.
//!
//! Every query takes a closed [`TimeWindow`] and compares it against the
//! RFC-3339 `occurred_at` text, which sorts chronologically.  Windowed
//! joins put the time bound in the `ON` clause so listings without events
//! in the window still appear, with zero counts.

use annonces_shared::format::{average, rate_percent};
use annonces_shared::{Category, EventKind, ListingStatus};
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter};

use crate::codec::{tag_from_sql, ts_from_sql, ts_to_sql};
use crate::database::Database;
use crate::error::Result;
use crate::models::{
    CategoryRollup, DailyActivity, ListingPerformance, Overview, SourceCount, TimeWindow,
};

/// Per-kind counts of windowed events joined onto listings.
const KIND_COUNTS: &str = "COUNT(CASE WHEN e.kind = 'view' THEN 1 END),
     COUNT(CASE WHEN e.kind = 'contact_click' THEN 1 END),
     COUNT(CASE WHEN e.kind = 'share' THEN 1 END)";

impl Database {
    /// Number of events of `kind` inside `window`.
    pub fn count_events(&self, kind: EventKind, window: &TimeWindow) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM engagement_events
             WHERE kind = ?1 AND occurred_at BETWEEN ?2 AND ?3",
            params![kind.as_str(), ts_to_sql(&window.start), ts_to_sql(&window.end)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Published listings ranked by views inside `window`.  Listings with no
    /// events are included with zero counts.
    pub fn top_listings_by_views(
        &self,
        window: &TimeWindow,
        limit: u32,
    ) -> Result<Vec<ListingPerformance>> {
        self.listing_performance(window, i64::from(limit))
    }

    /// The complete per-listing table behind
    /// [`top_listings_by_views`](Self::top_listings_by_views), for exports.
    pub fn export_listing_performance(&self, window: &TimeWindow) -> Result<Vec<ListingPerformance>> {
        // LIMIT -1 is "no limit" in SQLite.
        self.listing_performance(window, -1)
    }

    fn listing_performance(&self, window: &TimeWindow, limit: i64) -> Result<Vec<ListingPerformance>> {
        let sql = format!(
            "SELECT l.id, l.title, l.category, l.city, l.price, l.created_at, {KIND_COUNTS}
             FROM listings l
             LEFT JOIN engagement_events e
               ON e.listing_id = l.id AND e.occurred_at BETWEEN ?1 AND ?2
             WHERE l.status = ?3
             GROUP BY l.id
             ORDER BY 7 DESC, 8 DESC, l.created_at DESC, l.id DESC
             LIMIT ?4"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                ts_to_sql(&window.start),
                ts_to_sql(&window.end),
                ListingStatus::Published.as_str(),
                limit,
            ],
            |row| {
                let category: String = row.get(2)?;
                let created: String = row.get(5)?;
                let views: i64 = row.get(6)?;
                let contact_clicks: i64 = row.get(7)?;
                Ok(ListingPerformance {
                    listing_id: row.get(0)?,
                    title: row.get(1)?,
                    category: tag_from_sql(2, &category)?,
                    city: row.get(3)?,
                    price: row.get(4)?,
                    created_at: ts_from_sql(5, &created)?,
                    views,
                    contact_clicks,
                    shares: row.get(8)?,
                    contact_rate: rate_percent(contact_clicks, views),
                })
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// One row per category, in [`Category::ALL`] order.  Categories without
    /// published listings are reported with zeros.
    pub fn per_category_rollup(&self, window: &TimeWindow) -> Result<Vec<CategoryRollup>> {
        let sql = format!(
            "SELECT l.category, COUNT(DISTINCT l.id), {KIND_COUNTS}
             FROM listings l
             LEFT JOIN engagement_events e
               ON e.listing_id = l.id AND e.occurred_at BETWEEN ?1 AND ?2
             WHERE l.status = ?3
             GROUP BY l.category"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                ts_to_sql(&window.start),
                ts_to_sql(&window.end),
                ListingStatus::Published.as_str(),
            ],
            |row| {
                let category: String = row.get(0)?;
                Ok((
                    tag_from_sql::<Category>(0, &category)?,
                    [row.get::<_, i64>(1)?, row.get(2)?, row.get(3)?, row.get(4)?],
                ))
            },
        )?;

        let mut totals = Vec::new();
        for row in rows {
            totals.push(row?);
        }

        Ok(Category::ALL
            .into_iter()
            .map(|category| {
                let [listings, views, contact_clicks, shares] = totals
                    .iter()
                    .find(|(c, _)| *c == category)
                    .map(|(_, counts)| *counts)
                    .unwrap_or_default();
                CategoryRollup {
                    category,
                    listings,
                    views,
                    contact_clicks,
                    shares,
                    views_per_listing: average(views, listings),
                    clicks_per_listing: average(contact_clicks, listings),
                    contact_rate: rate_percent(contact_clicks, views),
                }
            })
            .collect())
    }

    /// Event counts per source label, most frequent first.  Events without a
    /// source are left out.  `kind = None` counts every kind.
    pub fn per_source_breakdown(
        &self,
        kind: Option<EventKind>,
        window: &TimeWindow,
    ) -> Result<Vec<SourceCount>> {
        let mut sql = String::from(
            "SELECT source, COUNT(*) FROM engagement_events
             WHERE source IS NOT NULL AND occurred_at BETWEEN ? AND ?",
        );
        let mut values = vec![
            Value::Text(ts_to_sql(&window.start)),
            Value::Text(ts_to_sql(&window.end)),
        ];
        if let Some(kind) = kind {
            sql.push_str(" AND kind = ?");
            values.push(Value::Text(kind.as_str().to_string()));
        }
        sql.push_str(" GROUP BY source ORDER BY 2 DESC, source ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(SourceCount {
                source: row.get(0)?,
                count: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Event counts per UTC day and kind, oldest day first.
    pub fn daily_activity(&self, window: &TimeWindow) -> Result<Vec<DailyActivity>> {
        let mut stmt = self.conn().prepare(
            "SELECT substr(occurred_at, 1, 10) AS day, kind, COUNT(*)
             FROM engagement_events
             WHERE occurred_at BETWEEN ?1 AND ?2
             GROUP BY day, kind
             ORDER BY day ASC, kind ASC",
        )?;

        let rows = stmt.query_map(
            params![ts_to_sql(&window.start), ts_to_sql(&window.end)],
            |row| {
                let day: String = row.get(0)?;
                let kind: String = row.get(1)?;
                Ok(DailyActivity {
                    day: NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                    })?,
                    kind: tag_from_sql(1, &kind)?,
                    count: row.get(2)?,
                })
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Dashboard headline figures for `window`.
    pub fn overview(&self, window: &TimeWindow) -> Result<Overview> {
        let (views, contact_clicks, shares): (i64, i64, i64) = self.conn().query_row(
            "SELECT COUNT(CASE WHEN kind = 'view' THEN 1 END),
                    COUNT(CASE WHEN kind = 'contact_click' THEN 1 END),
                    COUNT(CASE WHEN kind = 'share' THEN 1 END)
             FROM engagement_events
             WHERE occurred_at BETWEEN ?1 AND ?2",
            params![ts_to_sql(&window.start), ts_to_sql(&window.end)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let active_listings: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM listings WHERE status = ?1",
            params![ListingStatus::Published.as_str()],
            |row| row.get(0),
        )?;

        Ok(Overview {
            views,
            contact_clicks,
            shares,
            active_listings,
            contact_rate: rate_percent(contact_clicks, views),
            share_rate: rate_percent(shares, views),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::test_db;
    use crate::listings::tests::{published, sample};
    use crate::models::NewEvent;
    use chrono::{Duration, TimeZone, Utc};

    fn record(db: &Database, id: i64, kind: EventKind, times: usize) {
        for _ in 0..times {
            db.record_event(&NewEvent::new(id, kind)).unwrap();
        }
    }

    #[test]
    fn empty_database_yields_zeros() {
        let (db, _dir) = test_db();
        let window = TimeWindow::last_days(30).unwrap();

        assert_eq!(db.count_events(EventKind::View, &window).unwrap(), 0);
        assert!(db.top_listings_by_views(&window, 10).unwrap().is_empty());
        assert!(db.per_source_breakdown(None, &window).unwrap().is_empty());
        assert!(db.daily_activity(&window).unwrap().is_empty());

        let rollup = db.per_category_rollup(&window).unwrap();
        assert_eq!(rollup.len(), 3);
        assert!(rollup
            .iter()
            .all(|r| r.listings == 0 && r.views == 0 && r.contact_rate == 0.0));

        let overview = db.overview(&window).unwrap();
        assert_eq!(overview.views, 0);
        assert_eq!(overview.contact_rate, 0.0);
        assert_eq!(overview.share_rate, 0.0);
    }

    #[test]
    fn counts_respect_window_bounds() {
        let (db, _dir) = test_db();
        let id = db
            .create_listing(&published("Villa A", Category::RealEstate, 1.0))
            .unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap();

        for at in [
            start,
            end,
            start - Duration::seconds(1),
            end + Duration::seconds(1),
        ] {
            db.record_event(&NewEvent::new(id, EventKind::View).at(at))
                .unwrap();
        }

        let window = TimeWindow::new(start, end);
        assert_eq!(db.count_events(EventKind::View, &window).unwrap(), 2);
        assert_eq!(db.count_events(EventKind::Share, &window).unwrap(), 0);
    }

    #[test]
    fn top_listings_include_zero_event_listings() {
        let (db, _dir) = test_db();
        let quiet = db
            .create_listing(&published("Quiet", Category::Computing, 1.0))
            .unwrap();
        let busy = db
            .create_listing(&published("Busy", Category::Computing, 1.0))
            .unwrap();
        let draft = db
            .create_listing(&sample("Draft", Category::Computing, 1.0))
            .unwrap();

        record(&db, busy, EventKind::View, 4);
        record(&db, busy, EventKind::ContactClick, 1);
        record(&db, draft, EventKind::View, 10);

        let old = Utc::now() - Duration::days(90);
        db.record_event(&NewEvent::new(quiet, EventKind::View).at(old))
            .unwrap();

        let top = db
            .top_listings_by_views(&TimeWindow::last_days(30).unwrap(), 10)
            .unwrap();
        let ids: Vec<i64> = top.iter().map(|p| p.listing_id).collect();
        assert_eq!(ids, vec![busy, quiet]);

        assert_eq!(top[0].views, 4);
        assert_eq!(top[0].contact_clicks, 1);
        assert_eq!(top[0].contact_rate, 25.0);
        assert_eq!(top[1].views, 0);
        assert_eq!(top[1].contact_rate, 0.0);

        let limited = db
            .top_listings_by_views(&TimeWindow::last_days(30).unwrap(), 1)
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn export_is_unlimited() {
        let (db, _dir) = test_db();
        for i in 0..12 {
            db.create_listing(&published(&format!("Item {i}"), Category::Vehicle, 1.0))
                .unwrap();
        }
        let window = TimeWindow::last_days(7).unwrap();
        assert_eq!(db.export_listing_performance(&window).unwrap().len(), 12);
        assert_eq!(db.top_listings_by_views(&window, 10).unwrap().len(), 10);
    }

    #[test]
    fn category_rollup_averages_and_rates() {
        let (db, _dir) = test_db();
        let a = db
            .create_listing(&published("A", Category::RealEstate, 1.0))
            .unwrap();
        let b = db
            .create_listing(&published("B", Category::RealEstate, 1.0))
            .unwrap();
        let car = db
            .create_listing(&published("Car", Category::Vehicle, 1.0))
            .unwrap();

        record(&db, a, EventKind::View, 2);
        record(&db, b, EventKind::View, 1);
        record(&db, a, EventKind::ContactClick, 1);
        record(&db, car, EventKind::ContactClick, 2);

        let rollup = db.per_category_rollup(&TimeWindow::last_days(30).unwrap()).unwrap();
        let categories: Vec<Category> = rollup.iter().map(|r| r.category).collect();
        assert_eq!(categories, Category::ALL.to_vec());

        let real_estate = &rollup[0];
        assert_eq!(real_estate.listings, 2);
        assert_eq!(real_estate.views, 3);
        assert_eq!(real_estate.contact_clicks, 1);
        assert_eq!(real_estate.views_per_listing, 1.5);
        assert_eq!(real_estate.clicks_per_listing, 0.5);
        assert_eq!(real_estate.contact_rate, 33.3);

        // Clicks without views never divide by zero.
        let vehicle = &rollup[1];
        assert_eq!(vehicle.contact_clicks, 2);
        assert_eq!(vehicle.contact_rate, 0.0);

        assert_eq!(rollup[2].listings, 0);
    }

    #[test]
    fn sources_sorted_and_filtered() {
        let (db, _dir) = test_db();
        let id = db
            .create_listing(&published("Villa A", Category::RealEstate, 1.0))
            .unwrap();

        for source in ["whatsapp", "whatsapp", "facebook"] {
            db.record_event(&NewEvent::new(id, EventKind::Share).with_source(source))
                .unwrap();
        }
        for source in ["facebook", "facebook"] {
            db.record_event(&NewEvent::new(id, EventKind::View).with_source(source))
                .unwrap();
        }
        db.record_event(&NewEvent::new(id, EventKind::View)).unwrap();

        let window = TimeWindow::last_days(1).unwrap();
        let all = db.per_source_breakdown(None, &window).unwrap();
        assert_eq!(
            all,
            vec![
                SourceCount { source: "facebook".into(), count: 3 },
                SourceCount { source: "whatsapp".into(), count: 2 },
            ]
        );

        let shares = db
            .per_source_breakdown(Some(EventKind::Share), &window)
            .unwrap();
        assert_eq!(shares[0], SourceCount { source: "whatsapp".into(), count: 2 });
        assert_eq!(shares[1], SourceCount { source: "facebook".into(), count: 1 });
    }

    #[test]
    fn daily_activity_groups_by_day_and_kind() {
        let (db, _dir) = test_db();
        let id = db
            .create_listing(&published("Villa A", Category::RealEstate, 1.0))
            .unwrap();
        let day1 = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 5, 2, 23, 30, 0).unwrap();

        for (at, kind) in [
            (day1, EventKind::View),
            (day1, EventKind::View),
            (day1, EventKind::Share),
            (day2, EventKind::View),
        ] {
            db.record_event(&NewEvent::new(id, kind).at(at)).unwrap();
        }

        let window = TimeWindow::new(day1 - Duration::days(1), day2 + Duration::hours(1));
        let activity = db.daily_activity(&window).unwrap();
        let d1 = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        assert_eq!(
            activity,
            vec![
                DailyActivity { day: d1, kind: EventKind::Share, count: 1 },
                DailyActivity { day: d1, kind: EventKind::View, count: 2 },
                DailyActivity { day: d2, kind: EventKind::View, count: 1 },
            ]
        );
    }

    #[test]
    fn overview_rates() {
        let (db, _dir) = test_db();
        let id = db
            .create_listing(&published("Villa A", Category::RealEstate, 1.0))
            .unwrap();
        db.create_listing(&sample("Draft", Category::RealEstate, 1.0))
            .unwrap();

        record(&db, id, EventKind::View, 8);
        record(&db, id, EventKind::ContactClick, 2);
        record(&db, id, EventKind::Share, 1);

        let overview = db.overview(&TimeWindow::last_days(30).unwrap()).unwrap();
        assert_eq!(overview.views, 8);
        assert_eq!(overview.active_listings, 1);
        assert_eq!(overview.contact_rate, 25.0);
        assert_eq!(overview.share_rate, 12.5);
    }

    /// Villa A and Car B, end to end.
    #[test]
    fn villa_and_car_scenario() {
        let (db, _dir) = test_db();
        let villa = db
            .create_listing(&published("Villa A", Category::RealEstate, 85_000_000.0))
            .unwrap();
        let mut car = published("Car B", Category::Vehicle, 12_500_000.0);
        car.city = "Port-Gentil".into();
        let car = db.create_listing(&car).unwrap();
        assert_eq!(db.get_listing(car).unwrap().city, "Port-Gentil");

        let by_category = annonces_shared::ListingCriteria::new().with_category(Category::RealEstate);
        let page = db.query_listings(&by_category, 9, 0).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "Villa A");

        // 85M clears a 13M floor, 12.5M does not.
        let by_floor =
            annonces_shared::ListingCriteria::new().with_price_range(Some(13_000_000.0), None);
        let page = db.query_listings(&by_floor, 9, 0).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, villa);

        record(&db, villa, EventKind::View, 3);
        db.record_event(&NewEvent::new(villa, EventKind::ContactClick).with_source("whatsapp"))
            .unwrap();

        let stored = db.get_listing(villa).unwrap();
        assert_eq!(stored.contact_clicks, 1);
        assert_eq!(stored.views, 0);

        let window = TimeWindow::last_days(1).unwrap();
        let rollup = db.per_category_rollup(&window).unwrap();
        assert_eq!(rollup[0].category, Category::RealEstate);
        assert_eq!(rollup[0].views, 3);
        assert_eq!(rollup[0].contact_clicks, 1);
        assert_eq!(rollup[0].contact_rate, 33.3);

        assert_eq!(db.events_for_listing(villa).unwrap().len(), 4);
        assert!(db.delete_listing(villa).unwrap());
        assert!(db.events_for_listing(villa).unwrap().is_empty());
        assert_eq!(db.count_events(EventKind::View, &window).unwrap(), 0);
        assert_eq!(db.count_events(EventKind::ContactClick, &window).unwrap(), 0);
    }
}
