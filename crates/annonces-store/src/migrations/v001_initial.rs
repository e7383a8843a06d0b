//! v001 -- Initial schema creation.
//!
//! Creates the catalog tables: `listings`, `engagement_events` and
//! `settings`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Listings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS listings (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT NOT NULL,
    description      TEXT NOT NULL,
    category         TEXT NOT NULL CHECK (category IN ('real_estate', 'vehicle', 'computing')),
    listing_type     TEXT NOT NULL CHECK (listing_type IN ('sale', 'rental')),
    price            REAL NOT NULL CHECK (price >= 0),
    currency         TEXT NOT NULL DEFAULT 'FCFA',
    location_text    TEXT,
    city             TEXT NOT NULL,
    neighborhood     TEXT,
    contact_name     TEXT NOT NULL,
    contact_phone    TEXT NOT NULL,
    contact_email    TEXT,
    contact_whatsapp TEXT,
    status           TEXT NOT NULL DEFAULT 'draft'
                     CHECK (status IN ('draft', 'published', 'expired', 'archived')),
    created_at       TEXT NOT NULL,               -- RFC-3339, UTC, microseconds
    modified_at      TEXT NOT NULL,
    expires_at       TEXT,
    views            INTEGER NOT NULL DEFAULT 0,
    contact_clicks   INTEGER NOT NULL DEFAULT 0,
    shares           INTEGER NOT NULL DEFAULT 0,
    category_payload TEXT,                        -- JSON object
    photos           TEXT,                        -- JSON array of references
    videos           TEXT                         -- JSON array of references
);

CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category);
CREATE INDEX IF NOT EXISTS idx_listings_status   ON listings(status);
CREATE INDEX IF NOT EXISTS idx_listings_city     ON listings(city);
CREATE INDEX IF NOT EXISTS idx_listings_price    ON listings(price);
CREATE INDEX IF NOT EXISTS idx_listings_created  ON listings(created_at DESC, id DESC);

-- ----------------------------------------------------------------
-- Engagement events (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS engagement_events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    listing_id  INTEGER,                          -- nullable FK -> listings(id)
    kind        TEXT NOT NULL CHECK (kind IN ('view', 'contact_click', 'share')),
    source      TEXT,
    ip          TEXT,
    user_agent  TEXT,
    occurred_at TEXT NOT NULL,
    extra       TEXT,                             -- JSON

    FOREIGN KEY (listing_id) REFERENCES listings(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_events_listing ON engagement_events(listing_id);
CREATE INDEX IF NOT EXISTS idx_events_kind_ts ON engagement_events(kind, occurred_at);

-- ----------------------------------------------------------------
-- Site settings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
