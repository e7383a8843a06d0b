use rusqlite::Connection;

const UP_SQL: &str = r#"
-- Visitor accounts created through registration
CREATE TABLE IF NOT EXISTS public_users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,           -- trimmed, lowercase
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- Back-office accounts (admin / analyst)
CREATE TABLE IF NOT EXISTS staff_users (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    email      TEXT NOT NULL UNIQUE,
    name       TEXT NOT NULL,
    role       TEXT NOT NULL CHECK (role IN ('admin', 'analyst')),
    active     INTEGER NOT NULL DEFAULT 1,        -- boolean 0/1
    created_at TEXT NOT NULL,
    last_login TEXT
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
