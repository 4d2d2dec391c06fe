//! v001 -- Initial schema creation.
//!
//! Creates `accounts` (authentication) and `nodes` (the realtime JSON tree,
//! one row per leaf value).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Accounts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    uid           TEXT PRIMARY KEY NOT NULL,  -- opaque identity id
    email         TEXT NOT NULL UNIQUE,       -- lower-cased
    password_hash TEXT NOT NULL,              -- Argon2id PHC string
    created_at    TEXT NOT NULL               -- RFC-3339
);

-- ----------------------------------------------------------------
-- Nodes: flattened JSON leaves
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS nodes (
    path  TEXT PRIMARY KEY NOT NULL,          -- '/'-joined segments
    value TEXT NOT NULL                       -- JSON scalar
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
