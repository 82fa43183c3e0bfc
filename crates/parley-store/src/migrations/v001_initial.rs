//! v001 -- Initial schema creation.
//!
//! Every server-owned table references `servers(id)` with `ON DELETE
//! CASCADE`, so deleting a server removes its members, roles, assignments,
//! grants, channels and channel overrides in one statement.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    username   TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Servers (appservers)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS servers (
    id         TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    owner_id   TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Subscriptions (membership)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS subscriptions (
    id         TEXT PRIMARY KEY NOT NULL,
    server_id  TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    UNIQUE (server_id, user_id),
    FOREIGN KEY (server_id) REFERENCES servers(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id)   REFERENCES users(id)   ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Roles
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS roles (
    id           TEXT PRIMARY KEY NOT NULL,
    server_id    TEXT NOT NULL,
    name         TEXT NOT NULL,
    server_mask  INTEGER NOT NULL DEFAULT 0,
    channel_mask INTEGER NOT NULL DEFAULT 0,
    sub_mask     INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY (server_id) REFERENCES servers(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Role assignments (subscription <-> role)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS role_subs (
    id              TEXT PRIMARY KEY NOT NULL,
    server_id       TEXT NOT NULL,
    user_id         TEXT NOT NULL,
    subscription_id TEXT NOT NULL,
    role_id         TEXT NOT NULL,

    UNIQUE (subscription_id, role_id),
    FOREIGN KEY (server_id)       REFERENCES servers(id)       ON DELETE CASCADE,
    FOREIGN KEY (subscription_id) REFERENCES subscriptions(id) ON DELETE CASCADE,
    FOREIGN KEY (role_id)         REFERENCES roles(id)         ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Explicit grants
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS explicit_grants (
    id         TEXT PRIMARY KEY NOT NULL,
    server_id  TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    read_all   INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    write_all  INTEGER NOT NULL DEFAULT 0,
    delete_all INTEGER NOT NULL DEFAULT 0,

    UNIQUE (server_id, user_id),
    FOREIGN KEY (server_id) REFERENCES servers(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id)   REFERENCES users(id)   ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Channels
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channels (
    id         TEXT PRIMARY KEY NOT NULL,
    server_id  TEXT NOT NULL,
    name       TEXT NOT NULL,
    is_private INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,

    FOREIGN KEY (server_id) REFERENCES servers(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Channel role overrides
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channel_roles (
    id         TEXT PRIMARY KEY NOT NULL,
    server_id  TEXT NOT NULL,
    channel_id TEXT NOT NULL,
    role_id    TEXT NOT NULL,

    UNIQUE (channel_id, role_id),
    FOREIGN KEY (server_id)  REFERENCES servers(id)  ON DELETE CASCADE,
    FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE,
    FOREIGN KEY (role_id)    REFERENCES roles(id)    ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
