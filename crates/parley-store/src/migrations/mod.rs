//! Schema migrations, tracked by `PRAGMA user_version`.
//!
//! Steps run in order on every open; a step whose version is already
//! recorded is skipped, so each one applies exactly once.

pub mod v001_initial;
pub mod v002_indexes;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> std::result::Result<(), rusqlite::Error>;

/// `(version, name, step)` in application order.
const STEPS: &[(u32, &str, Step)] = &[
    (1, "v001_initial", v001_initial::up),
    (2, "v002_indexes", v002_indexes::up),
];

/// Version of the newest step.
pub const CURRENT_VERSION: u32 = 2;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    for &(version, name, step) in STEPS.iter().filter(|(v, _, _)| *v > current) {
        tracing::info!(version, migration = name, "applying migration");
        step(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
