//! CRUD operations for [`Subscription`] records (server membership).

use rusqlite::params;
use uuid::Uuid;

use parley_shared::models::Subscription;

use crate::database::Database;
use crate::error::{not_found, Result};
use crate::row::{time_at, uuid_at};

const COLUMNS: &str = "id, server_id, user_id, created_at";

impl Database {
    pub fn create_sub(&self, sub: &Subscription) -> Result<()> {
        self.conn().execute(
            "INSERT INTO subscriptions (id, server_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                sub.id.to_string(),
                sub.server_id.to_string(),
                sub.user_id.to_string(),
                sub.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_sub(&self, id: Uuid) -> Result<Subscription> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM subscriptions WHERE id = ?1"),
                params![id.to_string()],
                row_to_sub,
            )
            .map_err(not_found)
    }

    pub fn get_sub_by_server_and_user(&self, server_id: Uuid, user_id: Uuid) -> Result<Subscription> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM subscriptions WHERE server_id = ?1 AND user_id = ?2"),
                params![server_id.to_string(), user_id.to_string()],
                row_to_sub,
            )
            .map_err(not_found)
    }

    pub fn list_server_subs(&self, server_id: Uuid) -> Result<Vec<Subscription>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE server_id = ?1 ORDER BY created_at ASC"
        ))?;
        let rows = stmt.query_map(params![server_id.to_string()], row_to_sub)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn list_user_subs(&self, user_id: Uuid) -> Result<Vec<Subscription>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE user_id = ?1 ORDER BY created_at ASC"
        ))?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_sub)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ON DELETE CASCADE: role assignments of this membership go with it
    pub fn delete_sub(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM subscriptions WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_sub(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: uuid_at(row, 0)?,
        server_id: uuid_at(row, 1)?,
        user_id: uuid_at(row, 2)?,
        created_at: time_at(row, 3)?,
    })
}
