//! CRUD operations for [`ExplicitGrant`] records.

use rusqlite::params;
use uuid::Uuid;

use parley_shared::models::ExplicitGrant;

use crate::database::Database;
use crate::error::{not_found, Result};
use crate::row::uuid_at;

const COLUMNS: &str = "id, server_id, user_id, read_all, write_all, delete_all";

impl Database {
    /// Insert a grant, or replace the flags of the user's existing grant on
    /// the same server. The existing row keeps its id.
    pub fn create_explicit_grant(&self, grant: &ExplicitGrant) -> Result<()> {
        self.conn().execute(
            "INSERT INTO explicit_grants (id, server_id, user_id, read_all, write_all, delete_all)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (server_id, user_id) DO UPDATE SET
                 read_all   = excluded.read_all,
                 write_all  = excluded.write_all,
                 delete_all = excluded.delete_all",
            params![
                grant.id.to_string(),
                grant.server_id.to_string(),
                grant.user_id.to_string(),
                grant.read_all,
                grant.write_all,
                grant.delete_all,
            ],
        )?;
        Ok(())
    }

    pub fn get_explicit_grant(&self, server_id: Uuid, user_id: Uuid) -> Result<ExplicitGrant> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM explicit_grants WHERE server_id = ?1 AND user_id = ?2"),
                params![server_id.to_string(), user_id.to_string()],
                row_to_grant,
            )
            .map_err(not_found)
    }

    pub fn get_explicit_grant_by_id(&self, id: Uuid) -> Result<ExplicitGrant> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM explicit_grants WHERE id = ?1"),
                params![id.to_string()],
                row_to_grant,
            )
            .map_err(not_found)
    }

    pub fn list_server_grants(&self, server_id: Uuid) -> Result<Vec<ExplicitGrant>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {COLUMNS} FROM explicit_grants WHERE server_id = ?1"))?;
        let rows = stmt.query_map(params![server_id.to_string()], row_to_grant)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn delete_explicit_grant(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM explicit_grants WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExplicitGrant> {
    Ok(ExplicitGrant {
        id: uuid_at(row, 0)?,
        server_id: uuid_at(row, 1)?,
        user_id: uuid_at(row, 2)?,
        read_all: row.get(3)?,
        write_all: row.get(4)?,
        delete_all: row.get(5)?,
    })
}
