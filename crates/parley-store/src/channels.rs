//! CRUD operations for [`Channel`] and [`ChannelRole`] records.

use rusqlite::params;
use uuid::Uuid;

use parley_shared::models::{Channel, ChannelRole};
use parley_shared::types::validate_name;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::row::{time_at, uuid_at};

const CHANNEL_COLUMNS: &str = "id, server_id, name, is_private, created_at";
const CHANNEL_ROLE_COLUMNS: &str = "id, server_id, channel_id, role_id";

impl Database {
    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    pub fn create_channel(&self, channel: &Channel) -> Result<()> {
        validate_name(&channel.name)?;
        self.conn().execute(
            "INSERT INTO channels (id, server_id, name, is_private, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                channel.id.to_string(),
                channel.server_id.to_string(),
                channel.name,
                channel.is_private,
                channel.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_channel(&self, id: Uuid) -> Result<Channel> {
        self.conn()
            .query_row(
                &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?1"),
                params![id.to_string()],
                row_to_channel,
            )
            .map_err(not_found)
    }

    /// List channels belonging to a specific server, ordered by name.
    pub fn list_channels_for_server(&self, server_id: Uuid) -> Result<Vec<Channel>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE server_id = ?1 ORDER BY name ASC"
        ))?;
        let rows = stmt.query_map(params![server_id.to_string()], row_to_channel)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Delete a channel by UUID.  Returns `true` if a row was deleted.
    pub fn delete_channel(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM channels WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Channel role overrides
    // ------------------------------------------------------------------

    /// Insert an override. The role must belong to the channel's server.
    pub fn create_channel_role(&self, entry: &ChannelRole) -> Result<()> {
        let role = self.get_role(entry.role_id)?;
        let channel = self.get_channel(entry.channel_id)?;
        if role.server_id != entry.server_id || channel.server_id != entry.server_id {
            return Err(StoreError::InvariantViolation(
                "channel, role and override must share one server",
            ));
        }

        self.conn().execute(
            "INSERT INTO channel_roles (id, server_id, channel_id, role_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id.to_string(),
                entry.server_id.to_string(),
                entry.channel_id.to_string(),
                entry.role_id.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn get_channel_role(&self, id: Uuid) -> Result<ChannelRole> {
        self.conn()
            .query_row(
                &format!("SELECT {CHANNEL_ROLE_COLUMNS} FROM channel_roles WHERE id = ?1"),
                params![id.to_string()],
                row_to_channel_role,
            )
            .map_err(not_found)
    }

    pub fn list_channel_roles(&self, channel_id: Uuid) -> Result<Vec<ChannelRole>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CHANNEL_ROLE_COLUMNS} FROM channel_roles WHERE channel_id = ?1"
        ))?;
        let rows = stmt.query_map(params![channel_id.to_string()], row_to_channel_role)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn delete_channel_role(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM channel_roles WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: uuid_at(row, 0)?,
        server_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        is_private: row.get(3)?,
        created_at: time_at(row, 4)?,
    })
}

fn row_to_channel_role(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelRole> {
    Ok(ChannelRole {
        id: uuid_at(row, 0)?,
        server_id: uuid_at(row, 1)?,
        channel_id: uuid_at(row, 2)?,
        role_id: uuid_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use parley_shared::models::{Role, Server, User};
    use parley_shared::permissions::PermissionMask;

    use super::*;

    fn server(db: &Database, name: &str) -> Server {
        let owner = User::new(format!("{name}-owner"));
        db.create_user(&owner).unwrap();
        let server = Server::new(owner.id, name);
        db.create_server(&server).unwrap();
        server
    }

    #[test]
    fn channels_are_listed_by_name() {
        let db = Database::open_in_memory().unwrap();
        let s = server(&db, "guild");
        db.create_channel(&Channel::new(s.id, "random", false)).unwrap();
        db.create_channel(&Channel::new(s.id, "general", true)).unwrap();

        let names: Vec<_> = db
            .list_channels_for_server(s.id)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["general", "random"]);
    }

    #[test]
    fn override_round_trip_and_cascade() {
        let db = Database::open_in_memory().unwrap();
        let s = server(&db, "guild");
        let channel = Channel::new(s.id, "staff", true);
        db.create_channel(&channel).unwrap();
        let role = Role::new(s.id, "staff", PermissionMask::empty());
        db.create_role(&role).unwrap();

        let entry = ChannelRole::new(&channel, role.id);
        db.create_channel_role(&entry).unwrap();
        assert_eq!(db.get_channel_role(entry.id).unwrap(), entry);
        assert_eq!(db.list_channel_roles(channel.id).unwrap(), vec![entry.clone()]);

        assert!(db.delete_channel(channel.id).unwrap());
        assert!(matches!(db.get_channel_role(entry.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn override_with_foreign_role_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let home = server(&db, "home");
        let away = server(&db, "away");
        let channel = Channel::new(home.id, "staff", true);
        db.create_channel(&channel).unwrap();
        let role = Role::new(away.id, "staff", PermissionMask::empty());
        db.create_role(&role).unwrap();

        let err = db
            .create_channel_role(&ChannelRole::new(&channel, role.id))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
    }
}
