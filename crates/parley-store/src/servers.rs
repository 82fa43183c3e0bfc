//! CRUD operations for [`Server`] records.

use rusqlite::params;
use uuid::Uuid;

use parley_shared::models::{Server, Subscription};
use parley_shared::types::validate_name;

use crate::database::Database;
use crate::error::{not_found, Result};
use crate::row::{time_at, uuid_at};

impl Database {
    /// Insert a server together with its owner's subscription.
    ///
    /// Both rows are written in one transaction, so a server never exists
    /// without its owner as a member. Returns the owner's subscription.
    pub fn create_server(&self, server: &Server) -> Result<Subscription> {
        validate_name(&server.name)?;
        let owner_sub = Subscription::new(server.id, server.owner_id);

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO servers (id, name, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                server.id.to_string(),
                server.name,
                server.owner_id.to_string(),
                server.created_at.to_rfc3339(),
            ],
        )?;
        tx.execute(
            "INSERT INTO subscriptions (id, server_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                owner_sub.id.to_string(),
                owner_sub.server_id.to_string(),
                owner_sub.user_id.to_string(),
                owner_sub.created_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        tracing::debug!(server_id = %server.id, owner_id = %server.owner_id, "server created");
        Ok(owner_sub)
    }

    pub fn get_server(&self, id: Uuid) -> Result<Server> {
        self.conn()
            .query_row(
                "SELECT id, name, owner_id, created_at FROM servers WHERE id = ?1",
                params![id.to_string()],
                row_to_server,
            )
            .map_err(not_found)
    }

    /// Servers the user is subscribed to, ordered by name.
    pub fn list_servers_for_user(&self, user_id: Uuid) -> Result<Vec<Server>> {
        let mut stmt = self.conn().prepare(
            "SELECT s.id, s.name, s.owner_id, s.created_at
             FROM servers s
             JOIN subscriptions m ON m.server_id = s.id
             WHERE m.user_id = ?1
             ORDER BY s.name ASC",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_server)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ON DELETE CASCADE: subs, roles, assignments, grants, channels and
    // overrides go with it
    pub fn delete_server(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM servers WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_server(row: &rusqlite::Row<'_>) -> rusqlite::Result<Server> {
    Ok(Server {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        owner_id: uuid_at(row, 2)?,
        created_at: time_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use parley_shared::models::{Channel, ExplicitGrant, Role, RoleAssignment, User};
    use parley_shared::permissions::PermissionMask;

    use crate::error::StoreError;

    use super::*;

    fn setup() -> (Database, User) {
        let db = Database::open_in_memory().unwrap();
        let owner = User::new("owner");
        db.create_user(&owner).unwrap();
        (db, owner)
    }

    #[test]
    fn create_subscribes_owner() {
        let (db, owner) = setup();
        let server = Server::new(owner.id, "guild");
        let sub = db.create_server(&server).unwrap();

        assert_eq!(db.get_server(server.id).unwrap(), server);
        assert_eq!(db.get_sub_by_server_and_user(server.id, owner.id).unwrap(), sub);
        assert_eq!(db.list_servers_for_user(owner.id).unwrap(), vec![server]);
    }

    #[test]
    fn blank_name_is_rejected() {
        let (db, owner) = setup();
        let err = db.create_server(&Server::new(owner.id, "  ")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[test]
    fn unknown_owner_writes_nothing() {
        let (db, _) = setup();
        let server = Server::new(Uuid::new_v4(), "ghost");
        assert!(db.create_server(&server).is_err());
        assert!(matches!(db.get_server(server.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn delete_cascades_to_everything_owned() {
        let (db, owner) = setup();
        let member = User::new("member");
        db.create_user(&member).unwrap();
        let server = Server::new(owner.id, "guild");
        db.create_server(&server).unwrap();

        let sub = Subscription::new(server.id, member.id);
        db.create_sub(&sub).unwrap();
        let role = Role::new(server.id, "mods", PermissionMask::empty());
        db.create_role(&role).unwrap();
        let assignment = RoleAssignment::new(&sub, role.id);
        db.create_role_sub(&assignment).unwrap();
        let grant = ExplicitGrant::new(server.id, member.id);
        db.create_explicit_grant(&grant).unwrap();
        let channel = Channel::new(server.id, "general", false);
        db.create_channel(&channel).unwrap();

        assert!(db.delete_server(server.id).unwrap());

        assert!(matches!(db.get_sub(sub.id), Err(StoreError::NotFound)));
        assert!(matches!(db.get_role(role.id), Err(StoreError::NotFound)));
        assert!(matches!(db.get_role_sub(assignment.id), Err(StoreError::NotFound)));
        assert!(matches!(db.get_explicit_grant_by_id(grant.id), Err(StoreError::NotFound)));
        assert!(matches!(db.get_channel(channel.id), Err(StoreError::NotFound)));
        assert!(!db.delete_server(server.id).unwrap());
    }
}
