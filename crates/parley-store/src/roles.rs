//! CRUD operations for [`Role`] and [`RoleAssignment`] records.

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use parley_shared::models::{Role, RoleAssignment};
use parley_shared::types::validate_name;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::row::uuid_at;

const ROLE_COLUMNS: &str = "id, server_id, name, server_mask, channel_mask, sub_mask";
const ROLE_SUB_COLUMNS: &str = "id, server_id, user_id, subscription_id, role_id";

impl Database {
    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    /// Insert a role. Masks are stored as given, unknown bits included.
    pub fn create_role(&self, role: &Role) -> Result<()> {
        validate_name(&role.name)?;
        self.conn().execute(
            "INSERT INTO roles (id, server_id, name, server_mask, channel_mask, sub_mask)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                role.id.to_string(),
                role.server_id.to_string(),
                role.name,
                role.server_mask,
                role.channel_mask,
                role.sub_mask,
            ],
        )?;
        Ok(())
    }

    pub fn get_role(&self, id: Uuid) -> Result<Role> {
        self.conn()
            .query_row(
                &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?1"),
                params![id.to_string()],
                row_to_role,
            )
            .map_err(not_found)
    }

    pub fn list_server_roles(&self, server_id: Uuid) -> Result<Vec<Role>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE server_id = ?1 ORDER BY name ASC"
        ))?;
        let rows = stmt.query_map(params![server_id.to_string()], row_to_role)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Every role assigned to the user on the server.
    pub fn get_user_roles_on_server(&self, server_id: Uuid, user_id: Uuid) -> Result<Vec<Role>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.id, r.server_id, r.name, r.server_mask, r.channel_mask, r.sub_mask
             FROM roles r
             JOIN role_subs a ON a.role_id = r.id
             WHERE a.server_id = ?1 AND a.user_id = ?2",
        )?;
        let rows = stmt.query_map(
            params![server_id.to_string(), user_id.to_string()],
            row_to_role,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ON DELETE CASCADE: assignments and channel overrides go with it
    pub fn delete_role(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM roles WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Role assignments
    // ------------------------------------------------------------------

    /// Insert a role assignment.
    ///
    /// The subscription and the role must both live in the assignment's
    /// server, and the assignment's user must be the subscription's user.
    /// The engine relies on this and never re-checks it.
    pub fn create_role_sub(&self, assignment: &RoleAssignment) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;

        let sub: Option<(String, String)> = tx
            .query_row(
                "SELECT server_id, user_id FROM subscriptions WHERE id = ?1",
                params![assignment.subscription_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let role_server: Option<String> = tx
            .query_row(
                "SELECT server_id FROM roles WHERE id = ?1",
                params![assignment.role_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let server = assignment.server_id.to_string();
        let user = assignment.user_id.to_string();
        match (sub, role_server) {
            (Some((sub_server, sub_user)), Some(role_server))
                if sub_server == server && role_server == server && sub_user == user => {}
            (None, _) | (_, None) => return Err(StoreError::NotFound),
            _ => {
                tracing::warn!(
                    assignment_id = %assignment.id,
                    server_id = %assignment.server_id,
                    "rejected cross-server role assignment"
                );
                return Err(StoreError::InvariantViolation(
                    "subscription, role and assignment must share one server",
                ));
            }
        }

        tx.execute(
            "INSERT INTO role_subs (id, server_id, user_id, subscription_id, role_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                assignment.id.to_string(),
                server,
                user,
                assignment.subscription_id.to_string(),
                assignment.role_id.to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_role_sub(&self, id: Uuid) -> Result<RoleAssignment> {
        self.conn()
            .query_row(
                &format!("SELECT {ROLE_SUB_COLUMNS} FROM role_subs WHERE id = ?1"),
                params![id.to_string()],
                row_to_role_sub,
            )
            .map_err(not_found)
    }

    pub fn list_role_subs(&self, server_id: Uuid) -> Result<Vec<RoleAssignment>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ROLE_SUB_COLUMNS} FROM role_subs WHERE server_id = ?1"
        ))?;
        let rows = stmt.query_map(params![server_id.to_string()], row_to_role_sub)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn delete_role_sub(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM role_subs WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_role(row: &rusqlite::Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: uuid_at(row, 0)?,
        server_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        server_mask: row.get(3)?,
        channel_mask: row.get(4)?,
        sub_mask: row.get(5)?,
    })
}

fn row_to_role_sub(row: &rusqlite::Row<'_>) -> rusqlite::Result<RoleAssignment> {
    Ok(RoleAssignment {
        id: uuid_at(row, 0)?,
        server_id: uuid_at(row, 1)?,
        user_id: uuid_at(row, 2)?,
        subscription_id: uuid_at(row, 3)?,
        role_id: uuid_at(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use parley_shared::models::{Server, Subscription, User};
    use parley_shared::permissions::{PermissionMask, ServerFlags, SubFlags};

    use super::*;

    struct Fixture {
        db: Database,
        server: Server,
        member: User,
        sub: Subscription,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let owner = User::new("owner");
        let member = User::new("member");
        db.create_user(&owner).unwrap();
        db.create_user(&member).unwrap();
        let server = Server::new(owner.id, "guild");
        db.create_server(&server).unwrap();
        let sub = Subscription::new(server.id, member.id);
        db.create_sub(&sub).unwrap();
        Fixture {
            db,
            server,
            member,
            sub,
        }
    }

    #[test]
    fn unknown_mask_bits_are_kept() {
        let f = fixture();
        let mut role = Role::new(f.server.id, "odd", PermissionMask::empty());
        role.server_mask = 0x1 | 0x100;
        f.db.create_role(&role).unwrap();

        let stored = f.db.get_role(role.id).unwrap();
        assert_eq!(stored.server_mask, 0x101);
        assert_eq!(stored.mask().server, ServerFlags::MANAGE_CHANNELS);
    }

    #[test]
    fn assigned_roles_are_listed_for_the_user() {
        let f = fixture();
        let mods = Role::new(
            f.server.id,
            "mods",
            PermissionMask {
                sub: SubFlags::MANAGE_SUBS,
                ..PermissionMask::empty()
            },
        );
        let idle = Role::new(f.server.id, "idle", PermissionMask::empty());
        f.db.create_role(&mods).unwrap();
        f.db.create_role(&idle).unwrap();
        let assignment = RoleAssignment::new(&f.sub, mods.id);
        f.db.create_role_sub(&assignment).unwrap();

        let roles = f.db.get_user_roles_on_server(f.server.id, f.member.id).unwrap();
        assert_eq!(roles, vec![mods]);
        assert_eq!(f.db.get_role_sub(assignment.id).unwrap(), assignment);
        assert_eq!(f.db.list_role_subs(f.server.id).unwrap().len(), 1);
        assert_eq!(f.db.list_server_roles(f.server.id).unwrap().len(), 2);
    }

    #[test]
    fn cross_server_assignment_is_rejected() {
        let f = fixture();
        let other_owner = User::new("other");
        f.db.create_user(&other_owner).unwrap();
        let other = Server::new(other_owner.id, "other");
        f.db.create_server(&other).unwrap();
        let foreign = Role::new(other.id, "foreign", PermissionMask::empty());
        f.db.create_role(&foreign).unwrap();

        let err = f.db
            .create_role_sub(&RoleAssignment::new(&f.sub, foreign.id))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
        assert!(f.db.list_role_subs(f.server.id).unwrap().is_empty());
    }

    #[test]
    fn assignment_to_missing_role_is_not_found() {
        let f = fixture();
        let err = f.db
            .create_role_sub(&RoleAssignment::new(&f.sub, Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn deleting_role_drops_assignments() {
        let f = fixture();
        let role = Role::new(f.server.id, "mods", PermissionMask::empty());
        f.db.create_role(&role).unwrap();
        let assignment = RoleAssignment::new(&f.sub, role.id);
        f.db.create_role_sub(&assignment).unwrap();

        assert!(f.db.delete_role(role.id).unwrap());
        assert!(matches!(f.db.get_role_sub(assignment.id), Err(StoreError::NotFound)));
    }
}
