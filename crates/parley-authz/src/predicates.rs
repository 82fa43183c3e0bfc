//! Leaf predicates shared by every authorizer.
//!
//! Each predicate is a straight line of guarded storage calls. A missing
//! supporting row is a negative answer; any other storage failure is
//! reported as internal from the predicate that observed it.

use tracing::trace;
use uuid::Uuid;

use parley_shared::models::Server;
use parley_shared::permissions::PermissionMask;

use crate::action::ActionFamily;
use crate::error::{AuthzError, Result};
use crate::session::Session;
use crate::storage::StorageError;

impl<'a> Session<'a> {
    /// Load a server that the decision depends on. A missing server is
    /// not-found: the decision refers to something that does not exist.
    pub async fn load_server(&self, server_id: Uuid) -> Result<Server> {
        match self.guard(self.storage().get_server_by_id(server_id)).await? {
            Ok(server) => Ok(server),
            Err(StorageError::NotFound) => Err(AuthzError::not_found("predicates.load_server")),
            Err(e) => Err(AuthzError::internal("predicates.load_server", e)),
        }
    }

    pub async fn user_is_server_owner(&self, server_id: Uuid, user_id: Uuid) -> Result<bool> {
        let server = self.load_server(server_id).await?;
        Ok(server.owner_id == user_id)
    }

    pub async fn user_has_server_sub(&self, server_id: Uuid, user_id: Uuid) -> Result<bool> {
        match self
            .guard(self.storage().get_sub_by_server_and_user(server_id, user_id))
            .await?
        {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound) => Ok(false),
            Err(e) => Err(AuthzError::internal("predicates.user_has_server_sub", e)),
        }
    }

    /// OR of the masks of every role the user holds on the server.
    pub async fn user_permission_mask(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> Result<PermissionMask> {
        let roles = match self
            .guard(self.storage().get_user_roles_on_server(server_id, user_id))
            .await?
        {
            Ok(roles) => roles,
            Err(StorageError::NotFound) => Vec::new(),
            Err(e) => return Err(AuthzError::internal("predicates.user_permission_mask", e)),
        };

        let mask: PermissionMask = roles.iter().map(|role| role.mask()).collect();
        trace!(%server_id, %user_id, roles = roles.len(), ?mask, "aggregated role mask");
        Ok(mask)
    }

    /// Owner, or an explicit grant whose flag matches the action family.
    pub async fn base_permission_check(
        &self,
        server_id: Uuid,
        user_id: Uuid,
        family: ActionFamily,
    ) -> Result<bool> {
        if self.user_is_server_owner(server_id, user_id).await? {
            return Ok(true);
        }

        let grant = match self
            .guard(self.storage().get_explicit_grant(server_id, user_id))
            .await?
        {
            Ok(grant) => grant,
            Err(StorageError::NotFound) => return Ok(false),
            Err(e) => return Err(AuthzError::internal("predicates.base_permission_check", e)),
        };

        Ok(match family {
            ActionFamily::Read => grant.read_all,
            ActionFamily::Write => grant.write_all,
            ActionFamily::Delete => grant.delete_all,
        })
    }
}
