use uuid::Uuid;

use parley_shared::models::ChannelRole;
use parley_shared::permissions::ServerFlags;
use parley_shared::types::ObjectClass;

use crate::action::{Operation, SubAction};
use crate::policy::{PolicyEntry, Predicate, Rule, ScopeUse, TargetUse};
use crate::storage::Storage;

use super::{ClassPolicy, StorageFuture};

const MEMBERS: &[Predicate] = &[Predicate::Member];
const MANAGERS: &[Predicate] = &[
    Predicate::BaseCheck,
    Predicate::ServerFlag(ServerFlags::MANAGE_CHANNELS),
];

/// Channel role overrides restrict a channel to the holders of a role.
pub struct ChannelRolePolicy;

impl ClassPolicy for ChannelRolePolicy {
    type Object = ChannelRole;

    const CLASS: ObjectClass = ObjectClass::ChannelRole;

    fn entry(op: Operation) -> Option<PolicyEntry> {
        let (target, scope, rule) = match op {
            Operation::Read(None | Some(SubAction::List | SubAction::GetById)) => {
                (TargetUse::Optional, ScopeUse::Required, Rule::any_of(MEMBERS))
            }
            Operation::Create => (TargetUse::Ignored, ScopeUse::Required, Rule::any_of(MANAGERS)),
            Operation::Delete => (TargetUse::Required, ScopeUse::IfPresent, Rule::any_of(MANAGERS)),
            Operation::Read(_) | Operation::Write(_) => return None,
        };
        Some(PolicyEntry {
            target,
            scope,
            rule,
        })
    }

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, ChannelRole> {
        storage.get_channel_role_by_id(id)
    }

    fn target_channel(override_: &ChannelRole) -> Option<Uuid> {
        Some(override_.channel_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::authorizers::test_support::*;
    use crate::authorizers::Authorizer;
    use crate::context::AuthScope;
    use crate::error::ErrorKind;
    use crate::testing::MemoryStorage;

    use super::*;

    #[tokio::test]
    async fn members_read_overrides() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let channel = store.add_channel(server.id, "staff", true);
        let role = store.add_role(server.id, "staff", 0, 0, 0);
        let entry = store.add_channel_role(&channel, &role);
        let member = Uuid::new_v4();
        store.add_sub(server.id, member);
        let authz = authorizer::<ChannelRolePolicy>(&store);
        let scope = AuthScope::Channel {
            channel_id: channel.id,
        };

        authz
            .authorize(&ctx(member, scope), None, "read", Some("list"))
            .await
            .unwrap();
        authz
            .authorize(
                &ctx(member, scope),
                Some(&entry.id.to_string()),
                "read",
                Some("get-by-id"),
            )
            .await
            .unwrap();

        let err = authz
            .authorize(&ctx(Uuid::new_v4(), scope), None, "read", Some("list"))
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn members_cannot_borrow_other_classes_sub_actions() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let member = Uuid::new_v4();
        store.add_sub(server.id, member);
        let authz = authorizer::<ChannelRolePolicy>(&store);
        let scope = server_scope(server.id);

        for sub in ["list-server-user-permissions", "list-server-subs", "list-role-assignments"] {
            let err = authz
                .authorize(&ctx(member, scope), None, "read", Some(sub))
                .await
                .unwrap_err();
            assert!(err.is_denied(), "read/{sub}");
        }
        authz.authorize(&ctx(member, scope), None, "read", None).await.unwrap();
    }

    #[tokio::test]
    async fn write_grant_or_manage_channels_creates() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let writer = Uuid::new_v4();
        store.add_grant(server.id, writer, false, true, false);
        let operator = Uuid::new_v4();
        let sub = store.add_sub(server.id, operator);
        let role = store.add_role(server.id, "ops", ServerFlags::MANAGE_CHANNELS.bits(), 0, 0);
        store.assign_role(&sub, &role);
        let authz = authorizer::<ChannelRolePolicy>(&store);
        let scope = server_scope(server.id);

        authz.authorize(&ctx(writer, scope), None, "create", None).await.unwrap();
        authz.authorize(&ctx(operator, scope), None, "create", None).await.unwrap();

        let err = authz
            .authorize(&ctx(Uuid::new_v4(), scope), None, "create", None)
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn delete_under_wrong_channel_is_not_found() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let server = store.add_server(owner, "guild");
        let staff = store.add_channel(server.id, "staff", true);
        let general = store.add_channel(server.id, "general", false);
        let role = store.add_role(server.id, "staff", 0, 0, 0);
        let entry = store.add_channel_role(&staff, &role);
        let authz = authorizer::<ChannelRolePolicy>(&store);
        let id = entry.id.to_string();

        let err = authz
            .authorize(
                &ctx(owner, AuthScope::Channel { channel_id: general.id }),
                Some(&id),
                "delete",
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        authz
            .authorize(
                &ctx(owner, AuthScope::Channel { channel_id: staff.id }),
                Some(&id),
                "delete",
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_override_is_not_found() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let server = store.add_server(owner, "guild");
        let authz = authorizer::<ChannelRolePolicy>(&store);

        let err = authz
            .authorize(
                &ctx(owner, server_scope(server.id)),
                Some(&Uuid::new_v4().to_string()),
                "delete",
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }
}
