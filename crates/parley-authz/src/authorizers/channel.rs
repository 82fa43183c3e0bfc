use uuid::Uuid;

use parley_shared::models::Channel;
use parley_shared::permissions::ServerFlags;
use parley_shared::types::ObjectClass;

use crate::action::{Operation, SubAction};
use crate::policy::{PolicyEntry, Predicate, Rule, ScopeUse, TargetUse};
use crate::storage::Storage;

use super::{ClassPolicy, StorageFuture};

const MEMBERS: &[Predicate] = &[Predicate::Member];
const MANAGERS: &[Predicate] = &[
    Predicate::ServerOwner,
    Predicate::ServerFlag(ServerFlags::MANAGE_CHANNELS),
];

pub struct ChannelPolicy;

impl ClassPolicy for ChannelPolicy {
    type Object = Channel;

    const CLASS: ObjectClass = ObjectClass::Channel;

    fn entry(op: Operation) -> Option<PolicyEntry> {
        let (target, scope, rule) = match op {
            Operation::Read(Some(SubAction::ListChannels)) => {
                (TargetUse::Ignored, ScopeUse::Required, Rule::any_of(MEMBERS))
            }
            Operation::Read(Some(SubAction::GetById)) => {
                (TargetUse::Required, ScopeUse::Required, Rule::any_of(MEMBERS))
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

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, Channel> {
        storage.get_channel_by_id(id)
    }

    fn target_channel(channel: &Channel) -> Option<Uuid> {
        Some(channel.id)
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
    async fn members_list_and_get() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let channel = store.add_channel(server.id, "general", false);
        let member = Uuid::new_v4();
        store.add_sub(server.id, member);
        let authz = authorizer::<ChannelPolicy>(&store);
        let scope = server_scope(server.id);

        authz
            .authorize(&ctx(member, scope), None, "read", Some("list-channels"))
            .await
            .unwrap();
        authz
            .authorize(
                &ctx(member, scope),
                Some(&channel.id.to_string()),
                "read",
                Some("get-by-id"),
            )
            .await
            .unwrap();

        let err = authz
            .authorize(&ctx(Uuid::new_v4(), scope), None, "read", Some("list-channels"))
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn channel_scope_resolves_its_server() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let channel = store.add_channel(server.id, "general", false);
        let member = Uuid::new_v4();
        store.add_sub(server.id, member);
        let authz = authorizer::<ChannelPolicy>(&store);
        let scope = AuthScope::Channel {
            channel_id: channel.id,
        };

        authz
            .authorize(
                &ctx(member, scope),
                Some(&channel.id.to_string()),
                "read",
                Some("get-by-id"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_channel_under_channel_scope_is_not_found() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let server = store.add_server(owner, "guild");
        let general = store.add_channel(server.id, "general", false);
        let random = store.add_channel(server.id, "random", false);
        let authz = authorizer::<ChannelPolicy>(&store);
        let scope = AuthScope::Channel {
            channel_id: general.id,
        };

        let err = authz
            .authorize(&ctx(owner, scope), Some(&random.id.to_string()), "delete", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn manage_channels_creates_and_deletes() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let channel = store.add_channel(server.id, "general", false);
        let user = Uuid::new_v4();
        let sub = store.add_sub(server.id, user);
        let role = store.add_role(server.id, "ops", ServerFlags::MANAGE_CHANNELS.bits(), 0, 0);
        store.assign_role(&sub, &role);
        let authz = authorizer::<ChannelPolicy>(&store);
        let scope = server_scope(server.id);

        authz
            .authorize(&ctx(user, scope), None, "write", Some("create"))
            .await
            .unwrap();
        authz
            .authorize(&ctx(user, scope), Some(&channel.id.to_string()), "delete", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn write_grant_does_not_manage_channels() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let writer = Uuid::new_v4();
        store.add_grant(server.id, writer, true, true, true);
        let authz = authorizer::<ChannelPolicy>(&store);

        let err = authz
            .authorize(&ctx(writer, server_scope(server.id)), None, "create", None)
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn storage_failure_is_internal() {
        let store = Arc::new(MemoryStorage::new());
        let server = store.add_server(Uuid::new_v4(), "guild");
        let authz = authorizer::<ChannelPolicy>(&store);
        store.set_failing(true);

        let err = authz
            .authorize(
                &ctx(Uuid::new_v4(), server_scope(server.id)),
                None,
                "read",
                Some("list-channels"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
    }
}
