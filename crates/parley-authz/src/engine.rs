//! The decision engine facade: one authorizer per object class.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use parley_shared::types::ObjectClass;

use crate::authorizers::{
    Authorizer, ChannelPolicy, ChannelRolePolicy, ClassAuthorizer, ExplicitGrantPolicy,
    RoleAssignmentPolicy, RolePolicy, ServerPolicy, SubscriptionPolicy,
};
use crate::clock::Clock;
use crate::context::RequestContext;
use crate::error::Result;
use crate::storage::Storage;

/// One authorization question, as the transport delivers it.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthzRequest {
    pub class: ObjectClass,
    #[serde(default)]
    pub object_id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub sub_action: Option<String>,
}

pub struct Engine {
    servers: ClassAuthorizer<ServerPolicy>,
    subscriptions: ClassAuthorizer<SubscriptionPolicy>,
    roles: ClassAuthorizer<RolePolicy>,
    role_assignments: ClassAuthorizer<RoleAssignmentPolicy>,
    channels: ClassAuthorizer<ChannelPolicy>,
    channel_roles: ClassAuthorizer<ChannelRolePolicy>,
    explicit_grants: ClassAuthorizer<ExplicitGrantPolicy>,
}

impl Engine {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            servers: ClassAuthorizer::new(storage.clone(), clock.clone()),
            subscriptions: ClassAuthorizer::new(storage.clone(), clock.clone()),
            roles: ClassAuthorizer::new(storage.clone(), clock.clone()),
            role_assignments: ClassAuthorizer::new(storage.clone(), clock.clone()),
            channels: ClassAuthorizer::new(storage.clone(), clock.clone()),
            channel_roles: ClassAuthorizer::new(storage.clone(), clock.clone()),
            explicit_grants: ClassAuthorizer::new(storage, clock),
        }
    }

    pub fn authorizer(&self, class: ObjectClass) -> &dyn Authorizer {
        match class {
            ObjectClass::Server => &self.servers,
            ObjectClass::Subscription => &self.subscriptions,
            ObjectClass::Role => &self.roles,
            ObjectClass::RoleAssignment => &self.role_assignments,
            ObjectClass::Channel => &self.channels,
            ObjectClass::ChannelRole => &self.channel_roles,
            ObjectClass::ExplicitGrant => &self.explicit_grants,
        }
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(request_id = ctx.request_id(), class = %req.class, action = %req.action)
    )]
    pub async fn authorize(&self, ctx: &RequestContext, req: &AuthzRequest) -> Result<()> {
        self.authorizer(req.class)
            .authorize(
                ctx,
                req.object_id.as_deref(),
                &req.action,
                req.sub_action.as_deref(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use uuid::Uuid;

    use parley_shared::permissions::ServerFlags;

    use crate::authorizers::test_support::{claims_for, server_scope};
    use crate::clock::FixedClock;
    use crate::context::AuthScope;
    use crate::error::{AuthzError, ErrorKind};
    use crate::testing::MemoryStorage;

    use super::*;

    fn engine(store: &Arc<MemoryStorage>) -> Engine {
        Engine::new(store.clone(), Arc::new(FixedClock::new(Utc::now())))
    }

    fn ctx(user: Uuid, scope: AuthScope) -> RequestContext {
        RequestContext::new(None)
            .with_claims(claims_for(user))
            .with_scope(scope)
    }

    fn req(class: ObjectClass, object_id: Option<Uuid>, action: &str, sub: Option<&str>) -> AuthzRequest {
        AuthzRequest {
            class,
            object_id: object_id.map(|id| id.to_string()),
            action: action.into(),
            sub_action: sub.map(Into::into),
        }
    }

    #[tokio::test]
    async fn owner_deletes_server_then_it_is_gone() {
        let store = Arc::new(MemoryStorage::new());
        let u1 = Uuid::new_v4();
        let s1 = store.add_server(u1, "s1");
        let engine = engine(&store);

        engine
            .authorize(
                &ctx(u1, AuthScope::Unscoped),
                &req(ObjectClass::Server, Some(s1.id), "delete", None),
            )
            .await
            .unwrap();

        assert!(store.delete_server(s1.id));

        let err = engine
            .authorize(
                &ctx(u1, AuthScope::Unscoped),
                &req(ObjectClass::Server, Some(s1.id), "delete", None),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        let err = engine
            .authorize(
                &ctx(u1, server_scope(s1.id)),
                &req(ObjectClass::Channel, None, "read", Some("list-channels")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn non_member_cannot_list_channels() {
        let store = Arc::new(MemoryStorage::new());
        let s1 = store.add_server(Uuid::new_v4(), "s1");
        store.add_channel(s1.id, "c1", false);
        let engine = engine(&store);

        let err = engine
            .authorize(
                &ctx(Uuid::new_v4(), server_scope(s1.id)),
                &req(ObjectClass::Channel, None, "read", Some("list-channels")),
            )
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn member_with_manage_roles_creates_role() {
        let store = Arc::new(MemoryStorage::new());
        let s1 = store.add_server(Uuid::new_v4(), "s1");
        let u2 = Uuid::new_v4();
        let sub = store.add_sub(s1.id, u2);
        let role = store.add_role(s1.id, "admins", ServerFlags::MANAGE_ROLES.bits(), 0, 0);
        store.assign_role(&sub, &role);
        let engine = engine(&store);

        engine
            .authorize(
                &ctx(u2, server_scope(s1.id)),
                &req(ObjectClass::Role, None, "write", Some("create")),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn user_leaves_own_sub_owner_cannot() {
        let store = Arc::new(MemoryStorage::new());
        let u1 = Uuid::new_v4();
        let s1 = store.add_server(u1, "s1");
        let u2 = Uuid::new_v4();
        let sub1 = store.add_sub(s1.id, u2);
        let sub_o = store.sub_for(s1.id, u1).unwrap();
        let engine = engine(&store);

        engine
            .authorize(
                &ctx(u2, AuthScope::Unscoped),
                &req(ObjectClass::Subscription, Some(sub1.id), "delete", None),
            )
            .await
            .unwrap();

        let err = engine
            .authorize(
                &ctx(u1, AuthScope::Unscoped),
                &req(ObjectClass::Subscription, Some(sub_o.id), "delete", None),
            )
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn cross_server_override_is_not_found() {
        let store = Arc::new(MemoryStorage::new());
        let s1 = store.add_server(Uuid::new_v4(), "s1");
        let u1 = Uuid::new_v4();
        let s2 = store.add_server(u1, "s2");
        let channel = store.add_channel(s1.id, "c1", true);
        let role = store.add_role(s1.id, "r1", 0, 0, 0);
        let cro = store.add_channel_role(&channel, &role);
        let engine = engine(&store);

        let err = engine
            .authorize(
                &ctx(u1, server_scope(s2.id)),
                &req(ObjectClass::ChannelRole, Some(cro.id), "delete", None),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn owner_deletes_everything_in_their_server() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let s = store.add_server(owner, "s");
        let member = Uuid::new_v4();
        let sub = store.add_sub(s.id, member);
        let role = store.add_role(s.id, "r", 0, 0, 0);
        let assignment = store.assign_role(&sub, &role);
        let channel = store.add_channel(s.id, "c", false);
        let cro = store.add_channel_role(&channel, &role);
        let grant = store.add_grant(s.id, member, true, false, false);
        let engine = engine(&store);
        let ctx = ctx(owner, server_scope(s.id));

        let targets = [
            (ObjectClass::Server, s.id),
            (ObjectClass::Subscription, sub.id),
            (ObjectClass::Role, role.id),
            (ObjectClass::RoleAssignment, assignment.id),
            (ObjectClass::Channel, channel.id),
            (ObjectClass::ChannelRole, cro.id),
            (ObjectClass::ExplicitGrant, grant.id),
        ];
        for (class, id) in targets {
            engine
                .authorize(&ctx, &req(class, Some(id), "delete", None))
                .await
                .unwrap_or_else(|e| panic!("owner delete of {class} denied: {e}"));
        }
    }

    #[tokio::test]
    async fn unscoped_delete_is_checked_against_the_target_server() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let s = store.add_server(owner, "s");
        let member = Uuid::new_v4();
        let sub = store.add_sub(s.id, member);
        let role = store.add_role(s.id, "r", 0, 0, 0);
        let assignment = store.assign_role(&sub, &role);
        let channel = store.add_channel(s.id, "c", false);
        let cro = store.add_channel_role(&channel, &role);
        let engine = engine(&store);

        let targets = [
            (ObjectClass::Role, role.id),
            (ObjectClass::RoleAssignment, assignment.id),
            (ObjectClass::Channel, channel.id),
            (ObjectClass::ChannelRole, cro.id),
        ];
        for (class, id) in targets {
            engine
                .authorize(&ctx(owner, AuthScope::Unscoped), &req(class, Some(id), "delete", None))
                .await
                .unwrap_or_else(|e| panic!("unscoped owner delete of {class} refused: {e}"));

            let err = engine
                .authorize(&ctx(member, AuthScope::Unscoped), &req(class, Some(id), "delete", None))
                .await
                .unwrap_err();
            assert!(err.is_denied(), "member delete of {class}: {err}");
        }
    }

    #[tokio::test]
    async fn read_all_grant_lists_without_membership() {
        let store = Arc::new(MemoryStorage::new());
        let s = store.add_server(Uuid::new_v4(), "s");
        let auditor = Uuid::new_v4();
        let engine = engine(&store);
        let list_subs = req(ObjectClass::Subscription, None, "read", Some("list-server-subs"));

        let err = engine
            .authorize(&ctx(auditor, server_scope(s.id)), &list_subs)
            .await
            .unwrap_err();
        assert!(err.is_denied());

        store.add_grant(s.id, auditor, true, false, false);
        engine
            .authorize(&ctx(auditor, server_scope(s.id)), &list_subs)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn decisions_are_repeatable() {
        let store = Arc::new(MemoryStorage::new());
        let s = store.add_server(Uuid::new_v4(), "s");
        let user = Uuid::new_v4();
        store.add_sub(s.id, user);
        let engine = engine(&store);
        let ctx = ctx(user, server_scope(s.id));
        let request = req(ObjectClass::Role, None, "create", None);

        let first = engine.authorize(&ctx, &request).await.unwrap_err();
        let second = engine.authorize(&ctx, &request).await.unwrap_err();
        assert_eq!(first.kind(), second.kind());
        assert_eq!(first.origin(), second.origin());
    }

    #[tokio::test]
    async fn nil_object_id_on_delete_is_denied() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let s = store.add_server(owner, "s");
        let engine = engine(&store);

        let err = engine
            .authorize(
                &ctx(owner, server_scope(s.id)),
                &req(ObjectClass::Role, Some(Uuid::nil()), "delete", None),
            )
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn empty_sub_action_is_denied_where_required() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let s = store.add_server(owner, "s");
        let engine = engine(&store);

        let err = engine
            .authorize(
                &ctx(owner, server_scope(s.id)),
                &req(ObjectClass::Channel, None, "read", Some("")),
            )
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn slow_storage_hits_the_deadline() {
        let store = Arc::new(MemoryStorage::new());
        let owner = Uuid::new_v4();
        let s = store.add_server(owner, "s");
        store.set_delay(Duration::from_secs(5));
        let now = Utc::now();
        let engine = Engine::new(store.clone(), Arc::new(FixedClock::new(now)));
        let ctx = ctx(owner, server_scope(s.id)).with_deadline(now + chrono::Duration::milliseconds(20));

        let err = engine
            .authorize(&ctx, &req(ObjectClass::Channel, None, "create", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::DeadlineExceeded));
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: AuthzRequest =
            serde_json::from_str(r#"{"class":"role-assignment","action":"read"}"#).unwrap();
        assert_eq!(req.class, ObjectClass::RoleAssignment);
        assert!(req.object_id.is_none());
        assert!(req.sub_action.is_none());
    }

    #[test]
    fn every_class_has_an_authorizer() {
        let store = Arc::new(MemoryStorage::new());
        let engine = engine(&store);
        for class in ObjectClass::ALL {
            assert_eq!(engine.authorizer(class).class(), class);
        }
    }
}
