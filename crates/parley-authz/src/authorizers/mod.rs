//! Per-class authorizers.
//!
//! Every object class implements [`ClassPolicy`]: a policy table plus the
//! lookup for its records. [`ClassAuthorizer`] turns any policy into an
//! [`Authorizer`] by running the shared dispatch sequence:
//!
//! 1. claims present and unexpired, else unauthenticated;
//! 2. caller id and object id parse, else invalid argument;
//! 3. the operation has a table entry, else denied;
//! 4. scope and target resolve, else not-found (or invalid argument for a
//!    missing required scope);
//! 5. the entry's rule holds, else denied.

mod channel;
mod channel_role;
mod explicit_grant;
mod role;
mod role_assignment;
mod server;
mod subscription;

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use uuid::Uuid;

use parley_shared::models::ServerScoped;
use parley_shared::types::ObjectClass;

use crate::action::Operation;
use crate::clock::Clock;
use crate::context::RequestContext;
use crate::error::{AuthzError, ErrorKind, Result};
use crate::policy::{Facts, PolicyEntry, ScopeUse, TargetUse};
use crate::resolve::{parse_id, parse_object_id};
use crate::session::Session;
use crate::storage::{Storage, StorageResult};

pub use channel::ChannelPolicy;
pub use channel_role::ChannelRolePolicy;
pub use explicit_grant::ExplicitGrantPolicy;
pub use role::RolePolicy;
pub use role_assignment::RoleAssignmentPolicy;
pub use server::ServerPolicy;
pub use subscription::SubscriptionPolicy;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send + 'a>>;

/// The capability every object class exposes to the engine.
#[async_trait]
pub trait Authorizer: Send + Sync {
    fn class(&self) -> ObjectClass;

    /// `Ok(())` allows the operation; every other outcome is an error
    /// carrying its kind.
    async fn authorize(
        &self,
        ctx: &RequestContext,
        object_id: Option<&str>,
        action: &str,
        sub_action: Option<&str>,
    ) -> Result<()>;
}

/// Class-specific half of an authorizer.
pub trait ClassPolicy: Send + Sync + 'static {
    type Object: ServerScoped + Send + Sync;

    const CLASS: ObjectClass;

    /// The table entry for an operation, or `None` to deny it.
    fn entry(op: Operation) -> Option<PolicyEntry>;

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, Self::Object>;

    /// The user a record belongs to, when records of this class have one.
    fn target_user(_object: &Self::Object) -> Option<Uuid> {
        None
    }

    /// The channel a record is bound to, checked against a channel scope.
    fn target_channel(_object: &Self::Object) -> Option<Uuid> {
        None
    }
}

pub struct ClassAuthorizer<P> {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    _policy: PhantomData<fn() -> P>,
}

impl<P: ClassPolicy> ClassAuthorizer<P> {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            _policy: PhantomData,
        }
    }
}

#[async_trait]
impl<P: ClassPolicy> Authorizer for ClassAuthorizer<P> {
    fn class(&self) -> ObjectClass {
        P::CLASS
    }

    async fn authorize(
        &self,
        ctx: &RequestContext,
        object_id: Option<&str>,
        action: &str,
        sub_action: Option<&str>,
    ) -> Result<()> {
        let session = Session::new(self.storage.as_ref(), self.clock.as_ref(), ctx);
        let outcome = decide::<P>(&session, object_id, action, sub_action).await;

        let sub_action = sub_action.unwrap_or("");
        match &outcome {
            Ok(()) => debug!(
                request_id = ctx.request_id(),
                class = %P::CLASS,
                action,
                sub_action,
                "allowed"
            ),
            Err(err) => match err.kind() {
                Some(ErrorKind::Internal) => error!(
                    request_id = ctx.request_id(),
                    class = %P::CLASS,
                    action,
                    sub_action,
                    origin = err.origin().unwrap_or(""),
                    error = %err.chain(),
                    "authorization failed"
                ),
                Some(kind) => debug!(
                    request_id = ctx.request_id(),
                    class = %P::CLASS,
                    action,
                    sub_action,
                    %kind,
                    origin = err.origin().unwrap_or(""),
                    "rejected"
                ),
                None => warn!(
                    request_id = ctx.request_id(),
                    class = %P::CLASS,
                    action,
                    sub_action,
                    error = %err,
                    "authorization interrupted"
                ),
            },
        }

        outcome
    }
}

async fn decide<P: ClassPolicy>(
    session: &Session<'_>,
    object_id: Option<&str>,
    action: &str,
    sub_action: Option<&str>,
) -> Result<()> {
    let ctx = session.ctx();

    let claims = ctx
        .claims()
        .ok_or_else(|| AuthzError::unauthenticated("dispatch.claims"))?;
    if claims.exp <= session.now().timestamp() {
        return Err(AuthzError::unauthenticated("dispatch.claims_expired"));
    }

    let caller = parse_id("dispatch.caller_id", &claims.user_id)?;
    let object_id = parse_object_id(object_id)?;

    let Some(op) = Operation::parse(action, sub_action) else {
        return Err(AuthzError::denied("dispatch.vocabulary"));
    };
    let Some(entry) = P::entry(op) else {
        return Err(AuthzError::denied("dispatch.policy"));
    };

    let target_id = match entry.target {
        TargetUse::Ignored => None,
        TargetUse::Optional => object_id,
        TargetUse::Required => {
            Some(object_id.ok_or_else(|| AuthzError::denied("dispatch.missing_target"))?)
        }
    };

    let scope = match entry.scope {
        ScopeUse::Ignored => None,
        ScopeUse::IfPresent => session.resolve_scope().await?,
        ScopeUse::Required => Some(
            session
                .resolve_scope()
                .await?
                .ok_or_else(|| AuthzError::missing_field("dispatch.scope"))?,
        ),
    };

    let target = match target_id {
        Some(id) => {
            let check = scope.as_ref().filter(|_| P::CLASS.is_scope_checked());
            let object = session
                .load_object(id, check, |id| P::fetch(session.storage(), id))
                .await?;
            Some(object)
        }
        None => None,
    };

    if let (Some(object), Some(scope_channel)) = (
        target.as_ref(),
        scope.as_ref().and_then(|s| s.channel_id),
    ) {
        if P::target_channel(object).is_some_and(|c| c != scope_channel) {
            return Err(AuthzError::not_found("dispatch.channel_mismatch"));
        }
    }

    let facts = Facts {
        caller,
        server_id: target
            .as_ref()
            .map(|o| o.server_id())
            .or_else(|| scope.as_ref().map(|s| s.server_id())),
        target_user: target.as_ref().and_then(P::target_user),
        family: op.family(),
    };

    if session.evaluate(&entry.rule, &facts).await? {
        Ok(())
    } else {
        Err(AuthzError::denied("policy.rule"))
    }
}
