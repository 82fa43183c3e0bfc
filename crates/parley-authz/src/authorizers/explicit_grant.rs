use uuid::Uuid;

use parley_shared::models::ExplicitGrant;
use parley_shared::types::ObjectClass;

use crate::action::{Operation, SubAction};
use crate::policy::{PolicyEntry, Predicate, Rule, ScopeUse, TargetUse};
use crate::storage::Storage;

use super::{ClassPolicy, StorageFuture};

const OWNER: &[Predicate] = &[Predicate::ServerOwner];

/// Explicit grants are owner-only in every direction.
pub struct ExplicitGrantPolicy;

impl ClassPolicy for ExplicitGrantPolicy {
    type Object = ExplicitGrant;

    const CLASS: ObjectClass = ObjectClass::ExplicitGrant;

    fn entry(op: Operation) -> Option<PolicyEntry> {
        let (target, scope) = match op {
            Operation::Read(Some(SubAction::ListServerUserPermissions)) => {
                (TargetUse::Ignored, ScopeUse::Required)
            }
            Operation::Create => (TargetUse::Ignored, ScopeUse::Required),
            // The grant names its own server.
            Operation::Delete => (TargetUse::Required, ScopeUse::Ignored),
            Operation::Read(_) | Operation::Write(_) => return None,
        };
        Some(PolicyEntry {
            target,
            scope,
            rule: Rule::any_of(OWNER),
        })
    }

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, ExplicitGrant> {
        storage.get_explicit_grant_by_id(id)
    }

    fn target_user(grant: &ExplicitGrant) -> Option<Uuid> {
        Some(grant.user_id)
    }
}
