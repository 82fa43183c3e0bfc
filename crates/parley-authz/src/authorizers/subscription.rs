use uuid::Uuid;

use parley_shared::models::Subscription;
use parley_shared::permissions::SubFlags;
use parley_shared::types::ObjectClass;

use crate::action::{Operation, SubAction};
use crate::policy::{PolicyEntry, Predicate, Rule, ScopeUse, TargetUse};
use crate::storage::Storage;

use super::{ClassPolicy, StorageFuture};

const ANYONE: &[Predicate] = &[Predicate::Always];
const READERS: &[Predicate] = &[Predicate::BaseCheck];
// leave, kick, moderate
const REMOVERS: &[Predicate] = &[
    Predicate::TargetIsCaller,
    Predicate::ServerOwner,
    Predicate::SubFlag(SubFlags::MANAGE_SUBS),
];

/// Server memberships.
///
/// Joining is open. The owner's own subscription can never be deleted; the
/// owner has to delete the server instead.
pub struct SubscriptionPolicy;

impl ClassPolicy for SubscriptionPolicy {
    type Object = Subscription;

    const CLASS: ObjectClass = ObjectClass::Subscription;

    fn entry(op: Operation) -> Option<PolicyEntry> {
        let entry = match op {
            Operation::Create => PolicyEntry {
                target: TargetUse::Ignored,
                scope: ScopeUse::IfPresent,
                rule: Rule::any_of(ANYONE),
            },
            Operation::Read(Some(SubAction::ListServerSubs)) => PolicyEntry {
                target: TargetUse::Ignored,
                scope: ScopeUse::Required,
                rule: Rule::any_of(READERS),
            },
            // Lists the caller's own subscriptions only. A sent scope must
            // still name a live server.
            Operation::Read(Some(SubAction::ListUserSubs)) => PolicyEntry {
                target: TargetUse::Ignored,
                scope: ScopeUse::IfPresent,
                rule: Rule::any_of(ANYONE),
            },
            Operation::Delete => PolicyEntry {
                target: TargetUse::Required,
                scope: ScopeUse::Ignored,
                rule: Rule::unless(Predicate::TargetIsOwner, REMOVERS),
            },
            Operation::Read(_) | Operation::Write(_) => return None,
        };
        Some(entry)
    }

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, Subscription> {
        storage.get_sub_by_id(id)
    }

    fn target_user(sub: &Subscription) -> Option<Uuid> {
        Some(sub.user_id)
    }
}
