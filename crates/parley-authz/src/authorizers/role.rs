use uuid::Uuid;

use parley_shared::models::Role;
use parley_shared::permissions::ServerFlags;
use parley_shared::types::ObjectClass;

use crate::action::{Operation, SubAction};
use crate::policy::{PolicyEntry, Predicate, Rule, ScopeUse, TargetUse};
use crate::storage::Storage;

use super::{ClassPolicy, StorageFuture};

const LISTERS: &[Predicate] = &[
    Predicate::Member,
    Predicate::ServerFlag(ServerFlags::MANAGE_ROLES),
];
const MANAGERS: &[Predicate] = &[
    Predicate::BaseCheck,
    Predicate::ServerFlag(ServerFlags::MANAGE_ROLES),
];

pub struct RolePolicy;

impl ClassPolicy for RolePolicy {
    type Object = Role;

    const CLASS: ObjectClass = ObjectClass::Role;

    fn entry(op: Operation) -> Option<PolicyEntry> {
        let entry = match op {
            Operation::Read(Some(SubAction::ListServerRoles)) => PolicyEntry {
                target: TargetUse::Ignored,
                scope: ScopeUse::Required,
                rule: Rule::any_of(LISTERS),
            },
            Operation::Create => PolicyEntry {
                target: TargetUse::Ignored,
                scope: ScopeUse::Required,
                rule: Rule::any_of(MANAGERS),
            },
            // Checked against the role's own server; a sent scope must match it.
            Operation::Delete => PolicyEntry {
                target: TargetUse::Required,
                scope: ScopeUse::IfPresent,
                rule: Rule::any_of(MANAGERS),
            },
            Operation::Read(_) | Operation::Write(_) => return None,
        };
        Some(entry)
    }

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, Role> {
        storage.get_role_by_id(id)
    }
}
