use uuid::Uuid;

use parley_shared::models::RoleAssignment;
use parley_shared::permissions::ServerFlags;
use parley_shared::types::ObjectClass;

use crate::action::{Operation, SubAction};
use crate::policy::{PolicyEntry, Predicate, Rule, ScopeUse, TargetUse};
use crate::storage::Storage;

use super::{ClassPolicy, StorageFuture};

const MANAGERS: &[Predicate] = &[
    Predicate::BaseCheck,
    Predicate::ServerFlag(ServerFlags::MANAGE_ROLES),
];

/// Role assignments share one rule for every action: base permission or
/// `MANAGE_ROLES`, against the scope server (list, create) or the
/// assignment's own server (delete).
pub struct RoleAssignmentPolicy;

impl ClassPolicy for RoleAssignmentPolicy {
    type Object = RoleAssignment;

    const CLASS: ObjectClass = ObjectClass::RoleAssignment;

    fn entry(op: Operation) -> Option<PolicyEntry> {
        let (target, scope) = match op {
            Operation::Read(Some(SubAction::ListRoleAssignments | SubAction::List)) => {
                (TargetUse::Ignored, ScopeUse::Required)
            }
            Operation::Create => (TargetUse::Ignored, ScopeUse::Required),
            Operation::Delete => (TargetUse::Required, ScopeUse::IfPresent),
            Operation::Read(_) | Operation::Write(_) => return None,
        };
        Some(PolicyEntry {
            target,
            scope,
            rule: Rule::any_of(MANAGERS),
        })
    }

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, RoleAssignment> {
        storage.get_role_sub_by_id(id)
    }

    fn target_user(assignment: &RoleAssignment) -> Option<Uuid> {
        Some(assignment.user_id)
    }
}
