use uuid::Uuid;

use parley_shared::models::Server;
use parley_shared::types::ObjectClass;

use crate::action::{Operation, SubAction};
use crate::policy::{PolicyEntry, Predicate, Rule, ScopeUse, TargetUse};
use crate::storage::Storage;

use super::{ClassPolicy, StorageFuture};

const ANYONE: &[Predicate] = &[Predicate::Always];
const OWNER: &[Predicate] = &[Predicate::ServerOwner];

/// Servers: open to read and create, only the owner deletes.
pub struct ServerPolicy;

impl ClassPolicy for ServerPolicy {
    type Object = Server;

    const CLASS: ObjectClass = ObjectClass::Server;

    fn entry(op: Operation) -> Option<PolicyEntry> {
        let entry = match op {
            // A read naming a server must still find it.
            Operation::Read(None | Some(SubAction::List | SubAction::GetById)) => PolicyEntry {
                target: TargetUse::Optional,
                scope: ScopeUse::Ignored,
                rule: Rule::any_of(ANYONE),
            },
            Operation::Create => PolicyEntry {
                target: TargetUse::Ignored,
                scope: ScopeUse::Ignored,
                rule: Rule::any_of(ANYONE),
            },
            Operation::Delete => PolicyEntry {
                target: TargetUse::Required,
                scope: ScopeUse::Ignored,
                rule: Rule::any_of(OWNER),
            },
            Operation::Read(_) | Operation::Write(_) => return None,
        };
        Some(entry)
    }

    fn fetch(storage: &dyn Storage, id: Uuid) -> StorageFuture<'_, Server> {
        storage.get_server_by_id(id)
    }
}
