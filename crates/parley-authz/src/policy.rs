//! Policy tables: `(operation) -> rule`, and the rule interpreter.
//!
//! A rule is an optional deny guard followed by an ordered list of
//! predicates, any one of which allows. Predicates are evaluated in table
//! order and stop at the first that holds, so tables list the cheapest
//! checks first.

use tracing::trace;
use uuid::Uuid;

use parley_shared::permissions::{ServerFlags, SubFlags};

use crate::action::ActionFamily;
use crate::error::{AuthzError, Result};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Any authenticated caller.
    Always,
    ServerOwner,
    /// Caller holds a subscription on the server.
    Member,
    /// Owner, or explicit grant matching the operation's family.
    BaseCheck,
    ServerFlag(ServerFlags),
    SubFlag(SubFlags),
    /// The target record belongs to the caller.
    TargetIsCaller,
    /// The target record belongs to the server owner.
    TargetIsOwner,
}

/// Whether an operation addresses a specific object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetUse {
    /// Any object id sent is ignored.
    Ignored,
    /// Loaded when sent.
    Optional,
    /// Must be sent; a missing id is a denial.
    Required,
}

/// Whether an operation needs the request's auth scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeUse {
    Ignored,
    /// Resolved (and so checked for existence) when sent.
    IfPresent,
    /// Must be sent; a missing scope is an invalid argument.
    Required,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub deny_if: Option<Predicate>,
    pub allow_if: &'static [Predicate],
}

impl Rule {
    pub const fn any_of(allow_if: &'static [Predicate]) -> Self {
        Self {
            deny_if: None,
            allow_if,
        }
    }

    pub const fn unless(deny_if: Predicate, allow_if: &'static [Predicate]) -> Self {
        Self {
            deny_if: Some(deny_if),
            allow_if,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyEntry {
    pub target: TargetUse,
    pub scope: ScopeUse,
    pub rule: Rule,
}

/// Inputs a rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Facts {
    pub caller: Uuid,
    /// The target's server, else the scope's server.
    pub server_id: Option<Uuid>,
    /// Owner of the target record, for classes whose records belong to a
    /// user.
    pub target_user: Option<Uuid>,
    pub family: ActionFamily,
}

impl Facts {
    fn server(&self) -> Result<Uuid> {
        self.server_id
            .ok_or_else(|| AuthzError::missing_field("policy.server"))
    }
}

impl<'a> Session<'a> {
    /// Evaluate a rule. `Ok(false)` is a denial.
    pub async fn evaluate(&self, rule: &Rule, facts: &Facts) -> Result<bool> {
        if let Some(guard) = rule.deny_if {
            if self.holds(guard, facts).await? {
                trace!(?guard, "deny guard matched");
                return Ok(false);
            }
        }

        for predicate in rule.allow_if {
            if self.holds(*predicate, facts).await? {
                trace!(?predicate, "predicate allowed");
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn holds(&self, predicate: Predicate, facts: &Facts) -> Result<bool> {
        match predicate {
            Predicate::Always => Ok(true),
            Predicate::ServerOwner => self.user_is_server_owner(facts.server()?, facts.caller).await,
            Predicate::Member => self.user_has_server_sub(facts.server()?, facts.caller).await,
            Predicate::BaseCheck => {
                self.base_permission_check(facts.server()?, facts.caller, facts.family)
                    .await
            }
            Predicate::ServerFlag(flag) => Ok(self
                .user_permission_mask(facts.server()?, facts.caller)
                .await?
                .has_server(flag)),
            Predicate::SubFlag(flag) => Ok(self
                .user_permission_mask(facts.server()?, facts.caller)
                .await?
                .has_sub(flag)),
            Predicate::TargetIsCaller => Ok(facts.target_user == Some(facts.caller)),
            Predicate::TargetIsOwner => match facts.target_user {
                Some(user) => self.user_is_server_owner(facts.server()?, user).await,
                None => Ok(false),
            },
        }
    }
}
