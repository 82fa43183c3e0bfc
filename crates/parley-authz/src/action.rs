//! Action and sub-action vocabulary.
//!
//! Transport tokens are normalized into an [`Operation`] before any policy
//! table is consulted. Tokens outside the vocabulary never normalize, which
//! the engine reports as a denial.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Create,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "create" => Ok(Self::Create),
            "delete" => Ok(Self::Delete),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubAction {
    ListServerRoles,
    ListServerSubs,
    ListUserSubs,
    ListServerUserPermissions,
    ListRoleAssignments,
    ListChannels,
    /// Bare `list`, accepted where a class has a single list shape.
    List,
    GetById,
    Create,
    Delete,
}

impl SubAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListServerRoles => "list-server-roles",
            Self::ListServerSubs => "list-server-subs",
            Self::ListUserSubs => "list-user-subs",
            Self::ListServerUserPermissions => "list-server-user-permissions",
            Self::ListRoleAssignments => "list-role-assignments",
            Self::ListChannels => "list-channels",
            Self::List => "list",
            Self::GetById => "get-by-id",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for SubAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "list-server-roles" => Ok(Self::ListServerRoles),
            "list-server-subs" => Ok(Self::ListServerSubs),
            "list-user-subs" => Ok(Self::ListUserSubs),
            // the original RPC name for listing explicit grants
            "list-server-user-permissions" | "list-appserver-user-permissions" => {
                Ok(Self::ListServerUserPermissions)
            }
            "list-role-assignments" => Ok(Self::ListRoleAssignments),
            "list-channels" => Ok(Self::ListChannels),
            "list" => Ok(Self::List),
            "get-by-id" => Ok(Self::GetById),
            "create" => Ok(Self::Create),
            "delete" => Ok(Self::Delete),
            _ => Err(()),
        }
    }
}

/// Which explicit-grant flag satisfies an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFamily {
    Read,
    Write,
    Delete,
}

/// A normalized `(action, sub-action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Any read; `None` when the caller sent no sub-action.
    Read(Option<SubAction>),
    /// `create`, `create/create` or `write/create`.
    Create,
    /// A write that is not a create. No class currently allows one.
    Write(Option<SubAction>),
    /// `delete` with any known sub-action.
    Delete,
}

impl Operation {
    /// Normalize transport tokens. Returns `None` for anything outside the
    /// vocabulary, including unknown sub-actions.
    pub fn parse(action: &str, sub_action: Option<&str>) -> Option<Self> {
        let action: Action = action.parse().ok()?;
        let sub = match sub_action.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<SubAction>().ok()?),
            None => None,
        };

        match (action, sub) {
            (Action::Read, sub) => Some(Self::Read(sub)),
            (Action::Write, Some(SubAction::Create)) => Some(Self::Create),
            (Action::Write, sub) => Some(Self::Write(sub)),
            (Action::Create, None | Some(SubAction::Create)) => Some(Self::Create),
            (Action::Create, Some(_)) => None,
            (Action::Delete, _) => Some(Self::Delete),
        }
    }

    pub fn family(&self) -> ActionFamily {
        match self {
            Self::Read(_) => ActionFamily::Read,
            Self::Create | Self::Write(_) => ActionFamily::Write,
            Self::Delete => ActionFamily::Delete,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(Some(sub)) => write!(f, "read/{}", sub.as_str()),
            Self::Read(None) => f.write_str("read"),
            Self::Create => f.write_str("write/create"),
            Self::Write(Some(sub)) => write!(f, "write/{}", sub.as_str()),
            Self::Write(None) => f.write_str("write"),
            Self::Delete => f.write_str("delete"),
        }
    }
}
