use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_NAME_LEN;
use crate::error::SharedError;

/// Object classes guarded by the authorization engine.
///
/// The kebab-case token is the stable wire name used by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectClass {
    #[serde(alias = "appserver")]
    Server,
    #[serde(alias = "sub")]
    Subscription,
    Role,
    #[serde(alias = "role-sub")]
    RoleAssignment,
    Channel,
    ChannelRole,
    #[serde(alias = "permission")]
    ExplicitGrant,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 7] = [
        Self::Server,
        Self::Subscription,
        Self::Role,
        Self::RoleAssignment,
        Self::Channel,
        Self::ChannelRole,
        Self::ExplicitGrant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Subscription => "subscription",
            Self::Role => "role",
            Self::RoleAssignment => "role-assignment",
            Self::Channel => "channel",
            Self::ChannelRole => "channel-role",
            Self::ExplicitGrant => "explicit-grant",
        }
    }

    /// Whether objects of this class must live in the server named by the
    /// request's auth scope.
    pub fn is_scope_checked(&self) -> bool {
        matches!(
            self,
            Self::Role | Self::RoleAssignment | Self::Channel | Self::ChannelRole
        )
    }
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "appserver" and "sub" are the historical RPC service names.
        match s.trim() {
            "server" | "appserver" => Ok(Self::Server),
            "subscription" | "sub" => Ok(Self::Subscription),
            "role" => Ok(Self::Role),
            "role-assignment" | "role-sub" => Ok(Self::RoleAssignment),
            "channel" => Ok(Self::Channel),
            "channel-role" => Ok(Self::ChannelRole),
            "explicit-grant" | "permission" => Ok(Self::ExplicitGrant),
            other => Err(SharedError::UnknownClass(other.to_string())),
        }
    }
}

/// Check a server, role or channel name: non-blank and at most
/// [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<(), SharedError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(SharedError::InvalidName { max: MAX_NAME_LEN });
    }
    Ok(())
}
