//! Entity records read by the authorization engine.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can cross the
//! HTTP boundary unchanged. Records are plain values: the engine reads a
//! fresh copy per request and never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::PermissionMask;

/// Records that live inside exactly one server.
pub trait ServerScoped {
    fn server_id(&self) -> Uuid;
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server (appserver)
// ---------------------------------------------------------------------------

/// A server that groups channels, roles and members under one owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub id: Uuid,
    pub name: String,
    /// The single owning user.
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Server {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            created_at: Utc::now(),
        }
    }
}

impl ServerScoped for Server {
    fn server_id(&self) -> Uuid {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Membership of one user in one server. Unique per `(server_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    pub id: Uuid,
    pub server_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(server_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

impl ServerScoped for Subscription {
    fn server_id(&self) -> Uuid {
        self.server_id
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Named bundle of permission masks. Masks are stored raw; use
/// [`Role::mask`] to read them as flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: Uuid,
    pub server_id: Uuid,
    pub name: String,
    pub server_mask: i64,
    pub channel_mask: i64,
    pub sub_mask: i64,
}

impl Role {
    pub fn new(server_id: Uuid, name: impl Into<String>, mask: PermissionMask) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id,
            name: name.into(),
            server_mask: mask.server.bits(),
            channel_mask: mask.channel,
            sub_mask: mask.sub.bits(),
        }
    }

    pub fn mask(&self) -> PermissionMask {
        PermissionMask::from_raw(self.server_mask, self.channel_mask, self.sub_mask)
    }
}

impl ServerScoped for Role {
    fn server_id(&self) -> Uuid {
        self.server_id
    }
}

// ---------------------------------------------------------------------------
// Role assignment
// ---------------------------------------------------------------------------

/// Links a subscription to a role.
///
/// The subscription, the role and this record always share one `server_id`;
/// the store rejects inserts that break this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub server_id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub role_id: Uuid,
}

impl RoleAssignment {
    /// Assign `role_id` to the holder of `sub`. The role must belong to the
    /// subscription's server.
    pub fn new(sub: &Subscription, role_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id: sub.server_id,
            user_id: sub.user_id,
            subscription_id: sub.id,
            role_id,
        }
    }
}

impl ServerScoped for RoleAssignment {
    fn server_id(&self) -> Uuid {
        self.server_id
    }
}

// ---------------------------------------------------------------------------
// Explicit grant
// ---------------------------------------------------------------------------

/// Direct per-user permission record that bypasses roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExplicitGrant {
    pub id: Uuid,
    pub server_id: Uuid,
    pub user_id: Uuid,
    pub read_all: bool,
    pub write_all: bool,
    pub delete_all: bool,
}

impl ExplicitGrant {
    pub fn new(server_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id,
            user_id,
            read_all: false,
            write_all: false,
            delete_all: false,
        }
    }
}

impl ServerScoped for ExplicitGrant {
    fn server_id(&self) -> Uuid {
        self.server_id
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub id: Uuid,
    pub server_id: Uuid,
    pub name: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(server_id: Uuid, name: impl Into<String>, is_private: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id,
            name: name.into(),
            is_private,
            created_at: Utc::now(),
        }
    }
}

impl ServerScoped for Channel {
    fn server_id(&self) -> Uuid {
        self.server_id
    }
}

// ---------------------------------------------------------------------------
// Channel role override
// ---------------------------------------------------------------------------

/// Restricts a channel to holders of one role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRole {
    pub id: Uuid,
    pub server_id: Uuid,
    pub channel_id: Uuid,
    pub role_id: Uuid,
}

impl ChannelRole {
    pub fn new(channel: &Channel, role_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id: channel.server_id,
            channel_id: channel.id,
            role_id,
        }
    }
}

impl ServerScoped for ChannelRole {
    fn server_id(&self) -> Uuid {
        self.server_id
    }
}
