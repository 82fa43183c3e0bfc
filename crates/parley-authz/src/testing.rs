//! In-memory [`Storage`] for tests.
//!
//! Fixture helpers create records with fresh ids and return them, so tests
//! read like the data they set up. `add_server` also subscribes the owner,
//! the same way the SQLite store does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use parley_shared::models::{
    Channel, ChannelRole, ExplicitGrant, Role, RoleAssignment, Server, Subscription,
};

use crate::storage::{Storage, StorageError, StorageResult};

#[derive(Default)]
struct State {
    servers: HashMap<Uuid, Server>,
    subs: HashMap<Uuid, Subscription>,
    roles: HashMap<Uuid, Role>,
    role_subs: HashMap<Uuid, RoleAssignment>,
    grants: HashMap<Uuid, ExplicitGrant>,
    channels: HashMap<Uuid, Channel>,
    channel_roles: HashMap<Uuid, ChannelRole>,
}

#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<State>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent lookup fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent lookup.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_server(&self, owner_id: Uuid, name: &str) -> Server {
        let server = Server {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            created_at: Utc::now(),
        };
        self.write().servers.insert(server.id, server.clone());
        self.add_sub(server.id, owner_id);
        server
    }

    pub fn add_sub(&self, server_id: Uuid, user_id: Uuid) -> Subscription {
        let sub = Subscription {
            id: Uuid::new_v4(),
            server_id,
            user_id,
            created_at: Utc::now(),
        };
        self.write().subs.insert(sub.id, sub.clone());
        sub
    }

    pub fn sub_for(&self, server_id: Uuid, user_id: Uuid) -> Option<Subscription> {
        self.read()
            .subs
            .values()
            .find(|s| s.server_id == server_id && s.user_id == user_id)
            .cloned()
    }

    pub fn add_role(
        &self,
        server_id: Uuid,
        name: &str,
        server_mask: i64,
        channel_mask: i64,
        sub_mask: i64,
    ) -> Role {
        let role = Role {
            id: Uuid::new_v4(),
            server_id,
            name: name.to_string(),
            server_mask,
            channel_mask,
            sub_mask,
        };
        self.write().roles.insert(role.id, role.clone());
        role
    }

    /// Panics when the subscription and role live in different servers,
    /// mirroring the insert check of the real store.
    pub fn assign_role(&self, sub: &Subscription, role: &Role) -> RoleAssignment {
        assert_eq!(sub.server_id, role.server_id, "cross-server role assignment");
        let assignment = RoleAssignment {
            id: Uuid::new_v4(),
            server_id: sub.server_id,
            user_id: sub.user_id,
            subscription_id: sub.id,
            role_id: role.id,
        };
        self.write()
            .role_subs
            .insert(assignment.id, assignment.clone());
        assignment
    }

    pub fn add_grant(
        &self,
        server_id: Uuid,
        user_id: Uuid,
        read_all: bool,
        write_all: bool,
        delete_all: bool,
    ) -> ExplicitGrant {
        let grant = ExplicitGrant {
            id: Uuid::new_v4(),
            server_id,
            user_id,
            read_all,
            write_all,
            delete_all,
        };
        self.write().grants.insert(grant.id, grant.clone());
        grant
    }

    pub fn add_channel(&self, server_id: Uuid, name: &str, is_private: bool) -> Channel {
        let channel = Channel {
            id: Uuid::new_v4(),
            server_id,
            name: name.to_string(),
            is_private,
            created_at: Utc::now(),
        };
        self.write().channels.insert(channel.id, channel.clone());
        channel
    }

    pub fn add_channel_role(&self, channel: &Channel, role: &Role) -> ChannelRole {
        assert_eq!(channel.server_id, role.server_id, "cross-server channel role");
        let entry = ChannelRole {
            id: Uuid::new_v4(),
            server_id: channel.server_id,
            channel_id: channel.id,
            role_id: role.id,
        };
        self.write().channel_roles.insert(entry.id, entry.clone());
        entry
    }

    /// Delete a server and everything it owns. Returns whether it existed.
    pub fn delete_server(&self, server_id: Uuid) -> bool {
        let mut state = self.write();
        let existed = state.servers.remove(&server_id).is_some();
        state.subs.retain(|_, s| s.server_id != server_id);
        state.roles.retain(|_, r| r.server_id != server_id);
        state.role_subs.retain(|_, a| a.server_id != server_id);
        state.grants.retain(|_, g| g.server_id != server_id);
        state.channels.retain(|_, c| c.server_id != server_id);
        state.channel_roles.retain(|_, c| c.server_id != server_id);
        existed
    }

    async fn enter(&self) -> StorageResult<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::backend("memory storage set to fail"));
        }
        Ok(())
    }
}

fn found<T: Clone>(value: Option<&T>) -> StorageResult<T> {
    value.cloned().ok_or(StorageError::NotFound)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_server_by_id(&self, id: Uuid) -> StorageResult<Server> {
        self.enter().await?;
        found(self.read().servers.get(&id))
    }

    async fn get_sub_by_id(&self, id: Uuid) -> StorageResult<Subscription> {
        self.enter().await?;
        found(self.read().subs.get(&id))
    }

    async fn get_sub_by_server_and_user(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Subscription> {
        self.enter().await?;
        self.sub_for(server_id, user_id).ok_or(StorageError::NotFound)
    }

    async fn get_role_by_id(&self, id: Uuid) -> StorageResult<Role> {
        self.enter().await?;
        found(self.read().roles.get(&id))
    }

    async fn get_user_roles_on_server(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<Role>> {
        self.enter().await?;
        let state = self.read();
        Ok(state
            .role_subs
            .values()
            .filter(|a| a.server_id == server_id && a.user_id == user_id)
            .filter_map(|a| state.roles.get(&a.role_id).cloned())
            .collect())
    }

    async fn get_role_sub_by_id(&self, id: Uuid) -> StorageResult<RoleAssignment> {
        self.enter().await?;
        found(self.read().role_subs.get(&id))
    }

    async fn get_explicit_grant(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<ExplicitGrant> {
        self.enter().await?;
        self.read()
            .grants
            .values()
            .find(|g| g.server_id == server_id && g.user_id == user_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn get_explicit_grant_by_id(&self, id: Uuid) -> StorageResult<ExplicitGrant> {
        self.enter().await?;
        found(self.read().grants.get(&id))
    }

    async fn get_channel_by_id(&self, id: Uuid) -> StorageResult<Channel> {
        self.enter().await?;
        found(self.read().channels.get(&id))
    }

    async fn get_channel_role_by_id(&self, id: Uuid) -> StorageResult<ChannelRole> {
        self.enter().await?;
        found(self.read().channel_roles.get(&id))
    }
}
