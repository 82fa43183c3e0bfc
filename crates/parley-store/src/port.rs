//! SQLite implementation of the engine's [`Storage`] port.
//!
//! The connection is shared behind a `std::sync::Mutex`; each lookup runs on
//! the blocking pool so the async decision path never waits on SQLite
//! directly.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use parley_authz::storage::{Storage, StorageError, StorageResult};
use parley_shared::models::{
    Channel, ChannelRole, ExplicitGrant, Role, RoleAssignment, Server, Subscription,
};

use crate::database::Database;
use crate::error::{Result, StoreError};

#[derive(Clone)]
pub struct SqliteStorage {
    db: Arc<Mutex<Database>>,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Shared handle to the database, for writers living next to the engine.
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let outcome = tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| {
            tracing::error!(op, error = %e, "storage task failed");
            StorageError::backend(e)
        })?;

        outcome.map_err(|e| match e {
            StoreError::NotFound => StorageError::NotFound,
            other => {
                tracing::warn!(op, error = %other, "storage lookup failed");
                StorageError::backend(other)
            }
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_server_by_id(&self, id: Uuid) -> StorageResult<Server> {
        self.run("get_server_by_id", move |db| db.get_server(id)).await
    }

    async fn get_sub_by_id(&self, id: Uuid) -> StorageResult<Subscription> {
        self.run("get_sub_by_id", move |db| db.get_sub(id)).await
    }

    async fn get_sub_by_server_and_user(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Subscription> {
        self.run("get_sub_by_server_and_user", move |db| {
            db.get_sub_by_server_and_user(server_id, user_id)
        })
        .await
    }

    async fn get_role_by_id(&self, id: Uuid) -> StorageResult<Role> {
        self.run("get_role_by_id", move |db| db.get_role(id)).await
    }

    async fn get_user_roles_on_server(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<Role>> {
        self.run("get_user_roles_on_server", move |db| {
            db.get_user_roles_on_server(server_id, user_id)
        })
        .await
    }

    async fn get_role_sub_by_id(&self, id: Uuid) -> StorageResult<RoleAssignment> {
        self.run("get_role_sub_by_id", move |db| db.get_role_sub(id)).await
    }

    async fn get_explicit_grant(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<ExplicitGrant> {
        self.run("get_explicit_grant", move |db| {
            db.get_explicit_grant(server_id, user_id)
        })
        .await
    }

    async fn get_explicit_grant_by_id(&self, id: Uuid) -> StorageResult<ExplicitGrant> {
        self.run("get_explicit_grant_by_id", move |db| {
            db.get_explicit_grant_by_id(id)
        })
        .await
    }

    async fn get_channel_by_id(&self, id: Uuid) -> StorageResult<Channel> {
        self.run("get_channel_by_id", move |db| db.get_channel(id)).await
    }

    async fn get_channel_role_by_id(&self, id: Uuid) -> StorageResult<ChannelRole> {
        self.run("get_channel_role_by_id", move |db| db.get_channel_role(id))
            .await
    }
}
