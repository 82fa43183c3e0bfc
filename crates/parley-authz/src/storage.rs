//! Data-access port consumed by the engine.
//!
//! Implementations answer plain lookups and never apply policy. A lookup
//! that matches no row must report [`StorageError::NotFound`]; everything
//! else is a backend failure.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use parley_shared::models::{
    Channel, ChannelRole, ExplicitGrant, Role, RoleAssignment, Server, Subscription,
};

use crate::error::BoxError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no rows")]
    NotFound,

    #[error("storage backend failure: {0}")]
    Backend(#[source] BoxError),
}

impl StorageError {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_server_by_id(&self, id: Uuid) -> StorageResult<Server>;

    async fn get_sub_by_id(&self, id: Uuid) -> StorageResult<Subscription>;

    async fn get_sub_by_server_and_user(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Subscription>;

    async fn get_role_by_id(&self, id: Uuid) -> StorageResult<Role>;

    /// Every role assigned to `user_id` on `server_id`. An empty list is not
    /// an error.
    async fn get_user_roles_on_server(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<Role>>;

    async fn get_role_sub_by_id(&self, id: Uuid) -> StorageResult<RoleAssignment>;

    async fn get_explicit_grant(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<ExplicitGrant>;

    async fn get_explicit_grant_by_id(&self, id: Uuid) -> StorageResult<ExplicitGrant>;

    async fn get_channel_by_id(&self, id: Uuid) -> StorageResult<Channel>;

    async fn get_channel_role_by_id(&self, id: Uuid) -> StorageResult<ChannelRole>;
}
