//! One decision's view of its collaborators.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::context::RequestContext;
use crate::error::{AuthzError, Result};
use crate::storage::{Storage, StorageResult};

/// Borrowed collaborators for a single decision.
///
/// Every storage call made while deciding goes through [`Session::guard`],
/// which enforces the request's deadline and cancellation token.
pub struct Session<'a> {
    storage: &'a dyn Storage,
    clock: &'a dyn Clock,
    ctx: &'a RequestContext,
}

impl<'a> Session<'a> {
    pub fn new(storage: &'a dyn Storage, clock: &'a dyn Clock, ctx: &'a RequestContext) -> Self {
        Self {
            storage,
            clock,
            ctx,
        }
    }

    pub fn storage(&self) -> &'a dyn Storage {
        self.storage
    }

    pub fn ctx(&self) -> &'a RequestContext {
        self.ctx
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run one storage call under the request's deadline and cancellation.
    ///
    /// The outer `Result` only ever carries [`AuthzError::Cancelled`] or
    /// [`AuthzError::DeadlineExceeded`]; the storage outcome is returned
    /// untouched so the caller can classify it.
    pub async fn guard<T, F>(&self, call: F) -> Result<StorageResult<T>>
    where
        F: Future<Output = StorageResult<T>>,
    {
        let budget = match self.ctx.deadline() {
            Some(deadline) => match (deadline - self.clock.now()).to_std() {
                Ok(left) if !left.is_zero() => Some(left),
                _ => return Err(AuthzError::DeadlineExceeded),
            },
            None => None,
        };

        let bounded = async move {
            match budget {
                Some(left) => tokio::time::timeout(left, call)
                    .await
                    .map_err(|_| AuthzError::DeadlineExceeded),
                None => Ok(call.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.ctx.cancellation().cancelled() => Err(AuthzError::Cancelled),
            outcome = bounded => outcome,
        }
    }
}
