//! Handling of cash settlements that fail after delivery.
//!
//! A delivered order always stays delivered. When confirming its cash
//! payment fails, the failure is handed to a [`SettlementFailureHook`] so
//! it can be retried later instead of being lost.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, OrderId};
use domain::ErrorKind;
use tokio::sync::RwLock;

/// A cash confirmation that did not go through.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementFailure {
    pub order_id: OrderId,

    /// Who reported the delivery, used as the confirmer on retry.
    pub confirmer: Option<AccountId>,

    pub kind: ErrorKind,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}

/// Receives settlement failures. Implementations must not fail.
#[async_trait]
pub trait SettlementFailureHook: Send + Sync {
    async fn on_failure(&self, failure: SettlementFailure);
}

/// Default hook: the failure is only logged by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyHook;

#[async_trait]
impl SettlementFailureHook for LogOnlyHook {
    async fn on_failure(&self, failure: SettlementFailure) {
        tracing::debug!(order_id = %failure.order_id, "settlement failure dropped");
    }
}

/// Keeps failures in memory until they are drained for retry.
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetryQueue {
    pending: Arc<RwLock<Vec<SettlementFailure>>>,
}

impl InMemoryRetryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pending(&self) -> Vec<SettlementFailure> {
        self.pending.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.pending.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.read().await.is_empty()
    }

    /// Removes and returns every queued failure, oldest first.
    pub async fn drain(&self) -> Vec<SettlementFailure> {
        std::mem::take(&mut *self.pending.write().await)
    }
}

#[async_trait]
impl SettlementFailureHook for InMemoryRetryQueue {
    async fn on_failure(&self, failure: SettlementFailure) {
        self.pending.write().await.push(failure);
    }
}
