use crate::client::{EventPayload, HubClient, PartitionSender};
use crate::error::{CloseScope, HarnessError};
use crate::partition::PartitionId;
use ahash::AHashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// `SenderPool` provides exactly one reusable outbound sender per partition
/// id, created on demand through the owning client.
///
/// The map lock is held across sender creation, so concurrent first access to
/// the same partition id still creates a single sender.
#[derive(Debug)]
pub struct SenderPool {
    client: Arc<dyn HubClient>,
    senders: Mutex<AHashMap<PartitionId, Arc<dyn PartitionSender>>>,
}

impl SenderPool {
    pub fn new(client: Arc<dyn HubClient>) -> Self {
        SenderPool {
            client,
            senders: Mutex::new(AHashMap::new()),
        }
    }

    /// Returns the pooled sender for `partition_id`, creating it on first use.
    pub async fn get_or_create(
        &self,
        partition_id: &PartitionId,
    ) -> Result<Arc<dyn PartitionSender>, HarnessError> {
        let mut senders = self.senders.lock().await;
        if let Some(sender) = senders.get(partition_id) {
            return Ok(sender.clone());
        }
        let sender = self.client.create_partition_sender(partition_id).await?;
        debug!(partition_id = %partition_id, "Created partition sender");
        senders.insert(partition_id.clone(), sender.clone());
        Ok(sender)
    }

    /// Sends `payload` to `partition_id` through the pooled sender. Failures
    /// are not retried.
    pub async fn send_to(
        &self,
        partition_id: &PartitionId,
        payload: EventPayload,
    ) -> Result<(), HarnessError> {
        let sender = self.get_or_create(partition_id).await?;
        sender.send(payload).await
    }

    pub async fn len(&self) -> usize {
        self.senders.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.senders.lock().await.is_empty()
    }

    /// Closes and drains every pooled sender. Best-effort: each close is
    /// attempted even when an earlier one fails, and all failures are
    /// returned. Draining makes a repeated call a no-op.
    pub async fn close_all(&self) -> Vec<(CloseScope, HarnessError)> {
        let drained: Vec<_> = self.senders.lock().await.drain().collect();
        let mut failures = Vec::new();
        for (partition_id, sender) in drained {
            if let Err(error) = sender.close().await {
                warn!(partition_id = %partition_id, %error, "Failed to close partition sender");
                failures.push((CloseScope::Sender(partition_id), error));
            }
        }
        failures
    }
}
