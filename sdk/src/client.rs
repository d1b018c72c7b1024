use crate::connection_string::ConnectionString;
use crate::error::HarnessError;
use crate::partition::PartitionId;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::sync::Arc;

/// `EventPayload` is the opaque body of a single test event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPayload(Bytes);

impl EventPayload {
    pub fn new(bytes: Bytes) -> Self {
        EventPayload(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for EventPayload {
    fn from(bytes: Bytes) -> Self {
        EventPayload(bytes)
    }
}

impl From<Vec<u8>> for EventPayload {
    fn from(bytes: Vec<u8>) -> Self {
        EventPayload(Bytes::from(bytes))
    }
}

impl From<&str> for EventPayload {
    fn from(body: &str) -> Self {
        EventPayload(Bytes::copy_from_slice(body.as_bytes()))
    }
}

impl From<String> for EventPayload {
    fn from(body: String) -> Self {
        EventPayload(Bytes::from(body.into_bytes()))
    }
}

/// The collaborator client connection owning all senders for one stream.
/// Transport, authentication signing and serialization are the collaborator's
/// concern; every call is awaited to completion.
#[async_trait]
pub trait HubClient: Send + Sync + Debug {
    /// Sends a single event to the stream's default, unpartitioned destination.
    async fn send(&self, payload: EventPayload) -> Result<(), HarnessError>;

    /// Creates a new outbound sender bound to exactly one partition.
    async fn create_partition_sender(
        &self,
        partition_id: &PartitionId,
    ) -> Result<Arc<dyn PartitionSender>, HarnessError>;

    /// Closes the connection and releases its resources.
    async fn close(&self) -> Result<(), HarnessError>;
}

/// An open outbound channel bound to exactly one partition.
#[async_trait]
pub trait PartitionSender: Send + Sync + Debug {
    fn partition_id(&self) -> &PartitionId;

    async fn send(&self, payload: EventPayload) -> Result<(), HarnessError>;

    async fn close(&self) -> Result<(), HarnessError>;
}

/// `ClientFactory` builds a `HubClient` from a connection string. Tests inject
/// mock factories; production code wraps the real SDK here.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create_client(
        &self,
        connection_string: &ConnectionString,
    ) -> Result<Arc<dyn HubClient>, HarnessError>;
}
