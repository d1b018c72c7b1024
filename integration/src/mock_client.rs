use async_trait::async_trait;
use hubtest::client::{ClientFactory, EventPayload, HubClient, PartitionSender};
use hubtest::connection_string::ConnectionString;
use hubtest::discovery::PartitionSource;
use hubtest::error::HarnessError;
use hubtest::partition::PartitionId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A partition sender that records every send and close.
#[derive(Debug)]
pub struct MockPartitionSender {
    partition_id: PartitionId,
    payloads: Mutex<Vec<EventPayload>>,
    closes: AtomicUsize,
    fail_close: bool,
}

impl MockPartitionSender {
    fn new(partition_id: PartitionId, fail_close: bool) -> Self {
        MockPartitionSender {
            partition_id,
            payloads: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            fail_close,
        }
    }

    pub fn send_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<EventPayload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartitionSender for MockPartitionSender {
    fn partition_id(&self) -> &PartitionId {
        &self.partition_id
    }

    async fn send(&self, payload: EventPayload) -> Result<(), HarnessError> {
        self.payloads.lock().unwrap().push(payload);
        Ok(())
    }

    async fn close(&self) -> Result<(), HarnessError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(HarnessError::close(format!(
                "injected close failure for partition {}",
                self.partition_id
            )));
        }
        Ok(())
    }
}

/// A hub client that records default sends, sender creations and closes, with
/// optional failure injection for the close paths.
#[derive(Debug, Default)]
pub struct MockHubClient {
    senders: Mutex<Vec<Arc<MockPartitionSender>>>,
    default_sends: AtomicUsize,
    closes: AtomicUsize,
    fail_sender_closes: bool,
    fail_close: bool,
}

impl MockHubClient {
    pub fn new() -> Self {
        MockHubClient::default()
    }

    pub fn with_failing_closes() -> Self {
        MockHubClient {
            fail_sender_closes: true,
            fail_close: true,
            ..MockHubClient::default()
        }
    }

    /// Every sender created so far, in creation order.
    pub fn senders(&self) -> Vec<Arc<MockPartitionSender>> {
        self.senders.lock().unwrap().clone()
    }

    pub fn creations_for(&self, partition_id: &PartitionId) -> usize {
        self.senders
            .lock()
            .unwrap()
            .iter()
            .filter(|sender| sender.partition_id() == partition_id)
            .count()
    }

    pub fn default_send_count(&self) -> usize {
        self.default_sends.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HubClient for MockHubClient {
    async fn send(&self, _payload: EventPayload) -> Result<(), HarnessError> {
        self.default_sends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_partition_sender(
        &self,
        partition_id: &PartitionId,
    ) -> Result<Arc<dyn PartitionSender>, HarnessError> {
        let sender = Arc::new(MockPartitionSender::new(
            partition_id.clone(),
            self.fail_sender_closes,
        ));
        self.senders.lock().unwrap().push(sender.clone());
        Ok(sender)
    }

    async fn close(&self) -> Result<(), HarnessError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(HarnessError::close("injected client close failure"));
        }
        Ok(())
    }
}

/// A factory handing out one shared mock client and counting invocations.
pub struct MockClientFactory {
    client: Arc<MockHubClient>,
    creations: AtomicUsize,
}

impl MockClientFactory {
    pub fn new(client: Arc<MockHubClient>) -> Self {
        MockClientFactory {
            client,
            creations: AtomicUsize::new(0),
        }
    }

    pub fn creation_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn create_client(
        &self,
        _connection_string: &ConnectionString,
    ) -> Result<Arc<dyn HubClient>, HarnessError> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(self.client.clone())
    }
}

/// A partition source serving a fixed id list and counting fetches.
#[derive(Debug)]
pub struct MockPartitionSource {
    partition_ids: Vec<PartitionId>,
    fetches: AtomicUsize,
}

impl MockPartitionSource {
    pub fn new(partition_ids: &[&str]) -> Self {
        MockPartitionSource {
            partition_ids: partition_ids.iter().map(|id| PartitionId::from(*id)).collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartitionSource for MockPartitionSource {
    async fn fetch_partitions(&self) -> Result<Vec<PartitionId>, HarnessError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.partition_ids.clone())
    }
}
