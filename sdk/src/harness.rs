use crate::auth::{SasTokenProvider, StaticTokenProvider};
use crate::client::{ClientFactory, EventPayload, HubClient};
use crate::config::HarnessConfig;
use crate::connection_string::ConnectionString;
use crate::discovery::{AtomFeedSource, PartitionDirectory, PartitionMode, PartitionSource};
use crate::error::{CloseScope, HarnessError};
use crate::partition::PartitionId;
use crate::pool::SenderPool;
use std::sync::Arc;
use tracing::info;

/// `EventHubHarness` is the per-fixture owner of everything a sending test
/// needs: the resolved configuration, the partition directory and the sender
/// pool. One instance per fixture; the client connection is built only by the
/// full `setup` path.
pub struct EventHubHarness {
    config: HarnessConfig,
    directory: PartitionDirectory,
    client: Option<Arc<dyn HubClient>>,
    pool: Option<SenderPool>,
}

impl EventHubHarness {
    /// Builds a harness for a token-only connection string, wiring discovery
    /// through a `StaticTokenProvider`.
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        let token_provider = StaticTokenProvider::from_connection_string(config.connection_string())?;
        Self::with_token_provider(config, Arc::new(token_provider))
    }

    /// Builds a harness with an explicit token provider, for key-based
    /// connection strings whose signer lives in the collaborator SDK.
    pub fn with_token_provider(
        config: HarnessConfig,
        token_provider: Arc<dyn SasTokenProvider>,
    ) -> Result<Self, HarnessError> {
        let source = AtomFeedSource::new(&config.stream_identity(), token_provider)?;
        Ok(Self::with_partition_source(config, Arc::new(source)))
    }

    /// Builds a harness over an explicit partition source.
    pub fn with_partition_source(
        config: HarnessConfig,
        source: Arc<dyn PartitionSource>,
    ) -> Self {
        EventHubHarness {
            config,
            directory: PartitionDirectory::new(source),
            client: None,
            pool: None,
        }
    }

    /// Resolves the partition ids and builds the client connection that all
    /// senders are created from.
    pub async fn setup(
        &mut self,
        mode: PartitionMode,
        factory: &dyn ClientFactory,
    ) -> Result<Vec<PartitionId>, HarnessError> {
        let partition_ids = self.setup_without_senders(mode).await?;
        let client = factory
            .create_client(self.config.connection_string())
            .await?;
        self.pool = Some(SenderPool::new(client.clone()));
        self.client = Some(client);
        info!(entity = self.hub_name(), "Harness initialized with client");
        Ok(partition_ids)
    }

    /// Resolves the partition ids without building a client; send operations
    /// fail with `ClientNotInitialized` until `setup` runs.
    pub async fn setup_without_senders(
        &self,
        mode: PartitionMode,
    ) -> Result<Vec<PartitionId>, HarnessError> {
        self.directory.resolve(mode).await
    }

    /// Sends one event to `partition_id` through the pooled sender, creating
    /// the sender on first use.
    pub async fn send_to_partition(
        &self,
        partition_id: &PartitionId,
        payload: impl Into<EventPayload>,
    ) -> Result<(), HarnessError> {
        let pool = self.pool.as_ref().ok_or(HarnessError::ClientNotInitialized)?;
        pool.send_to(partition_id, payload.into()).await
    }

    /// Sends one event to the stream's default, unpartitioned destination.
    pub async fn send_to_any(&self, payload: impl Into<EventPayload>) -> Result<(), HarnessError> {
        let client = self
            .client
            .as_ref()
            .ok_or(HarnessError::ClientNotInitialized)?;
        client.send(payload.into()).await
    }

    /// Sends `count` independent copies of `payload`, one event per send, no
    /// batching.
    pub async fn send_to_any_n(
        &self,
        payload: EventPayload,
        count: u32,
    ) -> Result<(), HarnessError> {
        for _ in 0..count {
            self.send_to_any(payload.clone()).await?;
        }
        Ok(())
    }

    /// Closes every pooled sender, then the client connection if one was
    /// created. Best-effort: all close failures are collected and surfaced
    /// together. Safe to call repeatedly.
    pub async fn shutdown(&mut self) -> Result<(), HarnessError> {
        let mut failures = match &self.pool {
            Some(pool) => pool.close_all().await,
            None => Vec::new(),
        };
        self.pool = None;
        if let Some(client) = self.client.take() {
            if let Err(error) = client.close().await {
                failures.push((CloseScope::Client, error));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::Close(failures))
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn connection_string(&self) -> &ConnectionString {
        self.config.connection_string()
    }

    pub fn hub_name(&self) -> &str {
        self.config.connection_string().entity_path()
    }

    pub fn consumer_group(&self) -> &str {
        self.config.consumer_group()
    }
}
