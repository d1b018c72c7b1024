use crate::auth::SasTokenProvider;
use crate::config::StreamIdentity;
use crate::error::HarnessError;
use crate::partition::PartitionId;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Validity window of the authorization token requested for one discovery call.
pub const DISCOVERY_TOKEN_VALIDITY: Duration = Duration::from_secs(20 * 60);

const ATOM_CONTENT_TYPE: &str = "application/atom+xml;type=entry";

/// How the partition set of a stream is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMode {
    /// Synthesize `count` numbered partition ids without any network access.
    Synthetic(u32),
    /// Query the stream's metadata endpoint, at most once per directory.
    Query,
}

/// A source of the authoritative partition id list for one stream.
#[async_trait]
pub trait PartitionSource: Send + Sync {
    async fn fetch_partitions(&self) -> Result<Vec<PartitionId>, HarnessError>;
}

/// `PartitionDirectory` resolves the set of partition ids for a stream.
///
/// Synthetic resolution is pure and recomputed on every call; query resolution
/// goes through the `PartitionSource` exactly once per directory instance and
/// memoizes the result in a single-initialization cell, so the two modes never
/// share state. Once the cell is populated it is never recomputed or mutated.
pub struct PartitionDirectory {
    source: Arc<dyn PartitionSource>,
    cached: OnceCell<Vec<PartitionId>>,
}

impl PartitionDirectory {
    pub fn new(source: Arc<dyn PartitionSource>) -> Self {
        PartitionDirectory {
            source,
            cached: OnceCell::new(),
        }
    }

    /// Returns the sequence `["0", "1", ..., str(count - 1)]`.
    pub fn synthetic(count: u32) -> Vec<PartitionId> {
        (0..count).map(|i| PartitionId::from(i.to_string())).collect()
    }

    pub async fn resolve(&self, mode: PartitionMode) -> Result<Vec<PartitionId>, HarnessError> {
        match mode {
            PartitionMode::Synthetic(count) => Ok(Self::synthetic(count)),
            PartitionMode::Query => self
                .cached
                .get_or_try_init(|| async {
                    let partition_ids = self.source.fetch_partitions().await?;
                    if partition_ids.is_empty() {
                        return Err(HarnessError::EntityNotFound);
                    }
                    info!(
                        partitions = partition_ids.len(),
                        "Discovered stream partitions"
                    );
                    Ok(partition_ids)
                })
                .await
                .cloned(),
        }
    }
}

/// `AtomFeedSource` is the production `PartitionSource`: it issues an
/// authorized GET against the stream's metadata endpoint and reads the
/// partition ids out of the returned Atom feed.
///
/// The request contract: resource path
/// `{base}/{entity}/consumergroups/{group}/partitions`, an `Authorization`
/// header holding a signed token scoped to that exact path, and
/// `Content-Type: application/atom+xml;type=entry` with a utf-8 charset.
pub struct AtomFeedSource {
    resource_url: Url,
    token_provider: Arc<dyn SasTokenProvider>,
    client: reqwest::Client,
}

impl AtomFeedSource {
    pub fn new(
        identity: &StreamIdentity,
        token_provider: Arc<dyn SasTokenProvider>,
    ) -> Result<Self, HarnessError> {
        let base = format!("https://{}", identity.host);
        Self::with_endpoint(&base, identity, token_provider)
    }

    /// Builds a source against an explicit base URL, overriding the https
    /// endpoint derived from the stream identity. Used by tests.
    pub fn with_endpoint(
        base_url: &str,
        identity: &StreamIdentity,
        token_provider: Arc<dyn SasTokenProvider>,
    ) -> Result<Self, HarnessError> {
        let resource_url = Url::parse(&format!(
            "{}/{}/consumergroups/{}/partitions",
            base_url.trim_end_matches('/'),
            identity.entity,
            identity.consumer_group
        ))
        .map_err(|_| HarnessError::CannotParseUrl)?;
        Ok(AtomFeedSource {
            resource_url,
            token_provider,
            client: reqwest::Client::new(),
        })
    }

    pub fn resource_url(&self) -> &Url {
        &self.resource_url
    }
}

#[async_trait]
impl PartitionSource for AtomFeedSource {
    async fn fetch_partitions(&self) -> Result<Vec<PartitionId>, HarnessError> {
        let token = self
            .token_provider
            .token(self.resource_url.as_str(), DISCOVERY_TOKEN_VALIDITY)
            .await
            .map_err(|error| {
                HarnessError::discovery_with("cannot obtain an authorization token", error)
            })?;
        debug!(url = %self.resource_url, "Fetching partition metadata");
        let response = self
            .client
            .get(self.resource_url.clone())
            .header(AUTHORIZATION, token)
            .header(CONTENT_TYPE, ATOM_CONTENT_TYPE)
            .header("charset", "utf-8")
            .send()
            .await
            .map_err(|error| {
                HarnessError::discovery_with("metadata endpoint request failed", error)
            })?
            .error_for_status()
            .map_err(|error| {
                HarnessError::discovery_with("metadata endpoint returned an error status", error)
            })?;
        let body = response.text().await.map_err(|error| {
            HarnessError::discovery_with("cannot read metadata response body", error)
        })?;
        parse_partition_ids(&body)
    }
}

/// Extracts the text of every `feed/entry/title` element, in document order.
fn parse_partition_ids(feed: &str) -> Result<Vec<PartitionId>, HarnessError> {
    let document = roxmltree::Document::parse(feed)
        .map_err(|error| HarnessError::discovery_with("malformed Atom feed", error))?;
    let root = document.root_element();
    if root.tag_name().name() != "feed" {
        return Err(HarnessError::discovery(format!(
            "expected an Atom feed, got <{}>",
            root.tag_name().name()
        )));
    }
    let partition_ids = root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "entry")
        .flat_map(|entry| {
            entry
                .children()
                .filter(|node| node.is_element() && node.tag_name().name() == "title")
        })
        .filter_map(|title| title.text())
        .map(|id| PartitionId::from(id.trim()))
        .collect();
    Ok(partition_ids)
}
