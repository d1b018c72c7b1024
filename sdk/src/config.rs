use crate::connection_string::ConnectionString;
use crate::error::HarnessError;
use std::env;

/// The environment variable holding the stream's connection string.
pub const CONNECTION_STRING_ENV: &str = "EVENT_HUB_CONNECTION_STRING";
/// The environment variable optionally overriding the consumer group.
pub const CONSUMER_GROUP_ENV: &str = "EVENT_HUB_CONSUMER_GROUP";
/// The well-known default consumer group every stream starts with.
pub const DEFAULT_CONSUMER_GROUP: &str = "$Default";

/// `HarnessConfig` carries every setting the harness needs. It is an explicit
/// value passed into the fixture constructor; the harness keeps no
/// process-wide mutable state.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    connection_string: ConnectionString,
    consumer_group: String,
}

impl HarnessConfig {
    pub fn new(connection_string: ConnectionString) -> Self {
        HarnessConfig {
            connection_string,
            consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
        }
    }

    pub fn with_consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = consumer_group.into();
        self
    }

    /// Builds the configuration from the recognized environment variables.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HarnessError> {
        let connection_string = lookup(CONNECTION_STRING_ENV)
            .ok_or(HarnessError::MissingConnectionString)?
            .parse::<ConnectionString>()?;
        let consumer_group =
            lookup(CONSUMER_GROUP_ENV).unwrap_or_else(|| DEFAULT_CONSUMER_GROUP.to_string());
        Ok(HarnessConfig {
            connection_string,
            consumer_group,
        })
    }

    pub fn connection_string(&self) -> &ConnectionString {
        &self.connection_string
    }

    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }

    /// The resolved identity of the stream this configuration points at.
    pub fn stream_identity(&self) -> StreamIdentity {
        StreamIdentity {
            host: self.connection_string.endpoint_host().to_string(),
            entity: self.connection_string.entity_path().to_string(),
            consumer_group: self.consumer_group.clone(),
        }
    }
}

/// `StreamIdentity` is the resolved coordinate of one stream: endpoint host,
/// entity name and consumer group. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamIdentity {
    pub host: String,
    pub entity: String,
    pub consumer_group: String,
}
