use crate::partition::PartitionId;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// `HarnessError` represents every failure the harness can surface to a test.
///
/// Discovery failures are wrapped at the discovery boundary together with the
/// underlying cause; send and close failures propagate unwrapped. Nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Missing connection string")]
    MissingConnectionString,
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),
    #[error("Entity does not exist: discovery returned no partitions")]
    EntityNotFound,
    #[error("Client has not been initialized, call setup first")]
    ClientNotInitialized,
    #[error("Cannot parse URL")]
    CannotParseUrl,
    #[error("Encountered error while fetching the list of partition ids: {message}")]
    Discovery {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Failed to send event: {message}")]
    Send {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Failed to close resource: {message}")]
    CloseFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Shutdown completed with {} close failure(s)", .0.len())]
    Close(Vec<(CloseScope, HarnessError)>),
}

/// The resource a close failure originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseScope {
    Sender(PartitionId),
    Client,
}

impl HarnessError {
    pub fn discovery(message: impl Into<String>) -> Self {
        HarnessError::Discovery {
            message: message.into(),
            source: None,
        }
    }

    pub fn discovery_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        HarnessError::Discovery {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn send(message: impl Into<String>) -> Self {
        HarnessError::Send {
            message: message.into(),
            source: None,
        }
    }

    pub fn send_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        HarnessError::Send {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn close(message: impl Into<String>) -> Self {
        HarnessError::CloseFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn close_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        HarnessError::CloseFailed {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
