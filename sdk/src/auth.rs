use crate::connection_string::ConnectionString;
use crate::error::HarnessError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// `SasTokenProvider` produces a time-boxed signed authorization token scoped
/// to one resource URI. The signing algorithm itself lives in the collaborator
/// SDK; this trait is the seam the discovery pipeline authenticates through.
#[async_trait]
pub trait SasTokenProvider: Send + Sync + Debug {
    async fn token(&self, resource_uri: &str, validity: Duration) -> Result<String, HarnessError>;
}

/// `StaticTokenProvider` serves a pre-signed shared access signature, the
/// token-only authentication form where the connection string carries a
/// `SharedAccessSignature` instead of a key pair. The resource scope and
/// validity window are fixed at signing time, so both arguments are ignored.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    signature: String,
}

impl StaticTokenProvider {
    pub fn new(signature: impl Into<String>) -> Self {
        StaticTokenProvider {
            signature: signature.into(),
        }
    }

    pub fn from_connection_string(
        connection_string: &ConnectionString,
    ) -> Result<Self, HarnessError> {
        let signature = connection_string.shared_access_signature().ok_or_else(|| {
            HarnessError::InvalidConnectionString(
                "connection string carries no SharedAccessSignature".to_string(),
            )
        })?;
        Ok(StaticTokenProvider::new(signature))
    }
}

#[async_trait]
impl SasTokenProvider for StaticTokenProvider {
    async fn token(
        &self,
        _resource_uri: &str,
        _validity: Duration,
    ) -> Result<String, HarnessError> {
        Ok(self.signature.clone())
    }
}
