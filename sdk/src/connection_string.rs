use crate::error::HarnessError;
use std::str::FromStr;

const ENDPOINT_KEY: &str = "Endpoint";
const ENTITY_PATH_KEY: &str = "EntityPath";
const SAS_KEY_NAME_KEY: &str = "SharedAccessKeyName";
const SAS_KEY_KEY: &str = "SharedAccessKey";
const SAS_SIGNATURE_KEY: &str = "SharedAccessSignature";

/// `ConnectionString` is the parsed form of an event-hub connection string:
///
/// `Endpoint=sb://{host}/;SharedAccessKeyName={name};SharedAccessKey={key};EntityPath={entity}`
///
/// Credentials come in one of two mutually exclusive forms: a key name and key
/// pair, or a pre-signed `SharedAccessSignature` token. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    endpoint_host: String,
    entity_path: String,
    sas_key_name: Option<String>,
    sas_key: Option<String>,
    shared_access_signature: Option<String>,
}

impl ConnectionString {
    /// The host of the stream's metadata endpoint, without scheme or path.
    pub fn endpoint_host(&self) -> &str {
        &self.endpoint_host
    }

    /// The name of the stream entity the connection string is scoped to.
    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }

    pub fn sas_key_name(&self) -> Option<&str> {
        self.sas_key_name.as_deref()
    }

    pub fn sas_key(&self) -> Option<&str> {
        self.sas_key.as_deref()
    }

    /// The pre-signed token, present only for token-only connection strings.
    pub fn shared_access_signature(&self) -> Option<&str> {
        self.shared_access_signature.as_deref()
    }

    pub fn has_shared_access_signature(&self) -> bool {
        self.shared_access_signature.is_some()
    }
}

impl FromStr for ConnectionString {
    type Err = HarnessError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim().is_empty() {
            return Err(HarnessError::MissingConnectionString);
        }

        let mut endpoint = None;
        let mut entity_path = None;
        let mut sas_key_name = None;
        let mut sas_key = None;
        let mut shared_access_signature = None;

        for pair in input.split(';').filter(|pair| !pair.trim().is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(HarnessError::InvalidConnectionString(format!(
                    "malformed key-value pair: {pair}"
                )));
            };
            let value = value.trim();
            match key.trim() {
                ENDPOINT_KEY => endpoint = Some(value.to_string()),
                ENTITY_PATH_KEY => entity_path = Some(value.to_string()),
                SAS_KEY_NAME_KEY => sas_key_name = Some(value.to_string()),
                SAS_KEY_KEY => sas_key = Some(value.to_string()),
                SAS_SIGNATURE_KEY => shared_access_signature = Some(value.to_string()),
                // Unknown keys (OperationTimeout, TransportType, ...) are
                // transport concerns owned by the collaborator SDK.
                _ => {}
            }
        }

        let endpoint = endpoint.ok_or_else(|| {
            HarnessError::InvalidConnectionString("missing Endpoint".to_string())
        })?;
        let endpoint_host = parse_endpoint_host(&endpoint)?;
        let entity_path = entity_path.ok_or_else(|| {
            HarnessError::InvalidConnectionString("missing EntityPath".to_string())
        })?;

        match (&sas_key_name, &sas_key, &shared_access_signature) {
            (Some(_), Some(_), None) | (None, None, Some(_)) => {}
            (None, None, None) => {
                return Err(HarnessError::InvalidConnectionString(
                    "no credentials: provide SharedAccessKeyName and SharedAccessKey, or SharedAccessSignature"
                        .to_string(),
                ))
            }
            (Some(_), Some(_), Some(_)) => {
                return Err(HarnessError::InvalidConnectionString(
                    "ambiguous credentials: key pair and SharedAccessSignature are mutually exclusive"
                        .to_string(),
                ))
            }
            _ => {
                return Err(HarnessError::InvalidConnectionString(
                    "incomplete credentials: SharedAccessKeyName and SharedAccessKey must be provided together"
                        .to_string(),
                ))
            }
        }

        Ok(ConnectionString {
            endpoint_host,
            entity_path,
            sas_key_name,
            sas_key,
            shared_access_signature,
        })
    }
}

fn parse_endpoint_host(endpoint: &str) -> Result<String, HarnessError> {
    let host = endpoint
        .strip_prefix("sb://")
        .or_else(|| endpoint.strip_prefix("amqps://"))
        .or_else(|| endpoint.strip_prefix("https://"))
        .unwrap_or(endpoint)
        .trim_end_matches('/');
    if host.is_empty() {
        return Err(HarnessError::InvalidConnectionString(
            "empty Endpoint host".to_string(),
        ));
    }
    Ok(host.to_string())
}
