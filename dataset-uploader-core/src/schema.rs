//! Fetching dataclass schemas and validating metadata against them.

use crate::contract::{SchemaFetchError, SchemaRegistry};
use crate::metadata::MetadataDocument;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

/// Schema registry reached over HTTP: `GET {base_url}/{dataclass}`.
pub struct HttpSchemaRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSchemaRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        info!(base_url = %base_url, "Initialized HttpSchemaRegistry");
        Self { client, base_url }
    }

    pub fn schema_url(&self, dataclass: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), dataclass)
    }
}

#[async_trait]
impl SchemaRegistry for HttpSchemaRegistry {
    async fn fetch_schema(&self, dataclass: &str) -> Result<Value, SchemaFetchError> {
        let url = self.schema_url(dataclass);
        info!(url = %url, dataclass, "Fetching schema for dataclass");

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Schema service request failed");
            SchemaFetchError::Unreachable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), url = %url, "Schema service returned an error status");
            return Err(SchemaFetchError::Unavailable {
                status: Some(status.as_u16()),
                reason: format!("unexpected status {status}"),
            });
        }

        let schema = response.json::<Value>().await.map_err(|e| {
            error!(error = ?e, url = %url, "Schema response body is not JSON");
            SchemaFetchError::Unavailable {
                status: Some(status.as_u16()),
                reason: e.to_string(),
            }
        })?;

        debug!(dataclass, "Schema fetched");
        Ok(schema)
    }
}

/// Validate the whole document against `schema` in a single pass.
///
/// Returns every violation message on failure. A schema that does not compile
/// is treated as a failed validation.
pub fn validate_metadata(document: &MetadataDocument, schema: &Value) -> Result<(), Vec<String>> {
    let compiled = jsonschema::JSONSchema::compile(schema).map_err(|e| {
        error!(error = %e, "Schema failed to compile");
        vec![format!("invalid schema: {e}")]
    })?;

    let instance = document.to_value();
    let result = match compiled.validate(&instance) {
        Ok(()) => Ok(()),
        Err(errors) => Err(errors
            .map(|e| format!("{} (at {})", e, e.instance_path))
            .collect::<Vec<_>>()),
    };

    if let Err(violations) = &result {
        for violation in violations {
            debug!(violation = %violation, "Schema violation");
        }
        info!(count = violations.len(), "Metadata failed schema validation");
    }
    result
}
