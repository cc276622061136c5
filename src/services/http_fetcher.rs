use super::reference_data::{FetchError, ResourceFetcher, ResourceMethod, ResourceRequest};
use crate::models::DatasourceSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// [`ResourceFetcher`] that calls the datasource backend's resource handlers over HTTP.
///
/// Requests go to `<resource_base_url>/<resource-name>`. Timeouts are enforced here; the editor
/// itself never cancels a request, it only ignores stale answers.
pub struct HttpResourceFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpResourceFetcher {
    pub fn new(settings: &DatasourceSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.resource_base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn resource_url(&self, request: &ResourceRequest) -> String {
        format!("{}/{}", self.base_url, request.name.as_str())
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch_resource(&self, request: ResourceRequest) -> Result<Value, FetchError> {
        let resource = request.name;
        let url = self.resource_url(&request);

        let builder = match resource.method() {
            ResourceMethod::Get => self.client.get(&url),
            ResourceMethod::Post => {
                let payload = request.payload.unwrap_or(Value::Null);
                self.client.post(&url).json(&payload)
            }
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    resource,
                    timeout: self.timeout,
                }
            } else {
                FetchError::Transport {
                    resource,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%resource, status = status.as_u16(), "Resource call rejected");
            return Err(FetchError::Status {
                resource,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            resource,
            message: e.to_string(),
        })?;

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Malformed { resource, source })
    }
}
