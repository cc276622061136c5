//! Reference data access.
//!
//! The host supplies raw JSON through [`ResourceFetcher`]; [`ReferenceDataClient`] decodes it into
//! search results, characters and activity modes.

use crate::models::{ActivityMode, CharacterItem, Membership, SearchResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Resources exposed by the datasource backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceName {
    ProfileSearch,
    ListCharacters,
    ListActivityModes,
}

/// HTTP verb a resource is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceMethod {
    Get,
    Post,
}

impl ResourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfileSearch => "profile-search",
            Self::ListCharacters => "list-characters",
            Self::ListActivityModes => "list-activity-modes",
        }
    }

    pub fn method(&self) -> ResourceMethod {
        match self {
            Self::ProfileSearch | Self::ListCharacters => ResourceMethod::Post,
            Self::ListActivityModes => ResourceMethod::Get,
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against a backend resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    pub name: ResourceName,
    pub payload: Option<Value>,
}

impl ResourceRequest {
    pub fn get(name: ResourceName) -> Self {
        Self {
            name,
            payload: None,
        }
    }

    pub fn post(name: ResourceName, payload: Value) -> Self {
        Self {
            name,
            payload: Some(payload),
        }
    }
}

/// Errors that can occur while fetching reference data
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {resource} failed: {message}")]
    Transport {
        resource: ResourceName,
        message: String,
    },

    #[error("Resource {resource} responded with status {status}")]
    Status { resource: ResourceName, status: u16 },

    #[error("Malformed {resource} payload: {source}")]
    Malformed {
        resource: ResourceName,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request to {resource} timed out after {timeout:?}")]
    Timeout {
        resource: ResourceName,
        timeout: Duration,
    },
}

impl FetchError {
    pub fn resource(&self) -> ResourceName {
        match self {
            Self::Transport { resource, .. }
            | Self::Status { resource, .. }
            | Self::Malformed { resource, .. }
            | Self::Timeout { resource, .. } => *resource,
        }
    }
}

/// Resource-fetch capability supplied by the host.
///
/// Implementations return the raw JSON body; [`ReferenceDataClient`] owns decoding.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_resource(&self, request: ResourceRequest) -> Result<Value, FetchError>;
}

/// Typed access to the three reference collections.
///
/// Every call returns a fresh collection and touches no shared state.
pub struct ReferenceDataClient<F> {
    fetcher: F,
}

impl<F: ResourceFetcher> ReferenceDataClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn search_profiles(&self, text: &str) -> Result<Vec<SearchResult>, FetchError> {
        let request = ResourceRequest::post(ResourceName::ProfileSearch, json!({ "query": text }));
        self.fetch(request).await
    }

    pub async fn list_characters(
        &self,
        profile: &Membership,
    ) -> Result<Vec<CharacterItem>, FetchError> {
        let payload = serde_json::to_value(profile.pair()).map_err(|source| {
            FetchError::Malformed {
                resource: ResourceName::ListCharacters,
                source,
            }
        })?;
        self.fetch(ResourceRequest::post(ResourceName::ListCharacters, payload))
            .await
    }

    pub async fn list_activity_modes(&self) -> Result<Vec<ActivityMode>, FetchError> {
        self.fetch(ResourceRequest::get(ResourceName::ListActivityModes))
            .await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: ResourceRequest,
    ) -> Result<Vec<T>, FetchError> {
        let resource = request.name;
        tracing::debug!(%resource, "Fetching resource");

        let body = self.fetcher.fetch_resource(request).await?;

        // The search backend answers `null` rather than `[]` when nothing matches
        if body.is_null() {
            return Ok(Vec::new());
        }

        let items: Vec<T> = serde_json::from_value(body)
            .map_err(|source| FetchError::Malformed { resource, source })?;

        tracing::debug!(%resource, count = items.len(), "Fetched resource");
        Ok(items)
    }
}
