//! Services module - reference data access and the rules that keep a query consistent with it.
//!
//! The services are **framework-agnostic**: nothing here knows about the editor's state container
//! or the console, so every piece can be tested on its own.
//!
//! # Components
//!
//! - [`ReferenceDataClient`]: typed access to the backend's `profile-search`, `list-characters`
//!   and `list-activity-modes` resources through a host-supplied [`ResourceFetcher`]
//! - [`HttpResourceFetcher`]: the HTTP implementation of that capability
//! - [`ProfileSearchResolver`]: dedups search results by Bungie name and resolves cross-save
//!   identities into canonical memberships
//! - [`CharacterListSynchronizer`]: tracks the character list of the current profile, rejects
//!   stale responses and keeps the character selection valid
//!
//! # Failure model
//!
//! Fetch failures are returned as [`FetchError`]. Callers leave the affected collection as it was
//! and report the error; nothing in this layer panics on bad backend data.

pub mod character_sync;
pub mod http_fetcher;
pub mod profile_search;
pub mod reference_data;

pub use character_sync::{CharacterList, CharacterListSynchronizer, SyncOutcome, reconcile_selection};
pub use http_fetcher::HttpResourceFetcher;
pub use profile_search::{ProfileSearchResolver, resolve_search_results};
pub use reference_data::{
    FetchError, ReferenceDataClient, ResourceFetcher, ResourceMethod, ResourceName, ResourceRequest,
};
