//! Data models for the query editor.
//!
//! - [`Membership`], [`SearchResult`], [`CrossSaveOverride`]: player identity as returned by profile
//!   search and as stored in a query
//! - [`CharacterItem`], [`ActivityMode`]: reference data fetched from the datasource backend
//! - [`Query`], [`QueryUpdate`], [`QueryModel`]: the edited query, partial updates to it, and the
//!   JSON shape handed to execution
//! - [`EditorConfig`]: settings loaded by [`ConfigManager`](crate::config::ConfigManager)
//!
//! All wire types derive `Serialize`/`Deserialize` with the backend's camelCase field names.

pub mod character;
pub mod config;
pub mod membership;
pub mod options;
pub mod query;

pub use character::{ActivityMode, CharacterItem};
pub use config::{DatasourceSettings, EditorConfig, EditorSettings, LoggingSettings};
pub use membership::{CrossSaveOverride, Membership, MembershipPair, SearchResult};
pub use options::SelectableOption;
pub use query::{Query, QueryModel, QueryUpdate};
