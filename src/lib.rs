// Destiny Query - query editor engine for a Destiny statistics datasource
//
// This is the library crate containing the query state, the reference data services and the
// async driver that connects them.
// The binary crate (main.rs) provides an interactive console on top of it.

pub mod config;
pub mod console;
pub mod editor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use editor::{QueryEditor, SearchOutcome};
pub use models::{
    CharacterItem, EditorConfig, Membership, Query, QueryModel, QueryUpdate, SelectableOption,
};
pub use state::{EditorEvent, EditorState, Effect, QueryChange, QueryStateController};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
