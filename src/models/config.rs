use serde::{Deserialize, Serialize};

/// Editor configuration from `Destiny Query.yaml`
///
/// Every section falls back to its defaults when missing, so a partial file (or none at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub datasource: DatasourceSettings,

    #[serde(default)]
    pub editor: EditorSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the datasource backend's resource handlers live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceSettings {
    /// Base URL of the resources endpoint; resource names are appended to it
    #[serde(default = "default_resource_base_url")]
    pub resource_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DatasourceSettings {
    fn default() -> Self {
        Self {
            resource_base_url: default_resource_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Capacity of the query change broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default)]
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            debug_mode: false,
            console_output: false,
        }
    }
}

fn default_resource_base_url() -> String {
    "http://localhost:3000/api/datasources/uid/destiny/resources".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_event_buffer() -> usize {
    100
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "destiny-query".to_string()
}
