// Editor metrics module
//
// Lightweight counters for fetch traffic and query changes, logged when the editor shuts down

use crate::services::ResourceName;
use crate::state::QueryChange;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Editor metrics
///
/// Uses atomic operations so fetch tasks can record without locks.
#[derive(Debug)]
pub struct EditorMetrics {
    /// Profile searches sent to the backend
    pub searches_issued: AtomicU64,

    /// Character list fetches sent to the backend
    pub character_fetches: AtomicU64,

    /// Activity catalog fetches sent to the backend
    pub activity_mode_fetches: AtomicU64,

    /// Fetches that failed (transport, status, or payload)
    pub fetch_failures: AtomicU64,

    /// Responses dropped because a newer request or profile superseded them
    pub stale_responses: AtomicU64,

    /// `QueryChanged` events emitted
    pub query_changes: AtomicU64,

    /// `RunRequested` events emitted
    pub run_requests: AtomicU64,

    start_time: Instant,
}

impl EditorMetrics {
    pub fn new() -> Self {
        Self {
            searches_issued: AtomicU64::new(0),
            character_fetches: AtomicU64::new(0),
            activity_mode_fetches: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            stale_responses: AtomicU64::new(0),
            query_changes: AtomicU64::new(0),
            run_requests: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a fetch sent to `resource`
    pub fn record_fetch(&self, resource: ResourceName) {
        let counter = match resource {
            ResourceName::ProfileSearch => &self.searches_issued,
            ResourceName::ListCharacters => &self.character_fetches,
            ResourceName::ListActivityModes => &self.activity_mode_fetches,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count the events of one dispatch
    pub fn record_changes(&self, changes: &[QueryChange]) {
        for change in changes {
            let counter = match change {
                QueryChange::QueryChanged(_) => &self.query_changes,
                QueryChange::RunRequested(_) => &self.run_requests,
                QueryChange::FetchFailed { .. } => &self.fetch_failures,
                QueryChange::StaleResponseDiscarded { .. } => &self.stale_responses,
                _ => continue,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn total_fetches(&self) -> u64 {
        self.searches_issued.load(Ordering::Relaxed)
            + self.character_fetches.load(Ordering::Relaxed)
            + self.activity_mode_fetches.load(Ordering::Relaxed)
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Editor Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Fetches: {} searches, {} character lists, {} activity catalogs ({} failed, {} stale)",
            self.searches_issued.load(Ordering::Relaxed),
            self.character_fetches.load(Ordering::Relaxed),
            self.activity_mode_fetches.load(Ordering::Relaxed),
            self.fetch_failures.load(Ordering::Relaxed),
            self.stale_responses.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Query changes: {}, run requests: {}",
            self.query_changes.load(Ordering::Relaxed),
            self.run_requests.load(Ordering::Relaxed)
        );
    }
}

impl Default for EditorMetrics {
    fn default() -> Self {
        Self::new()
    }
}
