//! Destiny Query - interactive query editor for the Destiny activity history datasource
//!
//! Main entry point for the console application.
//!
//! # Overview
//!
//! This binary wraps the editor engine in a line-oriented console. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (daily file rotation + optional stderr output)
//! - Tokio async runtime (fetch tasks and the change listener)
//! - Query state ([`QueryStateController`]) and its driver ([`QueryEditor`])
//!
//! # Execution Flow
//!
//! 1. Load `Destiny Query Data/Destiny Query.yaml` (defaults and env overrides apply)
//! 2. Initialize logging → logs/destiny-query.<date>
//! 3. Create tokio runtime
//! 4. Create the HTTP resource fetcher and the query editor, then mount it
//! 5. Print run requests as query models while commands are read from stdin
//! 6. Log metrics, shut down the runtime with a 5s timeout

use anyhow::{Context, Result};
use destiny_query::console::{self, Flow};
use destiny_query::services::HttpResourceFetcher;
use destiny_query::{APP_NAME, ConfigManager, Query, QueryEditor, QueryStateController, VERSION};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Directory holding the editor configuration file
const CONFIG_DIR: &str = "Destiny Query Data";

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let config = config_manager.load_config()?;

    // Guard must outlive every log call
    let _log_guard = destiny_query::logging::setup_logging(&config.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("destiny-query-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    let fetcher = HttpResourceFetcher::new(&config.datasource)?;
    let controller =
        QueryStateController::with_capacity(Query::default(), config.editor.event_buffer);
    let editor = QueryEditor::new(controller, fetcher, runtime.handle().clone());

    // Print notable changes as they happen, from whichever task caused them
    let mut changes = editor.controller().subscribe();
    runtime.spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if let Some(line) = console::render_change(&change) {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Change listener lagged, {} changes skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = runtime.block_on(async {
        editor.mount().join().await;
        println!("{} v{} (type 'help' for commands)", APP_NAME, VERSION);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = std::io::stdout();

        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let command = match console::parse_command(&line) {
                Ok(command) => command,
                Err(console::ConsoleError::Empty) => continue,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            tracing::debug!(?command, "Executing console command");
            match console::execute(&editor, command, &mut stdout).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => println!("{}", e),
            }
        }
        Ok::<_, anyhow::Error>(())
    });

    tracing::info!("Console closed, shutting down");
    editor.metrics().log_summary();

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Application shutdown complete");
    result
}
