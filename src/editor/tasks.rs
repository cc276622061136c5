// EditorTasks - handles of the fetches spawned by one editor command
//
// Commands return immediately; the fetches they trigger run on the tokio runtime and feed their
// results back through the state controller. Callers that need to observe the outcome (tests, the
// console) await `join()`; everyone else just drops the handles, which detaches the tasks.

use tokio::task::JoinHandle;

/// Fetch tasks spawned by a single editor command.
#[derive(Debug, Default)]
pub struct EditorTasks {
    handles: Vec<JoinHandle<()>>,
}

impl EditorTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every task to finish.
    ///
    /// A panicked task is logged, not propagated: its resolution event was never dispatched, so
    /// the state is exactly as if the fetch had not returned yet.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Editor fetch task failed: {}", e);
            }
        }
    }
}
