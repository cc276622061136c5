// Query editor driver - connects the state controller to the reference data backend
//
// This module contains the QueryEditor which coordinates between:
// - QueryStateController (query state and change events)
// - ReferenceDataClient (backend resources)
// - EditorMetrics (fetch and change counters)
//
// Commands are dispatched synchronously into the controller. The effects they produce are run
// as tokio tasks, and each task dispatches its resolution event back into the controller, where
// stale responses are rejected.

use super::tasks::EditorTasks;
use crate::metrics::EditorMetrics;
use crate::models::{Membership, QueryUpdate, SelectableOption};
use crate::services::{ProfileSearchResolver, ReferenceDataClient, ResourceFetcher, ResourceName};
use crate::state::{Dispatch, EditorEvent, Effect, QueryChange, QueryStateController};
use std::collections::VecDeque;
use std::sync::Arc;

/// Outcome of a typeahead search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// This search was the latest one; its options are now the visible ones
    Resolved(Vec<SelectableOption<Membership>>),

    /// A newer search was issued before this one returned
    Superseded,

    /// The search failed; the visible options are unchanged
    Failed(String),
}

/// Query editor: the state controller plus the machinery to fetch its reference data
///
/// # Example
/// ```ignore
/// let fetcher = HttpResourceFetcher::new(&config.datasource)?;
/// let editor = QueryEditor::new(QueryStateController::default(), fetcher, runtime.handle().clone());
///
/// editor.mount();
/// if let SearchOutcome::Resolved(options) = editor.search_profiles("Foo").await {
///     editor.update(QueryUpdate::profile(options[0].value.clone())).join().await;
/// }
/// ```
pub struct QueryEditor<F: ResourceFetcher + 'static> {
    runner: EffectRunner<F>,

    /// Handle to the tokio runtime for spawning fetch tasks
    tokio_handle: tokio::runtime::Handle,
}

impl<F: ResourceFetcher + 'static> QueryEditor<F> {
    pub fn new(
        controller: QueryStateController,
        fetcher: F,
        tokio_handle: tokio::runtime::Handle,
    ) -> Self {
        Self {
            runner: EffectRunner {
                controller,
                client: Arc::new(ReferenceDataClient::new(fetcher)),
                resolver: ProfileSearchResolver::new(),
                metrics: Arc::new(EditorMetrics::new()),
            },
            tokio_handle,
        }
    }

    pub fn controller(&self) -> &QueryStateController {
        &self.runner.controller
    }

    pub fn metrics(&self) -> Arc<EditorMetrics> {
        Arc::clone(&self.runner.metrics)
    }

    /// Load the activity catalog, plus the characters of a profile the query already has.
    pub fn mount(&self) -> EditorTasks {
        tracing::info!("Mounting query editor");
        let dispatch = self.runner.dispatch(EditorEvent::Mounted);
        self.spawn_effects(dispatch.effects)
    }

    /// Merge a partial query; a profile change starts a character fetch.
    pub fn update(&self, update: QueryUpdate) -> EditorTasks {
        let dispatch = self.runner.dispatch(EditorEvent::QueryUpdated(update));
        self.spawn_effects(dispatch.effects)
    }

    pub fn set_character_selected(&self, character_id: &str, selected: bool) -> EditorTasks {
        let dispatch = self.runner.dispatch(EditorEvent::CharacterToggled {
            character_id: character_id.to_string(),
            selected,
        });
        self.spawn_effects(dispatch.effects)
    }

    /// Fire-and-forget search; the result lands in the controller's profile options.
    pub fn request_search(&self, text: &str) -> EditorTasks {
        let dispatch = self.runner.dispatch(EditorEvent::SearchRequested {
            text: text.to_string(),
        });
        self.spawn_effects(dispatch.effects)
    }

    /// Search and wait for the result.
    ///
    /// Only the most recently issued search can resolve; an earlier one that returns afterwards
    /// reports [`SearchOutcome::Superseded`] and leaves the options alone.
    pub async fn search_profiles(&self, text: &str) -> SearchOutcome {
        let dispatch = self.runner.dispatch(EditorEvent::SearchRequested {
            text: text.to_string(),
        });

        let mut search = None;
        let mut others = Vec::new();
        for effect in dispatch.effects {
            match effect {
                Effect::SearchProfiles { .. } if search.is_none() => search = Some(effect),
                other => others.push(other),
            }
        }
        self.spawn_effects(others);

        // Blank text clears the options without a request
        let Some(effect) = search else {
            return SearchOutcome::Resolved(Vec::new());
        };

        let resolution = self.runner.execute(effect).await;
        let outcome = resolution
            .changes
            .iter()
            .find_map(|change| match change {
                QueryChange::ProfileOptionsChanged(options) => {
                    Some(SearchOutcome::Resolved(options.clone()))
                }
                QueryChange::StaleResponseDiscarded { .. } => Some(SearchOutcome::Superseded),
                QueryChange::FetchFailed { message, .. } => {
                    Some(SearchOutcome::Failed(message.clone()))
                }
                _ => None,
            })
            .unwrap_or(SearchOutcome::Superseded);

        self.spawn_effects(resolution.effects);
        outcome
    }

    fn spawn_effects(&self, effects: Vec<Effect>) -> EditorTasks {
        let mut tasks = EditorTasks::new();
        for effect in effects {
            let runner = self.runner.clone();
            tasks.push(self.tokio_handle.spawn(runner.drive(effect)));
        }
        tasks
    }
}

/// Everything a fetch task needs, cheap to clone into `'static` tasks.
struct EffectRunner<F> {
    controller: QueryStateController,
    client: Arc<ReferenceDataClient<F>>,
    resolver: ProfileSearchResolver,
    metrics: Arc<EditorMetrics>,
}

impl<F> Clone for EffectRunner<F> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            client: Arc::clone(&self.client),
            resolver: self.resolver,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<F: ResourceFetcher + 'static> EffectRunner<F> {
    fn dispatch(&self, event: EditorEvent) -> Dispatch {
        let dispatch = self.controller.dispatch(event);
        self.metrics.record_changes(&dispatch.changes);
        dispatch
    }

    /// Run an effect and whatever effects its resolution produces, in order.
    async fn drive(self, effect: Effect) {
        let mut queue = VecDeque::from([effect]);
        while let Some(effect) = queue.pop_front() {
            let dispatch = self.execute(effect).await;
            queue.extend(dispatch.effects);
        }
    }

    /// Perform one fetch and dispatch its resolution.
    async fn execute(&self, effect: Effect) -> Dispatch {
        match effect {
            Effect::FetchActivityModes => {
                self.metrics.record_fetch(ResourceName::ListActivityModes);
                match self.client.list_activity_modes().await {
                    Ok(modes) => self.dispatch(EditorEvent::ActivityModesLoaded(modes)),
                    Err(e) => {
                        tracing::warn!("Failed to load activity modes: {}", e);
                        self.dispatch(EditorEvent::ActivityModesFailed {
                            error: e.to_string(),
                        })
                    }
                }
            }

            Effect::FetchCharacters { profile } => {
                self.metrics.record_fetch(ResourceName::ListCharacters);
                match self.client.list_characters(&profile).await {
                    Ok(characters) => self.dispatch(EditorEvent::CharactersLoaded {
                        profile,
                        characters,
                    }),
                    Err(e) => {
                        tracing::warn!(
                            membership_id = %profile.membership_id,
                            "Failed to load characters: {}",
                            e
                        );
                        self.dispatch(EditorEvent::CharactersFailed {
                            profile,
                            error: e.to_string(),
                        })
                    }
                }
            }

            Effect::SearchProfiles { ticket, text } => {
                self.metrics.record_fetch(ResourceName::ProfileSearch);
                match self.resolver.search(&self.client, &text).await {
                    Ok(options) => self.dispatch(EditorEvent::SearchResolved { ticket, options }),
                    Err(e) => {
                        tracing::warn!(query = %text, "Profile search failed: {}", e);
                        self.dispatch(EditorEvent::SearchFailed {
                            ticket,
                            error: e.to_string(),
                        })
                    }
                }
            }
        }
    }
}
