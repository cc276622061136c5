// State management module
//
// This module provides the QueryStateController which owns the edited query together with the
// reference data it is validated against, applies events through a pure reducer, and emits
// change events for the presentation layer.

use crate::models::{ActivityMode, CharacterItem, Membership, Query, QueryUpdate, SelectableOption};
use crate::services::{CharacterListSynchronizer, ResourceName, SyncOutcome};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Monotonic id of a profile search request. Only the latest one may update the options.
pub type SearchTicket = u64;

const DEFAULT_EVENT_BUFFER: usize = 100;

/// Typeahead state for the profile picker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Text of the latest search request
    pub input: String,
    pub latest_ticket: SearchTicket,
    pub in_flight: bool,
    pub options: Vec<SelectableOption<Membership>>,
}

/// Everything the editor knows: the query plus the reference data it is checked against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub query: Query,
    pub characters: CharacterListSynchronizer,
    pub search: SearchState,
    pub activity_modes: Vec<ActivityMode>,

    /// Set by the first `Mounted` event
    pub mounted: bool,
}

/// Read-only picker state derived from [`SearchState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    pub is_searching: bool,
    pub is_loading: bool,
    pub no_options_message: &'static str,
    pub loading_message: &'static str,
}

impl EditorState {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    /// The current profile as a single selectable option, empty when unset.
    pub fn profile_value(&self) -> Vec<SelectableOption<Membership>> {
        self.query
            .profile
            .iter()
            .map(|profile| SelectableOption::new(profile.bungie_name.clone(), profile.clone()))
            .collect()
    }

    pub fn characters_to_render(&self) -> Vec<CharacterItem> {
        self.characters.characters_to_render()
    }

    pub fn activity_mode_options(&self) -> Vec<SelectableOption<i32>> {
        self.activity_modes
            .iter()
            .map(|mode| SelectableOption::new(mode.label.clone(), mode.value))
            .collect()
    }

    pub fn search_view(&self) -> SearchView {
        let is_searching = !self.search.input.is_empty();
        SearchView {
            is_searching,
            is_loading: self.search.in_flight,
            no_options_message: if is_searching {
                "No players found"
            } else {
                "Type to search for player"
            },
            loading_message: "Searching...",
        }
    }
}

/// Inputs to the reducer: user commands and fetch resolutions.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The editor was opened; loads the activity catalog and, if needed, the characters
    Mounted,

    QueryUpdated(QueryUpdate),

    CharacterToggled {
        character_id: String,
        selected: bool,
    },

    SearchRequested {
        text: String,
    },

    SearchResolved {
        ticket: SearchTicket,
        options: Vec<SelectableOption<Membership>>,
    },

    SearchFailed {
        ticket: SearchTicket,
        error: String,
    },

    /// Character list fetched for `profile`
    CharactersLoaded {
        profile: Membership,
        characters: Vec<CharacterItem>,
    },

    CharactersFailed {
        profile: Membership,
        error: String,
    },

    ActivityModesLoaded(Vec<ActivityMode>),

    ActivityModesFailed {
        error: String,
    },
}

/// Fetches the reducer asks the driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchActivityModes,
    FetchCharacters { profile: Membership },
    SearchProfiles { ticket: SearchTicket, text: String },
}

/// Change events emitted when state is modified
///
/// `QueryChanged` and `RunRequested` are the editor's contract with its owner; the rest keep a
/// view of the reference data current.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryChange {
    /// The query was updated (fired on every update, even if nothing changed)
    QueryChanged(Query),

    /// The updated query has a profile and should be executed
    RunRequested(Query),

    /// The character list to render changed
    CharactersChanged(Vec<CharacterItem>),

    ProfileOptionsChanged(Vec<SelectableOption<Membership>>),

    ActivityModesChanged(Vec<SelectableOption<i32>>),

    /// A fetch failed; the affected collection was left as it was
    FetchFailed {
        resource: ResourceName,
        message: String,
    },

    /// A response arrived for a request that had been superseded
    StaleResponseDiscarded { resource: ResourceName },
}

/// Output of [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: EditorState,
    pub changes: Vec<QueryChange>,
    pub effects: Vec<Effect>,
}

/// Apply one event to the editor state.
///
/// Pure: the same state and event always give the same transition. Stale fetch responses are
/// rejected here, which is what makes overlapping fetches safe.
pub fn reduce(mut state: EditorState, event: EditorEvent) -> Transition {
    let mut changes = Vec::new();
    let mut effects = Vec::new();

    match event {
        EditorEvent::Mounted => {
            // The activity catalog is loaded once per editor
            if !state.mounted {
                state.mounted = true;
                effects.push(Effect::FetchActivityModes);
            }
            if let Some(profile) = state.characters.profile_changed(state.query.profile.as_ref()) {
                effects.push(Effect::FetchCharacters { profile });
            }
        }

        EditorEvent::QueryUpdated(update) => {
            apply_update(&mut state, &update, &mut changes, &mut effects);
        }

        EditorEvent::CharacterToggled {
            character_id,
            selected,
        } => {
            let next = state.characters.toggle(
                state.query.selected_characters(),
                &character_id,
                selected,
            );
            if let Some(characters) = next {
                let update = QueryUpdate::characters(characters);
                apply_update(&mut state, &update, &mut changes, &mut effects);
            }
        }

        EditorEvent::SearchRequested { text } => {
            state.search.latest_ticket += 1;
            state.search.input = text.clone();

            if text.trim().is_empty() {
                state.search.in_flight = false;
                state.search.options.clear();
                changes.push(QueryChange::ProfileOptionsChanged(Vec::new()));
            } else {
                state.search.in_flight = true;
                effects.push(Effect::SearchProfiles {
                    ticket: state.search.latest_ticket,
                    text,
                });
            }
        }

        EditorEvent::SearchResolved { ticket, options } => {
            if ticket != state.search.latest_ticket {
                tracing::debug!(
                    ticket,
                    latest = state.search.latest_ticket,
                    "Discarding superseded search response"
                );
                changes.push(QueryChange::StaleResponseDiscarded {
                    resource: ResourceName::ProfileSearch,
                });
            } else {
                state.search.in_flight = false;
                state.search.options = options.clone();
                changes.push(QueryChange::ProfileOptionsChanged(options));
            }
        }

        EditorEvent::SearchFailed { ticket, error } => {
            if ticket != state.search.latest_ticket {
                changes.push(QueryChange::StaleResponseDiscarded {
                    resource: ResourceName::ProfileSearch,
                });
            } else {
                state.search.in_flight = false;
                changes.push(QueryChange::FetchFailed {
                    resource: ResourceName::ProfileSearch,
                    message: error,
                });
            }
        }

        EditorEvent::CharactersLoaded {
            profile,
            characters,
        } => {
            let selected = state.query.selected_characters().to_vec();
            match state
                .characters
                .characters_loaded(&profile, characters, &selected)
            {
                SyncOutcome::Stale => {
                    changes.push(QueryChange::StaleResponseDiscarded {
                        resource: ResourceName::ListCharacters,
                    });
                }
                SyncOutcome::Applied { reconciled } => {
                    changes.push(QueryChange::CharactersChanged(
                        state.characters.characters_to_render(),
                    ));
                    if let Some(characters) = reconciled {
                        let update = QueryUpdate::characters(characters);
                        apply_update(&mut state, &update, &mut changes, &mut effects);
                    }
                }
            }
        }

        EditorEvent::CharactersFailed { profile, error } => {
            if state.characters.fetch_failed(&profile, error.clone()) {
                changes.push(QueryChange::FetchFailed {
                    resource: ResourceName::ListCharacters,
                    message: error,
                });
            } else {
                changes.push(QueryChange::StaleResponseDiscarded {
                    resource: ResourceName::ListCharacters,
                });
            }
        }

        EditorEvent::ActivityModesLoaded(modes) => {
            state.activity_modes = modes;
            changes.push(QueryChange::ActivityModesChanged(
                state.activity_mode_options(),
            ));
        }

        EditorEvent::ActivityModesFailed { error } => {
            changes.push(QueryChange::FetchFailed {
                resource: ResourceName::ListActivityModes,
                message: error,
            });
        }
    }

    Transition {
        state,
        changes,
        effects,
    }
}

/// Merge `update` into the query, announce it, and follow a profile change.
fn apply_update(
    state: &mut EditorState,
    update: &QueryUpdate,
    changes: &mut Vec<QueryChange>,
    effects: &mut Vec<Effect>,
) {
    // The character list follows the profile first, so a selection written in the same update is
    // checked against the list of the new profile
    let before = state.characters.characters_to_render();
    if let Some(profile) = &update.profile {
        if let Some(profile) = state.characters.profile_changed(profile.as_ref()) {
            effects.push(Effect::FetchCharacters { profile });
        }
    }

    let corrected;
    let update = match &update.characters {
        Some(written) => {
            let selected = state.characters.normalize_selection(written.clone());
            if &selected != written {
                tracing::debug!(
                    ?written,
                    ?selected,
                    "Dropped duplicate or unknown characters from update"
                );
            }
            corrected = QueryUpdate {
                characters: Some(selected),
                ..update.clone()
            };
            &corrected
        }
        None => update,
    };

    state.query = state.query.merge(update);

    changes.push(QueryChange::QueryChanged(state.query.clone()));
    if state.query.is_runnable() {
        changes.push(QueryChange::RunRequested(state.query.clone()));
    }

    let after = state.characters.characters_to_render();
    if before != after {
        changes.push(QueryChange::CharactersChanged(after));
    }
}

/// Result of one [`QueryStateController::dispatch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub changes: Vec<QueryChange>,
    pub effects: Vec<Effect>,
}

impl Dispatch {
    pub fn run_requests(&self) -> usize {
        self.changes
            .iter()
            .filter(|change| matches!(change, QueryChange::RunRequested(_)))
            .count()
    }
}

/// Owner of the editor state with event emission
///
/// This is the single place the query is mutated:
/// - [`dispatch()`](Self::dispatch) runs an [`EditorEvent`] through [`reduce`], stores the new
///   state and broadcasts the resulting [`QueryChange`]s
/// - [`subscribe()`](Self::subscribe) hands out receivers for those changes
/// - the `*_to_render`/`*_options` accessors expose derived views without touching the query
///
/// Effects are returned to the caller rather than executed; see
/// [`QueryEditor`](crate::editor::QueryEditor) for the driver that performs the fetches.
pub struct QueryStateController {
    state: Arc<RwLock<EditorState>>,

    /// Multiple subscribers can listen for query changes
    change_tx: broadcast::Sender<QueryChange>,
}

impl QueryStateController {
    pub fn new(query: Query) -> Self {
        Self::with_capacity(query, DEFAULT_EVENT_BUFFER)
    }

    /// Controller whose broadcast channel buffers `capacity` changes per subscriber.
    pub fn with_capacity(query: Query, capacity: usize) -> Self {
        let (change_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(EditorState::new(query))),
            change_tx,
        }
    }

    /// Clone of the whole editor state.
    pub fn snapshot(&self) -> EditorState {
        self.read(EditorState::clone)
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EditorState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Apply an event and emit its changes
    ///
    /// The write lock is held across the reduction, so concurrent fetch resolutions are applied
    /// one at a time and each sees the state left by the previous one.
    pub fn dispatch(&self, event: EditorEvent) -> Dispatch {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *state);

        let Transition {
            state: next,
            changes,
            effects,
        } = reduce(current, event);
        *state = next;
        drop(state);

        for change in &changes {
            tracing::trace!(?change, "Query change");
            // Ignore send errors - it's OK if no one is listening
            let _ = self.change_tx.send(change.clone());
        }

        Dispatch { changes, effects }
    }

    /// Subscribe to query change events
    pub fn subscribe(&self) -> broadcast::Receiver<QueryChange> {
        self.change_tx.subscribe()
    }

    pub fn mount(&self) -> Dispatch {
        self.dispatch(EditorEvent::Mounted)
    }

    /// Merge a partial query
    pub fn update(&self, update: QueryUpdate) -> Dispatch {
        self.dispatch(EditorEvent::QueryUpdated(update))
    }

    pub fn set_character_selected(&self, character_id: &str, selected: bool) -> Dispatch {
        self.dispatch(EditorEvent::CharacterToggled {
            character_id: character_id.to_string(),
            selected,
        })
    }

    pub fn request_search(&self, text: &str) -> Dispatch {
        self.dispatch(EditorEvent::SearchRequested {
            text: text.to_string(),
        })
    }

    pub fn query(&self) -> Query {
        self.read(|state| state.query.clone())
    }

    pub fn profile_value(&self) -> Vec<SelectableOption<Membership>> {
        self.read(EditorState::profile_value)
    }

    pub fn characters_to_render(&self) -> Vec<CharacterItem> {
        self.read(EditorState::characters_to_render)
    }

    pub fn profile_options(&self) -> Vec<SelectableOption<Membership>> {
        self.read(|state| state.search.options.clone())
    }

    pub fn activity_mode_options(&self) -> Vec<SelectableOption<i32>> {
        self.read(EditorState::activity_mode_options)
    }

    pub fn search_view(&self) -> SearchView {
        self.read(EditorState::search_view)
    }
}

impl Default for QueryStateController {
    fn default() -> Self {
        Self::new(Query::default())
    }
}

// Clones share the same state and channel
impl Clone for QueryStateController {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            change_tx: self.change_tx.clone(),
        }
    }
}
