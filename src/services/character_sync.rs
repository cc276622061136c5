//! Character list synchronization.
//!
//! Tracks which profile the known character list belongs to and keeps the query's selected
//! characters valid against it. Every fetch response is tagged with the profile it was issued
//! for; a response whose tag no longer matches the current profile is stale and is dropped.

use crate::models::{CharacterItem, Membership};
use std::collections::HashSet;

/// Character list state for the current profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CharacterList {
    /// No profile selected; placeholders are rendered
    #[default]
    NoProfile,

    /// Fetch issued for `profile`, not yet resolved
    Loading { profile: Membership },

    /// Authoritative list for `profile`
    Loaded {
        profile: Membership,
        characters: Vec<CharacterItem>,
    },

    /// The fetch for `profile` failed; nothing is known about its characters
    Failed { profile: Membership, error: String },
}

impl CharacterList {
    pub fn profile(&self) -> Option<&Membership> {
        match self {
            Self::NoProfile => None,
            Self::Loading { profile }
            | Self::Loaded { profile, .. }
            | Self::Failed { profile, .. } => Some(profile),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Result of applying a character-list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The response was for a profile that is no longer selected
    Stale,

    /// The list was replaced. `reconciled` holds the new selection when any selected id had to be
    /// dropped.
    Applied { reconciled: Option<Vec<String>> },
}

/// Keeps the selected-character set consistent with the current profile's characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterListSynchronizer {
    list: CharacterList,
}

impl CharacterListSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &CharacterList {
        &self.list
    }

    pub fn current_profile(&self) -> Option<&Membership> {
        self.list.profile()
    }

    /// Track a (possibly) new profile.
    ///
    /// Returns the profile whose characters must be fetched: the new one on an identity change,
    /// or the same one again when its previous fetch failed. Clearing the profile never fetches.
    pub fn profile_changed(&mut self, profile: Option<&Membership>) -> Option<Membership> {
        let Some(profile) = profile else {
            if self.list != CharacterList::NoProfile {
                tracing::debug!("Profile cleared, showing placeholder characters");
            }
            self.list = CharacterList::NoProfile;
            return None;
        };

        let retry = matches!(&self.list, CharacterList::Failed { profile: failed, .. } if failed == profile);
        if self.current_profile() == Some(profile) && !retry {
            return None;
        }

        tracing::debug!(
            bungie_name = %profile.bungie_name,
            membership_id = %profile.membership_id,
            retry,
            "Loading characters for profile"
        );
        self.list = CharacterList::Loading {
            profile: profile.clone(),
        };
        Some(profile.clone())
    }

    /// Apply a fetched character list issued for `profile`.
    pub fn characters_loaded(
        &mut self,
        profile: &Membership,
        characters: Vec<CharacterItem>,
        selected: &[String],
    ) -> SyncOutcome {
        if self.current_profile() != Some(profile) {
            tracing::debug!(
                bungie_name = %profile.bungie_name,
                "Discarding character list for a profile that is no longer selected"
            );
            return SyncOutcome::Stale;
        }

        // An empty list keeps the placeholders up and says nothing about the selection
        let reconciled = if characters.is_empty() {
            None
        } else {
            reconcile_selection(selected, &characters)
        };

        if let Some(kept) = &reconciled {
            tracing::info!(
                dropped = selected.len() - kept.len(),
                "Removed selected characters not owned by profile"
            );
        }

        self.list = CharacterList::Loaded {
            profile: profile.clone(),
            characters,
        };
        SyncOutcome::Applied { reconciled }
    }

    /// Record a failed fetch issued for `profile`. Returns `false` when the failure is stale.
    ///
    /// A list that is already loaded for the profile stays as it is.
    pub fn fetch_failed(&mut self, profile: &Membership, error: String) -> bool {
        if self.current_profile() != Some(profile) {
            return false;
        }

        if self.list.is_loading() {
            self.list = CharacterList::Failed {
                profile: profile.clone(),
                error,
            };
        }
        true
    }

    /// Characters fetched for the current profile, empty when none are known.
    pub fn loaded_characters(&self) -> &[CharacterItem] {
        match &self.list {
            CharacterList::Loaded { characters, .. } => characters,
            _ => &[],
        }
    }

    /// Fetched characters, or the placeholder triple when there are none.
    pub fn characters_to_render(&self) -> Vec<CharacterItem> {
        let loaded = self.loaded_characters();
        if loaded.is_empty() {
            CharacterItem::placeholders()
        } else {
            loaded.to_vec()
        }
    }

    /// Selection after toggling `character_id`.
    ///
    /// Returns `None` when `character_id` is a placeholder. Otherwise the result is deduplicated
    /// and restricted to the selectable characters currently rendered, so unknown ids never get
    /// in.
    pub fn toggle(
        &self,
        selected: &[String],
        character_id: &str,
        is_selected: bool,
    ) -> Option<Vec<String>> {
        let rendered = self.characters_to_render();
        if rendered
            .iter()
            .any(|item| item.is_placeholder && item.character_id == character_id)
        {
            tracing::debug!(character_id, "Ignoring toggle of placeholder character");
            return None;
        }

        let mut next: Vec<String> = selected.to_vec();
        if is_selected {
            if !next.iter().any(|id| id == character_id) {
                next.push(character_id.to_string());
            }
        } else {
            next.retain(|id| id != character_id);
        }

        Some(retain_valid(next, &rendered))
    }

    /// Correct a selection written directly into the query.
    ///
    /// Duplicates are always dropped. Ids missing from the loaded list are dropped too; with no
    /// list loaded they are kept until one arrives.
    pub fn normalize_selection(&self, ids: Vec<String>) -> Vec<String> {
        let loaded = self.loaded_characters();
        if loaded.is_empty() {
            let mut seen = HashSet::new();
            ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
        } else {
            retain_valid(ids, loaded)
        }
    }
}

/// Selection restricted to `characters`, or `None` when nothing had to be dropped.
pub fn reconcile_selection(selected: &[String], characters: &[CharacterItem]) -> Option<Vec<String>> {
    let kept = retain_valid(selected.to_vec(), characters);
    (kept.as_slice() != selected).then_some(kept)
}

/// Unique ids, in first-seen order, that name a selectable item of `characters`.
fn retain_valid(ids: Vec<String>, characters: &[CharacterItem]) -> Vec<String> {
    let valid: HashSet<&str> = characters
        .iter()
        .filter(|item| !item.is_placeholder)
        .map(|item| item.character_id.as_str())
        .collect();

    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| valid.contains(id.as_str()) && seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn profile(id: &str) -> Membership {
        Membership::new(3, id, format!("Player{id}#0001"))
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn hunter_and_titan() -> Vec<CharacterItem> {
        vec![
            CharacterItem::new("c1", "Hunter"),
            CharacterItem::new("c2", "Titan"),
        ]
    }

    #[test]
    fn test_profile_change_requests_fetch_once() {
        let mut sync = CharacterListSynchronizer::new();

        assert_eq!(sync.profile_changed(Some(&profile("a"))), Some(profile("a")));
        assert_eq!(sync.profile_changed(Some(&profile("a"))), None);
        assert!(sync.list().is_loading());
    }

    #[test]
    fn test_clearing_profile_shows_placeholders() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));
        sync.characters_loaded(&profile("a"), hunter_and_titan(), &[]);

        assert_eq!(sync.profile_changed(None), None);
        assert_eq!(sync.list(), &CharacterList::NoProfile);
        assert!(sync.characters_to_render().iter().all(|c| c.is_placeholder));
    }

    #[test]
    fn test_loaded_list_drops_invalid_selection() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));

        let outcome = sync.characters_loaded(
            &profile("a"),
            vec![CharacterItem::new("c1", "Hunter")],
            &ids(&["c9"]),
        );

        assert_eq!(outcome, SyncOutcome::Applied { reconciled: Some(vec![]) });
        assert_eq!(sync.loaded_characters().len(), 1);
    }

    #[test]
    fn test_loaded_list_keeps_valid_selection() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));

        let outcome = sync.characters_loaded(&profile("a"), hunter_and_titan(), &ids(&["c2"]));
        assert_eq!(outcome, SyncOutcome::Applied { reconciled: None });
    }

    #[test]
    fn test_partial_reconcile_keeps_order() {
        let reconciled =
            reconcile_selection(&ids(&["c2", "old", "c1"]), &hunter_and_titan()).unwrap();
        assert_eq!(reconciled, ids(&["c2", "c1"]));
    }

    #[test]
    fn test_empty_list_does_not_reconcile() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));

        let outcome = sync.characters_loaded(&profile("a"), vec![], &ids(&["c9"]));
        assert_eq!(outcome, SyncOutcome::Applied { reconciled: None });
        assert_eq!(sync.characters_to_render(), CharacterItem::placeholders());
    }

    #[test]
    fn test_stale_response_is_rejected() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));
        sync.profile_changed(Some(&profile("b")));

        let outcome = sync.characters_loaded(&profile("a"), hunter_and_titan(), &[]);
        assert_eq!(outcome, SyncOutcome::Stale);
        assert_eq!(
            sync.list(),
            &CharacterList::Loading {
                profile: profile("b")
            }
        );
    }

    #[test]
    fn test_failed_fetch_is_retried_on_reselect() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));

        assert!(sync.fetch_failed(&profile("a"), "boom".to_string()));
        assert!(matches!(sync.list(), CharacterList::Failed { .. }));
        assert_eq!(sync.profile_changed(Some(&profile("a"))), Some(profile("a")));
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));
        sync.profile_changed(Some(&profile("b")));

        assert!(!sync.fetch_failed(&profile("a"), "boom".to_string()));
        assert!(sync.list().is_loading());
    }

    #[test]
    fn test_written_selection_is_deduplicated_before_load() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));

        let selected = sync.normalize_selection(ids(&["c9", "c1", "c9"]));
        assert_eq!(selected, ids(&["c9", "c1"]));
    }

    #[test]
    fn test_written_selection_follows_loaded_list() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));
        sync.characters_loaded(&profile("a"), hunter_and_titan(), &[]);

        let selected = sync.normalize_selection(ids(&["ghost", "c2", "c1", "c2"]));
        assert_eq!(selected, ids(&["c2", "c1"]));
    }

    #[test]
    fn test_toggle_placeholder_is_noop() {
        let sync = CharacterListSynchronizer::new();
        assert_eq!(sync.toggle(&[], "2", true), None);
    }

    #[test]
    fn test_toggle_selects_and_deselects() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));
        sync.characters_loaded(&profile("a"), hunter_and_titan(), &[]);

        let selected = sync.toggle(&[], "c1", true).unwrap();
        assert_eq!(selected, ids(&["c1"]));

        let selected = sync.toggle(&selected, "c1", true).unwrap();
        assert_eq!(selected, ids(&["c1"]));

        let selected = sync.toggle(&selected, "c2", true).unwrap();
        assert_eq!(selected, ids(&["c1", "c2"]));

        let selected = sync.toggle(&selected, "c1", false).unwrap();
        assert_eq!(selected, ids(&["c2"]));
    }

    #[test]
    fn test_toggle_unknown_id_is_filtered() {
        let mut sync = CharacterListSynchronizer::new();
        sync.profile_changed(Some(&profile("a")));
        sync.characters_loaded(&profile("a"), hunter_and_titan(), &[]);

        let selected = sync.toggle(&ids(&["c1", "c1"]), "ghost", true).unwrap();
        assert_eq!(selected, ids(&["c1"]));
    }

    #[derive(Debug, Clone)]
    enum Step {
        SelectProfile(u8),
        ClearProfile,
        Resolve(u8, Vec<u8>),
        Toggle(u8, bool),
        SetCharacters(Vec<u8>),
    }

    fn arb_step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0..3u8).prop_map(Step::SelectProfile),
            Just(Step::ClearProfile),
            ((0..3u8), proptest::collection::vec(0..5u8, 0..4)).prop_map(|(p, c)| Step::Resolve(p, c)),
            ((0..5u8), any::<bool>()).prop_map(|(c, on)| Step::Toggle(c, on)),
            proptest::collection::vec(0..6u8, 0..5).prop_map(Step::SetCharacters),
        ]
    }

    proptest! {
        #[test]
        fn prop_selection_stays_valid(steps in proptest::collection::vec(arb_step(), 0..40)) {
            let mut sync = CharacterListSynchronizer::new();
            let mut selected: Vec<String> = Vec::new();

            for step in steps {
                match step {
                    Step::SelectProfile(p) => {
                        sync.profile_changed(Some(&profile(&p.to_string())));
                    }
                    Step::ClearProfile => {
                        sync.profile_changed(None);
                    }
                    Step::Resolve(p, chars) => {
                        let characters = chars
                            .iter()
                            .map(|c| CharacterItem::new(format!("c{c}"), "Guardian"))
                            .collect();
                        if let SyncOutcome::Applied { reconciled: Some(kept) } =
                            sync.characters_loaded(&profile(&p.to_string()), characters, &selected)
                        {
                            selected = kept;
                        }
                    }
                    Step::Toggle(c, on) => {
                        if let Some(next) = sync.toggle(&selected, &format!("c{c}"), on) {
                            selected = next;
                        }
                    }
                    Step::SetCharacters(chars) => {
                        let written = chars.iter().map(|c| format!("c{c}")).collect();
                        selected = sync.normalize_selection(written);
                    }
                }

                let loaded = sync.loaded_characters();
                if !loaded.is_empty() {
                    for id in &selected {
                        prop_assert!(loaded.iter().any(|item| &item.character_id == id));
                    }
                }
                let unique: HashSet<&String> = selected.iter().collect();
                prop_assert_eq!(unique.len(), selected.len());
            }
        }
    }
}
