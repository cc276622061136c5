//! Profile search resolution.
//!
//! The search backend returns one record per linked platform account, so a single player often
//! appears several times under the same Bungie name. Resolution keeps the first record per name
//! and maps it to its canonical membership, preferring the cross-save override when present.

use super::reference_data::{FetchError, ReferenceDataClient, ResourceFetcher};
use crate::models::{Membership, SearchResult, SelectableOption};
use indexmap::IndexMap;
use indexmap::map::Entry;

/// Collapse raw search results to one option per Bungie name, in input order.
pub fn resolve_search_results(results: Vec<SearchResult>) -> Vec<SelectableOption<Membership>> {
    let mut by_name: IndexMap<String, SearchResult> = IndexMap::with_capacity(results.len());

    for result in results {
        match by_name.entry(result.bungie_name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(result);
            }
            Entry::Occupied(kept) => {
                tracing::trace!(
                    bungie_name = %kept.key(),
                    dropped_membership = %result.membership_id,
                    "Dropping duplicate search result"
                );
            }
        }
    }

    by_name
        .into_values()
        .map(|result| SelectableOption::new(result.bungie_name.clone(), result.canonical_membership()))
        .collect()
}

/// Turns typeahead text into selectable profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSearchResolver;

impl ProfileSearchResolver {
    pub fn new() -> Self {
        Self
    }

    /// Search for profiles matching `text`.
    ///
    /// Blank text resolves to no options without calling the backend.
    pub async fn search<F: ResourceFetcher>(
        &self,
        client: &ReferenceDataClient<F>,
        text: &str,
    ) -> Result<Vec<SelectableOption<Membership>>, FetchError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let results = client.search_profiles(text).await?;
        let raw_count = results.len();
        let options = resolve_search_results(results);

        tracing::debug!(
            query = text,
            raw_count,
            resolved_count = options.len(),
            "Resolved profile search"
        );
        Ok(options)
    }
}
