use super::membership::{Membership, MembershipPair};
use serde::{Deserialize, Serialize};

/// The query being edited.
///
/// Only [`QueryStateController`](crate::state::QueryStateController) mutates it, through
/// [`QueryUpdate`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Membership>,

    /// Selected character ids, ordered, without duplicates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_mode: Option<i32>,
}

impl Query {
    /// Selected character ids, empty when none were ever set.
    pub fn selected_characters(&self) -> &[String] {
        self.characters.as_deref().unwrap_or_default()
    }

    /// A query with a profile is handed to the execution backend.
    pub fn is_runnable(&self) -> bool {
        self.profile.is_some()
    }

    /// Whether the backend would accept the profile identity.
    pub fn is_executable(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.membership_type != 0 && !p.membership_id.is_empty())
    }

    /// Shallow merge. `characters` replaces the previous array wholesale.
    pub fn merge(&self, update: &QueryUpdate) -> Query {
        let mut merged = self.clone();

        if let Some(profile) = &update.profile {
            merged.profile = profile.clone();
        }
        if let Some(characters) = &update.characters {
            merged.characters = Some(characters.clone());
        }
        if let Some(activity_mode) = update.activity_mode {
            merged.activity_mode = activity_mode;
        }

        merged
    }

    /// Shape the backend's query handler deserializes.
    pub fn to_model(&self) -> QueryModel {
        QueryModel {
            characters: self.selected_characters().to_vec(),
            profile: self
                .profile
                .as_ref()
                .map(Membership::pair)
                .unwrap_or_default(),
            activity_mode: self.activity_mode.unwrap_or(0),
        }
    }
}

/// Partial query applied by [`Query::merge`].
///
/// `profile` and `activity_mode` are tri-state: `None` leaves the field alone, `Some(None)` clears
/// it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryUpdate {
    pub profile: Option<Option<Membership>>,
    pub characters: Option<Vec<String>>,
    pub activity_mode: Option<Option<i32>>,
}

impl QueryUpdate {
    pub fn profile(profile: Membership) -> Self {
        Self {
            profile: Some(Some(profile)),
            ..Default::default()
        }
    }

    pub fn clear_profile() -> Self {
        Self {
            profile: Some(None),
            ..Default::default()
        }
    }

    pub fn characters(characters: Vec<String>) -> Self {
        Self {
            characters: Some(characters),
            ..Default::default()
        }
    }

    pub fn activity_mode(activity_mode: Option<i32>) -> Self {
        Self {
            activity_mode: Some(activity_mode),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_none() && self.characters.is_none() && self.activity_mode.is_none()
    }
}

/// JSON body executed by the datasource backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryModel {
    pub characters: Vec<String>,
    pub profile: MembershipPair,
    pub activity_mode: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> Membership {
        Membership::new(3, "1", "Foo#1234")
    }

    #[test]
    fn test_merge_replaces_characters_wholesale() {
        let query = Query {
            characters: Some(vec!["a".to_string(), "b".to_string()]),
            ..Default::default()
        };

        let merged = query.merge(&QueryUpdate::characters(vec!["c".to_string()]));
        assert_eq!(merged.selected_characters(), ["c".to_string()]);
    }

    #[test]
    fn test_merge_leaves_untouched_fields() {
        let query = Query {
            profile: Some(foo()),
            activity_mode: Some(84),
            ..Default::default()
        };

        let merged = query.merge(&QueryUpdate::characters(vec![]));
        assert_eq!(merged.profile, Some(foo()));
        assert_eq!(merged.activity_mode, Some(84));
    }

    #[test]
    fn test_merge_clears_optional_fields() {
        let query = Query {
            profile: Some(foo()),
            activity_mode: Some(5),
            ..Default::default()
        };

        let merged = query
            .merge(&QueryUpdate::clear_profile())
            .merge(&QueryUpdate::activity_mode(None));
        assert_eq!(merged, Query::default());
    }

    #[test]
    fn test_query_json_omits_absent_fields() {
        let json = serde_json::to_string(&Query::default()).unwrap();
        assert_eq!(json, "{}");

        let query = Query {
            activity_mode: Some(5),
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["activityMode"], 5);
    }

    #[test]
    fn test_to_model_fills_defaults() {
        let query = Query {
            profile: Some(foo()),
            ..Default::default()
        };

        let model = serde_json::to_value(query.to_model()).unwrap();
        assert_eq!(model["characters"], serde_json::json!([]));
        assert_eq!(model["activityMode"], 0);
        assert_eq!(model["profile"]["membershipId"], "1");
        assert!(model["profile"].get("bungieName").is_none());
    }

    #[test]
    fn test_executable_requires_identity() {
        let mut query = Query {
            profile: Some(Membership::new(0, "1", "Foo#1234")),
            ..Default::default()
        };
        assert!(query.is_runnable());
        assert!(!query.is_executable());

        query.profile = Some(foo());
        assert!(query.is_executable());
    }
}
