use serde::{Deserialize, Serialize};

/// A player account on one platform.
///
/// The whole record is the profile identity: two memberships with the same id but a different
/// display name are treated as different selections, which is what triggers a character refetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub membership_type: i32,
    pub membership_id: String,
    pub bungie_name: String,
}

impl Membership {
    pub fn new(
        membership_type: i32,
        membership_id: impl Into<String>,
        bungie_name: impl Into<String>,
    ) -> Self {
        Self {
            membership_type,
            membership_id: membership_id.into(),
            bungie_name: bungie_name.into(),
        }
    }

    /// Identity-only view sent to the backend.
    pub fn pair(&self) -> MembershipPair {
        MembershipPair {
            membership_type: self.membership_type,
            membership_id: self.membership_id.clone(),
        }
    }
}

/// Platform id plus membership id, without the display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPair {
    pub membership_type: i32,
    pub membership_id: String,
}

/// Cross-platform account link attached to a search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSaveOverride {
    #[serde(default)]
    pub membership_id: String,
    #[serde(default)]
    pub membership_type: i32,
}

/// Raw record returned by the `profile-search` resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub bungie_name: String,
    pub membership_id: String,
    pub membership_type: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_save_override: Option<CrossSaveOverride>,

    // Display metadata, unused by resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bnet_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emblem_hash: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SearchResult {
    /// The cross-save link, if it names an account.
    ///
    /// A zeroed override (empty membership id) is what the search backend sends for accounts
    /// without cross save, so it counts as absent.
    pub fn cross_save_override(&self) -> Option<&CrossSaveOverride> {
        self.cross_save_override
            .as_ref()
            .filter(|link| !link.membership_id.is_empty())
    }

    /// Canonical membership for this result.
    pub fn canonical_membership(&self) -> Membership {
        match self.cross_save_override() {
            Some(link) => Membership::new(
                link.membership_type,
                link.membership_id.clone(),
                self.bungie_name.clone(),
            ),
            None => Membership::new(
                self.membership_type,
                self.membership_id.clone(),
                self.bungie_name.clone(),
            ),
        }
    }
}
