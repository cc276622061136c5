use serde::{Deserialize, Serialize};

/// One character of a profile, as returned by `list-characters`.
///
/// Placeholders are synthetic entries shown before a profile has characters to offer. They are
/// never selectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterItem {
    pub character_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_placeholder: bool,
}

impl CharacterItem {
    pub fn new(character_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            description: description.into(),
            is_placeholder: false,
        }
    }

    fn placeholder(character_id: &str, description: &str) -> Self {
        Self {
            character_id: character_id.to_string(),
            description: description.to_string(),
            is_placeholder: true,
        }
    }

    /// The class-archetype stand-ins rendered when no real characters are known.
    pub fn placeholders() -> Vec<CharacterItem> {
        vec![
            Self::placeholder("1", "Warlock"),
            Self::placeholder("2", "Hunter"),
            Self::placeholder("3", "Titan"),
        ]
    }
}

/// Catalog entry from `list-activity-modes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMode {
    pub label: String,
    pub value: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_not_selectable() {
        let placeholders = CharacterItem::placeholders();

        assert_eq!(placeholders.len(), 3);
        assert!(placeholders.iter().all(|item| item.is_placeholder));
        assert_eq!(placeholders[1].description, "Hunter");
    }

    #[test]
    fn test_backend_item_parses_without_placeholder_flag() {
        let item: CharacterItem =
            serde_json::from_str(r#"{"characterId":"c1","description":"Hunter"}"#).unwrap();

        assert_eq!(item, CharacterItem::new("c1", "Hunter"));
    }
}
