use serde::{Deserialize, Serialize};

/// A labelled value offered to the user in a picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableOption<T> {
    pub label: String,
    pub value: T,
}

impl<T> SelectableOption<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}
