use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Identifies the single customization slot an owner has for a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomizationKey {
    pub prompt_id: String,
    pub owner_id: String,
}

impl CustomizationKey {
    pub fn new(prompt_id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            owner_id: owner_id.into(),
        }
    }
}

impl fmt::Display for CustomizationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prompt '{}' / owner '{}'", self.prompt_id, self.owner_id)
    }
}

/// An owner's override of a base prompt's instruction.
///
/// `content` is never blank; a blank edit removes the record instead.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Customization {
    pub id: Uuid,
    pub prompt_id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trim raw edit text. `None` means nothing is left to store.
pub fn normalize_content(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
