use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::prompts::models::{Customization, ResolvedPrompt};
use crate::features::prompts::services::{EditOutcome, EditResult};
use crate::shared::constants::MAX_CUSTOMIZATION_LENGTH;

/// A base prompt merged with the calling owner's customization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolvedPromptDto {
    pub id: String,
    pub description: String,
    /// Base template text (never changed by customizations)
    pub content: String,
    pub model: String,
    pub temperature: f64,
    /// The owner's instruction override, `null` when unset
    pub effective_instruction: Option<String>,
    pub is_customized: bool,
    pub customized_at: Option<DateTime<Utc>>,
}

impl From<ResolvedPrompt> for ResolvedPromptDto {
    fn from(p: ResolvedPrompt) -> Self {
        let is_customized = p.is_customized();
        Self {
            id: p.id,
            description: p.description,
            content: p.content,
            model: p.model,
            temperature: p.temperature,
            effective_instruction: p.effective_instruction,
            is_customized,
            customized_at: p.customized_at,
        }
    }
}

// Edit request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitCustomizationDto {
    /// New instruction text. Blank (or whitespace only) removes the customization.
    #[validate(length(max = MAX_CUSTOMIZATION_LENGTH))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomizationResponseDto {
    pub id: Uuid,
    pub prompt_id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customization> for CustomizationResponseDto {
    fn from(c: Customization) -> Self {
        Self {
            id: c.id,
            prompt_id: c.prompt_id,
            owner_id: c.owner_id,
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EditResultDto {
    pub outcome: EditOutcome,
    /// Current record, absent after a delete
    pub customization: Option<CustomizationResponseDto>,
}

impl From<EditResult> for EditResultDto {
    fn from(r: EditResult) -> Self {
        Self {
            outcome: r.outcome,
            customization: r.customization.map(CustomizationResponseDto::from),
        }
    }
}
