use chrono::{DateTime, Utc};

use super::{BasePrompt, Customization};

/// A base prompt as one owner sees it. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrompt {
    pub id: String,
    pub description: String,
    pub content: String,
    pub model: String,
    pub temperature: f64,
    /// The owner's instruction override; `None` when unset.
    pub effective_instruction: Option<String>,
    pub customized_at: Option<DateTime<Utc>>,
}

impl ResolvedPrompt {
    /// Layer an owner's customization (if any) on top of a base prompt.
    pub fn merge(base: BasePrompt, customization: Option<&Customization>) -> Self {
        Self {
            id: base.id,
            description: base.description,
            content: base.content,
            model: base.model,
            temperature: base.temperature,
            effective_instruction: customization.map(|c| c.content.clone()),
            customized_at: customization.map(|c| c.updated_at),
        }
    }

    pub fn is_customized(&self) -> bool {
        self.effective_instruction.is_some()
    }
}
