use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A system-defined instruction template. Read-only to this service.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BasePrompt {
    pub id: String,
    pub description: String,
    pub content: String,
    pub model: String,
    pub temperature: f64,
    pub display_order: i32,
}
