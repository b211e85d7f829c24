use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use crate::core::database::bounded;
use crate::core::error::Result;
use crate::features::prompts::models::BasePrompt;

/// Read-only source of base prompt definitions.
#[async_trait]
pub trait PromptCatalog: Send + Sync {
    /// All base prompts, in catalog order
    async fn list_base_prompts(&self) -> Result<Vec<BasePrompt>>;

    /// A single base prompt by id
    async fn get_base_prompt(&self, id: &str) -> Result<Option<BasePrompt>> {
        Ok(self
            .list_base_prompts()
            .await?
            .into_iter()
            .find(|prompt| prompt.id == id))
    }
}

/// Catalog backed by the `base_prompts` table
pub struct PgPromptCatalog {
    pool: PgPool,
    query_timeout: Duration,
}

impl std::fmt::Debug for PgPromptCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPromptCatalog")
            .field("pool", &"<PgPool>")
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl PgPromptCatalog {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl PromptCatalog for PgPromptCatalog {
    async fn list_base_prompts(&self) -> Result<Vec<BasePrompt>> {
        bounded(
            self.query_timeout,
            "list base prompts",
            sqlx::query_as::<_, BasePrompt>(
                r#"
                SELECT id, description, content, model, temperature, display_order
                FROM base_prompts
                ORDER BY display_order, id
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn get_base_prompt(&self, id: &str) -> Result<Option<BasePrompt>> {
        bounded(
            self.query_timeout,
            "get base prompt",
            sqlx::query_as::<_, BasePrompt>(
                r#"
                SELECT id, description, content, model, temperature, display_order
                FROM base_prompts
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
    }
}
