use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::core::database::bounded;
use crate::core::error::{AppError, Result};
use crate::features::prompts::models::{normalize_content, Customization, CustomizationKey};

/// Persistence for per-owner customizations, at most one per key.
///
/// Only `CustomizationService` should call `upsert` and `remove`; it owns the
/// rule that a blank edit means delete.
#[async_trait]
pub trait CustomizationStore: Send + Sync {
    async fn get(&self, key: &CustomizationKey) -> Result<Option<Customization>>;

    /// Every customization an owner has, in no particular order
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Customization>>;

    /// Create or overwrite the record for `key`. Fails with `InvalidContent` on blank content.
    async fn upsert(&self, key: &CustomizationKey, content: &str) -> Result<Customization>;

    /// Delete the record for `key`, returning it. Fails with `NotFound` if absent.
    async fn remove(&self, key: &CustomizationKey) -> Result<Customization>;
}

/// Reject content that must never be persisted.
pub fn ensure_storable(key: &CustomizationKey, content: &str) -> Result<()> {
    if normalize_content(content).is_none() {
        return Err(AppError::InvalidContent(format!(
            "upsert for {} with empty content; blank edits must be routed to remove",
            key
        )));
    }
    Ok(())
}

pub fn not_found(key: &CustomizationKey) -> AppError {
    AppError::NotFound(format!("No customization exists for {}", key))
}

/// Store backed by the `prompt_customizations` table
pub struct PgCustomizationStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl std::fmt::Debug for PgCustomizationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCustomizationStore")
            .field("pool", &"<PgPool>")
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl PgCustomizationStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl CustomizationStore for PgCustomizationStore {
    async fn get(&self, key: &CustomizationKey) -> Result<Option<Customization>> {
        bounded(
            self.query_timeout,
            &format!("get customization for {}", key),
            sqlx::query_as::<_, Customization>(
                r#"
                SELECT id, prompt_id, owner_id, content, created_at, updated_at
                FROM prompt_customizations
                WHERE prompt_id = $1 AND owner_id = $2
                "#,
            )
            .bind(&key.prompt_id)
            .bind(&key.owner_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Customization>> {
        bounded(
            self.query_timeout,
            &format!("list customizations for owner '{}'", owner_id),
            sqlx::query_as::<_, Customization>(
                r#"
                SELECT id, prompt_id, owner_id, content, created_at, updated_at
                FROM prompt_customizations
                WHERE owner_id = $1
                "#,
            )
            .bind(owner_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn upsert(&self, key: &CustomizationKey, content: &str) -> Result<Customization> {
        ensure_storable(key, content)?;

        // Single statement so concurrent writers on other instances degrade to last-writer-wins
        bounded(
            self.query_timeout,
            &format!("upsert customization for {}", key),
            sqlx::query_as::<_, Customization>(
                r#"
                INSERT INTO prompt_customizations (id, prompt_id, owner_id, content)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (prompt_id, owner_id)
                DO UPDATE SET content = EXCLUDED.content, updated_at = NOW()
                RETURNING id, prompt_id, owner_id, content, created_at, updated_at
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(&key.prompt_id)
            .bind(&key.owner_id)
            .bind(content)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn remove(&self, key: &CustomizationKey) -> Result<Customization> {
        bounded(
            self.query_timeout,
            &format!("remove customization for {}", key),
            sqlx::query_as::<_, Customization>(
                r#"
                DELETE FROM prompt_customizations
                WHERE prompt_id = $1 AND owner_id = $2
                RETURNING id, prompt_id, owner_id, content, created_at, updated_at
                "#,
            )
            .bind(&key.prompt_id)
            .bind(&key.owner_id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(key))
    }
}
