use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::prompts::models::{CustomizationKey, ResolvedPrompt};
use crate::features::prompts::services::{CustomizationStore, PromptCatalog};

struct CachedResolution {
    prompts: Vec<ResolvedPrompt>,
    fetched_at: Instant,
}

// Cache structure
#[derive(Default)]
struct ResolutionCache {
    entries: HashMap<String, CachedResolution>, // owner_id -> resolved list
    /// Bumped on every invalidation so a resolve that raced with a write
    /// does not put its stale result back.
    generation: u64,
}

/// Computes the effective prompts an owner sees: base catalog merged with
/// that owner's customizations.
pub struct ResolverService {
    catalog: Arc<dyn PromptCatalog>,
    store: Arc<dyn CustomizationStore>,
    cache: RwLock<ResolutionCache>,
    cache_ttl: Duration,
}

impl std::fmt::Debug for ResolverService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverService")
            .field("catalog", &"<PromptCatalog>")
            .field("store", &"<CustomizationStore>")
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl ResolverService {
    pub fn new(
        catalog: Arc<dyn PromptCatalog>,
        store: Arc<dyn CustomizationStore>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            store,
            cache: RwLock::new(ResolutionCache::default()),
            cache_ttl,
        }
    }

    fn caching_enabled(&self) -> bool {
        !self.cache_ttl.is_zero()
    }

    /// Resolve every base prompt for `owner_id`, preserving catalog order
    pub async fn resolve(&self, owner_id: &str) -> Result<Vec<ResolvedPrompt>> {
        let generation = {
            let cache = self.cache.read().await;
            if self.caching_enabled() {
                if let Some(cached) = cache.entries.get(owner_id) {
                    if cached.fetched_at.elapsed() < self.cache_ttl {
                        tracing::debug!("Resolved prompts for owner '{}' served from cache", owner_id);
                        return Ok(cached.prompts.clone());
                    }
                }
            }
            cache.generation
        };

        let base_prompts = self.catalog.list_base_prompts().await?;
        let mut by_prompt: HashMap<String, _> = self
            .store
            .list_for_owner(owner_id)
            .await?
            .into_iter()
            .map(|c| (c.prompt_id.clone(), c))
            .collect();

        let resolved: Vec<ResolvedPrompt> = base_prompts
            .into_iter()
            .map(|base| {
                let customization = by_prompt.remove(&base.id);
                ResolvedPrompt::merge(base, customization.as_ref())
            })
            .collect();

        if !by_prompt.is_empty() {
            tracing::warn!(
                "Owner '{}' has {} customization(s) for prompts missing from the catalog",
                owner_id,
                by_prompt.len()
            );
        }

        if self.caching_enabled() {
            let mut cache = self.cache.write().await;
            if cache.generation == generation {
                let ttl = self.cache_ttl;
                cache.entries.retain(|_, e| e.fetched_at.elapsed() < ttl);
                cache.entries.insert(
                    owner_id.to_string(),
                    CachedResolution {
                        prompts: resolved.clone(),
                        fetched_at: Instant::now(),
                    },
                );
            }
        }

        Ok(resolved)
    }

    /// Resolve a single base prompt for `owner_id`
    pub async fn resolve_one(&self, prompt_id: &str, owner_id: &str) -> Result<ResolvedPrompt> {
        let base = self
            .catalog
            .get_base_prompt(prompt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt '{}' not found", prompt_id)))?;

        let customization = self
            .store
            .get(&CustomizationKey::new(prompt_id, owner_id))
            .await?;

        Ok(ResolvedPrompt::merge(base, customization.as_ref()))
    }

    /// Drop anything cached for `owner_id`. Called after every customization write.
    pub async fn invalidate(&self, owner_id: &str) {
        let mut cache = self.cache.write().await;
        cache.generation = cache.generation.wrapping_add(1);
        cache.entries.remove(owner_id);
    }
}
