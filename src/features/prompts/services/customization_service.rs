use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Instrument;
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::features::prompts::models::{normalize_content, Customization, CustomizationKey};
use crate::features::prompts::services::{CustomizationStore, PromptCatalog, ResolverService};

/// What an edit did to the owner's customization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EditOutcome {
    Created,
    Updated,
    Deleted,
}

impl EditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditOutcome::Created => "created",
            EditOutcome::Updated => "updated",
            EditOutcome::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditResult {
    pub outcome: EditOutcome,
    /// The record as it stands after the edit; `None` once deleted
    pub customization: Option<Customization>,
}

type KeyLock = Arc<tokio::sync::Mutex<()>>;
type KeyLockMap = Mutex<HashMap<CustomizationKey, KeyLock>>;

/// Owns every create/update/delete of a customization.
///
/// Per (prompt, owner) the state is either "no customization" or "has
/// customization". Blank edit text collapses to a delete. Operations on the
/// same key are serialized; distinct keys run independently.
///
/// A mutation and the cache invalidation that follows it run on their own
/// task, so they complete even if the caller goes away mid-request.
pub struct CustomizationService {
    catalog: Arc<dyn PromptCatalog>,
    store: Arc<dyn CustomizationStore>,
    resolver: Arc<ResolverService>,
    key_locks: Arc<KeyLockMap>,
}

impl std::fmt::Debug for CustomizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomizationService")
            .field("catalog", &"<PromptCatalog>")
            .field("store", &"<CustomizationStore>")
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl CustomizationService {
    pub fn new(
        catalog: Arc<dyn PromptCatalog>,
        store: Arc<dyn CustomizationStore>,
        resolver: Arc<ResolverService>,
    ) -> Self {
        Self {
            catalog,
            store,
            resolver,
            key_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Single entry point for edits coming from the outside.
    ///
    /// Blank `raw_text` deletes (a no-op when nothing exists); anything else
    /// creates or replaces the owner's customization.
    pub async fn submit_edit(
        &self,
        prompt_id: &str,
        owner_id: &str,
        raw_text: &str,
    ) -> Result<EditResult> {
        let key = CustomizationKey::new(prompt_id, owner_id);
        let normalized = normalize_content(raw_text).map(str::to_owned);

        if normalized.is_some() && self.catalog.get_base_prompt(prompt_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Prompt '{}' not found",
                prompt_id
            )));
        }

        let store = Arc::clone(&self.store);
        let resolver = Arc::clone(&self.resolver);
        let edit_key = key.clone();

        self.run_exclusive(key, async move {
            let result =
                apply_edit(store.as_ref(), &resolver, &edit_key, normalized.as_deref()).await?;
            tracing::info!(
                prompt_id = %edit_key.prompt_id,
                owner_id = %edit_key.owner_id,
                outcome = result.outcome.as_str(),
                "Customization edit applied"
            );
            Ok(result)
        })
        .await
    }

    /// Explicit delete. Fails with `NotFound` when there is nothing to delete;
    /// callers wanting idempotency should treat that as success.
    pub async fn delete_customization(
        &self,
        prompt_id: &str,
        owner_id: &str,
    ) -> Result<Customization> {
        let key = CustomizationKey::new(prompt_id, owner_id);
        let store = Arc::clone(&self.store);
        let resolver = Arc::clone(&self.resolver);
        let remove_key = key.clone();

        self.run_exclusive(key, async move {
            let removed = store.remove(&remove_key).await?;
            resolver.invalidate(&remove_key.owner_id).await;
            tracing::info!(
                prompt_id = %remove_key.prompt_id,
                owner_id = %remove_key.owner_id,
                "Customization deleted"
            );
            Ok(removed)
        })
        .await
    }

    /// Run `op` on a spawned task while holding the lock for `key`.
    ///
    /// Dropping the returned future detaches the task instead of cancelling it.
    async fn run_exclusive<T, Fut>(&self, key: CustomizationKey, op: Fut) -> Result<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let label = key.to_string();
        let locks = Arc::clone(&self.key_locks);

        let task = async move {
            let lock = lock_for(&locks, &key);
            let result = {
                let _guard = lock.lock().await;
                op.await
            };
            drop(lock);
            prune_lock(&locks, &key);
            result
        };

        match tokio::spawn(task.in_current_span()).await {
            Ok(result) => result,
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    "panicked"
                } else {
                    "was cancelled"
                };
                tracing::error!("Customization write for {} {}: {}", label, reason, join_error);
                Err(AppError::NotAvailable(format!(
                    "customization write for {} {}",
                    label, reason
                )))
            }
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

async fn apply_edit(
    store: &dyn CustomizationStore,
    resolver: &ResolverService,
    key: &CustomizationKey,
    normalized: Option<&str>,
) -> Result<EditResult> {
    let existing = store.get(key).await?;

    let result = match (normalized, existing) {
        (None, None) => {
            tracing::debug!("Blank edit for {} with no customization, nothing to do", key);
            return Ok(EditResult {
                outcome: EditOutcome::Deleted,
                customization: None,
            });
        }
        (None, Some(_)) => {
            match store.remove(key).await {
                Ok(_) => {}
                // Removed by another writer in between; the end state is the same
                Err(AppError::NotFound(_)) => {
                    tracing::debug!("Customization for {} already gone", key);
                }
                Err(e) => return Err(e),
            }
            EditResult {
                outcome: EditOutcome::Deleted,
                customization: None,
            }
        }
        (Some(content), None) => EditResult {
            outcome: EditOutcome::Created,
            customization: Some(store.upsert(key, content).await?),
        },
        (Some(content), Some(_)) => EditResult {
            outcome: EditOutcome::Updated,
            customization: Some(store.upsert(key, content).await?),
        },
    };

    resolver.invalidate(&key.owner_id).await;
    Ok(result)
}

fn lock_for(locks: &KeyLockMap, key: &CustomizationKey) -> KeyLock {
    let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key.clone()).or_default())
}

fn prune_lock(locks: &KeyLockMap, key: &CustomizationKey) {
    let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);
    if locks
        .get(key)
        .is_some_and(|lock| Arc::strong_count(lock) == 1)
    {
        locks.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        base_prompt, summarize_prompt, InMemoryCustomizationStore, InMemoryPromptCatalog,
    };
    use fake::faker::internet::en::Username;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;
    use std::time::Duration;

    struct Harness {
        catalog: Arc<InMemoryPromptCatalog>,
        store: Arc<InMemoryCustomizationStore>,
        resolver: Arc<ResolverService>,
        service: Arc<CustomizationService>,
    }

    fn harness_with_ttl(ttl: Duration) -> Harness {
        let catalog = Arc::new(InMemoryPromptCatalog::new(vec![
            summarize_prompt(),
            base_prompt("p2", 1),
        ]));
        let store = Arc::new(InMemoryCustomizationStore::new());
        let resolver = Arc::new(ResolverService::new(
            catalog.clone(),
            store.clone(),
            ttl,
        ));
        let service = Arc::new(CustomizationService::new(
            catalog.clone(),
            store.clone(),
            Arc::clone(&resolver),
        ));
        Harness {
            catalog,
            store,
            resolver,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with_ttl(Duration::ZERO)
    }

    async fn instruction_for(h: &Harness, prompt_id: &str, owner_id: &str) -> Option<String> {
        h.resolver
            .resolve(owner_id)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.id == prompt_id)
            .and_then(|p| p.effective_instruction)
    }

    #[tokio::test]
    async fn test_blank_edit_without_customization_is_noop_delete() {
        let h = harness();

        let result = h.service.submit_edit("p1", "u1", "  ").await.unwrap();

        assert_eq!(result.outcome, EditOutcome::Deleted);
        assert!(result.customization.is_none());
        assert_eq!(h.store.count_for("p1", "u1"), 0);
        assert_eq!(h.store.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_first_edit_creates() {
        let h = harness();

        let result = h.service.submit_edit("p1", "u1", "Do X").await.unwrap();

        assert_eq!(result.outcome, EditOutcome::Created);
        assert_eq!(result.customization.unwrap().content, "Do X");
        assert_eq!(instruction_for(&h, "p1", "u1").await.as_deref(), Some("Do X"));
    }

    #[tokio::test]
    async fn test_second_edit_updates_in_place() {
        let h = harness();
        let created = h.service.submit_edit("p1", "u1", "Do X").await.unwrap();

        let updated = h.service.submit_edit("p1", "u1", "Do Y").await.unwrap();

        assert_eq!(updated.outcome, EditOutcome::Updated);
        assert_eq!(
            created.customization.unwrap().id,
            updated.customization.unwrap().id
        );
        assert_eq!(h.store.count_for("p1", "u1"), 1);
        assert_eq!(instruction_for(&h, "p1", "u1").await.as_deref(), Some("Do Y"));
    }

    #[tokio::test]
    async fn test_edit_is_trimmed_before_storing() {
        let h = harness();

        let result = h
            .service
            .submit_edit("p1", "u1", "\n  Be concise  \t")
            .await
            .unwrap();

        assert_eq!(result.customization.unwrap().content, "Be concise");
    }

    #[tokio::test]
    async fn test_empty_edit_deletes_existing() {
        let h = harness();
        h.service.submit_edit("p1", "u1", "Do X").await.unwrap();

        let result = h.service.submit_edit("p1", "u1", "").await.unwrap();

        assert_eq!(result.outcome, EditOutcome::Deleted);
        assert_eq!(h.store.count_for("p1", "u1"), 0);
        assert_eq!(instruction_for(&h, "p1", "u1").await, None);
    }

    #[tokio::test]
    async fn test_explicit_delete() {
        let h = harness();
        h.service.submit_edit("p1", "u1", "Do X").await.unwrap();

        let removed = h.service.delete_customization("p1", "u1").await.unwrap();

        assert_eq!(removed.content, "Do X");
        assert_eq!(instruction_for(&h, "p1", "u1").await, None);
    }

    #[tokio::test]
    async fn test_explicit_delete_of_absent_is_not_found_and_repeatable() {
        let h = harness();

        let first = h.service.delete_customization("p1", "u1").await;
        let second = h.service.delete_customization("p1", "u1").await;

        assert!(matches!(first, Err(AppError::NotFound(_))));
        assert!(matches!(second, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_of_unknown_prompt_is_not_found() {
        let h = harness();

        let result = h.service.submit_edit("ghost", "u1", "Do X").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(h.store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_edit_of_unknown_prompt_is_noop() {
        let h = harness();

        let result = h.service.submit_edit("ghost", "u1", "").await.unwrap();

        assert_eq!(result.outcome, EditOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_store_outage_is_surfaced() {
        let h = harness();
        h.store.set_available(false);

        let edit = h.service.submit_edit("p1", "u1", "Do X").await;
        let delete = h.service.delete_customization("p1", "u1").await;

        assert!(matches!(edit, Err(AppError::NotAvailable(_))));
        assert!(matches!(delete, Err(AppError::NotAvailable(_))));
    }

    #[tokio::test]
    async fn test_catalog_outage_blocks_non_empty_edit() {
        let h = harness();
        h.catalog.set_available(false);

        let result = h.service.submit_edit("p1", "u1", "Do X").await;

        assert!(matches!(result, Err(AppError::NotAvailable(_))));
    }

    #[tokio::test]
    async fn test_edits_invalidate_cached_resolution() {
        let h = harness_with_ttl(Duration::from_secs(300));
        assert_eq!(instruction_for(&h, "p1", "u1").await, None);

        h.service.submit_edit("p1", "u1", "Do X").await.unwrap();
        assert_eq!(instruction_for(&h, "p1", "u1").await.as_deref(), Some("Do X"));

        h.service.submit_edit("p1", "u1", "Do Y").await.unwrap();
        assert_eq!(instruction_for(&h, "p1", "u1").await.as_deref(), Some("Do Y"));

        h.service.delete_customization("p1", "u1").await.unwrap();
        assert_eq!(instruction_for(&h, "p1", "u1").await, None);
    }

    #[tokio::test]
    async fn test_summarize_scenario() {
        let h = harness();

        let before = h.resolver.resolve("u1").await.unwrap();
        assert_eq!(before[0].id, "p1");
        assert_eq!(before[0].content, "Summarize: {text}");
        assert_eq!(before[0].model, "gpt-4");
        assert_eq!(before[0].temperature, 0.7);
        assert_eq!(before[0].effective_instruction, None);

        let created = h.service.submit_edit("p1", "u1", "Be concise").await.unwrap();
        assert_eq!(created.outcome, EditOutcome::Created);
        assert_eq!(
            h.resolver.resolve("u1").await.unwrap()[0]
                .effective_instruction
                .as_deref(),
            Some("Be concise")
        );

        let deleted = h.service.submit_edit("p1", "u1", "").await.unwrap();
        assert_eq!(deleted.outcome, EditOutcome::Deleted);
        assert_eq!(
            h.resolver.resolve("u1").await.unwrap()[0].effective_instruction,
            None
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_edits_on_distinct_keys_do_not_interfere() {
        let h = harness();
        let owners: Vec<String> = (0..16)
            .map(|i| format!("{}-{}", Username().fake::<String>(), i))
            .collect();

        let mut tasks = Vec::new();
        for owner in &owners {
            for prompt in ["p1", "p2"] {
                let service = Arc::clone(&h.service);
                let owner = owner.clone();
                let content = format!("{} for {}", Sentence(3..6).fake::<String>(), owner);
                tasks.push(tokio::spawn(async move {
                    let result = service.submit_edit(prompt, &owner, &content).await;
                    (prompt, owner, content, result)
                }));
            }
        }

        for joined in futures::future::join_all(tasks).await {
            let (prompt, owner, content, result) = joined.unwrap();
            let result = result.unwrap();
            assert_eq!(result.outcome, EditOutcome::Created);
            assert_eq!(
                instruction_for(&h, prompt, &owner).await.as_deref(),
                Some(content.as_str())
            );
        }

        assert_eq!(h.store.record_count(), owners.len() * 2);
        assert_eq!(h.service.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_edits_on_same_key_are_serialized() {
        let h = harness();
        // Reads yield, so unserialized writers would all see an empty slot
        h.store.set_yield_on_read(true);

        let edits = (0..8).map(|i| {
            let service = Arc::clone(&h.service);
            async move {
                service
                    .submit_edit("p1", "u1", &format!("edit {}", i))
                    .await
            }
        });

        let outcomes: Vec<EditOutcome> = futures::future::join_all(edits)
            .await
            .into_iter()
            .map(|result| result.unwrap().outcome)
            .collect();

        let created = outcomes
            .iter()
            .filter(|o| **o == EditOutcome::Created)
            .count();
        let updated = outcomes
            .iter()
            .filter(|o| **o == EditOutcome::Updated)
            .count();
        assert_eq!(created, 1);
        assert_eq!(updated, outcomes.len() - 1);
        assert_eq!(h.store.count_for("p1", "u1"), 1);
        assert_eq!(h.service.tracked_locks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_edit_still_invalidates_cache_and_releases_lock() {
        let h = harness_with_ttl(Duration::from_secs(300));
        assert_eq!(instruction_for(&h, "p1", "u1").await, None);
        h.store.set_write_delay(Duration::from_millis(200));

        // The caller gives up after the write lands but before it is acknowledged
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            h.service.submit_edit("p1", "u1", "Be concise"),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(h.store.count_for("p1", "u1"), 1);
        assert_eq!(h.service.tracked_locks(), 0);
        assert_eq!(
            instruction_for(&h, "p1", "u1").await.as_deref(),
            Some("Be concise")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_delete_still_invalidates_cache() {
        let h = harness_with_ttl(Duration::from_secs(300));
        h.service.submit_edit("p1", "u1", "Do X").await.unwrap();
        assert_eq!(instruction_for(&h, "p1", "u1").await.as_deref(), Some("Do X"));
        h.store.set_write_delay(Duration::from_millis(200));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            h.service.delete_customization("p1", "u1"),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(h.store.count_for("p1", "u1"), 0);
        assert_eq!(h.service.tracked_locks(), 0);
        assert_eq!(instruction_for(&h, "p1", "u1").await, None);
    }
}
