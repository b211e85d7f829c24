//! In-memory stand-ins for the Postgres catalog and customization store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::prompts::models::{BasePrompt, Customization, CustomizationKey};
use crate::features::prompts::services::customization_store::{ensure_storable, not_found};
use crate::features::prompts::services::{CustomizationStore, PromptCatalog};

pub fn base_prompt(id: &str, display_order: i32) -> BasePrompt {
    BasePrompt {
        id: id.to_string(),
        description: format!("Base prompt {}", id),
        content: format!("Template for {}: {{text}}", id),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.2,
        display_order,
    }
}

/// `p1`: "Summarize: {text}" on gpt-4 at 0.7
pub fn summarize_prompt() -> BasePrompt {
    BasePrompt {
        id: "p1".to_string(),
        description: "Summarize text".to_string(),
        content: "Summarize: {text}".to_string(),
        model: "gpt-4".to_string(),
        temperature: 0.7,
        display_order: 0,
    }
}

pub fn customization(prompt_id: &str, owner_id: &str, content: &str) -> Customization {
    let now = Utc::now();
    Customization {
        id: Uuid::now_v7(),
        prompt_id: prompt_id.to_string(),
        owner_id: owner_id.to_string(),
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn unavailable(operation: &str) -> AppError {
    AppError::NotAvailable(format!("{}: in-memory store switched off", operation))
}

pub struct InMemoryPromptCatalog {
    prompts: Vec<BasePrompt>,
    available: AtomicBool,
    list_calls: AtomicUsize,
}

impl InMemoryPromptCatalog {
    pub fn new(prompts: Vec<BasePrompt>) -> Self {
        Self {
            prompts,
            available: AtomicBool::new(true),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PromptCatalog for InMemoryPromptCatalog {
    async fn list_base_prompts(&self) -> Result<Vec<BasePrompt>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(unavailable("list base prompts"));
        }
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.prompts.clone())
    }
}

#[derive(Default)]
pub struct InMemoryCustomizationStore {
    records: Mutex<HashMap<CustomizationKey, Customization>>,
    offline: AtomicBool,
    write_calls: AtomicUsize,
    write_delay_ms: AtomicU64,
    yield_on_read: AtomicBool,
}

impl InMemoryCustomizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    /// Seed a record directly, skipping every check
    pub fn insert_raw(&self, prompt_id: &str, owner_id: &str, content: &str) {
        let record = customization(prompt_id, owner_id, content);
        self.records
            .lock()
            .unwrap()
            .insert(CustomizationKey::new(prompt_id, owner_id), record);
    }

    /// Delay every upsert/remove acknowledgement; the write itself lands first
    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Yield to the scheduler after `get` reads, letting other writers interleave
    pub fn set_yield_on_read(&self, enabled: bool) {
        self.yield_on_read.store(enabled, Ordering::SeqCst);
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn count_for(&self, prompt_id: &str, owner_id: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.prompt_id == prompt_id && c.owner_id == owner_id)
            .count()
    }

    /// Number of upsert/remove calls that reached the store
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unavailable(operation));
        }
        Ok(())
    }

    async fn acknowledge_write(&self) {
        let delay_ms = self.write_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
}

#[async_trait]
impl CustomizationStore for InMemoryCustomizationStore {
    async fn get(&self, key: &CustomizationKey) -> Result<Option<Customization>> {
        self.check_available("get customization")?;
        let snapshot = self.records.lock().unwrap().get(key).cloned();
        if self.yield_on_read.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(snapshot)
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Customization>> {
        self.check_available("list customizations")?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, key: &CustomizationKey, content: &str) -> Result<Customization> {
        self.check_available("upsert customization")?;
        ensure_storable(key, content)?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        let record = {
            let mut records = self.records.lock().unwrap();
            let record = match records.get(key) {
                Some(existing) => Customization {
                    content: content.to_string(),
                    updated_at: Utc::now(),
                    ..existing.clone()
                },
                None => customization(&key.prompt_id, &key.owner_id, content),
            };
            records.insert(key.clone(), record.clone());
            record
        };
        self.acknowledge_write().await;
        Ok(record)
    }

    async fn remove(&self, key: &CustomizationKey) -> Result<Customization> {
        self.check_available("remove customization")?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let removed = self.records.lock().unwrap().remove(key);
        self.acknowledge_write().await;
        removed.ok_or_else(|| not_found(key))
    }
}
