//! `MemoryStore` implementation over `cairn-storage::Storage` + `cairn-core::Embedder`. Each write
//! enqueues its `memory.*` event in the same transaction (`cairn-storage`'s `*_with_event` methods),
//! then attempts delivery inline through `cairn-events::OutboxRelay` -- durable either way, since the
//! outbox row survives a crash between commit and delivery and a background relay can drain it later.

use crate::convert::new_memory_to_row;
use crate::error::{MemoryError, Result};
use crate::store::{MemoryStore, StoreReceipt};
use crate::types::{Memory, ModifyAction, NewMemory};
use async_trait::async_trait;
use cairn_core::types::GLOBAL_PROJECT;
use cairn_core::Embedder;
use cairn_events::{MemoryEvent, OutboxRelay, Topic};
use cairn_storage::{MemoryFilter, Storage};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

pub struct SqliteMemoryStore {
    storage: Arc<dyn Storage>,
    embedder: Arc<dyn Embedder>,
    relay: Arc<OutboxRelay>,
}

impl SqliteMemoryStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, embedder: Arc<dyn Embedder>, relay: Arc<OutboxRelay>) -> Self {
        Self { storage, embedder, relay }
    }

    async fn publish(&self, event_id: i64, event: MemoryEvent) {
        if let Err(err) = self.relay.deliver(event_id, event).await {
            warn!(error = %err, "failed to record event delivery outcome, outbox relay will retry it");
        }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn store(&self, new_memory: NewMemory) -> Result<StoreReceipt> {
        let embedding = self.embedder.embed(&new_memory.content).await.map_err(MemoryError::Embedding)?;
        if embedding.len() != self.embedder.dimensions() {
            return Err(MemoryError::DimensionMismatch {
                expected: self.embedder.dimensions(),
                actual: embedding.len(),
            });
        }

        let row = new_memory_to_row(&new_memory, embedding);
        let memory_type = row.memory_type.clone();
        let project = row.project.clone();

        let build_payload = {
            let project = project.clone();
            let memory_type = memory_type.clone();
            move |id: i64| {
                serde_json::to_value(MemoryEvent::created(project.clone(), id, &memory_type, true))
                    .expect("MemoryEvent always serializes")
            }
        };
        let (id, event_id) =
            self.storage.insert_memory_with_event(row, Topic::MemoryCreated.as_str(), &build_payload).await?;
        let created_at = Utc::now();

        self.publish(event_id, MemoryEvent::created(project, id, &memory_type, true)).await;

        Ok(StoreReceipt { id, created_at })
    }

    async fn recall(&self, ids: &[i64]) -> Result<Vec<Memory>> {
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(row) = self.storage.get_memory(id).await? {
                out.push(Memory::try_from(row)?);
            }
        }
        Ok(out)
    }

    async fn modify(&self, id: i64, action: ModifyAction) -> Result<Memory> {
        let row = self.storage.get_memory(id).await?.ok_or(MemoryError::NotFound(id))?;
        let mut memory = Memory::try_from(row)?;

        let topic = match &action {
            ModifyAction::Update { content, summary, importance, tags } => {
                if let Some(content) = content {
                    memory.content = content.clone();
                    memory.embedding =
                        self.embedder.embed(&memory.content).await.map_err(MemoryError::Embedding)?;
                }
                if let Some(summary) = summary {
                    memory.summary = Some(summary.clone());
                }
                if let Some(importance) = importance {
                    memory.importance = cairn_core::types::clamp01(*importance);
                }
                if let Some(tags) = tags {
                    memory.tags = tags.iter().cloned().collect();
                }
                Topic::MemoryUpdated
            }
            ModifyAction::Inactivate { reason } => {
                memory.active = false;
                memory.inactivation_reason = reason.clone();
                Topic::MemoryInactivated
            }
        };
        memory.updated_at = Utc::now();

        let storage_row = cairn_storage::MemoryRow {
            id: memory.id,
            project: memory.project.clone(),
            content: memory.content.clone(),
            summary: memory.summary.clone(),
            memory_type: memory.memory_type.as_str().to_string(),
            importance: memory.importance,
            tags: memory.tags.iter().cloned().collect(),
            auto_tags: memory.auto_tags.iter().cloned().collect(),
            related_files: memory.related_files.clone(),
            session_id: memory.session_id.clone(),
            author: memory.author.as_str().to_string(),
            created_at: memory.created_at,
            updated_at: memory.updated_at,
            active: memory.active,
            inactivation_reason: memory.inactivation_reason.clone(),
            embedding: memory.embedding.clone(),
        };
        let reason = match &action {
            ModifyAction::Inactivate { reason } => reason.clone(),
            ModifyAction::Update { .. } => None,
        };
        let event = MemoryEvent::mutated(topic, memory.project.clone(), memory.id, reason);
        let payload = serde_json::to_value(&event).expect("MemoryEvent always serializes");
        let event_id = self.storage.update_memory_with_event(&storage_row, topic.as_str(), payload).await?;

        self.publish(event_id, event).await;

        Ok(memory)
    }

    async fn get_rules(&self, project: &str) -> Result<Vec<Memory>> {
        let mut scopes = vec![project];
        if project != GLOBAL_PROJECT {
            scopes.push(GLOBAL_PROJECT);
        }

        let mut rules = Vec::new();
        for scope in scopes {
            let filter = MemoryFilter {
                project: Some(scope.to_string()),
                memory_type: Some("rule".to_string()),
                active_only: true,
                ..Default::default()
            };
            for row in self.storage.list_memories(&filter).await? {
                rules.push(Memory::try_from(row)?);
            }
        }
        Ok(rules)
    }

    async fn export_project(&self, project: &str) -> Result<Vec<Memory>> {
        let filter = MemoryFilter { project: Some(project.to_string()), active_only: false, ..Default::default() };
        self.storage
            .list_memories(&filter)
            .await?
            .into_iter()
            .map(Memory::try_from)
            .collect::<Result<Vec<_>>>()
    }
}
