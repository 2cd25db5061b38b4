//! Wires `memory.created` events to [`KnowledgeExtractor`]: the async half of ingestion that turns
//! a stored memory into graph entities/statements/triples without blocking `MemoryStore::store`.

use crate::extractor::KnowledgeExtractor;
use async_trait::async_trait;
use cairn_events::{Listener, MemoryEvent, Payload, Topic};
use cairn_storage::Storage;
use std::sync::Arc;

/// Registers for [`Topic::MemoryCreated`] only; `memory.updated` / `memory.inactivated` don't re-
/// run extraction.
pub struct EnrichmentListener {
    storage: Arc<dyn Storage>,
    extractor: Arc<KnowledgeExtractor>,
}

impl EnrichmentListener {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, extractor: Arc<KnowledgeExtractor>) -> Self {
        Self { storage, extractor }
    }
}

#[async_trait]
impl Listener for EnrichmentListener {
    fn name(&self) -> &str {
        "knowledge-extraction"
    }

    fn topics(&self) -> &[Topic] {
        &[Topic::MemoryCreated]
    }

    /// Idempotent re-running extraction for an already-enriched memory merges into existing entities
    /// rather than duplicating them (the merge-by-similarity step in
    /// `KnowledgeExtractor::resolve_and_persist`), so at-least-once redelivery is safe.
    async fn handle(&self, event: &MemoryEvent) -> anyhow::Result<()> {
        let Payload::Created(payload) = &event.payload else {
            return Ok(());
        };
        if !payload.enrich {
            return Ok(());
        }

        let Some(row) = self.storage.get_memory(event.memory_id).await? else {
            tracing::warn!(memory_id = event.memory_id, "enrichment skipped: memory not found");
            return Ok(());
        };

        let extraction = self.extractor.extract(&row.content).await;
        let counts = self.extractor.resolve_and_persist(&extraction, &event.project, event.memory_id).await;
        tracing::debug!(
            memory_id = event.memory_id,
            entities_created = counts.entities_created,
            entities_merged = counts.entities_merged,
            statements_created = counts.statements_created,
            "enrichment complete"
        );
        Ok(())
    }
}
