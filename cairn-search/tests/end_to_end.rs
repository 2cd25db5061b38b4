//! End-to-end scenarios from, run against real (embedded) storage and graph backends plus
//! deterministic embedder/LLM doubles -- no live network calls, matching fixture-based integration
//! style.

use async_trait::async_trait;
use cairn_core::types::l2_normalize;
use cairn_core::{CairnError, Embedder, Llm};
use cairn_core::traits::llm::Message;
use cairn_events::{Dispatcher, EventBus, OutboxRelay};
use cairn_graph::storage::surrealdb::SurrealDbGraph;
use cairn_graph::traits::knowledge_graph::GraphProvider;
use cairn_graph::types::{Aspect, EntityType};
use cairn_memory::store::MemoryStore;
use cairn_memory::sqlite_store::SqliteMemoryStore;
use cairn_memory::types::NewMemory;
use cairn_search::engine::SearchEngine;
use cairn_search::extractor::{ExtractedEntity, ExtractedStatement, Extraction, KnowledgeExtractor};
use cairn_search::handlers::entity_lookup::handle_entity_lookup;
use cairn_search::handlers::temporal::handle_temporal;
use cairn_search::types::{SearchRequest, TemporalBounds};
use cairn_storage::SqliteStorage;
use std::collections::HashMap;
use std::sync::Arc;

/// A deterministic bag-of-words embedder: each lowercase word hashes into
/// one of [`Self::DIMS`] buckets, summed and L2-normalized. Good enough to
/// make cosine similarity track lexical overlap without any model weights.
struct FakeEmbedder;

impl FakeEmbedder {
    const DIMS: usize = 32;
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn dimensions(&self) -> usize {
        Self::DIMS
    }

    fn name(&self) -> &str {
        "fake-bow"
    }

    async fn embed(&self, text: &str) -> cairn_core::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; Self::DIMS];
        for word in text.to_lowercase().split_whitespace() {
            let mut hash: u32 = 2166136261;
            for byte in word.bytes() {
                hash ^= u32::from(byte);
                hash = hash.wrapping_mul(16777619);
            }
            let bucket = (hash as usize) % Self::DIMS;
            vector[bucket] += 1.0;
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

/// An `Llm` double that always errors, for scenarios exercising the
/// fallback contract ("if the LLM returns invalid JSON twice, search still
/// returns results").
struct FailingLlm;

#[async_trait]
impl Llm for FailingLlm {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _messages: &[Message], _max_tokens: u32) -> cairn_core::Result<String> {
        Err(CairnError::transient("failing-llm", "always fails"))
    }
}

async fn graph() -> Arc<dyn GraphProvider> {
    Arc::new(SurrealDbGraph::new_temp().await.unwrap())
}

async fn store_with_events() -> (Arc<dyn cairn_storage::Storage>, Arc<SqliteMemoryStore>) {
    let storage: Arc<dyn cairn_storage::Storage> = Arc::new(SqliteStorage::open_in_memory().await.unwrap());
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);
    let dispatcher = Arc::new(Dispatcher::new(EventBus::new()));
    let relay = Arc::new(OutboxRelay::new(Arc::clone(&storage), dispatcher));
    let memory_store = Arc::new(SqliteMemoryStore::new(Arc::clone(&storage), embedder, relay));
    (storage, memory_store)
}

/// Scenario 1: ingest + vector hit.
#[tokio::test]
async fn ingest_and_vector_hit() {
    let (storage, memory_store) = store_with_events().await;
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);

    memory_store
        .store(NewMemory::new(
            "Decided to use Neo4j for the knowledge graph; 10x faster BFS than Postgres",
            "proj",
        ))
        .await
        .unwrap();
    memory_store.store(NewMemory::new("unrelated note about lunch plans", "proj")).await.unwrap();

    let engine = SearchEngine::new(storage, memory_store, embedder);
    let request = SearchRequest::new("knowledge graph database choice");
    let results = engine.search(&request).await;

    assert!(!results.is_empty());
    assert!(results[0].content.as_deref().unwrap().contains("Neo4j"));
    assert!(results[0].score > 0.0);
}

/// Scenario 2: entity hop -- a memory that never mentions "Alice" is still
/// surfaced via hop-2 BFS from the entity "Alice" through "migration
/// project".
#[tokio::test]
async fn entity_hop_surfaces_indirectly_connected_episode() {
    let graph = graph().await;
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);

    let alice_embedding = embedder.embed("Alice").await.unwrap();
    let alice = graph
        .create_entity("Alice", EntityType::Person, alice_embedding, "proj", HashMap::new())
        .await
        .unwrap();
    let project_embedding = embedder.embed("migration project").await.unwrap();
    let migration = graph
        .create_entity("migration project", EntityType::Project, project_embedding, "proj", HashMap::new())
        .await
        .unwrap();

    // Episode 1 mentions Alice directly (hop 1).
    let fact_embedding = embedder.embed("Alice leads the migration project").await.unwrap();
    let statement_id = graph
        .create_statement(
            "Alice leads the migration project",
            fact_embedding,
            Aspect::Action,
            1,
            "proj",
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    graph.create_triple(statement_id, alice, "leads", Some(migration), None).await.unwrap();

    // Episode 2 only mentions the migration project, reachable from Alice
    // via hop-2 BFS through the shared entity.
    let fact2_embedding = embedder.embed("The migration project targets v2 completion in March").await.unwrap();
    let statement2_id = graph
        .create_statement(
            "The migration project targets v2 completion in March",
            fact2_embedding,
            Aspect::Goal,
            2,
            "proj",
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    graph.create_triple(statement2_id, migration, "targets", None, Some("v2 completion in March".to_string())).await.unwrap();

    let candidates = handle_entity_lookup(&graph, &embedder, &["Alice".to_string()], "proj", None).await;
    let episode_ids: Vec<i64> = candidates.iter().map(|c| c.memory_id).collect();

    assert!(episode_ids.contains(&1), "hop-1 episode missing: {episode_ids:?}");
    assert!(episode_ids.contains(&2), "hop-2 episode missing: {episode_ids:?}");
}

/// Scenario 3: contradiction -- re-extracting a fact about the same
/// (subject, predicate) invalidates the prior statement and is counted.
#[tokio::test]
async fn contradicting_statement_invalidates_the_prior_one() {
    let graph = graph().await;
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);
    let llm: Arc<dyn Llm> = Arc::new(FailingLlm);
    let extractor = KnowledgeExtractor::new(llm, Arc::clone(&graph), Arc::clone(&embedder));

    let first = Extraction {
        entities: vec![ExtractedEntity {
            name: "prod-1".to_string(),
            entity_type: EntityType::Technology,
            attributes: HashMap::new(),
        }],
        statements: vec![ExtractedStatement {
            subject: "prod-1".to_string(),
            predicate: "runs".to_string(),
            object: "Ubuntu 20.04".to_string(),
            object_is_entity: false,
            fact: "Server prod-1 runs Ubuntu 20.04".to_string(),
            aspect: Aspect::Knowledge,
            valid_at: None,
        }],
        tags: Vec::new(),
        importance: 0.5,
        summary: String::new(),
    };
    let counts1 = extractor.resolve_and_persist(&first, "proj", 1).await;
    assert_eq!(counts1.entities_created, 1);
    assert_eq!(counts1.statements_created, 1);
    assert_eq!(counts1.contradictions_found, 0);

    // Same subject/predicate, different object: the second extraction
    // merges the entity and invalidates the first statement.
    let mut second = first.clone();
    second.statements[0].fact = "Server prod-1 runs Ubuntu 22.04".to_string();
    second.statements[0].object = "Ubuntu 22.04".to_string();
    let counts2 = extractor.resolve_and_persist(&second, "proj", 2).await;

    assert_eq!(counts2.entities_created, 0);
    assert_eq!(counts2.entities_merged, 1);
    assert_eq!(counts2.contradictions_found, 1);

    let subject_id = {
        let similar = graph
            .find_similar_entities(&embedder.embed("prod-1").await.unwrap(), EntityType::Technology, "proj")
            .await;
        similar[0].id
    };
    let active = graph.find_contradictions(subject_id, "runs", "proj").await;
    // The first statement was invalidated; find_contradictions only
    // returns active statements sharing (subject, predicate), so the
    // surviving one is the second extraction's statement.
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].fact, "Server prod-1 runs Ubuntu 22.04");
}

/// Scenario 4: temporal -- a router-style bound of "7 days ago" excludes a
/// 30-day-old memory and includes today's.
#[tokio::test]
async fn temporal_window_excludes_old_memory() {
    let (storage, memory_store) = store_with_events().await;

    memory_store.store(NewMemory::new("recent memory about what happened", "proj")).await.unwrap();
    let old_id = memory_store.store(NewMemory::new("old memory from a month ago", "proj")).await.unwrap().id;

    // Backdate the older memory directly in storage (the public `store`
    // contract always stamps `created_at = now`).
    let mut row = storage.get_memory(old_id).await.unwrap().unwrap();
    row.created_at = chrono::Utc::now() - chrono::Duration::days(30);
    storage.update_memory(&row).await.unwrap();

    let bounds = TemporalBounds { after: Some("7 days ago".to_string()), before: None };
    let candidates = handle_temporal(&storage, &bounds, "proj").await;
    let ids: Vec<i64> = candidates.iter().map(|c| c.memory_id).collect();

    assert!(!ids.contains(&old_id));
    assert_eq!(ids.len(), 1);
}

/// Scenario 6: graceful degrade -- with the graph provider down (a stub that always returns empty),
/// `handle_entity_lookup` output is empty, so the orchestrator falls through to the RRF pool
/// unchanged.
#[tokio::test]
async fn entity_lookup_degrades_to_empty_when_graph_is_unreachable() {
    struct DownGraph;

    #[async_trait]
    impl GraphProvider for DownGraph {
        async fn create_entity(
            &self,
            _name: &str,
            _entity_type: EntityType,
            _embedding: Vec<f32>,
            _project: &str,
            _attributes: HashMap<String, String>,
        ) -> cairn_graph::error::Result<uuid::Uuid> {
            Err(cairn_graph::error::GraphError::Unavailable("down".to_string()))
        }
        async fn find_similar_entities(&self, _: &[f32], _: EntityType, _: &str) -> Vec<cairn_graph::types::Entity> {
            Vec::new()
        }
        async fn search_entities_by_embedding(&self, _: &[f32], _: &str, _: usize) -> Vec<cairn_graph::types::Entity> {
            Vec::new()
        }
        async fn create_statement(
            &self,
            _: &str,
            _: Vec<f32>,
            _: Aspect,
            _: i64,
            _: &str,
            _: chrono::DateTime<chrono::Utc>,
        ) -> cairn_graph::error::Result<uuid::Uuid> {
            Err(cairn_graph::error::GraphError::Unavailable("down".to_string()))
        }
        async fn create_triple(
            &self,
            _: uuid::Uuid,
            _: uuid::Uuid,
            _: &str,
            _: Option<uuid::Uuid>,
            _: Option<String>,
        ) -> cairn_graph::error::Result<()> {
            Err(cairn_graph::error::GraphError::Unavailable("down".to_string()))
        }
        async fn find_contradictions(&self, _: uuid::Uuid, _: &str, _: &str) -> Vec<cairn_graph::types::Statement> {
            Vec::new()
        }
        async fn invalidate_statement(&self, _: uuid::Uuid, _: &str) -> cairn_graph::error::Result<()> {
            Err(cairn_graph::error::GraphError::Unavailable("down".to_string()))
        }
        async fn find_entity_episodes(&self, _: uuid::Uuid) -> Vec<i64> {
            Vec::new()
        }
        async fn find_entity_statements(&self, _: uuid::Uuid, _: Option<&[Aspect]>) -> Vec<cairn_graph::types::Statement> {
            Vec::new()
        }
        async fn find_connecting_statements(&self, _: uuid::Uuid, _: uuid::Uuid) -> Vec<cairn_graph::types::Statement> {
            Vec::new()
        }
        async fn bfs_traverse(&self, _: uuid::Uuid, _: usize) -> Vec<cairn_graph::types::Statement> {
            Vec::new()
        }
        async fn search_statements_by_aspect(&self, _: &[Aspect], _: &str) -> Vec<i64> {
            Vec::new()
        }
        async fn get_knowledge_graph_visualization(
            &self,
            _: &str,
            _: Option<&[EntityType]>,
            _: usize,
        ) -> cairn_graph::types::GraphVisualization {
            cairn_graph::types::GraphVisualization::default()
        }
    }

    let graph: Arc<dyn GraphProvider> = Arc::new(DownGraph);
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);

    let candidates = handle_entity_lookup(&graph, &embedder, &["Alice".to_string()], "proj", None).await;
    assert!(candidates.is_empty());
}
