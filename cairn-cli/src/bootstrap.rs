//! Wires `cairn-config`'s loaded configuration into a running `App`: storage, graph,
//! embedder/LLM/reranker, the memory store, the enrichment listener, and `SearchV2`.

use anyhow::{Context, Result};
use cairn_config::{CairnConfig, RelationalStorageConfig};
use cairn_core::Embedder;
use cairn_events::{Dispatcher, EventBus, OutboxRelay};
use cairn_graph::SurrealDbGraph;
use cairn_memory::{MemoryStore, SqliteMemoryStore};
use cairn_search::{EnrichmentListener, KnowledgeExtractor, QueryRouter, SearchEngine, SearchV2, SearchV2Config};
use cairn_storage::{SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outbox rows drained on startup to catch up on events a prior, abruptly-killed run enqueued but
/// never delivered.
const OUTBOX_CATCHUP_BATCH: usize = 256;

pub struct App {
    pub memory_store: Arc<dyn MemoryStore>,
    pub search: SearchV2,
}

/// Build every component from `config`, register the enrichment listener
/// against the event bus, and hand back the two entry points `cairn-cli`'s
/// commands call into.
///
/// # Errors
/// Returns an error if storage/graph initialization fails, or if a
/// configured provider backend can't be constructed (missing API key,
/// unreachable local model directory).
pub async fn build_app(config: &CairnConfig) -> Result<App> {
    let cache_dir = model_cache_dir();

    let storage: Arc<dyn Storage> = match &config.storage.relational {
        RelationalStorageConfig::Sqlite { path } => {
            Arc::new(SqliteStorage::open(path).await.with_context(|| format!("opening sqlite store at {path}"))?)
        }
        RelationalStorageConfig::Postgres { .. } => {
            anyhow::bail!("postgres storage is not wired into cairn-cli; build cairn-storage with the postgres feature and construct it directly")
        }
    };

    let graph = Arc::new(
        SurrealDbGraph::new(&config.storage.graph.path)
            .await
            .with_context(|| format!("opening graph store at {}", config.storage.graph.path))?,
    );

    let embedder: Arc<dyn Embedder> =
        cairn_providers::build_embedder(&config.providers.embedder, &cache_dir).context("building embedder backend")?;
    let llm = cairn_providers::build_llm(&config.providers.llm, &cache_dir).context("building llm backend")?;
    let reranker = cairn_providers::build_reranker(&config.providers.reranker).context("building reranker backend")?;

    let graph_provider: Arc<dyn cairn_graph::GraphProvider> = Arc::clone(&graph) as Arc<dyn cairn_graph::GraphProvider>;

    let bus = EventBus::new();
    let extractor = Arc::new(KnowledgeExtractor::new(Arc::clone(&llm), Arc::clone(&graph_provider), Arc::clone(&embedder)));
    let enrichment_listener: Arc<dyn cairn_events::Listener> = Arc::new(EnrichmentListener::new(Arc::clone(&storage), extractor));
    bus.register(enrichment_listener);
    let dispatcher = Arc::new(Dispatcher::new(bus));
    let relay = Arc::new(OutboxRelay::new(Arc::clone(&storage), dispatcher));

    // Pick up any events a previous run enqueued but never delivered (process killed between
    // commit and publish) before this run adds its own.
    if let Err(err) = relay.drain(OUTBOX_CATCHUP_BATCH).await {
        tracing::warn!(error = %err, "failed to drain outstanding outbox events on startup");
    }

    let memory_store: Arc<dyn MemoryStore> =
        Arc::new(SqliteMemoryStore::new(Arc::clone(&storage), Arc::clone(&embedder), relay));

    let engine = Arc::new(SearchEngine::new(Arc::clone(&storage), Arc::clone(&memory_store), Arc::clone(&embedder)));
    let router = Arc::new(QueryRouter::new(Arc::clone(&llm)));
    let reranker: Option<Arc<dyn cairn_search::Reranker>> =
        reranker.map(|r| Arc::new(cairn_search::reranker::ProviderRerankerAdapter::new(r)) as Arc<dyn cairn_search::Reranker>);

    let search_config = SearchV2Config {
        enhanced_enabled: true,
        rerank_enabled: reranker.is_some(),
        rerank_candidates: config.search.rerank_candidates,
        token_budget: config.search.token_budget,
    };
    let search = SearchV2::new(engine, Some(router), Some(graph_provider), embedder, storage, reranker, search_config);

    Ok(App { memory_store, search })
}

/// Directory local model backends (candle) download to / load from. `dirs::cache_dir` falls back to
/// the current directory if the platform cache directory can't be resolved.
fn model_cache_dir() -> PathBuf {
    dirs::cache_dir().unwrap_or_else(|| Path::new(".").to_path_buf()).join("cairn").join("models")
}
