//! Embedder and LLM backend implementations for Cairn: local inference over
//! Candle, a local Ollama server, hosted providers via `rig-core`, and any
//! OpenAI-compatible HTTP endpoint. [`abstraction`] turns a `cairn-config`
//! backend choice into the concrete `Box<dyn Embedder>`/`Box<dyn Llm>` the
//! retrieval pipeline runs against.

pub mod abstraction;
pub mod local;
pub mod model_specifier;
pub mod openai_compatible;
pub mod rig;

pub use abstraction::{build_embedder, build_llm, build_reranker};
pub use local::candle::{CandleEmbedder, CandleLlm};
pub use local::{
    DownloadStatus, HealthStatus, LocalModel, ModelInfo, ModelSpec, OllamaEmbedder, OllamaLlm,
    OllamaModelManager, PullProgress,
};
pub use model_specifier::ModelSpecifier;
pub use openai_compatible::{CloudReranker, OpenAiCompatibleEmbedder, OpenAiCompatibleLlm};
pub use rig::RigLlm;
