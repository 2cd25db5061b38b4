//! Local inference over Candle: GGUF LLaMA-family generation and BERT-family
//! embedding, both running fully in-process with no external server.

mod embedder;
mod gguf_loader;
mod hf_downloader;
mod llm;
mod model_type;
mod model_wrapper;
mod sampling;
mod tokenizer_loader;

pub use embedder::CandleEmbedder;
pub use gguf_loader::{GGUFLoader, GGUFMetadata};
pub use hf_downloader::{HFDownloader, HFModelRepo};
pub use llm::{default_model_directory, resolve_device, CandleLlm};
pub use model_type::ModelArchitecture;
pub use model_wrapper::ModelWrapper;
pub use sampling::{sample_token, SamplingConfig};
pub use tokenizer_loader::TokenizerLoader;
