use crate::bootstrap::App;
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use cairn_memory::MemoryStore;
use tracing::instrument;

#[instrument(skip(app))]
pub async fn run(app: &App, output: OutputFormat, ids: Vec<i64>) -> Result<()> {
    let memories = app.memory_store.recall(&ids).await.context("recalling memories")?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&memories)?),
        OutputFormat::Text => {
            if memories.is_empty() {
                println!("no matching memories");
            }
            for memory in &memories {
                println!("#{} ({}, {}) {}", memory.id, memory.project, memory.memory_type.as_str(), memory.content);
            }
        }
    }
    Ok(())
}
