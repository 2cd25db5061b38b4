use crate::bootstrap::App;
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use cairn_memory::{Author, MemoryStore, MemoryType, NewMemory};
use std::str::FromStr;
use tracing::instrument;

#[instrument(skip(app))]
#[allow(clippy::too_many_arguments)]
pub async fn run(
    app: &App,
    output: OutputFormat,
    content: String,
    project: String,
    memory_type: String,
    importance: f32,
    tags: Vec<String>,
    session_id: Option<String>,
) -> Result<()> {
    let memory_type = MemoryType::from_str(&memory_type).map_err(anyhow::Error::msg)?;
    let new_memory = NewMemory {
        content,
        project,
        memory_type,
        importance,
        tags,
        session_id,
        author: Author::User,
        related_files: Vec::new(),
    };

    let receipt = app.memory_store.store(new_memory).await.context("storing memory")?;

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"id": receipt.id, "created_at": receipt.created_at}));
        }
        OutputFormat::Text => println!("stored memory {} at {}", receipt.id, receipt.created_at),
    }
    Ok(())
}
