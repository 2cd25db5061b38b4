use crate::bootstrap::App;
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use cairn_memory::{MemoryStore, ModifyAction};
use tracing::instrument;

#[instrument(skip(app))]
#[allow(clippy::too_many_arguments)]
pub async fn run(
    app: &App,
    output: OutputFormat,
    id: i64,
    content: Option<String>,
    summary: Option<String>,
    importance: Option<f32>,
    tags: Option<Vec<String>>,
    inactivate: bool,
    reason: Option<String>,
) -> Result<()> {
    let action =
        if inactivate { ModifyAction::Inactivate { reason } } else { ModifyAction::Update { content, summary, importance, tags } };

    let memory = app.memory_store.modify(id, action).await.context("modifying memory")?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&memory)?),
        OutputFormat::Text => println!("memory {} active={} updated_at={}", memory.id, memory.active, memory.updated_at),
    }
    Ok(())
}
