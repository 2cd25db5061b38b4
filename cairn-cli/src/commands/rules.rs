use crate::bootstrap::App;
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use cairn_memory::MemoryStore;
use tracing::instrument;

#[instrument(skip(app))]
pub async fn run(app: &App, output: OutputFormat, project: String) -> Result<()> {
    let rules = app.memory_store.get_rules(&project).await.context("fetching rules")?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
        OutputFormat::Text => {
            if rules.is_empty() {
                println!("no rules visible to {project}");
            }
            for rule in &rules {
                println!("#{} ({}) {}", rule.id, rule.project, rule.content);
            }
        }
    }
    Ok(())
}
