use crate::bootstrap::App;
use crate::cli::{OutputFormat, SearchModeArg};
use anyhow::Result;
use cairn_search::{SearchFilters, SearchRequest};
use tracing::instrument;

#[instrument(skip(app))]
pub async fn run(
    app: &App,
    output: OutputFormat,
    query: String,
    project: Vec<String>,
    mode: SearchModeArg,
    limit: usize,
    full: bool,
) -> Result<()> {
    let mut request = SearchRequest::new(query);
    request.mode = mode.into();
    request.limit = limit;
    request.include_full = full;
    request.filters = SearchFilters { projects: (!project.is_empty()).then_some(project), memory_types: None };

    let results = app.search.search(&request).await;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => {
            if results.is_empty() {
                println!("no results");
            }
            for result in &results {
                println!(
                    "[{:.4}] #{} ({}, {}) {}",
                    result.score,
                    result.id,
                    result.project,
                    result.memory_type,
                    result.content.as_deref().unwrap_or(&result.summary)
                );
            }
        }
    }
    Ok(())
}
