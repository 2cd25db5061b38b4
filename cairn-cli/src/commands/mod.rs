//! Subcommand handlers. Each takes the already-built [`crate::bootstrap::App`]
//! and the resolved output format, and is responsible only for argument ->
//! domain-type conversion, the call itself, and rendering.

mod modify;
mod recall;
mod rules;
mod search;
mod store;

use crate::bootstrap::App;
use crate::cli::{Commands, OutputFormat};
use anyhow::Result;

pub async fn execute(command: Commands, app: App, output: OutputFormat) -> Result<()> {
    match command {
        Commands::Store { content, project, memory_type, importance, tags, session_id } => {
            store::run(&app, output, content, project, memory_type, importance, tags, session_id).await
        }
        Commands::Search { query, project, mode, limit, full } => {
            search::run(&app, output, query, project, mode, limit, full).await
        }
        Commands::Recall { ids } => recall::run(&app, output, ids).await,
        Commands::Modify { id, content, summary, importance, tags, inactivate, reason } => {
            modify::run(&app, output, id, content, summary, importance, tags, inactivate, reason).await
        }
        Commands::Rules { project } => rules::run(&app, output, project).await,
    }
}
