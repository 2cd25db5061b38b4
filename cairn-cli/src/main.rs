//! `cairn`: a thin CLI over the core `store`/`search`/`recall`/`modify` operations, against local
//! (embedded) backends.

mod bootstrap;
mod cli;
mod commands;

use anyhow::Result;
use cairn_config::CairnConfig;
use clap::Parser;
use cli::Cli;
use std::io;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.trace);

    let config = CairnConfig::load(cli.config.as_deref())?;
    let app = bootstrap::build_app(&config).await?;

    commands::execute(cli.command, app, cli.output).await
}

/// Priority: `RUST_LOG` env var, then `--trace`. Tracing goes to stderr so
/// `--output json` output on stdout stays machine-parseable.
fn setup_tracing(trace_level: cli::TraceLevel) {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).with_target(false).init();
    } else {
        let level: tracing::Level = trace_level.into();
        tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).with_target(false).init();
    }
}
