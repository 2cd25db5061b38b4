//! CLI argument parsing: global flags plus the `store`/`search`/`recall`/ `modify`/`rules`
//! subcommands, a thin surface over the core operations in `cairn-memory` and `cairn-search`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Trace level for logging output. `Off` maps to `ERROR` since `tracing`
/// has no dedicated "off" level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TraceLevel> for tracing::Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off | TraceLevel::Error => Self::ERROR,
            TraceLevel::Warn => Self::WARN,
            TraceLevel::Info => Self::INFO,
            TraceLevel::Debug => Self::DEBUG,
            TraceLevel::Trace => Self::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(version)]
#[command(about = "Cairn -- hybrid semantic-memory retrieval over a local store")]
#[command(propagate_version = true)]
pub struct Cli {
    /// TOML configuration file (GLOBAL). Falls back to built-in defaults
    /// overlaid by `CAIRN_*` environment variables if unset or missing.
    #[arg(short = 'c', long, global = true, env = "CAIRN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Trace level (GLOBAL).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub trace: TraceLevel,

    /// Output format (GLOBAL).
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a new memory.
    Store {
        /// Memory content.
        content: String,
        /// Project name; created lazily if it doesn't exist.
        #[arg(short, long)]
        project: String,
        /// Memory type: note, decision, rule, code-snippet, learning,
        /// research, discussion, progress, task, debug, design.
        #[arg(short = 't', long, default_value = "note")]
        memory_type: String,
        #[arg(short, long, default_value_t = 0.5)]
        importance: f32,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Search across stored memories.
    Search {
        query: String,
        /// Restrict to one or more projects; omit to search every project.
        #[arg(short, long, value_delimiter = ',')]
        project: Vec<String>,
        #[arg(short, long, value_enum, default_value = "semantic")]
        mode: SearchModeArg,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Include full `content`, not just the summary.
        #[arg(long)]
        full: bool,
    },

    /// Fetch memories by id.
    Recall {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Update or inactivate a memory.
    Modify {
        id: i64,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        importance: Option<f32>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Inactivate instead of updating; mutually exclusive with the
        /// update fields above.
        #[arg(long)]
        inactivate: bool,
        #[arg(long, requires = "inactivate")]
        reason: Option<String>,
    },

    /// List the rule-type memories visible to a project.
    Rules {
        project: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchModeArg {
    Semantic,
    Keyword,
    Tag,
}

impl From<SearchModeArg> for cairn_search::SearchMode {
    fn from(mode: SearchModeArg) -> Self {
        match mode {
            SearchModeArg::Semantic => Self::Semantic,
            SearchModeArg::Keyword => Self::Keyword,
            SearchModeArg::Tag => Self::Tag,
        }
    }
}
