//! `Memory`/`Project`/`MemoryRelation` data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Reserved project name whose rule-type memories are visible from every other project.
pub use cairn_core::types::GLOBAL_PROJECT;

/// Closed memory-type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryType {
    Note,
    Decision,
    Rule,
    CodeSnippet,
    Learning,
    Research,
    Discussion,
    Progress,
    Task,
    Debug,
    Design,
}

impl MemoryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Decision => "decision",
            Self::Rule => "rule",
            Self::CodeSnippet => "code-snippet",
            Self::Learning => "learning",
            Self::Research => "research",
            Self::Discussion => "discussion",
            Self::Progress => "progress",
            Self::Task => "task",
            Self::Debug => "debug",
            Self::Design => "design",
        }
    }
}

impl FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Self::Note),
            "decision" => Ok(Self::Decision),
            "rule" => Ok(Self::Rule),
            "code-snippet" | "code_snippet" => Ok(Self::CodeSnippet),
            "learning" => Ok(Self::Learning),
            "research" => Ok(Self::Research),
            "discussion" => Ok(Self::Discussion),
            "progress" => Ok(Self::Progress),
            "task" => Ok(Self::Task),
            "debug" => Ok(Self::Debug),
            "design" => Ok(Self::Design),
            other => Err(format!("unknown memory type: {other}")),
        }
    }
}

impl Default for MemoryType {
    fn default() -> Self {
        Self::Note
    }
}

/// Who authored a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Author {
    User,
    Assistant,
    Collaborative,
    System,
}

impl FromStr for Author {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "collaborative" => Ok(Self::Collaborative),
            "system" => Ok(Self::System),
            other => Err(format!("unknown author: {other}")),
        }
    }
}

impl Author {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Collaborative => "collaborative",
            Self::System => "system",
        }
    }
}

/// A memory row.
///
/// Invariants (enforced by [`crate::store::MemoryStore`] implementations, not by this struct
/// alone): `embedding.len` equals the embedder's configured dimension; `active == true` implies
/// `embedding` is non-empty; a memory belongs to exactly one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: i64,
    pub project: String,
    pub content: String,
    pub summary: Option<String>,
    pub memory_type: MemoryType,
    pub importance: f32,
    pub tags: HashSet<String>,
    pub auto_tags: HashSet<String>,
    pub related_files: Vec<String>,
    pub session_id: Option<String>,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    pub inactivation_reason: Option<String>,
    pub embedding: Vec<f32>,
}

/// Parameters for [`crate::store::MemoryStore::store`].
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub content: String,
    pub project: String,
    pub memory_type: MemoryType,
    pub importance: f32,
    pub tags: Vec<String>,
    pub session_id: Option<String>,
    pub author: Author,
    pub related_files: Vec<String>,
}

impl NewMemory {
    #[must_use]
    pub fn new(content: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            project: project.into(),
            memory_type: MemoryType::Note,
            importance: 0.5,
            tags: Vec::new(),
            session_id: None,
            author: Author::User,
            related_files: Vec::new(),
        }
    }
}

/// `modify(id, action,...)`.
#[derive(Debug, Clone)]
pub enum ModifyAction {
    Update {
        content: Option<String>,
        summary: Option<String>,
        importance: Option<f32>,
        tags: Option<Vec<String>>,
    },
    Inactivate {
        reason: Option<String>,
    },
}

/// A project. Created lazily by first reference; soft-delete only (no hard delete operation is
/// exposed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Relation vocabulary for [`MemoryRelation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    Related,
    Extends,
    Contradicts,
    Implements,
    DependsOn,
}

impl RelationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::Extends => "extends",
            Self::Contradicts => "contradicts",
            Self::Implements => "implements",
            Self::DependsOn => "depends_on",
        }
    }
}

/// A directed edge between two memories. No self-loops; at most one edge per (source, target,
/// relation) — enforced by storage unique constraint, not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRelation {
    pub source_id: i64,
    pub target_id: i64,
    pub relation: RelationKind,
    pub created_at: DateTime<Utc>,
}
