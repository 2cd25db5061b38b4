//! Knowledge-graph data model: the bipartite Entity/Statement/Triple trinity. Statements carry
//! facts extracted from memories ("episodes"); triples connect a statement's subject and object
//! entities (or a literal).

use cairn_core::types::truncate_words;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Maximum words kept in a statement's fact text; longer facts are truncated, never rejected.
pub const MAX_FACT_WORDS: usize = 20;

/// Entity type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EntityType {
    Person,
    Organization,
    Place,
    Event,
    Project,
    Task,
    Technology,
    Product,
    Concept,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
            Self::Place => "Place",
            Self::Event => "Event",
            Self::Project => "Project",
            Self::Task => "Task",
            Self::Technology => "Technology",
            Self::Product => "Product",
            Self::Concept => "Concept",
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "person" => Ok(Self::Person),
            "organization" | "org" => Ok(Self::Organization),
            "place" => Ok(Self::Place),
            "event" => Ok(Self::Event),
            "project" => Ok(Self::Project),
            "task" => Ok(Self::Task),
            "technology" | "tech" => Ok(Self::Technology),
            "product" => Ok(Self::Product),
            "concept" => Ok(Self::Concept),
            _ => Err(()),
        }
    }
}

/// Statement aspect vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Aspect {
    Identity,
    Knowledge,
    Belief,
    Preference,
    Action,
    Goal,
    Directive,
    Decision,
    Event,
    Problem,
    Relationship,
}

impl Aspect {
    pub const ALL: [Aspect; 11] = [
        Self::Identity,
        Self::Knowledge,
        Self::Belief,
        Self::Preference,
        Self::Action,
        Self::Goal,
        Self::Directive,
        Self::Decision,
        Self::Event,
        Self::Problem,
        Self::Relationship,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Knowledge => "Knowledge",
            Self::Belief => "Belief",
            Self::Preference => "Preference",
            Self::Action => "Action",
            Self::Goal => "Goal",
            Self::Directive => "Directive",
            Self::Decision => "Decision",
            Self::Event => "Event",
            Self::Problem => "Problem",
            Self::Relationship => "Relationship",
        }
    }

    /// Parse an aspect label, silently returning `None` for anything not in the closed vocabulary.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str().eq_ignore_ascii_case(s))
    }
}

/// An entity in the knowledge graph.
///
/// Invariant: within a project, `(entity_type, name_embedding)` is approximately unique — enforced
/// by callers via `GraphProvider::find_similar_entities` before creating a new row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub name: String,
    pub entity_type: EntityType,
    /// Unit-normalized embedding of `name`.
    pub name_embedding: Vec<f32>,
    pub project: String,
    pub attributes: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Entity {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        entity_type: EntityType,
        name_embedding: Vec<f32>,
        project: impl Into<String>,
        attributes: HashMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            entity_type,
            name_embedding,
            project: project.into(),
            attributes,
            created_at: Utc::now(),
        }
    }
}

/// A fact about an entity. Belongs to exactly one episode (the memory it was extracted from);
/// invalidation marks it inactive without deleting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: Uuid,
    pub fact: String,
    /// Unit-normalized embedding of `fact`.
    pub fact_embedding: Vec<f32>,
    pub aspect: Aspect,
    pub project: String,
    /// The memory this statement was extracted from.
    pub episode_id: i64,
    pub valid_from: DateTime<Utc>,
    pub invalidated_at: Option<DateTime<Utc>>,
    pub invalidated_by: Option<String>,
}

impl Statement {
    #[must_use]
    pub fn new(
        fact: &str,
        fact_embedding: Vec<f32>,
        aspect: Aspect,
        project: impl Into<String>,
        episode_id: i64,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fact: truncate_words(fact, MAX_FACT_WORDS),
            fact_embedding,
            aspect,
            project: project.into(),
            episode_id,
            valid_from: valid_at,
            invalidated_at: None,
            invalidated_by: None,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.invalidated_at.is_none()
    }
}

/// The object of a [`Triple`]: either another entity or a literal value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TripleObject {
    Entity(Uuid),
    Literal(String),
}

/// A (subject, predicate, object) edge anchored to the statement that
/// asserted it. `subject_entity_id` is never null; exactly one of
/// `object_entity_id`/`object_literal` is set (enforced by construction via
/// [`TripleObject`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Triple {
    pub statement_id: Uuid,
    pub subject_entity_id: Uuid,
    pub predicate: String,
    pub object: TripleObject,
}

/// Snapshot for knowledge-graph visualization (browse/UI use only; not on
/// the critical search path).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphVisualization {
    pub entities: Vec<Entity>,
    pub triples: Vec<Triple>,
}
