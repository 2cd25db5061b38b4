//! SurrealDB-backed [`GraphProvider`]: embedded, file-based graph storage for the
//! Entity/Statement/Triple bipartite model.

use crate::error::{GraphError, Result};
use crate::traits::{GraphProvider, DEFAULT_MERGE_THRESHOLD, DEFAULT_RELATIONSHIP_BFS_DEPTH, MAX_SIMILAR_ENTITIES};
use crate::types::{Aspect, Entity, EntityType, GraphVisualization, Statement, Triple, TripleObject};

use async_trait::async_trait;
use cairn_core::types::cosine_similarity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;
use uuid::Uuid;

/// SurrealDB backend for the knowledge graph, embedded via RocksDB.
///
/// Thread-safe (the underlying `Surreal<Db>` handle clones cheaply and is
/// `Send + Sync`); a single instance is shared across requests.
#[derive(Debug, Clone)]
pub struct SurrealDbGraph {
    db: Surreal<Db>,
    data_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntityRecord {
    id: String,
    name: String,
    entity_type: String,
    name_embedding: Vec<f32>,
    project: String,
    attributes: HashMap<String, String>,
    created_at: DateTime<Utc>,
}

impl From<Entity> for EntityRecord {
    fn from(e: Entity) -> Self {
        Self {
            id: e.id.to_string(),
            name: e.name,
            entity_type: e.entity_type.as_str().to_string(),
            name_embedding: e.name_embedding,
            project: e.project,
            attributes: e.attributes,
            created_at: e.created_at,
        }
    }
}

impl TryFrom<EntityRecord> for Entity {
    type Error = GraphError;

    fn try_from(r: EntityRecord) -> Result<Self> {
        let entity_type = EntityType::from_str(&r.entity_type)
            .map_err(|()| GraphError::InvalidInput(format!("unknown entity type {}", r.entity_type)))?;
        let id = Uuid::parse_str(&r.id).map_err(|e| GraphError::InvalidInput(e.to_string()))?;
        Ok(Self {
            id,
            name: r.name,
            entity_type,
            name_embedding: r.name_embedding,
            project: r.project,
            attributes: r.attributes,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StatementRecord {
    id: String,
    fact: String,
    fact_embedding: Vec<f32>,
    aspect: String,
    project: String,
    episode_id: i64,
    valid_from: DateTime<Utc>,
    invalidated_at: Option<DateTime<Utc>>,
    invalidated_by: Option<String>,
}

impl From<Statement> for StatementRecord {
    fn from(s: Statement) -> Self {
        Self {
            id: s.id.to_string(),
            fact: s.fact,
            fact_embedding: s.fact_embedding,
            aspect: s.aspect.as_str().to_string(),
            project: s.project,
            episode_id: s.episode_id,
            valid_from: s.valid_from,
            invalidated_at: s.invalidated_at,
            invalidated_by: s.invalidated_by,
        }
    }
}

impl TryFrom<StatementRecord> for Statement {
    type Error = GraphError;

    fn try_from(r: StatementRecord) -> Result<Self> {
        let aspect = Aspect::parse_lenient(&r.aspect)
            .ok_or_else(|| GraphError::InvalidInput(format!("unknown aspect {}", r.aspect)))?;
        let id = Uuid::parse_str(&r.id).map_err(|e| GraphError::InvalidInput(e.to_string()))?;
        Ok(Self {
            id,
            fact: r.fact,
            fact_embedding: r.fact_embedding,
            aspect,
            project: r.project,
            episode_id: r.episode_id,
            valid_from: r.valid_from,
            invalidated_at: r.invalidated_at,
            invalidated_by: r.invalidated_by,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TripleRecord {
    statement_id: String,
    subject_entity_id: String,
    predicate: String,
    object_entity_id: Option<String>,
    object_literal: Option<String>,
}

impl From<Triple> for TripleRecord {
    fn from(t: Triple) -> Self {
        let (object_entity_id, object_literal) = match t.object {
            TripleObject::Entity(id) => (Some(id.to_string()), None),
            TripleObject::Literal(lit) => (None, Some(lit)),
        };
        Self {
            statement_id: t.statement_id.to_string(),
            subject_entity_id: t.subject_entity_id.to_string(),
            predicate: t.predicate,
            object_entity_id,
            object_literal,
        }
    }
}

impl SurrealDbGraph {
    /// Open (creating if absent) an embedded graph store at `data_dir`.
    ///
    /// # Errors
    /// Returns an error if the directory can't be created or the database
    /// fails to open.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)?;
        }
        let db_path = data_dir.join("cairn-graph.db");
        let db = Surreal::new::<RocksDb>(db_path).await?;
        db.use_ns("cairn").use_db("graph").await?;
        let graph = Self { db, data_dir };
        graph.initialize_schema().await?;
        Ok(graph)
    }

    /// Open a temporary store under the OS temp dir; used by tests.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails to open.
    pub async fn new_temp() -> Result<Self> {
        let dir = std::env::temp_dir().join(format!("cairn-graph-{}", Uuid::new_v4()));
        Self::new(dir).await
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.db
            .query(
                "DEFINE TABLE IF NOT EXISTS entity SCHEMAFULL;
                 DEFINE FIELD IF NOT EXISTS name ON entity TYPE string;
                 DEFINE FIELD IF NOT EXISTS entity_type ON entity TYPE string;
                 DEFINE FIELD IF NOT EXISTS name_embedding ON entity TYPE array<float>;
                 DEFINE FIELD IF NOT EXISTS project ON entity TYPE string;
                 DEFINE FIELD IF NOT EXISTS attributes ON entity TYPE object;
                 DEFINE FIELD IF NOT EXISTS created_at ON entity TYPE datetime;
                 DEFINE INDEX IF NOT EXISTS idx_entity_project_type ON entity FIELDS project, entity_type;

                 DEFINE TABLE IF NOT EXISTS statement SCHEMAFULL;
                 DEFINE FIELD IF NOT EXISTS fact ON statement TYPE string;
                 DEFINE FIELD IF NOT EXISTS fact_embedding ON statement TYPE array<float>;
                 DEFINE FIELD IF NOT EXISTS aspect ON statement TYPE string;
                 DEFINE FIELD IF NOT EXISTS project ON statement TYPE string;
                 DEFINE FIELD IF NOT EXISTS episode_id ON statement TYPE int;
                 DEFINE FIELD IF NOT EXISTS valid_from ON statement TYPE datetime;
                 DEFINE FIELD IF NOT EXISTS invalidated_at ON statement TYPE option<datetime>;
                 DEFINE FIELD IF NOT EXISTS invalidated_by ON statement TYPE option<string>;
                 DEFINE INDEX IF NOT EXISTS idx_statement_project ON statement FIELDS project;
                 DEFINE INDEX IF NOT EXISTS idx_statement_aspect ON statement FIELDS aspect;
                 DEFINE INDEX IF NOT EXISTS idx_statement_valid_from ON statement FIELDS valid_from;

                 DEFINE TABLE IF NOT EXISTS triple SCHEMAFULL;
                 DEFINE FIELD IF NOT EXISTS statement_id ON triple TYPE string;
                 DEFINE FIELD IF NOT EXISTS subject_entity_id ON triple TYPE string;
                 DEFINE FIELD IF NOT EXISTS predicate ON triple TYPE string;
                 DEFINE FIELD IF NOT EXISTS object_entity_id ON triple TYPE option<string>;
                 DEFINE FIELD IF NOT EXISTS object_literal ON triple TYPE option<string>;
                 DEFINE INDEX IF NOT EXISTS idx_triple_subject ON triple FIELDS subject_entity_id;
                 DEFINE INDEX IF NOT EXISTS idx_triple_object ON triple FIELDS object_entity_id;
                 DEFINE INDEX IF NOT EXISTS idx_triple_statement ON triple FIELDS statement_id;
                 DEFINE INDEX IF NOT EXISTS idx_triple_subject_predicate ON triple FIELDS subject_entity_id, predicate;",
            )
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn load_entity(&self, id: Uuid) -> Option<Entity> {
        let record: Option<EntityRecord> = self.db.select(("entity", id.to_string())).await.ok()?;
        record.and_then(|r| Entity::try_from(r).ok())
    }

    async fn load_statement(&self, id: Uuid) -> Option<Statement> {
        let record: Option<StatementRecord> = self.db.select(("statement", id.to_string())).await.ok()?;
        record.and_then(|r| Statement::try_from(r).ok())
    }

    /// Statement ids whose triples touch `entity_id` as subject or object.
    async fn statement_ids_mentioning(&self, entity_id: Uuid) -> Vec<Uuid> {
        let id_str = entity_id.to_string();
        let Ok(mut response) = self
            .db
            .query(
                "SELECT statement_id FROM triple WHERE subject_entity_id = $id OR object_entity_id = $id",
            )
            .bind(("id", id_str))
            .await
        else {
            return Vec::new();
        };
        let rows: Vec<TripleRecord> = response.take(0).unwrap_or_default();
        rows.into_iter()
            .filter_map(|r| Uuid::parse_str(&r.statement_id).ok())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect()
    }

    /// Entity ids adjacent to `statement_id` via its triples (subject +
    /// any entity-valued object).
    async fn entities_of_statement(&self, statement_id: Uuid) -> Vec<Uuid> {
        let id_str = statement_id.to_string();
        let Ok(mut response) = self
            .db
            .query("SELECT subject_entity_id, object_entity_id FROM triple WHERE statement_id = $id")
            .bind(("id", id_str))
            .await
        else {
            return Vec::new();
        };
        let rows: Vec<TripleRecord> = response.take(0).unwrap_or_default();
        let mut out = Vec::new();
        for r in rows {
            if let Ok(id) = Uuid::parse_str(&r.subject_entity_id) {
                out.push(id);
            }
            if let Some(obj) = r.object_entity_id.as_deref() {
                if let Ok(id) = Uuid::parse_str(obj) {
                    out.push(id);
                }
            }
        }
        out
    }
}

#[async_trait]
impl GraphProvider for SurrealDbGraph {
    async fn create_entity(
        &self,
        name: &str,
        entity_type: EntityType,
        embedding: Vec<f32>,
        project: &str,
        attributes: HashMap<String, String>,
    ) -> Result<Uuid> {
        let entity = Entity::new(name, entity_type, embedding, project, attributes);
        let id = entity.id;
        let record: EntityRecord = entity.into();
        let _: Option<EntityRecord> = self.db.create(("entity", id.to_string())).content(record).await?;
        Ok(id)
    }

    async fn find_similar_entities(
        &self,
        embedding: &[f32],
        entity_type: EntityType,
        project: &str,
    ) -> Vec<Entity> {
        let Ok(mut response) = self
            .db
            .query("SELECT * FROM entity WHERE project = $project AND entity_type = $entity_type")
            .bind(("project", project.to_string()))
            .bind(("entity_type", entity_type.as_str().to_string()))
            .await
        else {
            return Vec::new();
        };
        let rows: Vec<EntityRecord> = response.take(0).unwrap_or_default();
        let mut scored: Vec<(f32, Entity)> = rows
            .into_iter()
            .filter_map(|r| Entity::try_from(r).ok())
            .map(|e| (cosine_similarity(embedding, &e.name_embedding), e))
            .filter(|(score, _)| *score > DEFAULT_MERGE_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(MAX_SIMILAR_ENTITIES);
        scored.into_iter().map(|(_, e)| e).collect()
    }

    async fn search_entities_by_embedding(&self, embedding: &[f32], project: &str, limit: usize) -> Vec<Entity> {
        let Ok(mut response) = self
            .db
            .query("SELECT * FROM entity WHERE project = $project")
            .bind(("project", project.to_string()))
            .await
        else {
            return Vec::new();
        };
        let rows: Vec<EntityRecord> = response.take(0).unwrap_or_default();
        let mut scored: Vec<(f32, Entity)> = rows
            .into_iter()
            .filter_map(|r| Entity::try_from(r).ok())
            .map(|e| (cosine_similarity(embedding, &e.name_embedding), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored.into_iter().map(|(_, e)| e).collect()
    }

    async fn create_statement(
        &self,
        fact: &str,
        embedding: Vec<f32>,
        aspect: Aspect,
        episode_id: i64,
        project: &str,
        valid_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let statement = Statement::new(fact, embedding, aspect, project, episode_id, valid_at);
        let id = statement.id;
        let record: StatementRecord = statement.into();
        let _: Option<StatementRecord> = self.db.create(("statement", id.to_string())).content(record).await?;
        Ok(id)
    }

    async fn create_triple(
        &self,
        statement_id: Uuid,
        subject_id: Uuid,
        predicate: &str,
        object_id: Option<Uuid>,
        object_literal: Option<String>,
    ) -> Result<()> {
        if object_id.is_some() == object_literal.is_some() {
            return Err(GraphError::InvalidInput(
                "exactly one of object_id/object_literal must be set".into(),
            ));
        }
        let triple = Triple {
            statement_id,
            subject_entity_id: subject_id,
            predicate: predicate.to_string(),
            object: object_id.map_or_else(
                || TripleObject::Literal(object_literal.clone().unwrap_or_default()),
                TripleObject::Entity,
            ),
        };
        let record: TripleRecord = triple.into();
        let key = format!("{statement_id}:{subject_id}:{predicate}");
        let _: Option<TripleRecord> = self.db.create(("triple", key)).content(record).await?;
        Ok(())
    }

    async fn find_contradictions(&self, subject_id: Uuid, predicate: &str, project: &str) -> Vec<Statement> {
        let Ok(mut response) = self
            .db
            .query(
                "SELECT statement_id FROM triple WHERE subject_entity_id = $subject AND predicate = $predicate",
            )
            .bind(("subject", subject_id.to_string()))
            .bind(("predicate", predicate.to_string()))
            .await
        else {
            return Vec::new();
        };
        let rows: Vec<TripleRecord> = response.take(0).unwrap_or_default();
        let mut out = Vec::new();
        for r in rows {
            let Ok(sid) = Uuid::parse_str(&r.statement_id) else { continue };
            if let Some(stmt) = self.load_statement(sid).await {
                if stmt.is_active() && stmt.project == project {
                    out.push(stmt);
                }
            }
        }
        out
    }

    async fn invalidate_statement(&self, id: Uuid, invalidated_by: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Patch {
            invalidated_at: DateTime<Utc>,
            invalidated_by: String,
        }
        let patch = Patch {
            invalidated_at: Utc::now(),
            invalidated_by: invalidated_by.to_string(),
        };
        let _: Option<StatementRecord> = self.db.update(("statement", id.to_string())).merge(patch).await?;
        Ok(())
    }

    async fn find_entity_episodes(&self, entity_id: Uuid) -> Vec<i64> {
        let mut episodes = HashSet::new();
        for sid in self.statement_ids_mentioning(entity_id).await {
            if let Some(stmt) = self.load_statement(sid).await {
                episodes.insert(stmt.episode_id);
            }
        }
        episodes.into_iter().collect()
    }

    async fn find_entity_statements(&self, entity_id: Uuid, aspects: Option<&[Aspect]>) -> Vec<Statement> {
        let mut out = Vec::new();
        for sid in self.statement_ids_mentioning(entity_id).await {
            if let Some(stmt) = self.load_statement(sid).await {
                if !stmt.is_active() {
                    continue;
                }
                if let Some(filter) = aspects {
                    if !filter.contains(&stmt.aspect) {
                        continue;
                    }
                }
                out.push(stmt);
            }
        }
        out
    }

    async fn find_connecting_statements(&self, a: Uuid, b: Uuid) -> Vec<Statement> {
        // BFS over the bipartite entity<->statement adjacency from `a`,
        // hard-capped at DEFAULT_RELATIONSHIP_BFS_DEPTH; a statement is "on
        // the path" if traversal reaches `b` through it within the cap.
        let mut visited_entities = HashSet::from([a]);
        let mut frontier = vec![a];
        let mut path_statements: Vec<Uuid> = Vec::new();

        for _ in 0..DEFAULT_RELATIONSHIP_BFS_DEPTH {
            let mut next_frontier = Vec::new();
            for &entity in &frontier {
                for sid in self.statement_ids_mentioning(entity).await {
                    let neighbors = self.entities_of_statement(sid).await;
                    if neighbors.contains(&b) {
                        path_statements.push(sid);
                    }
                    for n in neighbors {
                        if visited_entities.insert(n) {
                            next_frontier.push(n);
                        }
                    }
                }
            }
            if !path_statements.is_empty() {
                break;
            }
            frontier = next_frontier;
            if frontier.is_empty() {
                break;
            }
        }

        let mut out = Vec::new();
        for sid in path_statements {
            if let Some(stmt) = self.load_statement(sid).await {
                out.push(stmt);
            }
        }
        out
    }

    async fn bfs_traverse(&self, start: Uuid, max_depth: usize) -> Vec<Statement> {
        let depth = max_depth.min(DEFAULT_RELATIONSHIP_BFS_DEPTH);
        let mut visited_entities = HashSet::from([start]);
        let mut visited_statements = HashSet::new();
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut out = Vec::new();

        while let Some((entity, d)) = queue.pop_front() {
            if d >= depth {
                continue;
            }
            for sid in self.statement_ids_mentioning(entity).await {
                if !visited_statements.insert(sid) {
                    continue;
                }
                if let Some(stmt) = self.load_statement(sid).await {
                    out.push(stmt);
                }
                for neighbor in self.entities_of_statement(sid).await {
                    if visited_entities.insert(neighbor) {
                        queue.push_back((neighbor, d + 1));
                    }
                }
            }
        }
        out
    }

    async fn search_statements_by_aspect(&self, aspects: &[Aspect], project: &str) -> Vec<i64> {
        if aspects.is_empty() {
            return Vec::new();
        }
        let aspect_strs: Vec<String> = aspects.iter().map(|a| a.as_str().to_string()).collect();
        let Ok(mut response) = self
            .db
            .query("SELECT episode_id FROM statement WHERE project = $project AND aspect IN $aspects AND invalidated_at IS NONE")
            .bind(("project", project.to_string()))
            .bind(("aspects", aspect_strs))
            .await
        else {
            return Vec::new();
        };
        let rows: Vec<StatementRecord> = response.take(0).unwrap_or_default();
        rows.into_iter().map(|r| r.episode_id).collect::<HashSet<_>>().into_iter().collect()
    }

    async fn get_knowledge_graph_visualization(
        &self,
        project: &str,
        entity_types: Option<&[EntityType]>,
        limit: usize,
    ) -> GraphVisualization {
        let Ok(mut response) = self
            .db
            .query("SELECT * FROM entity WHERE project = $project LIMIT $limit")
            .bind(("project", project.to_string()))
            .bind(("limit", limit as i64))
            .await
        else {
            return GraphVisualization::default();
        };
        let rows: Vec<EntityRecord> = response.take(0).unwrap_or_default();
        let entities: Vec<Entity> = rows
            .into_iter()
            .filter_map(|r| Entity::try_from(r).ok())
            .filter(|e| entity_types.is_none_or(|types| types.contains(&e.entity_type)))
            .collect();

        let mut triples = Vec::new();
        for entity in &entities {
            for sid in self.statement_ids_mentioning(entity.id).await {
                let id_str = sid.to_string();
                if let Ok(mut resp) = self
                    .db
                    .query("SELECT * FROM triple WHERE statement_id = $sid")
                    .bind(("sid", id_str))
                    .await
                {
                    let rows: Vec<TripleRecord> = resp.take(0).unwrap_or_default();
                    for r in rows {
                        if let (Ok(sid), Ok(subj)) =
                            (Uuid::parse_str(&r.statement_id), Uuid::parse_str(&r.subject_entity_id))
                        {
                            let object = r.object_entity_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()).map_or_else(
                                || TripleObject::Literal(r.object_literal.clone().unwrap_or_default()),
                                TripleObject::Entity,
                            );
                            triples.push(Triple {
                                statement_id: sid,
                                subject_entity_id: subj,
                                predicate: r.predicate,
                                object,
                            });
                        }
                    }
                }
            }
        }

        GraphVisualization { entities, triples }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_find_similar_entity() {
        let graph = SurrealDbGraph::new_temp().await.unwrap();
        let embedding = vec![1.0, 0.0, 0.0];
        let id = graph
            .create_entity("Alice", EntityType::Person, embedding.clone(), "proj", HashMap::new())
            .await
            .unwrap();

        let similar = graph.find_similar_entities(&embedding, EntityType::Person, "proj").await;
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].id, id);
    }

    #[tokio::test]
    async fn dissimilar_entity_is_not_merged() {
        let graph = SurrealDbGraph::new_temp().await.unwrap();
        graph
            .create_entity("Alice", EntityType::Person, vec![1.0, 0.0, 0.0], "proj", HashMap::new())
            .await
            .unwrap();

        let similar = graph
            .find_similar_entities(&[0.0, 1.0, 0.0], EntityType::Person, "proj")
            .await;
        assert!(similar.is_empty());
    }

    #[tokio::test]
    async fn contradiction_detection_and_invalidation() {
        let graph = SurrealDbGraph::new_temp().await.unwrap();
        let subject = graph
            .create_entity("prod-1", EntityType::Technology, vec![1.0, 0.0], "proj", HashMap::new())
            .await
            .unwrap();

        let first = graph
            .create_statement("prod-1 runs Ubuntu 20.04", vec![0.1, 0.2], Aspect::Knowledge, 1, "proj", Utc::now())
            .await
            .unwrap();
        graph.create_triple(first, subject, "runs", None, Some("Ubuntu 20.04".into())).await.unwrap();

        let contradictions = graph.find_contradictions(subject, "runs", "proj").await;
        assert_eq!(contradictions.len(), 1);
        assert_eq!(contradictions[0].id, first);

        graph.invalidate_statement(first, "extraction").await.unwrap();
        let contradictions_after = graph.find_contradictions(subject, "runs", "proj").await;
        assert!(contradictions_after.is_empty());
    }

    #[tokio::test]
    async fn bfs_traverse_reaches_second_hop() {
        let graph = SurrealDbGraph::new_temp().await.unwrap();
        let alice = graph
            .create_entity("Alice", EntityType::Person, vec![1.0, 0.0], "proj", HashMap::new())
            .await
            .unwrap();
        let migration = graph
            .create_entity("migration project", EntityType::Project, vec![0.0, 1.0], "proj", HashMap::new())
            .await
            .unwrap();

        let s1 = graph
            .create_statement("Alice leads the migration project", vec![0.3, 0.3], Aspect::Action, 10, "proj", Utc::now())
            .await
            .unwrap();
        graph.create_triple(s1, alice, "leads", Some(migration), None).await.unwrap();

        let s2 = graph
            .create_statement(
                "the migration project targets v2 in March",
                vec![0.2, 0.4],
                Aspect::Goal,
                20,
                "proj",
                Utc::now(),
            )
            .await
            .unwrap();
        graph.create_triple(s2, migration, "targets", None, Some("v2 in March".into())).await.unwrap();

        let reached = graph.bfs_traverse(alice, 2).await;
        let episodes: HashSet<i64> = reached.iter().map(|s| s.episode_id).collect();
        assert!(episodes.contains(&10));
        assert!(episodes.contains(&20));
    }
}
