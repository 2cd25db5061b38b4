//! `KnowledgeExtractor`: one LLM call per memory plus the resolve-and-persist protocol that turns
//! an extraction into graph entities/statements/triples.

use cairn_core::traits::llm::{Message, Role};
use cairn_core::Llm;
use cairn_graph::traits::knowledge_graph::GraphProvider;
use cairn_graph::types::{Aspect, EntityType};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::types::ResolveCounts;

const SYSTEM_PROMPT: &str = "Extract structured knowledge from a memory. Respond with a single JSON object: \
{\"entities\": [{\"name\": string, \"type\": string, \"attributes\": object}], \
\"statements\": [{\"subject\": string, \"predicate\": string, \"object\": string, \"object_is_entity\": bool, \
\"fact\": string, \"aspect\": string, \"valid_at\": string|null}], \
\"tags\": [string], \"importance\": number, \"summary\": string}. \
entity type is one of Person, Organization, Place, Event, Project, Task, Technology, Product, Concept. \
aspect is one of Identity, Knowledge, Belief, Preference, Action, Goal, Directive, Decision, Event, Problem, Relationship. \
fact must be at most 20 words. tags must be lowercase, at most 10. importance is in [0,1].";

const MAX_TOKENS: u32 = 1500;
const MAX_TAGS: usize = 10;

/// Raw LLM output before validation/clamping.
#[derive(Debug, Default, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    statements: Vec<RawStatement>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    importance: Option<f32>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    name: String,
    #[serde(rename = "type")]
    entity_type: String,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawStatement {
    subject: String,
    predicate: String,
    object: String,
    #[serde(default)]
    object_is_entity: bool,
    fact: String,
    aspect: String,
    #[serde(default)]
    valid_at: Option<String>,
}

/// A validated extraction result, ready for [`KnowledgeExtractor::resolve_and_persist`].
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub entities: Vec<ExtractedEntity>,
    pub statements: Vec<ExtractedStatement>,
    pub tags: Vec<String>,
    pub importance: f32,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: EntityType,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ExtractedStatement {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub object_is_entity: bool,
    pub fact: String,
    pub aspect: Aspect,
    pub valid_at: Option<DateTime<Utc>>,
}

/// Minimal enrichment returned when both extraction attempts fail.
fn minimal_extraction() -> Extraction {
    Extraction { entities: Vec::new(), statements: Vec::new(), tags: Vec::new(), importance: 0.5, summary: String::new() }
}

pub struct KnowledgeExtractor {
    llm: Arc<dyn Llm>,
    graph: Arc<dyn GraphProvider>,
    embedder: Arc<dyn cairn_core::Embedder>,
    /// Per-process embedding cache keyed by entity name, shared across concurrent extractions behind a
    /// short-held lock.
    name_embedding_cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl KnowledgeExtractor {
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>, graph: Arc<dyn GraphProvider>, embedder: Arc<dyn cairn_core::Embedder>) -> Self {
        Self { llm, graph, embedder, name_embedding_cache: Mutex::new(HashMap::new()) }
    }

    /// Extract structured knowledge from `content`. Retries once with the parse error fed back; on a
    /// second failure returns [`minimal_extraction`] rather than failing.
    pub async fn extract(&self, content: &str) -> Extraction {
        match self.call_and_parse(content, None).await {
            Ok(extraction) => extraction,
            Err(first_err) => match self.call_and_parse(content, Some(&first_err)).await {
                Ok(extraction) => extraction,
                Err(second_err) => {
                    tracing::warn!(error = %second_err, "extraction failed twice, using minimal enrichment");
                    minimal_extraction()
                }
            },
        }
    }

    async fn call_and_parse(&self, content: &str, prior_error: Option<&str>) -> Result<Extraction, String> {
        let mut messages = vec![Message { role: Role::System, content: SYSTEM_PROMPT.to_string() }, Message::user(content)];
        if let Some(err) = prior_error {
            messages.push(Message::user(format!(
                "The previous response failed to parse: {err}. Return only the corrected JSON object."
            )));
        }
        let text = self.llm.generate(&messages, MAX_TOKENS).await.map_err(|e| e.to_string())?;
        parse_extraction(&text)
    }

    /// Step 2-3 of the resolve-and-persist protocol: resolve or create each entity, then create
    /// statements/triples, invalidating any contradicting prior statement.
    pub async fn resolve_and_persist(&self, extraction: &Extraction, project: &str, episode_id: i64) -> ResolveCounts {
        let mut counts = ResolveCounts::default();
        let mut name_to_uuid: HashMap<String, Uuid> = HashMap::new();

        for entity in &extraction.entities {
            let embedding = self.name_embedding(&entity.name).await;
            let similar = self.graph.find_similar_entities(&embedding, entity.entity_type, project).await;
            if let Some(existing) = similar.into_iter().next() {
                name_to_uuid.insert(entity.name.clone(), existing.id);
                counts.entities_merged += 1;
            } else {
                match self
                    .graph
                    .create_entity(&entity.name, entity.entity_type, embedding, project, entity.attributes.clone())
                    .await
                {
                    Ok(id) => {
                        name_to_uuid.insert(entity.name.clone(), id);
                        counts.entities_created += 1;
                    }
                    Err(err) => tracing::warn!(error = %err, entity = %entity.name, "failed to create entity"),
                }
            }
        }

        for statement in &extraction.statements {
            let Some(&subject_id) = name_to_uuid.get(&statement.subject) else {
                tracing::debug!(subject = %statement.subject, "statement skipped: subject not resolved");
                continue;
            };

            let contradictions = self.graph.find_contradictions(subject_id, &statement.predicate, project).await;
            for contradiction in &contradictions {
                if let Err(err) = self.graph.invalidate_statement(contradiction.id, "extraction").await {
                    tracing::warn!(error = %err, "failed to invalidate contradicting statement");
                }
            }
            counts.contradictions_found += contradictions.len();

            let fact_embedding = match self.embedder.embed(&statement.fact).await {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to embed statement fact");
                    continue;
                }
            };
            let valid_at = statement.valid_at.unwrap_or_else(Utc::now);
            let statement_id = match self
                .graph
                .create_statement(&statement.fact, fact_embedding, statement.aspect, episode_id, project, valid_at)
                .await
            {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to create statement");
                    continue;
                }
            };
            counts.statements_created += 1;

            let object_id = statement.object_is_entity.then(|| name_to_uuid.get(&statement.object)).flatten();
            let (object_id, object_literal) = match object_id {
                Some(&id) => (Some(id), None),
                None => (None, Some(statement.object.clone())),
            };
            if let Err(err) = self
                .graph
                .create_triple(statement_id, subject_id, &statement.predicate, object_id, object_literal)
                .await
            {
                tracing::warn!(error = %err, "failed to create triple");
            }
        }

        counts
    }

    async fn name_embedding(&self, name: &str) -> Vec<f32> {
        if let Some(cached) = self.name_embedding_cache.lock().get(name) {
            return cached.clone();
        }
        let embedding = self.embedder.embed(name).await.unwrap_or_default();
        self.name_embedding_cache.lock().insert(name.to_string(), embedding.clone());
        embedding
    }
}

fn parse_extraction(text: &str) -> Result<Extraction, String> {
    let json_slice = extract_json_object(text).ok_or_else(|| "no JSON object found".to_string())?;
    let raw: RawExtraction = serde_json::from_str(json_slice).map_err(|e| e.to_string())?;

    let entities: Vec<ExtractedEntity> = raw
        .entities
        .into_iter()
        .filter_map(|e| {
            e.entity_type.parse::<EntityType>().ok().map(|entity_type| ExtractedEntity { name: e.name, entity_type, attributes: e.attributes })
        })
        .collect();

    let statements: Vec<ExtractedStatement> = raw
        .statements
        .into_iter()
        .filter_map(|s| {
            let aspect = Aspect::parse_lenient(&s.aspect)?;
            Some(ExtractedStatement {
                subject: s.subject,
                predicate: s.predicate,
                object: s.object,
                object_is_entity: s.object_is_entity,
                fact: cairn_core::types::truncate_words(&s.fact, cairn_graph::types::MAX_FACT_WORDS),
                aspect,
                valid_at: s.valid_at.and_then(|v| DateTime::parse_from_rfc3339(&v).ok()).map(|dt| dt.with_timezone(&Utc)),
            })
        })
        .collect();

    let tags = cairn_core::types::normalize_tags(raw.tags, MAX_TAGS);
    let importance = cairn_core::types::clamp01(raw.importance.unwrap_or(0.5));

    Ok(Extraction { entities, statements, tags, importance, summary: raw.summary })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_extraction() {
        let text = r#"{
            "entities": [{"name": "Alice", "type": "Person", "attributes": {}}],
            "statements": [{"subject": "Alice", "predicate": "leads", "object": "migration project", "object_is_entity": false, "fact": "Alice leads the migration project", "aspect": "Action", "valid_at": null}],
            "tags": ["ALICE", "Team", "team", "a", "b", "c", "d", "e", "f", "g", "h"],
            "importance": 1.5,
            "summary": "Alice leads the migration."
        }"#;
        let extraction = parse_extraction(text).unwrap();
        assert_eq!(extraction.entities.len(), 1);
        assert_eq!(extraction.entities[0].entity_type, EntityType::Person);
        assert_eq!(extraction.statements.len(), 1);
        assert!((extraction.importance - 1.0).abs() < 1e-6);
        assert!(extraction.tags.len() <= 10);
    }

    #[test]
    fn unknown_aspect_is_silently_dropped() {
        let text = r#"{"entities": [], "statements": [{"subject": "a", "predicate": "p", "object": "b", "object_is_entity": false, "fact": "a p b", "aspect": "Nonsense", "valid_at": null}], "tags": [], "importance": 0.5, "summary": ""}"#;
        let extraction = parse_extraction(text).unwrap();
        assert!(extraction.statements.is_empty());
    }

    #[test]
    fn fact_truncated_to_twenty_words() {
        let long_fact = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let text = format!(
            r#"{{"entities": [], "statements": [{{"subject": "a", "predicate": "p", "object": "b", "object_is_entity": false, "fact": "{long_fact}", "aspect": "Knowledge", "valid_at": null}}], "tags": [], "importance": 0.5, "summary": ""}}"#
        );
        let extraction = parse_extraction(&text).unwrap();
        assert_eq!(extraction.statements[0].fact.split_whitespace().count(), 20);
    }

    #[test]
    fn unparseable_json_is_error() {
        assert!(parse_extraction("not json").is_err());
    }
}
