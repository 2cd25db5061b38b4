//! `QueryRouter`: one LLM call that classifies a query into a [`Route`].
//!
//! The router's output is advisory -- a malformed or missing LLM response degrades to
//! [`Route::fallback`] rather than failing the search.

use crate::types::{QueryType, Route, TemporalBounds};
use cairn_core::traits::llm::{Message, Role};
use cairn_core::Llm;
use cairn_graph::types::Aspect;
use serde::Deserialize;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You classify a search query for a memory retrieval system. \
Respond with a single JSON object and nothing else: \
{\"query_type\": one of \"entity_lookup\"|\"aspect_query\"|\"temporal\"|\"relationship\"|\"exploratory\", \
\"aspects\": [string], \"entity_hints\": [string], \"temporal\": {\"after\": string|null, \"before\": string|null}, \
\"confidence\": number between 0 and 1}. \
entity_hints lists every named person, project, technology, or place mentioned in the query.";

const MAX_TOKENS: u32 = 500;

#[derive(Debug, Deserialize)]
struct RawRoute {
    query_type: String,
    #[serde(default)]
    aspects: Vec<String>,
    #[serde(default)]
    entity_hints: Vec<String>,
    #[serde(default)]
    temporal: RawTemporal,
    confidence: f32,
}

#[derive(Debug, Default, Deserialize)]
struct RawTemporal {
    after: Option<String>,
    before: Option<String>,
}

pub struct QueryRouter {
    llm: Arc<dyn Llm>,
}

impl QueryRouter {
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Classify `query`. Never fails -- any LLM error or malformed JSON
    /// response yields [`Route::fallback`].
    pub async fn route(&self, query: &str) -> Route {
        match self.route_fallible(query).await {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!(error = %err, "router falling back to exploratory default");
                Route::fallback()
            }
        }
    }

    async fn route_fallible(&self, query: &str) -> crate::error::Result<Route> {
        let messages =
            [Message { role: Role::System, content: SYSTEM_PROMPT.to_string() }, Message::user(query)];
        let text = self
            .llm
            .generate(&messages, MAX_TOKENS)
            .await
            .map_err(crate::error::SearchError::Llm)?;
        parse_route(&text)
    }
}

fn parse_route(text: &str) -> crate::error::Result<Route> {
    let json_slice = extract_json_object(text)
        .ok_or_else(|| crate::error::SearchError::RouterMalformed("no JSON object found".to_string()))?;
    let raw: RawRoute = serde_json::from_str(json_slice)
        .map_err(|e| crate::error::SearchError::RouterMalformed(e.to_string()))?;

    let query_type = match raw.query_type.as_str() {
        "entity_lookup" => QueryType::EntityLookup,
        "aspect_query" => QueryType::AspectQuery,
        "temporal" => QueryType::Temporal,
        "relationship" => QueryType::Relationship,
        "exploratory" => QueryType::Exploratory,
        other => return Err(crate::error::SearchError::RouterMalformed(format!("unknown query_type: {other}"))),
    };

    let aspects = raw.aspects.iter().filter_map(|a| Aspect::parse_lenient(a)).collect();

    Ok(Route {
        query_type,
        aspects,
        entity_hints: raw.entity_hints,
        temporal: TemporalBounds { after: raw.temporal.after, before: raw.temporal.before },
        confidence: cairn_core::types::clamp01(raw.confidence),
    })
}

/// LLMs frequently wrap JSON in prose or code fences; take the first
/// balanced `{...}` span rather than requiring the whole response be JSON.
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
