//! Registers every `CAIRN_*` environment variable this workspace honors, binding each to its dotted
//! config path.

use crate::env::{EnvCategory, EnvRegistry, EnvVarDefBuilder};

fn float_validator(v: &str) -> Result<(), String> {
    v.parse::<f64>().map(|_| ()).map_err(|e| e.to_string())
}

fn usize_validator(v: &str) -> Result<(), String> {
    v.parse::<usize>().map(|_| ()).map_err(|e| e.to_string())
}

fn unit_interval_validator(v: &str) -> Result<(), String> {
    let f: f64 = v.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if (0.0..=1.0).contains(&f) {
        Ok(())
    } else {
        Err(format!("{v} is not in [0, 1]"))
    }
}

/// Register the standard set of Cairn environment variables.
///
/// # Errors
/// Returns an error if a variable name is registered twice.
pub fn register_cairn_vars(registry: &EnvRegistry) -> Result<(), String> {
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_RRF_K")
            .description("RRF damping constant K (spec default 60)")
            .category(EnvCategory::Search)
            .config_path("search.rrf_k")
            .validator(float_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_WEIGHT_VECTOR")
            .description("RRF signal weight for vector similarity")
            .category(EnvCategory::Search)
            .config_path("search.weight_vector")
            .validator(unit_interval_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_WEIGHT_KEYWORD")
            .description("RRF signal weight for keyword match")
            .category(EnvCategory::Search)
            .config_path("search.weight_keyword")
            .validator(unit_interval_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_WEIGHT_TAG")
            .description("RRF signal weight for tag match")
            .category(EnvCategory::Search)
            .config_path("search.weight_tag")
            .validator(unit_interval_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_RERANK_CANDIDATES")
            .description("Rerank pool size (spec default 50)")
            .category(EnvCategory::Search)
            .config_path("search.rerank_candidates")
            .validator(usize_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_TOKEN_BUDGET")
            .description("Token budget enforced on result assembly (spec default 10000)")
            .category(EnvCategory::Search)
            .config_path("search.token_budget")
            .validator(usize_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_ROUTER_CONFIDENCE_THRESHOLD")
            .description("Minimum router confidence to dispatch a typed handler (spec default 0.6)")
            .category(EnvCategory::Search)
            .config_path("search.router_confidence_threshold")
            .validator(unit_interval_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_SEARCH_ENTITY_MERGE_THRESHOLD")
            .description("Cosine-similarity threshold for entity merge (spec default 0.80)")
            .category(EnvCategory::Search)
            .config_path("search.entity_merge_threshold")
            .validator(unit_interval_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_STORAGE_RELATIONAL_PATH")
            .description("Path to the embedded SQLite database file")
            .category(EnvCategory::Storage)
            .config_path("storage.relational.path")
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_STORAGE_GRAPH_PATH")
            .description("Path to the embedded graph store data directory")
            .category(EnvCategory::Storage)
            .config_path("storage.graph.path")
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_PROVIDERS_TIMEOUTS_EMBEDDER_SECS")
            .description("Embedder call timeout in seconds (spec default 60)")
            .category(EnvCategory::Provider)
            .config_path("providers.timeouts.embedder_secs")
            .validator(usize_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_PROVIDERS_TIMEOUTS_GRAPH_SECS")
            .description("Graph call timeout in seconds (spec default 10)")
            .category(EnvCategory::Provider)
            .config_path("providers.timeouts.graph_secs")
            .validator(usize_validator)
            .build(),
    )?;
    registry.register_var(
        EnvVarDefBuilder::new("CAIRN_PROVIDERS_TIMEOUTS_RERANKER_SECS")
            .description("Reranker call timeout in seconds (spec default 30)")
            .category(EnvCategory::Provider)
            .config_path("providers.timeouts.reranker_secs")
            .validator(usize_validator)
            .build(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_without_duplicate_names() {
        let registry = EnvRegistry::isolated();
        register_cairn_vars(&registry).expect("no duplicate var names");
        assert!(registry.list_vars().unwrap().len() >= 12);
    }
}
