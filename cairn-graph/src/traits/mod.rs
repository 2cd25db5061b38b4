pub mod knowledge_graph;

pub use knowledge_graph::{
    GraphProvider, DEFAULT_ENTITY_LOOKUP_HOP_DEPTH, DEFAULT_MERGE_THRESHOLD,
    DEFAULT_RELATIONSHIP_BFS_DEPTH, MAX_SIMILAR_ENTITIES,
};
