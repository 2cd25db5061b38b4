//! Bipartite knowledge graph for Cairn: entities, statements that carry facts about them, and the
//! triples that connect them.
//!
//! Entity <-> Statement is bipartite by construction: statements reference entities through
//! triples, entities never reference statements directly. Every traversal (`bfs_traverse`,
//! `find_connecting_statements`) walks that bipartite adjacency with a hard depth cap rather than a
//! general cyclic-graph algorithm.
//!
//! The embedded backend is SurrealDB (RocksDB engine), matching existing embedded-graph
//! architecture; [`GraphProvider`] is the seam a different backend would implement.

pub mod error;
pub mod prelude;
pub mod storage;
pub mod traits;
pub mod types;

pub use error::{GraphError, Result};
pub use storage::surrealdb::SurrealDbGraph;
pub use traits::GraphProvider;
pub use types::{Aspect, Entity, EntityType, GraphVisualization, Statement, Triple, TripleObject};
