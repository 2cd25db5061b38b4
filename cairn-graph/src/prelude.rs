//! Common imports for the knowledge graph crate.

pub use crate::error::{GraphError, Result};
pub use crate::storage::surrealdb::SurrealDbGraph;
pub use crate::traits::GraphProvider;
pub use crate::types::{Aspect, Entity, EntityType, GraphVisualization, Statement, Triple, TripleObject};
