//! Pure-Rust HNSW index over `hnsw_rs`, namespaced by table name.
//!
//! Vectors are kept in an owned container so the `Hnsw` struct (which
//! borrows its point data) can be rebuilt from scratch whenever a batch
//! changes the backing storage, and incremental inserts use
//! `parallel_insert` against the existing graph otherwise. Cairn only ever
//! scores cosine similarity (embeddings are unit-normalized at the source),
//! so this index hardcodes `DistCosine` rather than carrying a
//! `DistanceMetric` enum.

use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::prelude::DistCosine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, VectorliteError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HnswParams {
    pub m: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
    pub nb_layers: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self { m: 16, ef_construction: 200, ef_search: 64, nb_layers: 16 }
    }
}

/// Owned vector storage the `Hnsw` graph borrows its point data from. The graph is rebuilt from
/// this container rather than mutated in place whenever the container is replaced wholesale (load
/// from disk); ordinary inserts instead extend the container and call `parallel_insert` with the
/// new slice, matching incremental-insertion path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Container {
    vectors: Vec<Vec<f32>>,
    row_ids: Vec<i64>,
    deleted: std::collections::HashSet<i64>,
}

#[derive(Serialize, Deserialize)]
struct Persisted {
    dim: usize,
    params: HnswParams,
    container: Container,
}

pub struct VectorIndex {
    dim: usize,
    params: HnswParams,
    container: Container,
    graph: Hnsw<'static, f32, DistCosine>,
    row_to_point: HashMap<i64, usize>,
}

impl VectorIndex {
    #[must_use]
    pub fn new(dim: usize, params: HnswParams) -> Self {
        let container = Container::default();
        let graph = build_graph(&container, dim, &params);
        Self { dim, params, container, graph, row_to_point: HashMap::new() }
    }

    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.container.vectors.len() - self.container.deleted.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.container.vectors.is_empty()
    }

    /// Insert or replace the vector for `row_id`. Replacement is a soft tombstone-and-reinsert:
    /// `hnsw_rs` has no in-place update, so the old point id is marked deleted (filtered out of search
    /// output) and a new point is appended, matching how storage handles metadata-only updates by never
    /// mutating a committed graph node.
    pub fn insert(&mut self, row_id: i64, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dim {
            return Err(VectorliteError::DimensionMismatch { expected: self.dim, actual: embedding.len() });
        }
        if let Some(&old_point) = self.row_to_point.get(&row_id) {
            let old_row = self.container.row_ids[old_point];
            self.container.deleted.insert(old_row);
        }

        let point_id = self.container.vectors.len();
        self.container.vectors.push(embedding.to_vec());
        self.container.row_ids.push(row_id);
        self.row_to_point.insert(row_id, point_id);

        self.graph.parallel_insert(&[(&self.container.vectors[point_id], point_id)]);
        Ok(())
    }

    pub fn insert_batch(&mut self, rows: &[(i64, Vec<f32>)]) -> Result<()> {
        for (row_id, embedding) in rows {
            if embedding.len() != self.dim {
                return Err(VectorliteError::DimensionMismatch { expected: self.dim, actual: embedding.len() });
            }
        }
        let start = self.container.vectors.len();
        for (row_id, embedding) in rows {
            if let Some(&old_point) = self.row_to_point.get(row_id) {
                let old_row = self.container.row_ids[old_point];
                self.container.deleted.insert(old_row);
            }
            let point_id = self.container.vectors.len();
            self.container.vectors.push(embedding.clone());
            self.container.row_ids.push(*row_id);
            self.row_to_point.insert(*row_id, point_id);
        }
        let refs: Vec<(&Vec<f32>, usize)> = self.container.vectors[start..].iter().zip(start..).collect();
        if !refs.is_empty() {
            self.graph.parallel_insert(&refs);
        }
        Ok(())
    }

    /// Tombstone `row_id` -- `hnsw_rs` does not support point removal, so the row is filtered out of
    /// future search results rather than physically removed from the graph (matches `delete`: "just
    /// remove from metadata and mark as deleted").
    pub fn remove(&mut self, row_id: i64) {
        self.container.deleted.insert(row_id);
        self.row_to_point.remove(&row_id);
    }

    /// k-nearest neighbors by cosine similarity, descending. `query` must
    /// match the index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(i64, f32)>> {
        if query.len() != self.dim {
            return Err(VectorliteError::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        if self.container.vectors.is_empty() {
            return Ok(Vec::new());
        }
        // Over-fetch past tombstones so the caller still gets k live results.
        let over_fetch = (k + self.container.deleted.len()).max(k);
        let neighbours: Vec<Neighbour> = self.graph.search(query, over_fetch, self.params.ef_search);

        let mut out = Vec::with_capacity(k);
        for n in neighbours {
            if n.d_id >= self.container.row_ids.len() {
                continue;
            }
            let row_id = self.container.row_ids[n.d_id];
            if self.container.deleted.contains(&row_id) {
                continue;
            }
            // hnsw_rs's DistCosine returns 1 - cosine_similarity.
            let similarity = 1.0 - n.distance;
            out.push((row_id, similarity));
            if out.len() == k {
                break;
            }
        }
        Ok(out)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let persisted = Persisted { dim: self.dim, params: self.params, container: self.container.clone() };
        let bytes = rmp_serde::to_vec(&persisted).map_err(|e| VectorliteError::Persist(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: &Path, params: HnswParams) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let persisted: Persisted = rmp_serde::from_slice(&bytes).map_err(|e| VectorliteError::Load(e.to_string()))?;
        let graph = build_graph(&persisted.container, persisted.dim, &params);
        let row_to_point = persisted.container.row_ids.iter().enumerate().map(|(point_id, &row_id)| (row_id, point_id)).collect();
        Ok(Self { dim: persisted.dim, params, container: persisted.container, graph, row_to_point })
    }
}

fn build_graph(container: &Container, dim: usize, params: &HnswParams) -> Hnsw<'static, f32, DistCosine> {
    let max_elements = container.vectors.len().max(1000);
    let graph = Hnsw::new(params.m, max_elements, params.nb_layers, params.ef_construction, DistCosine);
    if !container.vectors.is_empty() {
        let _ = dim;
        let refs: Vec<(&Vec<f32>, usize)> = container.vectors.iter().zip(0..).collect();
        graph.parallel_insert(&refs);
    }
    graph
}
