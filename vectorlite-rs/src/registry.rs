//! Per-table index registry, the seam `cairn-storage` holds onto to accelerate the vector signal
//! past a brute-force cosine scan once a project's active-memory count makes that scan too slow.
//!
//! One [`VectorIndex`] per (table, project) pair -- matching per-namespace `DashMap<String,...>`
//! (`hnsw.rs`), since a single HNSW graph mixing projects would leak cross-project neighbors into a
//! similarity search before the project filter ever runs.

use dashmap::DashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, VectorliteError};
use crate::index::{HnswParams, VectorIndex};

pub struct VectorliteRegistry {
    dim: usize,
    params: HnswParams,
    persistence_dir: Option<PathBuf>,
    namespaces: DashMap<String, VectorIndex>,
}

impl VectorliteRegistry {
    #[must_use]
    pub fn new(dim: usize, params: HnswParams) -> Self {
        Self { dim, params, persistence_dir: None, namespaces: DashMap::new() }
    }

    #[must_use]
    pub fn with_persistence(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persistence_dir = Some(dir.into());
        self
    }

    fn namespace_path(&self, namespace: &str) -> Option<PathBuf> {
        self.persistence_dir.as_ref().map(|dir| dir.join(format!("{namespace}.msgpack")))
    }

    pub fn upsert(&self, namespace: &str, row_id: i64, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dim {
            return Err(VectorliteError::DimensionMismatch { expected: self.dim, actual: embedding.len() });
        }
        let mut index = self.get_or_load(namespace)?;
        index.insert(row_id, embedding)?;
        self.namespaces.insert(namespace.to_string(), index);
        Ok(())
    }

    pub fn upsert_batch(&self, namespace: &str, rows: &[(i64, Vec<f32>)]) -> Result<()> {
        let mut index = self.get_or_load(namespace)?;
        index.insert_batch(rows)?;
        self.namespaces.insert(namespace.to_string(), index);
        Ok(())
    }

    pub fn remove(&self, namespace: &str, row_id: i64) {
        if let Some(mut entry) = self.namespaces.get_mut(namespace) {
            entry.remove(row_id);
        }
    }

    pub fn search(&self, namespace: &str, query: &[f32], k: usize) -> Result<Vec<(i64, f32)>> {
        match self.namespaces.get(namespace) {
            Some(index) => index.search(query, k),
            None => {
                let loaded = self.get_or_load(namespace)?;
                let results = loaded.search(query, k)?;
                self.namespaces.insert(namespace.to_string(), loaded);
                Ok(results)
            }
        }
    }

    pub fn save_all(&self) -> Result<()> {
        let Some(dir) = &self.persistence_dir else { return Ok(()) };
        std::fs::create_dir_all(dir)?;
        for entry in &self.namespaces {
            let path = dir.join(format!("{}.msgpack", entry.key()));
            entry.value().save(&path)?;
        }
        Ok(())
    }

    fn get_or_load(&self, namespace: &str) -> Result<VectorIndex> {
        if let Some((_, index)) = self.namespaces.remove(namespace) {
            return Ok(index);
        }
        if let Some(path) = self.namespace_path(namespace) {
            if Path::new(&path).exists() {
                return VectorIndex::load(&path, self.params);
            }
        }
        Ok(VectorIndex::new(self.dim, self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(v: Vec<f32>) -> Vec<f32> {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }

    #[test]
    fn namespaces_do_not_leak_into_each_other() {
        let registry = VectorliteRegistry::new(3, HnswParams::default());
        registry.upsert("project-a", 1, &unit(vec![1.0, 0.0, 0.0])).unwrap();
        registry.upsert("project-b", 2, &unit(vec![1.0, 0.0, 0.0])).unwrap();

        let a_results = registry.search("project-a", &unit(vec![1.0, 0.0, 0.0]), 5).unwrap();
        assert_eq!(a_results.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn persists_and_reloads_across_registries() {
        let dir = tempfile::tempdir().unwrap();
        {
            let registry = VectorliteRegistry::new(3, HnswParams::default()).with_persistence(dir.path());
            registry.upsert("p", 1, &unit(vec![1.0, 0.0, 0.0])).unwrap();
            registry.save_all().unwrap();
        }
        let registry = VectorliteRegistry::new(3, HnswParams::default()).with_persistence(dir.path());
        let results = registry.search("p", &unit(vec![1.0, 0.0, 0.0]), 1).unwrap();
        assert_eq!(results[0].0, 1);
    }
}
