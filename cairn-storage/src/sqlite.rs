//! `libsql`-backed [`Storage`] implementation.
//!
//! `libsql::Connection` is cheap to open and safe to share, but SQLite itself serializes writers; a
//! single connection guarded by a `Mutex` keeps that serialization explicit instead of relying on
//! `libsql`'s internal retry-on-busy behavior.

use crate::error::{Result, StorageError};
use crate::model::{EventRow, MemoryFilter, MemoryRow, NewMemoryRow, RelationRow};
use crate::schema::SCHEMA;
use crate::traits::Storage;
use async_trait::async_trait;
use cairn_core::types::cosine_similarity;
use chrono::{DateTime, Utc};
use libsql::{params, Connection, Database};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
    _db: Database,
}

impl SqliteStorage {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = libsql::Builder::new_local(path.as_ref()).build().await.map_err(sqlite_err)?;
        let conn = db.connect().map_err(sqlite_err)?;
        conn.execute_batch(SCHEMA).await.map_err(sqlite_err)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)), _db: db })
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::open(":memory:").await
    }

    fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
    }

    fn row_to_memory(row: &libsql::Row) -> Result<MemoryRow> {
        let embedding_bytes: Vec<u8> = row.get(15).map_err(sqlite_err)?;
        Ok(MemoryRow {
            id: row.get(0).map_err(sqlite_err)?,
            project: row.get(1).map_err(sqlite_err)?,
            content: row.get(2).map_err(sqlite_err)?,
            summary: row.get(3).map_err(sqlite_err)?,
            memory_type: row.get(4).map_err(sqlite_err)?,
            importance: row.get::<f64>(5).map_err(sqlite_err)? as f32,
            tags: serde_json::from_str(&row.get::<String>(6).map_err(sqlite_err)?)?,
            auto_tags: serde_json::from_str(&row.get::<String>(7).map_err(sqlite_err)?)?,
            related_files: serde_json::from_str(&row.get::<String>(8).map_err(sqlite_err)?)?,
            session_id: row.get(9).map_err(sqlite_err)?,
            author: row.get(10).map_err(sqlite_err)?,
            created_at: parse_ts(&row.get::<String>(11).map_err(sqlite_err)?)?,
            updated_at: parse_ts(&row.get::<String>(12).map_err(sqlite_err)?)?,
            active: row.get::<i64>(13).map_err(sqlite_err)? != 0,
            inactivation_reason: row.get(14).map_err(sqlite_err)?,
            embedding: Self::decode_embedding(&embedding_bytes),
        })
    }
}

fn sqlite_err(e: libsql::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Unavailable(format!("bad timestamp {s}: {e}")))
}

const MEMORY_COLUMNS: &str = "id, project, content, summary, memory_type, importance, tags, \
     auto_tags, related_files, session_id, author, created_at, updated_at, active, \
     inactivation_reason, embedding";

#[async_trait]
impl Storage for SqliteStorage {
    async fn ensure_project(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO projects (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
            params![name, Utc::now().to_rfc3339()],
        )
        .await
        .map_err(sqlite_err)?;
        Ok(())
    }

    async fn insert_memory(&self, row: NewMemoryRow) -> Result<i64> {
        self.ensure_project(&row.project).await?;
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO memories (project, content, summary, memory_type, importance, tags, \
                 auto_tags, related_files, session_id, author, created_at, updated_at, active, \
                 inactivation_reason, embedding) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,1,NULL,?13)"
            ),
            params![
                row.project,
                row.content,
                row.summary,
                row.memory_type,
                f64::from(row.importance),
                serde_json::to_string(&row.tags)?,
                serde_json::to_string(&row.auto_tags)?,
                serde_json::to_string(&row.related_files)?,
                row.session_id,
                row.author,
                now.clone(),
                now,
                Self::encode_embedding(&row.embedding),
            ],
        )
        .await
        .map_err(sqlite_err)?;
        conn.last_insert_rowid().try_into().map_err(|_| StorageError::Unavailable("rowid overflow".into()))
    }

    async fn get_memory(&self, id: i64) -> Result<Option<MemoryRow>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(&format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"), params![id])
            .await
            .map_err(sqlite_err)?;
        match rows.next().await.map_err(sqlite_err)? {
            Some(row) => Ok(Some(Self::row_to_memory(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_memory(&self, row: &MemoryRow) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE memories SET content=?1, summary=?2, memory_type=?3, importance=?4, tags=?5, \
             auto_tags=?6, related_files=?7, updated_at=?8, active=?9, inactivation_reason=?10, \
             embedding=?11 WHERE id=?12",
            params![
                row.content.clone(),
                row.summary.clone(),
                row.memory_type.clone(),
                f64::from(row.importance),
                serde_json::to_string(&row.tags)?,
                serde_json::to_string(&row.auto_tags)?,
                serde_json::to_string(&row.related_files)?,
                Utc::now().to_rfc3339(),
                i64::from(row.active),
                row.inactivation_reason.clone(),
                Self::encode_embedding(&row.embedding),
                row.id,
            ],
        )
        .await
        .map_err(sqlite_err)?;
        Ok(())
    }

    async fn list_memories(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRow>> {
        let sql = format!(
            "SELECT {MEMORY_COLUMNS} FROM memories \
             WHERE (?1 IS NULL OR project = ?1) AND (?2 IS NULL OR memory_type = ?2) AND (NOT ?3 OR active) \
             ORDER BY updated_at DESC"
        );

        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(&sql, params![filter.project.clone(), filter.memory_type.clone(), filter.active_only])
            .await
            .map_err(sqlite_err)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(sqlite_err)? {
            let memory = Self::row_to_memory(&row)?;
            if filter.tags.is_empty() || filter.tags.iter().any(|t| memory.tags.contains(t)) {
                out.push(memory);
            }
        }
        Ok(out)
    }

    async fn vector_search(
        &self,
        project: Option<&str>,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<(i64, f32)>> {
        let filter = MemoryFilter { project: project.map(str::to_string), active_only: true, ..Default::default() };
        let memories = self.list_memories(&filter).await?;
        let mut scored: Vec<(i64, f32)> = memories
            .iter()
            .filter(|m| !m.embedding.is_empty())
            .map(|m| (m.id, cosine_similarity(query_embedding, &m.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn keyword_search(&self, project: Option<&str>, terms: &[String], limit: usize) -> Result<Vec<i64>> {
        let filter = MemoryFilter { project: project.map(str::to_string), active_only: true, ..Default::default() };
        let memories = self.list_memories(&filter).await?;
        let lowered: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let mut matches: Vec<(i64, DateTime<Utc>)> = memories
            .into_iter()
            .filter(|m| {
                let haystack = format!("{} {}", m.content, m.summary.clone().unwrap_or_default()).to_lowercase();
                lowered.iter().any(|t| haystack.contains(t.as_str()) || m.tags.iter().any(|tag| tag == t))
            })
            .map(|m| (m.id, m.updated_at))
            .collect();
        matches.sort_by(|a, b| b.1.cmp(&a.1));
        matches.truncate(limit);
        Ok(matches.into_iter().map(|(id, _)| id).collect())
    }

    async fn insert_relation(&self, relation: RelationRow) -> Result<()> {
        if relation.source_id == relation.target_id {
            return Err(StorageError::Unavailable("relation cannot self-reference a memory".into()));
        }
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO memory_relations (source_id, target_id, relation, created_at) \
             VALUES (?1, ?2, ?3, ?4) ON CONFLICT(source_id, target_id, relation) DO NOTHING",
            params![relation.source_id, relation.target_id, relation.relation, relation.created_at.to_rfc3339()],
        )
        .await
        .map_err(sqlite_err)?;
        Ok(())
    }

    async fn list_relations(&self, memory_id: i64) -> Result<Vec<RelationRow>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT source_id, target_id, relation, created_at FROM memory_relations \
                 WHERE source_id = ?1 OR target_id = ?1",
                params![memory_id],
            )
            .await
            .map_err(sqlite_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(sqlite_err)? {
            out.push(RelationRow {
                source_id: row.get(0).map_err(sqlite_err)?,
                target_id: row.get(1).map_err(sqlite_err)?,
                relation: row.get(2).map_err(sqlite_err)?,
                created_at: parse_ts(&row.get::<String>(3).map_err(sqlite_err)?)?,
            });
        }
        Ok(out)
    }

    async fn enqueue_event(&self, topic: &str, payload: serde_json::Value) -> Result<i64> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO events (topic, payload, created_at, delivered_at, attempts) \
             VALUES (?1, ?2, ?3, NULL, 0)",
            params![topic, serde_json::to_string(&payload)?, Utc::now().to_rfc3339()],
        )
        .await
        .map_err(sqlite_err)?;
        conn.last_insert_rowid().try_into().map_err(|_| StorageError::Unavailable("rowid overflow".into()))
    }

    async fn fetch_undelivered_events(&self, limit: usize) -> Result<Vec<EventRow>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT id, topic, payload, created_at, delivered_at, attempts FROM events \
                 WHERE delivered_at IS NULL ORDER BY id ASC LIMIT ?1",
                params![i64::try_from(limit).unwrap_or(i64::MAX)],
            )
            .await
            .map_err(sqlite_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(sqlite_err)? {
            let delivered_at: Option<String> = row.get(4).map_err(sqlite_err)?;
            out.push(EventRow {
                id: row.get(0).map_err(sqlite_err)?,
                topic: row.get(1).map_err(sqlite_err)?,
                payload: serde_json::from_str(&row.get::<String>(2).map_err(sqlite_err)?)?,
                created_at: parse_ts(&row.get::<String>(3).map_err(sqlite_err)?)?,
                delivered_at: delivered_at.as_deref().map(parse_ts).transpose()?,
                attempts: row.get::<i64>(5).map_err(sqlite_err)? as i32,
            });
        }
        Ok(out)
    }

    async fn mark_event_delivered(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE events SET delivered_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )
        .await
        .map_err(sqlite_err)?;
        Ok(())
    }

    async fn increment_event_attempts(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("UPDATE events SET attempts = attempts + 1 WHERE id = ?1", params![id])
            .await
            .map_err(sqlite_err)?;
        Ok(())
    }

    async fn insert_memory_with_event(
        &self,
        row: NewMemoryRow,
        topic: &str,
        build_payload: &(dyn Fn(i64) -> serde_json::Value + Send + Sync),
    ) -> Result<(i64, i64)> {
        self.ensure_project(&row.project).await?;
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await.map_err(sqlite_err)?;

        tx.execute(
            &format!(
                "INSERT INTO memories (project, content, summary, memory_type, importance, tags, \
                 auto_tags, related_files, session_id, author, created_at, updated_at, active, \
                 inactivation_reason, embedding) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,1,NULL,?13)"
            ),
            params![
                row.project,
                row.content,
                row.summary,
                row.memory_type,
                f64::from(row.importance),
                serde_json::to_string(&row.tags)?,
                serde_json::to_string(&row.auto_tags)?,
                serde_json::to_string(&row.related_files)?,
                row.session_id,
                row.author,
                now.clone(),
                now.clone(),
                Self::encode_embedding(&row.embedding),
            ],
        )
        .await
        .map_err(sqlite_err)?;
        let memory_id: i64 =
            tx.last_insert_rowid().try_into().map_err(|_| StorageError::Unavailable("rowid overflow".into()))?;

        let payload = build_payload(memory_id);
        tx.execute(
            "INSERT INTO events (topic, payload, created_at, delivered_at, attempts) VALUES (?1, ?2, ?3, NULL, 0)",
            params![topic, serde_json::to_string(&payload)?, now],
        )
        .await
        .map_err(sqlite_err)?;
        let event_id: i64 =
            tx.last_insert_rowid().try_into().map_err(|_| StorageError::Unavailable("rowid overflow".into()))?;

        tx.commit().await.map_err(sqlite_err)?;
        Ok((memory_id, event_id))
    }

    async fn update_memory_with_event(&self, row: &MemoryRow, topic: &str, payload: serde_json::Value) -> Result<i64> {
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await.map_err(sqlite_err)?;

        tx.execute(
            "UPDATE memories SET content=?1, summary=?2, memory_type=?3, importance=?4, tags=?5, \
             auto_tags=?6, related_files=?7, updated_at=?8, active=?9, inactivation_reason=?10, \
             embedding=?11 WHERE id=?12",
            params![
                row.content.clone(),
                row.summary.clone(),
                row.memory_type.clone(),
                f64::from(row.importance),
                serde_json::to_string(&row.tags)?,
                serde_json::to_string(&row.auto_tags)?,
                serde_json::to_string(&row.related_files)?,
                Utc::now().to_rfc3339(),
                i64::from(row.active),
                row.inactivation_reason.clone(),
                Self::encode_embedding(&row.embedding),
                row.id,
            ],
        )
        .await
        .map_err(sqlite_err)?;

        tx.execute(
            "INSERT INTO events (topic, payload, created_at, delivered_at, attempts) VALUES (?1, ?2, ?3, NULL, 0)",
            params![topic, serde_json::to_string(&payload)?, Utc::now().to_rfc3339()],
        )
        .await
        .map_err(sqlite_err)?;
        let event_id: i64 =
            tx.last_insert_rowid().try_into().map_err(|_| StorageError::Unavailable("rowid overflow".into()))?;

        tx.commit().await.map_err(sqlite_err)?;
        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewMemoryRow;

    fn new_row(project: &str, content: &str, embedding: Vec<f32>) -> NewMemoryRow {
        NewMemoryRow {
            project: project.to_string(),
            content: content.to_string(),
            summary: None,
            memory_type: "note".to_string(),
            importance: 0.5,
            tags: vec!["rust".to_string()],
            auto_tags: Vec::new(),
            related_files: Vec::new(),
            session_id: None,
            author: "user".to_string(),
            embedding,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_roundtrips_embedding() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let id = storage.insert_memory(new_row("proj", "hello world", vec![1.0, 0.0, 0.0])).await.unwrap();

        let fetched = storage.get_memory(id).await.unwrap().expect("memory present");
        assert_eq!(fetched.content, "hello world");
        assert_eq!(fetched.embedding, vec![1.0, 0.0, 0.0]);
        assert!(fetched.active);
    }

    #[tokio::test]
    async fn vector_search_ranks_by_cosine_similarity() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        storage.insert_memory(new_row("proj", "a", vec![1.0, 0.0])).await.unwrap();
        let id_b = storage.insert_memory(new_row("proj", "b", vec![0.0, 1.0])).await.unwrap();

        let hits = storage.vector_search(Some("proj"), &[0.0, 1.0], 5).await.unwrap();
        assert_eq!(hits[0].0, id_b);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn insert_relation_rejects_self_loop() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let id = storage.insert_memory(new_row("proj", "a", vec![1.0])).await.unwrap();
        let err = storage
            .insert_relation(RelationRow {
                source_id: id,
                target_id: id,
                relation: "related".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[tokio::test]
    async fn event_outbox_tracks_delivery() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let id = storage.enqueue_event("memory.created", serde_json::json!({"memory_id": 1})).await.unwrap();

        let pending = storage.fetch_undelivered_events(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);

        storage.mark_event_delivered(id).await.unwrap();
        let pending = storage.fetch_undelivered_events(10).await.unwrap();
        assert!(pending.is_empty());
    }
}
