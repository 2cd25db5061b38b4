//! `tokio-postgres`/`pgvector`-backed [`Storage`] implementation, behind the `postgres` feature,
//! for deployments that outgrow SQLite.
//!
//! Embeddings are stored as `pgvector::Vector` columns and ranked with Postgres's native `<=>`
//! cosine-distance operator instead of the brute-force scan the SQLite backend uses in application
//! code.

use crate::error::{Result, StorageError};
use crate::model::{EventRow, MemoryFilter, MemoryRow, NewMemoryRow, RelationRow};
use crate::traits::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config as PoolConfig, Pool, Runtime};
use pgvector::Vector;
use tokio_postgres::NoTls;

mod embedded {
    refinery::embed_migrations!("migrations");
}

pub struct PostgresStorage {
    pool: Pool,
}

impl PostgresStorage {
    /// Connect using a `postgres://` URL, running pending migrations first.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let mut cfg = PoolConfig::new();
        cfg.url = Some(database_url.to_string());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let mut client = pool.get().await.map_err(|e| StorageError::Unavailable(e.to_string()))?;
        embedded::migrations::runner()
            .run_async(&mut **client)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn pg_err(e: tokio_postgres::Error) -> StorageError {
    StorageError::Postgres(e)
}

fn pool_err(e: deadpool_postgres::PoolError) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

fn row_to_memory(row: &tokio_postgres::Row) -> MemoryRow {
    let embedding: Vector = row.get("embedding");
    MemoryRow {
        id: row.get("id"),
        project: row.get("project"),
        content: row.get("content"),
        summary: row.get("summary"),
        memory_type: row.get("memory_type"),
        importance: row.get("importance"),
        tags: row.get::<_, Vec<String>>("tags"),
        auto_tags: row.get::<_, Vec<String>>("auto_tags"),
        related_files: row.get::<_, Vec<String>>("related_files"),
        session_id: row.get("session_id"),
        author: row.get("author"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        active: row.get("active"),
        inactivation_reason: row.get("inactivation_reason"),
        embedding: embedding.to_vec(),
    }
}

const MEMORY_COLUMNS: &str = "id, project, content, summary, memory_type, importance, tags, \
     auto_tags, related_files, session_id, author, created_at, updated_at, active, \
     inactivation_reason, embedding";

#[async_trait]
impl Storage for PostgresStorage {
    async fn ensure_project(&self, name: &str) -> Result<()> {
        let client = self.pool.get().await.map_err(pool_err)?;
        client
            .execute(
                "INSERT INTO projects (name, created_at) VALUES ($1, now()) ON CONFLICT (name) DO NOTHING",
                &[&name],
            )
            .await
            .map_err(pg_err)?;
        Ok(())
    }

    async fn insert_memory(&self, row: NewMemoryRow) -> Result<i64> {
        self.ensure_project(&row.project).await?;
        let client = self.pool.get().await.map_err(pool_err)?;
        let embedding = Vector::from(row.embedding);
        let id: i64 = client
            .query_one(
                "INSERT INTO memories (project, content, summary, memory_type, importance, tags, \
                 auto_tags, related_files, session_id, author, created_at, updated_at, active, \
                 embedding) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,now(),now(),true,$11) RETURNING id",
                &[
                    &row.project,
                    &row.content,
                    &row.summary,
                    &row.memory_type,
                    &row.importance,
                    &row.tags,
                    &row.auto_tags,
                    &row.related_files,
                    &row.session_id,
                    &row.author,
                    &embedding,
                ],
            )
            .await
            .map_err(pg_err)?
            .get(0);
        Ok(id)
    }

    async fn get_memory(&self, id: i64) -> Result<Option<MemoryRow>> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let row = client
            .query_opt(&format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = $1"), &[&id])
            .await
            .map_err(pg_err)?;
        Ok(row.as_ref().map(row_to_memory))
    }

    async fn update_memory(&self, row: &MemoryRow) -> Result<()> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let embedding = Vector::from(row.embedding.clone());
        client
            .execute(
                "UPDATE memories SET content=$1, summary=$2, memory_type=$3, importance=$4, tags=$5, \
                 auto_tags=$6, related_files=$7, updated_at=now(), active=$8, inactivation_reason=$9, \
                 embedding=$10 WHERE id=$11",
                &[
                    &row.content,
                    &row.summary,
                    &row.memory_type,
                    &row.importance,
                    &row.tags,
                    &row.auto_tags,
                    &row.related_files,
                    &row.active,
                    &row.inactivation_reason,
                    &embedding,
                    &row.id,
                ],
            )
            .await
            .map_err(pg_err)?;
        Ok(())
    }

    async fn list_memories(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRow>> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let rows = client
            .query(
                &format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories WHERE ($1::text IS NULL OR project = $1) \
                     AND ($2::text IS NULL OR memory_type = $2) AND (NOT $3 OR active) \
                     ORDER BY updated_at DESC"
                ),
                &[&filter.project, &filter.memory_type, &filter.active_only],
            )
            .await
            .map_err(pg_err)?;
        Ok(rows
            .iter()
            .map(row_to_memory)
            .filter(|m| filter.tags.is_empty() || filter.tags.iter().any(|t| m.tags.contains(t)))
            .collect())
    }

    async fn vector_search(
        &self,
        project: Option<&str>,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<(i64, f32)>> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let query = Vector::from(query_embedding.to_vec());
        let rows = client
            .query(
                "SELECT id, 1 - (embedding <=> $1) AS score FROM memories \
                 WHERE ($2::text IS NULL OR project = $2) AND active ORDER BY embedding <=> $1 LIMIT $3",
                &[&query, &project, &(i64::try_from(limit).unwrap_or(i64::MAX))],
            )
            .await
            .map_err(pg_err)?;
        Ok(rows.iter().map(|r| (r.get::<_, i64>(0), r.get::<_, f32>(1))).collect())
    }

    async fn keyword_search(&self, project: Option<&str>, terms: &[String], limit: usize) -> Result<Vec<i64>> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let pattern = terms.iter().map(|t| format!("%{t}%")).collect::<Vec<_>>();
        let rows = client
            .query(
                "SELECT id FROM memories WHERE ($1::text IS NULL OR project = $1) AND active \
                 AND (content ILIKE ANY($2) OR summary ILIKE ANY($2) OR tags && $3) \
                 ORDER BY updated_at DESC LIMIT $4",
                &[&project, &pattern, &terms, &(i64::try_from(limit).unwrap_or(i64::MAX))],
            )
            .await
            .map_err(pg_err)?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    async fn insert_relation(&self, relation: RelationRow) -> Result<()> {
        if relation.source_id == relation.target_id {
            return Err(StorageError::Unavailable("relation cannot self-reference a memory".into()));
        }
        let client = self.pool.get().await.map_err(pool_err)?;
        client
            .execute(
                "INSERT INTO memory_relations (source_id, target_id, relation, created_at) \
                 VALUES ($1, $2, $3, now()) ON CONFLICT (source_id, target_id, relation) DO NOTHING",
                &[&relation.source_id, &relation.target_id, &relation.relation],
            )
            .await
            .map_err(pg_err)?;
        Ok(())
    }

    async fn list_relations(&self, memory_id: i64) -> Result<Vec<RelationRow>> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let rows = client
            .query(
                "SELECT source_id, target_id, relation, created_at FROM memory_relations \
                 WHERE source_id = $1 OR target_id = $1",
                &[&memory_id],
            )
            .await
            .map_err(pg_err)?;
        Ok(rows
            .iter()
            .map(|r| RelationRow {
                source_id: r.get(0),
                target_id: r.get(1),
                relation: r.get(2),
                created_at: r.get::<_, DateTime<Utc>>(3),
            })
            .collect())
    }

    async fn enqueue_event(&self, topic: &str, payload: serde_json::Value) -> Result<i64> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let id: i64 = client
            .query_one(
                "INSERT INTO events (topic, payload, created_at, attempts) VALUES ($1, $2, now(), 0) \
                 RETURNING id",
                &[&topic, &payload],
            )
            .await
            .map_err(pg_err)?
            .get(0);
        Ok(id)
    }

    async fn fetch_undelivered_events(&self, limit: usize) -> Result<Vec<EventRow>> {
        let client = self.pool.get().await.map_err(pool_err)?;
        let rows = client
            .query(
                "SELECT id, topic, payload, created_at, delivered_at, attempts FROM events \
                 WHERE delivered_at IS NULL ORDER BY id ASC LIMIT $1",
                &[&(i64::try_from(limit).unwrap_or(i64::MAX))],
            )
            .await
            .map_err(pg_err)?;
        Ok(rows
            .iter()
            .map(|r| EventRow {
                id: r.get(0),
                topic: r.get(1),
                payload: r.get(2),
                created_at: r.get(3),
                delivered_at: r.get(4),
                attempts: r.get(5),
            })
            .collect())
    }

    async fn mark_event_delivered(&self, id: i64) -> Result<()> {
        let client = self.pool.get().await.map_err(pool_err)?;
        client.execute("UPDATE events SET delivered_at = now() WHERE id = $1", &[&id]).await.map_err(pg_err)?;
        Ok(())
    }

    async fn increment_event_attempts(&self, id: i64) -> Result<()> {
        let client = self.pool.get().await.map_err(pool_err)?;
        client.execute("UPDATE events SET attempts = attempts + 1 WHERE id = $1", &[&id]).await.map_err(pg_err)?;
        Ok(())
    }

    async fn insert_memory_with_event(
        &self,
        row: NewMemoryRow,
        topic: &str,
        build_payload: &(dyn Fn(i64) -> serde_json::Value + Send + Sync),
    ) -> Result<(i64, i64)> {
        self.ensure_project(&row.project).await?;
        let mut client = self.pool.get().await.map_err(pool_err)?;
        let tx = client.transaction().await.map_err(pg_err)?;
        let embedding = Vector::from(row.embedding);

        let memory_id: i64 = tx
            .query_one(
                "INSERT INTO memories (project, content, summary, memory_type, importance, tags, \
                 auto_tags, related_files, session_id, author, created_at, updated_at, active, \
                 embedding) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,now(),now(),true,$11) RETURNING id",
                &[
                    &row.project,
                    &row.content,
                    &row.summary,
                    &row.memory_type,
                    &row.importance,
                    &row.tags,
                    &row.auto_tags,
                    &row.related_files,
                    &row.session_id,
                    &row.author,
                    &embedding,
                ],
            )
            .await
            .map_err(pg_err)?
            .get(0);

        let payload = build_payload(memory_id);
        let event_id: i64 = tx
            .query_one(
                "INSERT INTO events (topic, payload, created_at, attempts) VALUES ($1, $2, now(), 0) RETURNING id",
                &[&topic, &payload],
            )
            .await
            .map_err(pg_err)?
            .get(0);

        tx.commit().await.map_err(pg_err)?;
        Ok((memory_id, event_id))
    }

    async fn update_memory_with_event(&self, row: &MemoryRow, topic: &str, payload: serde_json::Value) -> Result<i64> {
        let mut client = self.pool.get().await.map_err(pool_err)?;
        let tx = client.transaction().await.map_err(pg_err)?;
        let embedding = Vector::from(row.embedding.clone());

        tx.execute(
            "UPDATE memories SET content=$1, summary=$2, memory_type=$3, importance=$4, tags=$5, \
             auto_tags=$6, related_files=$7, updated_at=now(), active=$8, inactivation_reason=$9, \
             embedding=$10 WHERE id=$11",
            &[
                &row.content,
                &row.summary,
                &row.memory_type,
                &row.importance,
                &row.tags,
                &row.auto_tags,
                &row.related_files,
                &row.active,
                &row.inactivation_reason,
                &embedding,
                &row.id,
            ],
        )
        .await
        .map_err(pg_err)?;

        let event_id: i64 = tx
            .query_one(
                "INSERT INTO events (topic, payload, created_at, attempts) VALUES ($1, $2, now(), 0) RETURNING id",
                &[&topic, &payload],
            )
            .await
            .map_err(pg_err)?
            .get(0);

        tx.commit().await.map_err(pg_err)?;
        Ok(event_id)
    }
}
