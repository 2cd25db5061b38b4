//! SQL DDL for the SQLite backend.
//!
//! Tables cover the critical-path data model (`projects`, `memories`,
//! `memory_relations`) plus the enrichment outbox (`events`).
//! Schema-only tables for features this workspace doesn't implement yet
//! (`thinking_sequences`, `thoughts`, `tasks`, `task_memory_links`,
//! `project_documents`, `project_links`, `app_settings`, `sessions`) are
//! intentionally omitted here rather than carried as dead columns; they are
//! additive and can be migrated in without touching the tables below.

pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project TEXT NOT NULL REFERENCES projects(name),
    content TEXT NOT NULL,
    summary TEXT,
    memory_type TEXT NOT NULL,
    importance REAL NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    auto_tags TEXT NOT NULL DEFAULT '[]',
    related_files TEXT NOT NULL DEFAULT '[]',
    session_id TEXT,
    author TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    inactivation_reason TEXT,
    embedding BLOB NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_memories_project ON memories(project);
CREATE INDEX IF NOT EXISTS idx_memories_project_active ON memories(project, active);
CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);

CREATE TABLE IF NOT EXISTS memory_relations (
    source_id INTEGER NOT NULL REFERENCES memories(id),
    target_id INTEGER NOT NULL REFERENCES memories(id),
    relation TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (source_id, target_id, relation),
    CHECK (source_id != target_id)
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    delivered_at TEXT,
    attempts INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_events_undelivered ON events(delivered_at) WHERE delivered_at IS NULL;
";
