//! Conversions between `cairn-storage`'s plain rows and this crate's typed
//! domain model. Kept separate from `types.rs` so the typed model has no
//! `cairn-storage` dependency of its own.

use crate::error::{MemoryError, Result};
use crate::types::{Author, Memory, MemoryType, NewMemory};
use cairn_storage::{MemoryRow, NewMemoryRow};
use std::collections::HashSet;
use std::str::FromStr;

impl TryFrom<MemoryRow> for Memory {
    type Error = MemoryError;

    fn try_from(row: MemoryRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            project: row.project,
            content: row.content,
            summary: row.summary,
            memory_type: MemoryType::from_str(&row.memory_type).map_err(MemoryError::InvalidMemoryType)?,
            importance: row.importance,
            tags: row.tags.into_iter().collect::<HashSet<_>>(),
            auto_tags: row.auto_tags.into_iter().collect::<HashSet<_>>(),
            related_files: row.related_files,
            session_id: row.session_id,
            author: Author::from_str(&row.author).unwrap_or(Author::User),
            created_at: row.created_at,
            updated_at: row.updated_at,
            active: row.active,
            inactivation_reason: row.inactivation_reason,
            embedding: row.embedding,
        })
    }
}

pub fn new_memory_to_row(memory: &NewMemory, embedding: Vec<f32>) -> NewMemoryRow {
    NewMemoryRow {
        project: memory.project.clone(),
        content: memory.content.clone(),
        summary: None,
        memory_type: memory.memory_type.as_str().to_string(),
        importance: memory.importance,
        tags: memory.tags.clone(),
        auto_tags: Vec::new(),
        related_files: memory.related_files.clone(),
        session_id: memory.session_id.clone(),
        author: memory.author.as_str().to_string(),
        embedding,
    }
}
