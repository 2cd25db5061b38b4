#![cfg(feature = "sqlite")]

use cairn_storage::{MemoryFilter, NewMemoryRow, SqliteStorage, Storage};

fn row(project: &str, content: &str, tags: Vec<&str>) -> NewMemoryRow {
    NewMemoryRow {
        project: project.to_string(),
        content: content.to_string(),
        summary: None,
        memory_type: "note".to_string(),
        importance: 0.5,
        tags: tags.into_iter().map(str::to_string).collect(),
        auto_tags: Vec::new(),
        related_files: Vec::new(),
        session_id: None,
        author: "user".to_string(),
        embedding: vec![0.1, 0.2, 0.3],
    }
}

#[tokio::test]
async fn list_memories_filters_by_project_and_tag() {
    let storage = SqliteStorage::open_in_memory().await.unwrap();
    storage.insert_memory(row("alpha", "first", vec!["rust"])).await.unwrap();
    storage.insert_memory(row("alpha", "second", vec!["python"])).await.unwrap();
    storage.insert_memory(row("beta", "third", vec!["rust"])).await.unwrap();

    let filter = MemoryFilter {
        project: Some("alpha".to_string()),
        tags: vec!["rust".to_string()],
        active_only: true,
        ..Default::default()
    };
    let hits = storage.list_memories(&filter).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "first");
}

#[tokio::test]
async fn keyword_search_matches_content_and_tags() {
    let storage = SqliteStorage::open_in_memory().await.unwrap();
    storage.insert_memory(row("proj", "uses tokio for async io", vec![])).await.unwrap();
    storage.insert_memory(row("proj", "unrelated note", vec!["tokio"])).await.unwrap();
    storage.insert_memory(row("proj", "completely different", vec![])).await.unwrap();

    let hits = storage.keyword_search(Some("proj"), &["tokio".to_string()], 10).await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn update_memory_persists_inactivation() {
    let storage = SqliteStorage::open_in_memory().await.unwrap();
    let id = storage.insert_memory(row("proj", "content", vec![])).await.unwrap();
    let mut memory = storage.get_memory(id).await.unwrap().unwrap();

    memory.active = false;
    memory.inactivation_reason = Some("superseded".to_string());
    storage.update_memory(&memory).await.unwrap();

    let reloaded = storage.get_memory(id).await.unwrap().unwrap();
    assert!(!reloaded.active);
    assert_eq!(reloaded.inactivation_reason.as_deref(), Some("superseded"));
}
