use serde_json::json;
use sidenote::repo::{NoteRepository, NOTES_KEY};
use sidenote::store::{MemBackend, Storage, StorageBackend, SYNC_QUOTA_BYTES_PER_ITEM};
use std::collections::HashMap;
use std::sync::Arc;

fn setup() -> (Arc<MemBackend>, NoteRepository) {
    let content = Arc::new(MemBackend::new());
    let storage = Storage::new(
        Arc::new(MemBackend::new()),
        Arc::clone(&content) as Arc<dyn StorageBackend>,
    );
    (content, NoteRepository::new(storage))
}

#[tokio::test]
async fn test_create_then_list_round_trip() {
    let (_content, repo) = setup();
    assert!(repo.list().await.is_empty());

    let note = repo.create(Some("Groceries")).await.unwrap();
    let listed = repo.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, note.id);
    assert_eq!(listed[0].title, "Groceries");
    assert_eq!(listed[0].content, "");

    let second = repo.create(None).await.unwrap();
    assert_ne!(second.id, note.id);
    assert_eq!(repo.list().await.len(), 2);
}

#[tokio::test]
async fn test_ordering_is_newest_created_first() {
    let (_content, repo) = setup();
    let a = repo.create(Some("A")).await.unwrap();
    let b = repo.create(Some("B")).await.unwrap();

    let listed = repo.list().await;
    assert_eq!(listed[0].id, b.id);
    assert_eq!(listed[1].id, a.id);
}

#[tokio::test]
async fn test_update_content_twice_keeps_shape() {
    let (_content, repo) = setup();
    let note = repo.create(Some("n")).await.unwrap();

    assert!(repo.update_content(&note.id, "x").await);
    let first = repo.list().await;
    assert!(repo.update_content(&note.id, "x").await);
    let second = repo.list().await;

    assert_eq!(second.len(), first.len());
    assert_eq!(second[0].id, note.id);
    assert_eq!(second[0].content, "x");
    assert!(second[0].updated_at >= first[0].updated_at);
}

#[tokio::test]
async fn test_update_missing_note_returns_false() {
    let (_content, repo) = setup();
    assert!(!repo.update_content("note_0", "x").await);
    assert!(!repo.update_title("note_0", "t").await);
}

#[tokio::test]
async fn test_update_does_not_reorder_collection() {
    let (_content, repo) = setup();
    let a = repo.create(Some("A")).await.unwrap();
    let b = repo.create(Some("B")).await.unwrap();

    // Editing the older note must not move it to the front.
    assert!(repo.update_content(&a.id, "edited").await);
    let listed = repo.list().await;
    assert_eq!(listed[0].id, b.id);
    assert_eq!(listed[1].id, a.id);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (_content, repo) = setup();
    let note = repo.create(Some("n")).await.unwrap();

    assert!(repo.delete("note_never_existed").await);
    let listed = repo.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, note.id);

    assert!(repo.delete(&note.id).await);
    assert!(repo.list().await.is_empty());
    assert!(repo.delete(&note.id).await);
}

#[tokio::test]
async fn test_failed_write_leaves_collection_untouched() {
    let (content, repo) = setup();
    let note = repo.create(Some("n")).await.unwrap();
    assert!(repo.update_content(&note.id, "good").await);

    content.set_fail_writes(true);
    assert!(!repo.update_content(&note.id, "lost").await);
    assert!(repo.create(Some("also lost")).await.is_none());
    assert!(!repo.delete(&note.id).await);

    content.set_fail_writes(false);
    let listed = repo.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "good");
}

#[tokio::test]
async fn test_groceries_scenario() {
    let (_content, repo) = setup();
    let note = repo.create(Some("Groceries")).await.unwrap();
    assert!(repo.update_content(&note.id, "milk").await);

    let listed = repo.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Groceries");
    assert_eq!(listed[0].content, "milk");
    assert!(listed[0].created_at <= listed[0].updated_at);
}

#[tokio::test]
async fn test_malformed_collection_degrades_to_empty() {
    let (content, repo) = setup();
    content
        .set(HashMap::from([(
            NOTES_KEY.to_string(),
            json!({"this is": "not a notes array"}),
        )]))
        .await
        .unwrap();

    assert!(repo.list().await.is_empty());

    // The store stays usable: the next create rewrites a valid collection.
    let note = repo.create(Some("fresh")).await.unwrap();
    let listed = repo.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, note.id);
}

#[tokio::test]
async fn test_overlapping_read_modify_write_is_last_writer_wins() {
    let (content, repo) = setup();
    let note = repo.create(Some("Groceries")).await.unwrap();

    // One read-modify-write cycle reads the collection...
    let mut stale = repo.list().await;

    // ...a full title-edit cycle lands in between...
    assert!(repo.update_title(&note.id, "Shopping").await);

    // ...then the first cycle writes its stale view back, exactly the way a
    // debounced autosave racing a manual edit would.
    stale[0].content = "milk".to_string();
    content
        .set(HashMap::from([(
            NOTES_KEY.to_string(),
            serde_json::to_value(&stale).unwrap(),
        )]))
        .await
        .unwrap();

    // Whole-collection rewrites make the last writer win: the title edit is
    // silently clobbered. This behavior is part of the contract.
    let listed = repo.list().await;
    assert_eq!(listed[0].title, "Groceries");
    assert_eq!(listed[0].content, "milk");
}

#[tokio::test]
async fn test_quota_exceeded_write_reports_failure() {
    let repo = NoteRepository::new(Storage::quota_limited());

    let note = repo.create(Some("n")).await.unwrap();
    let oversized = "x".repeat(SYNC_QUOTA_BYTES_PER_ITEM + 1);
    assert!(!repo.update_content(&note.id, &oversized).await);

    let listed = repo.list().await;
    assert_eq!(listed[0].content, "");
}

#[tokio::test]
async fn test_on_disk_storage_survives_a_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let repo = NoteRepository::new(Storage::on_disk(dir.path()));
    let note = repo.create(Some("persisted")).await.unwrap();
    assert!(repo.update_content(&note.id, "still here").await);

    let reopened = NoteRepository::new(Storage::on_disk(dir.path()));
    let listed = reopened.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, note.id);
    assert_eq!(listed[0].content, "still here");
}
