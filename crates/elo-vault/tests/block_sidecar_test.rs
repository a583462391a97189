//! Sidecar behavior against a real directory.

use elo_vault::{BlockMetadataStore, FilesystemStore};
use serde_json::{json, Value};
use tempfile::TempDir;

fn read_json(dir: &TempDir, path: &str) -> Value {
    let text = std::fs::read_to_string(dir.path().join(path)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn test_sync_metadata_fills_missing_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("notes")).unwrap();
    std::fs::write(dir.path().join("notes/Intro.json"), r#"{"x": {"attempts": 5}}"#).unwrap();

    let blocks = BlockMetadataStore::new(FilesystemStore::new(dir.path()));
    let wrote = blocks.sync_metadata("notes/Intro.md", &["x", "y"]).await.unwrap();

    assert!(wrote);
    assert_eq!(
        read_json(&dir, "notes/Intro.json"),
        json!({
            "x": {"attempts": 5, "score": 0, "difficulty": 0, "importance": 0},
            "y": {"score": 0, "difficulty": 0, "importance": 0, "attempts": 0}
        })
    );
}

#[tokio::test]
async fn test_sync_metadata_leaves_complete_sidecar_untouched() {
    let dir = TempDir::new().unwrap();
    let original = r#"{"x":{"score":1,"difficulty":2,"importance":3,"attempts":4}}"#;
    std::fs::write(dir.path().join("a.json"), original).unwrap();

    let blocks = BlockMetadataStore::new(FilesystemStore::new(dir.path()));
    assert!(!blocks.sync_metadata("a.md", &["x"]).await.unwrap());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.json")).unwrap(),
        original
    );
}

#[tokio::test]
async fn test_unparsable_sidecar_reads_as_empty_and_is_replaced_on_update() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.json"), "{ broken").unwrap();

    let blocks = BlockMetadataStore::new(FilesystemStore::new(dir.path()));
    assert!(blocks.get_file_metadata("a.md").await.unwrap().is_empty());

    let mut partial = serde_json::Map::new();
    partial.insert("importance".to_string(), json!(8));
    blocks.update_block_metadata("a.md", "ab12cd", partial).await.unwrap();

    assert_eq!(read_json(&dir, "a.json"), json!({"ab12cd": {"importance": 8}}));
}

#[tokio::test]
async fn test_non_utf8_sidecar_reads_as_empty_and_sync_recovers() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.json"), [0xff, 0xfe, b'{', b'}']).unwrap();

    let blocks = BlockMetadataStore::new(FilesystemStore::new(dir.path()));
    assert!(blocks.get_file_metadata("a.md").await.unwrap().is_empty());

    assert!(blocks.sync_metadata("a.md", &["x"]).await.unwrap());
    assert_eq!(
        read_json(&dir, "a.json"),
        json!({"x": {"score": 0, "difficulty": 0, "importance": 0, "attempts": 0}})
    );
}

#[tokio::test]
async fn test_handle_rename_moves_sidecar_only_if_present() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("archive")).unwrap();
    std::fs::write(dir.path().join("a.json"), "{}").unwrap();

    let blocks = BlockMetadataStore::new(FilesystemStore::new(dir.path()));

    assert!(blocks.handle_rename("a.md", "archive/b.md").await);
    assert!(!dir.path().join("a.json").exists());
    assert!(dir.path().join("archive/b.json").exists());

    assert!(!blocks.handle_rename("missing.md", "archive/other.md").await);
    assert!(!dir.path().join("archive/other.json").exists());
}

#[tokio::test]
async fn test_handle_rename_does_not_overwrite_existing_sidecar() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.json"), r#"{"old": {}}"#).unwrap();
    std::fs::write(dir.path().join("b.json"), r#"{"keep": {}}"#).unwrap();

    let blocks = BlockMetadataStore::new(FilesystemStore::new(dir.path()));
    assert!(!blocks.handle_rename("a.md", "b.md").await);
    assert_eq!(read_json(&dir, "b.json"), json!({"keep": {}}));
    assert_eq!(read_json(&dir, "a.json"), json!({"old": {}}));
}
