use chatkeep::identity::{CookieJar, IdentityRegistry};
use chatkeep::storage::{ConversationPersistence, MemoryBackend, SledBackend};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Persistence and registry stored on disk inside a fresh temp dir
#[allow(dead_code)]
pub fn create_temp_storage() -> (ConversationPersistence, IdentityRegistry, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let (persistence, registry) = open_storage(&tmp);
    (persistence, registry, tmp)
}

/// Open the sled database and cookie jar inside `dir`
#[allow(dead_code)]
pub fn open_storage(dir: &TempDir) -> (ConversationPersistence, IdentityRegistry) {
    let backend = SledBackend::open(dir.path().join("conversations.db"))
        .expect("failed to open sled backend");
    let jar = CookieJar::open(dir.path().join("cookies.json")).expect("failed to open cookie jar");
    (
        ConversationPersistence::with_default_key(Arc::new(backend)),
        IdentityRegistry::new(Arc::new(jar)),
    )
}

/// In-memory persistence and registry
#[allow(dead_code)]
pub fn memory_storage() -> (ConversationPersistence, IdentityRegistry) {
    (
        ConversationPersistence::with_default_key(Arc::new(MemoryBackend::new())),
        IdentityRegistry::new(Arc::new(CookieJar::in_memory())),
    )
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// A history response body in the wrapped shape
#[allow(dead_code)]
pub fn history_body(ids: &[&str]) -> serde_json::Value {
    let conversations: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "title": format!("Remote {}", id),
                "messages": [
                    {
                        "id": format!("{}-m1", id),
                        "content": "hello from the server",
                        "role": "user",
                        "timestamp": "2024-05-01T12:00:00Z"
                    },
                    {
                        "id": format!("{}-m2", id),
                        "content": "hi there",
                        "role": "assistant",
                        "timestamp": "2024-05-01T12:00:05Z"
                    }
                ],
                "createdAt": "2024-05-01T12:00:00Z",
                "updatedAt": "2024-05-01T12:00:05Z"
            })
        })
        .collect();
    serde_json::json!({ "conversations": conversations })
}
