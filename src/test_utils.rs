//! Test utilities for Chatkeep
//!
//! This module provides common test utilities including temporary
//! directories, in-memory and on-disk stores, and assertion helpers.

use crate::conversation::ConversationStore;
use crate::identity::{CookieJar, IdentityRegistry};
use crate::storage::{ConversationPersistence, MemoryBackend, SledBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// In-memory persistence and registry sharing nothing with other tests
pub fn memory_parts() -> (ConversationPersistence, IdentityRegistry) {
    let persistence = ConversationPersistence::with_default_key(Arc::new(MemoryBackend::new()));
    let registry = IdentityRegistry::new(Arc::new(CookieJar::in_memory()));
    (persistence, registry)
}

/// A freshly initialized in-memory store
pub fn memory_store() -> ConversationStore {
    let (persistence, registry) = memory_parts();
    ConversationStore::init(persistence, registry)
}

/// Persistence and registry backed by files inside `dir`
///
/// # Panics
///
/// Panics if the sled database or cookie jar cannot be opened
pub fn disk_parts(dir: &TempDir) -> (ConversationPersistence, IdentityRegistry) {
    let backend = SledBackend::open(dir.path().join("conversations.db"))
        .expect("Failed to open sled backend");
    let jar = CookieJar::open(dir.path().join("cookies.json")).expect("Failed to open cookie jar");
    (
        ConversationPersistence::with_default_key(Arc::new(backend)),
        IdentityRegistry::new(Arc::new(jar)),
    )
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
storage:
  conversations_key: chat-conversations
cookies:
  max_age_days: 30
history:
  url: http://localhost:8080/api/history
  method: POST
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, HistoryMethod};
    use crate::error::ChatkeepError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_memory_store_starts_with_one_conversation() {
        let store = memory_store();
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.registry().list().len(), 1);
    }

    #[test]
    fn test_disk_parts_share_directory() {
        let dir = temp_dir();
        let (persistence, registry) = disk_parts(&dir);
        let store = ConversationStore::init(persistence, registry);
        store.dispose().unwrap();
        assert!(dir.path().join("cookies.json").exists());
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: crate::error::Result<()> =
            Err(ChatkeepError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: crate::error::Result<()> =
            Err(ChatkeepError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.method, HistoryMethod::Post);
        assert_eq!(config.cookies.max_age_days, 30);
    }
}
