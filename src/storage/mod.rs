//! Durable key-value persistence for the conversation list
//!
//! The whole list is stored as one JSON array under a single fixed key.
//! [`ConversationPersistence`] owns that encoding; the medium underneath is
//! any [`KeyValueBackend`].

use crate::conversation::Conversation;
use crate::error::{ChatkeepError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub mod types;
pub use types::{StoredConversation, StoredMessage};

/// Default key holding the encoded conversation list
pub const DEFAULT_CONVERSATIONS_KEY: &str = "chat-conversations";

/// A durable string-keyed byte store
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite the value stored under `key` in a single write
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete `key`; deleting an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Make all prior writes durable
    fn flush(&self) -> Result<()>;
}

/// Key-value backend on an embedded `sled` database
pub struct SledBackend {
    db: sled::Db,
    path: PathBuf,
}

impl SledBackend {
    /// Open or create the database at `path`
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use chatkeep::storage::SledBackend;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let backend = SledBackend::open(dir.path().join("store.db")).unwrap();
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChatkeepError::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }

        let db = sled::open(&path)
            .map_err(|e| ChatkeepError::Storage(format!("Failed to open database: {}", e)))?;

        tracing::debug!("Opened key-value store at {}", path.display());
        Ok(Self { db, path })
    }

    /// Location of the database directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueBackend for SledBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| ChatkeepError::Storage(format!("Get failed: {}", e)))?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value)
            .map_err(|e| ChatkeepError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| ChatkeepError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| ChatkeepError::Storage(format!("Remove failed: {}", e)))?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| ChatkeepError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// Volatile key-value backend for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| ChatkeepError::Storage("Memory backend lock poisoned".to_string()).into())
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Reads and writes the full conversation list under one key
///
/// Message attachments have no serialized form, so nothing written here
/// ever carries them.
#[derive(Clone)]
pub struct ConversationPersistence {
    backend: Arc<dyn KeyValueBackend>,
    key: String,
}

impl ConversationPersistence {
    /// Creates a persistence layer writing under `key`
    pub fn new(backend: Arc<dyn KeyValueBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Creates a persistence layer writing under [`DEFAULT_CONVERSATIONS_KEY`]
    pub fn with_default_key(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::new(backend, DEFAULT_CONVERSATIONS_KEY)
    }

    /// The key the list is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encode a conversation list into its stored byte form
    pub fn encode(conversations: &[Conversation]) -> Result<Vec<u8>> {
        let stored: Vec<StoredConversation> =
            conversations.iter().map(StoredConversation::from).collect();
        serde_json::to_vec(&stored)
            .map_err(|e| ChatkeepError::Storage(format!("Serialization failed: {}", e)).into())
    }

    /// Overwrite the stored list with `conversations`
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Storage` if encoding or the backend write fails
    pub fn save(&self, conversations: &[Conversation]) -> Result<()> {
        let bytes = Self::encode(conversations)?;
        self.backend.set(&self.key, &bytes)?;
        tracing::debug!(
            "Persisted {} conversations under '{}'",
            conversations.len(),
            self.key
        );
        Ok(())
    }

    /// Read the stored list
    ///
    /// Never fails: an absent key, a backend error or unparseable content
    /// all yield an empty list.
    pub fn load(&self) -> Vec<Conversation> {
        match self.backend.get(&self.key) {
            Ok(Some(bytes)) => types::decode_lenient(&bytes),
            Ok(None) => {
                tracing::debug!("No stored conversations under '{}'", self.key);
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Failed to read stored conversations: {}", e);
                Vec::new()
            }
        }
    }

    /// Raw stored bytes, if any
    pub fn raw(&self) -> Result<Option<Vec<u8>>> {
        self.backend.get(&self.key)
    }

    /// Flush the backend
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()
    }
}
