//! Chatkeep - client-resident conversation store library
//!
//! This library keeps a device's chat conversations in a local key-value
//! store, mirrors their ids into a cookie, and can replace the local list
//! once per session with a copy fetched from a remote history endpoint.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: Key-value backends and the conversation blob codec
//! - `identity`: Cookie jar, conversation id registry, anonymous session
//! - `conversation`: Data model and the canonical in-memory store
//! - `sync`: One-shot reconciliation against the history endpoint
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatkeep::{Config, ConversationStore, SyncManager};
//! use chatkeep::identity::{CookieJar, IdentityRegistry};
//! use chatkeep::storage::{ConversationPersistence, SledBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let backend = Arc::new(SledBackend::open("data/conversations.db")?);
//!     let persistence = ConversationPersistence::new(backend, "chat-conversations");
//!     let jar = Arc::new(CookieJar::open("data/cookies.json")?);
//!     let mut store = ConversationStore::init(persistence, IdentityRegistry::new(jar));
//!
//!     let sync = SyncManager::new(&config.history)?;
//!     println!("{}", sync.run(&mut store).await);
//!     store.dispose()
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod identity;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use config::Config;
pub use conversation::{Conversation, ConversationStore, Message, Role};
pub use error::{ChatkeepError, Result};
pub use sync::{SyncManager, SyncOutcome};

#[cfg(test)]
pub mod test_utils;
