//! Startup reconciliation against a remote history endpoint
//!
//! When an endpoint is configured, [`SyncManager::run`] issues one request
//! and, if the server returns a non-empty collection, replaces the local
//! store with it. This is a whole-collection, last-writer-wins overwrite:
//! conversations that exist only locally are dropped.
//!
//! Failures never touch local state. A non-success status, a transport
//! error, an empty collection or an unparseable body all leave the store
//! exactly as it was.
//!
//! There is no lock between an in-flight fetch and local mutations. A
//! mutation made between [`SyncManager::fetch`] and [`SyncManager::apply`]
//! is discarded by the overwrite.

use crate::config::HistoryConfig;
use crate::conversation::{Conversation, ConversationStore};
use crate::error::Result;
use crate::identity::AnonymousSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod client;
pub use client::{parse_history, HistoryClient, HistoryRequest, SESSION_HEADER};

/// Result of a sync attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No remote endpoint configured; nothing was done
    NotConfigured,
    /// This manager already ran once this session
    AlreadyRan,
    /// Transport error or non-success status
    Failed(String),
    /// The server returned an empty collection
    Empty,
    /// The response body was not a usable collection
    Malformed(String),
    /// Local conversations were replaced by the remote collection
    Replaced {
        /// Number of conversations now in the store
        count: usize,
    },
}

impl SyncOutcome {
    /// Whether local state was overwritten
    pub fn replaced(&self) -> bool {
        matches!(self, SyncOutcome::Replaced { .. })
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::NotConfigured => write!(f, "no history endpoint configured"),
            SyncOutcome::AlreadyRan => write!(f, "already synced this session"),
            SyncOutcome::Failed(reason) => write!(f, "sync failed: {}", reason),
            SyncOutcome::Empty => write!(f, "remote history is empty"),
            SyncOutcome::Malformed(reason) => write!(f, "remote history is malformed: {}", reason),
            SyncOutcome::Replaced { count } => {
                write!(f, "replaced local history with {} conversations", count)
            }
        }
    }
}

/// Shared "request in flight" indicator
///
/// Clones observe the same flag, so a UI can hold one while the manager
/// runs.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    /// Whether a sync request is in flight
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> BusyGuard {
        self.0.store(true, Ordering::SeqCst);
        BusyGuard(self.clone())
    }
}

struct BusyGuard(BusyFlag);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::SeqCst);
    }
}

/// One-shot reconciler for the current session
pub struct SyncManager {
    client: Option<HistoryClient>,
    session: Option<AnonymousSession>,
    busy: BusyFlag,
    started: AtomicBool,
}

impl SyncManager {
    /// Creates a manager for the configured endpoint
    ///
    /// An absent endpoint is not an error; the manager then does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: &HistoryConfig) -> Result<Self> {
        Ok(Self {
            client: HistoryClient::from_config(config)?,
            session: None,
            busy: BusyFlag::default(),
            started: AtomicBool::new(false),
        })
    }

    /// Send the anonymous session id with the request
    pub fn with_session(mut self, session: AnonymousSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Whether a remote endpoint is configured
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Whether a request is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// A handle observing the busy flag
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// Fetch the remote collection without touching the store
    ///
    /// Only the first call per manager issues a request. `known_ids` are sent
    /// in the body of POST requests.
    ///
    /// Returns the terminal outcome as `Err` when there is nothing to apply.
    pub async fn fetch(
        &self,
        known_ids: &[String],
    ) -> std::result::Result<Vec<Conversation>, SyncOutcome> {
        let client = match &self.client {
            Some(client) => client,
            None => {
                tracing::debug!("No history endpoint configured, skipping sync");
                return Err(SyncOutcome::NotConfigured);
            }
        };

        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Sync already ran this session");
            return Err(SyncOutcome::AlreadyRan);
        }

        let session_id = self.session.as_ref().and_then(|session| match session.id() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Anonymous session unavailable: {}", e);
                None
            }
        });

        let request = HistoryRequest {
            session_id,
            conversation_ids: known_ids.to_vec(),
        };

        let body = {
            let _busy = self.busy.enter();
            client.fetch(&request).await
        };

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("History sync abandoned: {}", e);
                return Err(SyncOutcome::Failed(e.to_string()));
            }
        };

        parse_history(&body).map_err(|reason| {
            tracing::warn!("History response is malformed: {}", reason);
            SyncOutcome::Malformed(reason)
        })
    }

    /// Overwrite the store with a fetched collection
    ///
    /// An empty collection is never applied.
    pub fn apply(
        &self,
        store: &mut ConversationStore,
        conversations: Vec<Conversation>,
    ) -> SyncOutcome {
        if conversations.is_empty() {
            tracing::info!("Remote history is empty, keeping local conversations");
            return SyncOutcome::Empty;
        }

        let count = conversations.len();
        store.replace_all(conversations);
        tracing::info!("Synced {} conversations from remote history", count);
        SyncOutcome::Replaced { count }
    }

    /// Fetch and apply in one step
    pub async fn run(&self, store: &mut ConversationStore) -> SyncOutcome {
        let known_ids = store.registry().list();
        match self.fetch(&known_ids).await {
            Ok(conversations) => self.apply(store, conversations),
            Err(outcome) => outcome,
        }
    }

    /// Check that the configured endpoint answers
    ///
    /// # Errors
    ///
    /// Returns an error when no endpoint is configured or it is unreachable
    pub async fn probe(&self) -> Result<reqwest::StatusCode> {
        match &self.client {
            Some(client) => client.probe().await,
            None => Err(crate::error::ChatkeepError::Config(
                "No history endpoint configured".to_string(),
            )
            .into()),
        }
    }
}
