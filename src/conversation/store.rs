//! In-memory conversation store
//!
//! The store exclusively owns the canonical conversation list. Every
//! mutation rewrites the whole list through [`ConversationPersistence`] and
//! rebuilds the [`IdentityRegistry`] from scratch, so after any mutation the
//! registry order equals the in-memory order.
//!
//! Mutators never fail. Persistence and registry write errors are logged and
//! the in-memory state stays authoritative.

use super::{Attachment, AttachmentTable, Conversation, Message};
use crate::error::Result;
use crate::identity::IdentityRegistry;
use crate::storage::ConversationPersistence;
use std::collections::HashSet;

/// Canonical list of conversations for this device
///
/// The list is ordered newest-first. Constructed once per session with
/// [`ConversationStore::init`] and torn down with
/// [`ConversationStore::dispose`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chatkeep::conversation::{ConversationStore, Message};
/// use chatkeep::identity::{CookieJar, IdentityRegistry};
/// use chatkeep::storage::{ConversationPersistence, MemoryBackend};
///
/// let persistence = ConversationPersistence::with_default_key(Arc::new(MemoryBackend::new()));
/// let registry = IdentityRegistry::new(Arc::new(CookieJar::in_memory()));
/// let mut store = ConversationStore::init(persistence, registry);
///
/// let id = store.create();
/// store.update(&id, vec![Message::user("Hello there")]);
/// assert_eq!(store.current().unwrap().title, "Hello there");
/// ```
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    selected: Option<String>,
    attachments: AttachmentTable,
    persistence: ConversationPersistence,
    registry: IdentityRegistry,
}

impl ConversationStore {
    /// Load the store from persistence
    ///
    /// When nothing is stored a first conversation is created. The first
    /// conversation is selected and the identity registry is rebuilt from the
    /// loaded order.
    pub fn init(persistence: ConversationPersistence, registry: IdentityRegistry) -> Self {
        let conversations = persistence.load();
        tracing::debug!("Loaded {} conversations", conversations.len());

        let mut store = Self {
            conversations,
            selected: None,
            attachments: AttachmentTable::new(),
            persistence,
            registry,
        };

        if store.conversations.is_empty() {
            store.create();
        } else {
            store.selected = store.conversations.first().map(|c| c.id.clone());
            store.sync_registry();
        }

        store
    }

    /// Flush persistence and tear the store down
    ///
    /// # Errors
    ///
    /// Returns the backend error if the final flush fails
    pub fn dispose(self) -> Result<()> {
        self.persistence.flush()?;
        tracing::debug!("Conversation store disposed");
        Ok(())
    }

    /// All conversations, newest first
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up a conversation by id
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// The selected conversation id, if any
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected conversation, if it still exists
    pub fn current(&self) -> Option<&Conversation> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Create an empty conversation at the front of the list and select it
    ///
    /// Returns the new id.
    pub fn create(&mut self) -> String {
        let conv = Conversation::new(self.conversations.len() + 1);
        let id = conv.id.clone();
        tracing::debug!("Creating conversation {} ({})", id, conv.title);

        self.conversations.insert(0, conv);
        self.selected = Some(id.clone());
        self.persist();
        self.sync_registry();
        id
    }

    /// Select `id` if it exists; otherwise leave the selection untouched
    ///
    /// Returns whether the selection changed to `id`.
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            tracing::debug!("Ignoring selection of unknown conversation {}", id);
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    /// Remove a conversation
    ///
    /// If it was selected, the selection moves to the new first element or is
    /// cleared when the list is now empty. Returns whether a conversation was
    /// removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        let removed = self.conversations.len() != before;

        if self.selected.as_deref() == Some(id) {
            self.selected = self.conversations.first().map(|c| c.id.clone());
        }

        if removed {
            tracing::debug!("Deleted conversation {}", id);
            self.prune_attachments();
        } else {
            tracing::debug!("Delete of unknown conversation {}", id);
        }

        self.persist();
        if let Err(e) = self.registry.remove(id) {
            tracing::error!("Failed to remove {} from identity registry: {}", id, e);
        }
        self.sync_registry();
        removed
    }

    /// Replace the message list of `id` wholesale
    ///
    /// Bumps `updated_at` and derives the title while it is still the
    /// placeholder. Unknown ids are ignored; returns whether `id` matched.
    pub fn update(&mut self, id: &str, messages: Vec<Message>) -> bool {
        let conv = match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(conv) => conv,
            None => {
                tracing::warn!("Update of unknown conversation {} ignored", id);
                return false;
            }
        };

        conv.replace_messages(messages);
        tracing::debug!(
            "Updated conversation {} ({} messages)",
            id,
            conv.messages.len()
        );

        self.prune_attachments();
        self.persist();
        self.sync_registry();
        true
    }

    /// Set an explicit title; it is not re-derived afterwards
    ///
    /// Returns whether `id` matched.
    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> bool {
        let conv = match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(conv) => conv,
            None => return false,
        };

        conv.title = title.into();
        self.persist();
        self.sync_registry();
        true
    }

    /// Overwrite the whole collection
    ///
    /// Used by remote reconciliation. The selection survives if its id is in
    /// the new collection, otherwise the first element is selected.
    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        tracing::info!(
            "Replacing {} local conversations with {}",
            self.conversations.len(),
            conversations.len()
        );
        self.conversations = conversations;

        let keep_selection = self
            .selected
            .as_deref()
            .map(|id| self.get(id).is_some())
            .unwrap_or(false);
        if !keep_selection {
            self.selected = self.conversations.first().map(|c| c.id.clone());
        }

        self.prune_attachments();
        self.persist();
        self.sync_registry();
    }

    /// Record attachments sent with a message for this session only
    pub fn attach(&mut self, message_id: &str, attachments: Vec<Attachment>) {
        self.attachments.insert(message_id, attachments);
    }

    /// Attachments recorded for a message in this session
    pub fn attachments_for(&self, message_id: &str) -> &[Attachment] {
        self.attachments.get(message_id)
    }

    /// The identity registry this store maintains
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.conversations) {
            tracing::error!("Failed to persist conversations: {}", e);
        }
    }

    fn sync_registry(&self) {
        let ids: Vec<String> = self.conversations.iter().map(|c| c.id.clone()).collect();
        if let Err(e) = self.registry.replace_all(&ids) {
            tracing::error!("Failed to update identity registry: {}", e);
        }
    }

    fn prune_attachments(&mut self) {
        if self.attachments.is_empty() {
            return;
        }
        let live: HashSet<&str> = self
            .conversations
            .iter()
            .flat_map(|c| c.messages.iter().map(|m| m.id.as_str()))
            .collect();
        self.attachments.retain_messages(&live);
    }
}
