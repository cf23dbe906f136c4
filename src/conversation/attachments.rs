//! Session-only attachment side table
//!
//! Attachments are in-memory file handles keyed by message id. They are
//! never serialized and disappear when the store is disposed.

use std::collections::{HashMap, HashSet};

/// An in-memory file attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name as chosen by the user
    pub name: String,
    /// MIME type, when known
    pub content_type: Option<String>,
    /// Raw file contents
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from a name and its bytes
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data,
        }
    }

    /// Sets the MIME type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Map of message id to the attachments sent with it
#[derive(Debug, Default)]
pub struct AttachmentTable {
    entries: HashMap<String, Vec<Attachment>>,
}

impl AttachmentTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends attachments for a message
    pub fn insert(&mut self, message_id: &str, attachments: Vec<Attachment>) {
        if attachments.is_empty() {
            return;
        }
        self.entries
            .entry(message_id.to_string())
            .or_default()
            .extend(attachments);
    }

    /// Attachments for a message, empty when none were recorded
    pub fn get(&self, message_id: &str) -> &[Attachment] {
        self.entries
            .get(message_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops every entry whose message id is not in `live`
    pub fn retain_messages(&mut self, live: &HashSet<&str>) {
        self.entries.retain(|id, _| live.contains(id.as_str()));
    }

    /// Number of messages with attachments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
