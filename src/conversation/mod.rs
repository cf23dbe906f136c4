//! Conversation model and the in-memory conversation store
//!
//! A [`Conversation`] is a titled, ordered sequence of [`Message`]s with
//! creation and update timestamps. The durable entity carries no file
//! attachments; those live in the session-only [`AttachmentTable`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod attachments;
pub mod store;

pub use attachments::{Attachment, AttachmentTable};
pub use store::ConversationStore;

/// Prefix of the auto-generated conversation title
pub const PLACEHOLDER_TITLE_PREFIX: &str = "New conversation";

/// Maximum number of characters kept when deriving a title
pub const TITLE_MAX_CHARS: usize = 50;

const TITLE_ELLIPSIS: &str = "...";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message written by the local user
    User,
    /// Message produced by the remote assistant
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!(
                "Invalid role: {}. Must be one of: user, assistant",
                other
            )),
        }
    }
}

/// A single chat message
///
/// The role is fixed at creation. File attachments are not part of the
/// message; see [`AttachmentTable`].
///
/// # Examples
///
/// ```
/// use chatkeep::conversation::{Message, Role};
///
/// let msg = Message::user("Hello");
/// assert_eq!(msg.role, Role::User);
/// assert_eq!(msg.content, "Hello");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Client-generated unique identifier
    pub id: String,
    /// Text body
    pub content: String,
    /// Author of the message
    pub role: Role,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message with a fresh id and the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    /// Creates a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A titled, ordered sequence of messages
///
/// `created_at` never changes after construction and `updated_at` is kept
/// greater than or equal to it by every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// Client-generated unique identifier
    pub id: String,
    /// Human-readable label
    pub title: String,
    /// Messages in conversation order
    pub messages: Vec<Message>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the last message-list mutation
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates an empty conversation carrying the placeholder title for `ordinal`
    ///
    /// # Examples
    ///
    /// ```
    /// use chatkeep::conversation::Conversation;
    ///
    /// let conv = Conversation::new(3);
    /// assert_eq!(conv.title, "New conversation 3");
    /// assert!(conv.messages.is_empty());
    /// assert_eq!(conv.created_at, conv.updated_at);
    /// ```
    pub fn new(ordinal: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: placeholder_title(ordinal),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the title is still the auto-generated placeholder
    pub fn has_placeholder_title(&self) -> bool {
        is_placeholder_title(&self.title)
    }

    /// Replaces the message list wholesale
    ///
    /// Bumps `updated_at` and derives the title from the first message while
    /// the title is still a placeholder.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        if self.has_placeholder_title() {
            if let Some(title) = messages.first().and_then(|m| derive_title(&m.content)) {
                self.title = title;
            }
        }
        self.messages = messages;
        self.touch();
    }

    /// Sets `updated_at` to now, never earlier than `created_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }
}

/// Builds the placeholder title for the given ordinal
pub fn placeholder_title(ordinal: usize) -> String {
    format!("{} {}", PLACEHOLDER_TITLE_PREFIX, ordinal)
}

/// Returns true when `title` is `"New conversation <n>"` for a decimal `n`
///
/// # Examples
///
/// ```
/// use chatkeep::conversation::is_placeholder_title;
///
/// assert!(is_placeholder_title("New conversation 12"));
/// assert!(!is_placeholder_title("New conversation about rust"));
/// assert!(!is_placeholder_title("Hello world"));
/// ```
pub fn is_placeholder_title(title: &str) -> bool {
    title
        .strip_prefix(PLACEHOLDER_TITLE_PREFIX)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(|ordinal| !ordinal.is_empty() && ordinal.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Derives a title from message content
///
/// Keeps the first 50 characters and appends `...` when the content was
/// longer. Blank content yields `None`.
///
/// # Examples
///
/// ```
/// use chatkeep::conversation::derive_title;
///
/// assert_eq!(derive_title("Short"), Some("Short".to_string()));
/// assert_eq!(derive_title("   "), None);
/// let long = "x".repeat(60);
/// assert_eq!(derive_title(&long), Some(format!("{}...", "x".repeat(50))));
/// ```
pub fn derive_title(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        return None;
    }

    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{}{}", head, TITLE_ELLIPSIS))
    } else {
        Some(head)
    }
}
