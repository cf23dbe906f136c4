//! Durable identity side-channels
//!
//! Two cookies live in the [`CookieJar`], independent of the main
//! conversation blob:
//!
//! - [`IdentityRegistry`]: the ordered list of known conversation ids
//! - [`AnonymousSession`]: one freestanding session id for this device
//!
//! Neither is read back into the conversation store during normal loads.

use crate::error::Result;
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

pub mod cookies;
pub use cookies::{Cookie, CookieJar, DEFAULT_MAX_AGE_DAYS};

/// Cookie holding the JSON array of conversation ids
pub const CONVERSATION_IDS_COOKIE: &str = "conversation_ids";

/// Cookie holding the anonymous session id
pub const ANONYMOUS_SESSION_COOKIE: &str = "anonymous_session_id";

/// Ordered list of conversation ids kept in its own cookie
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chatkeep::identity::{CookieJar, IdentityRegistry};
///
/// let registry = IdentityRegistry::new(Arc::new(CookieJar::in_memory()));
/// registry.add("b").unwrap();
/// registry.add("a").unwrap();
/// registry.add("b").unwrap();
/// assert_eq!(registry.list(), vec!["a".to_string(), "b".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    jar: Arc<CookieJar>,
    max_age: Duration,
}

impl IdentityRegistry {
    /// Creates a registry with the default one-year lifetime
    pub fn new(jar: Arc<CookieJar>) -> Self {
        Self::with_max_age(jar, Duration::days(DEFAULT_MAX_AGE_DAYS))
    }

    /// Creates a registry whose cookie expires after `max_age`
    pub fn with_max_age(jar: Arc<CookieJar>, max_age: Duration) -> Self {
        Self { jar, max_age }
    }

    /// Stored ids in order; empty when absent or unparseable
    pub fn list(&self) -> Vec<String> {
        let raw = match self.jar.get(CONVERSATION_IDS_COOKIE) {
            Some(raw) => raw,
            None => return Vec::new(),
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Identity registry cookie is unparseable: {}", e);
            Vec::new()
        })
    }

    /// Overwrite the stored list with `ids` in the given order
    pub fn replace_all(&self, ids: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(ids)?;
        self.jar.set(CONVERSATION_IDS_COOKIE, &encoded, self.max_age)
    }

    /// Insert `id` at the front unless already present
    pub fn add(&self, id: &str) -> Result<()> {
        let mut ids = self.list();
        if ids.iter().any(|known| known == id) {
            return Ok(());
        }
        ids.insert(0, id.to_string());
        self.replace_all(&ids)
    }

    /// Delete every occurrence of `id`
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut ids = self.list();
        ids.retain(|known| known != id);
        self.replace_all(&ids)
    }
}

/// Device-wide anonymous session identifier
#[derive(Debug, Clone)]
pub struct AnonymousSession {
    jar: Arc<CookieJar>,
    max_age: Duration,
}

impl AnonymousSession {
    /// Creates a session handle with the default one-year lifetime
    pub fn new(jar: Arc<CookieJar>) -> Self {
        Self::with_max_age(jar, Duration::days(DEFAULT_MAX_AGE_DAYS))
    }

    /// Creates a session handle whose cookie expires after `max_age`
    pub fn with_max_age(jar: Arc<CookieJar>, max_age: Duration) -> Self {
        Self { jar, max_age }
    }

    /// The session id, created on first access and reused afterwards
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Cookie` if a new id cannot be stored
    pub fn id(&self) -> Result<String> {
        if let Some(existing) = self.jar.get(ANONYMOUS_SESSION_COOKIE) {
            if !existing.is_empty() {
                return Ok(existing);
            }
        }

        let id = Uuid::new_v4().to_string();
        self.jar.set(ANONYMOUS_SESSION_COOKIE, &id, self.max_age)?;
        tracing::debug!("Created anonymous session {}", id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> IdentityRegistry {
        IdentityRegistry::new(Arc::new(CookieJar::in_memory()))
    }

    #[test]
    fn test_list_empty_when_absent() {
        assert!(registry().list().is_empty());
    }

    #[test]
    fn test_list_empty_when_unparseable() {
        let jar = Arc::new(CookieJar::in_memory());
        jar.set(CONVERSATION_IDS_COOKIE, "not-json", Duration::days(1))
            .unwrap();
        let registry = IdentityRegistry::new(jar);
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_add_prepends_and_is_idempotent() {
        let registry = registry();
        registry.add("one").unwrap();
        registry.add("two").unwrap();
        registry.add("one").unwrap();
        assert_eq!(registry.list(), vec!["two", "one"]);
    }

    #[test]
    fn test_remove_deletes_all_occurrences() {
        let registry = registry();
        registry
            .replace_all(&["a".to_string(), "b".to_string(), "a".to_string()])
            .unwrap();
        registry.remove("a").unwrap();
        assert_eq!(registry.list(), vec!["b"]);

        registry.remove("missing").unwrap();
        assert_eq!(registry.list(), vec!["b"]);
    }

    #[test]
    fn test_replace_all_keeps_order() {
        let registry = registry();
        let ids = vec!["z".to_string(), "a".to_string(), "m".to_string()];
        registry.replace_all(&ids).unwrap();
        assert_eq!(registry.list(), ids);
    }

    #[test]
    fn test_anonymous_session_is_stable() {
        let jar = Arc::new(CookieJar::in_memory());
        let session = AnonymousSession::new(jar.clone());
        let first = session.id().unwrap();
        let second = AnonymousSession::new(jar).id().unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_anonymous_session_independent_of_registry() {
        let jar = Arc::new(CookieJar::in_memory());
        let session = AnonymousSession::new(jar.clone());
        let registry = IdentityRegistry::new(jar);

        let id = session.id().unwrap();
        registry.add("conv-1").unwrap();
        registry.remove("conv-1").unwrap();

        assert_eq!(session.id().unwrap(), id);
        assert!(!registry.list().contains(&id));
    }
}
