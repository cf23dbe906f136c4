//! File-backed cookie jar
//!
//! Holds small named values with an absolute expiry, scoped to the root
//! path. Values are URL-encoded on write and decoded on read. The jar file
//! lives apart from the key-value store so either can be cleared without
//! the other.

use crate::error::{ChatkeepError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Default cookie lifetime in days
pub const DEFAULT_MAX_AGE_DAYS: i64 = 365;

/// Path every cookie is scoped to
pub const ROOT_PATH: &str = "/";

/// A single stored cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// URL-encoded value
    pub value: String,
    /// Scope path
    pub path: String,
    /// Absolute expiry time
    pub expires_at: DateTime<Utc>,
}

impl Cookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Named cookies persisted to a JSON file
#[derive(Debug)]
pub struct CookieJar {
    path: Option<PathBuf>,
    cookies: Mutex<BTreeMap<String, Cookie>>,
}

impl CookieJar {
    /// Open the jar stored at `path`
    ///
    /// A missing file yields an empty jar. An unreadable or corrupt file is
    /// logged and also yields an empty jar; it is replaced on the next write.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatkeep::identity::CookieJar;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let jar = CookieJar::open(dir.path().join("cookies.json")).unwrap();
    /// assert!(jar.get("missing").is_none());
    /// ```
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChatkeepError::Cookie(format!("Failed to create cookie directory: {}", e))
            })?;
        }

        let cookies = if path.exists() {
            Self::read_file(&path)
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            cookies: Mutex::new(cookies),
        })
    }

    /// Creates a jar that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            cookies: Mutex::new(BTreeMap::new()),
        }
    }

    /// Location of the jar file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read_file(path: &Path) -> BTreeMap<String, Cookie> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read cookie jar {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(
                "Cookie jar {} is corrupt, starting empty: {}",
                path.display(),
                e
            );
            BTreeMap::new()
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Cookie>>> {
        self.cookies
            .lock()
            .map_err(|_| ChatkeepError::Cookie("Cookie jar lock poisoned".to_string()).into())
    }

    /// Decoded value of a live cookie
    ///
    /// Absent, expired and undecodable cookies all read as `None`.
    pub fn get(&self, name: &str) -> Option<String> {
        let cookies = match self.lock() {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::error!("{}", e);
                return None;
            }
        };

        let cookie = cookies.get(name)?;
        if cookie.is_expired(Utc::now()) {
            tracing::debug!("Cookie '{}' has expired", name);
            return None;
        }

        match urlencoding::decode(&cookie.value) {
            Ok(value) => Some(value.into_owned()),
            Err(e) => {
                tracing::warn!("Cookie '{}' has an undecodable value: {}", name, e);
                None
            }
        }
    }

    /// Store `value` under `name`, expiring after `max_age`
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Cookie` if the expiry overflows or the jar file
    /// cannot be written
    pub fn set(&self, name: &str, value: &str, max_age: Duration) -> Result<()> {
        let expires_at = Utc::now().checked_add_signed(max_age).ok_or_else(|| {
            ChatkeepError::Cookie(format!(
                "Cookie '{}' max age of {} days is out of range",
                name,
                max_age.num_days()
            ))
        })?;

        let mut cookies = self.lock()?;
        cookies.insert(
            name.to_string(),
            Cookie {
                value: urlencoding::encode(value).into_owned(),
                path: ROOT_PATH.to_string(),
                expires_at,
            },
        );
        self.write(&cookies)
    }

    /// Delete a cookie; deleting an absent cookie is not an error
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut cookies = self.lock()?;
        if cookies.remove(name).is_some() {
            self.write(&cookies)?;
        }
        Ok(())
    }

    fn write(&self, cookies: &BTreeMap<String, Cookie>) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let now = Utc::now();
        let live: BTreeMap<&String, &Cookie> = cookies
            .iter()
            .filter(|(_, cookie)| !cookie.is_expired(now))
            .collect();

        let contents = serde_json::to_vec_pretty(&live)?;
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, contents)
            .and_then(|_| std::fs::rename(&tmp_path, path))
            .map_err(|e| {
                ChatkeepError::Cookie(format!(
                    "Failed to write cookie jar {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(())
    }
}
