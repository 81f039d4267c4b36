//! Token sessions and where they are kept between runs.
//!
//! A [`Session`] is the bearer token, its expiry, and the object-store URL
//! picked out of the identity catalog. It is replaced wholesale on refresh and
//! handed to a [`SessionStore`] before the client starts using it.

mod config_file;
mod memory;

pub use config_file::ConfigFileSessionStore;
pub use memory::MemorySessionStore;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// An authenticated session against the storage endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    expires: String,
    storage_url: String,
}

impl Session {
    pub fn new(
        token: impl Into<String>,
        expires: impl Into<String>,
        storage_url: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            expires: expires.into(),
            storage_url: storage_url.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Expiry in the exact form the identity service sent it.
    pub fn expires(&self) -> &str {
        &self.expires
    }

    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    /// Parsed expiry, or `None` if the stored string is not RFC3339.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.expires)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Usable only while `now` is strictly before the expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_empty() || self.storage_url.is_empty() {
            return false;
        }
        self.expires_at().is_some_and(|expires| now < expires)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("expires", &self.expires)
            .field("storage_url", &self.storage_url)
            .finish()
    }
}

/// Persistence hook for sessions.
///
/// The client loads once at construction and saves after every successful
/// authentication. A failed save aborts the refresh: the new session is not
/// installed and the error is returned to the caller.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, StorageError>;

    async fn save(&self, session: &Session) -> Result<(), StorageError>;
}
