//! TOML configuration holding credentials and the cached session.
//!
//! ```toml
//! user_name = "gncu12345678"
//! password = "..."
//! tenant_id = "0123456789abcdef"
//! region = "tyo1"
//! token = ""
//! swift_url = ""
//! expires = ""
//! # optional
//! identity_url = "https://identity.tyo1.conoha.io/v2.0/tokens"
//! timeout = "30s"
//! ```
//!
//! The session keys are rewritten after every successful authentication.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::StorageError;
use crate::session::Session;

const APP_NAME: &str = "conoha-swift";
const LOCAL_CONFIG_FILE: &str = "conoha-swift.toml";
const CONFIG_FILE: &str = "config.toml";

/// Contents of the configuration file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub user_name: String,
    pub password: String,
    pub tenant_id: String,
    pub region: String,

    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub swift_url: String,
    /// RFC3339 expiry exactly as the identity service returned it.
    #[serde(default)]
    pub expires: String,

    /// Overrides `https://identity.<region>.conoha.io/v2.0/tokens`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_url: Option<String>,

    /// Request timeout for both identity and storage calls.
    #[serde(
        default,
        with = "crate::duration::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StorageError::local_io(path, e))?;
        Self::parse(path, &content)
    }

    pub(crate) fn parse(path: &Path, content: &str) -> Result<Self, StorageError> {
        toml::from_str(content).map_err(|e| StorageError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub(crate) fn render(&self, path: &Path) -> Result<String, StorageError> {
        toml::to_string(self).map_err(|e| StorageError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the config, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let content = self.render(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::local_io(parent, e))?;
        }
        write_private(path, &content)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.user_name.clone(),
            self.password.clone(),
            self.tenant_id.clone(),
            self.region.clone(),
        )
    }

    /// The cached session, if the file holds one.
    ///
    /// Validity is not checked here; the client compares the expiry against its clock.
    pub fn session(&self) -> Option<Session> {
        if self.token.is_empty() || self.swift_url.is_empty() {
            return None;
        }
        Some(Session::new(
            self.token.clone(),
            self.expires.clone(),
            self.swift_url.clone(),
        ))
    }

    pub fn set_session(&mut self, session: &Session) {
        self.token = session.token().to_string();
        self.expires = session.expires().to_string();
        self.swift_url = session.storage_url().to_string();
    }

    pub fn with_session(mut self, session: &Session) -> Self {
        self.set_session(session);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("region", &self.region)
            .field("token", &if self.token.is_empty() { "" } else { "[REDACTED]" })
            .field("swift_url", &self.swift_url)
            .field("expires", &self.expires)
            .field("identity_url", &self.identity_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./conoha-swift.toml` if it exists in current directory
/// 2. `~/.config/conoha-swift/config.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join(APP_NAME).join(CONFIG_FILE);
    }

    local_config
}

/// Replace `path` with `content` via a temp file in the same directory.
///
/// The file holds a password and a bearer token: the temp file is created
/// owner-only (0600 on unix) and is deleted if writing or renaming fails.
pub(crate) fn write_private(path: &Path, content: &str) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".conoha-swift-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StorageError::local_io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| StorageError::local_io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StorageError::local_io(path, e.error))?;
    Ok(())
}
