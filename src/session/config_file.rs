//! Session store that writes the token back into the TOML config file.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{write_private, ClientConfig};
use crate::error::StorageError;

use super::{Session, SessionStore};

/// Persists sessions into the config file the credentials came from.
///
/// The whole file is rewritten on save, keeping credentials and optional keys
/// as they were when the file was loaded.
pub struct ConfigFileSessionStore {
    path: PathBuf,
    config: Mutex<ClientConfig>,
}

impl ConfigFileSessionStore {
    pub fn new(path: impl Into<PathBuf>, config: ClientConfig) -> Self {
        Self {
            path: path.into(),
            config: Mutex::new(config),
        }
    }

    /// Read the config file and build a store over it.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, ClientConfig), StorageError> {
        let path = path.into();
        let config = ClientConfig::load(&path)?;
        Ok((Self::new(path, config.clone()), config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SessionStore for ConfigFileSessionStore {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(self.config.lock().await.session())
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let mut config = self.config.lock().await;
        let updated = config.clone().with_session(session);
        let content = updated.render(&self.path)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_private(&path, &content))
            .await
            .map_err(|e| StorageError::local_io(&self.path, std::io::Error::other(e)))??;

        debug!(path = %self.path.display(), expires = %session.expires(), "Saved session to config");
        *config = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASE: &str = r#"
user_name = "gncu12345678"
password = "hunter2"
tenant_id = "0123456789abcdef"
region = "tyo1"
timeout = "45s"
"#;

    #[tokio::test]
    async fn test_save_then_reopen_round_trips_session() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("conoha.toml");
        std::fs::write(&path, BASE)?;

        let (store, config) = ConfigFileSessionStore::open(&path)?;
        assert!(config.session().is_none());
        assert_eq!(store.load().await?, None);

        let session = Session::new(
            "gAAAAABk-token",
            "2024-05-02T12:00:00.000000Z",
            "https://object-storage.tyo1.conoha.io/v1/nc_0123456789abcdef",
        );
        store.save(&session).await?;
        assert_eq!(store.load().await?, Some(session.clone()));

        let (reopened, reloaded) = ConfigFileSessionStore::open(&path)?;
        let restored = reopened.load().await?.expect("session persisted");
        assert_eq!(restored.token(), session.token());
        assert_eq!(restored.expires(), session.expires());
        assert_eq!(restored.storage_url(), session.storage_url());

        assert_eq!(reloaded.password, "hunter2");
        assert_eq!(reloaded.timeout, Some(std::time::Duration::from_secs(45)));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails_with_local_io() {
        let config: ClientConfig = toml::from_str(BASE).unwrap();
        let store = ConfigFileSessionStore::new("/nonexistent/dir/conoha.toml", config);
        let err = store
            .save(&Session::new("t", "2024-05-02T12:00:00Z", "https://x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::LocalIo { .. }));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_save_removes_temp_file_and_keeps_session() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("conoha.toml");
        std::fs::create_dir(&path)?;

        let config: ClientConfig = toml::from_str(BASE)?;
        let store = ConfigFileSessionStore::new(&path, config);
        let err = store
            .save(&Session::new("t", "2024-05-02T12:00:00Z", "https://x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::LocalIo { .. }));
        assert_eq!(store.load().await?, None);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path() != path)
            .collect();
        assert!(leftovers.is_empty(), "temp file left behind: {leftovers:?}");
        Ok(())
    }
}
