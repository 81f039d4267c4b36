//! Swift storage client.
//!
//! [`StorageClient`] owns the credentials, the current [`Session`] and the
//! HTTP client. Every operation makes sure a valid session exists (asking the
//! identity service for a new token only when the cached one is missing or
//! expired) and then sends exactly one request to the storage endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::StorageError;
use crate::identity::{self, default_identity_url};
use crate::operation::{encode_path, Operation};
use crate::session::{ConfigFileSessionStore, MemorySessionStore, Session, SessionStore};

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Status, headers and body of an accepted storage response.
#[derive(Debug, Clone)]
pub struct SwiftResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Builds a [`StorageClient`].
///
/// Defaults: in-memory session store, system clock, identity URL derived from
/// the region, transport default timeout.
pub struct StorageClientBuilder {
    credentials: Credentials,
    http: Option<Client>,
    identity_url: Option<String>,
    timeout: Option<Duration>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl StorageClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            http: None,
            identity_url: None,
            timeout: None,
            store: Arc::new(MemorySessionStore::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a caller-configured HTTP client. Any timeout set on the builder is
    /// ignored in favour of the client's own settings.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn with_identity_url(mut self, url: impl Into<String>) -> Self {
        self.identity_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the client, loading any previously stored session.
    pub async fn build(self) -> Result<StorageClient, StorageError> {
        let http = match self.http {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        let identity_url = self
            .identity_url
            .unwrap_or_else(|| default_identity_url(self.credentials.region()));
        let session = self.store.load().await?;

        Ok(StorageClient {
            http,
            credentials: self.credentials,
            identity_url,
            session: Mutex::new(session),
            store: self.store,
            clock: self.clock,
        })
    }
}

/// Client for a Swift account reached through the ConoHa identity service.
///
/// The session is guarded by a mutex held across check, refresh and store,
/// so concurrent callers never authenticate twice for the same expiry.
pub struct StorageClient {
    http: Client,
    credentials: Credentials,
    identity_url: String,
    session: Mutex<Option<Session>>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl StorageClient {
    pub fn builder(credentials: Credentials) -> StorageClientBuilder {
        StorageClientBuilder::new(credentials)
    }

    /// Client whose session lives only in memory.
    pub async fn in_memory(credentials: Credentials) -> Result<Self, StorageError> {
        Self::builder(credentials).build().await
    }

    /// Client backed by a TOML config file; refreshed tokens are written back to it.
    pub async fn from_config_file(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let (store, config) = ConfigFileSessionStore::open(path)?;
        Self::from_config(config, Arc::new(store)).await
    }

    /// Client built from an already-loaded config and an explicit store.
    pub async fn from_config(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, StorageError> {
        let mut builder = Self::builder(config.credentials()).with_session_store(store);
        if let Some(url) = config.identity_url {
            builder = builder.with_identity_url(url);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.with_timeout(timeout);
        }
        builder.build().await
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn identity_url(&self) -> &str {
        &self.identity_url
    }

    /// Return the cached session if still valid, otherwise authenticate.
    ///
    /// A fresh session is saved to the store before it replaces the old one.
    /// On any failure the previous session is left as it was.
    pub async fn ensure_session(&self) -> Result<Session, StorageError> {
        let mut current = self.session.lock().await;
        let now = self.clock.now();

        if let Some(session) = current.as_ref().filter(|s| s.is_valid_at(now)) {
            return Ok(session.clone());
        }

        match current.as_ref() {
            Some(stale) => info!(expired = stale.expires(), "Session expired; re-authenticating"),
            None => debug!("No cached session; authenticating"),
        }

        let session =
            identity::request_token(&self.http, &self.identity_url, &self.credentials).await?;
        self.store.save(&session).await?;
        *current = Some(session.clone());
        Ok(session)
    }

    /// Forget the in-memory session so the next call authenticates again.
    pub async fn invalidate_session(&self) {
        self.session.lock().await.take();
    }

    /// Send one authenticated request to `<storage url>/<path>`.
    ///
    /// `path` is unencoded; each segment is percent-encoded here, and a path
    /// with a `.` or `..` segment is rejected before any request is made. The
    /// response is returned only if its status is in `acceptable`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        acceptable: &[StatusCode],
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<SwiftResponse, StorageError> {
        let encoded = encode_path(path)?;
        let session = self.ensure_session().await?;
        let url = format!("{}/{}", session.storage_url(), encoded);

        let token = HeaderValue::from_str(session.token())
            .map_err(|_| StorageError::InvalidRequest("token is not a valid header value".into()))?;

        debug!(method = %method, url = %url, "Sending storage request");
        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(headers)
            .header(HeaderName::from_static(AUTH_TOKEN_HEADER), token);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        if !acceptable.contains(&status) {
            warn!(method = %method, url = %url, status = %status, "Unexpected storage response status");
            return Err(StorageError::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        debug!(method = %method, url = %url, status = %status, bytes = body.len(), "Storage request succeeded");
        Ok(SwiftResponse {
            status,
            headers,
            body,
        })
    }

    /// Run a predefined operation.
    pub async fn execute(
        &self,
        operation: &Operation<'_>,
        body: Option<Vec<u8>>,
    ) -> Result<SwiftResponse, StorageError> {
        debug!(operation = operation.name(), "Executing operation");
        self.send(
            operation.method()?,
            &operation.path()?,
            operation.acceptable(),
            operation.headers()?,
            body,
        )
        .await
    }

    // ===== Account =====

    pub async fn show_account(&self) -> Result<HeaderMap, StorageError> {
        Ok(self.execute(&Operation::ShowAccount, None).await?.headers)
    }

    pub async fn set_account_quota(&self, gigabytes: u64) -> Result<HeaderMap, StorageError> {
        let op = Operation::SetAccountQuota { gigabytes };
        Ok(self.execute(&op, None).await?.headers)
    }

    // ===== Containers =====

    pub async fn show_container(&self, container: &str) -> Result<HeaderMap, StorageError> {
        let op = Operation::ShowContainer { container };
        Ok(self.execute(&op, None).await?.headers)
    }

    pub async fn create_container(&self, container: &str) -> Result<HeaderMap, StorageError> {
        let op = Operation::CreateContainer { container };
        Ok(self.execute(&op, None).await?.headers)
    }

    pub async fn delete_container(&self, container: &str) -> Result<HeaderMap, StorageError> {
        let op = Operation::DeleteContainer { container };
        Ok(self.execute(&op, None).await?.headers)
    }

    // ===== Objects =====

    /// Fetch an object and return only its headers.
    pub async fn get_object(&self, container: &str, object: &str) -> Result<HeaderMap, StorageError> {
        let op = Operation::GetObject { container, object };
        Ok(self.execute(&op, None).await?.headers)
    }

    /// Upload the local file whose path is the object name.
    pub async fn upload_object(
        &self,
        container: &str,
        object: &str,
    ) -> Result<HeaderMap, StorageError> {
        self.upload_object_from(container, object, Path::new(object))
            .await
    }

    /// Upload the local file at `source` as `container/object`.
    pub async fn upload_object_from(
        &self,
        container: &str,
        object: &str,
        source: &Path,
    ) -> Result<HeaderMap, StorageError> {
        let body = tokio::fs::read(source)
            .await
            .map_err(|e| StorageError::local_io(source, e))?;
        self.upload_object_bytes(container, object, body).await
    }

    pub async fn upload_object_bytes(
        &self,
        container: &str,
        object: &str,
        body: Vec<u8>,
    ) -> Result<HeaderMap, StorageError> {
        let op = Operation::UploadObject { container, object };
        Ok(self.execute(&op, Some(body)).await?.headers)
    }

    pub async fn download_object(
        &self,
        container: &str,
        object: &str,
    ) -> Result<Vec<u8>, StorageError> {
        let op = Operation::DownloadObject { container, object };
        Ok(self.execute(&op, None).await?.body)
    }

    /// Download an object into a local file, returning the number of bytes written.
    pub async fn download_object_to(
        &self,
        container: &str,
        object: &str,
        dest: &Path,
    ) -> Result<usize, StorageError> {
        let body = self.download_object(container, object).await?;
        tokio::fs::write(dest, &body)
            .await
            .map_err(|e| StorageError::local_io(dest, e))?;
        Ok(body.len())
    }

    pub async fn delete_object(
        &self,
        container: &str,
        object: &str,
    ) -> Result<HeaderMap, StorageError> {
        let op = Operation::DeleteObject { container, object };
        Ok(self.execute(&op, None).await?.headers)
    }

    /// Server-side copy of `from_container/from_object` to `to_container/to_object`.
    pub async fn copy_object(
        &self,
        from_container: &str,
        from_object: &str,
        to_container: &str,
        to_object: &str,
    ) -> Result<HeaderMap, StorageError> {
        let op = Operation::CopyObject {
            from_container,
            from_object,
            to_container,
            to_object,
        };
        Ok(self.execute(&op, None).await?.headers)
    }
}
