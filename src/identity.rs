//! Identity (Keystone v2.0) token requests.
//!
//! A token request posts the tenant credentials and gets back a token, its
//! expiry and the service catalog. The object-store URL for the configured
//! region is read out of the catalog.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::Credentials;
use crate::error::StorageError;
use crate::session::Session;

/// Catalog service type for Swift.
pub const OBJECT_STORE_TYPE: &str = "object-store";

/// Token endpoint for a ConoHa region.
pub fn default_identity_url(region: &str) -> String {
    format!("https://identity.{region}.conoha.io/v2.0/tokens")
}

#[derive(Debug, Serialize)]
struct TokensRequest<'a> {
    auth: AuthRequest<'a>,
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "passwordCredentials")]
    password_credentials: PasswordCredentials<'a>,
    #[serde(rename = "tenantId")]
    tenant_id: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> TokensRequest<'a> {
    fn new(credentials: &'a Credentials) -> Self {
        Self {
            auth: AuthRequest {
                password_credentials: PasswordCredentials {
                    username: credentials.username(),
                    password: credentials.password(),
                },
                tenant_id: credentials.tenant_id(),
            },
        }
    }
}

/// Response body of a successful token request.
#[derive(Debug, Deserialize)]
pub struct TokensResponse {
    pub access: Access,
}

#[derive(Debug, Deserialize)]
pub struct Access {
    pub token: Token,
    #[serde(rename = "serviceCatalog", default)]
    pub service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct Token {
    pub id: String,
    /// RFC3339 timestamp.
    pub expires: String,
    #[serde(default)]
    pub issued_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub region: String,
    #[serde(rename = "publicURL", default)]
    pub public_url: String,
}

/// Pick the object-store endpoint for `region`. The first match with a
/// non-empty URL wins.
pub fn select_storage_url<'a>(catalog: &'a [CatalogEntry], region: &str) -> Option<&'a str> {
    let mut matches = catalog
        .iter()
        .filter(|entry| entry.service_type == OBJECT_STORE_TYPE)
        .flat_map(|entry| entry.endpoints.iter())
        .filter(|endpoint| endpoint.region == region)
        .map(|endpoint| endpoint.public_url.as_str())
        .filter(|url| !url.is_empty());

    let selected = matches.next()?;
    let ignored = matches.count();
    if ignored > 0 {
        debug!(region, ignored, "Multiple object-store endpoints for region; using the first");
    }
    Some(selected)
}

impl TokensResponse {
    /// Turn the response into a session for `region`.
    pub fn into_session(self, region: &str) -> Result<Session, StorageError> {
        let storage_url = select_storage_url(&self.access.service_catalog, region)
            .ok_or_else(|| {
                StorageError::auth(
                    None,
                    format!("no {OBJECT_STORE_TYPE} endpoint for region {region} in service catalog"),
                )
            })?
            .trim_end_matches('/')
            .to_string();

        if self.access.token.id.is_empty() {
            return Err(StorageError::auth(None, "identity response has an empty token id"));
        }

        Ok(Session::new(
            self.access.token.id,
            self.access.token.expires,
            storage_url,
        ))
    }
}

/// Request a fresh token. Every failure, including transport errors, is an
/// [`StorageError::Auth`].
pub(crate) async fn request_token(
    http: &Client,
    url: &str,
    credentials: &Credentials,
) -> Result<Session, StorageError> {
    debug!(url, user = credentials.username(), "Requesting identity token");

    let response = http
        .post(url)
        .json(&TokensRequest::new(credentials))
        .send()
        .await
        .map_err(|e| StorageError::auth(None, format!("token request failed: {e}")))?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(StorageError::auth(
            Some(status),
            format!("identity service rejected token request: {}", body.trim()),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| StorageError::auth(Some(status), format!("failed to read token response: {e}")))?;
    let parsed: TokensResponse = serde_json::from_slice(&body)
        .map_err(|e| StorageError::auth(Some(status), format!("malformed token response: {e}")))?;

    let session = parsed.into_session(credentials.region())?;
    info!(
        region = credentials.region(),
        expires = session.expires(),
        storage_url = session.storage_url(),
        "Obtained identity token"
    );
    Ok(session)
}
