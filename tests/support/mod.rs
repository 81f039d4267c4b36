#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use conoha_swift::clock::FixedClock;
use conoha_swift::{Credentials, MemorySessionStore, Session, StorageClient};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const IDENTITY_PATH: &str = "/v2.0/tokens";
pub const ACCOUNT_PATH: &str = "/v1/nc_0123456789abcdef";
pub const REGION: &str = "tyo1";

pub fn credentials() -> Credentials {
    Credentials::new("gncu12345678", "hunter2", "0123456789abcdef", REGION)
}

pub fn identity_url(server: &MockServer) -> String {
    format!("{}{IDENTITY_PATH}", server.uri())
}

pub fn storage_url(server: &MockServer) -> String {
    format!("{}{ACCOUNT_PATH}", server.uri())
}

/// Noon UTC on 2024-05-02.
pub fn expiry() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
}

pub const EXPIRY_STR: &str = "2024-05-02T12:00:00Z";

/// Identity response body with one object-store entry per `(region, url)`.
pub fn token_body(token: &str, expires: &str, endpoints: &[(&str, &str)]) -> Value {
    let endpoints: Vec<Value> = endpoints
        .iter()
        .map(|(region, url)| json!({"region": region, "publicURL": url}))
        .collect();
    json!({
        "access": {
            "token": {
                "issued_at": "2024-05-01T12:00:00.000000",
                "expires": expires,
                "id": token,
                "tenant": {"id": "0123456789abcdef", "name": "gnct12345678", "enabled": true}
            },
            "serviceCatalog": [
                {
                    "type": "identity",
                    "name": "Identity Service",
                    "endpoints": [{"region": REGION, "publicURL": "https://identity.tyo1.conoha.io/v2.0"}]
                },
                {
                    "type": "object-store",
                    "name": "Object Storage Service",
                    "endpoints_links": [],
                    "endpoints": endpoints
                }
            ],
            "user": {"username": "gncu12345678", "roles_links": [], "id": "u1", "roles": [], "name": "gncu12345678"},
            "metadata": {"is_admin": 0, "roles": []}
        }
    })
}

/// Mount a token endpoint that must be hit exactly `times` times.
pub async fn mount_identity(server: &MockServer, token: &str, expires: &str, times: u64) {
    let url = storage_url(server);
    let body = token_body(token, expires, &[(REGION, url.as_str())]);
    Mock::given(method("POST"))
        .and(path(IDENTITY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// A client holding a session that is valid at the clock's current time.
pub async fn client_with_valid_session(
    server: &MockServer,
) -> anyhow::Result<(StorageClient, Arc<MemorySessionStore>)> {
    let session = Session::new("cached-token", EXPIRY_STR, storage_url(server));
    let store = Arc::new(MemorySessionStore::with_session(session));
    let clock = Arc::new(FixedClock::new(expiry() - chrono::Duration::hours(1)));
    let client = StorageClient::builder(credentials())
        .with_identity_url(identity_url(server))
        .with_session_store(store.clone())
        .with_clock(clock)
        .build()
        .await?;
    Ok((client, store))
}
