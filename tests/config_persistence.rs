mod support;

use anyhow::Result;
use conoha_swift::config::ClientConfig;
use conoha_swift::{ConfigFileSessionStore, Session, SessionStore, StorageClient};
use support::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &TempDir, server: &MockServer, session: Option<&Session>) -> Result<std::path::PathBuf> {
    let mut config = ClientConfig {
        user_name: "gncu12345678".to_string(),
        password: "hunter2".to_string(),
        tenant_id: "0123456789abcdef".to_string(),
        region: REGION.to_string(),
        identity_url: Some(identity_url(server)),
        ..Default::default()
    };
    if let Some(session) = session {
        config.set_session(session);
    }
    let path = dir.path().join("conoha-swift.toml");
    config.save(&path)?;
    Ok(path)
}

#[tokio::test]
async fn refreshed_token_is_written_back_to_config() -> Result<()> {
    let server = MockServer::start().await;
    let far_future = "2999-01-01T00:00:00.000000Z";
    mount_identity(&server, "gAAAAABfresh", far_future, 1).await;
    Mock::given(method("PUT"))
        .and(path(format!("{ACCOUNT_PATH}/photos")))
        .and(header("x-auth-token", "gAAAAABfresh"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let expired = Session::new("old-token", "2000-01-01T00:00:00Z", storage_url(&server));
    let config_path = write_config(&dir, &server, Some(&expired))?;

    let client = StorageClient::from_config_file(&config_path).await?;
    client.create_container("photos").await?;

    let reloaded = ClientConfig::load(&config_path)?;
    assert_eq!(reloaded.token, "gAAAAABfresh");
    assert_eq!(reloaded.expires, far_future);
    assert_eq!(reloaded.swift_url, storage_url(&server));
    assert_eq!(reloaded.user_name, "gncu12345678");
    assert_eq!(reloaded.password, "hunter2");
    assert_eq!(reloaded.identity_url, Some(identity_url(&server)));
    Ok(())
}

#[tokio::test]
async fn valid_token_in_config_is_used_without_identity() -> Result<()> {
    let server = MockServer::start().await;
    mount_identity(&server, "unused", "2999-01-01T00:00:00Z", 0).await;
    Mock::given(method("DELETE"))
        .and(path(format!("{ACCOUNT_PATH}/photos")))
        .and(header("x-auth-token", "still-good"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let cached = Session::new("still-good", "2999-01-01T00:00:00Z", storage_url(&server));
    let config_path = write_config(&dir, &server, Some(&cached))?;
    let before = std::fs::read_to_string(&config_path)?;

    let client = StorageClient::from_config_file(&config_path).await?;
    client.delete_container("photos").await?;

    assert_eq!(std::fs::read_to_string(&config_path)?, before);
    Ok(())
}

#[tokio::test]
async fn session_round_trips_through_config_file() -> Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    let config_path = write_config(&dir, &server, None)?;

    let session = Session::new(
        "gAAAAABk_token-with+odd/chars==",
        "2024-05-02T21:00:00.123456+09:00",
        "https://object-storage.tyo1.conoha.io/v1/nc_0123456789abcdef",
    );

    let (store, _) = ConfigFileSessionStore::open(&config_path)?;
    store.save(&session).await?;

    let (reopened, _) = ConfigFileSessionStore::open(&config_path)?;
    let restored = reopened.load().await?.expect("session persisted");
    assert_eq!(restored.token().as_bytes(), session.token().as_bytes());
    assert_eq!(restored.expires().as_bytes(), session.expires().as_bytes());
    assert_eq!(
        restored.storage_url().as_bytes(),
        session.storage_url().as_bytes()
    );
    Ok(())
}

#[tokio::test]
async fn failed_authentication_does_not_touch_config() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(IDENTITY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let expired = Session::new("old-token", "2000-01-01T00:00:00Z", storage_url(&server));
    let config_path = write_config(&dir, &server, Some(&expired))?;
    let before = std::fs::read_to_string(&config_path)?;

    let client = StorageClient::from_config_file(&config_path).await?;
    assert!(client.show_account().await.is_err());

    assert_eq!(std::fs::read_to_string(&config_path)?, before);
    Ok(())
}
