#![allow(clippy::unwrap_used)]
// Integration tests for `FytaClient` using wiremock.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fyta_api::{Credentials, Error, FytaClient, RecordId, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, FytaClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = FytaClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn credentials() -> Credentials {
    Credentials::new("gardener@example.com", SecretString::from("s3cret".to_string()))
}

fn token() -> SecretString {
    SecretString::from("tok-123".to_string())
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "gardener@example.com",
            "password": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-123",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client.login(&credentials()).await.unwrap();
    assert_eq!(token.expose_secret(), "tok-123");
}

#[tokio::test]
async fn test_login_without_token_is_protocol_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let result = client.login(&credentials()).await;
    assert!(
        matches!(result, Err(Error::MissingToken)),
        "expected MissingToken, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
    assert!(err.is_fatal_auth());
}

#[tokio::test]
async fn test_login_unknown_account() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, Error::UnknownAccount));
    assert!(!err.is_fatal_auth());
}

#[tokio::test]
async fn test_login_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    match client.login(&credentials()).await {
        Err(Error::Http { status, ref body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_timeout() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_timeout(Duration::from_millis(100));
    let client = FytaClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "late" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.login(&credentials()).await.unwrap_err();
    assert!(
        matches!(err, Error::Transport(ref e) if e.is_timeout()),
        "expected timeout, got: {err:?}"
    );
    assert!(err.is_transient());
}

// ── Inventory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_inventory() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user-plant"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gardens": [
                { "id": 1, "garden_name": "Wohnzimmer", "is_shared": false }
            ],
            "plants": [
                {
                    "id": 10,
                    "nickname": "Monstera",
                    "garden": { "id": 1 },
                    "sensor": { "id": "AA:BB", "is_battery_low": false },
                    "hub": null
                },
                { "id": 11, "nickname": "Basil", "garden": null }
            ]
        })))
        .mount(&server)
        .await;

    let inventory = client.fetch_inventory(&token()).await.unwrap();

    assert_eq!(inventory.gardens.len(), 1);
    assert_eq!(inventory.gardens[0].name, "Wohnzimmer");
    assert_eq!(inventory.plants.len(), 2);
    assert_eq!(inventory.plants[0].garden_id, Some(RecordId::Number(1)));
    assert!(inventory.plants[0].sensor.is_some());
    assert!(inventory.plants[1].garden_id.is_none());
}

#[tokio::test]
async fn test_fetch_inventory_expired_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user-plant"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&server)
        .await;

    match client.fetch_inventory(&token()).await {
        Err(Error::Http { status: 401, .. }) => {}
        other => panic!("expected Http 401, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_inventory_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user-plant"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    match client.fetch_inventory(&token()).await {
        Err(Error::Deserialization { ref body, .. }) => assert!(body.contains("oops")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Assets ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_download_asset_relative_reference() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user-plant/img/10/thumb"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;

    let bytes = client
        .download_asset("/api/user-plant/img/10/thumb", &token())
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), &[0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn test_download_asset_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/img/missing.jpg", server.uri());
    let err = client.download_asset(&url, &token()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
