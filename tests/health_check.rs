//! Integration tests for the authgate server

use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::{AuthenticationGate, BcryptPasswordHasher};
use authgate::configuration::JwtSettings;
use authgate::startup::run;
use authgate::store::InMemoryCredentialStore;

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let jwt_config = JwtSettings {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 3600,
        issuer: "test".to_string(),
    };
    let gate = AuthenticationGate::new(
        Arc::new(InMemoryCredentialStore::new()),
        &jwt_config,
        Arc::new(BcryptPasswordHasher::new(4)),
    )
    .expect("Failed to build authentication gate");
    let server = run(listener, gate).expect("Failed to create server");

    let _ = tokio::spawn(async move {
        let _ = server.await;
    });

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/does-not-exist", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}
