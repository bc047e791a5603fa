use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use authgate::auth::{AuthenticationGate, BcryptPasswordHasher};
use authgate::configuration::JwtSettings;
use authgate::startup::run;
use authgate::store::InMemoryCredentialStore;
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub store: InMemoryCredentialStore,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn get_with_token(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", &self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn register(&self, username: &str, roles: &str) {
        let response = self
            .post(
                "/auth/register",
                &json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "SecurePass123",
                    "roles": roles
                }),
            )
            .await;
        assert_eq!(201, response.status().as_u16());
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post(
            "/auth/login",
            &json!({"username": username, "password": password}),
        )
        .await
    }

    async fn token_pair(&self, username: &str) -> (String, String) {
        let response = self.login(username, "SecurePass123").await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}

async fn spawn_app_with_lifetimes(access_token_expiry: i64, refresh_token_expiry: i64) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt_config = JwtSettings {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        access_token_expiry,
        refresh_token_expiry,
        issuer: "test".to_string(),
    };
    let store = InMemoryCredentialStore::new();
    let gate = AuthenticationGate::new(
        Arc::new(store.clone()),
        &jwt_config,
        Arc::new(BcryptPasswordHasher::new(4)),
    )
    .expect("Failed to build authentication gate");

    let server = run(listener, gate).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_lifetimes(900, 3600).await
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_for_valid_data() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/auth/register",
            &json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "SecurePass123",
                "roles": "user,admin"
            }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["roles"], json!(["USER", "ADMIN"]));
    assert!(body.get("password_hash").is_none());
    assert_eq!(app.store.user_count().await, 1);
}

#[tokio::test]
async fn register_returns_409_for_duplicate_username() {
    let app = spawn_app().await;
    app.register("alice", "USER").await;

    let response = app
        .post(
            "/auth/register",
            &json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "SecurePass123"
            }),
        )
        .await;

    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"username": "alice", "email": "notanemail", "password": "SecurePass123"}), "invalid email"),
        (json!({"username": "a b", "email": "a@example.com", "password": "SecurePass123"}), "invalid username"),
        (json!({"username": "alice", "email": "a@example.com", "password": "weak"}), "weak password"),
        (json!({"username": "alice", "email": "a@example.com"}), "missing password"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app.post("/auth/register", &body).await;
        assert_eq!(400, response.status().as_u16(), "Should reject request: {}", reason);
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_token_pair_for_valid_credentials() {
    let app = spawn_app().await;
    app.register("alice", "USER").await;

    let response = app.login("alice", "SecurePass123").await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
    assert_eq!(app.store.refresh_token_count().await, 1);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    app.register("bob", "USER").await;

    let wrong_password = app.login("bob", "WrongPass123").await;
    let unknown_user = app.login("nobody", "SecurePass123").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);

    assert_eq!(app.store.refresh_token_count().await, 0);
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_returns_new_access_token_and_same_refresh_token() {
    let app = spawn_app().await;
    app.register("alice", "USER").await;
    let (access_token, refresh_token) = app.token_pair("alice").await;

    let response = app
        .post("/auth/refresh", &json!({"refresh_token": refresh_token}))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_ne!(body["access_token"].as_str().unwrap(), access_token);
    assert_eq!(body["refresh_token"].as_str().unwrap(), refresh_token);

    let me = app
        .get_with_token("/api/me", body["access_token"].as_str().unwrap())
        .await;
    assert_eq!(200, me.status().as_u16());
}

#[tokio::test]
async fn refresh_with_unknown_token_returns_same_401_as_bad_login() {
    let app = spawn_app().await;

    let refresh = app
        .post("/auth/refresh", &json!({"refresh_token": "not-a-real-token"}))
        .await;
    let login = app.login("nobody", "SecurePass123").await;

    assert_eq!(401, refresh.status().as_u16());
    let a: Value = refresh.json().await.unwrap();
    let b: Value = login.json().await.unwrap();
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_and_deleted() {
    let app = spawn_app_with_lifetimes(900, 1).await;
    app.register("alice", "USER").await;
    let (_, refresh_token) = app.token_pair("alice").await;

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let response = app
        .post("/auth/refresh", &json!({"refresh_token": refresh_token}))
        .await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(app.store.refresh_token_count().await, 0);
}

#[tokio::test]
async fn logout_invalidates_refresh_token() {
    let app = spawn_app().await;
    app.register("alice", "USER").await;
    let (_, refresh_token) = app.token_pair("alice").await;

    let logout = app
        .post("/auth/logout", &json!({"refresh_token": refresh_token}))
        .await;
    assert_eq!(204, logout.status().as_u16());

    let refresh = app
        .post("/auth/refresh", &json!({"refresh_token": refresh_token}))
        .await;
    assert_eq!(401, refresh.status().as_u16());
}

// --- Protected Routes Tests ---

#[tokio::test]
async fn protected_route_returns_401_without_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("{}/api/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_route_returns_401_with_invalid_token() {
    let app = spawn_app().await;

    let response = app.get_with_token("/api/me", "invalid.token.here").await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_route_rejects_expired_access_token() {
    let app = spawn_app_with_lifetimes(1, 3600).await;
    app.register("alice", "USER").await;
    let (access_token, _) = app.token_pair("alice").await;

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let response = app.get_with_token("/api/me", &access_token).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn me_returns_current_user() {
    let app = spawn_app().await;
    app.register("alice", "USER").await;
    let (access_token, _) = app.token_pair("alice").await;

    let response = app.get_with_token("/api/me", &access_token).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn admin_route_requires_admin_authority() {
    let app = spawn_app().await;
    app.register("alice", "USER").await;
    app.register("root", "USER,ADMIN").await;
    let (user_token, _) = app.token_pair("alice").await;
    let (admin_token, _) = app.token_pair("root").await;

    assert_eq!(200, app.get_with_token("/api/user", &user_token).await.status().as_u16());
    assert_eq!(403, app.get_with_token("/api/admin", &user_token).await.status().as_u16());
    assert_eq!(200, app.get_with_token("/api/admin", &admin_token).await.status().as_u16());
}
