use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::{hash_password, sign_token_at, verify_token, Claims, MIN_SALT_ROUNDS};
use authgate::configuration::AuthSettings;
use authgate::startup::run;
use authgate::users::{InMemoryUserStore, NewUser, UserStore};
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryUserStore>,
    pub settings: AuthSettings,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_raw(&self, path: &str, content_type: Option<&str>, body: &str) -> reqwest::Response {
        let mut request = self
            .client
            .post(&format!("{}{}", &self.address, path))
            .body(body.to_string());
        if let Some(value) = content_type {
            request = request.header("Content-Type", value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/register",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    async fn me(&self, authorization: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(&format!("{}/auth/me", &self.address));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }
}

fn test_settings() -> AuthSettings {
    AuthSettings {
        password_hash_salt_rounds: MIN_SALT_ROUNDS,
        user_token_secret: "integration-access-secret".to_string(),
        refresh_token_secret: "integration-refresh-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 86400,
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryUserStore::new());
    let settings = test_settings();
    let server = run(listener, store.clone(), settings.clone()).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        settings,
        client: reqwest::Client::new(),
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_with_token_pair() {
    let app = spawn_app().await;

    let response = app.register("alice", "correct horse").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);

    let access = body["accessToken"].as_str().unwrap();
    let claims = verify_token(access, &app.settings.user_token_secret).unwrap();
    assert_eq!(claims.username, "alice");
    assert!(!claims.is_admin);

    let stored = app.store.find_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(stored.id, claims.id);
    assert_ne!(stored.password_hash, "correct horse");
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app().await;

    let cases = vec![
        ("ab", "correct horse", "username too short"),
        ("bad name", "correct horse", "username with space"),
        ("alice", "short", "password too short"),
    ];

    for (username, password, reason) in cases {
        let response = app.register(username, password).await;
        assert_eq!(400, response.status().as_u16(), "Should reject: {}", reason);
    }
}

#[tokio::test]
async fn register_returns_409_for_taken_username() {
    let app = spawn_app().await;

    assert_eq!(201, app.register("alice", "correct horse").await.status().as_u16());
    assert_eq!(409, app.register("alice", "another password").await.status().as_u16());
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_200_for_valid_credentials() {
    let app = spawn_app().await;
    app.register("alice", "correct horse").await;

    let response = app.login("alice", "correct horse").await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    let refresh = body["refreshToken"].as_str().unwrap();
    let claims = verify_token(refresh, &app.settings.refresh_token_secret).unwrap();
    assert_eq!(claims.username, "alice");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    app.register("alice", "correct horse").await;

    let json = Some("application/json");
    let cases = vec![
        (json, r#"{"username": "nouser", "password": "anything"}"#, "unknown user"),
        (json, r#"{"username": "alice", "password": "wrong password"}"#, "wrong password"),
        (json, r#"{"username": "alice"}"#, "missing password"),
        (json, "{}", "empty object"),
        (json, r#"{"username": 5, "password": "correct horse"}"#, "numeric username"),
        (json, "{not json", "syntax error"),
        (json, "", "empty body"),
        (None, "", "no body at all"),
    ];

    let mut messages = Vec::new();
    for (content_type, body, reason) in cases {
        let response = app.post_raw("/auth/login", content_type, body).await;
        assert_eq!(401, response.status().as_u16(), "Should reject login: {}", reason);

        let error: Value = response.json().await.expect("Expected a JSON error body");
        messages.push((error["code"].clone(), error["message"].clone()));
    }

    assert!(messages.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn login_preserves_admin_flag() {
    let app = spawn_app().await;
    app.store
        .create_user(NewUser {
            username: "root".to_string(),
            password_hash: hash_password("admin password", MIN_SALT_ROUNDS).unwrap(),
            is_admin: true,
        })
        .await
        .unwrap();

    let body: Value = app.login("root", "admin password").await.json().await.unwrap();
    let access = body["accessToken"].as_str().unwrap();

    let me: Value = app.me(Some(&format!("Bearer {}", access))).await.json().await.unwrap();
    assert_eq!(me["username"], "root");
    assert_eq!(me["isAdmin"], true);
}

// --- Bearer Token Tests ---

#[tokio::test]
async fn me_returns_claims_for_valid_access_token() {
    let app = spawn_app().await;
    let body: Value = app.register("alice", "correct horse").await.json().await.unwrap();
    let access = body["accessToken"].as_str().unwrap();

    let response = app.me(Some(&format!("Bearer {}", access))).await;
    assert_eq!(200, response.status().as_u16());

    let claims: Claims = response.json().await.unwrap();
    assert_eq!(claims.username, "alice");
}

#[tokio::test]
async fn me_returns_401_without_valid_bearer_token() {
    let app = spawn_app().await;
    let body: Value = app.register("alice", "correct horse").await.json().await.unwrap();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();
    let expired = sign_token_at(
        &Claims::new("alice", false, 1),
        &app.settings.user_token_secret,
        3600,
        now() - 3601,
    )
    .unwrap();

    let bearer_refresh = format!("Bearer {}", refresh);
    let bearer_expired = format!("Bearer {}", expired);
    let cases: Vec<(Option<&str>, &str)> = vec![
        (None, "missing header"),
        (Some("Basic YWxpY2U6cHc="), "other scheme"),
        (Some("Bearer"), "scheme without token"),
        (Some("Bearer not.a.token"), "garbage token"),
        (Some(bearer_refresh.as_str()), "refresh token used as access token"),
        (Some(bearer_expired.as_str()), "expired access token"),
    ];

    for (authorization, reason) in cases {
        let response = app.me(authorization).await;
        assert_eq!(401, response.status().as_u16(), "Should reject: {}", reason);
    }
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_returns_new_access_token_with_same_claims() {
    let app = spawn_app().await;
    let body: Value = app.register("alice", "correct horse").await.json().await.unwrap();
    let refresh = body["refreshToken"].as_str().unwrap();
    let original = verify_token(body["accessToken"].as_str().unwrap(), &app.settings.user_token_secret)
        .unwrap();

    let response = app.post_json("/auth/refresh", &json!({ "refreshToken": refresh })).await;
    assert_eq!(200, response.status().as_u16());

    let refreshed: Value = response.json().await.unwrap();
    assert!(refreshed.get("refreshToken").is_none());
    let access = refreshed["accessToken"].as_str().unwrap();
    let claims = verify_token(access, &app.settings.user_token_secret).unwrap();
    assert_eq!(claims, original);
}

#[tokio::test]
async fn refresh_returns_401_for_missing_or_invalid_token() {
    let app = spawn_app().await;
    let body: Value = app.register("alice", "correct horse").await.json().await.unwrap();
    let access = body["accessToken"].as_str().unwrap().to_string();
    let expired = sign_token_at(
        &Claims::new("alice", false, 1),
        &app.settings.refresh_token_secret,
        86400,
        now() - 86401,
    )
    .unwrap();

    let cases = vec![
        (json!({}), "missing field"),
        (json!({ "refreshToken": "" }), "empty token"),
        (json!({ "refreshToken": "garbage" }), "garbage token"),
        (json!({ "refreshToken": access }), "access token used as refresh token"),
        (json!({ "refreshToken": expired }), "expired refresh token"),
    ];

    for (body, reason) in cases {
        let response = app.post_json("/auth/refresh", &body).await;
        assert_eq!(401, response.status().as_u16(), "Should reject refresh: {}", reason);
    }
}

#[tokio::test]
async fn refresh_returns_401_for_unparseable_body() {
    let app = spawn_app().await;

    let json = Some("application/json");
    let cases = vec![
        (json, r#"{"refreshToken": 42}"#, "numeric token"),
        (json, r#"{"refreshToken": ["a"]}"#, "array token"),
        (json, "refreshToken=abc", "form encoded"),
        (json, "", "empty body"),
        (None, "", "no body at all"),
    ];

    for (content_type, body, reason) in cases {
        let response = app.post_raw("/auth/refresh", content_type, body).await;
        assert_eq!(401, response.status().as_u16(), "Should reject refresh: {}", reason);

        let error: Value = response.json().await.expect("Expected a JSON error body");
        assert_eq!(error["code"], "NOT_AUTHENTICATED");
    }
}
