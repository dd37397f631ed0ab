#![allow(dead_code)]

use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use worksphere::config::{AiConfig, AiProvider, Config, RegistrationMode};

pub const PASSWORD: &str = "password123";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

/// A registered account and the personal organization created with it.
pub struct TestUser {
    pub id: String,
    pub token: String,
    pub email: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register an account with the shared test password.
    pub async fn signup(&self, email: &str, name: &str) -> TestUser {
        let (body, status) = self.register(email, PASSWORD, name).await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        TestUser {
            id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
            token: body["data"]["access_token"].as_str().unwrap().to_string(),
            email: email.to_string(),
        }
    }

    /// Create an organization owned by `token`'s user, return its id.
    pub async fn create_org(&self, token: &str, name: &str) -> String {
        let (body, status) = self
            .post_auth("/api/v1/organizations", token, &json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::OK, "create organization failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn add_member(&self, token: &str, org_id: &str, email: &str, role: &str) {
        let (body, status) = self
            .post_auth(
                &format!("/api/v1/organizations/{org_id}/members"),
                token,
                &json!({ "email": email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add member failed: {body}");
    }

    pub async fn create_project(&self, token: &str, org_id: &str, name: &str) -> String {
        let (body, status) = self
            .post_auth(
                &format!("/api/v1/organizations/{org_id}/projects"),
                token,
                &json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create project failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn create_board(&self, token: &str, project_id: &str, name: &str) -> String {
        let (body, status) = self
            .post_auth(
                &format!("/api/v1/projects/{project_id}/boards"),
                token,
                &json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create board failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn create_column(&self, token: &str, board_id: &str, name: &str) -> String {
        let (body, status) = self
            .post_auth(
                &format!("/api/v1/boards/{board_id}/columns"),
                token,
                &json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create column failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn create_card(&self, token: &str, column_id: &str, card: &Value) -> String {
        let (body, status) = self
            .post_auth(&format!("/api/v1/columns/{column_id}/cards"), token, card)
            .await;
        assert_eq!(status, StatusCode::OK, "create card failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn request_signoff(&self, token: &str, project_id: &str) -> (Value, StatusCode) {
        self.post_auth(
            &format!("/api/v1/projects/{project_id}/request-signoff"),
            token,
            &json!({ "notes": "Ready for review", "reason": "Milestone complete" }),
        )
        .await
    }

    pub async fn review_signoff(
        &self,
        token: &str,
        project_id: &str,
        approved: bool,
        unprotect_data: bool,
    ) -> (Value, StatusCode) {
        self.post_auth(
            &format!("/api/v1/projects/{project_id}/approve-signoff"),
            token,
            &json!({
                "approved": approved,
                "notes": "Reviewed",
                "unprotect_data": unprotect_data,
            }),
        )
        .await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like [`spawn_app`], letting the test adjust the configuration first.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let db_name = format!("worksphere_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let mut config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        registration: RegistrationMode::Open,
        max_body_size: 1_048_576,
        cors_origins: vec![],
        log_level: "warn".to_string(),
        smtp: None,
        ai: AiConfig {
            provider: AiProvider::Mock,
            rate_limit_per_minute: 3,
        },
    };
    configure(&mut config);

    let app = worksphere::build_app(pool.clone(), config).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
