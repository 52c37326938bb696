#![allow(dead_code)]
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::Service;

use configs::AppConfig;
use models::user::{self, Role};
use server::routes;
use server::state::ServerState;
use service::storage::{StorageRoot, OUTBOX_DIR};

pub struct TestApp {
    pub router: Router,
    pub state: ServerState,
    pub dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Config pointing at a SQLite file and storage root inside `dir`, port 0.
pub fn test_config(dir: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.server.host = "127.0.0.1".into();
    cfg.server.port = 0;
    cfg.server.public_base_url = Some("http://contacts.test/".into());
    cfg.database.url = format!("sqlite://{}?mode=rwc", dir.join("contacts.db").display());
    cfg.database.min_connections = 1;
    cfg.storage.root = dir.join("storage").display().to_string();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg
}

pub async fn build_app() -> anyhow::Result<TestApp> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(dir.path());
    build_app_with(dir, cfg).await
}

pub async fn build_app_with(dir: TempDir, cfg: AppConfig) -> anyhow::Result<TestApp> {
    let storage = Arc::new(StorageRoot::open(&cfg.storage.root).await?);
    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::migrate(&db).await?;
    let state = ServerState::new(db, cfg, storage);
    let router = routes::build_router(state.clone());
    Ok(TestApp { router, state, dir })
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> anyhow::Result<TestResponse> {
        let resp = self.router.clone().call(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        Ok(TestResponse { status, headers, body })
    }

    /// Raw body, for non-JSON responses such as static files.
    pub async fn get_bytes(&self, uri: &str) -> anyhow::Result<(StatusCode, Vec<u8>)> {
        let req = Request::builder().method("GET").uri(uri).body(Body::empty())?;
        let resp = self.router.clone().call(req).await?;
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
        Ok((status, bytes.to_vec()))
    }

    pub async fn multipart(&self, uri: &str, token: &str, field: &str, content_type: &str, data: &[u8]) -> anyhow::Result<TestResponse> {
        let boundary = "contacts-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        let req = Request::builder()
            .method("PATCH")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))?;
        self.send(req).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> anyhow::Result<TestResponse> {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        self.send(req.body(Body::empty())?).await
    }

    pub async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<TestResponse> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        self.send(req.body(Body::from(serde_json::to_vec(&body)?))?).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> anyhow::Result<TestResponse> {
        let req = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())?;
        self.send(req).await
    }

    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<TestResponse> {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}&password={password}")))?;
        self.send(req).await
    }

    pub async fn signup(&self, username: &str, password: &str) -> anyhow::Result<TestResponse> {
        self.json(
            "POST",
            "/api/v1/auth/signup",
            None,
            json!({"username": username, "email": format!("{username}@example.com"), "password": password}),
        )
        .await
    }

    /// Signup, confirm and login; returns the access token.
    pub async fn register(&self, username: &str) -> anyhow::Result<String> {
        let res = self.signup(username, "secret123").await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "signup failed: {:?}", res.body);
        let token = self.state.auth.verification_token(&format!("{username}@example.com"))?;
        let res = self.get(&format!("/api/v1/auth/confirmed_email/{token}"), None).await?;
        anyhow::ensure!(res.status == StatusCode::OK, "confirm failed: {:?}", res.body);
        let res = self.login(username, "secret123").await?;
        anyhow::ensure!(res.status == StatusCode::OK, "login failed: {:?}", res.body);
        Ok(res.body["access_token"].as_str().unwrap_or_default().to_string())
    }

    pub async fn promote(&self, username: &str, role: Role) -> anyhow::Result<user::Model> {
        let u = user::find_by_username(&self.state.db, username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no user {username}"))?;
        let updated = user::set_role(&self.state.db, u.id, role).await?;
        self.state.user_cache.invalidate(&updated.email).await;
        Ok(updated)
    }

    /// Outbox messages, waiting briefly for background delivery.
    pub async fn outbox(&self, expected: usize) -> anyhow::Result<Vec<Value>> {
        for _ in 0..50 {
            let names = self.state.storage.list(OUTBOX_DIR).await?;
            if names.len() >= expected {
                let mut out = Vec::new();
                for name in names {
                    let raw = self.state.storage.read(&format!("{OUTBOX_DIR}/{name}")).await?;
                    out.push(serde_json::from_slice(&raw)?);
                }
                return Ok(out);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!("outbox never reached {expected} messages")
    }
}
