#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    http::{HeaderMap, StatusCode as AxumStatus},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Domain the fake identity service recognises; `{id}@trips.test` resolves to user `id`.
pub const EMAIL_DOMAIN: &str = "trips.test";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub identity_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let identity_url = spawn_identity_service()?;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_trip-planner"));
        cmd.arg("serve")
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("TRIP_API_PORT", port.to_string())
            .env("IDENTITY_SERVICE_URL", &identity_url)
            .env("IDENTITY_TIMEOUT_MS", "2000")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            identity_url,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Stand-in for the upstream identity service, on its own thread and runtime
/// so it outlives any single test.
///
/// - `GET /api/auth/me` with `Bearer tok-{id}` returns user `id`; anything else is 401.
/// - `POST /auth/email` with `{id}@trips.test` returns user `id`; anything else is 404.
fn spawn_identity_service() -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick identity port")?;
    let listener = std::net::TcpListener::bind(("127.0.0.1", port)).context("failed to bind identity port")?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("identity runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("identity listener");
            let app = Router::new()
                .route("/api/auth/me", get(me))
                .route("/auth/email", post(by_email));
            axum::serve(listener, app).await.expect("identity service");
        });
    });

    Ok(format!("http://127.0.0.1:{}", port))
}

fn profile(id: &str) -> Value {
    json!({
        "id": id,
        "email": email(id),
        "firstName": format!("First-{}", id),
        "lastName": "Tester"
    })
}

async fn me(headers: HeaderMap) -> impl IntoResponse {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer tok-"));

    match token {
        Some(id) if !id.is_empty() => (AxumStatus::OK, Json(profile(id))),
        _ => (AxumStatus::UNAUTHORIZED, Json(json!({ "error": "Invalid token" }))),
    }
}

async fn by_email(Json(body): Json<Value>) -> impl IntoResponse {
    let suffix = format!("@{}", EMAIL_DOMAIN);
    match body["email"].as_str().and_then(|e| e.strip_suffix(suffix.as_str())) {
        Some(id) if !id.is_empty() => (AxumStatus::OK, Json(profile(id))),
        _ => (AxumStatus::NOT_FOUND, Json(json!({ "error": "User not found" }))),
    }
}

/// Fresh user id so tests sharing the server never see each other's data.
pub fn unique_user(name: &str) -> String {
    format!("{}-{}", name, uuid::Uuid::new_v4().simple())
}

pub fn token(user_id: &str) -> String {
    format!("tok-{}", user_id)
}

pub fn email(user_id: &str) -> String {
    format!("{}@{}", user_id, EMAIL_DOMAIN)
}

/// Thin JSON client returning status plus parsed body.
pub struct Api {
    base_url: String,
    client: reqwest::Client,
}

impl Api {
    pub async fn connect() -> Result<Self> {
        let server = ensure_server().await?;
        Ok(Self {
            base_url: server.base_url.clone(),
            client: reqwest::Client::new(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, user: Option<&str>) -> Result<(StatusCode, Value)> {
        let request = match user {
            Some(id) => request.bearer_auth(token(id)),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, user: Option<&str>, path: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.get(format!("{}{}", self.base_url, path)), user).await
    }

    pub async fn post(&self, user: Option<&str>, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.post(format!("{}{}", self.base_url, path)).json(&body), user)
            .await
    }

    pub async fn patch(&self, user: Option<&str>, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.patch(format!("{}{}", self.base_url, path)).json(&body), user)
            .await
    }

    /// Create a trip as `owner` and return its id.
    pub async fn create_trip(&self, owner: &str, title: &str) -> Result<String> {
        let (status, body) = self.post(Some(owner), "/trips", json!({ "title": title })).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create trip failed: {} {}", status, body);
        Ok(body["data"]["id"].as_str().context("trip id")?.to_string())
    }
}
