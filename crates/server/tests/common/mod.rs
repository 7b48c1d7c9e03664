#![allow(dead_code)]

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use finquest_advisor::LlmClient;
use finquest_api::crypto::sign_jwt;
use finquest_runtime_config::{LlmConfig, LlmProvider, ServerConfig};
use finquest_server::{Advisor, AppState, router, storage};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tempfile::TempDir;

pub const SECRET: &str = "test-jwt-secret";

/// A running server on an ephemeral port plus its throwaway data dir.
pub struct TestServer {
    pub base_url: String,
    pub http: reqwest::Client,
    _dir: TempDir,
}

/// A user with a signed token.
pub struct TestUser {
    pub user_id: String,
    pub token: String,
}

pub fn user(user_id: &str) -> TestUser {
    let now = chrono::Utc::now().timestamp() as u64;
    TestUser {
        user_id: user_id.to_string(),
        token: sign_jwt(user_id, Some(&format!("{user_id}@example.com")), SECRET, now),
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

impl TestServer {
    /// Start a server. `llm_base_url` points the advisors at a gateway.
    pub async fn start(llm_base_url: Option<String>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.server.data_dir = dir.path().to_path_buf();
        config.auth.jwt_secret = SECRET.to_string();

        let advisor = match llm_base_url {
            Some(base_url) => {
                let llm = LlmConfig {
                    provider: LlmProvider::Openai,
                    base_url: Some(base_url),
                    api_key: Some("test-key".into()),
                    timeout_secs: 5,
                    ..LlmConfig::default()
                };
                Advisor::new(Some(LlmClient::from_config(&llm).unwrap()))
            }
            None => Advisor::new(None),
        };

        let db = storage::init_db(dir.path()).unwrap();
        let base_url = serve(router(AppState::new(db, &config, advisor))).await;
        Self {
            base_url,
            http: reqwest::Client::new(),
            _dir: dir,
        }
    }

    /// Side connection to the server's database, for arranging store faults.
    pub fn open_db(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(self._dir.path().join("finquest.db")).unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, user: &TestUser) -> reqwest::Response {
        self.http
            .get(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .unwrap()
    }

    pub async fn post<T: Serialize>(&self, path: &str, user: &TestUser, body: &T) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put<T: Serialize>(&self, path: &str, user: &TestUser, body: &T) -> reqwest::Response {
        self.http
            .put(self.url(path))
            .bearer_auth(&user.token)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str, user: &TestUser) -> reqwest::Response {
        self.http
            .delete(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .unwrap()
    }
}

/// Read a JSON body after asserting the status.
pub async fn json_with(resp: reqwest::Response, status: u16) -> Value {
    let actual = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    assert_eq!(actual, status, "unexpected status, body: {body}");
    body
}

// ---------------------------------------------------------------------------
// Fake LLM gateway (OpenAI-compatible)
// ---------------------------------------------------------------------------

/// Canned gateway. `status` selects the reply: 200 answers, anything else is
/// returned as an error status.
#[derive(Clone)]
pub struct FakeLlm {
    pub base_url: String,
    status: Arc<AtomicU16>,
}

impl FakeLlm {
    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }
}

async fn chat_completions(
    State(status): State<Arc<AtomicU16>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let status = status.load(Ordering::SeqCst);
    if status != 200 {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (code, Json(json!({"error": {"message": "canned failure"}})));
    }

    let Some(tool) = body["tools"][0]["function"]["name"].as_str() else {
        return (
            StatusCode::OK,
            Json(json!({
                "choices": [{"message": {"role": "assistant", "content": "You are on track."}}]
            })),
        );
    };
    let arguments = json!({"tool": tool, "summary": "Looks healthy", "tips": ["Keep going"]});
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "type": "function",
                        "function": {"name": tool, "arguments": arguments.to_string()}
                    }]
                }
            }]
        })),
    )
}

pub async fn fake_llm() -> FakeLlm {
    let status = Arc::new(AtomicU16::new(200));
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(status.clone());
    let base = serve(app).await;
    FakeLlm {
        base_url: format!("{base}/v1"),
        status,
    }
}
