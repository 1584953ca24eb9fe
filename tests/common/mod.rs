//! Shared helpers for integration tests: an in-process HTTP server that
//! stands in for the catalog host and the GitHub API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct MockState {
    responses: HashMap<(Method, String), (u16, String)>,
    log: Vec<Recorded>,
}

/// Scripted HTTP server. Responses are keyed by method and path (query
/// ignored); unscripted requests get a 404.
#[derive(Clone, Default)]
pub struct MockServer {
    inner: Arc<Mutex<MockState>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .insert((method, path.to_string()), (status, body.into()));
    }

    /// Shorthand for scripting a `GET`.
    pub fn get(&self, path: &str, status: u16, body: impl Into<String>) {
        self.respond(Method::GET, path, status, body);
    }

    pub fn log(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().log.clone()
    }

    pub fn hits(&self, method: Method, path: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn total_hits(&self) -> usize {
        self.inner.lock().unwrap().log.len()
    }

    /// Bind to an ephemeral port and return the base URL.
    pub async fn start(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());
        spawn(app).await
    }
}

async fn handle(
    State(mock): State<MockServer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    let mut state = mock.inner.lock().unwrap();
    state.log.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).to_string(),
    });
    match state.responses.get(&(method, path)) {
        Some((status, body)) => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body.clone(),
        ),
        None => (StatusCode::NOT_FOUND, "not scripted".to_string()),
    }
}

/// Serve `app` on 127.0.0.1 with an ephemeral port.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub const SKILLS_CATALOG: &str = r#"{
    "version": "1.0.0",
    "lastUpdated": "2026-01-01T00:00:00Z",
    "skills": [
        {"id": "code-review", "name": "Code Review", "description": "Reviews diffs",
         "category": "Quality", "tags": ["review"], "path": "skills/code-review/SKILL.md"},
        {"id": "broken", "name": "Broken", "description": "Missing metadata",
         "path": "skills/broken/SKILL.md"},
        {"id": "pdf", "name": "PDF", "description": "Works with PDFs",
         "path": "skills/pdf/SKILL.md"}
    ]
}"#;

pub const AGENTS_CATALOG: &str = r#"{
    "version": "1.0.0",
    "lastUpdated": "2026-01-01T00:00:00Z",
    "agents": [
        {"id": "reviewer", "name": "Reviewer", "description": "Reviews code",
         "path": "agents/reviewer.md"}
    ]
}"#;

pub const CODE_REVIEW_SKILL: &str = "---\nname: code-review\ndescription: Reviews diffs for bugs\nmetadata:\n  author: octo\n---\n\n# Code Review\n\nLook for bugs.\n";

pub const BROKEN_SKILL: &str = "---\nname: broken\n---\nNo description here.\n";

pub const REVIEWER_AGENT: &str = "---\ndescription: Reviews code\nmode: subagent\nmodel: anthropic/claude-sonnet-4\ntemperature: 0.2\n---\nYou review code.\n";

/// MCP catalog whose remote entry points back at `base`.
pub fn mcp_catalog(base: &str) -> String {
    format!(
        r#"{{
    "version": "1.0.0",
    "lastUpdated": "2026-01-01T00:00:00Z",
    "servers": [
        {{"id": "github", "name": "GitHub", "description": "Repositories", "type": "local",
          "command": ["definitely-not-installed-mcp-4d1f", "--stdio"],
          "environment": {{"GITHUB_TOKEN": ""}}, "requiresAuth": true, "authType": "api-key"}},
        {{"id": "context7", "name": "Context7", "description": "Docs", "type": "remote",
          "url": "{base}/mcp"}},
        {{"id": "flaky", "name": "Flaky", "description": "Always failing", "type": "remote",
          "url": "{base}/flaky"}}
    ]
}}"#
    )
}

/// Script the standard catalog files on `mock`.
pub fn script_catalog(mock: &MockServer, base: &str) {
    mock.get("/skills.json", 200, SKILLS_CATALOG);
    mock.get("/agents.json", 200, AGENTS_CATALOG);
    mock.get("/mcp-servers.json", 200, mcp_catalog(base));
    mock.get("/skills/code-review/SKILL.md", 200, CODE_REVIEW_SKILL);
    mock.get("/skills/broken/SKILL.md", 200, BROKEN_SKILL);
    mock.get("/agents/reviewer.md", 200, REVIEWER_AGENT);
    mock.respond(Method::OPTIONS, "/mcp", 405, "");
    mock.respond(Method::OPTIONS, "/flaky", 503, "down");
}
