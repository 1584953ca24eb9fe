mod common;

use std::sync::Arc;

use common::{script_catalog, spawn, MockServer};
use opencode_manager::api::{router, AppState};
use opencode_manager::catalog::CatalogClient;
use opencode_manager::Config;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

struct Api {
    _dir: TempDir,
    base: String,
    http: reqwest::Client,
}

impl Api {
    async fn get(&self, path: &str) -> Value {
        let response = self.http.get(format!("{}{}", self.base, path)).send().await.unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> Value {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    async fn put(&self, path: &str, body: &str) -> Value {
        let response = self
            .http
            .put(format!("{}{}", self.base, path))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    async fn delete(&self, path: &str) -> Value {
        let response = self
            .http
            .delete(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }
}

async fn start() -> Api {
    let mock = MockServer::new();
    let catalog_url = mock.start().await;
    script_catalog(&mock, &catalog_url);

    let dir = tempdir().unwrap();
    let config = Config::new(dir.path(), &catalog_url);
    let http = reqwest::Client::new();
    let catalog = Arc::new(CatalogClient::new(&catalog_url, http.clone()));
    let state = Arc::new(AppState::with_catalog(config, catalog, http.clone()));
    let base = spawn(router(state)).await;

    Api {
        _dir: dir,
        base,
        http,
    }
}

#[tokio::test]
async fn health_reports_request_configuration() {
    let api = start().await;
    let health = api.get("/api/health").await;
    assert_eq!(health["success"], true);
    assert_eq!(health["data"]["status"], "ok");
    assert_eq!(health["data"]["skillRequestsConfigured"], false);
    assert!(health["data"]["catalogUrl"].is_string());
}

#[tokio::test]
async fn catalog_listing_reflects_installs() {
    let api = start().await;

    let before = api.get("/api/catalog/skills").await;
    assert_eq!(before["success"], true);
    assert_eq!(before["data"][0]["id"], "code-review");
    assert_eq!(before["data"][0]["installed"], false);

    let installed = api.post("/api/skills/install/code-review", json!({})).await;
    assert_eq!(installed["success"], true);
    assert_eq!(installed["data"]["isGlobal"], true);

    let after = api.get("/api/catalog/skills").await;
    assert_eq!(after["data"][0]["installed"], true);
    assert_eq!(after["data"][2]["installed"], false);

    let listed = api.get("/api/skills").await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failures_are_reported_in_band() {
    let api = start().await;

    let missing = api.delete("/api/skills/ghost").await;
    assert_eq!(missing["success"], false);
    assert_eq!(missing["error"], "Skill not found: ghost");

    let invalid = api.post("/api/skills/install/broken", json!({})).await;
    assert_eq!(invalid["success"], false);
    assert_eq!(invalid["error"], "Description is required");

    let request = api
        .post(
            "/api/skills/request",
            json!({
                "name": "Thing",
                "description": "Does things",
                "content": "---\nname: thing\ndescription: Does things\n---\n",
            }),
        )
        .await;
    assert_eq!(request["success"], false);
    assert!(request["error"].as_str().unwrap().contains("administrator"));
}

#[tokio::test]
async fn malformed_bodies_are_reported_in_band() {
    let api = start().await;

    let wrong_shape = api.put("/api/skills/x", r#"{"contents": 1}"#).await;
    assert_eq!(wrong_shape["success"], false);
    assert_eq!(wrong_shape["error"], "Invalid request body");
    assert!(wrong_shape["details"].is_string());

    let not_json = api.put("/api/agents/x", "{ nope").await;
    assert_eq!(not_json["success"], false);

    let validate = api.post("/api/validate/skill", json!({"text": "---"})).await;
    assert_eq!(validate["success"], false);

    let request = api.post("/api/skills/request", json!({"name": "Thing"})).await;
    assert_eq!(request["success"], false);
    assert_eq!(request["error"], "Invalid request body");

    api.post("/api/mcp/install/context7", json!({})).await;
    let toggle = api
        .post("/api/mcp/context7/toggle", json!({"enabled": "yes"}))
        .await;
    assert_eq!(toggle["success"], false);
    assert_eq!(api.get("/api/mcp/context7").await["data"]["enabled"], true);
}

#[tokio::test]
async fn skill_can_be_saved_from_a_document() {
    let api = start().await;
    let saved = api
        .put(
            "/api/skills/notes",
            &json!({
                "document": {
                    "metadata": {"name": "notes", "description": "1.2"},
                    "body": "Write things down."
                }
            })
            .to_string(),
        )
        .await;
    assert_eq!(saved["success"], true);
    assert_eq!(saved["data"]["description"], "1.2");
    // Quoted so YAML readers keep it a string.
    let content = saved["data"]["content"].as_str().unwrap();
    assert!(content.contains("description: "));
    assert!(!content.contains("description: 1.2\n"), "{content}");
}

#[tokio::test]
async fn mcp_toggle_accepts_explicit_state() {
    let api = start().await;
    api.post("/api/mcp/install/context7", json!({})).await;

    let off = api.post("/api/mcp/context7/toggle", json!({"enabled": false})).await;
    assert_eq!(off["data"]["enabled"], false);

    let flipped = api.post("/api/mcp/context7/toggle", json!({})).await;
    assert_eq!(flipped["data"]["enabled"], true);

    let catalog = api.get("/api/catalog/mcp").await;
    let context7 = catalog["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == "context7")
        .unwrap();
    assert_eq!(context7["installed"], true);
}

#[tokio::test]
async fn validation_endpoint_lists_every_issue() {
    let api = start().await;
    let report = api
        .post(
            "/api/validate/agent",
            json!({"content": "---\ndescription: ok\nmode: boss\nmodel: gpt4\n---\n"}),
        )
        .await;
    assert_eq!(report["data"]["valid"], false);
    let fields: Vec<_> = report["data"]["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["mode", "model"]);
}
