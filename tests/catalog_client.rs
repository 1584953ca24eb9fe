mod common;

use std::time::Duration;

use axum::http::Method;
use common::{script_catalog, MockServer};
use opencode_manager::catalog::CatalogClient;
use opencode_manager::ManagerError;

async fn setup() -> (MockServer, String) {
    let mock = MockServer::new();
    let base = mock.start().await;
    script_catalog(&mock, &base);
    (mock, base)
}

#[tokio::test]
async fn fresh_cache_skips_the_network() {
    let (mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new());

    let first = client.fetch_skills(false).await.unwrap();
    let second = client.fetch_skills(false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(mock.hits(Method::GET, "/skills.json"), 1);
}

#[tokio::test]
async fn force_refresh_refetches() {
    let (mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new());

    client.fetch_skills(false).await.unwrap();
    client.fetch_skills(true).await.unwrap();

    assert_eq!(mock.hits(Method::GET, "/skills.json"), 2);
}

#[tokio::test]
async fn failed_refresh_serves_stale_snapshot() {
    let (mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new()).with_cache_ttl(Duration::ZERO);

    let first = client.fetch_skills(false).await.unwrap();
    mock.get("/skills.json", 500, "upstream exploded");
    let second = client.fetch_skills(false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.hits(Method::GET, "/skills.json"), 2);
}

#[tokio::test]
async fn malformed_refresh_serves_stale_snapshot() {
    let (mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new());

    client.fetch_agents(false).await.unwrap();
    mock.get("/agents.json", 200, "{ not json");
    let agents = client.fetch_agents(true).await.unwrap();

    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].id, "reviewer");
}

#[tokio::test]
async fn failure_without_snapshot_is_an_error() {
    let (mock, base) = setup().await;
    mock.get("/skills.json", 503, "maintenance");
    let client = CatalogClient::new(&base, reqwest::Client::new());

    let err = client.fetch_skills(false).await.unwrap_err();
    match err {
        ManagerError::RemoteFetch { status, body, .. } => {
            assert_eq!(status, Some(503));
            assert_eq!(body.as_deref(), Some("maintenance"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_without_snapshot_is_an_error() {
    // Nothing listens on the discard port.
    let client = CatalogClient::new("http://127.0.0.1:9", reqwest::Client::new());
    let err = client.fetch_mcp_servers(false).await.unwrap_err();
    assert!(matches!(err, ManagerError::RemoteFetch { .. }));
}

#[tokio::test]
async fn kinds_are_cached_independently() {
    let (mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new());

    client.fetch_skills(false).await.unwrap();
    assert_eq!(mock.hits(Method::GET, "/agents.json"), 0);

    client.fetch_agents(false).await.unwrap();
    client.fetch_mcp_servers(false).await.unwrap();
    client.fetch_skills(false).await.unwrap();

    assert_eq!(mock.hits(Method::GET, "/skills.json"), 1);
    assert_eq!(mock.hits(Method::GET, "/agents.json"), 1);
    assert_eq!(mock.hits(Method::GET, "/mcp-servers.json"), 1);
}

#[tokio::test]
async fn clear_cache_forces_refetch() {
    let (mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new());

    client.fetch_skills(false).await.unwrap();
    client.clear_cache().await;
    client.fetch_skills(false).await.unwrap();

    assert_eq!(mock.hits(Method::GET, "/skills.json"), 2);
}

#[tokio::test]
async fn fetches_skill_content_by_catalog_path() {
    let (_mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new());

    let content = client.fetch_skill_content("code-review").await.unwrap();
    assert!(content.starts_with("---\nname: code-review"));
}

#[tokio::test]
async fn unknown_content_id_is_not_found_without_fetching() {
    let (mock, base) = setup().await;
    let client = CatalogClient::new(&base, reqwest::Client::new());

    let err = client.fetch_agent_content("ghost").await.unwrap_err();
    assert!(err.is_not_found());
    // Only the catalog itself was requested.
    assert_eq!(mock.total_hits(), 1);
}

#[tokio::test]
async fn missing_content_file_reports_status() {
    let (mock, base) = setup().await;
    mock.get("/skills/pdf/SKILL.md", 404, "gone");
    let client = CatalogClient::new(&base, reqwest::Client::new());

    let err = client.fetch_skill_content("pdf").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.details().as_deref(), Some("gone"));
}
