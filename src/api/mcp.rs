//! MCP server endpoints backed by the `mcp` map of `opencode.json`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::resources::{ConnectionStatus, InstalledMcpServer};

use super::routes::AppState;
use super::types::{reject_body, ActionResult, ToggleRequest};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_mcp_servers))
        .route("/install/:id", post(install_mcp_server))
        .route("/:id", get(get_mcp_server).delete(remove_mcp_server))
        .route("/:id/toggle", post(toggle_mcp_server))
        .route("/:id/test", post(test_mcp_server))
}

async fn list_mcp_servers(
    State(state): State<Arc<AppState>>,
) -> ActionResult<Vec<InstalledMcpServer>> {
    state.mcp.list().await.into()
}

async fn get_mcp_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ActionResult<InstalledMcpServer> {
    state.mcp.get(&id).await.into()
}

async fn remove_mcp_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ActionResult<()> {
    state.mcp.remove(&id).await.into()
}

async fn install_mcp_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ActionResult<InstalledMcpServer> {
    state.mcp.install_from_catalog(&id).await.into()
}

/// Set `enabled` explicitly, or flip it when the body omits it.
async fn toggle_mcp_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> ActionResult<InstalledMcpServer> {
    let enabled = match body {
        Ok(Json(req)) => req.enabled,
        // No body at all.
        Err(JsonRejection::MissingJsonContentType(_)) => None,
        Err(rejection) => return reject_body(rejection),
    };
    let result = match enabled {
        Some(enabled) => state.mcp.set_enabled(&id, enabled).await,
        None => state.mcp.toggle_enabled(&id).await,
    };
    result.into()
}

async fn test_mcp_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ActionResult<ConnectionStatus> {
    state.mcp.test_connection(&id).await.into()
}
