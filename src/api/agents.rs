//! Installed agent endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};

use crate::resources::InstalledAgent;

use super::routes::AppState;
use super::types::{ActionResult, JsonBody, SaveRequest, SaveAgentRequest};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_agents))
        .route("/install/:id", post(install_agent))
        .route(
            "/:name",
            get(get_agent).put(save_agent).delete(remove_agent),
        )
}

async fn list_agents(State(state): State<Arc<AppState>>) -> ActionResult<Vec<InstalledAgent>> {
    state.agents.list().await.into()
}

async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ActionResult<InstalledAgent> {
    state.agents.get(&name).await.into()
}

async fn save_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    JsonBody(req): JsonBody<SaveAgentRequest>,
) -> ActionResult<InstalledAgent> {
    match req {
        SaveRequest::Content { content } => state.agents.save(&name, &content).await,
        SaveRequest::Document { document } => state.agents.save_document(&name, &document).await,
    }
    .into()
}

async fn remove_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ActionResult<()> {
    state.agents.remove(&name).await.into()
}

async fn install_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ActionResult<InstalledAgent> {
    state.agents.install_from_catalog(&id).await.into()
}
