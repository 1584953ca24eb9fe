//! Catalog browsing endpoints. Entries are annotated with local install state.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Router,
};

use crate::catalog::{AgentCatalog, AgentEntry, McpCatalog, McpEntry, SkillCatalog, SkillEntry};
use crate::error::Result;
use crate::resources::{catalog_view, CatalogListing};

use super::routes::AppState;
use super::types::{ActionResult, RefreshQuery};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/skills", get(list_skills))
        .route("/agents", get(list_agents))
        .route("/mcp", get(list_mcp_servers))
        .route("/clear-cache", post(clear_cache))
}

async fn list_skills(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefreshQuery>,
) -> ActionResult<Vec<CatalogListing<SkillEntry>>> {
    skills_view(&state, query.refresh).await.into()
}

async fn skills_view(state: &AppState, refresh: bool) -> Result<Vec<CatalogListing<SkillEntry>>> {
    let entries = state.catalog.fetch_skills(refresh).await?;
    let installed = state.skills.installed_ids().await?;
    Ok(catalog_view::<SkillCatalog>(entries, &installed))
}

async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefreshQuery>,
) -> ActionResult<Vec<CatalogListing<AgentEntry>>> {
    agents_view(&state, query.refresh).await.into()
}

async fn agents_view(state: &AppState, refresh: bool) -> Result<Vec<CatalogListing<AgentEntry>>> {
    let entries = state.catalog.fetch_agents(refresh).await?;
    let installed = state.agents.installed_ids().await?;
    Ok(catalog_view::<AgentCatalog>(entries, &installed))
}

async fn list_mcp_servers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefreshQuery>,
) -> ActionResult<Vec<CatalogListing<McpEntry>>> {
    mcp_view(&state, query.refresh).await.into()
}

async fn mcp_view(state: &AppState, refresh: bool) -> Result<Vec<CatalogListing<McpEntry>>> {
    let entries = state.catalog.fetch_mcp_servers(refresh).await?;
    let installed = state.mcp.installed_ids().await?;
    Ok(catalog_view::<McpCatalog>(entries, &installed))
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> ActionResult<()> {
    state.catalog.clear_cache().await;
    ActionResult::ok(())
}
