//! Installed skill endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};

use crate::github::{SkillRequest, SkillRequestPr};
use crate::resources::InstalledSkill;

use super::routes::AppState;
use super::types::{ActionResult, JsonBody, SaveRequest, SaveSkillRequest};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_skills))
        .route("/request", post(submit_request))
        .route("/install/:id", post(install_skill))
        .route(
            "/:name",
            get(get_skill).put(save_skill).delete(remove_skill),
        )
}

async fn list_skills(State(state): State<Arc<AppState>>) -> ActionResult<Vec<InstalledSkill>> {
    state.skills.list().await.into()
}

async fn get_skill(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ActionResult<InstalledSkill> {
    state.skills.get(&name).await.into()
}

async fn save_skill(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    JsonBody(req): JsonBody<SaveSkillRequest>,
) -> ActionResult<InstalledSkill> {
    match req {
        SaveRequest::Content { content } => state.skills.save(&name, &content).await,
        SaveRequest::Document { document } => state.skills.save_document(&name, &document).await,
    }
    .into()
}

async fn remove_skill(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ActionResult<()> {
    state.skills.remove(&name).await.into()
}

async fn install_skill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ActionResult<InstalledSkill> {
    state.skills.install_from_catalog(&id).await.into()
}

async fn submit_request(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SkillRequest>,
) -> ActionResult<SkillRequestPr> {
    state.skills.submit_request(&req).await.into()
}
