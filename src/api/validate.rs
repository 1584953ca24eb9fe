//! Document validation without writing anything.

use std::sync::Arc;

use axum::{routing::post, Router};

use crate::frontmatter::{validate_agent, validate_skill};

use super::routes::AppState;
use super::types::{ActionResult, ContentRequest, JsonBody, ValidationReport};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/skill", post(validate_skill_document))
        .route("/agent", post(validate_agent_document))
}

async fn validate_skill_document(JsonBody(req): JsonBody<ContentRequest>) -> ActionResult<ValidationReport> {
    ActionResult::ok(validate_skill(&req.content).into())
}

async fn validate_agent_document(JsonBody(req): JsonBody<ContentRequest>) -> ActionResult<ValidationReport> {
    ActionResult::ok(validate_agent(&req.content).into())
}
