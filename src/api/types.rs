//! API request and response types.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Json, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ManagerError;
use crate::frontmatter::{AgentDocument, SkillDocument, ValidationIssue};

/// Envelope for every API response.
///
/// Failures are reported in-band (`success: false`) with HTTP 200 so the UI
/// never has to distinguish transport errors from domain errors.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Short, user-facing message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Diagnostic text (HTTP bodies, decoder output)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn failed(err: &ManagerError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.headline()),
            details: err.details(),
        }
    }
}

impl<T> From<Result<T, ManagerError>> for ActionResult<T> {
    fn from(result: Result<T, ManagerError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                tracing::debug!(error = %err, status = ?err.status(), "Action failed");
                Self::failed(&err)
            }
        }
    }
}

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// JSON request body. A body that fails to parse is answered with a failed
/// envelope instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ActionResult<()>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(reject_body(rejection)),
        }
    }
}

pub(super) fn reject_body<T>(rejection: JsonRejection) -> ActionResult<T> {
    tracing::debug!(status = %rejection.status(), "Rejected request body");
    ActionResult {
        success: false,
        data: None,
        error: Some("Invalid request body".to_string()),
        details: Some(rejection.body_text()),
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether skill requests can be submitted
    pub skill_requests_configured: bool,

    pub catalog_url: String,
}

/// `?refresh=true` bypasses the catalog cache.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub refresh: bool,
}

/// Body carrying a full document.
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// Body of a save: raw markdown, or structured metadata plus body that is
/// rendered to markdown before writing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SaveRequest<D> {
    Content { content: String },
    Document { document: D },
}

pub type SaveSkillRequest = SaveRequest<SkillDocument>;
pub type SaveAgentRequest = SaveRequest<AgentDocument>;

/// Body for the MCP toggle endpoint. Without `enabled` the flag is flipped.
#[derive(Debug, Default, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl From<Vec<ValidationIssue>> for ValidationReport {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}
