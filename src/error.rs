//! Error taxonomy shared by the catalog client, the GitHub workflow and the
//! resource managers.
//!
//! Every variant renders a short headline through `Display`. Diagnostic text
//! (HTTP bodies, decoder output) is kept apart in [`ManagerError::details`] so
//! the UI can offer it as optional disclosure.

use std::fmt;

use thiserror::Error;

use crate::frontmatter::ValidationIssue;

/// Kind of resource an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Skill,
    Agent,
    McpServer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Skill => write!(f, "Skill"),
            ResourceKind::Agent => write!(f, "Agent"),
            ResourceKind::McpServer => write!(f, "MCP server"),
        }
    }
}

/// Steps of the skill-request pull request workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    ReadBaseRef,
    CreateBranch,
    CreateSkillFile,
    ReadCatalogIndex,
    WriteCatalogIndex,
    OpenPullRequest,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowStep::ReadBaseRef => "Reading the base branch",
            WorkflowStep::CreateBranch => "Creating the request branch",
            WorkflowStep::CreateSkillFile => "Creating the skill file",
            WorkflowStep::ReadCatalogIndex => "Reading the catalog index",
            WorkflowStep::WriteCatalogIndex => "Updating the catalog index",
            WorkflowStep::OpenPullRequest => "Opening the pull request",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum ManagerError {
    /// Malformed or missing metadata. The message is shown verbatim.
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    /// Identifier failed the slug check. Raised before any path is built.
    #[error("Invalid identifier '{0}': use lowercase letters, digits and single hyphens")]
    InvalidIdentifier(String),

    #[error("{message}")]
    RemoteFetch {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    #[error("{0}")]
    AuthConfiguration(String),

    #[error("{step} failed (HTTP {status})")]
    WorkflowStep {
        step: WorkflowStep,
        status: u16,
        body: String,
    },

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ManagerError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        ManagerError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        ManagerError::RemoteFetch {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Short user-facing message.
    pub fn headline(&self) -> String {
        self.to_string()
    }

    /// Diagnostic text kept out of the headline.
    pub fn details(&self) -> Option<String> {
        match self {
            ManagerError::RemoteFetch { body, .. } => body.clone().filter(|b| !b.is_empty()),
            ManagerError::WorkflowStep { body, .. } if !body.is_empty() => Some(body.clone()),
            ManagerError::Validation { field, .. } => Some(format!("field: {}", field)),
            _ => None,
        }
    }

    /// HTTP status of the failing remote call, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ManagerError::RemoteFetch { status, .. } => *status,
            ManagerError::WorkflowStep { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ManagerError::NotFound { .. })
    }
}

impl From<ValidationIssue> for ManagerError {
    fn from(issue: ValidationIssue) -> Self {
        ManagerError::Validation {
            field: issue.field,
            message: issue.message,
        }
    }
}

impl From<reqwest::Error> for ManagerError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timed out".to_string()
        } else if err.is_decode() {
            format!("Unexpected response format: {}", err)
        } else {
            format!("Network error: {}", err)
        };
        ManagerError::RemoteFetch {
            message,
            status: err.status().map(|s| s.as_u16()),
            body: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
