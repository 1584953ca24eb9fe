//! GitHub integration: App authentication and the skill-request pull request.

pub mod app_auth;
pub mod pull_request;

pub use app_auth::{GitHubAppAuth, GitHubAppConfig, InstallationToken, DEFAULT_API_URL};
pub use pull_request::{CatalogRepo, SkillRequest, SkillRequestPr, SkillRequestWorkflow};
