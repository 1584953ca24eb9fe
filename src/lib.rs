//! # OpenCode Manager
//!
//! Installs, edits and removes OpenCode resources (skills, agents and MCP
//! servers) from a remote catalog, and submits new skills back to the
//! catalog as GitHub pull requests.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP API (api)
//!        │
//!        ▼
//!   Resource managers (resources) ──► local stores
//!        │           │                 skill/<name>/SKILL.md
//!        │           │                 agent/<name>.md
//!        │           │                 opencode.json `mcp`
//!        ▼           ▼
//!   CatalogClient   SkillRequestWorkflow
//!   (catalog)       (github::pull_request)
//!                        │
//!                        ▼
//!                   GitHubAppAuth (github::app_auth)
//! ```
//!
//! ## Modules
//! - `frontmatter`: metadata block parsing and validation
//! - `catalog`: cached catalog fetches with stale fallback
//! - `github`: App JWT auth and the skill-request pull request
//! - `resources`: skill, agent and MCP managers
//! - `opencode_config`: read-modify-write of `opencode.json`

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod github;
pub mod opencode_config;
pub mod resources;
pub mod slug;
pub mod util;

pub use config::Config;
pub use error::{ManagerError, Result};
