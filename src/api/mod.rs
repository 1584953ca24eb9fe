//! HTTP API for OpenCode Manager.
//!
//! Every endpoint answers `200` with an [`ActionResult`] envelope, including
//! requests whose JSON body cannot be parsed. Save endpoints take either
//! `{"content": "..."}` or `{"document": {"metadata": {...}, "body": "..."}}`.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/catalog/{skills,agents,mcp}?refresh=bool` - Catalog with install state
//! - `POST /api/catalog/clear-cache` - Drop cached catalogs
//! - `GET /api/skills` - List installed skills
//! - `GET|PUT|DELETE /api/skills/{name}` - Read, save or remove a skill
//! - `POST /api/skills/install/{id}` - Install a skill from the catalog
//! - `POST /api/skills/request` - Submit a skill to the catalog as a pull request
//! - `GET /api/agents` - List installed agents
//! - `GET|PUT|DELETE /api/agents/{name}` - Read, save or remove an agent
//! - `POST /api/agents/install/{id}` - Install an agent from the catalog
//! - `GET /api/mcp` - List configured MCP servers
//! - `GET|DELETE /api/mcp/{id}` - Read or remove an MCP server
//! - `POST /api/mcp/install/{id}` - Add a catalog MCP server to `opencode.json`
//! - `POST /api/mcp/{id}/toggle` - Enable/disable an MCP server
//! - `POST /api/mcp/{id}/test` - Check that an MCP server is reachable
//! - `POST /api/validate/{skill,agent}` - Validate a document

mod agents;
mod catalog;
mod mcp;
mod routes;
mod skills;
pub mod types;
mod validate;

pub use routes::{router, serve, AppState};
pub use types::*;
