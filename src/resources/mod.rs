//! Local resource stores reconciled against the remote catalog.
//!
//! - [`SkillManager`]: `<skills_dir>/<name>/SKILL.md`
//! - [`AgentManager`]: `<agents_dir>/<name>.md`
//! - [`McpManager`]: the `mcp` map of `opencode.json`
//!
//! Every identifier is checked with [`crate::slug::validate_slug`] before a
//! path or config key is derived from it.

pub mod agents;
pub mod mcp;
pub mod skills;

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::CatalogKind;
use crate::error::Result;
use crate::frontmatter::ValidationIssue;

pub use agents::{AgentManager, InstalledAgent};
pub use mcp::{ConnectionStatus, InstalledMcpServer, McpManager};
pub use skills::{InstalledSkill, SkillManager};

/// A catalog entry annotated with whether it is installed locally.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing<E> {
    #[serde(flatten)]
    pub entry: E,
    pub installed: bool,
}

/// Annotate catalog entries of one kind with local install state, keeping
/// catalog order.
pub fn catalog_view<K: CatalogKind>(
    entries: Vec<K::Entry>,
    installed: &HashSet<String>,
) -> Vec<CatalogListing<K::Entry>> {
    entries
        .into_iter()
        .map(|entry| {
            let installed = installed.contains(K::entry_id(&entry));
            CatalogListing { entry, installed }
        })
        .collect()
}

/// Fail with the first issue as the headline.
pub(crate) fn ensure_valid(issues: Vec<ValidationIssue>) -> Result<()> {
    match issues.into_iter().next() {
        Some(issue) => Err(issue.into()),
        None => Ok(()),
    }
}
