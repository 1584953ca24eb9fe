//! Installed agents: flat `<name>.md` files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::fs;

use super::ensure_valid;
use crate::catalog::CatalogClient;
use crate::error::{ManagerError, ResourceKind, Result};
use crate::frontmatter::{
    parse_agent, validate_agent, AgentDocument, AgentMetadata, AgentMode, ValidationIssue,
};
use crate::slug::{is_valid_slug, validate_slug};

const AGENT_EXTENSION: &str = "md";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledAgent {
    /// File stem; the agent's identity.
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<AgentMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub path: PathBuf,
    pub is_global: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl InstalledAgent {
    fn from_metadata(name: &str, metadata: AgentMetadata, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            description: metadata.description,
            mode: metadata.mode,
            model: metadata.model,
            temperature: metadata.temperature,
            path,
            is_global: true,
            content: None,
        }
    }
}

pub struct AgentManager {
    root: PathBuf,
    catalog: Arc<CatalogClient>,
}

impl AgentManager {
    pub fn new(root: impl Into<PathBuf>, catalog: Arc<CatalogClient>) -> Self {
        Self {
            root: root.into(),
            catalog,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn agent_file(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, AGENT_EXTENSION))
    }

    pub async fn install_from_catalog(&self, id: &str) -> Result<InstalledAgent> {
        validate_slug(id)?;
        let content = self.catalog.fetch_agent_content(id).await?;
        let agent = self.write_validated(id, content).await?;
        tracing::info!(agent = %id, path = %agent.path.display(), "Installed agent from catalog");
        Ok(agent)
    }

    pub async fn save(&self, name: &str, content: &str) -> Result<InstalledAgent> {
        validate_slug(name)?;
        let agent = self.write_validated(name, content.to_string()).await?;
        tracing::info!(agent = %name, "Saved agent");
        Ok(agent)
    }

    pub async fn save_document(&self, name: &str, document: &AgentDocument) -> Result<InstalledAgent> {
        validate_slug(name)?;
        let content = document.to_markdown()?;
        let agent = self.write_validated(name, content).await?;
        tracing::info!(agent = %name, "Saved agent document");
        Ok(agent)
    }

    async fn write_validated(&self, name: &str, content: String) -> Result<InstalledAgent> {
        ensure_valid(validate_agent(&content))?;
        let metadata = parse(&content, name)?;

        let path = self.agent_file(name);
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, &content).await?;

        let mut agent = InstalledAgent::from_metadata(name, metadata, path);
        agent.content = Some(content);
        Ok(agent)
    }

    pub async fn list(&self) -> Result<Vec<InstalledAgent>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut agents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(AGENT_EXTENSION) {
                continue;
            }
            match entry.file_type().await {
                Ok(kind) if kind.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(entry = ?path, error = %e, "Skipping unreadable agent entry");
                    continue;
                }
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if !is_valid_slug(&name) {
                continue;
            }

            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(agent = %name, error = %e, "Failed to read agent");
                    continue;
                }
            };
            match parse_agent(&content, &name) {
                Some(metadata) => agents.push(InstalledAgent::from_metadata(&name, metadata, path)),
                None => tracing::warn!(agent = %name, "Skipping agent with invalid frontmatter"),
            }
        }

        agents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(agents)
    }

    pub async fn get(&self, name: &str) -> Result<InstalledAgent> {
        let content = self
            .get_content(name)
            .await?
            .ok_or_else(|| ManagerError::not_found(ResourceKind::Agent, name))?;
        let metadata = parse(&content, name)?;
        let mut agent = InstalledAgent::from_metadata(name, metadata, self.agent_file(name));
        agent.content = Some(content);
        Ok(agent)
    }

    pub async fn get_content(&self, name: &str) -> Result<Option<String>> {
        validate_slug(name)?;
        match fs::read_to_string(self.agent_file(name)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        validate_slug(name)?;
        let path = self.agent_file(name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ManagerError::not_found(ResourceKind::Agent, name)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManagerError::not_found(ResourceKind::Agent, name))
            }
            Err(e) => return Err(e.into()),
        }
        fs::remove_file(&path).await?;
        tracing::info!(agent = %name, "Removed agent");
        Ok(())
    }

    pub async fn installed_ids(&self) -> Result<HashSet<String>> {
        Ok(self.list().await?.into_iter().map(|a| a.name).collect())
    }
}

fn parse(content: &str, name: &str) -> Result<AgentMetadata> {
    parse_agent(content, name).ok_or_else(|| {
        ValidationIssue::new("frontmatter", "Missing or invalid frontmatter block").into()
    })
}
