//! Installed skills: one directory per skill holding `SKILL.md`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::fs;

use super::ensure_valid;
use crate::catalog::CatalogClient;
use crate::error::{ManagerError, ResourceKind, Result};
use crate::frontmatter::{parse_skill, validate_skill, SkillDocument, SkillMetadata, ValidationIssue};
use crate::github::{SkillRequest, SkillRequestPr, SkillRequestWorkflow};
use crate::slug::{is_valid_slug, validate_slug};

pub const SKILL_FILE: &str = "SKILL.md";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSkill {
    /// Directory name; the skill's identity.
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    pub path: PathBuf,
    pub is_global: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl InstalledSkill {
    fn from_metadata(name: &str, metadata: SkillMetadata, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            description: metadata.description,
            metadata: metadata.metadata,
            path,
            is_global: true,
            content: None,
        }
    }

    fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }
}

pub struct SkillManager {
    root: PathBuf,
    catalog: Arc<CatalogClient>,
    requests: SkillRequestWorkflow,
}

impl SkillManager {
    pub fn new(
        root: impl Into<PathBuf>,
        catalog: Arc<CatalogClient>,
        requests: SkillRequestWorkflow,
    ) -> Self {
        Self {
            root: root.into(),
            catalog,
            requests,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn skill_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn skill_file(&self, name: &str) -> PathBuf {
        self.skill_dir(name).join(SKILL_FILE)
    }

    /// Download a catalog skill, validate it and write it verbatim.
    pub async fn install_from_catalog(&self, id: &str) -> Result<InstalledSkill> {
        validate_slug(id)?;
        let content = self.catalog.fetch_skill_content(id).await?;
        let skill = self.write_validated(id, content).await?;
        tracing::info!(skill = %id, path = %skill.path.display(), "Installed skill from catalog");
        Ok(skill)
    }

    /// Create or overwrite a skill from user-authored content.
    pub async fn save(&self, name: &str, content: &str) -> Result<InstalledSkill> {
        validate_slug(name)?;
        let skill = self.write_validated(name, content.to_string()).await?;
        tracing::info!(skill = %name, "Saved skill");
        Ok(skill)
    }

    /// Render a structured document and save it under `name`.
    pub async fn save_document(&self, name: &str, document: &SkillDocument) -> Result<InstalledSkill> {
        validate_slug(name)?;
        let content = document.to_markdown()?;
        let skill = self.write_validated(name, content).await?;
        tracing::info!(skill = %name, "Saved skill document");
        Ok(skill)
    }

    async fn write_validated(&self, name: &str, content: String) -> Result<InstalledSkill> {
        ensure_valid(validate_skill(&content))?;
        let metadata = parse(&content, name)?;

        let path = self.skill_file(name);
        fs::create_dir_all(self.skill_dir(name)).await?;
        fs::write(&path, &content).await?;

        Ok(InstalledSkill::from_metadata(name, metadata, path).with_content(content))
    }

    /// All parseable skills, sorted by name. Directories without a valid
    /// `SKILL.md` are skipped.
    pub async fn list(&self) -> Result<Vec<InstalledSkill>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut skills = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            match entry.file_type().await {
                Ok(kind) if kind.is_dir() => {}
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(entry = ?entry.path(), error = %e, "Skipping unreadable skill entry");
                    continue;
                }
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_valid_slug(&name) {
                tracing::debug!(dir = %name, "Skipping skill directory with invalid name");
                continue;
            }

            let path = entry.path().join(SKILL_FILE);
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(skill = %name, error = %e, "Failed to read skill");
                    continue;
                }
            };
            match parse_skill(&content, &name) {
                Some(metadata) => skills.push(InstalledSkill::from_metadata(&name, metadata, path)),
                None => tracing::warn!(skill = %name, "Skipping skill with invalid frontmatter"),
            }
        }

        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    /// A single skill including its content.
    pub async fn get(&self, name: &str) -> Result<InstalledSkill> {
        let content = self
            .get_content(name)
            .await?
            .ok_or_else(|| ManagerError::not_found(ResourceKind::Skill, name))?;
        let metadata = parse(&content, name)?;
        Ok(InstalledSkill::from_metadata(name, metadata, self.skill_file(name)).with_content(content))
    }

    /// Raw `SKILL.md`, or `None` when the skill is not installed.
    pub async fn get_content(&self, name: &str) -> Result<Option<String>> {
        validate_slug(name)?;
        match fs::read_to_string(self.skill_file(name)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the skill directory. A directory without `SKILL.md` is not a
    /// skill and is left alone.
    pub async fn remove(&self, name: &str) -> Result<()> {
        validate_slug(name)?;
        match fs::metadata(self.skill_file(name)).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ManagerError::not_found(ResourceKind::Skill, name)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManagerError::not_found(ResourceKind::Skill, name))
            }
            Err(e) => return Err(e.into()),
        }
        fs::remove_dir_all(self.skill_dir(name)).await?;
        tracing::info!(skill = %name, "Removed skill");
        Ok(())
    }

    /// Names of installed skills, for catalog reconciliation.
    pub async fn installed_ids(&self) -> Result<HashSet<String>> {
        Ok(self.list().await?.into_iter().map(|s| s.name).collect())
    }

    /// Validate the submitted document, then open a catalog pull request.
    pub async fn submit_request(&self, request: &SkillRequest) -> Result<SkillRequestPr> {
        if request.name.trim().is_empty() {
            return Err(ValidationIssue::new("name", "Name is required").into());
        }
        if request.description.trim().is_empty() {
            return Err(ValidationIssue::new("description", "Description is required").into());
        }
        ensure_valid(validate_skill(&request.content))?;
        self.requests.create_skill_request_pr(request).await
    }
}

fn parse(content: &str, name: &str) -> Result<SkillMetadata> {
    parse_skill(content, name).ok_or_else(|| {
        ValidationIssue::new("frontmatter", "Missing or invalid frontmatter block").into()
    })
}
