//! Skill-request pull request workflow.
//!
//! Submitting a skill creates a uniquely named branch in the catalog repo,
//! commits `skills/<slug>/SKILL.md`, appends an entry to `skills.json` on that
//! branch and opens a pull request against the base branch. Steps run strictly
//! in order; the first non-2xx response aborts the run. Nothing is rolled
//! back: an abandoned `skill-request/*` branch is harmless.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::app_auth::GitHubAppAuth;
use crate::error::{ManagerError, Result, WorkflowStep};
use crate::slug::{slugify, validate_slug};
use crate::util::truncate_with_ellipsis;

pub const CATALOG_INDEX_PATH: &str = "skills.json";
const BRANCH_PREFIX: &str = "skill-request";
const ENTRY_NAME_MAX: usize = 64;
const ENTRY_DESCRIPTION_MAX: usize = 200;

/// Repository that hosts the catalog.
#[derive(Debug, Clone)]
pub struct CatalogRepo {
    pub owner: String,
    pub name: String,
    pub base_branch: String,
}

impl CatalogRepo {
    fn api_path(&self, rest: &str) -> String {
        format!("repos/{}/{}/{}", self.owner, self.name, rest)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    pub name: String,
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// State of one completed submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequestPr {
    pub branch: String,
    pub base_sha: String,
    pub pr_url: String,
}

pub struct SkillRequestWorkflow {
    auth: Arc<GitHubAppAuth>,
    repo: CatalogRepo,
}

impl SkillRequestWorkflow {
    pub fn new(auth: Arc<GitHubAppAuth>, repo: CatalogRepo) -> Self {
        Self { auth, repo }
    }

    pub fn is_configured(&self) -> bool {
        self.auth.is_configured()
    }

    pub async fn create_skill_request_pr(&self, request: &SkillRequest) -> Result<SkillRequestPr> {
        let slug = slugify(&request.name);
        validate_slug(&slug).map_err(|_| ManagerError::InvalidIdentifier(request.name.clone()))?;
        // Surface configuration problems before the first request goes out.
        self.auth.installation_token().await?;

        let skill_path = format!("skills/{}/SKILL.md", slug);
        let branch = format!(
            "{}/{}-{}",
            BRANCH_PREFIX,
            slug,
            Utc::now().timestamp_millis()
        );
        tracing::info!(skill = %slug, branch = %branch, "Submitting skill request");

        // 1. Base branch head.
        let base_ref = self
            .call(
                WorkflowStep::ReadBaseRef,
                Method::GET,
                &self
                    .repo
                    .api_path(&format!("git/ref/heads/{}", self.repo.base_branch)),
                None,
            )
            .await?;
        let base_sha = string_at(&base_ref, &["object", "sha"], WorkflowStep::ReadBaseRef)?;

        // 2. Request branch.
        self.call(
            WorkflowStep::CreateBranch,
            Method::POST,
            &self.repo.api_path("git/refs"),
            Some(&json!({
                "ref": format!("refs/heads/{}", branch),
                "sha": base_sha,
            })),
        )
        .await?;

        // 3. Skill document.
        self.call(
            WorkflowStep::CreateSkillFile,
            Method::PUT,
            &self.repo.api_path(&format!("contents/{}", skill_path)),
            Some(&json!({
                "message": format!("Add skill request: {}", request.name),
                "content": BASE64.encode(request.content.as_bytes()),
                "branch": branch,
            })),
        )
        .await?;

        // 4. Catalog index, read and written on the request branch.
        let index_path = self
            .repo
            .api_path(&format!("contents/{}?ref={}", CATALOG_INDEX_PATH, branch));
        let index_file = self
            .call(WorkflowStep::ReadCatalogIndex, Method::GET, &index_path, None)
            .await?;
        let index_sha = string_at(&index_file, &["sha"], WorkflowStep::ReadCatalogIndex)?;
        let encoded = string_at(&index_file, &["content"], WorkflowStep::ReadCatalogIndex)?;
        let mut index = decode_index(&encoded)?;
        append_catalog_entry(&mut index, &slug, request, &skill_path)?;

        let updated = serde_json::to_string_pretty(&index)?;
        self.call(
            WorkflowStep::WriteCatalogIndex,
            Method::PUT,
            &self
                .repo
                .api_path(&format!("contents/{}", CATALOG_INDEX_PATH)),
            Some(&json!({
                "message": format!("Add {} to catalog index", slug),
                "content": BASE64.encode(updated.as_bytes()),
                "sha": index_sha,
                "branch": branch,
            })),
        )
        .await?;

        // 5. Pull request.
        let pr = self
            .call(
                WorkflowStep::OpenPullRequest,
                Method::POST,
                &self.repo.api_path("pulls"),
                Some(&json!({
                    "title": format!("Skill request: {}", request.name),
                    "body": pull_request_body(request),
                    "head": branch,
                    "base": self.repo.base_branch,
                })),
            )
            .await?;
        let pr_url = string_at(&pr, &["html_url"], WorkflowStep::OpenPullRequest)?;

        tracing::info!(skill = %slug, pr = %pr_url, "Skill request pull request opened");
        Ok(SkillRequestPr {
            branch,
            base_sha,
            pr_url,
        })
    }

    async fn call(
        &self,
        step: WorkflowStep,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let response = self.auth.request(method, path, body).await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(step = %step, status = status.as_u16(), "Skill request step failed");
            return Err(ManagerError::WorkflowStep {
                step,
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn string_at(value: &Value, path: &[&str], step: WorkflowStep) -> Result<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ManagerError::remote(format!(
                "{}: response is missing '{}'",
                step,
                path.join(".")
            ))
        })
}

/// GitHub wraps base64 content at 60 columns.
fn decode_index(encoded: &str) -> Result<Value> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| ManagerError::remote(format!("Catalog index is not valid base64: {}", e)))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn append_catalog_entry(
    index: &mut Value,
    slug: &str,
    request: &SkillRequest,
    skill_path: &str,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let root = index
        .as_object_mut()
        .ok_or_else(|| ManagerError::remote("Catalog index is not a JSON object"))?;

    let skills = root
        .entry("skills")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| ManagerError::remote("Catalog index 'skills' is not an array"))?;
    skills.push(json!({
        "id": slug,
        "name": truncate_with_ellipsis(&request.name, ENTRY_NAME_MAX),
        "description": truncate_with_ellipsis(&request.description, ENTRY_DESCRIPTION_MAX),
        "category": "Requested",
        "tags": ["requested"],
        "path": skill_path,
        "author": "Skill Request",
        "version": "1.0.0",
        "updatedAt": now,
    }));
    root.insert("lastUpdated".to_string(), Value::String(now));
    Ok(())
}

fn pull_request_body(request: &SkillRequest) -> String {
    let source = request
        .source_url
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Not provided");
    format!(
        "## Skill request\n\n\
         **Source:** {}\n\n\
         **Description:**\n{}\n\n\
         ---\n\
         Please review the skill content before merging. \
         Check that the instructions are safe, accurate and attributed.",
        source, request.description
    )
}
