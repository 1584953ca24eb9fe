//! Configuration management for OpenCode Manager.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `4545`.
//! - `OPENCODE_CONFIG` - Optional. Path of `opencode.json`.
//! - `OPENCODE_CONFIG_DIR` - Optional. OpenCode config directory. Defaults to `~/.config/opencode`.
//! - `OPENCODE_SKILLS_DIR` - Optional. Skill store. Defaults to `<config dir>/skill`.
//! - `OPENCODE_AGENTS_DIR` - Optional. Agent store. Defaults to `<config dir>/agent`.
//! - `OPENCODE_CATALOG_URL` - Optional. Catalog base URL.
//! - `GITHUB_API_URL` - Optional. Defaults to `https://api.github.com`.
//! - `GITHUB_APP_ID` - Optional. GitHub App id used for skill requests.
//! - `GITHUB_APP_PRIVATE_KEY` - Optional. PEM text (`\n` escapes allowed).
//! - `GITHUB_APP_PRIVATE_KEY_PATH` - Optional. Read the PEM from a file instead.
//! - `GITHUB_APP_INSTALLATION_ID` - Optional. Installation on the catalog repo.
//! - `CATALOG_REPO_OWNER` / `CATALOG_REPO_NAME` / `CATALOG_REPO_BRANCH` - Optional.
//!   Target of skill-request pull requests. Defaults to `opencode-manager/catalog@main`.
//!
//! Missing GitHub credentials are not a configuration error; skill requests
//! report them when attempted.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::github::{CatalogRepo, GitHubAppConfig, DEFAULT_API_URL};
use crate::opencode_config::{resolve_opencode_config_dir, resolve_opencode_config_path};
use crate::util::env_var_nonempty;

pub const DEFAULT_PORT: u16 = 4545;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `opencode.json` holding the `mcp` map
    pub opencode_config_path: PathBuf,
    pub skills_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub catalog_url: String,
    pub github: GitHubAppConfig,
    pub catalog_repo: CatalogRepo,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unparseable `PORT` or an
    /// unreadable `GITHUB_APP_PRIVATE_KEY_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_dir = resolve_opencode_config_dir();
        let mut config = Self::from_vars(env_var_nonempty, config_dir)?;
        config.opencode_config_path = resolve_opencode_config_path();
        Ok(config)
    }

    fn from_vars<F>(var: F, config_dir: PathBuf) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?,
            None => DEFAULT_PORT,
        };

        let skills_dir = var("OPENCODE_SKILLS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir.join("skill"));
        let agents_dir = var("OPENCODE_AGENTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir.join("agent"));

        let private_key = match (var("GITHUB_APP_PRIVATE_KEY"), var("GITHUB_APP_PRIVATE_KEY_PATH")) {
            (Some(pem), _) => Some(pem.replace("\\n", "\n")),
            (None, Some(path)) => Some(std::fs::read_to_string(&path).map_err(|e| {
                ConfigError::InvalidValue(
                    "GITHUB_APP_PRIVATE_KEY_PATH".to_string(),
                    format!("{}: {}", path, e),
                )
            })?),
            (None, None) => None,
        };

        let github = GitHubAppConfig {
            app_id: var("GITHUB_APP_ID"),
            private_key,
            installation_id: var("GITHUB_APP_INSTALLATION_ID"),
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        };

        let catalog_repo = CatalogRepo {
            owner: var("CATALOG_REPO_OWNER").unwrap_or_else(|| "opencode-manager".to_string()),
            name: var("CATALOG_REPO_NAME").unwrap_or_else(|| "catalog".to_string()),
            base_branch: var("CATALOG_REPO_BRANCH").unwrap_or_else(|| "main".to_string()),
        };

        Ok(Self {
            host,
            port,
            opencode_config_path: config_dir.join(crate::opencode_config::CONFIG_FILE_NAME),
            skills_dir,
            agents_dir,
            catalog_url: var("OPENCODE_CATALOG_URL")
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            github,
            catalog_repo,
        })
    }

    /// Create a config rooted at `config_dir` (useful for testing).
    pub fn new(config_dir: impl Into<PathBuf>, catalog_url: impl Into<String>) -> Self {
        let config_dir = config_dir.into();
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            opencode_config_path: config_dir.join(crate::opencode_config::CONFIG_FILE_NAME),
            skills_dir: config_dir.join("skill"),
            agents_dir: config_dir.join("agent"),
            catalog_url: catalog_url.into(),
            github: GitHubAppConfig {
                api_url: DEFAULT_API_URL.to_string(),
                ..Default::default()
            },
            catalog_repo: CatalogRepo {
                owner: "opencode-manager".to_string(),
                name: "catalog".to_string(),
                base_branch: "main".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|k| vars.get(k).cloned(), PathBuf::from("/cfg"))
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.skills_dir, PathBuf::from("/cfg/skill"));
        assert_eq!(config.agents_dir, PathBuf::from("/cfg/agent"));
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.catalog_repo.base_branch, "main");
        assert!(!config.github.is_configured());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = load(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for PORT"));
    }

    #[test]
    fn escaped_private_key_is_unescaped() {
        let config = load(&[
            ("GITHUB_APP_ID", "1"),
            ("GITHUB_APP_PRIVATE_KEY", "-----BEGIN-----\\nabc\\n-----END-----"),
            ("GITHUB_APP_INSTALLATION_ID", "2"),
        ])
        .unwrap();
        assert!(config.github.is_configured());
        assert_eq!(
            config.github.private_key.as_deref(),
            Some("-----BEGIN-----\nabc\n-----END-----")
        );
    }

    #[test]
    fn unreadable_key_path_is_rejected() {
        let err = load(&[("GITHUB_APP_PRIVATE_KEY_PATH", "/nonexistent/key.pem")]).unwrap_err();
        assert!(err.to_string().contains("GITHUB_APP_PRIVATE_KEY_PATH"));
    }
}
