//! OpenCode configuration file (`opencode.json`).
//!
//! Only the `mcp` map is owned by this crate. Every write is a
//! read-modify-write of the whole document so keys written by OpenCode or by
//! the user survive untouched.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{ManagerError, Result};
use crate::util::{env_var_nonempty, home_dir};

pub const CONFIG_FILE_NAME: &str = "opencode.json";
const MCP_KEY: &str = "mcp";

/// Resolve the OpenCode config path the same way OpenCode does:
/// `OPENCODE_CONFIG`, then `OPENCODE_CONFIG_DIR/opencode.json`, then
/// `~/.config/opencode/opencode.json`.
pub fn resolve_opencode_config_path() -> PathBuf {
    if let Some(path) = env_var_nonempty("OPENCODE_CONFIG") {
        return PathBuf::from(path);
    }
    resolve_opencode_config_dir().join(CONFIG_FILE_NAME)
}

/// Directory holding OpenCode's config and the `skill/` and `agent/` stores.
pub fn resolve_opencode_config_dir() -> PathBuf {
    if let Some(dir) = env_var_nonempty("OPENCODE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(path) = env_var_nonempty("OPENCODE_CONFIG") {
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                return parent.to_path_buf();
            }
        }
    }
    PathBuf::from(home_dir()).join(".config").join("opencode")
}

/// Handle on one `opencode.json`.
#[derive(Debug, Clone)]
pub struct OpenCodeConfigFile {
    path: PathBuf,
}

impl OpenCodeConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the document. A missing or blank file reads as `{}`; a file that
    /// is not a JSON object is an error so it never gets overwritten.
    pub async fn read(&self) -> Result<Map<String, Value>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(ManagerError::Validation {
                field: CONFIG_FILE_NAME.to_string(),
                message: format!("{} must contain a JSON object", self.path.display()),
            }),
        }
    }

    async fn write(&self, root: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut payload = serde_json::to_string_pretty(root)?;
        payload.push('\n');
        tokio::fs::write(&self.path, payload).await?;
        Ok(())
    }

    /// Read, apply `edit`, write back. Nothing is written if `edit` fails.
    pub async fn update<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<T>,
    {
        let mut root = self.read().await?;
        let out = edit(&mut root)?;
        self.write(&root).await?;
        tracing::debug!(path = %self.path.display(), "Updated OpenCode config");
        Ok(out)
    }

    /// Snapshot of the `mcp` map (empty when absent).
    pub async fn mcp_servers(&self) -> Result<Map<String, Value>> {
        let mut root = self.read().await?;
        self.take_mcp(&mut root)
    }

    /// Apply `edit` to the `mcp` map, creating it when absent. A `mcp` value
    /// that is not an object is an error and the file is left as is.
    pub async fn update_mcp<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<T>,
    {
        self.update(|root| {
            let mut mcp = self.take_mcp(root)?;
            let out = edit(&mut mcp);
            root.insert(MCP_KEY.to_string(), Value::Object(mcp));
            out
        })
        .await
    }
}

impl OpenCodeConfigFile {
    fn take_mcp(&self, root: &mut Map<String, Value>) -> Result<Map<String, Value>> {
        match root.remove(MCP_KEY) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(_) => Err(ManagerError::Validation {
                field: MCP_KEY.to_string(),
                message: format!(
                    "\"{}\" in {} must be a JSON object",
                    MCP_KEY,
                    self.path.display()
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_reads_as_empty_object() {
        let dir = tempdir().unwrap();
        let file = OpenCodeConfigFile::new(dir.path().join("opencode.json"));
        assert!(file.read().await.unwrap().is_empty());
        assert!(file.mcp_servers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_mcp_preserves_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("opencode.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, r#"{"theme": "dark", "provider": {"a": 1}}"#)
            .await
            .unwrap();

        let file = OpenCodeConfigFile::new(&path);
        file.update_mcp(|mcp| {
            mcp.insert("github".to_string(), json!({"type": "local", "enabled": true}));
            Ok(())
        })
        .await
        .unwrap();

        let root = file.read().await.unwrap();
        assert_eq!(root["theme"], "dark");
        assert_eq!(root["provider"]["a"], 1);
        assert_eq!(root["mcp"]["github"]["type"], "local");
    }

    #[tokio::test]
    async fn invalid_json_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("opencode.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let file = OpenCodeConfigFile::new(&path);
        let err = file.update(|_| Ok(())).await.unwrap_err();
        assert!(matches!(err, ManagerError::Json(_)));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn non_object_mcp_value_is_not_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("opencode.json");
        for original in [r#"{"mcp": ["user", "data"]}"#, r#"{"mcp": "x"}"#, r#"{"mcp": null}"#] {
            tokio::fs::write(&path, original).await.unwrap();

            let file = OpenCodeConfigFile::new(&path);
            let err = file
                .update_mcp(|mcp| {
                    mcp.insert("github".to_string(), json!({"type": "local"}));
                    Ok(())
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ManagerError::Validation { .. }), "{original}");
            assert!(file.mcp_servers().await.is_err());
            assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), original);
        }
    }

    #[tokio::test]
    async fn failed_edit_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("opencode.json");
        let file = OpenCodeConfigFile::new(&path);
        let result: Result<()> = file
            .update(|_| Err(ManagerError::remote("nope")))
            .await;
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
