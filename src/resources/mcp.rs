//! MCP servers registered in the `mcp` map of `opencode.json`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CatalogClient, McpTransport};
use crate::error::{ManagerError, ResourceKind, Result};
use crate::opencode_config::OpenCodeConfigFile;
use crate::slug::validate_slug;

pub const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Shape of one entry under `mcp` in `opencode.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct McpConfigEntry {
    #[serde(flatten)]
    transport: McpTransport,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledMcpServer {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub transport: McpTransport,
    pub enabled: bool,
}

impl InstalledMcpServer {
    fn from_config(id: &str, value: &Value) -> Option<Self> {
        let entry: McpConfigEntry = serde_json::from_value(value.clone()).ok()?;
        Some(Self {
            id: id.to_string(),
            name: id.to_string(),
            transport: entry.transport,
            enabled: entry.enabled,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub reachable: bool,
    pub message: String,
}

impl ConnectionStatus {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            reachable: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            reachable: false,
            message: message.into(),
        }
    }
}

pub struct McpManager {
    config: OpenCodeConfigFile,
    catalog: Arc<CatalogClient>,
    http: reqwest::Client,
}

impl McpManager {
    pub fn new(config: OpenCodeConfigFile, catalog: Arc<CatalogClient>, http: reqwest::Client) -> Self {
        Self {
            config,
            catalog,
            http,
        }
    }

    /// Register a catalog server as an enabled entry. An existing entry with
    /// the same id is replaced.
    pub async fn install_from_catalog(&self, id: &str) -> Result<InstalledMcpServer> {
        validate_slug(id)?;
        let entry = self.catalog.find_mcp_server(id).await?;
        let value = serde_json::to_value(McpConfigEntry {
            transport: entry.transport.clone(),
            enabled: true,
        })?;

        self.config
            .update_mcp(|mcp| {
                mcp.insert(id.to_string(), value);
                Ok(())
            })
            .await?;

        tracing::info!(
            server = %id,
            transport = entry.transport.type_name(),
            requires_auth = entry.requires_auth,
            "Installed MCP server from catalog"
        );
        Ok(InstalledMcpServer {
            id: id.to_string(),
            name: id.to_string(),
            transport: entry.transport,
            enabled: true,
        })
    }

    /// Configured servers, sorted by id. Entries this crate cannot read are
    /// skipped but left in the file.
    pub async fn list(&self) -> Result<Vec<InstalledMcpServer>> {
        let servers = self.config.mcp_servers().await?;
        let mut out = Vec::with_capacity(servers.len());
        for (id, value) in &servers {
            match InstalledMcpServer::from_config(id, value) {
                Some(server) => out.push(server),
                None => tracing::warn!(server = %id, "Skipping unrecognised MCP config entry"),
            }
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    pub async fn get(&self, id: &str) -> Result<InstalledMcpServer> {
        validate_slug(id)?;
        let servers = self.config.mcp_servers().await?;
        servers
            .get(id)
            .and_then(|value| InstalledMcpServer::from_config(id, value))
            .ok_or_else(|| ManagerError::not_found(ResourceKind::McpServer, id))
    }

    /// Remove the entry. The file is untouched when `id` is not configured.
    pub async fn remove(&self, id: &str) -> Result<()> {
        validate_slug(id)?;
        self.config
            .update_mcp(|mcp| {
                mcp.remove(id)
                    .map(|_| ())
                    .ok_or_else(|| ManagerError::not_found(ResourceKind::McpServer, id))
            })
            .await?;
        tracing::info!(server = %id, "Removed MCP server");
        Ok(())
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<InstalledMcpServer> {
        validate_slug(id)?;
        let server = self
            .config
            .update_mcp(|mcp| {
                let entry = mcp
                    .get_mut(id)
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| ManagerError::not_found(ResourceKind::McpServer, id))?;
                entry.insert("enabled".to_string(), Value::Bool(enabled));
                InstalledMcpServer::from_config(id, &Value::Object(entry.clone()))
                    .ok_or_else(|| ManagerError::not_found(ResourceKind::McpServer, id))
            })
            .await?;
        tracing::info!(server = %id, enabled, "Updated MCP server state");
        Ok(server)
    }

    /// Flip the `enabled` flag.
    pub async fn toggle_enabled(&self, id: &str) -> Result<InstalledMcpServer> {
        let current = self.get(id).await?;
        self.set_enabled(id, !current.enabled).await
    }

    pub async fn installed_ids(&self) -> Result<HashSet<String>> {
        Ok(self.config.mcp_servers().await?.keys().cloned().collect())
    }

    /// Best-effort reachability check. Remote servers get an `OPTIONS`
    /// request; local servers need their launcher on `PATH`.
    pub async fn test_connection(&self, id: &str) -> Result<ConnectionStatus> {
        let server = self.get(id).await?;
        let status = match &server.transport {
            McpTransport::Remote { url, .. } => {
                probe_remote(&self.http, url, CONNECTION_TEST_TIMEOUT).await
            }
            McpTransport::Local { command, .. } => probe_local(command),
        };
        tracing::debug!(server = %id, reachable = status.reachable, "MCP connection test");
        Ok(status)
    }
}

async fn probe_remote(http: &reqwest::Client, url: &str, timeout: Duration) -> ConnectionStatus {
    let result = http
        .request(Method::OPTIONS, url)
        .timeout(timeout)
        .send()
        .await;
    match result {
        Ok(response) if response.status().as_u16() < 500 => {
            ConnectionStatus::ok(format!("Server responded (HTTP {})", response.status().as_u16()))
        }
        Ok(response) => ConnectionStatus::failed(format!(
            "Server error (HTTP {})",
            response.status().as_u16()
        )),
        Err(e) if e.is_timeout() => ConnectionStatus::failed("Connection timed out"),
        Err(e) => ConnectionStatus::failed(format!("Connection failed: {}", e)),
    }
}

/// The binary a launcher needs. `npx`/`bunx` only work when the runtime
/// behind them is installed.
fn required_binary(program: &str) -> &str {
    match program {
        "npx" => "node",
        "bunx" => "bun",
        other => other,
    }
}

fn probe_local(command: &[String]) -> ConnectionStatus {
    let Some(program) = command.first().map(String::as_str).filter(|p| !p.is_empty()) else {
        return ConnectionStatus::failed("No command configured");
    };
    let required = required_binary(program);
    match which::which(required) {
        Ok(path) => ConnectionStatus::ok(format!("Found {} at {}", required, path.display())),
        Err(_) => ConnectionStatus::failed(format!("'{}' was not found on PATH", required)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_entry_defaults_to_enabled() {
        let server = InstalledMcpServer::from_config(
            "context7",
            &json!({"type": "remote", "url": "https://mcp.context7.com/mcp"}),
        )
        .unwrap();
        assert!(server.enabled);
        assert_eq!(server.name, "context7");
    }

    #[test]
    fn unknown_entry_shape_is_rejected() {
        assert!(InstalledMcpServer::from_config("x", &json!({"type": "sse"})).is_none());
    }

    #[test]
    fn local_entry_serialises_in_opencode_shape() {
        let value = serde_json::to_value(McpConfigEntry {
            transport: McpTransport::Local {
                command: vec!["npx".to_string(), "-y".to_string(), "pkg".to_string()],
                environment: Default::default(),
            },
            enabled: true,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "local", "command": ["npx", "-y", "pkg"], "enabled": true})
        );
    }

    #[test]
    fn missing_binary_is_unreachable() {
        let status = probe_local(&["definitely-not-a-real-binary-4d1f".to_string()]);
        assert!(!status.reachable);
        assert!(status.message.contains("definitely-not-a-real-binary-4d1f"));
    }

    #[test]
    fn empty_command_is_unreachable() {
        assert!(!probe_local(&[]).reachable);
    }

    #[test]
    fn launchers_require_their_runtime() {
        assert_eq!(required_binary("npx"), "node");
        assert_eq!(required_binary("bunx"), "bun");
        assert_eq!(required_binary("uvx"), "uvx");
        assert_eq!(required_binary("/usr/local/bin/server"), "/usr/local/bin/server");
    }

    #[tokio::test]
    async fn silent_remote_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold connections without ever answering.
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let status = probe_remote(
            &reqwest::Client::new(),
            &format!("http://{}/mcp", addr),
            Duration::from_millis(200),
        )
        .await;
        assert!(!status.reachable);
        assert_eq!(status.message, "Connection timed out");
    }
}
