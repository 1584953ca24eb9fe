//! Types for the remote resource catalogs.

use std::collections::{BTreeMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ResourceKind;

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Location of `SKILL.md` relative to the catalog base URL.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Location of the agent markdown relative to the catalog base URL.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// How OpenCode reaches an MCP server. Matches the `mcp` entries of
/// `opencode.json`: `local` spawns a command, `remote` talks HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpTransport {
    Local {
        /// Command array: ["npx", "-y", "@modelcontextprotocol/server-github"]
        command: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        environment: BTreeMap<String, String>,
    },
    Remote {
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

impl McpTransport {
    pub fn type_name(&self) -> &'static str {
        match self {
            McpTransport::Local { .. } => "local",
            McpTransport::Remote { .. } => "remote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub transport: McpTransport,
    #[serde(default)]
    pub requires_auth: bool,
    /// e.g. "api-key", "oauth"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// Free-form hints for the setup UI (env var names, docs links).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// A versioned snapshot of one catalog kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog<E> {
    pub version: String,
    pub last_updated: String,
    pub entries: Vec<E>,
}

/// Per-kind catalog shape: which file to fetch and where the entries live.
pub trait CatalogKind: Send + Sync + 'static {
    type Entry: Clone + Send + Sync + DeserializeOwned + Serialize + 'static;

    /// File name relative to the catalog base URL.
    const FILE: &'static str;
    /// Key holding the entry array inside the file.
    const ENTRIES_KEY: &'static str;
    const KIND: ResourceKind;

    fn entry_id(entry: &Self::Entry) -> &str;

    /// Path of the entry's document, if the kind has one.
    fn content_path(entry: &Self::Entry) -> Option<&str>;

    /// Decode a catalog file. Entries with a duplicate id are dropped,
    /// keeping the first occurrence.
    fn decode(raw: &str) -> serde_json::Result<Catalog<Self::Entry>> {
        let mut root: Value = serde_json::from_str(raw)?;
        let version = root
            .get("version")
            .map(scalar_to_string)
            .unwrap_or_default();
        let last_updated = root
            .get("lastUpdated")
            .map(scalar_to_string)
            .unwrap_or_default();
        let raw_entries = root
            .get_mut(Self::ENTRIES_KEY)
            .map(Value::take)
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let parsed: Vec<Self::Entry> = serde_json::from_value(raw_entries)?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(parsed.len());
        for entry in parsed {
            let id = Self::entry_id(&entry).to_string();
            if seen.insert(id.clone()) {
                entries.push(entry);
            } else {
                tracing::warn!(catalog = Self::FILE, id = %id, "Dropping duplicate catalog entry");
            }
        }

        Ok(Catalog {
            version,
            last_updated,
            entries,
        })
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct SkillCatalog;
pub struct AgentCatalog;
pub struct McpCatalog;

impl CatalogKind for SkillCatalog {
    type Entry = SkillEntry;
    const FILE: &'static str = "skills.json";
    const ENTRIES_KEY: &'static str = "skills";
    const KIND: ResourceKind = ResourceKind::Skill;

    fn entry_id(entry: &SkillEntry) -> &str {
        &entry.id
    }

    fn content_path(entry: &SkillEntry) -> Option<&str> {
        Some(&entry.path)
    }
}

impl CatalogKind for AgentCatalog {
    type Entry = AgentEntry;
    const FILE: &'static str = "agents.json";
    const ENTRIES_KEY: &'static str = "agents";
    const KIND: ResourceKind = ResourceKind::Agent;

    fn entry_id(entry: &AgentEntry) -> &str {
        &entry.id
    }

    fn content_path(entry: &AgentEntry) -> Option<&str> {
        Some(&entry.path)
    }
}

impl CatalogKind for McpCatalog {
    type Entry = McpEntry;
    const FILE: &'static str = "mcp-servers.json";
    const ENTRIES_KEY: &'static str = "servers";
    const KIND: ResourceKind = ResourceKind::McpServer;

    fn entry_id(entry: &McpEntry) -> &str {
        &entry.id
    }

    fn content_path(entry: &McpEntry) -> Option<&str> {
        entry.path.as_deref()
    }
}
