//! Frontmatter documents used by skills (`SKILL.md`) and agents (`<name>.md`).
//!
//! A document opens with a `---` line, carries `key: value` metadata lines,
//! closes with another `---` line and is followed by free-text markdown.
//! Only the metadata block is inspected; the body is never scanned for keys.
//!
//! ```text
//! ---
//! name: code-review
//! description: Reviews code
//! metadata:
//!   author: octo
//! ---
//! Body text
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DELIMITER: &str = "---";

pub const SKILL_NAME_MAX: usize = 64;
pub const SKILL_DESCRIPTION_MAX: usize = 1024;
pub const AGENT_DESCRIPTION_MAX: usize = 200;

/// A single problem found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn missing_block() -> Self {
        Self::new("frontmatter", "Missing or invalid frontmatter block")
    }
}

/// Agent operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    Primary,
    Subagent,
    All,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Primary => "primary",
            AgentMode::Subagent => "subagent",
            AgentMode::All => "all",
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(AgentMode::Primary),
            "subagent" => Ok(AgentMode::Subagent),
            "all" => Ok(AgentMode::All),
            other => Err(format!("unknown agent mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    pub metadata: Option<BTreeMap<String, String>>,
}

fn is_empty_map(map: &Option<BTreeMap<String, String>>) -> bool {
    map.as_ref().map_or(true, BTreeMap::is_empty)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AgentMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// A full skill document: metadata plus markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkillDocument {
    pub metadata: SkillMetadata,
    #[serde(default)]
    pub body: String,
}

impl SkillDocument {
    pub fn parse(content: &str, expected_id: &str) -> Option<Self> {
        let (_, body) = split(content)?;
        let metadata = parse_skill(content, expected_id)?;
        Some(Self {
            metadata,
            body: body.to_string(),
        })
    }

    /// Render the document in the on-disk format.
    pub fn to_markdown(&self) -> Result<String, serde_yaml::Error> {
        render(&self.metadata, &self.body)
    }
}

/// A full agent document: metadata plus system prompt body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentDocument {
    pub metadata: AgentMetadata,
    #[serde(default)]
    pub body: String,
}

impl AgentDocument {
    pub fn parse(content: &str, expected_id: &str) -> Option<Self> {
        let (_, body) = split(content)?;
        let metadata = parse_agent(content, expected_id)?;
        Some(Self {
            metadata,
            body: body.to_string(),
        })
    }

    pub fn to_markdown(&self) -> Result<String, serde_yaml::Error> {
        render(&self.metadata, &self.body)
    }
}

fn render<M: Serialize>(metadata: &M, body: &str) -> Result<String, serde_yaml::Error> {
    let block = serde_yaml::to_string(metadata)?;
    let mut out = format!("{}\n{}", DELIMITER, block);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');

    let body = body.trim();
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    Ok(out)
}

/// Split a document into its metadata block and trimmed body.
///
/// Returns `None` unless the first line is the delimiter, a later line is the
/// delimiter, and the block between them holds something other than
/// whitespace.
pub fn split(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut offset = 0;
    let mut block_start = None;

    for line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim_end() != DELIMITER {
            if block_start.is_none() {
                return None;
            }
            continue;
        }

        match block_start {
            None => block_start = Some(offset),
            Some(start) => {
                let block = &content[start..line_start];
                if block.trim().is_empty() {
                    return None;
                }
                return Some((block, content[offset..].trim()));
            }
        }
    }

    None
}

/// Parse skill metadata. `name` and `description` are required.
///
/// A declared `name` that differs from `expected_id` is accepted; callers
/// store the skill under `expected_id`.
pub fn parse_skill(content: &str, expected_id: &str) -> Option<SkillMetadata> {
    let (block, _) = split(content)?;
    let fields = Fields::parse(block);
    let name = fields.required("name")?;
    let description = fields.required("description")?;

    if name != expected_id {
        tracing::debug!(
            expected = %expected_id,
            declared = %name,
            "Skill name differs from its identifier"
        );
    }

    Some(SkillMetadata {
        name,
        description,
        metadata: fields.metadata(),
    })
}

/// Parse agent metadata. Only `description` is required; malformed optional
/// fields are dropped here and reported by [`validate_agent`].
pub fn parse_agent(content: &str, _expected_id: &str) -> Option<AgentMetadata> {
    let (block, _) = split(content)?;
    let fields = Fields::parse(block);
    let description = fields.required("description")?;

    let mode = fields.get("mode").and_then(|m| m.parse().ok());
    let model = fields.get("model").map(str::to_string);
    let temperature = fields.get("temperature").and_then(parse_temperature);

    Some(AgentMetadata {
        description,
        mode,
        model,
        temperature,
    })
}

pub fn validate_skill(content: &str) -> Vec<ValidationIssue> {
    let Some((block, _)) = split(content) else {
        return vec![ValidationIssue::missing_block()];
    };
    let fields = Fields::parse(block);
    let mut issues = Vec::new();

    match fields.required("name") {
        None => issues.push(ValidationIssue::new("name", "Name is required")),
        Some(name) if name.chars().count() > SKILL_NAME_MAX => issues.push(ValidationIssue::new(
            "name",
            format!("Name must be {} characters or less", SKILL_NAME_MAX),
        )),
        Some(_) => {}
    }

    match fields.required("description") {
        None => issues.push(ValidationIssue::new("description", "Description is required")),
        Some(d) if d.chars().count() > SKILL_DESCRIPTION_MAX => {
            issues.push(ValidationIssue::new(
                "description",
                format!(
                    "Description must be {} characters or less",
                    SKILL_DESCRIPTION_MAX
                ),
            ))
        }
        Some(_) => {}
    }

    issues
}

pub fn validate_agent(content: &str) -> Vec<ValidationIssue> {
    let Some((block, _)) = split(content) else {
        return vec![ValidationIssue::missing_block()];
    };
    let fields = Fields::parse(block);
    let mut issues = Vec::new();

    match fields.required("description") {
        None => issues.push(ValidationIssue::new("description", "Description is required")),
        Some(d) if d.chars().count() > AGENT_DESCRIPTION_MAX => {
            issues.push(ValidationIssue::new(
                "description",
                format!(
                    "Description must be {} characters or less",
                    AGENT_DESCRIPTION_MAX
                ),
            ))
        }
        Some(_) => {}
    }

    if let Some(mode) = fields.get("mode") {
        if mode.parse::<AgentMode>().is_err() {
            issues.push(ValidationIssue::new(
                "mode",
                "Mode must be one of: primary, subagent, all",
            ));
        }
    }

    if let Some(model) = fields.get("model") {
        if !model.contains('/') {
            issues.push(ValidationIssue::new(
                "model",
                "Model must be in format provider/model-id",
            ));
        }
    }

    if let Some(temperature) = fields.get("temperature") {
        if parse_temperature(temperature).is_none() {
            issues.push(ValidationIssue::new(
                "temperature",
                "Temperature must be a number between 0.0 and 1.0",
            ));
        }
    }

    issues
}

fn parse_temperature(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| (0.0..=1.0).contains(t))
}

// ─────────────────────────────────────────────────────────────────────────────
// Line-oriented metadata block
// ─────────────────────────────────────────────────────────────────────────────

enum Nested {
    None,
    Metadata,
    /// `key: |` or `key: >` followed by indented lines.
    Scalar {
        key: String,
        folded: bool,
        lines: Vec<String>,
    },
}

#[derive(Debug, Default)]
struct Fields {
    top: BTreeMap<String, String>,
    metadata: BTreeMap<String, String>,
}

impl Fields {
    fn parse(block: &str) -> Self {
        let mut fields = Fields::default();
        let mut nested = Nested::None;

        for line in block.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                match &mut nested {
                    Nested::Metadata => {
                        if let Some((key, value)) = split_pair(trimmed) {
                            fields.metadata.insert(key.to_string(), unquote(value));
                        }
                    }
                    Nested::Scalar { lines, .. } => lines.push(trimmed.to_string()),
                    Nested::None => {}
                }
                continue;
            }

            fields.finish(std::mem::replace(&mut nested, Nested::None));

            let Some((key, value)) = split_pair(trimmed) else {
                continue;
            };
            let value = value.trim();
            nested = match value {
                "" if key == "metadata" => Nested::Metadata,
                "|" | "|-" | ">" | ">-" => Nested::Scalar {
                    key: key.to_string(),
                    folded: value.starts_with('>'),
                    lines: Vec::new(),
                },
                _ => {
                    fields.top.insert(key.to_string(), unquote(value));
                    Nested::None
                }
            };
        }

        fields.finish(nested);
        fields
    }

    fn finish(&mut self, nested: Nested) {
        if let Nested::Scalar { key, folded, lines } = nested {
            let joined = lines.join(if folded { " " } else { "\n" });
            self.top.insert(key, joined);
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.top.get(key).map(String::as_str)
    }

    /// A present, non-blank value.
    fn required(&self, key: &str) -> Option<String> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }

    fn metadata(&self) -> Option<BTreeMap<String, String>> {
        if self.metadata.is_empty() {
            None
        } else {
            Some(self.metadata.clone())
        }
    }
}

fn split_pair(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    } else if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        raw[1..raw.len() - 1].replace("''", "'")
    } else {
        raw.to_string()
    }
}
