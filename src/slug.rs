//! Identifier checks for catalog ids and local resource names.
//!
//! Ids are interpolated straight into storage paths (`skill/<id>/SKILL.md`,
//! `agent/<id>.md`), so every caller-supplied id goes through
//! [`validate_slug`] before a path is built.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ManagerError, Result};

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"))
}

/// Lowercase alphanumerics in hyphen-separated segments.
pub fn is_valid_slug(value: &str) -> bool {
    slug_pattern().is_match(value)
}

pub fn validate_slug(value: &str) -> Result<()> {
    if is_valid_slug(value) {
        Ok(())
    } else {
        Err(ManagerError::InvalidIdentifier(value.to_string()))
    }
}

/// Derive a slug from a free-text display name.
///
/// Runs of anything other than ASCII letters and digits collapse into a single
/// hyphen; leading and trailing hyphens are dropped. The result may be empty.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
