use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Identifier assigned to a snapshot by the version store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Self)
            .map_err(|_| DomainError::validation(format!("invalid version id '{}'", s)))
    }
}

/// Listing metadata for a snapshot, without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub id: VersionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A named, immutable, point-in-time copy of the serialized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub id: VersionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub serialized_document: String,
}

impl VersionSnapshot {
    pub fn info(&self) -> VersionInfo {
        VersionInfo {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Trims a user-supplied version name, rejecting blank names.
pub fn validate_version_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("Version name cannot be empty."));
    }
    Ok(trimmed.to_string())
}

/// Most recent first; equal timestamps fall back to the later-assigned id.
pub fn sort_newest_first(versions: &mut [VersionInfo]) {
    versions.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
