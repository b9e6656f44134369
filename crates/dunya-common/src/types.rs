//! Common types used across Dunya

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DunyaError;

// ============================================================================
// External identifiers
// ============================================================================

/// The external identifier of a document, normally a MusicBrainz recording id.
///
/// Always stored in its lowercase hyphenated form so it can be used directly
/// as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// The first two characters, used to shard files on disk
    pub fn stub(&self) -> &str {
        &self.0[..2]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for ExternalId {
    fn from(id: Uuid) -> Self {
        Self(id.hyphenated().to_string())
    }
}

impl std::str::FromStr for ExternalId {
    type Err = DunyaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Only the hyphenated form is accepted; URLs and paths use it verbatim
        if trimmed.len() != 36 {
            return Err(DunyaError::InvalidExternalId(s.to_string()));
        }
        Uuid::parse_str(trimmed)
            .map(Self::from)
            .map_err(|_| DunyaError::InvalidExternalId(s.to_string()))
    }
}

impl TryFrom<String> for ExternalId {
    type Error = DunyaError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Slugs
// ============================================================================

/// Turn a display name into a URL-safe slug.
///
/// ASCII letters and digits are kept (lowercased); every other run of
/// characters becomes a single `-`. Leading and trailing dashes are dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

// ============================================================================
// Permission tiers
// ============================================================================

/// Access tier granted by a collection for one file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionTier {
    /// Anyone, including anonymous users
    #[serde(rename = "U")]
    Unrestricted,
    /// Users holding the restricted-access permission
    #[serde(rename = "R")]
    Restricted,
    /// Staff only
    #[serde(rename = "S")]
    Staff,
}

impl PermissionTier {
    /// Single letter code as stored in the database
    pub fn code(self) -> &'static str {
        match self {
            PermissionTier::Unrestricted => "U",
            PermissionTier::Restricted => "R",
            PermissionTier::Staff => "S",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PermissionTier::Unrestricted => "Unrestricted",
            PermissionTier::Restricted => "Restricted",
            PermissionTier::Staff => "Staff",
        }
    }
}

impl std::str::FromStr for PermissionTier {
    type Err = DunyaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "U" => Ok(PermissionTier::Unrestricted),
            "R" => Ok(PermissionTier::Restricted),
            "S" => Ok(PermissionTier::Staff),
            other => Err(DunyaError::InvalidPermission(other.to_string())),
        }
    }
}

impl std::fmt::Display for PermissionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
