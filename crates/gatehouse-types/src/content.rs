//! Tier-scoped content types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ParseError;

/// Content tier name, e.g. `basic` or `premium`
///
/// Each tier maps to a flat collection named `content-{tier}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTier(String);

impl ContentTier {
    /// Create a tier from a name; names are lowercase identifiers
    pub fn new(name: &str) -> Result<Self, ParseError> {
        let name = name.trim().to_lowercase();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(name))
        } else {
            Err(ParseError::InvalidContentTier(name))
        }
    }

    /// The `basic` tier
    pub fn basic() -> Self {
        Self("basic".to_string())
    }

    /// The `premium` tier
    pub fn premium() -> Self {
        Self("premium".to_string())
    }

    /// Tiers fetched when none are configured
    pub fn defaults() -> Vec<Self> {
        vec![Self::basic(), Self::premium()]
    }

    /// Tier name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Collection holding this tier's content
    pub fn collection(&self) -> String {
        format!("content-{}", self.0)
    }
}

impl std::fmt::Display for ContentTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ContentTier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An opaque content record
///
/// Access control is enforced by the database's security rules, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Document ID
    pub id: String,
    /// Raw document fields
    pub fields: Map<String, Value>,
}

impl ContentBlock {
    /// Best-effort one-line text for the block
    ///
    /// Uses the first of `title`, `content` or `body` that is a string, then
    /// falls back to the document ID.
    pub fn summary(&self) -> String {
        ["title", "content", "body"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(Value::as_str))
            .map_or_else(|| self.id.clone(), str::to_string)
    }
}
