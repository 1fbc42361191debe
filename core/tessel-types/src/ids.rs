//! Identifier types used throughout the Tessel core.
//!
//! Entity ids are opaque strings. Ids minted locally follow the `$<n>`
//! convention so that a replica can keep minting after adopting a graph
//! produced elsewhere.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Prefix used by [`IdMint::new`].
pub const DEFAULT_ID_PREFIX: &str = "$";

/// Unique identifier for an entity in an entity graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses an entity id, rejecting the empty string.
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        if s.is_empty() {
            return Err(crate::Error::InvalidId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Consumes the id, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Sequential id generator producing `<prefix><n>`.
#[derive(Debug, Clone)]
pub struct IdMint {
    prefix: String,
    next: u64,
}

impl IdMint {
    /// Creates a mint using [`DEFAULT_ID_PREFIX`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ID_PREFIX)
    }

    /// Creates a mint with a custom prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the counter value the next id will carry.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Mints a fresh id. The counter wraps to zero after `u64::MAX`.
    pub fn mint(&mut self) -> EntityId {
        let id = EntityId(format!("{}{}", self.prefix, self.next));
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Advances the counter past `id` if it was minted with this prefix.
    ///
    /// Ids that do not follow the `<prefix><n>` shape are ignored, and so is
    /// an id whose counter has no successor.
    pub fn observe(&mut self, id: &EntityId) {
        let Some(suffix) = id.as_str().strip_prefix(self.prefix.as_str()) else {
            return;
        };
        let Some(after) = suffix.parse::<u64>().ok().and_then(|n| n.checked_add(1)) else {
            return;
        };
        self.next = self.next.max(after);
    }
}

impl Default for IdMint {
    fn default() -> Self {
        Self::new()
    }
}
