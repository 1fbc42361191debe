use crate::{EntityId, Error};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pointer from one entity to another, rendered on the wire as `{"ref": id}`.
///
/// A token carries only the id. Resolving it to the pointee is an explicit
/// lookup against a validated model, never a property of the token itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefToken {
    #[serde(rename = "ref")]
    pub id: EntityId,
}

impl RefToken {
    /// Creates a token pointing at `id`.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into() }
    }

    /// The referenced entity id.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Reads the id out of an untyped `{"ref": id}` value.
    ///
    /// Returns `None` unless `value` is an object whose `ref` member is a string.
    /// Extra members are tolerated here; strictness is the validator's job.
    #[must_use]
    pub fn peek(value: &Value) -> Option<&str> {
        value.as_object()?.get("ref")?.as_str()
    }

    /// Parses an untyped value into a token.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        Self::peek(value)
            .map(Self::new)
            .ok_or_else(|| Error::NotARef(value.to_string()))
    }

    /// Renders the token as `{"ref": id}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "ref": self.id.as_str() })
    }
}

impl From<EntityId> for RefToken {
    fn from(id: EntityId) -> Self {
        Self { id }
    }
}
