//! Error types for typed access to the entity store.

use tessel_types::EntityId;
use thiserror::Error;

/// Result type for model operations that can fail with detail.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors from typed accessors. Schema violations are not errors; they are
/// reported as `false`/`None` by the validating operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No entity with this id.
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// The entity exists but was validated as a different kind.
    #[error("entity {id} is a {actual}, not a {expected}")]
    WrongKind {
        id: EntityId,
        expected: String,
        actual: String,
    },

    /// The entity could not be converted to or from the requested Rust type.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
