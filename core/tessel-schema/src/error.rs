//! Error types for the schema layer.

use crate::Implication;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while authoring or auditing a schema.
///
/// Data that fails validation is never reported through this type; see
/// `tessel-model` for the boolean validation surface.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Some kind is a structural subtype of another kind.
    #[error("incoherent type system (implications found): {}", list_implications(.problems))]
    Incoherent { problems: Vec<Implication> },

    /// A `Ref` names a kind the schema does not declare.
    #[error("kind {kind:?}, field {field:?}: reference to undeclared kind {missing:?}")]
    UnknownKind {
        kind: String,
        field: String,
        missing: String,
    },

    /// The same kind name was declared twice.
    #[error("kind {0:?} declared more than once")]
    DuplicateKind(String),

    /// The schema document could not be parsed.
    #[error("schema parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

fn list_implications(problems: &[Implication]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
