//! Core type definitions for Tessel.
//!
//! This crate defines the identifier types shared by every layer of the
//! data-model engine:
//! - [`EntityId`]: opaque string identifier of an entity in a graph
//! - [`IdMint`]: sequential id generator (`$0`, `$1`, ...)
//! - [`RefToken`]: the `{ref: id}` pointer exchanged between entities
//!
//! Schema and validation types live in `tessel-schema` and `tessel-model`.

mod ids;
mod reference;

pub use ids::{EntityId, IdMint, DEFAULT_ID_PREFIX};
pub use reference::RefToken;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid entity id: {0:?}")]
    InvalidId(String),

    #[error("not a ref token: {0}")]
    NotARef(String),
}
