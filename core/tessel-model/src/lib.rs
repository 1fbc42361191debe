//! Validating entity store for Tessel.
//!
//! Defines the live side of the data-model engine:
//! - [`EntityGraph`]: the untyped id → entity map exchanged between replicas
//! - [`EntityView`]: a read-only, kind-tagged view of one entity
//! - [`Validator`]: cycle-safe structural matching of a graph against a schema
//! - [`DataModel`]: owns a validated graph and its id → kind index
//!
//! Validation failures are reported as `bool`/`Option`, never as errors:
//! malformed input from a remote replica is an expected condition. The
//! [`ModelError`] type only covers typed accessors.

mod entity;
mod error;
mod model;
mod validator;

pub use entity::{EntityGraph, EntityView};
pub use error::{ModelError, ModelResult};
pub use model::DataModel;
pub use validator::{Assignment, KindIndex, Mismatch, Validator};
