//! Schema layer for Tessel.
//!
//! Defines the declarative side of the data-model engine:
//! - [`TypeDescriptor`]: the closed type algebra (primitive, union, optional,
//!   array-of, polymorphic reference)
//! - [`Structure`]: the ordered field table of one entity kind
//! - [`Schema`]: the ordered set of kinds a model validates against
//! - [`ImplicationChecker`]: static audit that finds kinds which are
//!   structural subtypes of other kinds
//!
//! Nothing in this crate touches live entity data; validation of entity graphs
//! lives in `tessel-model`.

mod descriptor;
mod error;
mod implication;
mod schema;

pub use descriptor::{Primitive, TypeDescriptor};
pub use error::{SchemaError, SchemaResult};
pub use implication::{Analysis, Implication, ImplicationChecker, ImplicationMatrix};
pub use schema::{DanglingRef, Schema, SchemaBuilder, Structure};
