//! Snapshot replication of a Tessel data model.
//!
//! One side holds the authoritative [`DataModel`](tessel_model::DataModel);
//! remote contexts observe it and submit actions over an injected message
//! channel.
//!
//! ## Components
//!
//! - **Protocol**: the `type`-tagged JSON messages exchanged by both sides
//! - **Channel**: the [`MessageChannel`] abstraction and an in-memory duplex
//! - **Server**: [`DataModelServer`], a per-message state machine plus its
//!   channel loop
//! - **Client**: [`DataModelClient`], request futures resolved by a
//!   dispatcher task
//! - **Actions**: [`ActionHandler`] and the built-in [`SetFieldAction`]
//!
//! ## Exchange
//!
//! 1. `getObservation` → `dataModelReponse` with the full graph
//! 2. `getSelf` → `refReponse` with the id configured for this remote
//! 3. `doAction` → handler runs against the authority, then
//!    `dataModelReponse` with the new graph and the handler's error flag
//!
//! Every snapshot is re-validated on arrival, so a remote never holds a
//! model its own schema would reject.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tessel_model::DataModel;
//! use tessel_schema::{Schema, Structure};
//! use tessel_sync::{channel, DataModelClient, DataModelServer, SetFieldAction};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tessel_sync::SyncResult<()> {
//! let schema = Arc::new(Schema::builder()
//!     .kind("Cell", Structure::new().boolean("state"))
//!     .build());
//!
//! let mut model = DataModel::new(Arc::clone(&schema));
//! let cell = model.create_value("Cell", json!({"state": false}));
//!
//! let (server_end, client_end) = channel::duplex(8);
//! let mut server = DataModelServer::new(model);
//! let me = cell.clone();
//! let serving = tokio::spawn(async move {
//!     server.process(server_end, &SetFieldAction, &me).await
//! });
//!
//! let client = DataModelClient::new(client_end, schema);
//! let outcome = client.set_field(&cell, "state", json!(true)).await?;
//! assert!(!outcome.error);
//! assert_eq!(outcome.model.view(cell.id.as_str()).unwrap().get_bool("/state"), Some(true));
//!
//! drop(client);
//! serving.await.unwrap()?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod channel;
mod client;
mod config;
mod error;
pub mod protocol;
mod server;

pub use action::{ActionHandler, SET_FIELD_OP, SetField, SetFieldAction};
pub use channel::{DuplexChannel, MessageChannel};
pub use client::{ActionOutcome, DataModelClient};
pub use config::{DEFAULT_CHANNEL_CAPACITY, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use protocol::{ActionRequest, Message};
pub use server::DataModelServer;
