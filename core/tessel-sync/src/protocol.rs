//! Replication protocol messages.
//!
//! Every message is a JSON object tagged by `type`. A remote context sends
//! requests, the authority answers with replies:
//!
//! | direction        | `type`             | payload                   |
//! |------------------|--------------------|---------------------------|
//! | remote → server  | `getObservation`   |                           |
//! | remote → server  | `getSelf`          |                           |
//! | remote → server  | `doAction`         | `op`, `value`             |
//! | server → remote  | `dataModelReponse` | `value` (graph), `error`  |
//! | server → remote  | `refReponse`       | `ref` (id)                |
//!
//! The reply tags keep the historical `Reponse` spelling; peers match on it.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessel_model::EntityGraph;
use tessel_types::{EntityId, RefToken};

/// A replication protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Request a fresh snapshot.
    #[serde(rename = "getObservation")]
    GetObservation,

    /// Request the id the authority associates with this remote.
    #[serde(rename = "getSelf")]
    GetSelf,

    /// Request a named mutation.
    #[serde(rename = "doAction")]
    DoAction(ActionRequest),

    /// Full snapshot of the authority's graph. `error` is set when the
    /// action that triggered the reply was refused.
    #[serde(rename = "dataModelReponse")]
    DataModelResponse {
        value: EntityGraph,
        #[serde(default)]
        error: bool,
    },

    /// The self id.
    #[serde(rename = "refReponse")]
    RefResponse {
        #[serde(rename = "ref")]
        id: EntityId,
    },
}

impl Message {
    /// Builds a `doAction` request.
    pub fn action(op: impl Into<String>, value: Value) -> Self {
        Self::DoAction(ActionRequest::new(op, value))
    }

    /// Builds a snapshot reply.
    #[must_use]
    pub fn snapshot(value: EntityGraph, error: bool) -> Self {
        Self::DataModelResponse { value, error }
    }

    /// Builds a self-id reply.
    #[must_use]
    pub fn self_ref(token: &RefToken) -> Self {
        Self::RefResponse {
            id: token.id.clone(),
        }
    }

    /// Wire name of the message kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetObservation => "getObservation",
            Self::GetSelf => "getSelf",
            Self::DoAction(_) => "doAction",
            Self::DataModelResponse { .. } => "dataModelReponse",
            Self::RefResponse { .. } => "refReponse",
        }
    }

    /// Whether this message travels remote → server.
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self, Self::GetObservation | Self::GetSelf | Self::DoAction(_))
    }

    /// Whether this message travels server → remote.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        !self.is_request()
    }

    /// Encodes the message as JSON text.
    pub fn encode(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a message from JSON text.
    pub fn decode(text: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decodes a message from an untyped JSON value.
    pub fn from_value(value: Value) -> SyncResult<Self> {
        let Some(tag) = value.get("type").and_then(Value::as_str) else {
            return Err(SyncError::Protocol(format!(
                "message has no `type` tag: {value}"
            )));
        };
        let tag = tag.to_string();
        serde_json::from_value(value)
            .map_err(|e| SyncError::Protocol(format!("malformed {tag} message: {e}")))
    }
}

/// Payload of a `doAction` request: an operation name and its argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Operation name, interpreted by the server's action handler.
    pub op: String,
    /// Operation argument.
    #[serde(default)]
    pub value: Value,
}

impl ActionRequest {
    pub fn new(op: impl Into<String>, value: Value) -> Self {
        Self {
            op: op.into(),
            value,
        }
    }

    /// Decodes the argument into `T`.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> SyncResult<T> {
        Ok(T::deserialize(&self.value)?)
    }
}
