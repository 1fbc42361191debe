//! Server-side action handling.
//!
//! A `doAction` request is passed to an [`ActionHandler`], which applies
//! whatever application logic the op names (authorization, field updates,
//! entity creation) against the authoritative model. The handler returns the
//! error flag carried by the snapshot reply: `true` means refused.

use crate::protocol::ActionRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessel_model::DataModel;
use tessel_types::RefToken;
use tracing::{debug, warn};

/// Applies `doAction` requests to the authoritative model.
pub trait ActionHandler: Send + Sync {
    /// Handles one request on behalf of the remote identified by `self_ref`.
    /// Returns `true` if the action was refused or failed.
    fn handle(&self, model: &mut DataModel, request: &ActionRequest, self_ref: &RefToken) -> bool;
}

impl<F> ActionHandler for F
where
    F: Fn(&mut DataModel, &ActionRequest, &RefToken) -> bool + Send + Sync,
{
    fn handle(&self, model: &mut DataModel, request: &ActionRequest, self_ref: &RefToken) -> bool {
        self(model, request, self_ref)
    }
}

/// Op name understood by [`SetFieldAction`].
pub const SET_FIELD_OP: &str = "setField";

/// Argument of a `setField` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetField {
    /// The entity to update.
    #[serde(rename = "ref")]
    pub target: RefToken,
    /// The field to update.
    pub field: String,
    /// The new value, type-checked against the field's descriptor.
    pub value: Value,
}

impl SetField {
    pub fn new(target: RefToken, field: impl Into<String>, value: Value) -> Self {
        Self {
            target,
            field: field.into(),
            value,
        }
    }
}

/// Built-in handler for `setField`: applies a type-checked field update.
///
/// Refuses unknown ops, malformed arguments, and updates the model rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetFieldAction;

impl ActionHandler for SetFieldAction {
    fn handle(&self, model: &mut DataModel, request: &ActionRequest, _self_ref: &RefToken) -> bool {
        if request.op != SET_FIELD_OP {
            warn!(op = %request.op, "unknown action");
            return true;
        }
        let update = match request.decode::<SetField>() {
            Ok(update) => update,
            Err(e) => {
                warn!("malformed setField argument: {e}");
                return true;
            }
        };
        let applied = model.set_field(update.target.id.as_str(), &update.field, update.value);
        if !applied {
            debug!(entity = %update.target.id, field = %update.field, "setField refused");
        }
        !applied
    }
}
