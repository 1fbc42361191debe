//! The authoritative side of replication.
//!
//! [`DataModelServer`] owns the one mutable [`DataModel`]. It consumes
//! requests one at a time in arrival order, so the model is never touched by
//! two requests at once and needs no locking. [`DataModelServer::handle_message`]
//! is the per-message state machine with no I/O; [`DataModelServer::process`]
//! drives it from a channel.

use crate::action::ActionHandler;
use crate::channel::MessageChannel;
use crate::error::SyncResult;
use crate::protocol::Message;
use tessel_model::DataModel;
use tessel_types::RefToken;
use tracing::{debug, info, warn};

/// Serves snapshots of an authoritative model and applies remote actions.
#[derive(Debug, Clone)]
pub struct DataModelServer {
    model: DataModel,
}

impl DataModelServer {
    /// Wraps `model` as the authoritative store.
    #[must_use]
    pub fn new(model: DataModel) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> &DataModel {
        &self.model
    }

    /// Mutable access for local seeding between sessions.
    pub fn model_mut(&mut self) -> &mut DataModel {
        &mut self.model
    }

    #[must_use]
    pub fn into_model(self) -> DataModel {
        self.model
    }

    /// A snapshot reply of the current graph.
    #[must_use]
    pub fn observation(&self, error: bool) -> Message {
        Message::snapshot(self.model.snapshot(), error)
    }

    // ── Message handling ─────────────────────────────────────────

    /// Handles one inbound message and returns the reply to send, if any.
    ///
    /// Replies (`dataModelReponse`, `refReponse`) only travel towards the
    /// remote; receiving one here is logged and ignored.
    pub fn handle_message<H>(
        &mut self,
        message: Message,
        handler: &H,
        self_ref: &RefToken,
    ) -> Option<Message>
    where
        H: ActionHandler + ?Sized,
    {
        match message {
            Message::GetObservation => Some(self.observation(false)),
            Message::GetSelf => Some(Message::self_ref(self_ref)),
            Message::DoAction(request) => {
                let error = handler.handle(&mut self.model, &request, self_ref);
                if error {
                    warn!(op = %request.op, "action refused");
                } else {
                    debug!(op = %request.op, "action applied");
                }
                Some(self.observation(error))
            }
            reply @ (Message::DataModelResponse { .. } | Message::RefResponse { .. }) => {
                warn!(kind = reply.kind(), "ignoring reply sent to the server");
                None
            }
        }
    }

    /// Serves `channel` until the remote end closes it.
    ///
    /// Returns the number of messages handled. Fails with
    /// [`SyncError::ChannelClosed`](crate::SyncError::ChannelClosed) if a
    /// reply cannot be delivered.
    pub async fn process<C, H>(
        &mut self,
        channel: C,
        handler: &H,
        self_ref: &RefToken,
    ) -> SyncResult<usize>
    where
        C: MessageChannel,
        H: ActionHandler + ?Sized,
    {
        info!(entities = self.model.len(), self_ref = %self_ref.id, "data model server started");
        let mut handled = 0;
        while let Some(message) = channel.recv().await {
            handled += 1;
            if let Some(reply) = self.handle_message(message, handler, self_ref) {
                channel.send(reply).await?;
            }
        }
        info!(handled, "data model server stopped: channel closed");
        Ok(handled)
    }
}
