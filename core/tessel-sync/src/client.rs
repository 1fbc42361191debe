//! The remote side of replication.
//!
//! A [`DataModelClient`] hands its channel to a dispatcher task and talks to
//! it through a command queue. The dispatcher forwards requests to the
//! authority and routes each reply to the resolver waiting for that reply
//! kind. There is one resolver slot per kind (snapshot, self id): a second
//! request of the same kind replaces the first, whose caller then gets
//! [`SyncError::Superseded`].

use crate::action::{SET_FIELD_OP, SetField};
use crate::channel::MessageChannel;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{ActionRequest, Message};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tessel_model::{DataModel, EntityGraph};
use tessel_schema::Schema;
use tessel_types::RefToken;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Reply to a `doAction` request: the authority's model after the action,
/// and whether the action was refused.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub model: DataModel,
    pub error: bool,
}

/// Raw snapshot reply before local validation.
#[derive(Debug)]
struct Snapshot {
    value: EntityGraph,
    error: bool,
}

type Resolver<T> = oneshot::Sender<SyncResult<T>>;

/// Where the reply to a command should go.
enum Pending {
    Snapshot(Resolver<Snapshot>),
    SelfRef(Resolver<RefToken>),
}

/// Command sent to the dispatcher task.
struct Command {
    message: Message,
    pending: Pending,
}

/// Requests snapshots, the self id and actions from a remote authority.
///
/// Cheap to clone; clones share the dispatcher and its resolver slots. The
/// dispatcher stops, closing the channel, once every clone is dropped.
#[derive(Debug, Clone)]
pub struct DataModelClient {
    schema: Arc<Schema>,
    config: SyncConfig,
    commands: mpsc::Sender<Command>,
}

impl DataModelClient {
    /// Creates a client over `channel` with the default configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<C>(channel: C, schema: impl Into<Arc<Schema>>) -> Self
    where
        C: MessageChannel + 'static,
    {
        Self::with_config(channel, schema, SyncConfig::default())
    }

    /// Creates a client over `channel` with a custom configuration.
    pub fn with_config<C>(channel: C, schema: impl Into<Arc<Schema>>, config: SyncConfig) -> Self
    where
        C: MessageChannel + 'static,
    {
        let capacity = config.channel_capacity.max(1);
        let (commands, command_rx) = mpsc::channel(capacity);
        tokio::spawn(run_dispatcher(channel, command_rx, capacity));
        Self {
            schema: schema.into(),
            config,
            commands,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether the dispatcher is still running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }

    // ── Requests ─────────────────────────────────────────────────

    /// Fetches a fresh snapshot and validates it into a local model.
    pub async fn get_observation(&self) -> SyncResult<DataModel> {
        let snapshot = self.request(Message::GetObservation, Pending::Snapshot).await?;
        self.rebuild(snapshot.value)
    }

    /// Asks the authority which entity this remote is.
    pub async fn get_self(&self) -> SyncResult<RefToken> {
        self.request(Message::GetSelf, Pending::SelfRef).await
    }

    /// Submits an action and returns the authority's model after it.
    pub async fn do_action(
        &self,
        op: impl Into<String>,
        value: Value,
    ) -> SyncResult<ActionOutcome> {
        self.submit(ActionRequest::new(op, value)).await
    }

    /// Submits a prepared action request.
    pub async fn submit(&self, request: ActionRequest) -> SyncResult<ActionOutcome> {
        let snapshot = self
            .request(Message::DoAction(request), Pending::Snapshot)
            .await?;
        let model = self.rebuild(snapshot.value)?;
        Ok(ActionOutcome {
            model,
            error: snapshot.error,
        })
    }

    /// Submits a `setField` action for the built-in field-update handler.
    pub async fn set_field(
        &self,
        target: &RefToken,
        field: impl Into<String>,
        value: Value,
    ) -> SyncResult<ActionOutcome> {
        let update = SetField::new(target.clone(), field, value);
        self.do_action(SET_FIELD_OP, serde_json::to_value(update)?).await
    }

    async fn request<T>(
        &self,
        message: Message,
        pending: impl FnOnce(Resolver<T>) -> Pending,
    ) -> SyncResult<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command {
                message,
                pending: pending(tx),
            })
            .await
            .map_err(|_| SyncError::ChannelClosed)?;

        let reply = async move { rx.await.unwrap_or(Err(SyncError::ChannelClosed)) };
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, reply)
                .await
                .map_err(|_| SyncError::Timeout)?,
            None => reply.await,
        }
    }

    fn rebuild(&self, graph: EntityGraph) -> SyncResult<DataModel> {
        let mut model = DataModel::with_mint(Arc::clone(&self.schema), self.config.mint());
        model
            .try_init(graph)
            .map_err(|id| SyncError::InvalidSnapshot(id.to_string()))?;
        Ok(model)
    }
}

/// Fails a replaced resolver instead of leaving its caller waiting.
fn supersede<T>(slot: &mut Option<Resolver<T>>, next: Resolver<T>) {
    if let Some(previous) = slot.replace(next) {
        debug!("pending request superseded");
        let _ = previous.send(Err(SyncError::Superseded));
    }
}

/// Sends the oldest queued request. Never completes while nothing is queued.
async fn send_front<C: MessageChannel>(channel: &C, outbox: &VecDeque<Message>) -> SyncResult<()> {
    match outbox.front() {
        Some(message) => channel.send(message.clone()).await,
        None => std::future::pending().await,
    }
}

/// Runs until the channel closes or every client handle is dropped.
/// Resolvers still pending at exit are dropped, which their callers observe
/// as [`SyncError::ChannelClosed`].
///
/// Requests wait in a local outbox of at most `capacity` messages, and
/// inbound replies are drained while a send is blocked, so a full queue in
/// one direction never stalls the other.
async fn run_dispatcher<C: MessageChannel>(
    channel: C,
    mut commands: mpsc::Receiver<Command>,
    capacity: usize,
) {
    let mut snapshot: Option<Resolver<Snapshot>> = None;
    let mut self_ref: Option<Resolver<RefToken>> = None;
    let mut outbox: VecDeque<Message> = VecDeque::new();

    loop {
        tokio::select! {
            command = commands.recv(), if outbox.len() < capacity => {
                let Some(Command { message, pending }) = command else {
                    debug!("all client handles dropped, dispatcher stopping");
                    break;
                };
                match pending {
                    Pending::Snapshot(tx) => supersede(&mut snapshot, tx),
                    Pending::SelfRef(tx) => supersede(&mut self_ref, tx),
                }
                outbox.push_back(message);
            }
            sent = send_front(&channel, &outbox), if !outbox.is_empty() => {
                if sent.is_err() {
                    debug!("channel closed while sending request");
                    break;
                }
                outbox.pop_front();
            }
            incoming = channel.recv() => {
                match incoming {
                    Some(Message::DataModelResponse { value, error }) => match snapshot.take() {
                        Some(tx) => {
                            let _ = tx.send(Ok(Snapshot { value, error }));
                        }
                        None => debug!("unsolicited snapshot ignored"),
                    },
                    Some(Message::RefResponse { id }) => match self_ref.take() {
                        Some(tx) => {
                            let _ = tx.send(Ok(RefToken::from(id)));
                        }
                        None => debug!("unsolicited self id ignored"),
                    },
                    Some(request) => {
                        warn!(kind = request.kind(), "ignoring request sent to the client");
                    }
                    None => {
                        debug!("channel closed, dispatcher stopping");
                        break;
                    }
                }
            }
        }
    }
}
