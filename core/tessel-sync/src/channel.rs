//! Message channel abstraction.
//!
//! The replication protocol runs over any ordered, asynchronous, duplex
//! channel. [`duplex`] provides an in-memory pair for tests and for
//! controller/worker setups inside one process.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::Message;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

/// One end of an ordered duplex message channel.
///
/// Both methods take `&self` so one task can wait on a send and a receive
/// at the same time.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Sends a message to the other end.
    ///
    /// Dropping the future before it completes must not deliver the message.
    async fn send(&self, message: Message) -> SyncResult<()>;

    /// Receives the next message from the other end.
    /// Returns `None` once the other end is gone and the queue is drained.
    ///
    /// Implementations must be cancel-safe: dropping the future before it
    /// completes must not lose a message.
    async fn recv(&self) -> Option<Message>;
}

/// In-memory channel end backed by a pair of bounded `mpsc` queues.
#[derive(Debug)]
pub struct DuplexChannel {
    tx: mpsc::Sender<Message>,
    rx: Mutex<mpsc::Receiver<Message>>,
}

/// Creates a connected pair of in-memory channel ends, each direction
/// bounded to `capacity` queued messages.
#[must_use]
pub fn duplex(capacity: usize) -> (DuplexChannel, DuplexChannel) {
    let (a_tx, b_rx) = mpsc::channel(capacity.max(1));
    let (b_tx, a_rx) = mpsc::channel(capacity.max(1));
    (
        DuplexChannel {
            tx: a_tx,
            rx: Mutex::new(a_rx),
        },
        DuplexChannel {
            tx: b_tx,
            rx: Mutex::new(b_rx),
        },
    )
}

/// Like [`duplex`] with the capacity taken from `config`.
#[must_use]
pub fn duplex_with_config(config: &SyncConfig) -> (DuplexChannel, DuplexChannel) {
    duplex(config.channel_capacity)
}

impl DuplexChannel {
    /// Whether the other end has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Receives a queued message without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.get_mut().try_recv().ok()
    }
}

#[async_trait]
impl MessageChannel for DuplexChannel {
    async fn send(&self, message: Message) -> SyncResult<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    async fn recv(&self) -> Option<Message> {
        self.rx.lock().await.recv().await
    }
}
