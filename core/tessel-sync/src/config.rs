use std::time::Duration;
use tessel_types::{DEFAULT_ID_PREFIX, IdMint};

/// Default bound of each direction of an in-memory channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Configuration for channels and clients.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bound of each direction of an in-memory duplex channel, and of the
    /// client's command queue.
    pub channel_capacity: usize,
    /// How long a client request waits for its reply. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Prefix for ids minted by models reconstructed from snapshots.
    pub id_prefix: String,
}

impl SyncConfig {
    /// A fresh id mint using the configured prefix.
    #[must_use]
    pub fn mint(&self) -> IdMint {
        IdMint::with_prefix(self.id_prefix.clone())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            request_timeout: None,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}
