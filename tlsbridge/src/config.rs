use crate::error::Error;

/// How many bytes the output pumps pull from the engine at a time.
pub const DEFAULT_OUTPUT_CHUNK_SIZE: usize = 4096;

/// What to make of the encrypted transport closing before the bridge
/// has been torn down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportClosePolicy {
    /// Any such close is premature and ends the bridge with
    /// [`Error::PrematureClose`].
    #[default]
    Strict,

    /// Like `Strict`, except that once the handshake has finished and the
    /// engine reports the peer sent its close_notify, the close is treated
    /// as a clean end.
    AllowAfterCloseNotify,
}

/// Common configuration for a [`DuplexBridge`].
///
/// Making one of these is cheap; the defaults suit most uses.
///
/// ```
/// # use tlsbridge::{BridgeConfig, TransportClosePolicy};
/// let config = BridgeConfig::default()
///     .with_output_chunk_size(16 * 1024)
///     .unwrap()
///     .with_transport_close_policy(TransportClosePolicy::AllowAfterCloseNotify);
/// assert_eq!(config.output_chunk_size(), 16 * 1024);
/// ```
///
/// [`DuplexBridge`]: crate::DuplexBridge
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    output_chunk_size: usize,
    transport_close: TransportClosePolicy,
}

impl BridgeConfig {
    /// Set the largest chunk delivered through [`Handler::data()`].
    ///
    /// Zero is rejected with [`Error::BadOutputChunkSize`].
    ///
    /// [`Handler::data()`]: crate::Handler::data
    pub fn with_output_chunk_size(mut self, size: usize) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::BadOutputChunkSize);
        }
        self.output_chunk_size = size;
        Ok(self)
    }

    /// Choose how an early transport close is judged.
    pub fn with_transport_close_policy(mut self, policy: TransportClosePolicy) -> Self {
        self.transport_close = policy;
        self
    }

    /// The largest chunk delivered through [`Handler::data()`].
    ///
    /// [`Handler::data()`]: crate::Handler::data
    pub fn output_chunk_size(&self) -> usize {
        self.output_chunk_size
    }

    /// How an early transport close is judged.
    pub fn transport_close_policy(&self) -> TransportClosePolicy {
        self.transport_close
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            output_chunk_size: DEFAULT_OUTPUT_CHUNK_SIZE,
            transport_close: TransportClosePolicy::default(),
        }
    }
}
