use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::endpoint::Side;

/// tlsbridge reports teardown causes using this type.
///
/// Every error surfaces exactly once, on the terminal [`Handler::end()`]
/// callback, and stays available afterwards via
/// [`DuplexBridge::close_reason()`].
///
/// [`Handler::end()`]: crate::Handler::end
/// [`DuplexBridge::close_reason()`]: crate::DuplexBridge::close_reason
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// An engine primitive failed during a cycle.
    ///
    /// Enums holding this variant will never compare equal to each other.
    Engine(OtherError),

    /// The engine broke its side of the contract.
    EngineMisbehaved(EngineMisbehaved),

    /// The rustls engine reported a protocol error.
    #[cfg(feature = "rustls")]
    Tls(rustls::Error),

    /// The transport carrying encrypted bytes went away before the
    /// bridge was torn down.
    PrematureClose(PrematureClose),

    /// `end()` was called before the handshake finished.
    HandshakeNotComplete,

    /// The bridge was torn down by [`DuplexBridge::abort()`].
    ///
    /// [`DuplexBridge::abort()`]: crate::DuplexBridge::abort
    Aborted(String),

    /// The supplied output chunk size was zero.
    BadOutputChunkSize,
}

impl Error {
    /// Wrap an arbitrary engine-side error.
    pub fn engine(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Engine(OtherError(Arc::new(err)))
    }
}

/// Ways in which an [`Engine`] implementation can violate its contract.
///
/// [`Engine`]: crate::Engine
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone)]
pub enum EngineMisbehaved {
    /// An input primitive consumed part of a chunk.  Only zero or the
    /// full length are legal answers.
    PartialInput {
        /// Which input pipeline was being fed
        side: Side,
        /// What the engine claimed to consume
        consumed: usize,
        /// The length of the chunk offered
        len: usize,
    },

    /// An output primitive claimed to produce more bytes than it was given
    /// room for.
    OutputOverrun {
        /// Which output pipeline was being pumped
        side: Side,
        /// What the engine claimed to produce
        produced: usize,
        /// The capacity offered
        capacity: usize,
    },
}

impl From<EngineMisbehaved> for Error {
    #[inline]
    fn from(e: EngineMisbehaved) -> Self {
        Self::EngineMisbehaved(e)
    }
}

/// When the encrypted transport closed underneath the bridge.
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PrematureClose {
    /// The handshake had not finished.
    DuringHandshake,

    /// The handshake had finished, but the close was not preceded by a
    /// graceful `end()`.
    AfterHandshake,
}

impl From<PrematureClose> for Error {
    #[inline]
    fn from(e: PrematureClose) -> Self {
        Self::PrematureClose(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Engine(ref err) => write!(f, "TLS engine failure: {}", err),
            Self::EngineMisbehaved(EngineMisbehaved::PartialInput {
                side,
                consumed,
                len,
            }) => write!(
                f,
                "TLS engine consumed {} of {} {:?} input bytes",
                consumed, len, side
            ),
            Self::EngineMisbehaved(EngineMisbehaved::OutputOverrun {
                side,
                produced,
                capacity,
            }) => write!(
                f,
                "TLS engine produced {} {:?} output bytes into a {} byte buffer",
                produced, side, capacity
            ),
            #[cfg(feature = "rustls")]
            Self::Tls(ref err) => write!(f, "TLS error: {}", err),
            Self::PrematureClose(PrematureClose::DuringHandshake) => {
                write!(f, "transport closed before the handshake finished")
            }
            Self::PrematureClose(PrematureClose::AfterHandshake) => {
                write!(f, "transport closed without a graceful shutdown")
            }
            Self::HandshakeNotComplete => write!(f, "ended before the handshake finished"),
            Self::Aborted(ref why) => write!(f, "aborted: {}", why),
            Self::BadOutputChunkSize => write!(f, "the supplied output chunk size was zero"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            #[cfg(feature = "rustls")]
            Self::Tls(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(feature = "rustls")]
impl From<rustls::Error> for Error {
    #[inline]
    fn from(e: rustls::Error) -> Self {
        Self::Tls(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::engine(e)
    }
}

/// Any other error that cannot be expressed by a more specific [`Error`] variant.
///
/// Typically produced by an [`Engine`] implementation exposing its own
/// error type.
///
/// Enums holding this type will never compare equal to each other.
///
/// [`Engine`]: crate::Engine
#[derive(Debug, Clone)]
pub struct OtherError(pub Arc<dyn StdError + Send + Sync>);

impl PartialEq<Self> for OtherError {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl From<OtherError> for Error {
    fn from(value: OtherError) -> Self {
        Self::Engine(value)
    }
}

impl fmt::Display for OtherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for OtherError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.0.as_ref())
    }
}
