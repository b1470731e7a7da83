use core::fmt;
use core::ops::{Index, IndexMut};

use crate::bridge::DuplexBridge;
use crate::engine::Engine;
use crate::handler::Handler;

/// One of the two streams a bridge exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Application plaintext.
    Cleartext,
    /// TLS records on the wire.
    Encrypted,
}

impl Side {
    /// The other side.  Bytes written to one side come out of its peer.
    pub fn peer(self) -> Self {
        match self {
            Self::Cleartext => Self::Encrypted,
            Self::Encrypted => Self::Cleartext,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cleartext => f.write_str("cleartext"),
            Self::Encrypted => f.write_str("encrypted"),
        }
    }
}

/// A pair of values, one per [`Side`].
#[derive(Clone, Debug, Default)]
pub(crate) struct PerSide<T> {
    pub(crate) cleartext: T,
    pub(crate) encrypted: T,
}

impl<T: Clone> PerSide<T> {
    pub(crate) fn both(value: T) -> Self {
        Self {
            cleartext: value.clone(),
            encrypted: value,
        }
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Cleartext => &self.cleartext,
            Side::Encrypted => &self.encrypted,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Cleartext => &mut self.cleartext,
            Side::Encrypted => &mut self.encrypted,
        }
    }
}

/// The write/pause/resume/end surface of one side of a bridge.
///
/// Get one of these from [`DuplexBridge::cleartext()`] or
/// [`DuplexBridge::encrypted()`].
pub struct Endpoint<'a, E: Engine, H: Handler> {
    bridge: &'a mut DuplexBridge<E, H>,
    side: Side,
}

impl<'a, E: Engine, H: Handler> Endpoint<'a, E, H> {
    pub(crate) fn new(bridge: &'a mut DuplexBridge<E, H>, side: Side) -> Self {
        Self { bridge, side }
    }

    /// Which side this is.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Queue `chunk` for the engine and run a cycle.
    ///
    /// Returns whether the consumer of the peer side is ready for more:
    /// when this is false, stop writing until [`Handler::drain()`] is
    /// called for this side.  The chunk is always accepted, whatever the
    /// return value, unless the bridge is already torn down (then it is
    /// dropped and this returns false).
    pub fn write(&mut self, chunk: impl Into<Vec<u8>>) -> bool {
        self.bridge.write(self.side, chunk.into())
    }

    /// Stop delivering output on this side.
    pub fn pause(&mut self) {
        self.bridge.pause(self.side);
    }

    /// Restart output on this side and flush whatever is waiting.
    pub fn resume(&mut self) {
        self.bridge.resume(self.side);
    }

    /// Gracefully shut the bridge down.  Either side's `end()` ends both.
    pub fn end(&mut self) {
        self.bridge.end();
    }

    /// True if output on this side is paused.
    pub fn is_paused(&self) -> bool {
        !self.bridge.is_ready(self.side)
    }

    /// The chunks written to this side that the engine has not taken yet,
    /// front first.
    pub fn pending(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.bridge.pending(self.side)
    }

    /// How many bytes written to this side the engine has not taken yet.
    pub fn pending_len(&self) -> usize {
        self.bridge.pending_len(self.side)
    }
}

impl<E: Engine, H: Handler> fmt::Debug for Endpoint<'_, E, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("side", &self.side)
            .field("paused", &self.is_paused())
            .field("pending_len", &self.pending_len())
            .finish()
    }
}
