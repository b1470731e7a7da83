use crate::endpoint::Side;
use crate::error::Error;

/// Whether a consumer wants more output right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// Keep it coming.
    Ready,
    /// Stop pumping this direction until it is resumed.
    Paused,
}

impl Readiness {
    /// True for [`Readiness::Ready`].
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl From<bool> for Readiness {
    fn from(ready: bool) -> Self {
        match ready {
            true => Self::Ready,
            false => Self::Paused,
        }
    }
}

/// Receives everything a [`DuplexBridge`] emits.
///
/// Callbacks run synchronously from inside the bridge call that caused
/// them, and cannot call back into the bridge.  A consumer that wants to
/// stop output does so by returning [`Readiness::Paused`] from
/// [`Handler::data()`]; it is restarted with [`Endpoint::resume()`].
///
/// [`DuplexBridge`]: crate::DuplexBridge
/// [`Endpoint::resume()`]: crate::Endpoint::resume
pub trait Handler {
    /// Output produced on `side`.
    ///
    /// For [`Side::Cleartext`] this is decrypted application data; for
    /// [`Side::Encrypted`] it is TLS data to send to the peer.  `chunk` is
    /// never empty and never longer than the configured output chunk size.
    fn data(&mut self, side: Side, chunk: &[u8]) -> Readiness;

    /// Writes on `side` may continue: the output their bytes emerge from
    /// has been resumed.
    fn drain(&mut self, side: Side) {
        let _ = side;
    }

    /// The handshake finished.  Called at most once.
    fn secure(&mut self) {}

    /// The bridge was torn down.  Called exactly once; `error` is `None`
    /// only for a graceful close after the handshake finished.
    fn end(&mut self, error: Option<Error>) {
        let _ = error;
    }
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn data(&mut self, side: Side, chunk: &[u8]) -> Readiness {
        (**self).data(side, chunk)
    }

    fn drain(&mut self, side: Side) {
        (**self).drain(side)
    }

    fn secure(&mut self) {
        (**self).secure()
    }

    fn end(&mut self, error: Option<Error>) {
        (**self).end(error)
    }
}
