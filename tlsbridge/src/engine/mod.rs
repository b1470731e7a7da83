use core::fmt;

use crate::error::Error;

#[cfg(feature = "rustls")]
pub(crate) mod rustls;

/// Which end of the handshake an engine plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// We send the first handshake flight (a TLS client).
    Initiator,
    /// We wait for the peer to start (a TLS server).
    Responder,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

/// The certificate the peer authenticated with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerCertificate {
    /// DER encoding of the end-entity certificate.
    pub der: Vec<u8>,
}

/// What was negotiated with the peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherInfo {
    /// The cipher suite name, e.g. `TLS13_AES_128_GCM_SHA256`.
    pub name: String,
    /// The protocol version, e.g. `TLSv1_3`.
    pub version: String,
}

/// A synchronous, non-blocking TLS state machine the bridge can drive.
///
/// The bridge owns its engine exclusively and calls it from a single call
/// stack.  No method may block on I/O.
///
/// ```text
///                +-------------------+
///  clear_in() -->|                   |--> enc_out()
///                |      Engine       |
///  clear_out() <-|                   |<-- enc_in()
///                +-------------------+
/// ```
pub trait Engine {
    /// Begin the handshake.  Called exactly once, when the bridge is built.
    fn start(&mut self) -> Result<(), Error>;

    /// Offer plaintext for encryption.
    ///
    /// Returns either `0` (try again later; nothing was taken) or
    /// `chunk.len()`.  Any other value is a contract breach.
    fn clear_in(&mut self, chunk: &[u8]) -> Result<usize, Error>;

    /// Offer received TLS bytes.  Same all-or-nothing contract as
    /// [`Engine::clear_in()`].
    fn enc_in(&mut self, chunk: &[u8]) -> Result<usize, Error>;

    /// Copy decrypted plaintext into `buf`, returning how many bytes were
    /// written.  `0` means nothing is ready.
    fn clear_out(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Copy TLS bytes destined for the peer into `buf`, returning how many
    /// bytes were written.  `0` means nothing is ready.
    fn enc_out(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Once this returns true it must keep returning true.
    fn is_handshake_finished(&self) -> bool;

    /// Start a protocol-level close (e.g. queue a close_notify alert).
    fn shutdown(&mut self) -> Result<(), Error>;

    /// Release resources.  Must be idempotent; the bridge calls it once.
    fn close(&mut self);

    /// Which end of the handshake we play.
    fn mode(&self) -> Mode;

    /// The peer's certificate, once the handshake has finished.
    fn peer_certificate(&self) -> Option<PeerCertificate> {
        None
    }

    /// The negotiated cipher, once the handshake has finished.
    fn cipher_info(&self) -> Option<CipherInfo> {
        None
    }

    /// True if the peer has cleanly closed its sending direction
    /// (a TLS close_notify).
    fn peer_has_closed(&self) -> bool {
        false
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn start(&mut self) -> Result<(), Error> {
        (**self).start()
    }

    fn clear_in(&mut self, chunk: &[u8]) -> Result<usize, Error> {
        (**self).clear_in(chunk)
    }

    fn enc_in(&mut self, chunk: &[u8]) -> Result<usize, Error> {
        (**self).enc_in(chunk)
    }

    fn clear_out(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        (**self).clear_out(buf)
    }

    fn enc_out(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        (**self).enc_out(buf)
    }

    fn is_handshake_finished(&self) -> bool {
        (**self).is_handshake_finished()
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        (**self).shutdown()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn mode(&self) -> Mode {
        (**self).mode()
    }

    fn peer_certificate(&self) -> Option<PeerCertificate> {
        (**self).peer_certificate()
    }

    fn cipher_info(&self) -> Option<CipherInfo> {
        (**self).cipher_info()
    }

    fn peer_has_closed(&self) -> bool {
        (**self).peer_has_closed()
    }
}
