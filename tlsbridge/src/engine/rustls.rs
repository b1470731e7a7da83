use std::io::{Read, Write};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, Connection, ServerConfig, ServerConnection};

use crate::engine::{CipherInfo, Engine, Mode, PeerCertificate};
use crate::error::Error;
#[cfg(feature = "logging")]
use crate::log::{debug, trace};
use crate::vecbuf::BufferQueue;

/// How much undelivered output a [`RustlsEngine`] holds, per direction,
/// before it starts refusing input.
pub const DEFAULT_ENGINE_BUFFER_LIMIT: usize = 64 * 1024;

/// An [`Engine`] driving a rustls client or server connection.
///
/// rustls is happy to accept any amount of input; this wrapper adds the
/// all-or-nothing flow control the bridge expects.  Decrypted plaintext and
/// outgoing TLS records are moved out of the connection as soon as they are
/// produced, and while either backlog is at its limit the input that would
/// grow it is refused.  A paused consumer therefore stalls the engine
/// rather than letting it buffer without bound.
///
/// Teardown only discards the backlogs.  The connection itself is released
/// when the engine is dropped.
pub struct RustlsEngine {
    conn: Connection,
    /// Decrypted plaintext waiting for `clear_out`.
    received: BufferQueue,
    /// TLS records waiting for `enc_out`.
    outgoing: BufferQueue,
    peer_closed: bool,
}

impl RustlsEngine {
    /// Make a client (initiator) engine connecting to `name`.
    pub fn client(config: Arc<ClientConfig>, name: ServerName<'static>) -> Result<Self, Error> {
        Ok(Self::new(ClientConnection::new(config, name)?.into()))
    }

    /// Make a server (responder) engine.
    pub fn server(config: Arc<ServerConfig>) -> Result<Self, Error> {
        Ok(Self::new(ServerConnection::new(config)?.into()))
    }

    /// Wrap an existing connection.
    pub fn new(mut conn: Connection) -> Self {
        // flow control happens in our own buffers
        conn.set_buffer_limit(None);
        Self {
            conn,
            received: BufferQueue::new(Some(DEFAULT_ENGINE_BUFFER_LIMIT)),
            outgoing: BufferQueue::new(Some(DEFAULT_ENGINE_BUFFER_LIMIT)),
            peer_closed: false,
        }
    }

    /// Sets how much undelivered output is held, per direction, before
    /// input is refused.
    ///
    /// A [`None`] limit means input is never refused.
    pub fn set_buffer_limit(&mut self, limit: Option<usize>) {
        self.received.set_limit(limit);
        self.outgoing.set_limit(limit);
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn process_new_packets(&mut self) -> Result<(), Error> {
        let io_state = self.conn.process_new_packets()?;

        let available = io_state.plaintext_bytes_to_read();
        if available > 0 {
            let mut plaintext = vec![0; available];
            self.conn
                .reader()
                .read_exact(&mut plaintext)?;
            self.received.enqueue(plaintext);
        }

        if io_state.peer_has_closed() && !self.peer_closed {
            debug!("peer sent close_notify");
            self.peer_closed = true;
        }

        self.flush_tls()
    }

    /// Move TLS records out of the connection.
    fn flush_tls(&mut self) -> Result<(), Error> {
        while self.conn.wants_write() {
            let mut records = Vec::new();
            if self.conn.write_tls(&mut records)? == 0 {
                break;
            }
            self.outgoing.enqueue(records);
        }

        Ok(())
    }
}

impl Engine for RustlsEngine {
    fn start(&mut self) -> Result<(), Error> {
        // a client has its first flight ready as soon as it is made
        self.flush_tls()
    }

    fn clear_in(&mut self, chunk: &[u8]) -> Result<usize, Error> {
        if self.outgoing.is_full() {
            return Ok(0);
        }

        self.conn.writer().write_all(chunk)?;
        self.flush_tls()?;
        Ok(chunk.len())
    }

    fn enc_in(&mut self, chunk: &[u8]) -> Result<usize, Error> {
        if self.received.is_full() {
            return Ok(0);
        }

        let mut rd = chunk;
        while !rd.is_empty() {
            if self.conn.read_tls(&mut rd)? == 0 {
                break;
            }
            self.process_new_packets()?;
        }

        if !rd.is_empty() {
            trace!("ignoring {} bytes after close_notify", rd.len());
        }

        Ok(chunk.len())
    }

    fn clear_out(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        Ok(self.received.read(buf))
    }

    fn enc_out(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.flush_tls()?;
        Ok(self.outgoing.read(buf))
    }

    fn is_handshake_finished(&self) -> bool {
        !self.conn.is_handshaking()
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        self.conn.send_close_notify();
        self.flush_tls()
    }

    /// Discards both backlogs.  The rustls connection, and the session
    /// secrets it holds, live on until this engine is dropped: drop the
    /// bridge, or take the engine back with [`DuplexBridge::into_parts()`]
    /// and drop it.
    ///
    /// [`DuplexBridge::into_parts()`]: crate::DuplexBridge::into_parts
    fn close(&mut self) {
        self.received.clear();
        self.outgoing.clear();
    }

    fn mode(&self) -> Mode {
        match self.conn {
            Connection::Client(_) => Mode::Initiator,
            Connection::Server(_) => Mode::Responder,
        }
    }

    fn peer_certificate(&self) -> Option<PeerCertificate> {
        self.conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|cert| PeerCertificate {
                der: cert.as_ref().to_vec(),
            })
    }

    fn cipher_info(&self) -> Option<CipherInfo> {
        let suite = self.conn.negotiated_cipher_suite()?.suite();
        let version = self.conn.protocol_version()?;
        Some(CipherInfo {
            name: match suite.as_str() {
                Some(name) => name.to_string(),
                None => format!("{:?}", suite),
            },
            version: match version.as_str() {
                Some(name) => name.to_string(),
                None => format!("{:?}", version),
            },
        })
    }

    fn peer_has_closed(&self) -> bool {
        self.peer_closed
    }
}
