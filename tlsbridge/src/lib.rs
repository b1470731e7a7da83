//! # tlsbridge - a TLS duplex bridge
//! tlsbridge turns a byte-oriented TLS state machine into two independent,
//! flow-controlled byte streams: one carrying cleartext application data and
//! one carrying the encrypted wire protocol.  Transport code and application
//! code can then be connected to a TLS session without either knowing about
//! the other.
//!
//! ## Design Overview
//! ### tlsbridge does not take care of network IO
//! It doesn't make or accept connections, or read or write sockets.  It
//! doesn't do cryptography either: that is the job of an [`Engine`].
//!
//! ### tlsbridge provides a duplex
//! A [`DuplexBridge`] owns an engine and a [`Handler`].  You write plaintext
//! into the [cleartext endpoint] and bytes received from the peer into the
//! [encrypted endpoint]; whatever comes out of the engine is handed to the
//! handler, chunk by chunk, tagged with the [`Side`] it belongs to:
//!
//! ```text
//!          TLS                                      Plaintext
//!          ===                                      =========
//!   encrypted().write()  +-----------------------+  data(Side::Cleartext, ..)
//!                        |                       |
//!              +-------->|     DuplexBridge      +--------->
//!                        |                       |
//!              <---------+   (owns the Engine)   |<---------+
//!                        |                       |
//!   data(Side::Encrypted, ..) +------------------+  cleartext().write()
//! ```
//!
//! Each call runs to completion: queued input is fed to the engine, and
//! output is pumped to the handler for as long as it keeps returning
//! [`Readiness::Ready`].  A handler that returns [`Readiness::Paused`] (or
//! an application that calls [`Endpoint::pause()`]) stops that direction
//! until [`Endpoint::resume()`].  [`Endpoint::write()`] returns false while
//! the direction its bytes come out of is paused; that is your cue to stop
//! writing until [`Handler::drain()`].
//!
//! ### Lifecycle
//! A bridge starts out [`Phase::Handshaking`], moves to [`Phase::Secure`]
//! (calling [`Handler::secure()`] exactly once) and ends in
//! [`Phase::Destroyed`] (calling [`Handler::end()`] exactly once).  A
//! graceful [`Endpoint::end()`] after the handshake is the only way to end
//! without an [`Error`].
//!
//! ## Getting started
//! Using the bundled rustls engine:
//!
//! ```rust,no_run
//! # #[cfg(feature = "rustls")]
//! # fn main() -> Result<(), tlsbridge::Error> {
//! use std::sync::Arc;
//!
//! use tlsbridge::{DuplexBridge, Handler, Readiness, RustlsEngine, Side};
//!
//! struct Printer;
//!
//! impl Handler for Printer {
//!     fn data(&mut self, side: Side, chunk: &[u8]) -> Readiness {
//!         println!("{side}: {} bytes", chunk.len());
//!         Readiness::Ready
//!     }
//! }
//!
//! # let config: Arc<rustls::ClientConfig> = panic!();
//! let name = "example.com".try_into().unwrap();
//! let engine = RustlsEngine::client(config, name)?;
//! let mut bridge = DuplexBridge::new(engine, Printer);
//! bridge.cleartext().write(&b"GET / HTTP/1.0\r\n\r\n"[..]);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "rustls"))]
//! # fn main() {}
//! ```
//!
//! [cleartext endpoint]: DuplexBridge::cleartext
//! [encrypted endpoint]: DuplexBridge::encrypted
//!
//! # Crate features
//! Here's a list of what features are exposed by the tlsbridge crate and what
//! they mean.
//!
//! - `logging`: this makes the tlsbridge crate depend on the `log` crate.
//!   tlsbridge outputs lifecycle transitions at `debug!` level, per-chunk
//!   traffic at `trace!` level, and teardown errors and caller mistakes at
//!   `warn!` level.  The log messages never contain payload bytes.  This
//!   feature is in the default set.
//!
//! - `rustls`: provides [`RustlsEngine`], an [`Engine`] driving a
//!   `rustls::Connection`.  This feature is in the default set.

// Require docs for public APIs, deny unsafe code, etc.
#![forbid(unsafe_code, unused_must_use)]
#![deny(
    clippy::use_self,
    missing_docs,
    unreachable_pub,
    unused_import_braces
)]
// Relax these clippy lints:
// - single_component_path_imports: our top-level `use log` import causes
//   a false positive, https://github.com/rust-lang/rust-clippy/issues/5210
// - new_without_default: for internal constructors, the indirection is not
//   helpful
#![allow(clippy::single_component_path_imports, clippy::new_without_default)]
// Enable documentation for all features on docs.rs
#![cfg_attr(docsrs, feature(doc_cfg))]

// log for logging (optional).
#[cfg(feature = "logging")]
use log;

#[cfg(not(feature = "logging"))]
#[macro_use]
mod log {
    macro_rules! trace    ( ($($tt:tt)*) => {{}} );
    macro_rules! debug    ( ($($tt:tt)*) => {{}} );
    macro_rules! warn     ( ($($tt:tt)*) => {{}} );
}

mod bridge;
mod config;
mod endpoint;
mod engine;
mod error;
mod handler;
mod vecbuf;

// The public interface is:
pub use crate::bridge::{DuplexBridge, Phase};
pub use crate::config::{BridgeConfig, TransportClosePolicy, DEFAULT_OUTPUT_CHUNK_SIZE};
pub use crate::endpoint::{Endpoint, Side};
pub use crate::engine::{CipherInfo, Engine, Mode, PeerCertificate};
#[cfg(feature = "rustls")]
#[cfg_attr(docsrs, doc(cfg(feature = "rustls")))]
pub use crate::engine::rustls::{RustlsEngine, DEFAULT_ENGINE_BUFFER_LIMIT};
pub use crate::error::{EngineMisbehaved, Error, OtherError, PrematureClose};
pub use crate::handler::{Handler, Readiness};
