use core::fmt;

use crate::config::{BridgeConfig, TransportClosePolicy};
use crate::endpoint::{Endpoint, PerSide, Side};
use crate::engine::{CipherInfo, Engine, Mode, PeerCertificate};
use crate::error::{EngineMisbehaved, Error, PrematureClose};
use crate::handler::Handler;
#[cfg(feature = "logging")]
use crate::log::{debug, trace, warn};
use crate::vecbuf::BufferQueue;

/// Where a bridge is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The handshake has not finished.
    Handshaking,
    /// The handshake finished and the bridge is carrying application data.
    Secure,
    /// Torn down.  Terminal.
    Destroyed,
}

/// The two lifecycle latches.  Both only ever go from false to true.
#[derive(Clone, Copy, Debug, Default)]
struct PairState {
    established: bool,
    done: bool,
}

impl PairState {
    fn phase(&self) -> Phase {
        match (self.done, self.established) {
            (true, _) => Phase::Destroyed,
            (false, true) => Phase::Secure,
            (false, false) => Phase::Handshaking,
        }
    }
}

/// What one pass over the pipelines achieved.
#[derive(Clone, Copy, Debug, Default)]
struct Progress {
    /// Some queued input was refused by the engine.
    refused: bool,
    /// Some output reached the handler.
    delivered: bool,
}

/// Turns an [`Engine`] into two flow-controlled byte streams.
///
/// ```text
///                  +------------------------------+
///  cleartext() --->|  Side Buffer --> engine -->  |---> data(Encrypted)
///                  |                              |
///  data(Cleartext)<|  <-- engine <-- Side Buffer  |<--- encrypted()
///                  +------------------------------+
/// ```
///
/// Writes on one side are queued and fed to the engine; whatever the
/// engine produces is pulled out in bounded chunks and handed to the
/// [`Handler`], one direction at a time, for as long as that direction's
/// consumer is ready.  Every public method runs one cycle of this to
/// completion before returning.
pub struct DuplexBridge<E: Engine, H: Handler> {
    engine: E,
    handler: H,
    config: BridgeConfig,
    state: PairState,
    /// Input waiting for the engine, by the side it was written to.
    pending: PerSide<BufferQueue>,
    /// Consumer readiness, by the side output is delivered on.
    ready: PerSide<bool>,
    scratch: Vec<u8>,
    close_reason: Option<Result<(), Error>>,
}

impl<E: Engine, H: Handler> DuplexBridge<E, H> {
    /// Make a bridge with the default [`BridgeConfig`].
    pub fn new(engine: E, handler: H) -> Self {
        Self::with_config(engine, handler, BridgeConfig::default())
    }

    /// Make a bridge, start the engine's handshake and run the first cycle.
    ///
    /// This does not fail: if the engine cannot start, the bridge is
    /// returned already torn down and the handler has seen
    /// [`Handler::end()`] with the error.
    pub fn with_config(engine: E, handler: H, config: BridgeConfig) -> Self {
        let mut bridge = Self {
            engine,
            handler,
            scratch: vec![0; config.output_chunk_size()],
            config,
            state: PairState::default(),
            pending: PerSide::default(),
            ready: PerSide::both(true),
            close_reason: None,
        };

        debug!("starting bridge as {}", bridge.engine.mode());
        match bridge.engine.start() {
            Ok(()) => bridge.cycle(),
            Err(err) => bridge.destroy(Some(err)),
        }

        bridge
    }

    /// The cleartext endpoint: write plaintext here.
    pub fn cleartext(&mut self) -> Endpoint<'_, E, H> {
        Endpoint::new(self, Side::Cleartext)
    }

    /// The encrypted endpoint: write bytes received from the peer here.
    pub fn encrypted(&mut self) -> Endpoint<'_, E, H> {
        Endpoint::new(self, Side::Encrypted)
    }

    /// The endpoint for `side`.
    pub fn endpoint(&mut self, side: Side) -> Endpoint<'_, E, H> {
        Endpoint::new(self, side)
    }

    /// Gracefully shut down.
    ///
    /// Asks the engine to start its protocol-level close, runs one cycle so
    /// the result can be flushed, then tears the bridge down.  This is a
    /// clean close if the handshake had finished, otherwise the bridge ends
    /// with [`Error::HandshakeNotComplete`].  Does nothing once torn down.
    pub fn end(&mut self) {
        if self.state.done {
            return;
        }

        debug!("ending bridge in phase {:?}", self.state.phase());
        if let Err(err) = self.engine.shutdown() {
            self.destroy(Some(err));
            return;
        }

        self.cycle();

        let error = match self.state.established {
            true => None,
            false => Some(Error::HandshakeNotComplete),
        };
        self.destroy(error);
    }

    /// The transport delivering encrypted bytes has closed.
    ///
    /// If the bridge is still live this tears it down; see
    /// [`TransportClosePolicy`] for when that counts as an error.
    pub fn transport_closed(&mut self) {
        if self.state.done {
            return;
        }

        let error = if !self.state.established {
            Some(PrematureClose::DuringHandshake.into())
        } else if self.config.transport_close_policy()
            == TransportClosePolicy::AllowAfterCloseNotify
            && self.engine.peer_has_closed()
        {
            None
        } else {
            Some(PrematureClose::AfterHandshake.into())
        };

        self.destroy(error);
    }

    /// Tear the bridge down immediately, discarding anything buffered.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.destroy(Some(Error::Aborted(reason.into())));
    }

    /// Where the bridge is in its life.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// True once the handshake has finished.  Stays true after teardown.
    pub fn is_established(&self) -> bool {
        self.state.established
    }

    /// True once the bridge has been torn down.
    pub fn is_done(&self) -> bool {
        self.state.done
    }

    /// Why the bridge was torn down: `None` while it is live, `Some(Ok(()))`
    /// after a clean close.
    pub fn close_reason(&self) -> Option<Result<(), &Error>> {
        self.close_reason
            .as_ref()
            .map(|reason| reason.as_ref().map(|_| ()))
    }

    /// Which end of the handshake the engine plays.
    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    /// The peer's certificate.  `None` before the handshake finishes.
    pub fn peer_certificate(&self) -> Option<PeerCertificate> {
        match self.state.established {
            true => self.engine.peer_certificate(),
            false => None,
        }
    }

    /// The negotiated cipher.  `None` before the handshake finishes.
    pub fn cipher_info(&self) -> Option<CipherInfo> {
        match self.state.established {
            true => self.engine.cipher_info(),
            false => None,
        }
    }

    /// This bridge's configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Take the bridge apart.  Does not tear it down.
    pub fn into_parts(self) -> (E, H) {
        (self.engine, self.handler)
    }

    pub(crate) fn write(&mut self, side: Side, chunk: Vec<u8>) -> bool {
        if self.state.done {
            warn!(
                "dropping {} bytes written to the {} side after teardown",
                chunk.len(),
                side
            );
            return false;
        }

        trace!("queueing {} bytes on the {} side", chunk.len(), side);
        self.pending[side].enqueue(chunk);
        self.cycle();

        !self.state.done && self.ready[side.peer()]
    }

    pub(crate) fn pause(&mut self, side: Side) {
        if self.ready[side] {
            trace!("pausing {} output", side);
            self.ready[side] = false;
        }
    }

    pub(crate) fn resume(&mut self, side: Side) {
        if self.state.done {
            return;
        }

        let was_paused = !self.ready[side];
        self.ready[side] = true;
        self.cycle();

        if was_paused && !self.state.done && self.ready[side] {
            trace!("{} output drained", side);
            self.handler.drain(side.peer());
        }
    }

    pub(crate) fn is_ready(&self, side: Side) -> bool {
        self.ready[side]
    }

    pub(crate) fn pending(&self, side: Side) -> impl Iterator<Item = &[u8]> + '_ {
        self.pending[side].chunks()
    }

    pub(crate) fn pending_len(&self, side: Side) -> usize {
        self.pending[side].len()
    }

    /// Drive all four pipelines as far as they will go.
    ///
    /// Finishing the handshake can unblock input the engine refused
    /// earlier in the same pass, so that transition buys one more pass.
    /// So does a pass that had input refused but delivered output, since
    /// pumping may have freed room in the engine.  Each extra pass needs
    /// the engine to have produced something, so this stops once input
    /// is exhausted or the engine goes quiet.
    fn cycle(&mut self) {
        while !self.state.done {
            let progress = match self.pass() {
                Ok(progress) => progress,
                Err(err) => {
                    self.destroy(Some(err));
                    return;
                }
            };

            if !self.state.established && self.engine.is_handshake_finished() {
                debug!("handshake finished");
                self.state.established = true;
                self.handler.secure();
                continue;
            }

            if !(progress.refused && progress.delivered) {
                return;
            }
            trace!("re-feeding input refused before output was pumped");
        }
    }

    fn pass(&mut self) -> Result<Progress, Error> {
        let mut progress = Progress::default();
        progress.refused |= self.feed(Side::Cleartext)?;
        progress.refused |= self.feed(Side::Encrypted)?;
        progress.delivered |= self.pump(Side::Cleartext)?;
        progress.delivered |= self.pump(Side::Encrypted)?;
        Ok(progress)
    }

    /// Give the engine queued input for `side` until it refuses a chunk.
    ///
    /// Returns whether a chunk was refused.
    fn feed(&mut self, side: Side) -> Result<bool, Error> {
        while let Some(chunk) = self.pending[side].dequeue() {
            let consumed = match side {
                Side::Cleartext => self.engine.clear_in(&chunk)?,
                Side::Encrypted => self.engine.enc_in(&chunk)?,
            };

            if consumed == 0 {
                trace!("engine refused {} {} bytes", chunk.len(), side);
                self.pending[side].requeue(chunk);
                return Ok(true);
            }

            if consumed != chunk.len() {
                return Err(EngineMisbehaved::PartialInput {
                    side,
                    consumed,
                    len: chunk.len(),
                }
                .into());
            }
        }

        Ok(false)
    }

    /// Hand output for `side` to the handler while it keeps wanting more.
    ///
    /// Returns whether anything was delivered.
    fn pump(&mut self, side: Side) -> Result<bool, Error> {
        let mut delivered = false;
        while self.ready[side] {
            let capacity = self.scratch.len();
            let produced = match side {
                Side::Cleartext => self.engine.clear_out(&mut self.scratch)?,
                Side::Encrypted => self.engine.enc_out(&mut self.scratch)?,
            };

            if produced == 0 {
                break;
            }

            if produced > capacity {
                return Err(EngineMisbehaved::OutputOverrun {
                    side,
                    produced,
                    capacity,
                }
                .into());
            }

            trace!("delivering {} {} bytes", produced, side);
            delivered = true;
            if !self
                .handler
                .data(side, &self.scratch[..produced])
                .is_ready()
            {
                self.pause(side);
            }
        }

        Ok(delivered)
    }

    /// Tear down, once.  Anything still buffered is discarded.
    fn destroy(&mut self, error: Option<Error>) {
        if self.state.done {
            return;
        }
        self.state.done = true;

        match &error {
            #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
            Some(err) => warn!("bridge torn down: {}", err),
            None => debug!("bridge closed"),
        }

        self.pending.cleartext.clear();
        self.pending.encrypted.clear();
        self.engine.close();

        self.close_reason = Some(match &error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        });
        self.handler.end(error);
    }
}

impl<E: Engine, H: Handler> fmt::Debug for DuplexBridge<E, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplexBridge")
            .field("mode", &self.engine.mode())
            .field("phase", &self.state.phase())
            .field("cleartext_pending", &self.pending.cleartext.len())
            .field("encrypted_pending", &self.pending.encrypted.len())
            .field("cleartext_ready", &self.ready.cleartext)
            .field("encrypted_ready", &self.ready.encrypted)
            .finish()
    }
}
