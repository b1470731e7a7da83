#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;

use tlsbridge::{CipherInfo, Engine, Error, Handler, Mode, PeerCertificate, Readiness, Side};

pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .try_init();
}

/// What the loopback engine sends on `shutdown()`.
pub const CLOSE_MARKER: &[u8] = b"<close_notify>";

/// The engine primitives a fault can be injected into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Start,
    ClearIn,
    EncIn,
    ClearOut,
    EncOut,
    Shutdown,
}

/// Knobs shared between a test and a [`Loopback`] it has given away.
#[derive(Debug, Default)]
pub struct Controls {
    pub handshake_finished: Cell<bool>,
    pub refuse_clear_in: Cell<bool>,
    pub refuse_enc_in: Cell<bool>,
    pub fail: Cell<Option<Primitive>>,
    pub partial_input: Cell<bool>,
    pub overrun_output: Cell<bool>,
    pub peer_closed: Cell<bool>,
    /// Refuse input while this many bytes are waiting to come out.
    pub backlog_limit: Cell<Option<usize>>,
}

/// An engine that copies plaintext straight to the wire and wire bytes
/// straight to plaintext.
#[derive(Debug)]
pub struct Loopback {
    pub controls: Rc<Controls>,
    pub mode: Mode,
    to_peer: VecDeque<u8>,
    to_app: VecDeque<u8>,
    pub starts: usize,
    pub shutdowns: usize,
    pub closes: usize,
}

impl Loopback {
    /// A loopback whose handshake has already finished.
    pub fn established(mode: Mode) -> (Self, Rc<Controls>) {
        let (engine, controls) = Self::handshaking(mode);
        controls.handshake_finished.set(true);
        (engine, controls)
    }

    /// A loopback that finishes its handshake when told to.
    pub fn handshaking(mode: Mode) -> (Self, Rc<Controls>) {
        let controls = Rc::new(Controls::default());
        let engine = Self {
            controls: Rc::clone(&controls),
            mode,
            to_peer: VecDeque::new(),
            to_app: VecDeque::new(),
            starts: 0,
            shutdowns: 0,
            closes: 0,
        };
        (engine, controls)
    }

    fn check(&self, primitive: Primitive) -> Result<(), Error> {
        match self.controls.fail.get() {
            Some(p) if p == primitive => Err(Error::engine(io::Error::new(
                io::ErrorKind::Other,
                format!("injected {:?} fault", primitive),
            ))),
            _ => Ok(()),
        }
    }

    fn take_in(&self, refuse: bool, chunk: &[u8], into: &mut VecDeque<u8>) -> usize {
        if refuse {
            return 0;
        }
        if let Some(limit) = self.controls.backlog_limit.get() {
            if into.len() >= limit {
                return 0;
            }
        }
        if self.controls.partial_input.get() && chunk.len() > 1 {
            into.push_back(chunk[0]);
            return 1;
        }
        into.extend(chunk);
        chunk.len()
    }

    fn give_out(&self, from: &mut VecDeque<u8>, buf: &mut [u8]) -> usize {
        let n = from.len().min(buf.len());
        for (dst, src) in buf.iter_mut().zip(from.drain(..n)) {
            *dst = src;
        }
        match self.controls.overrun_output.get() && n > 0 {
            true => buf.len() + 1,
            false => n,
        }
    }
}

impl Engine for Loopback {
    fn start(&mut self) -> Result<(), Error> {
        self.check(Primitive::Start)?;
        self.starts += 1;
        Ok(())
    }

    fn clear_in(&mut self, chunk: &[u8]) -> Result<usize, Error> {
        self.check(Primitive::ClearIn)?;
        let mut to_peer = std::mem::take(&mut self.to_peer);
        let n = self.take_in(self.controls.refuse_clear_in.get(), chunk, &mut to_peer);
        self.to_peer = to_peer;
        Ok(n)
    }

    fn enc_in(&mut self, chunk: &[u8]) -> Result<usize, Error> {
        self.check(Primitive::EncIn)?;
        let mut to_app = std::mem::take(&mut self.to_app);
        let n = self.take_in(self.controls.refuse_enc_in.get(), chunk, &mut to_app);
        self.to_app = to_app;
        Ok(n)
    }

    fn clear_out(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.check(Primitive::ClearOut)?;
        let mut to_app = std::mem::take(&mut self.to_app);
        let n = self.give_out(&mut to_app, buf);
        self.to_app = to_app;
        Ok(n)
    }

    fn enc_out(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.check(Primitive::EncOut)?;
        let mut to_peer = std::mem::take(&mut self.to_peer);
        let n = self.give_out(&mut to_peer, buf);
        self.to_peer = to_peer;
        Ok(n)
    }

    fn is_handshake_finished(&self) -> bool {
        self.controls.handshake_finished.get()
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        self.check(Primitive::Shutdown)?;
        self.shutdowns += 1;
        self.to_peer.extend(CLOSE_MARKER);
        Ok(())
    }

    fn close(&mut self) {
        self.closes += 1;
        self.to_peer.clear();
        self.to_app.clear();
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn peer_certificate(&self) -> Option<PeerCertificate> {
        Some(PeerCertificate {
            der: b"loopback certificate".to_vec(),
        })
    }

    fn cipher_info(&self) -> Option<CipherInfo> {
        Some(CipherInfo {
            name: "NULL_WITH_NULL_NULL".to_string(),
            version: "loopback".to_string(),
        })
    }

    fn peer_has_closed(&self) -> bool {
        self.controls.peer_closed.get()
    }
}

/// Everything a [`Recorder`] can be told.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Data(Side, Vec<u8>),
    Drain(Side),
    Secure,
    End(Option<Error>),
}

/// A handler that writes down what happens to it.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    /// How many more chunks a side accepts before pausing itself.
    pub budgets: HashMap<Side, usize>,
}

impl Recorder {
    pub fn with_budget(side: Side, chunks: usize) -> Self {
        let mut recorder = Self::default();
        recorder.budgets.insert(side, chunks);
        recorder
    }

    /// Each chunk delivered on `side`, in order.
    pub fn chunks(&self, side: Side) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                Event::Data(s, chunk) if *s == side => Some(chunk.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Everything delivered on `side`, concatenated.
    pub fn data(&self, side: Side) -> Vec<u8> {
        self.chunks(side).concat()
    }

    /// Remove and return everything delivered on `side`, concatenated.
    pub fn take(&mut self, side: Side) -> Vec<u8> {
        let mut taken = Vec::new();
        self.events.retain(|ev| match ev {
            Event::Data(s, chunk) if *s == side => {
                taken.extend_from_slice(chunk);
                false
            }
            _ => true,
        });
        taken
    }

    pub fn secure_count(&self) -> usize {
        self.count(|ev| matches!(ev, Event::Secure))
    }

    pub fn drain_count(&self, side: Side) -> usize {
        self.count(|ev| *ev == Event::Drain(side))
    }

    pub fn ends(&self) -> Vec<&Option<Error>> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                Event::End(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|ev| f(ev)).count()
    }
}

impl Handler for Recorder {
    fn data(&mut self, side: Side, chunk: &[u8]) -> Readiness {
        self.events
            .push(Event::Data(side, chunk.to_vec()));

        match self.budgets.get_mut(&side) {
            Some(budget) => {
                *budget = budget.saturating_sub(1);
                Readiness::from(*budget > 0)
            }
            None => Readiness::Ready,
        }
    }

    fn drain(&mut self, side: Side) {
        self.events.push(Event::Drain(side));
    }

    fn secure(&mut self) {
        self.events.push(Event::Secure);
    }

    fn end(&mut self, error: Option<Error>) {
        self.events.push(Event::End(error));
    }
}
