//! Connection lifecycle driver.
//!
//! A [`Component`] owns one selector, one root channel and one receive
//! buffer. [`Component::start`] moves them onto a dedicated thread named after
//! the component id; that thread is the only one that touches the selector,
//! the buffer and interest sets. Other threads may only clear the running
//! flag, push to a role's outbound queue, and poke the waker.
//!
//! Each loop iteration waits on the selector with a bounded timeout and routes
//! every ready key to one of four transitions:
//!
//! ```text
//!  connectable ──▶ finish handshake ──▶ interest = write
//!  acceptable  ──▶ accept one peer  ──▶ register peer, interest = read
//!  readable    ──▶ read once        ──▶ role.handle_incoming(payload)
//!  writable    ──▶ role.write       ──▶ role reverts interest to read
//! ```
//!
//! Failures on one channel close and deregister that channel only.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::reactor::socket::{accept_client, finish_connect};
use crate::reactor::{
    Channel, Interest, Readiness, SelectedKey, Selector, ShutdownReport, Token, Waker,
};

use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// Role-specific behaviour plugged into the driver.
///
/// Implemented by the server and client roles only.
pub(crate) trait Role: Send + 'static {
    /// Interest the root channel is registered under.
    const INITIAL_INTEREST: Interest;

    fn on_connected(&mut self, _token: Token) {}

    fn on_accepted(&mut self, _token: Token, _peer: SocketAddr) {}

    /// Called with exactly the bytes of one read.
    fn handle_incoming(&mut self, selector: &mut Selector, token: Token, data: &[u8]);

    /// Flushes pending output; must leave the channel under a sensible
    /// interest (normally read once drained).
    fn write(&mut self, selector: &mut Selector, token: Token) -> io::Result<()>;

    /// The waker fired; cross-thread requests should be picked up here.
    fn on_wake(&mut self, _selector: &mut Selector) {}

    fn on_closed(&mut self, _token: Token) {}
}

/// Handle to an event loop, before and after it is moved onto its thread.
pub(crate) struct Component<R: Role> {
    id: String,
    running: Arc<AtomicBool>,
    waker: Waker,
    event_loop: Option<EventLoop<R>>,
    thread: Option<JoinHandle<ShutdownReport>>,
}

impl<R: Role> Component<R> {
    /// Opens the selector and registers `channel` under the role's initial
    /// interest. Nothing runs until [`start`](Self::start).
    pub(crate) fn new(id: impl Into<String>, config: &Config, channel: Channel, role: R) -> Result<Self> {
        config.validate()?;

        let id = id.into();
        let mut selector = Selector::open(config.max_events).map_err(Error::Selector)?;
        let root = selector
            .register(channel, R::INITIAL_INTEREST)
            .map_err(Error::Selector)?;
        let waker = selector.waker();
        let running = Arc::new(AtomicBool::new(false));

        let event_loop = EventLoop {
            id: id.clone(),
            buffer: vec![0; config.buffer_size],
            selector,
            root,
            role,
            running: running.clone(),
            timeout: config.select_timeout,
        };

        Ok(Self {
            id,
            running,
            waker,
            event_loop: Some(event_loop),
            thread: None,
        })
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawns the loop thread. A component can only be started once.
    pub(crate) fn start(&mut self) -> Result<()> {
        let Some(event_loop) = self.event_loop.take() else {
            return Err(Error::AlreadyStarted(self.id.clone()));
        };

        self.running.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name(self.id.clone())
            .spawn(move || event_loop.run());

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(Error::ThreadSpawn(err))
            }
        }
    }

    /// Asks the loop to exit after its current wait. Does not block.
    ///
    /// Calling it again, or before `start`, does nothing.
    pub(crate) fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        debug!("[{}] stop requested", self.id);
        self.wake();
    }

    pub(crate) fn waker(&self) -> Waker {
        self.waker.clone()
    }

    /// Interrupts the loop's current wait.
    pub(crate) fn wake(&self) {
        if let Err(err) = self.waker.wake() {
            warn!("[{}] failed to wake event loop: {}", self.id, err);
        }
    }

    /// Waits for the loop thread to finish its cleanup.
    pub(crate) fn join(&mut self) -> Result<ShutdownReport> {
        let Some(handle) = self.thread.take() else {
            return Err(Error::NotStarted(self.id.clone()));
        };

        handle
            .join()
            .map_err(|_| Error::LoopPanicked(self.id.clone()))
    }
}

impl<R: Role> Drop for Component<R> {
    fn drop(&mut self) {
        self.stop();

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("[{}] event loop panicked", self.id);
            }
        }
    }
}

/// Everything the loop thread owns.
struct EventLoop<R: Role> {
    id: String,
    buffer: Vec<u8>,
    selector: Selector,
    root: Token,
    role: R,
    running: Arc<AtomicBool>,
    timeout: Duration,
}

impl<R: Role> EventLoop<R> {
    fn run(mut self) -> ShutdownReport {
        debug!(
            "[{}] event loop started with {} channel(s), root token {}",
            self.id,
            self.selector.len(),
            self.root
        );

        let mut keys = Vec::new();
        while self.running.load(Ordering::Acquire) {
            self.run_once(&mut keys);
        }

        let id = self.id;
        let report = self.selector.close();
        debug!(
            "[{}] event loop stopped: {} channels closed, {} failed",
            id, report.closed, report.failed
        );

        report
    }

    fn run_once(&mut self, keys: &mut Vec<SelectedKey>) {
        let woken = match self.selector.select(self.timeout, keys) {
            Ok(woken) => woken,
            Err(err) => {
                error!("[{}] selector wait failed: {}", self.id, err);
                return;
            }
        };

        if woken {
            self.role.on_wake(&mut self.selector);
        }

        for key in keys.iter() {
            // An earlier key in this batch may have closed the channel.
            if !self.selector.contains(key.token) {
                continue;
            }

            match key.readiness {
                Readiness::Connectable => self.connect(key.token),
                Readiness::Acceptable => self.accept(key.token),
                Readiness::Readable => self.read(key.token),
                Readiness::Writable => self.write(key.token),
            }
        }
    }

    fn connect(&mut self, token: Token) {
        let result = match self.selector.channel(token) {
            Some(Channel::Stream(stream)) => finish_connect(stream),
            _ => return,
        };

        match result {
            Ok(true) => {
                if let Err(err) = self.selector.set_interest(token, Interest::Write) {
                    warn!("[{}] token {}: cannot switch to write: {}", self.id, token, err);
                    self.close_channel(token);
                    return;
                }
                debug!("[{}] token {}: connected", self.id, token);
                self.role.on_connected(token);
            }
            Ok(false) => trace!("[{}] token {}: connect still pending", self.id, token),
            Err(err) => {
                error!("[{}] token {}: connect failed: {}", self.id, token, err);
                self.close_channel(token);
            }
        }
    }

    fn accept(&mut self, token: Token) {
        let accepted = match self.selector.channel(token) {
            Some(Channel::Listener(listener)) => accept_client(listener),
            _ => return,
        };

        match accepted {
            Ok(Some((stream, peer))) => {
                match self.selector.register(Channel::Stream(stream), Interest::Read) {
                    Ok(peer_token) => {
                        debug!("[{}] accepted {} as token {}", self.id, peer, peer_token);
                        self.role.on_accepted(peer_token, peer);
                    }
                    Err(err) => warn!("[{}] cannot register {}: {}", self.id, peer, err),
                }
            }
            Ok(None) => {}
            Err(err) => warn!("[{}] accept failed: {}", self.id, err),
        }
    }

    fn read(&mut self, token: Token) {
        let result = match self.selector.channel(token) {
            Some(Channel::Stream(stream)) => read_once(stream, &mut self.buffer),
            _ => return,
        };

        match result {
            Ok(0) => {
                debug!("[{}] token {}: peer closed", self.id, token);
                self.close_channel(token);
            }
            Ok(n) => {
                let data = self.buffer[..n].to_vec();
                trace!("[{}] token {}: read {} bytes", self.id, token, n);
                self.role.handle_incoming(&mut self.selector, token, &data);
            }
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                debug!("[{}] token {}: read failed: {}", self.id, token, err);
                self.close_channel(token);
            }
        }
    }

    fn write(&mut self, token: Token) {
        if let Err(err) = self.role.write(&mut self.selector, token) {
            debug!("[{}] token {}: write failed: {}", self.id, token, err);
            self.close_channel(token);
        }
    }

    fn close_channel(&mut self, token: Token) {
        let Some(channel) = self.selector.cancel(token) else {
            return;
        };

        if let Err(err) = channel.close() {
            trace!("[{}] token {}: close failed: {}", self.id, token, err);
        }
        self.role.on_closed(token);
    }
}

/// Reads from the start of `buffer`; earlier contents are never looked at.
fn read_once(mut stream: &TcpStream, buffer: &mut [u8]) -> io::Result<usize> {
    stream.read(buffer)
}
