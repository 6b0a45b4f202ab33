//! Connecting role.
//!
//! The client starts a non-blocking connect at construction time and
//! registers the socket for connect readiness. Once the handshake completes
//! the channel is switched to write, which flushes anything queued so far,
//! and then back to read.
//!
//! [`Client::send_message`] and [`MessageSender::send`] may be called from any
//! thread, before or after the connection is established. Messages are
//! framed, queued in call order and the loop is woken so it can switch the
//! channel to write.

use crate::codec::{frame, split_messages};
use crate::component::{Component, OutboundQueue, PendingWrites, Role};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reactor::socket::{connect_nonblocking, resolve};
use crate::reactor::{Channel, Interest, Selector, ShutdownReport, Token, Waker};

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Receives every decoded message, in arrival order, on the loop thread.
///
/// Must return quickly: it runs inline with I/O servicing. Any
/// `FnMut(&str)` closure is a handler.
pub trait MessageHandler: Send + 'static {
    fn on_message(&mut self, message: &str);
}

impl<F> MessageHandler for F
where
    F: FnMut(&str) + Send + 'static,
{
    fn on_message(&mut self, message: &str) {
        self(message)
    }
}

pub(crate) struct ClientRole<H> {
    id: String,
    delimiter: String,
    handler: H,
    outbound: Arc<OutboundQueue>,
    pending: PendingWrites,
    connection: Option<Token>,
}

impl<H: MessageHandler> Role for ClientRole<H> {
    const INITIAL_INTEREST: Interest = Interest::Connect;

    fn on_connected(&mut self, token: Token) {
        self.connection = Some(token);
    }

    fn handle_incoming(&mut self, _selector: &mut Selector, _token: Token, data: &[u8]) {
        for message in split_messages(data, &self.delimiter) {
            self.handler.on_message(&message);
        }
    }

    fn write(&mut self, selector: &mut Selector, token: Token) -> io::Result<()> {
        for message in self.outbound.take_all() {
            self.pending.push(message);
        }

        let drained = match selector.channel(token) {
            Some(Channel::Stream(stream)) => self.pending.flush_to(stream)?,
            _ => return Ok(()),
        };
        trace!("[{}] flushed outbound queue (drained: {})", self.id, drained);

        if drained {
            selector.set_interest(token, Interest::Read)?;
        }

        Ok(())
    }

    fn on_wake(&mut self, selector: &mut Selector) {
        let Some(token) = self.connection else {
            return;
        };

        if self.outbound.is_empty() {
            return;
        }

        if let Err(err) = selector.set_interest(token, Interest::Write) {
            warn!("[{}] cannot switch to write: {}", self.id, err);
        }
    }

    fn on_closed(&mut self, token: Token) {
        if self.connection == Some(token) {
            debug!("[{}] connection closed", self.id);
            self.connection = None;
        }
    }
}

/// Cloneable handle for queueing messages from any thread.
#[derive(Clone, Debug)]
pub struct MessageSender {
    outbound: Arc<OutboundQueue>,
    waker: Waker,
    delimiter: String,
}

impl MessageSender {
    /// Frames `message`, queues it behind everything sent before, and wakes
    /// the loop so it can switch the channel to write.
    ///
    /// `message` must not contain the delimiter.
    pub fn send(&self, message: &str) {
        self.outbound.push(frame(message, &self.delimiter));

        if let Err(err) = self.waker.wake() {
            warn!("failed to wake event loop: {}", err);
        }
    }

    /// Messages queued but not yet taken by the loop.
    pub fn queued(&self) -> usize {
        self.outbound.len()
    }
}

/// A connecting component exchanging delimiter-framed text messages.
pub struct Client<H: MessageHandler> {
    component: Component<ClientRole<H>>,
    sender: MessageSender,
    remote_addr: SocketAddr,
}

impl<H: MessageHandler> Client<H> {
    /// Connects to `host:port` with the default configuration.
    pub fn connect(id: impl Into<String>, host: &str, port: u16, handler: H) -> Result<Self> {
        Self::connect_with(id, host, port, Config::default(), handler)
    }

    pub fn connect_with(
        id: impl Into<String>,
        host: &str,
        port: u16,
        config: Config,
        handler: H,
    ) -> Result<Self> {
        let address = resolve(host, port)
            .ok()
            .flatten()
            .ok_or_else(|| Error::AddressResolution(format!("{host}:{port}")))?;

        Self::connect_addr(id, address, config, handler)
    }

    /// Starts connecting to `address`; the handshake finishes on the loop.
    pub fn connect_addr(id: impl Into<String>, address: SocketAddr, config: Config, handler: H) -> Result<Self> {
        config.validate()?;

        let id = id.into();
        let stream = connect_nonblocking(address).map_err(|source| Error::Connect {
            addr: address,
            source,
        })?;

        let outbound = Arc::new(OutboundQueue::new());
        let role = ClientRole {
            id: id.clone(),
            delimiter: config.delimiter.clone(),
            handler,
            outbound: outbound.clone(),
            pending: PendingWrites::new(),
            connection: None,
        };
        let component = Component::new(id, &config, Channel::Stream(stream), role)?;
        debug!("[{}] connecting to {}", component.id(), address);

        let sender = MessageSender {
            outbound,
            waker: component.waker(),
            delimiter: config.delimiter,
        };

        Ok(Self {
            component,
            sender,
            remote_addr: address,
        })
    }

    /// Queues `message` for sending; see [`MessageSender::send`].
    pub fn send_message(&self, message: &str) {
        self.sender.send(message);
    }

    /// A handle other threads can send through.
    pub fn sender(&self) -> MessageSender {
        self.sender.clone()
    }

    /// Messages queued but not yet taken by the loop.
    pub fn queued(&self) -> usize {
        self.sender.queued()
    }

    pub fn id(&self) -> &str {
        self.component.id()
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn is_running(&self) -> bool {
        self.component.is_running()
    }

    pub fn start(&mut self) -> Result<()> {
        self.component.start()
    }

    pub fn stop(&self) {
        self.component.stop();
    }

    pub fn join(&mut self) -> Result<ShutdownReport> {
        self.component.join()
    }
}
