//! Listening role.
//!
//! The server binds a non-blocking listener, registers it for accept, and
//! registers every accepted peer for read. Each inbound payload is split on
//! the delimiter and handed to a [`ServerHandler`], whose [`Dispatch`] decides
//! where a response goes. Peers with queued output are switched to write
//! interest until their queue drains.
//!
//! # Example
//!
//! ```no_run
//! use chat_reactor::{Dispatch, PeerId, Server};
//!
//! # fn main() -> chat_reactor::Result<()> {
//! let mut server = Server::bind("chat-server", 9000, |_peer: PeerId, message: &str| {
//!     Dispatch::Broadcast(message.to_string())
//! })?;
//! server.start()?;
//! // ...
//! server.stop();
//! let report = server.join()?;
//! println!("closed {} channels", report.closed);
//! # Ok(())
//! # }
//! ```

use crate::codec::{frame, split_messages};
use crate::component::{Component, PendingWrites, Role};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reactor::socket::bind_listener;
use crate::reactor::{Channel, Interest, Selector, ShutdownReport, Token};

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use tracing::{debug, trace, warn};

/// Identifies a connected peer for as long as it stays connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub(crate) Token);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Where the response to an inbound message goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// No response
    None,
    /// Send to the peer the message came from
    Reply(String),
    /// Send to every connected peer, sender included
    Broadcast(String),
}

/// Application hooks run on the server's loop thread.
///
/// Any `FnMut(PeerId, &str) -> Dispatch` closure is a handler.
pub trait ServerHandler: Send + 'static {
    fn on_connect(&mut self, _peer: PeerId, _address: SocketAddr) {}

    fn on_message(&mut self, peer: PeerId, message: &str) -> Dispatch;

    fn on_disconnect(&mut self, _peer: PeerId) {}
}

impl<F> ServerHandler for F
where
    F: FnMut(PeerId, &str) -> Dispatch + Send + 'static,
{
    fn on_message(&mut self, peer: PeerId, message: &str) -> Dispatch {
        self(peer, message)
    }
}

struct Peer {
    address: SocketAddr,
    pending: PendingWrites,
}

pub(crate) struct ServerRole<H> {
    id: String,
    delimiter: String,
    handler: H,
    peers: HashMap<Token, Peer>,
}

impl<H: ServerHandler> ServerRole<H> {
    fn queue_to(&mut self, selector: &mut Selector, token: Token, message: &str) {
        let Some(peer) = self.peers.get_mut(&token) else {
            return;
        };

        peer.pending.push(frame(message, &self.delimiter));
        if let Err(err) = selector.set_interest(token, Interest::Write) {
            warn!("[{}] {}: cannot switch to write: {}", self.id, peer.address, err);
        }
    }
}

impl<H: ServerHandler> Role for ServerRole<H> {
    const INITIAL_INTEREST: Interest = Interest::Accept;

    fn on_accepted(&mut self, token: Token, peer: SocketAddr) {
        self.peers.insert(
            token,
            Peer {
                address: peer,
                pending: PendingWrites::new(),
            },
        );
        self.handler.on_connect(PeerId(token), peer);
    }

    fn handle_incoming(&mut self, selector: &mut Selector, token: Token, data: &[u8]) {
        for message in split_messages(data, &self.delimiter) {
            match self.handler.on_message(PeerId(token), &message) {
                Dispatch::None => {}
                Dispatch::Reply(reply) => self.queue_to(selector, token, &reply),
                Dispatch::Broadcast(text) => {
                    let mut targets: Vec<Token> = self.peers.keys().copied().collect();
                    targets.sort_unstable();
                    trace!("[{}] broadcast to {} peers", self.id, targets.len());

                    for target in targets {
                        self.queue_to(selector, target, &text);
                    }
                }
            }
        }
    }

    fn write(&mut self, selector: &mut Selector, token: Token) -> io::Result<()> {
        let Some(peer) = self.peers.get_mut(&token) else {
            return selector.set_interest(token, Interest::Read);
        };

        let drained = match selector.channel(token) {
            Some(Channel::Stream(stream)) => peer.pending.flush_to(stream)?,
            _ => return Ok(()),
        };

        if drained {
            selector.set_interest(token, Interest::Read)?;
        }

        Ok(())
    }

    fn on_closed(&mut self, token: Token) {
        if let Some(peer) = self.peers.remove(&token) {
            debug!("[{}] {} disconnected", self.id, peer.address);
            self.handler.on_disconnect(PeerId(token));
        }
    }
}

/// A listening component serving delimiter-framed text messages.
pub struct Server<H: ServerHandler> {
    component: Component<ServerRole<H>>,
    local_addr: SocketAddr,
}

impl<H: ServerHandler> Server<H> {
    /// Binds all interfaces on `port` with the default configuration.
    pub fn bind(id: impl Into<String>, port: u16, handler: H) -> Result<Self> {
        let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        Self::bind_addr(id, address, Config::default(), handler)
    }

    /// Binds `address` with an explicit configuration.
    pub fn bind_addr(id: impl Into<String>, address: SocketAddr, config: Config, handler: H) -> Result<Self> {
        config.validate()?;

        let id = id.into();
        let listener =
            bind_listener(address).map_err(|source| Error::Bind { addr: address, source })?;
        let local_addr = listener.local_addr()?;

        let role = ServerRole {
            id: id.clone(),
            delimiter: config.delimiter.clone(),
            handler,
            peers: HashMap::new(),
        };
        let component = Component::new(id, &config, Channel::Listener(listener), role)?;
        debug!("[{}] listening on {}", component.id(), local_addr);

        Ok(Self {
            component,
            local_addr,
        })
    }

    pub fn id(&self) -> &str {
        self.component.id()
    }

    /// Address the listener is bound to; reports the real port after binding
    /// port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
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
