//! Fluent builder for server and client construction.
//!
//! Collects the component id and [`Config`] overrides, then builds either
//! role.

use crate::client::{Client, MessageHandler};
use crate::config::{Config, DEFAULT_PORT};
use crate::error::Result;
use crate::server::{Server, ServerHandler};

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Builder for [`Server`] and [`Client`] instances.
///
/// # Example
/// ```no_run
/// use chat_reactor::ComponentBuilder;
/// use std::time::Duration;
///
/// # fn main() -> chat_reactor::Result<()> {
/// let mut client = ComponentBuilder::new("alice")
///     .buffer_size(4096)
///     .select_timeout(Duration::from_millis(250))
///     .client("127.0.0.1", 9000, |message: &str| println!("{message}"))?;
///
/// client.start()?;
/// client.send_message("hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    id: String,
    config: Config,
}

impl ComponentBuilder {
    /// Creates a builder with the default configuration.
    ///
    /// `id` names the loop thread and labels log lines.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: Config::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.config.buffer_size = buffer_size;
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.delimiter = delimiter.into();
        self
    }

    pub fn select_timeout(mut self, timeout: Duration) -> Self {
        self.config.select_timeout = timeout;
        self
    }

    pub fn max_events(mut self, max_events: usize) -> Self {
        self.config.max_events = max_events;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn current_config(&self) -> &Config {
        &self.config
    }

    /// Builds a server on all interfaces at [`DEFAULT_PORT`].
    pub fn server_default<H: ServerHandler>(self, handler: H) -> Result<Server<H>> {
        self.server(DEFAULT_PORT, handler)
    }

    /// Builds a server on all interfaces at `port`.
    pub fn server<H: ServerHandler>(self, port: u16, handler: H) -> Result<Server<H>> {
        self.server_on(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), handler)
    }

    /// Builds a server bound to `address`.
    pub fn server_on<H: ServerHandler>(self, address: SocketAddr, handler: H) -> Result<Server<H>> {
        Server::bind_addr(self.id, address, self.config, handler)
    }

    /// Builds a client connecting to `host:port`.
    pub fn client<H: MessageHandler>(self, host: &str, port: u16, handler: H) -> Result<Client<H>> {
        Client::connect_with(self.id, host, port, self.config, handler)
    }

    /// Builds a client connecting to `address`.
    pub fn client_to<H: MessageHandler>(self, address: SocketAddr, handler: H) -> Result<Client<H>> {
        Client::connect_addr(self.id, address, self.config, handler)
    }
}
