//! Selector-driven, non-blocking TCP messaging.
//!
//! One event-loop thread per component drives an OS readiness selector
//! (epoll or kqueue) over its sockets and dispatches connect, accept, read
//! and write readiness to a role. Two roles exchange delimiter-framed text:
//!
//! - **Server**: binds a listener, accepts peers, decodes their messages and
//!   routes responses through a [`ServerHandler`]
//! - **Client**: connects to a remote server, delivers decoded messages to a
//!   [`MessageHandler`] and flushes messages queued by [`Client::send_message`]
//!
//! # Architecture
//!
//! - **Selector**: registration table over the OS poller, one interest per channel
//! - **Component**: owns selector, root channel and receive buffer; runs the loop
//! - **Roles**: channel construction, initial interest, inbound and write hooks
//! - **OutboundQueue**: FIFO shared between callers and the loop thread
//!
//! # Example
//!
//! ```no_run
//! use chat_reactor::{Client, Dispatch, PeerId, Server};
//!
//! # fn main() -> chat_reactor::Result<()> {
//! let mut server = Server::bind("server", 9000, |_peer: PeerId, message: &str| {
//!     Dispatch::Reply(message.to_uppercase())
//! })?;
//! server.start()?;
//!
//! let mut client = Client::connect("client", "127.0.0.1", 9000, |message: &str| {
//!     println!("got {message}");
//! })?;
//! client.start()?;
//! client.send_message("hello");
//!
//! client.stop();
//! server.stop();
//! # Ok(())
//! # }
//! ```

mod builder;
mod client;
pub mod codec;
mod component;
pub mod config;
pub mod dev_tracing;
mod error;
mod reactor;
mod server;
mod utils;

pub use builder::ComponentBuilder;
pub use client::{Client, MessageHandler, MessageSender};
pub use config::Config;
pub use error::{Error, Result};
pub use reactor::ShutdownReport;
pub use server::{Dispatch, PeerId, Server, ServerHandler};
