//! Error types for component construction and lifecycle control.
//!
//! Only construction and lifecycle failures surface through [`Error`]. I/O
//! failures on an established connection are handled inside the event loop:
//! the affected channel is closed and deregistered, the failure is logged, and
//! the loop keeps serving every other channel.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Main error type for chat-reactor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic I/O failure outside the event loop
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The connect attempt was rejected before the handshake could start
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Host name did not resolve to any socket address
    #[error("could not resolve address {0}")]
    AddressResolution(String),

    /// The OS readiness selector could not be opened or set up
    #[error("failed to open selector: {0}")]
    Selector(#[source] io::Error),

    /// Configuration value out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start` called on a component whose loop was already handed to a thread
    #[error("component {0} already started")]
    AlreadyStarted(String),

    /// `join` called on a component that was never started
    #[error("component {0} was never started")]
    NotStarted(String),

    /// The event loop thread could not be spawned
    #[error("failed to spawn event loop thread: {0}")]
    ThreadSpawn(#[source] io::Error),

    /// The event loop thread panicked before it could clean up
    #[error("event loop thread of {0} panicked")]
    LoopPanicked(String),
}

/// Result type alias for chat-reactor operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for failures that happen while building a component, before any
    /// thread is spawned. A component that failed this way never runs.
    #[must_use]
    pub const fn is_construction_failure(&self) -> bool {
        matches!(
            self,
            Self::Bind { .. }
                | Self::Connect { .. }
                | Self::AddressResolution(_)
                | Self::Selector(_)
                | Self::InvalidConfig(_)
        )
    }

    /// True for misuse of the start/stop/join lifecycle.
    #[must_use]
    pub const fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyStarted(_) | Self::NotStarted(_) | Self::LoopPanicked(_)
        )
    }
}
