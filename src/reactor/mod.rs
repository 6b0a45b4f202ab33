//! Readiness selector layer.
//!
//! - [`poller`]: epoll/kqueue wrappers and the cross-thread waker
//! - [`event`]: platform-neutral readiness events
//! - [`interest`]: per-channel interest and the readiness it maps to
//! - [`channel`]: the sockets a selector owns
//! - [`socket`]: bind/connect/accept helpers
//! - [`selector`]: registration table plus the bounded wait

pub(crate) mod channel;
pub(crate) mod event;
pub(crate) mod interest;
pub(crate) mod poller;
pub(crate) mod selector;
pub(crate) mod socket;

pub(crate) use channel::Channel;
pub(crate) use event::Token;
pub(crate) use interest::{Interest, Readiness};
pub(crate) use poller::Waker;
pub(crate) use selector::{SelectedKey, Selector};
pub use selector::ShutdownReport;
