//! Event loop driver and the queues its roles use.

pub(crate) mod driver;
pub(crate) mod queue;

pub(crate) use driver::{Component, Role};
pub(crate) use queue::{OutboundQueue, PendingWrites};
