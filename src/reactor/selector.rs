use crate::reactor::channel::Channel;
use crate::reactor::event::{Event, Token};
use crate::reactor::interest::{Interest, Readiness};
use crate::reactor::poller::{Poller, Waker};
use crate::utils::slab::Slab;

use std::io;
use std::time::Duration;
use tracing::{trace, warn};

/// A channel and the single interest it is registered under.
pub(crate) struct Registration {
    pub(crate) channel: Channel,
    pub(crate) interest: Interest,
}

/// One ready channel reported by [`Selector::select`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SelectedKey {
    pub(crate) token: Token,
    pub(crate) readiness: Readiness,
}

/// What happened to the registered channels when a selector was closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Channels released, including those whose shutdown call failed
    pub closed: usize,
    /// Channels whose shutdown call reported an error
    pub failed: usize,
    /// The OS selector itself was released
    pub selector_closed: bool,
}

/// Owns the OS poller and every channel registered with it.
pub(crate) struct Selector {
    poller: Poller,
    registry: Slab<Registration>,
    events: Vec<Event>,
}

impl Selector {
    pub(crate) fn open(max_events: usize) -> io::Result<Self> {
        Ok(Self {
            poller: Poller::new(max_events)?,
            registry: Slab::with_capacity(max_events),
            events: Vec::with_capacity(max_events),
        })
    }

    pub(crate) fn waker(&self) -> Waker {
        self.poller.waker()
    }

    /// Takes ownership of `channel`. On failure the channel is dropped.
    pub(crate) fn register(&mut self, channel: Channel, interest: Interest) -> io::Result<Token> {
        let fd = channel.raw_fd();
        let token = self.registry.insert(Registration { channel, interest });

        if let Err(err) = self.poller.register(fd, token, interest) {
            self.registry.remove(token);
            return Err(err);
        }

        trace!("registered token {} as {:?}", token, interest);
        Ok(token)
    }

    /// Replaces the interest of a registered channel.
    pub(crate) fn set_interest(&mut self, token: Token, interest: Interest) -> io::Result<()> {
        let Some(registration) = self.registry.get_mut(token) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("token {token} is not registered"),
            ));
        };

        if registration.interest == interest {
            return Ok(());
        }

        self.poller
            .reregister(registration.channel.raw_fd(), token, interest)?;
        registration.interest = interest;

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn interest(&self, token: Token) -> Option<Interest> {
        self.registry.get(token).map(|registration| registration.interest)
    }

    pub(crate) fn channel(&self, token: Token) -> Option<&Channel> {
        self.registry.get(token).map(|registration| &registration.channel)
    }

    pub(crate) fn contains(&self, token: Token) -> bool {
        self.registry.contains(token)
    }

    pub(crate) fn len(&self) -> usize {
        self.registry.len()
    }

    /// Deregisters a channel and hands it back to the caller.
    pub(crate) fn cancel(&mut self, token: Token) -> Option<Channel> {
        let registration = self.registry.remove(token)?;

        if let Err(err) = self.poller.deregister(registration.channel.raw_fd()) {
            trace!("deregister of token {} failed: {}", token, err);
        }

        Some(registration.channel)
    }

    /// Waits up to `timeout` and fills `keys` with the ready channels.
    ///
    /// Returns `true` if the waker fired during the wait.
    pub(crate) fn select(&mut self, timeout: Duration, keys: &mut Vec<SelectedKey>) -> io::Result<bool> {
        keys.clear();
        self.events.clear();
        self.poller.poll(&mut self.events, Some(timeout))?;

        let mut woken = false;
        for event in &self.events {
            if event.is_wake() {
                woken = true;
                continue;
            }

            let Some(registration) = self.registry.get(event.token) else {
                continue;
            };

            if let Some(readiness) = registration.interest.readiness(event) {
                keys.push(SelectedKey {
                    token: event.token,
                    readiness,
                });
            }
        }

        Ok(woken)
    }

    /// Closes every registered channel, then the poller itself.
    ///
    /// Every channel is released even if closing an earlier one fails.
    pub(crate) fn close(mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        for (token, registration) in self.registry.drain() {
            if let Err(err) = self.poller.deregister(registration.channel.raw_fd()) {
                trace!("deregister of token {} failed: {}", token, err);
            }

            let kind = registration.channel.kind();
            if let Err(err) = registration.channel.close() {
                warn!("closing {} (token {}) failed: {}", kind, token, err);
                report.failed += 1;
            }
            report.closed += 1;
        }

        drop(self.poller);
        report.selector_closed = true;

        report
    }
}
