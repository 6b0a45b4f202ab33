/// Identifies a registration within a selector.
pub(crate) type Token = usize;

/// Reserved token reported when the selector's waker fired.
pub(crate) const WAKE_TOKEN: Token = usize::MAX;

/// Platform-neutral readiness report produced by a poller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Event {
    pub(crate) token: Token,
    pub(crate) readable: bool,
    pub(crate) writable: bool,
    pub(crate) error: bool,
    pub(crate) hangup: bool,
}

impl Event {
    pub(crate) fn wake() -> Self {
        Self {
            token: WAKE_TOKEN,
            readable: true,
            ..Self::default()
        }
    }

    pub(crate) fn is_wake(&self) -> bool {
        self.token == WAKE_TOKEN
    }
}
