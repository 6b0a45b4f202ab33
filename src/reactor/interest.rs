use crate::reactor::event::Event;

/// What a registered channel wants to be woken for.
///
/// A channel holds exactly one interest at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Interest {
    Connect,
    Accept,
    Read,
    Write,
}

/// The transition a selected key asks the driver to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Readiness {
    Connectable,
    Acceptable,
    Readable,
    Writable,
}

impl Interest {
    /// Interprets a raw event against this interest.
    ///
    /// Errors and hangups are reported as the interest's own readiness so the
    /// matching transition observes the failure on its next I/O call.
    pub(crate) fn readiness(self, event: &Event) -> Option<Readiness> {
        let failed = event.error || event.hangup;

        match self {
            Interest::Connect if event.writable || failed => Some(Readiness::Connectable),
            Interest::Accept if event.readable || event.error => Some(Readiness::Acceptable),
            Interest::Read if event.readable || failed => Some(Readiness::Readable),
            Interest::Write if event.writable || failed => Some(Readiness::Writable),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(readable: bool, writable: bool) -> Event {
        Event {
            token: 0,
            readable,
            writable,
            ..Event::default()
        }
    }

    #[test]
    fn test_connect_completes_on_writable() {
        assert_eq!(
            Interest::Connect.readiness(&event(false, true)),
            Some(Readiness::Connectable)
        );
        assert_eq!(Interest::Connect.readiness(&event(true, false)), None);
    }

    #[test]
    fn test_accept_on_readable() {
        assert_eq!(
            Interest::Accept.readiness(&event(true, false)),
            Some(Readiness::Acceptable)
        );
    }

    #[test]
    fn test_stale_write_event_ignored_for_reader() {
        assert_eq!(Interest::Read.readiness(&event(false, true)), None);
    }

    #[test]
    fn test_hangup_reported_to_reader() {
        let hangup = Event {
            hangup: true,
            ..Event::default()
        };

        assert_eq!(Interest::Read.readiness(&hangup), Some(Readiness::Readable));
        assert_eq!(Interest::Write.readiness(&hangup), Some(Readiness::Writable));
    }

    #[test]
    fn test_failed_connect_is_connectable() {
        let failed = Event {
            error: true,
            hangup: true,
            ..Event::default()
        };

        assert_eq!(
            Interest::Connect.readiness(&failed),
            Some(Readiness::Connectable)
        );
    }
}
