use crate::reactor::event::{Event, Token};
use crate::reactor::interest::Interest;

use libc::{
    EV_ADD, EV_CLEAR, EV_DELETE, EV_ENABLE, EV_EOF, EV_ERROR, EVFILT_READ, EVFILT_USER,
    EVFILT_WRITE, NOTE_TRIGGER, kevent, kqueue,
};
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;
use std::sync::Arc;
use std::time::Duration;

const WAKE_IDENT: usize = 1;

/// kqueue instance with an `EVFILT_USER` waker.
pub(crate) struct KqueuePoller {
    kqueue: Arc<OwnedFd>,
    events: Events,
}

/// Receive buffer for `kevent`.
///
/// `udata` only ever carries a token, never a live pointer.
struct Events(Vec<kevent>);

unsafe impl Send for Events {}
unsafe impl Sync for Events {}

impl KqueuePoller {
    pub(crate) fn new(capacity: usize) -> io::Result<Self> {
        let fd = unsafe { kqueue() };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let poller = Self {
            kqueue: Arc::new(unsafe { OwnedFd::from_raw_fd(fd) }),
            events: Events(Vec::with_capacity(capacity.max(1))),
        };
        apply(
            poller.kqueue.as_raw_fd(),
            &[change(WAKE_IDENT, EVFILT_USER, EV_ADD | EV_ENABLE | EV_CLEAR, 0, 0)],
        )?;

        Ok(poller)
    }

    pub(crate) fn waker(&self) -> Waker {
        Waker {
            kqueue: self.kqueue.clone(),
        }
    }

    pub(crate) fn register(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        let filter = match interest {
            Interest::Accept | Interest::Read => EVFILT_READ,
            Interest::Connect | Interest::Write => EVFILT_WRITE,
        };

        apply(
            self.kqueue.as_raw_fd(),
            &[change(fd as usize, filter, EV_ADD | EV_ENABLE, 0, token)],
        )
    }

    pub(crate) fn reregister(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.deregister(fd)?;
        self.register(fd, token, interest)
    }

    /// Removes both filters; a filter that was never added is not an error.
    pub(crate) fn deregister(&self, fd: RawFd) -> io::Result<()> {
        for filter in [EVFILT_READ, EVFILT_WRITE] {
            match apply(
                self.kqueue.as_raw_fd(),
                &[change(fd as usize, filter, EV_DELETE, 0, 0)],
            ) {
                Ok(()) => {}
                Err(err) if err.raw_os_error() == Some(libc::ENOENT) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    pub(crate) fn poll(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()> {
        let timespec = timeout.map(|duration| libc::timespec {
            tv_sec: duration.as_secs() as _,
            tv_nsec: duration.subsec_nanos() as _,
        });
        let timespec_ptr = timespec
            .as_ref()
            .map_or(ptr::null(), |ts| ts as *const libc::timespec);

        let buffer = &mut self.events.0;
        buffer.clear();
        let n = unsafe {
            kevent(
                self.kqueue.as_raw_fd(),
                ptr::null(),
                0,
                buffer.as_mut_ptr(),
                buffer.capacity() as i32,
                timespec_ptr,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        unsafe { buffer.set_len(n as usize) };

        for raw in buffer.iter() {
            if raw.filter == EVFILT_USER {
                events.push(Event::wake());
                continue;
            }

            events.push(Event {
                token: raw.udata as usize,
                readable: raw.filter == EVFILT_READ,
                writable: raw.filter == EVFILT_WRITE,
                error: raw.flags & EV_ERROR != 0,
                hangup: raw.flags & EV_EOF != 0,
            });
        }

        Ok(())
    }
}

fn change(ident: usize, filter: i16, flags: u16, fflags: u32, token: Token) -> kevent {
    let mut event: kevent = unsafe { mem::zeroed() };
    event.ident = ident as _;
    event.filter = filter as _;
    event.flags = flags as _;
    event.fflags = fflags as _;
    event.udata = token as _;

    event
}

fn apply(queue: RawFd, changes: &[kevent]) -> io::Result<()> {
    let ret = unsafe {
        kevent(
            queue,
            changes.as_ptr(),
            changes.len() as i32,
            ptr::null_mut(),
            0,
            ptr::null(),
        )
    };

    if ret < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Cross-thread handle that interrupts a blocked [`KqueuePoller::poll`].
#[derive(Clone, Debug)]
pub(crate) struct Waker {
    kqueue: Arc<OwnedFd>,
}

impl Waker {
    pub(crate) fn wake(&self) -> io::Result<()> {
        apply(
            self.kqueue.as_raw_fd(),
            &[change(WAKE_IDENT, EVFILT_USER, 0, NOTE_TRIGGER, 0)],
        )
    }
}
