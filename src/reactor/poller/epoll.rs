use crate::reactor::event::{Event, Token, WAKE_TOKEN};
use crate::reactor::interest::Interest;

use libc::{
    EFD_CLOEXEC, EFD_NONBLOCK, EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD,
    EPOLLERR, EPOLLHUP, EPOLLIN, EPOLLOUT, EPOLLPRI, EPOLLRDHUP, epoll_create1, epoll_ctl,
    epoll_event, epoll_wait, eventfd,
};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::Arc;
use std::time::Duration;

/// Level-triggered epoll instance with an eventfd waker.
pub(crate) struct EpollPoller {
    epoll: OwnedFd,
    waker: Waker,
    events: Vec<epoll_event>,
}

impl EpollPoller {
    pub(crate) fn new(capacity: usize) -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }
        let epoll = unsafe { OwnedFd::from_raw_fd(epoll) };

        let wake_fd = unsafe { eventfd(0, EFD_CLOEXEC | EFD_NONBLOCK) };
        if wake_fd < 0 {
            return Err(io::Error::last_os_error());
        }
        let waker = Waker {
            fd: Arc::new(unsafe { OwnedFd::from_raw_fd(wake_fd) }),
        };

        let poller = Self {
            epoll,
            waker,
            events: Vec::with_capacity(capacity.max(1)),
        };
        poller.ctl(
            EPOLL_CTL_ADD,
            poller.waker.fd.as_raw_fd(),
            EPOLLIN as u32,
            WAKE_TOKEN,
        )?;

        Ok(poller)
    }

    pub(crate) fn waker(&self) -> Waker {
        self.waker.clone()
    }

    pub(crate) fn register(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_ADD, fd, flags(interest), token)
    }

    pub(crate) fn reregister(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_MOD, fd, flags(interest), token)
    }

    pub(crate) fn deregister(&self, fd: RawFd) -> io::Result<()> {
        self.ctl(EPOLL_CTL_DEL, fd, 0, 0)
    }

    /// Blocks until at least one event is ready or `timeout` elapses.
    ///
    /// An interrupted wait returns no events.
    pub(crate) fn poll(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()> {
        let timeout_ms = match timeout {
            None => -1,
            Some(duration) => {
                let millis = duration.as_nanos().div_ceil(1_000_000);
                millis.min(i32::MAX as u128) as i32
            }
        };

        self.events.clear();
        let n = unsafe {
            epoll_wait(
                self.epoll.as_raw_fd(),
                self.events.as_mut_ptr(),
                self.events.capacity() as i32,
                timeout_ms,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        unsafe { self.events.set_len(n as usize) };

        for raw in &self.events {
            let bits = raw.events;
            let token = raw.u64 as Token;

            if token == WAKE_TOKEN {
                self.waker.drain();
                events.push(Event::wake());
                continue;
            }

            events.push(Event {
                token,
                readable: bits & (EPOLLIN | EPOLLPRI) as u32 != 0,
                writable: bits & EPOLLOUT as u32 != 0,
                error: bits & EPOLLERR as u32 != 0,
                hangup: bits & (EPOLLHUP | EPOLLRDHUP) as u32 != 0,
            });
        }

        Ok(())
    }

    fn ctl(&self, op: i32, fd: RawFd, flags: u32, token: Token) -> io::Result<()> {
        let mut event = epoll_event {
            events: flags,
            u64: token as u64,
        };

        let ret = unsafe { epoll_ctl(self.epoll.as_raw_fd(), op, fd, &mut event) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }
}

fn flags(interest: Interest) -> u32 {
    match interest {
        Interest::Accept => EPOLLIN as u32,
        Interest::Read => (EPOLLIN | EPOLLRDHUP) as u32,
        Interest::Connect | Interest::Write => EPOLLOUT as u32,
    }
}

/// Cross-thread handle that interrupts a blocked [`EpollPoller::poll`].
#[derive(Clone, Debug)]
pub(crate) struct Waker {
    fd: Arc<OwnedFd>,
}

impl Waker {
    pub(crate) fn wake(&self) -> io::Result<()> {
        let value = 1u64.to_ne_bytes();
        let ret = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                value.as_ptr() as *const _,
                value.len(),
            )
        };

        if ret < 0 {
            let err = io::Error::last_os_error();
            // Counter saturated: a wake is already pending.
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(());
            }
            return Err(err);
        }

        Ok(())
    }

    fn drain(&self) {
        let mut value = [0u8; 8];
        unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                value.as_mut_ptr() as *mut _,
                value.len(),
            );
        }
    }
}
