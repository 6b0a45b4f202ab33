//! OS readiness primitives.
//!
//! - Linux/Android: `epoll`, woken through an `eventfd`
//! - macOS/iOS/FreeBSD: `kqueue`, woken through `EVFILT_USER`
//!
//! Both expose the same surface: `new`, `register`, `reregister`,
//! `deregister`, `poll` and a cloneable `Waker`.

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) use epoll::{EpollPoller as Poller, Waker};

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
mod kqueue;
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
pub(crate) use kqueue::{KqueuePoller as Poller, Waker};
