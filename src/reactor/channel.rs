use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::os::fd::{AsRawFd, RawFd};

/// A socket owned by the selector.
#[derive(Debug)]
pub(crate) enum Channel {
    Listener(TcpListener),
    Stream(TcpStream),
}

impl Channel {
    pub(crate) fn raw_fd(&self) -> RawFd {
        match self {
            Channel::Listener(listener) => listener.as_raw_fd(),
            Channel::Stream(stream) => stream.as_raw_fd(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Channel::Listener(_) => "listener",
            Channel::Stream(_) => "stream",
        }
    }

    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Channel::Listener(listener) => listener.local_addr(),
            Channel::Stream(stream) => stream.local_addr(),
        }
    }

    /// Shuts the socket down and releases its descriptor.
    ///
    /// The descriptor is released even when the shutdown call fails.
    pub(crate) fn close(self) -> io::Result<()> {
        match self {
            Channel::Listener(_) => Ok(()),
            Channel::Stream(stream) => match stream.shutdown(Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err),
            },
        }
    }
}
