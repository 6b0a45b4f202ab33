//! Socket construction and the non-blocking connect/accept steps.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

const LISTEN_BACKLOG: i32 = 128;

/// Binds a non-blocking listener with `SO_REUSEADDR`.
pub(crate) fn bind_listener(address: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&address.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}

/// Starts a connect without waiting for the handshake.
///
/// Completion is observed later through connect readiness and
/// [`finish_connect`].
pub(crate) fn connect_nonblocking(address: SocketAddr) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;
    socket.set_nodelay(true)?;

    match socket.connect(&address.into()) {
        Ok(()) => {}
        Err(err) if err.raw_os_error() == Some(libc::EINPROGRESS) => {}
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
        Err(err) => return Err(err),
    }

    Ok(socket.into())
}

/// Completes a pending connect.
///
/// Returns `Ok(false)` while the handshake is still in flight and the
/// socket's pending error once it has failed.
pub(crate) fn finish_connect(stream: &TcpStream) -> io::Result<bool> {
    if let Some(err) = stream.take_error()? {
        return Err(err);
    }

    match stream.peer_addr() {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotConnected => return Ok(false),
        Err(err) => return Err(err),
    }

    stream.set_nonblocking(true)?;

    Ok(true)
}

/// Accepts one pending connection, if any, and makes it non-blocking.
pub(crate) fn accept_client(listener: &TcpListener) -> io::Result<Option<(TcpStream, SocketAddr)>> {
    match listener.accept() {
        Ok((stream, address)) => {
            stream.set_nonblocking(true)?;
            Ok(Some((stream, address)))
        }
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(err),
    }
}

/// Resolves `host:port`, preferring the first address returned.
pub(crate) fn resolve(host: &str, port: u16) -> io::Result<Option<SocketAddr>> {
    Ok((host, port).to_socket_addrs()?.next())
}
