use chat_reactor::{Client, Config, Dispatch, Error, PeerId, Server};

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(5);

fn echo_server(id: &str, config: Config) -> Server<impl chat_reactor::ServerHandler> {
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    Server::bind_addr(id, loopback, config, |_peer: PeerId, message: &str| {
        Dispatch::Reply(message.to_string())
    })
    .expect("bind")
}

fn fast_config() -> Config {
    Config::default().with_select_timeout(Duration::from_millis(100))
}

/// Connects and waits for one echo so the server has registered the peer.
fn connected_peer(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    stream.write_all(b"ping\n").unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).expect("echo");
    assert_eq!(line, "ping\n");

    stream
}

#[test]
fn stop_closes_every_registered_channel() {
    let mut server = echo_server("closer", fast_config());
    server.start().expect("start");
    let mut peer = connected_peer(server.local_addr());

    server.stop();
    let report = server.join().expect("join");

    assert_eq!(report.closed, 2);
    assert_eq!(report.failed, 0);
    assert!(report.selector_closed);

    let mut buf = [0u8; 8];
    assert_eq!(peer.read(&mut buf).unwrap(), 0);
}

#[test]
fn second_stop_is_a_no_op() {
    let mut server = echo_server("twice", fast_config());
    server.start().expect("start");

    server.stop();
    assert!(!server.is_running());
    server.stop();
    assert!(!server.is_running());

    assert!(server.join().is_ok());
    assert!(matches!(server.join(), Err(Error::NotStarted(_))));
}

#[test]
fn start_twice_is_rejected() {
    let mut server = echo_server("restart", fast_config());
    server.start().expect("start");

    let err = server.start().unwrap_err();
    assert!(matches!(err, Error::AlreadyStarted(ref id) if id == "restart"));
    assert!(err.is_lifecycle_error());

    server.stop();
    server.join().expect("join");
}

#[test]
fn stop_before_start_does_nothing() {
    let mut server = echo_server("idle", fast_config());

    server.stop();
    assert!(!server.is_running());
    assert!(matches!(server.join(), Err(Error::NotStarted(_))));
}

#[test]
fn stop_does_not_wait_for_the_full_timeout() {
    let mut server = echo_server("slow-timeout", fast_config().with_select_timeout(Duration::from_secs(30)));
    server.start().expect("start");

    let started = Instant::now();
    server.stop();
    server.join().expect("join");

    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn client_shutdown_closes_its_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let mut client = Client::connect_addr("leaving", addr, fast_config(), |_: &str| {}).expect("connect");
    client.start().expect("start");

    let (mut peer, _) = listener.accept().unwrap();
    peer.set_read_timeout(Some(TIMEOUT)).unwrap();
    client.send_message("bye");

    let mut reader = BufReader::new(peer.try_clone().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line, "bye\n");

    client.stop();
    let report = client.join().expect("join");
    assert_eq!(report.closed, 1);

    let mut buf = [0u8; 8];
    assert_eq!(peer.read(&mut buf).unwrap(), 0);
}

#[test]
fn dropping_a_running_server_releases_the_port() {
    let mut server = echo_server("dropped", fast_config());
    server.start().expect("start");
    let addr = server.local_addr();

    drop(server);

    assert!(TcpStream::connect(addr).is_err());
}
