use chat_reactor::{Client, Config};

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

fn fast_config() -> Config {
    Config::default().with_select_timeout(Duration::from_millis(100))
}

fn listen() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    (listener, addr)
}

fn accept(listener: &TcpListener) -> TcpStream {
    let (stream, _) = listener.accept().expect("accept");
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    stream
}

fn read_lines(stream: TcpStream, count: usize) -> Vec<String> {
    let mut reader = BufReader::new(stream);
    let mut lines = Vec::with_capacity(count);

    for _ in 0..count {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read_line");
        lines.push(line.trim_end_matches('\n').to_string());
    }

    lines
}

#[test]
fn client_sends_in_enqueue_order() {
    let (listener, addr) = listen();
    let mut client = Client::connect_addr("ordered", addr, fast_config(), |_: &str| {}).expect("connect");
    assert_eq!(client.remote_addr(), addr);

    // Queued before the loop runs; flushed once the handshake completes.
    for i in 0..50 {
        client.send_message(&format!("msg-{i}"));
    }
    assert_eq!(client.queued(), 50);
    client.start().expect("start");

    let peer = accept(&listener);
    let expected: Vec<String> = (0..50).map(|i| format!("msg-{i}")).collect();
    assert_eq!(read_lines(peer, 50), expected);

    client.stop();
    client.join().expect("join");
}

#[test]
fn client_splits_inbound_payloads() {
    let (listener, addr) = listen();
    let (tx, rx) = flume::unbounded();
    let mut client = Client::connect_addr("reader", addr, fast_config(), move |message: &str| {
        let _ = tx.send(message.to_string());
    })
    .expect("connect");
    client.start().expect("start");

    let mut peer = accept(&listener);
    peer.write_all(b"a\nb\n").unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "a");
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "b");

    peer.write_all(b"tail without delimiter").unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "tail without delimiter");
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    client.stop();
    client.join().expect("join");
}

#[test]
fn concurrent_enqueue_is_delivered_in_order() {
    const COUNT: usize = 200;

    for iteration in 0..5 {
        let (listener, addr) = listen();
        let mut client = Client::connect_addr(format!("stress-{iteration}"), addr, fast_config(), |_: &str| {})
            .expect("connect");
        client.start().expect("start");
        let peer = accept(&listener);

        let sender = client.sender();
        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                sender.send(&format!("{iteration}:{i}"));
                if i % 25 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }
        });

        let expected: Vec<String> = (0..COUNT).map(|i| format!("{iteration}:{i}")).collect();
        assert_eq!(read_lines(peer, COUNT), expected);

        producer.join().unwrap();
        client.stop();
        client.join().expect("join");
    }
}

#[test]
fn failed_connect_only_closes_the_channel() {
    let (listener, addr) = listen();
    drop(listener);

    let mut client = match Client::connect_addr("refused", addr, fast_config(), |_: &str| {}) {
        Ok(client) => client,
        // Some platforms reject a loopback connect synchronously.
        Err(err) => {
            assert!(err.is_construction_failure());
            return;
        }
    };
    client.start().expect("start");
    client.send_message("never delivered");

    thread::sleep(Duration::from_millis(500));
    assert!(client.is_running());

    client.stop();
    let report = client.join().expect("join");
    assert_eq!(report.closed, 0);
    assert!(report.selector_closed);
}

#[test]
fn unresolvable_host_fails_construction() {
    let err = Client::connect_with("nowhere", "host.invalid", 9, fast_config(), |_: &str| {})
        .err()
        .expect("resolution must fail");

    assert!(err.is_construction_failure());
}

#[test]
fn peer_close_is_observed_without_stopping_the_loop() {
    let (listener, addr) = listen();
    let mut client = Client::connect_addr("closing", addr, fast_config(), |_: &str| {}).expect("connect");
    client.start().expect("start");

    let mut peer = accept(&listener);
    peer.shutdown(std::net::Shutdown::Write).unwrap();

    // The client closes its end after reading EOF.
    let mut buf = [0u8; 16];
    assert_eq!(peer.read(&mut buf).unwrap(), 0);
    assert!(client.is_running());

    client.stop();
    let report = client.join().expect("join");
    assert_eq!(report.closed, 0);
}
