use chat_reactor::{ComponentBuilder, Dispatch, PeerId};

use std::net::SocketAddr;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn client_and_server_exchange_messages() {
    chat_reactor::dev_tracing::init_tracing();

    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let (server_tx, server_rx) = flume::unbounded();
    let mut server = ComponentBuilder::new("chat-server")
        .select_timeout(Duration::from_millis(100))
        .server_on(loopback, move |peer: PeerId, message: &str| {
            let _ = server_tx.send((peer, message.to_string()));
            Dispatch::Reply(format!("echo {message}"))
        })
        .expect("server");
    server.start().expect("start server");

    let (client_tx, client_rx) = flume::unbounded();
    let mut client = ComponentBuilder::new("chat-client")
        .select_timeout(Duration::from_millis(100))
        .client_to(server.local_addr(), move |message: &str| {
            let _ = client_tx.send(message.to_string());
        })
        .expect("client");
    client.start().expect("start client");

    client.send_message("hello");

    let (peer, received) = server_rx.recv_timeout(TIMEOUT).expect("server received");
    assert_eq!(received, "hello");
    assert_eq!(client_rx.recv_timeout(TIMEOUT).expect("reply"), "echo hello");

    for i in 0..10 {
        client.send_message(&format!("n{i}"));
    }
    for i in 0..10 {
        let (from, message) = server_rx.recv_timeout(TIMEOUT).expect("ordered");
        assert_eq!(from, peer);
        assert_eq!(message, format!("n{i}"));
    }
    for i in 0..10 {
        assert_eq!(client_rx.recv_timeout(TIMEOUT).unwrap(), format!("echo n{i}"));
    }

    client.stop();
    server.stop();
    // Either side may observe the other's close first.
    assert!(client.join().expect("client join").selector_closed);
    assert!(server.join().expect("server join").selector_closed);
}

#[test]
fn custom_delimiter_is_used_on_both_ends() {
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let (tx, rx) = flume::unbounded();
    let mut server = ComponentBuilder::new("crlf-server")
        .delimiter("\r\n")
        .select_timeout(Duration::from_millis(100))
        .server_on(loopback, move |_peer: PeerId, message: &str| {
            let _ = tx.send(message.to_string());
            Dispatch::None
        })
        .expect("server");
    server.start().expect("start server");

    let mut client = ComponentBuilder::new("crlf-client")
        .delimiter("\r\n")
        .select_timeout(Duration::from_millis(100))
        .client_to(server.local_addr(), |_: &str| {})
        .expect("client");
    client.start().expect("start client");

    client.send_message("line with\nnewline");
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "line with\nnewline");

    client.stop();
    server.stop();
}
