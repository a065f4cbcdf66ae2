//! Connections over real loopback sockets.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use network_connection::transport::tcp;
use network_connection::{Connection, ConnectionConfig, ConnectionListener, DisconnectReason};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug)]
enum Event {
    Packet(Bytes),
    Disconnected(DisconnectReason),
}

struct Recorder(mpsc::UnboundedSender<Event>);

impl ConnectionListener for Recorder {
    fn on_packet_received(&self, _connection: &Arc<Connection>, payload: Bytes) {
        let _ = self.0.send(Event::Packet(payload));
    }

    fn on_disconnected(&self, _connection: &Arc<Connection>, reason: &DisconnectReason) {
        let _ = self.0.send(Event::Disconnected(reason.clone()));
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a listener event")
        .expect("listener dropped")
}

#[tokio::test]
async fn tcp_ping_pong() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    let (server_tx, mut server_events) = mpsc::unbounded_channel();
    let (client_tx, mut client_events) = mpsc::unbounded_channel();

    let accept = tokio::spawn(async move {
        tcp::accept(&server, Arc::new(Recorder(server_tx)), ConnectionConfig::default()).await
    });
    let client = tcp::connect(addr, Arc::new(Recorder(client_tx)), ConnectionConfig::default())
        .await
        .unwrap();
    let (server_conn, peer_addr) = accept.await.unwrap().unwrap();

    assert_eq!(client.peer(), addr.to_string());
    assert_eq!(peer_addr.to_string(), server_conn.peer());

    client.start().unwrap();
    server_conn.start().unwrap();

    client.send_packet(&b"ping"[..]).unwrap();
    match next_event(&mut server_events).await {
        Event::Packet(payload) => assert_eq!(payload, Bytes::from_static(b"ping")),
        other => panic!("unexpected event: {other:?}"),
    }

    server_conn.send_packet(&b"pong"[..]).unwrap();
    match next_event(&mut client_events).await {
        Event::Packet(payload) => assert_eq!(payload, Bytes::from_static(b"pong")),
        other => panic!("unexpected event: {other:?}"),
    }

    // the server side going away is seen by the client exactly once
    server_conn.close();
    match next_event(&mut client_events).await {
        Event::Disconnected(reason) => {
            assert!(!reason.is_protocol_violation());
            assert!(!reason.to_string().is_empty());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(
        timeout(Duration::from_millis(200), client_events.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn tcp_large_message_round_trip() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    let (server_tx, mut server_events) = mpsc::unbounded_channel();
    let (client_tx, _client_events) = mpsc::unbounded_channel();

    let accept = tokio::spawn(async move {
        tcp::accept(&server, Arc::new(Recorder(server_tx)), ConnectionConfig::default()).await
    });
    let client = tcp::connect(addr, Arc::new(Recorder(client_tx)), ConnectionConfig::default())
        .await
        .unwrap();
    let (server_conn, _) = accept.await.unwrap().unwrap();
    client.start().unwrap();
    server_conn.start().unwrap();

    let payload: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    client.send_packet(payload.clone()).unwrap();

    match next_event(&mut server_events).await {
        Event::Packet(received) => assert_eq!(received, Bytes::from(payload)),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn unix_socket_ping() {
    use network_connection::transport::local;
    use tokio::net::UnixListener;

    let path = std::env::temp_dir().join(format!("network-connection-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let server = UnixListener::bind(&path).unwrap();

    let (server_tx, mut server_events) = mpsc::unbounded_channel();
    let (client_tx, _client_events) = mpsc::unbounded_channel();

    let accept = tokio::spawn(async move {
        local::accept(&server, Arc::new(Recorder(server_tx)), ConnectionConfig::default()).await
    });
    let client = local::connect(&path, Arc::new(Recorder(client_tx)), ConnectionConfig::default())
        .await
        .unwrap();
    let server_conn = accept.await.unwrap().unwrap();
    client.start().unwrap();
    server_conn.start().unwrap();

    client.send_packet(&b"local"[..]).unwrap();
    match next_event(&mut server_events).await {
        Event::Packet(payload) => assert_eq!(payload, Bytes::from_static(b"local")),
        other => panic!("unexpected event: {other:?}"),
    }

    let _ = std::fs::remove_file(&path);
}
