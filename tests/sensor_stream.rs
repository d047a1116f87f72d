//! Sensor client against an in-process websocket server.

use futures_util::SinkExt;
use sentinel_engine::collectors::{RawEvent, SampleRecorder, SensorClient};
use sentinel_engine::config::SensorConfig;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

const PACKET_TCP: &str = r#"{"tag":"net.sniff.tcp","time":"2024-05-01T10:00:00Z","data":{"packet":{"length":66,"ipv4":{"src":"192.168.1.50"},"tcp":{"dst_port":443}}}}"#;
const SUMMARY_UDP: &str = r#"{"tag":"net.sniff.udp","data":{"from":"192.168.1.50:5353","to":"8.8.8.8:dns","protocol":"udp","data":{"Size":74}}}"#;

fn config(addr: SocketAddr, reconnect_delay_secs: u64) -> SensorConfig {
    SensorConfig {
        url: format!("ws://{}/api/events", addr),
        username: "user".into(),
        password: "pass".into(),
        reconnect_delay_secs,
        ..SensorConfig::default()
    }
}

async fn next(rx: &mut mpsc::UnboundedReceiver<RawEvent>) -> RawEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within timeout")
        .expect("channel open")
}

#[tokio::test]
async fn forwards_sniff_events_with_basic_auth() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen_auth: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen_auth);

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| {
            *slot.lock().unwrap() = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            Ok::<_, ErrorResponse>(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .unwrap();
        for text in [
            "not json at all",
            r#"{"tag":"endpoint.new","data":{"mac":"aa:bb"}}"#,
            r#"{"tag":"net.sniff.mdns","data":{"questions":[]}}"#,
            PACKET_TCP,
            SUMMARY_UDP,
        ] {
            ws.send(Message::Text(text.to_string().into())).await.unwrap();
        }
        let _ = ws.close(None).await;
    });

    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = SensorClient::new(config(addr, 60), SampleRecorder::new(dir.path()), tx);
    let task = tokio::spawn(async move { client.run().await });

    let first = next(&mut rx).await;
    assert_eq!(first.tag, "net.sniff.tcp");
    assert_eq!(first.time.as_deref(), Some("2024-05-01T10:00:00Z"));
    assert_eq!(next(&mut rx).await.tag, "net.sniff.udp");
    assert!(tokio::time::timeout(Duration::from_millis(200), rx.recv())
        .await
        .is_err());

    server.await.unwrap();
    assert_eq!(
        seen_auth.lock().unwrap().as_deref(),
        Some("Basic dXNlcjpwYXNz")
    );
    let sample = std::fs::read_to_string(dir.path().join("sample_event.json")).unwrap();
    assert_eq!(sample, PACKET_TCP);
    assert!(dir.path().join("sample_tcp.json").exists());

    task.abort();
}

#[tokio::test]
async fn reconnects_after_server_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        for text in [PACKET_TCP, SUMMARY_UDP] {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(text.to_string().into())).await.unwrap();
            let _ = ws.close(None).await;
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = SensorClient::new(config(addr, 0), SampleRecorder::new(dir.path()), tx);
    let task = tokio::spawn(async move { client.run().await });

    assert_eq!(next(&mut rx).await.tag, "net.sniff.tcp");
    assert_eq!(next(&mut rx).await.tag, "net.sniff.udp");

    server.await.unwrap();
    task.abort();
}

#[tokio::test]
async fn stops_when_receiver_dropped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws.send(Message::Text(PACKET_TCP.to_string().into())).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let dir = tempfile::tempdir().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    let client = SensorClient::new(config(addr, 60), SampleRecorder::new(dir.path()), tx);

    tokio::time::timeout(Duration::from_secs(5), client.run())
        .await
        .expect("client returns once the receiver is gone");
}
