//! HTTP -> WS upgrade against a live listener.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use internhub_gateway::app_state::AppState;
use internhub_gateway::config::GatewayConfig;
use internhub_gateway::router;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn serve() -> (SocketAddr, AppState) {
    let state = AppState::new(GatewayConfig::default()).unwrap();
    let app = router::build_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, state)
}

/// Hand-written upgrade request; returns status code and body of a refused one.
async fn refused_upgrade(addr: SocketAddr, origin: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut req = format!(
        "GET /ws?userId=stu_a HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Connection: Upgrade, close\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n"
    );
    if let Some(origin) = origin {
        req.push_str(&format!("Origin: {origin}\r\n"));
    }
    req.push_str("\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    timeout(WAIT, stream.read_to_end(&mut buf)).await.unwrap().unwrap();
    let text = String::from_utf8(buf).unwrap();
    let status = text.split(' ').nth(1).unwrap().parse().unwrap();
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

/// Next text frame as JSON, skipping heartbeat pings.
async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        match msg {
            Message::Text(_) => return serde_json::from_str(msg.to_text().unwrap()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..250 {
        if cond() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn rejected_origin_gets_403_json() {
    let (addr, state) = serve().await;

    let (status, body) = refused_upgrade(addr, Some("https://evil.example")).await;

    assert_eq!(status, 403);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["error"], "ORIGIN_REJECTED");
    assert!(v["message"].as_str().unwrap().contains("https://evil.example"));
    assert_eq!(state.metrics().origin_rejections.get(&[]), 1);
    assert_eq!(state.realtime().hub().stats().sessions, 0);
    assert_eq!(state.realtime().hub().lookup("stu_a"), None);
}

#[tokio::test]
async fn user_id_query_binds_identity_until_close() {
    let (addr, state) = serve().await;
    let core = state.realtime();

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws?userId=stu_a")).await.unwrap();

    assert_eq!(
        next_json(&mut ws).await,
        json!({ "event": "user:status", "data": { "userId": "stu_a", "isOnline": true } })
    );
    assert!(core.hub().lookup("stu_a").is_some());
    assert!(core.hub().is_online("stu_a"));

    ws.close(None).await.unwrap();
    wait_until(|| core.hub().lookup("stu_a").is_none()).await;
    assert!(!core.hub().is_online("stu_a"));
    wait_until(|| core.hub().stats().sessions == 0).await;
}

#[tokio::test]
async fn listed_origin_without_user_id_stays_anonymous() {
    let (addr, state) = serve().await;
    let core = state.realtime();

    let mut req = format!("ws://{addr}/ws").into_client_request().unwrap();
    req.headers_mut()
        .insert("origin", "http://localhost:5173".parse().unwrap());
    let (mut ws, _) = connect_async(req).await.unwrap();

    wait_until(|| core.hub().stats().sessions == 1).await;
    assert_eq!(core.hub().stats().registered, 0);

    // anonymous sessions still hear status broadcasts
    core.signal_status("rec_9", true).unwrap();
    assert_eq!(
        next_json(&mut ws).await,
        json!({ "event": "user:status", "data": { "userId": "rec_9", "isOnline": true } })
    );
}

#[tokio::test]
async fn drain_closes_live_sessions_and_refuses_new_ones() {
    let (addr, state) = serve().await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws?userId=stu_a")).await.unwrap();

    state.begin_drain();

    let code = loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Close(frame) = msg {
            break frame.map(|f| u16::from(f.code));
        }
    };
    assert_eq!(code, Some(1001));

    let (status, body) = refused_upgrade(addr, None).await;
    assert_eq!(status, 503);
    assert_eq!(body, "draining");
}
