//! WebSocket handler.
//!
//! Responsibilities:
//! - Origin check, then upgrade HTTP -> WS
//! - Extract the optional `userId` handshake parameter
//! - Drive the connection lifecycle through the realtime core
//!   (connect -> events -> disconnect), whatever way the loop ends
//! - Heartbeat ping + idle timeout, drain on shutdown
//! - Decode-once, frame policy, then dispatch

use std::time::Instant;

use axum::{
    extract::{ws::CloseFrame, ws::Message, ws::WebSocket, ws::WebSocketUpgrade, Query, State},
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::Instrument;

use internhub_core::error::{ClientCode, Result};
use internhub_core::protocol::OutboundEvent;

use crate::app_state::AppState;
use crate::context::{Lifecycle, SessionMeta};
use crate::policy::{FramePolicy, PolicyDecision};
use crate::realtime::{Connection, RealtimeCtx};
use crate::transport::codec::{decode, frame_len, Inbound};

const IDLE_CHECK_EVERY: Duration = Duration::from_millis(500);
const CLOSE_GOING_AWAY: u16 = 1001;
const CLOSE_POLICY: u16 = 1008;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if let Err(e) = app.origin_policy().check(origin.as_deref()) {
        app.metrics().origin_rejections.inc(&[]);
        tracing::warn!(origin = origin.as_deref().unwrap_or_default(), "socket origin rejected");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": e.client_code().as_str(),
                "message": e.to_string(),
            })),
        )
            .into_response();
    }

    // subscribe before the drain check so a drain racing the upgrade still
    // reaches this session
    let shutdown = app.shutdown_rx();
    if app.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }

    app.metrics().ws_upgrades.inc(&[]);
    let meta = SessionMeta {
        conn_id: app.realtime().next_conn_id(),
        origin,
        user_id: q.user_id,
    };

    ws.on_upgrade(move |socket| async move {
        let span = tracing::info_span!(
            "session",
            conn_id = %meta.conn_id,
            user_id = meta.user_id.as_deref().unwrap_or_default(),
            origin = meta.origin.as_deref().unwrap_or_default()
        );
        if let Err(e) = run_session(app, meta, shutdown, socket).instrument(span).await {
            tracing::warn!(error = %e, "session ended with error");
        }
    })
}

/// Connect, run the loop, and always disconnect afterwards.
async fn run_session(
    app: AppState,
    meta: SessionMeta,
    shutdown: watch::Receiver<bool>,
    socket: WebSocket,
) -> Result<()> {
    let core = app.realtime();
    let (out_tx, out_rx) = mpsc::channel::<Message>(app.cfg().gateway.outbound_queue);

    let conn = Connection::new(meta.conn_id, out_tx);
    let lifecycle = core.connect(conn, meta.user_id.as_deref())?;

    let result = session_loop(&app, &meta, &lifecycle, shutdown, socket, out_rx).await;

    core.disconnect(meta.conn_id, &lifecycle)?;
    result
}

async fn session_loop(
    app: &AppState,
    meta: &SessionMeta,
    lifecycle: &Lifecycle,
    mut shutdown: watch::Receiver<bool>,
    socket: WebSocket,
    mut out_rx: mpsc::Receiver<Message>,
) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let core = app.realtime();
    let dispatcher = app.dispatcher();
    let metrics = app.metrics();
    let mut policy = FramePolicy::new(&app.cfg().limits);

    let gw = &app.cfg().gateway;
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let mut ping_tick = tokio::time::interval(Duration::from_millis(gw.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut idle_tick = tokio::time::interval(IDLE_CHECK_EVERY);
    idle_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break; };
                if ws_tx.send(m).await.is_err() {
                    break;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                let decision = policy.check(frame_len(&msg));
                metrics.policy_decisions.inc(&[("decision", decision.label())]);
                match decision {
                    PolicyDecision::Pass => {}
                    PolicyDecision::Drop => continue,
                    PolicyDecision::Close { code, msg } => {
                        close_with_error(&mut ws_tx, code, msg).await;
                        break;
                    }
                }

                match decode(msg) {
                    Ok(Inbound::Event { frame, bytes_len }) => {
                        let event = frame.event.clone();
                        if !dispatcher.handles(&event) {
                            metrics.unknown_events.inc(&[]);
                            tracing::debug!(%event, "unknown event ignored");
                            continue;
                        }

                        let ctx = RealtimeCtx::new(meta.conn_id, lifecycle.identity(), core.clone());
                        let started = Instant::now();
                        let res = dispatcher.dispatch(ctx, frame).await;
                        metrics.dispatch_duration.observe(&[("event", event.as_str())], started.elapsed());

                        if let Err(e) = res {
                            metrics.handler_errors.inc(&[("event", event.as_str()), ("code", e.client_code().as_str())]);
                            tracing::debug!(%event, bytes_len, error = %e, "event ignored");
                        }
                    }
                    Ok(Inbound::Binary { bytes_len }) => {
                        metrics.decode_errors.inc(&[("kind", "binary")]);
                        tracing::debug!(bytes_len, "binary frame ignored");
                    }
                    // pong replies are queued by the websocket library
                    Ok(Inbound::Ping) | Ok(Inbound::Pong) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        metrics.decode_errors.inc(&[("kind", "json")]);
                        tracing::debug!(error = %e, "malformed frame ignored");
                    }
                }
            }

            // heartbeat
            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            // idle timeout
            _ = idle_tick.tick() => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::debug!("idle timeout");
                    close_with_error(&mut ws_tx, ClientCode::Timeout, "idle timeout").await;
                    break;
                }
            }

            // drain
            changed = shutdown.changed() => {
                let stop = changed.is_err() || *shutdown.borrow();
                if stop {
                    let _ = ws_tx
                        .send(Message::Close(Some(CloseFrame {
                            code: CLOSE_GOING_AWAY,
                            reason: "server shutting down".into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Write a `sys:error` then a close frame straight to the socket; the
/// outbound queue is not drained once the loop exits.
async fn close_with_error(ws_tx: &mut SplitSink<WebSocket, Message>, code: ClientCode, msg: &'static str) {
    match OutboundEvent::sys_error(code.as_str(), msg) {
        Ok(out) => {
            let _ = ws_tx.send(Message::Text(out.into_text())).await;
        }
        Err(e) => tracing::warn!(error = %e, "sys:error encode failed"),
    }
    let _ = ws_tx
        .send(Message::Close(Some(CloseFrame {
            code: CLOSE_POLICY,
            reason: msg.into(),
        })))
        .await;
}
