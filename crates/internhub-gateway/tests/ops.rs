#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use internhub_gateway::app_state::AppState;
use internhub_gateway::config::GatewayConfig;
use internhub_gateway::obs::metrics::GatewayMetrics;

#[test]
fn metrics_render_prometheus_text() {
    let m = GatewayMetrics::default();
    m.relay_outcomes.inc(&[("outcome", "forwarded")]);
    m.relay_outcomes.add(&[("outcome", "forwarded")], 2);
    m.ws_active_sessions.inc(&[]);
    m.dispatch_duration.observe(&[("event", "message:new")], Duration::from_micros(700));

    let out = m.render(&[("internhub_hub_sessions", 4)]);
    assert!(out.contains("# TYPE internhub_relay_total counter"));
    assert!(out.contains("internhub_relay_total{outcome=\"forwarded\"} 3"));
    assert!(out.contains("internhub_ws_sessions_active 1"));
    assert!(out.contains("internhub_dispatch_duration_micros_bucket{event=\"message:new\",le=\"500\"} 0"));
    assert!(out.contains("internhub_dispatch_duration_micros_bucket{event=\"message:new\",le=\"1000\"} 1"));
    assert!(out.contains("internhub_dispatch_duration_micros_count{event=\"message:new\"} 1"));
    assert!(out.contains("internhub_draining 0"));
    assert!(out.contains("internhub_hub_sessions 4"));
}

#[test]
fn drain_flips_readiness_and_notifies_sessions() {
    let s = AppState::new(GatewayConfig::default()).unwrap();
    let rx = s.shutdown_rx();
    assert!(!s.is_draining());

    s.begin_drain();

    assert!(s.is_draining());
    assert!(*rx.borrow());
    assert!(s.metrics().render(&[]).contains("internhub_draining 1"));
}

#[test]
fn hub_stats_exported() {
    let s = AppState::new(GatewayConfig::default()).unwrap();
    let core = s.realtime();
    let _a = common::connect(&core, Some("stu_a"));
    let _w = common::connect(&core, None);
    core.signal_status("ghost", true).unwrap();

    let extra = s.metrics_extra();
    assert!(extra.contains(&("internhub_hub_sessions", 2)));
    assert!(extra.contains(&("internhub_hub_registered_identities", 1)));
    assert!(extra.contains(&("internhub_hub_online_identities", 2)));
}
