//! Observable presence & relay properties, driven through `RealtimeCore`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::time::{Duration, Instant};

use serde_json::value::RawValue;
use serde_json::{json, Value};

use common::{connect, core, status};
use internhub_gateway::context::Lifecycle;
use internhub_gateway::realtime::{RealtimeCore, RelayOutcome};

fn relay(core: &RealtimeCore, payload: &str) -> RelayOutcome {
    let raw = RawValue::from_string(payload.to_string()).unwrap();
    core.relay(Some(&*raw)).unwrap()
}

#[test]
fn distinct_identities_get_distinct_connections() {
    let core = core();
    let a = connect(&core, Some("stu_a"));
    let b = connect(&core, Some("rec_b"));

    assert_eq!(core.hub().lookup("stu_a"), Some(a.id));
    assert_eq!(core.hub().lookup("rec_b"), Some(b.id));
    assert_ne!(a.id, b.id);
}

#[test]
fn connect_with_identity_binds_and_broadcasts_to_everyone() {
    let core = core();
    let mut anon = connect(&core, None);
    assert_eq!(anon.lifecycle, Lifecycle::Unidentified);

    let mut a = connect(&core, Some("stu_a"));
    assert_eq!(a.lifecycle, Lifecycle::Identified("stu_a".into()));
    assert!(core.hub().is_online("stu_a"));

    // global fan-out reaches unidentified sessions and the new session itself
    assert_eq!(anon.drain(), vec![status("stu_a", true)]);
    assert_eq!(a.drain(), vec![status("stu_a", true)]);
}

#[test]
fn empty_user_id_is_treated_as_absent() {
    let core = core();
    let mut watcher = connect(&core, None);
    let c = connect(&core, Some(""));

    assert_eq!(c.lifecycle, Lifecycle::Unidentified);
    assert_eq!(core.hub().lookup(""), None);
    assert!(watcher.drain().is_empty());
}

#[test]
fn disconnect_cleans_up_and_broadcasts_offline() {
    let core = core();
    let mut watcher = connect(&core, None);
    let mut x = connect(&core, Some("stu_x"));
    watcher.drain();

    x.disconnect(&core);

    assert_eq!(x.lifecycle, Lifecycle::Terminated);
    assert_eq!(core.hub().lookup("stu_x"), None);
    assert!(!core.hub().is_online("stu_x"));
    assert_eq!(watcher.drain(), vec![status("stu_x", false)]);
    assert_eq!(core.hub().stats().sessions, 1);
}

#[test]
fn anonymous_disconnect_has_no_presence_effects() {
    let core = core();
    let mut watcher = connect(&core, Some("rec_w"));
    let mut anon = connect(&core, None);
    watcher.drain();

    anon.disconnect(&core);

    assert!(watcher.drain().is_empty());
    assert_eq!(core.hub().stats().sessions, 1);
    assert_eq!(core.hub().lookup("rec_w"), Some(watcher.id));
}

#[test]
fn signals_update_online_set_without_touching_registry() {
    let core = core();
    let mut a = connect(&core, Some("stu_a"));
    a.drain();

    core.signal_status("ghost", true).unwrap();
    assert!(core.hub().is_online("ghost"));
    assert_eq!(core.hub().lookup("ghost"), None);

    core.signal_status("stu_a", false).unwrap();
    assert!(!core.hub().is_online("stu_a"));
    assert_eq!(core.hub().lookup("stu_a"), Some(a.id));

    assert_eq!(a.drain(), vec![status("ghost", true), status("stu_a", false)]);
}

#[test]
fn repeated_signals_are_broadcast_every_time() {
    let core = core();
    let mut w = connect(&core, None);

    core.signal_status("stu_a", true).unwrap();
    core.signal_status("stu_a", true).unwrap();

    assert!(core.hub().is_online("stu_a"));
    assert_eq!(w.drain(), vec![status("stu_a", true), status("stu_a", true)]);
}

#[test]
fn snapshot_query_replies_to_requester_only() {
    let core = core();
    let mut a = connect(&core, Some("A"));
    let mut requester = connect(&core, None);
    a.drain();
    requester.drain();

    let d = core
        .report_statuses(requester.id, &["A".to_string(), "C".to_string()])
        .unwrap();

    assert_eq!(d.queued, 2);
    assert_eq!(requester.drain(), vec![status("A", true), status("C", false)]);
    assert!(a.drain().is_empty());
}

#[test]
fn relay_reaches_only_the_receiver_unmodified() {
    let core = core();
    let mut a = connect(&core, Some("stu_a"));
    let mut b = connect(&core, Some("rec_b"));
    let mut c = connect(&core, Some("stu_c"));
    a.drain();
    b.drain();
    c.drain();

    let payload = r#"{"receiverId":"rec_b","senderId":"stu_a","message":"Hello!","meta":{"n":[1,2]}}"#;
    let outcome = relay(&core, payload);
    assert_eq!(outcome, RelayOutcome::Forwarded);

    let got = b.drain();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0]["event"], "message:new");
    assert_eq!(got[0]["data"], serde_json::from_str::<Value>(payload).unwrap());
    assert!(a.drain().is_empty());
    assert!(c.drain().is_empty());
}

#[test]
fn relay_to_unregistered_receiver_is_dropped() {
    let core = core();
    let mut a = connect(&core, Some("stu_a"));
    let mut anon = connect(&core, None);
    a.drain();
    anon.drain();

    let outcome = relay(&core, r#"{"receiverId":"nobody","message":"hi"}"#);
    assert_eq!(outcome, RelayOutcome::NotConnected);

    // online via signal but not registered: still dropped
    core.signal_status("floating", true).unwrap();
    a.drain();
    anon.drain();
    let outcome = relay(&core, r#"{"receiverId":"floating"}"#);
    assert_eq!(outcome, RelayOutcome::NotConnected);

    assert!(a.drain().is_empty());
    assert!(anon.drain().is_empty());
    assert_eq!(core.metrics().relay_outcomes.get(&[("outcome", "not_connected")]), 2);
}

#[test]
fn relay_without_receiver_is_dropped() {
    let core = core();
    let mut a = connect(&core, Some("stu_a"));
    a.drain();

    for p in [r#"{"message":"hi"}"#, r#"{"receiverId":""}"#, r#""stu_a""#, r#"{"receiverId":7}"#] {
        assert_eq!(relay(&core, p), RelayOutcome::NoReceiver, "{p}");
    }
    assert_eq!(core.relay(None).unwrap(), RelayOutcome::NoReceiver);
    assert!(a.drain().is_empty());
}

#[test]
fn relay_after_receiver_disconnect_is_dropped() {
    let core = core();
    let mut b = connect(&core, Some("rec_b"));
    b.disconnect(&core);

    let outcome = relay(&core, r#"{"receiverId":"rec_b"}"#);
    assert_eq!(outcome, RelayOutcome::NotConnected);
    assert!(b.drain().iter().all(|f| f["event"] != json!("message:new")));
}

#[test]
fn relay_to_full_queue_is_rejected_immediately() {
    let core = core();
    let mut a = connect(&core, Some("stu_a"));
    // the receiver's own connect broadcast fills its single slot
    let mut b = common::connect_with_queue(&core, Some("rec_b"), 1);
    a.drain();

    let started = Instant::now();
    let outcome = relay(&core, r#"{"receiverId":"rec_b","message":"hi"}"#);
    assert_eq!(outcome, RelayOutcome::QueueRejected);
    assert!(started.elapsed() < Duration::from_millis(100));

    assert_eq!(b.drain(), vec![status("rec_b", true)]);
    assert!(a.drain().is_empty());
    assert_eq!(core.metrics().relay_outcomes.get(&[("outcome", "queue_rejected")]), 1);
}

#[test]
fn self_relay_with_full_queue_does_not_wait_on_itself() {
    let core = core();
    let mut a = common::connect_with_queue(&core, Some("stu_a"), 1);

    let started = Instant::now();
    let outcome = relay(&core, r#"{"receiverId":"stu_a","message":"note to self"}"#);
    assert_eq!(outcome, RelayOutcome::QueueRejected);
    assert!(started.elapsed() < Duration::from_millis(100));

    // once drained, the same relay goes through
    assert_eq!(a.drain(), vec![status("stu_a", true)]);
    assert_eq!(relay(&core, r#"{"receiverId":"stu_a"}"#), RelayOutcome::Forwarded);
    assert_eq!(a.drain()[0]["event"], "message:new");
}

#[test]
fn full_queue_drops_broadcast_without_blocking() {
    let core = core();
    let mut slow = common::connect_with_queue(&core, None, 1);
    core.signal_status("x", true).unwrap();
    let d = core.signal_status("y", true).unwrap();

    assert_eq!(d.dropped, 1);
    assert_eq!(slow.drain(), vec![status("x", true)]);
    assert_eq!(core.metrics().broadcast_drops.get(&[("kind", "status")]), 1);
}

#[test]
fn clear_tears_down_everything() {
    let core = core();
    let _a = connect(&core, Some("stu_a"));
    core.signal_status("ghost", true).unwrap();

    core.hub().clear();

    let s = core.hub().stats();
    assert_eq!((s.sessions, s.registered, s.online), (0, 0, 0));
}
