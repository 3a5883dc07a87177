//! End-to-end routing scenarios driven by a manual clock

use crate::test_utils::*;
use tidelink_router::{CommandBatch, Envelope, Medium, QueuedCommand, RouterError};

fn batch(text: &str) -> CommandBatch {
    CommandBatch::new(vec![QueuedCommand { id: 1, payload: text.as_bytes().to_vec() }])
}

#[test]
fn test_wireless_reachability_window() {
    let node = TestNode::new(4);
    node.router.process(announce(3, 0.0)).unwrap();

    node.clock.set(10.0);
    assert!(node.router.is_reachable_wireless("auv-3"));
    node.clock.set(16.0);
    assert!(!node.router.is_reachable_wireless("auv-3"));
}

#[test]
fn test_acoustic_route_succeeds_then_expires() {
    let node = TestNode::new(4);
    node.router.process(acoustic_frame(1, 0.0)).unwrap();

    node.clock.set(100.0);
    assert!(node.router.route_over_acoustic("auv-1", batch("goto")));
    assert_eq!(node.dispatcher.count(), 1);

    node.clock.set(130.0);
    assert!(!node.router.route_over_acoustic("auv-1", batch("goto")));
    assert_eq!(node.dispatcher.count(), 1);
}

#[test]
fn test_unobserved_peers_never_reachable() {
    let node = TestNode::new(4);
    node.router.process(acoustic_frame(1, 0.0)).unwrap();

    for medium in Medium::ALL {
        assert!(!node.router.is_reachable(medium, "auv-2"));
    }
    assert!(!node.router.route_over_acoustic("auv-2", batch("x")));
    assert!(!node.router.route_over_wireless("auv-2", batch("x")).unwrap());
    assert_eq!(node.dispatcher.count(), 0);
}

#[test]
fn test_caller_falls_back_to_acoustic() {
    let node = TestNode::new(4);
    node.router.process(announce(2, 0.0)).unwrap();
    node.router.process(acoustic_frame(2, 0.0)).unwrap();

    // Out of wireless range, still within the acoustic window
    node.clock.set(60.0);
    let sent = node.router.route_over_wireless("auv-2", batch("survey")).unwrap()
        || node.router.route_over_acoustic("auv-2", batch("survey"));
    assert!(sent);
    assert!(matches!(node.dispatcher.envelopes()[0], Envelope::Acoustic { .. }));
}

#[test]
fn test_wireless_forwarder_drains_newly_reachable_peer() {
    let node = TestNode::new(4);
    node.queue.enqueue(vehicle_id(3), b"abort-mission".to_vec());

    // Queue work before the peer is in range: nothing moves
    assert!(node.forwarder.forward_commands_wireless().forwarded.is_empty());
    assert_eq!(node.dispatcher.count(), 0);

    node.router.process(announce(3, 0.0)).unwrap();
    let report = node.forwarder.forward_commands_wireless();
    assert_eq!(report.forwarded, vec!["auv-3"]);

    let envelopes = node.dispatcher.envelopes();
    assert_eq!(envelopes.len(), 1);
    match &envelopes[0] {
        Envelope::Direct { destination, batch } => {
            assert_eq!(*destination, vehicle_id(3));
            assert_eq!(batch.commands.len(), 1);
        }
        other => panic!("expected direct envelope, got {other:?}"),
    }

    // Drained: the same command is not offered again
    node.forwarder.forward_commands_wireless();
    assert_eq!(node.dispatcher.count(), 1);
}

#[test]
fn test_acoustic_forwarder_serves_every_reachable_peer() {
    let node = TestNode::new(6);
    for n in [1, 2, 4] {
        node.router.process(acoustic_frame(n, 0.0)).unwrap();
        node.queue.enqueue(vehicle_id(n), vec![n as u8; 100]);
    }
    // auv-5 has work but was never heard
    node.queue.enqueue(vehicle_id(5), vec![5; 100]);

    node.clock.set(119.0);
    let report = node.forwarder.forward(Medium::Acoustic).unwrap();
    assert_eq!(report.reachable, 3);
    assert_eq!(report.forwarded, vec!["auv-1", "auv-2", "auv-4"]);
    assert_eq!(node.queue.pending_count(vehicle_id(5)), 1);

    for envelope in node.dispatcher.envelopes() {
        match envelope {
            Envelope::Acoustic { system, batch } => {
                assert_eq!(batch.destination.map(|d| d - 20), system[4..].parse().ok());
            }
            other => panic!("expected acoustic envelope, got {other:?}"),
        }
    }
}

#[test]
fn test_navigation_cache_is_side_table() {
    let node = TestNode::new(4);
    node.router.process(navigation(2, 12.5)).unwrap();

    assert_eq!(node.router.navigation_state("auv-2").unwrap().depth, 12.5);
    // Navigation alone never makes a peer reachable
    assert!(node.router.reachable_peers(Medium::Acoustic).is_empty());
    assert!(node.router.reachable_peers(Medium::Wireless).is_empty());
}

#[test]
fn test_unknown_navigation_source_is_reported() {
    let node = TestNode::new(2);
    let result = node.router.process(navigation(9, 1.0));
    assert!(matches!(result, Err(RouterError::Identity(_))));
}

#[test]
fn test_observations_from_json_lines() {
    let node = TestNode::new(4);
    let lines = [
        r#"{"kind":"announce","sys_name":"auv-1","source":21,"lat":0.0,"lon":0.0,"timestamp":0.0}"#,
        r#"{"kind":"acoustic_frame","sys_src":"auv-2","sys_dst":"base","timestamp":0.0}"#,
    ];
    for line in lines {
        node.router.process(serde_json::from_str(line).unwrap()).unwrap();
    }
    assert_eq!(node.router.reachable_peers(Medium::Wireless), vec!["auv-1"]);
    assert_eq!(node.router.reachable_peers(Medium::Acoustic), vec!["auv-2"]);
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_forwarders_run_both_media() {
    let node = TestNode::new(4);
    node.router.process(announce(1, 0.0)).unwrap();
    node.router.process(acoustic_frame(2, 0.0)).unwrap();
    node.queue.enqueue(vehicle_id(1), b"wifi".to_vec());
    node.queue.enqueue(vehicle_id(2), b"modem".to_vec());

    let (tx, rx) = tokio::sync::watch::channel(false);
    let handles = [Medium::Acoustic, Medium::Wireless].map(|medium| {
        tokio::spawn(node.forwarder.clone().run(
            medium,
            std::time::Duration::from_secs(5),
            rx.clone(),
        ))
    });

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert_eq!(node.dispatcher.count(), 2);

    drop(tx);
    for handle in handles {
        handle.await.unwrap();
    }
}
