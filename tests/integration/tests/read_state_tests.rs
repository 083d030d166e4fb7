//! Read/unread aggregation tests
//!
//! Run with: cargo test -p integration-tests --test read_state_tests

use std::time::Duration;

use integration_tests::{advance, message, message_row, Harness};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_mark_read_burst_coalesces_to_one_call() {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", 1);
    h.sign_in().await;

    let mut last_request = Instant::now();
    for _ in 0..5 {
        assert!(h.client.mark_as_read(general));
        last_request = Instant::now();
        advance(100).await;
    }
    advance(1_000).await;

    let calls = h.backend.calls().mark_read;
    assert_eq!(calls.len(), 1);
    let (conversation_id, at) = calls[0];
    assert_eq!(conversation_id, general);
    assert!(at.duration_since(last_request) >= Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_mark_read_dropped_within_min_interval() {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", 1);
    h.sign_in().await;

    assert!(h.client.mark_as_read(general));
    advance(400).await;
    assert_eq!(h.backend.calls().mark_read.len(), 1);

    // Marked successfully moments ago
    assert!(!h.client.mark_as_read(general));
    advance(2_000).await;

    assert!(h.client.mark_as_read(general));
    advance(400).await;
    assert_eq!(h.backend.calls().mark_read.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_mark_read_failure_is_silent() {
    let mut h = Harness::new();
    let (general, _) = h.seed_channel("general", 1);
    h.sign_in().await;
    h.take_events();
    h.backend.fail_mark_read(true);

    assert!(h.client.mark_as_read(general));
    advance(400).await;
    assert_eq!(h.backend.calls().mark_read.len(), 1);
    assert!(h.take_notices().is_empty());

    // No success was recorded, so the next request goes out
    h.backend.fail_mark_read(false);
    assert!(h.client.mark_as_read(general));
    advance(400).await;
    assert_eq!(h.backend.calls().mark_read.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unread_push_sends_settled_total_once() {
    let h = Harness::new();
    h.seed_channel("general", 1);
    let (random, _) = h.seed_channel("random", 1);
    h.sign_in().await;

    for i in 0..3 {
        let incoming = message(random, &h.peer, "ping", 10_000 + i);
        h.client.handle_realtime(&message_row(&incoming));
        advance(100).await;
    }
    assert_eq!(h.client.unread_total(), 3);

    advance(1_000).await;
    let totals: Vec<u32> = h
        .backend
        .calls()
        .unread_pushes
        .into_iter()
        .map(|(total, _)| total)
        .collect();
    assert_eq!(totals, vec![3]);

    // Nothing changed since the last push
    advance(2_000).await;
    assert_eq!(h.backend.calls().unread_pushes.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_selecting_conversation_clears_its_unread() {
    let h = Harness::new();
    h.seed_channel("general", 1);
    let (random, _) = h.seed_channel("random", 1);
    h.sign_in().await;

    let incoming = message(random, &h.peer, "ping", 10_000);
    h.client.handle_realtime(&message_row(&incoming));
    advance(1_000).await;
    assert_eq!(h.client.unread_total(), 1);

    h.client.select_conversation(random).await.unwrap();
    assert_eq!(h.client.conversation(random).unwrap().unread_count, 0);
    assert_eq!(h.client.unread_total(), 0);

    advance(1_000).await;
    let calls = h.backend.calls();
    assert_eq!(calls.unread_pushes.last().map(|(total, _)| *total), Some(0));
    assert_eq!(calls.mark_read.len(), 1);
}
