//! Pagination, jump-to-message and selection ordering tests
//!
//! Run with: cargo test -p integration-tests --test pagination_tests

use std::time::Duration;

use huddle_client::window;
use integration_tests::{advance, server_id, Harness};

// ============================================================================
// Backward paging
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_load_older_until_exhausted() {
    let h = Harness::new();
    let (general, history) = h.seed_channel("general", 120);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 50);
    assert_eq!(visible[0].id, history[70].id);
    assert!(h.client.has_more(general));

    assert!(h.client.load_older_messages().await.unwrap());
    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 100);
    assert_eq!(visible[0].id, history[20].id);
    assert!(window::is_consistent(&visible));
    assert_eq!(h.cached(general).unwrap().len(), 100);

    let anchors: Vec<_> = h
        .backend
        .calls()
        .list_messages
        .into_iter()
        .map(|(_, before)| before)
        .collect();
    assert_eq!(anchors, vec![None, Some(history[70].id)]);

    assert!(h.client.load_older_messages().await.unwrap());
    assert_eq!(h.client.visible_messages().len(), 120);
    assert!(!h.client.has_more(general));

    // Exhausted: no further request
    assert!(!h.client.load_older_messages().await.unwrap());
    assert_eq!(h.backend.calls().list_messages.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_load_older_sorts_newest_first_page() {
    let h = Harness::new();
    let (general, history) = h.seed_channel("general", 120);
    h.backend.newest_first(true);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    assert!(h.client.load_older_messages().await.unwrap());

    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 100);
    assert!(window::is_consistent(&visible));
    assert_eq!(visible[0].id, history[20].id);
    assert_eq!(visible[99].id, history[119].id);
    assert!(window::is_consistent(&h.cached(general).unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_load_older_issues_one_request() {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", 80);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();
    h.backend.delay_lists(general, Duration::from_millis(100));

    let (first, second) = tokio::join!(
        h.client.load_older_messages(),
        h.client.load_older_messages()
    );

    assert!(first.unwrap());
    assert!(!second.unwrap());
    assert_eq!(h.backend.calls().list_messages.len(), 2);
    assert_eq!(h.client.visible_messages().len(), 80);
}

#[tokio::test(start_paused = true)]
async fn test_load_older_failure_allows_retry() {
    let mut h = Harness::new();
    let (general, _) = h.seed_channel("general", 80);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();
    h.take_events();

    h.backend.fail_list_messages(true);
    assert!(h.client.load_older_messages().await.is_err());
    assert_eq!(h.client.visible_messages().len(), 50);
    assert_eq!(h.take_notices().len(), 1);

    h.backend.fail_list_messages(false);
    assert!(h.client.load_older_messages().await.unwrap());
    assert_eq!(h.client.visible_messages().len(), 80);
}

// ============================================================================
// Jump to message
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_jump_to_unloaded_message_merges_window() {
    let h = Harness::new();
    let (general, history) = h.seed_channel("general", 200);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    let target = history[20].id;
    assert!(!window::contains(&h.client.visible_messages(), target));

    assert!(h.client.jump_to_message(target).await.unwrap());

    let visible = h.client.visible_messages();
    assert!(window::contains(&visible, target));
    assert!(window::is_consistent(&visible));
    assert_eq!(visible.len(), 50 + 25);
    assert!(window::contains(&h.cached(general).unwrap(), target));
    assert_eq!(h.backend.calls().list_around, vec![target]);
}

#[tokio::test(start_paused = true)]
async fn test_load_older_after_jumps_anchors_on_oldest_loaded() {
    let h = Harness::new();
    let (general, history) = h.seed_channel("general", 200);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    // Latest page is history[150..200]
    assert!(h.client.jump_to_message(history[100].id).await.unwrap());
    assert_eq!(h.client.visible_messages().len(), 75);
    assert!(h.client.jump_to_message(history[20].id).await.unwrap());
    assert_eq!(h.client.visible_messages().len(), 100);

    // Oldest loaded is history[8], so only history[0..8] remains
    assert!(h.client.load_older_messages().await.unwrap());

    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 108);
    assert_eq!(visible[0].id, history[0].id);
    assert!(window::is_consistent(&visible));
    assert!(!h.client.has_more(general));

    let visible_ids: Vec<_> = visible.iter().map(|m| m.id).collect();
    let cached_ids: Vec<_> = h.cached(general).unwrap().iter().map(|m| m.id).collect();
    assert_eq!(cached_ids, visible_ids);
    assert_eq!(
        h.backend.calls().list_messages.last(),
        Some(&(general, Some(history[8].id)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_jump_to_loaded_message_skips_fetch() {
    let h = Harness::new();
    let (general, history) = h.seed_channel("general", 10);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    assert!(h.client.jump_to_message(history[3].id).await.unwrap());
    assert!(h.backend.calls().list_around.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_jump_to_missing_message_raises_notice() {
    let mut h = Harness::new();
    let (general, _) = h.seed_channel("general", 10);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();
    h.take_events();

    assert!(h.client.jump_to_message(server_id()).await.is_err());
    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].code, "UNKNOWN_MESSAGE");
    assert_eq!(h.client.visible_messages().len(), 10);
}

// ============================================================================
// Selection races
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_late_page_does_not_replace_newer_selection() {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", 5);
    let (random, random_history) = h.seed_channel("random", 3);
    h.sign_in().await;
    h.backend.delay_lists(general, Duration::from_millis(200));

    let client = h.client.clone();
    let slow = tokio::spawn(async move { client.select_conversation(general).await });
    advance(10).await;
    h.client.select_conversation(random).await.unwrap();

    slow.await.unwrap().unwrap();

    assert_eq!(h.client.active_conversation(), Some(random));
    let ids: Vec<_> = h.client.visible_messages().iter().map(|m| m.id).collect();
    let expected: Vec<_> = random_history.iter().map(|m| m.id).collect();
    assert_eq!(ids, expected);

    // The late page still reached the cache
    assert_eq!(h.cached(general).unwrap().len(), 5);
}
