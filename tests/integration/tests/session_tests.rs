//! Session lifecycle tests
//!
//! Run with: cargo test -p integration-tests --test session_tests

use huddle_client::{ClientError, ClientEvent, ReconcileOutcome};
use huddle_core::{DomainError, SessionId};
use integration_tests::{advance, channel, message, message_row, user, Harness};

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sign_in_same_user_keeps_session() {
    let h = Harness::new();
    let first = h.client.sign_in(h.me.clone()).unwrap();
    let again = h.client.sign_in(h.me.clone()).unwrap();

    assert_eq!(first, again);
    assert_eq!(h.cache.owner(), Some(first));
    assert_eq!(h.hub.subscription_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_operations_require_sign_in() {
    let h = Harness::new();
    let err = h.client.refresh(false).await.unwrap_err();
    assert!(matches!(err, ClientError::Domain(DomainError::NotSignedIn)));
    assert!(!h.client.mark_as_read(huddle_core::ConversationId::new_v4()));
}

#[tokio::test(start_paused = true)]
async fn test_user_switch_clears_previous_user_data() {
    let mut h = Harness::new();
    let (general, _) = h.seed_channel("general", 3);
    let old_session = h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();
    assert_eq!(h.client.visible_messages().len(), 3);
    assert_eq!(h.cache.entry_count(), 1);
    h.take_events();

    let new_session = h.client.sign_in(user("Cy")).unwrap();

    assert_ne!(old_session, new_session);
    assert!(h.client.visible_messages().is_empty());
    assert!(h.client.conversations().is_empty());
    assert_eq!(h.client.active_conversation(), None);
    assert_eq!(h.client.unread_total(), 0);
    assert_eq!(h.cache.entry_count(), 0);
    assert_eq!(h.cache.owner(), Some(new_session));
    assert_eq!(h.hub.subscription_count(), 2);

    // The old session can no longer write
    assert!(h.cache.put_messages(old_session, general, Vec::new()).is_err());

    let sessions: Vec<_> = h
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            ClientEvent::SessionChanged { session_id } => Some(session_id),
            _ => None,
        })
        .collect();
    assert_eq!(sessions, vec![None, Some(new_session)]);
}

#[test]
fn test_sync_calls_from_outside_the_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();
    let h = Harness::on_runtime(runtime.handle().clone());
    let (general, _) = h.seed_channel("general", 2);
    let fresh = channel("fresh");
    let fresh_id = fresh.id;
    h.backend.reveal_on_call(2, fresh);

    // No runtime context on this thread
    h.client.sign_in(h.me.clone()).unwrap();
    runtime.block_on(h.client.refresh(false)).unwrap();
    assert!(h.client.mark_as_read(general));
    let incoming = message(fresh_id, &h.peer, "hi", 10_000);
    assert_eq!(
        h.client.handle_realtime(&message_row(&incoming)),
        ReconcileOutcome::Discovering
    );

    runtime.block_on(advance(2_000));
    assert_eq!(h.backend.calls().mark_read.len(), 1);
    assert!(h.client.conversation(fresh_id).is_some());
}

// ============================================================================
// Sign-out
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sign_out_is_idempotent_and_releases_everything() {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", 2);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    assert!(h.client.sign_out());
    assert!(!h.client.sign_out());

    assert_eq!(h.client.session_id(), None);
    assert_eq!(h.cache.owner(), None);
    assert!(h.cache.is_empty());
    assert_eq!(h.hub.subscription_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_cancels_pending_timers() {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", 2);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    // Mark-as-read and the unread push are still debouncing
    h.client.sign_out();
    advance(3_000).await;

    let calls = h.backend.calls();
    assert!(calls.mark_read.is_empty());
    assert!(calls.unread_pushes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_late_page_after_sign_out_is_discarded() {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", 5);
    h.sign_in().await;
    h.backend
        .delay_lists(general, std::time::Duration::from_millis(100));

    let client = h.client.clone();
    let select = tokio::spawn(async move { client.select_conversation(general).await });
    advance(10).await;
    h.client.sign_out();

    let result = select.await.unwrap();
    assert!(result.unwrap_err().is_stale());
    assert!(h.cache.is_empty());
    assert!(h.client.visible_messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cache_refusal_for_current_session_is_surfaced() {
    let mut h = Harness::new();
    h.seed_channel("general", 2);
    h.sign_in().await;
    h.take_events();

    // Someone else took the cache while this session is still current
    h.cache.invalidate_all();
    h.cache.claim(SessionId::new_v4()).unwrap();

    let err = h.client.refresh(false).await.unwrap_err();
    assert!(matches!(err, ClientError::Cache(_)));
    assert!(!err.is_stale_for(h.client.session_id()));

    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].code, "CACHE_ERROR");
}
