//! Optimistic send tests
//!
//! Run with: cargo test -p integration-tests --test send_tests

use huddle_client::{window, ClientError, ReconcileOutcome};
use huddle_common::NoticeLevel;
use huddle_core::{ConversationId, DomainError};
use integration_tests::{advance, message, message_row, reply, text_file, Harness};

async fn selected(count: usize) -> (Harness, ConversationId) {
    let h = Harness::new();
    let (general, _) = h.seed_channel("general", count);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();
    (h, general)
}

// ============================================================================
// Placeholder lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_placeholder_visible_before_confirmation() {
    let (h, general) = selected(3).await;
    let gate = h.backend.gate_sends();

    let client = h.client.clone();
    let send = tokio::spawn(async move { client.send_message("hello", None, Vec::new()).await });
    advance(10).await;

    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 4);
    let placeholder = &visible[3];
    assert!(placeholder.is_optimistic());
    assert_eq!(placeholder.body.as_deref(), Some("hello"));
    assert_eq!(placeholder.author.id, h.me.id);
    assert!(h.cached(general).unwrap().iter().any(|m| m.id == placeholder.id));

    gate.add_permits(1);
    let report = send.await.unwrap().unwrap();
    assert!(report.is_complete());
    assert_eq!(report.confirmed.len(), 1);

    // Replaced in place, nothing optimistic left
    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 4);
    assert_eq!(visible[3].id, report.confirmed[0]);
    assert!(visible.iter().all(|m| !m.is_optimistic()));
    assert!(window::is_consistent(&visible));

    let cached = h.cached(general).unwrap();
    let cached_ids: Vec<_> = cached.iter().map(|m| m.id).collect();
    let visible_ids: Vec<_> = visible.iter().map(|m| m.id).collect();
    assert_eq!(cached_ids, visible_ids);

    let last = h.client.conversation(general).unwrap().last_message.unwrap();
    assert_eq!(last.message_id, report.confirmed[0]);
}

#[tokio::test(start_paused = true)]
async fn test_own_echo_before_confirmation_not_duplicated() {
    let (h, general) = selected(3).await;
    let gate = h.backend.gate_sends();
    let id = h.backend.assign_next_id();

    let client = h.client.clone();
    let send = tokio::spawn(async move { client.send_message("hello", None, Vec::new()).await });
    advance(10).await;

    // The echo overtakes the insert response
    let mut echo = message(general, &h.me, "hello", 10_000);
    echo.id = id;
    assert_eq!(
        h.client.handle_realtime(&message_row(&echo)),
        ReconcileOutcome::Recorded
    );
    assert!(!window::contains(&h.client.visible_messages(), id));

    gate.add_permits(1);
    let report = send.await.unwrap().unwrap();
    assert_eq!(report.confirmed, vec![id]);

    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 4);
    assert_eq!(visible.iter().filter(|m| m.id == id).count(), 1);
    assert!(visible.iter().all(|m| !m.is_optimistic()));
    assert!(window::is_consistent(&visible));

    let cached_ids: Vec<_> = h.cached(general).unwrap().iter().map(|m| m.id).collect();
    let visible_ids: Vec<_> = visible.iter().map(|m| m.id).collect();
    assert_eq!(cached_ids, visible_ids);
}

#[tokio::test(start_paused = true)]
async fn test_own_echo_after_confirmation_not_duplicated() {
    let (h, _) = selected(2).await;
    let report = h
        .client
        .send_message("hello", None, Vec::new())
        .await
        .unwrap();

    let confirmed = h
        .client
        .visible_messages()
        .into_iter()
        .find(|m| m.id == report.confirmed[0])
        .unwrap();
    let outcome = h.client.handle_realtime(&message_row(&confirmed));

    assert_eq!(outcome, ReconcileOutcome::Recorded);
    assert_eq!(h.client.visible_messages().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_rolls_back_placeholder() {
    let (mut h, general) = selected(2).await;
    h.take_events();
    h.backend.fail_next_sends(1);

    let report = h
        .client
        .send_message("oops", None, Vec::new())
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert!(report.confirmed.is_empty());
    assert_eq!(h.client.visible_messages().len(), 2);
    assert!(h.client.visible_messages().iter().all(|m| !m.is_optimistic()));
    assert_eq!(h.cached(general).unwrap().len(), 2);

    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].code, "SEND_FAILED");
    assert_eq!(notices[0].level, NoticeLevel::Toast);
}

// ============================================================================
// Multi-file sends
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_multi_file_send_partial_failure() {
    let (mut h, _) = selected(1).await;
    h.take_events();
    h.uploader.fail_file("b.txt");

    let files = vec![text_file("a.txt"), text_file("b.txt"), text_file("c.txt")];
    let report = h
        .client
        .send_message("see attached", None, files)
        .await
        .unwrap();

    assert_eq!(report.confirmed.len(), 2);
    assert_eq!(report.failed, 1);
    assert_eq!(h.uploader.uploaded(), vec!["a.txt", "c.txt"]);

    // Text rides with the first file only
    let sent = h.backend.calls().sent;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body.as_deref(), Some("see attached"));
    assert_eq!(sent[0].attachment.as_ref().unwrap().file_name, "a.txt");
    assert_eq!(sent[1].body, None);
    assert_eq!(sent[1].attachment.as_ref().unwrap().file_name, "c.txt");

    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 3);
    assert!(visible.iter().all(|m| !m.is_optimistic()));
    for id in &report.confirmed {
        assert!(window::contains(&visible, *id));
    }

    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].code, "SEND_FAILED");
}

#[tokio::test(start_paused = true)]
async fn test_multi_file_placeholders_appear_up_front() {
    let (h, _) = selected(0).await;
    let gate = h.backend.gate_sends();

    let client = h.client.clone();
    let files = vec![text_file("a.txt"), text_file("b.txt")];
    let send = tokio::spawn(async move { client.send_message("", None, files).await });
    advance(10).await;

    let visible = h.client.visible_messages();
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|m| m.is_optimistic()));
    assert!(visible
        .iter()
        .all(|m| m.attachment.as_ref().is_some_and(|a| a.local_preview)));

    gate.add_permits(2);
    let report = send.await.unwrap().unwrap();
    assert_eq!(report.confirmed.len(), 2);
    assert!(h
        .client
        .visible_messages()
        .iter()
        .all(|m| m.attachment.as_ref().is_some_and(|a| !a.local_preview)));
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_message_rejected_without_state_change() {
    let (mut h, _) = selected(2).await;
    h.take_events();
    let before = h.client.visible_messages();

    let err = h
        .client
        .send_message("   ", None, Vec::new())
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(h.client.visible_messages(), before);
    assert!(h.backend.calls().sent.is_empty());

    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].code, "EMPTY_MESSAGE");
    assert_eq!(notices[0].level, NoticeLevel::Inline);
}

#[tokio::test(start_paused = true)]
async fn test_too_many_attachments_rejected() {
    let (h, _) = selected(1).await;
    let files = (0..6).map(|i| text_file(&format!("f{i}.txt"))).collect();

    let err = h.client.send_message("", None, files).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Domain(DomainError::TooManyAttachments { .. })
    ));
    assert!(h.uploader.uploaded().is_empty());
    assert_eq!(h.client.visible_messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_send_requires_active_conversation() {
    let h = Harness::new();
    h.seed_channel("general", 1);
    h.sign_in().await;

    let err = h
        .client
        .send_message("hello", None, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Domain(DomainError::NoActiveConversation)
    ));
}

// ============================================================================
// Thread replies
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_own_thread_reply_shown_once() {
    let (h, _) = selected(2).await;
    let parent = h.client.visible_messages()[1].clone();
    let earlier = reply(&parent, &h.peer, "first!", 100);
    h.backend.set_replies(parent.id, vec![earlier.clone()]);

    h.client.open_thread(parent.id).await.unwrap();
    let thread = h.client.thread().unwrap();
    assert_eq!(thread.replies.len(), 1);
    assert!(!thread.loading);

    let report = h
        .client
        .send_message("me too", Some(parent.id), Vec::new())
        .await
        .unwrap();
    let confirmed_id = report.confirmed[0];

    // Top-level list untouched, reply confirmed in the thread
    assert_eq!(h.client.visible_messages().len(), 2);
    let thread = h.client.thread().unwrap();
    assert_eq!(thread.replies.len(), 2);
    assert_eq!(thread.replies[1].id, confirmed_id);

    // The feed echo of our own reply only bumps the count
    let echo = thread.replies[1].clone();
    h.client.handle_realtime(&message_row(&echo));

    let thread = h.client.thread().unwrap();
    assert_eq!(thread.replies.len(), 2);
    assert_eq!(thread.parent.thread_reply_count, parent.thread_reply_count + 1);
    let visible_parent = h
        .client
        .visible_messages()
        .into_iter()
        .find(|m| m.id == parent.id)
        .unwrap();
    assert_eq!(visible_parent.thread_reply_count, parent.thread_reply_count + 1);
}
