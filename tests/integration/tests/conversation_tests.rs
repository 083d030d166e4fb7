//! Conversation list, selection and hydration tests
//!
//! Run with: cargo test -p integration-tests --test conversation_tests

use huddle_client::ClientEvent;
use huddle_core::events::{PinRow, ReactionRow};
use huddle_core::ReactionSummary;
use integration_tests::{at, message, Harness};

#[tokio::test(start_paused = true)]
async fn test_refresh_serves_cache_unless_forced() {
    let h = Harness::new();
    h.seed_channel("general", 1);
    h.sign_in().await;
    assert_eq!(h.backend.calls().list_conversations, 1);
    assert_eq!(h.client.conversations().len(), 1);

    h.client.refresh(false).await.unwrap();
    assert_eq!(h.backend.calls().list_conversations, 1);

    h.seed_channel("random", 1);
    h.client.refresh(true).await.unwrap();
    assert_eq!(h.backend.calls().list_conversations, 2);
    assert_eq!(h.client.conversations().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_forced_refresh_reloads_active_conversation() {
    let h = Harness::new();
    let (general, mut history) = h.seed_channel("general", 3);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();

    history.push(message(general, &h.peer, "missed while away", 10_000));
    h.backend.set_history(general, history);

    h.client.refresh(true).await.unwrap();
    assert_eq!(h.client.visible_messages().len(), 4);
    assert_eq!(h.cached(general).unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_selection_emits_changes_and_closes_thread() {
    let mut h = Harness::new();
    let (general, history) = h.seed_channel("general", 2);
    let (random, _) = h.seed_channel("random", 2);
    h.sign_in().await;
    h.client.select_conversation(general).await.unwrap();
    h.client.open_thread(history[0].id).await.unwrap();
    h.take_events();

    h.client.select_conversation(random).await.unwrap();

    assert!(h.client.thread().is_none());
    let events = h.take_events();
    assert!(events.contains(&ClientEvent::MessagesChanged {
        conversation_id: random
    }));
    assert!(events.contains(&ClientEvent::ThreadChanged { parent_id: None }));
}

#[tokio::test(start_paused = true)]
async fn test_reactions_and_pins_hydrated_on_select() {
    let h = Harness::new();
    let (general, history) = h.seed_channel("general", 3);
    let liked = history[0].id.server_id().unwrap();
    let pinned = history[2].id.server_id().unwrap();
    h.backend.set_reactions(
        general,
        vec![
            ReactionRow {
                message_id: liked,
                user_id: h.me.id.into_inner(),
                reaction_type: "thumbs_up".to_string(),
            },
            ReactionRow {
                message_id: liked,
                user_id: h.peer.id.into_inner(),
                reaction_type: "thumbs_up".to_string(),
            },
            ReactionRow {
                message_id: liked,
                user_id: h.peer.id.into_inner(),
                reaction_type: "eyes".to_string(),
            },
        ],
    );
    h.backend.set_pins(
        general,
        vec![PinRow {
            message_id: pinned,
            pinned_by: h.peer.id.into_inner(),
            pinned_at: at(500),
        }],
    );
    h.sign_in().await;

    h.client.select_conversation(general).await.unwrap();

    let visible = h.client.visible_messages();
    assert_eq!(
        visible[0].reactions.get("thumbs_up"),
        Some(&ReactionSummary {
            count: 2,
            reacted_by_me: true
        })
    );
    assert_eq!(
        visible[0].reactions.get("eyes"),
        Some(&ReactionSummary {
            count: 1,
            reacted_by_me: false
        })
    );
    assert!(visible[1].reactions.is_empty());
    assert_eq!(visible[2].pin.as_ref().unwrap().pinned_by, h.peer.id);
    assert!(visible[0].pin.is_none());

    // Cached copies carry the same annotations
    assert_eq!(h.cached(general).unwrap(), visible);
}

#[tokio::test(start_paused = true)]
async fn test_hydration_failure_is_soft() {
    let mut h = Harness::new();
    let (general, _) = h.seed_channel("general", 3);
    h.sign_in().await;
    h.take_events();
    h.backend.fail_reactions(true);

    h.client.select_conversation(general).await.unwrap();

    assert_eq!(h.client.visible_messages().len(), 3);
    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].code, "BACKEND_ERROR");
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_failure_leaves_state_unchanged() {
    let mut h = Harness::new();
    let (general, _) = h.seed_channel("general", 3);
    h.sign_in().await;
    h.take_events();
    h.backend.fail_list_messages(true);

    assert!(h.client.select_conversation(general).await.is_err());
    assert!(h.client.visible_messages().is_empty());
    assert!(h.cached(general).is_none());
    assert_eq!(h.take_notices().len(), 1);
}
