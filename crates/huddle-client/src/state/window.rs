//! Message window operations
//!
//! A window is a conversation's loaded messages, ordered by `created_at`
//! (non-decreasing) with unique ids. Every helper here keeps both properties
//! except `prepend_page`, whose caller guarantees the page is older than the
//! window.

use std::collections::HashSet;

use huddle_core::{Message, MessageId, UserId};

/// Check if a message with `id` is present
pub fn contains(messages: &[Message], id: MessageId) -> bool {
    messages.iter().any(|m| m.id == id)
}

/// Position of the message with `id`
pub fn position(messages: &[Message], id: MessageId) -> Option<usize> {
    messages.iter().position(|m| m.id == id)
}

/// Insert at the sorted position unless the id is already present
///
/// Ties on `created_at` go after existing messages, so a message newer than
/// everything loaded is appended.
pub fn insert_sorted(messages: &mut Vec<Message>, message: Message) -> bool {
    if contains(messages, message.id) {
        return false;
    }
    let at = messages.partition_point(|m| m.created_at <= message.created_at);
    messages.insert(at, message);
    true
}

/// Replace the placeholder `temp_id` in place with its confirmed message
///
/// Without a placeholder the confirmed message is inserted instead, unless
/// its id is already present. A server timestamp that no longer fits the
/// placeholder's slot moves the message to its sorted position. Returns
/// `false` when nothing changed.
pub fn confirm(messages: &mut Vec<Message>, temp_id: MessageId, confirmed: Message) -> bool {
    let Some(at) = position(messages, temp_id) else {
        return insert_sorted(messages, confirmed);
    };
    if contains(messages, confirmed.id) {
        // Confirmed copy already present; drop the placeholder only
        messages.remove(at);
        return true;
    }

    let created_at = confirmed.created_at;
    let fits = messages[..at].last().map_or(true, |m| m.created_at <= created_at)
        && messages.get(at + 1).map_or(true, |m| created_at <= m.created_at);
    if fits {
        messages[at] = confirmed;
    } else {
        messages.remove(at);
        insert_sorted(messages, confirmed);
    }
    true
}

/// Remove the message with `id`
pub fn remove(messages: &mut Vec<Message>, id: MessageId) -> Option<Message> {
    position(messages, id).map(|at| messages.remove(at))
}

/// Prepend an older page, skipping ids already present
///
/// The page must be ordered and strictly older than the window's oldest
/// message; no re-sort happens here. Returns the number of messages added.
pub fn prepend_page(messages: &mut Vec<Message>, page: Vec<Message>) -> usize {
    let fresh: Vec<Message> = page
        .into_iter()
        .filter(|m| !contains(messages, m.id))
        .collect();
    let added = fresh.len();
    messages.splice(0..0, fresh);
    added
}

/// Merge an arbitrary window, dedup by id, then stable sort by creation time
///
/// Existing copies win over incoming duplicates. Returns the number of
/// messages added.
pub fn merge_window(messages: &mut Vec<Message>, incoming: Vec<Message>) -> usize {
    let mut added = 0;
    for message in incoming {
        if !contains(messages, message.id) {
            messages.push(message);
            added += 1;
        }
    }
    messages.sort_by_key(|m| m.created_at);
    added
}

/// Oldest message carrying a server id (the pagination anchor)
pub fn oldest_server_id(messages: &[Message]) -> Option<MessageId> {
    messages.iter().map(|m| m.id).find(|id| !id.is_temp())
}

/// Record that `reader` has read `message_id`; returns `true` if it changed
pub fn mark_read(messages: &mut [Message], message_id: MessageId, reader: UserId) -> bool {
    messages
        .iter_mut()
        .find(|m| m.id == message_id)
        .is_some_and(|m| m.mark_read_by(reader))
}

/// Bump a thread parent's reply count; returns `true` if the parent is loaded
pub fn bump_reply_count(messages: &mut [Message], parent_id: MessageId) -> bool {
    match messages.iter_mut().find(|m| m.id == parent_id) {
        Some(parent) => {
            parent.thread_reply_count += 1;
            true
        }
        None => false,
    }
}

/// Check the ordering and uniqueness invariants
pub fn is_consistent(messages: &[Message]) -> bool {
    let sorted = messages
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at);
    let unique: HashSet<MessageId> = messages.iter().map(|m| m.id).collect();
    sorted && unique.len() == messages.len()
}
