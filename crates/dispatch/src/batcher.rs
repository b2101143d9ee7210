//! Gateway-limit chunking of message lists.

use courier_common::types::PushMessage;

/// Partition `messages` into ordered chunks of at most `max` messages.
///
/// Concatenating the chunks in order reproduces the input exactly; every
/// chunk except possibly the last holds exactly `max` messages, and an empty
/// input produces zero chunks. No reordering, no copying beyond the moves.
pub fn chunk_messages(messages: Vec<PushMessage>, max: usize) -> Vec<Vec<PushMessage>> {
    debug_assert!(max >= 1);

    let mut chunks = Vec::with_capacity(messages.len().div_ceil(max));
    let mut current = Vec::with_capacity(max.min(messages.len()));

    for message in messages {
        current.push(message);
        if current.len() == max {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
