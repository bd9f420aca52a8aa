//! Bounded buffer for outgoing messages while a channel is reconnecting.

use std::collections::VecDeque;
use tracing::warn;

use super::messages::OutboundMessage;

/// FIFO of messages waiting to be replayed after a reconnect.
///
/// When full, the oldest message is dropped to make room.
#[derive(Debug)]
pub(crate) struct Outbox {
    queue: VecDeque<OutboundMessage>,
    capacity: usize,
    dropped: u64,
}

impl Outbox {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            dropped: 0,
        }
    }

    /// Append a message. Returns false when the message was not buffered.
    pub(crate) fn push(&mut self, message: OutboundMessage) -> bool {
        if !message.is_replayable() || self.capacity == 0 {
            return false;
        }

        if self.queue.len() >= self.capacity
            && let Some(oldest) = self.queue.pop_front()
        {
            self.dropped += 1;
            warn!(
                "Outbox full ({} messages), dropping oldest {} message",
                self.capacity,
                oldest.kind()
            );
        }

        self.queue.push_back(message);
        true
    }

    /// Put back a message that failed to send. It is older than anything queued.
    pub(crate) fn requeue(&mut self, message: OutboundMessage) -> bool {
        if !message.is_replayable() || self.capacity == 0 {
            return false;
        }

        if self.queue.len() >= self.capacity {
            self.dropped += 1;
            warn!(
                "Outbox full ({} messages), dropping failed {} message",
                self.capacity,
                message.kind()
            );
            return false;
        }

        self.queue.push_front(message);
        true
    }

    pub(crate) fn pop_front(&mut self) -> Option<OutboundMessage> {
        self.queue.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}
