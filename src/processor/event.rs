//! Event data model for the reaction processor.
//!
//! An [`Event`] is a single raw notification as delivered by the gateway (a
//! reaction was added or removed) or the coalesced net outcome of several of
//! them. Events are ordered purely by their `occurred_at` instant, which is
//! taken from the tokio clock so that paused-time tests control it.

use std::fmt;

use tokio::time::Instant;

/// Kind of user-visible trigger carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// User added a reaction to the subject.
    ReactionAdded,
    /// User removed a previously added reaction from the subject.
    ReactionRemoved,
}

impl EventKind {
    /// Signed contribution of this kind to a reaction toggle count.
    ///
    /// # Returns
    /// - `Some(1)` / `Some(-1)` for reaction add / remove
    /// - `None` for kinds that are not reaction toggles and must be passed
    ///   through coalescing untouched
    pub fn toggle(self) -> Option<i64> {
        match self {
            Self::ReactionAdded => Some(1),
            Self::ReactionRemoved => Some(-1),
        }
    }
}

/// Message a reaction was placed on.
///
/// Message ids are globally unique snowflakes, the channel id is carried along
/// only so that collaborators can address the message through the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageReference {
    pub channel_id: u64,
    pub message_id: u64,
}

impl MessageReference {
    pub fn new(channel_id: u64, message_id: u64) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

/// Entity a reaction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Message(MessageReference),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => write!(
                f,
                "message {} in channel {}",
                message.message_id, message.channel_id
            ),
        }
    }
}

/// A single pending event in a user's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub subject: Subject,
    pub occurred_at: Instant,
}

impl Event {
    pub fn new(kind: EventKind, subject: Subject, occurred_at: Instant) -> Self {
        Self {
            kind,
            subject,
            occurred_at,
        }
    }
}
