//! Reduction of a user's raw reaction toggles into net events.

use std::collections::BTreeMap;

use tokio::time::Instant;

use crate::error::processor::ProcessorError;
use crate::processor::event::{Event, EventKind, Subject};

/// Running toggle count and latest contributing instant for one subject.
struct Tally {
    net: i64,
    latest: Instant,
}

/// Collapses a user's pending events into at most one event per subject.
///
/// Reaction toggles targeting the same subject are summed: adds count `+1`,
/// removes count `-1`. A net of zero produces no event, `+1` produces a single
/// `ReactionAdded` and `-1` a single `ReactionRemoved`, stamped with the most
/// recent `occurred_at` among the contributing events so the quiescence window
/// restarts after every edit. Events whose kind is not a reaction toggle are
/// passed through unchanged and come first in the output.
///
/// The gateway delivers add/remove as strict per-user toggles, so any other net
/// count means the queue was corrupted upstream and the pass is aborted.
///
/// # Arguments
/// - `events` - Pending events of a single user, in any order
///
/// # Returns
/// - `Ok(Vec<Event>)` - Coalesced events, subjects in ascending order
/// - `Err(ProcessorError::InvalidNetCount)` - Net count outside `{-1, 0, 1}`
pub fn coalesce(events: Vec<Event>) -> Result<Vec<Event>, ProcessorError> {
    let mut coalesced = Vec::new();
    let mut tallies: BTreeMap<Subject, Tally> = BTreeMap::new();

    for event in events {
        let Some(delta) = event.kind.toggle() else {
            coalesced.push(event);
            continue;
        };

        tallies
            .entry(event.subject)
            .and_modify(|tally| {
                tally.net += delta;
                tally.latest = tally.latest.max(event.occurred_at);
            })
            .or_insert(Tally {
                net: delta,
                latest: event.occurred_at,
            });
    }

    for (subject, tally) in tallies {
        let kind = match tally.net {
            0 => continue,
            1 => EventKind::ReactionAdded,
            -1 => EventKind::ReactionRemoved,
            net => return Err(ProcessorError::InvalidNetCount { subject, net }),
        };

        coalesced.push(Event::new(kind, subject, tally.latest));
    }

    Ok(coalesced)
}
