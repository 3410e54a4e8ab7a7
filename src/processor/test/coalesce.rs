use super::*;

fn event(kind: EventKind, message_id: u64, base: Instant, offset_ms: u64) -> Event {
    Event::new(kind, message(message_id), base + Duration::from_millis(offset_ms))
}

/// Tests that a reaction followed by its removal cancels out.
///
/// Expected: Ok with no events
#[test]
fn add_then_remove_cancels_out() {
    let base = Instant::now();
    let events = vec![
        event(EventKind::ReactionAdded, 1, base, 0),
        event(EventKind::ReactionRemoved, 1, base, 100),
    ];

    let result = coalesce(events).unwrap();

    assert!(result.is_empty());
}

/// Tests that repeated toggling collapses into the final intent.
///
/// Verifies that add, remove, add on the same message yields a single add
/// stamped with the latest contributing instant.
///
/// Expected: Ok with one ReactionAdded at the last offset
#[test]
fn repeated_toggles_collapse_to_final_intent() {
    let base = Instant::now();
    let events = vec![
        event(EventKind::ReactionAdded, 1, base, 0),
        event(EventKind::ReactionRemoved, 1, base, 200),
        event(EventKind::ReactionAdded, 1, base, 400),
    ];

    let result = coalesce(events).unwrap();

    assert_eq!(
        result,
        vec![event(EventKind::ReactionAdded, 1, base, 400)]
    );
}

/// Tests that a lone removal survives coalescing.
///
/// Expected: Ok with the removal unchanged
#[test]
fn lone_removal_is_kept() {
    let base = Instant::now();
    let removal = event(EventKind::ReactionRemoved, 7, base, 50);

    let result = coalesce(vec![removal]).unwrap();

    assert_eq!(result, vec![removal]);
}

/// Tests that the net event carries the maximum timestamp even when the raw
/// events were queued out of order.
///
/// Expected: Ok with ReactionRemoved stamped at the latest offset
#[test]
fn net_event_uses_latest_timestamp_for_out_of_order_input() {
    let base = Instant::now();
    let events = vec![
        event(EventKind::ReactionRemoved, 3, base, 900),
        event(EventKind::ReactionAdded, 3, base, 300),
        event(EventKind::ReactionRemoved, 3, base, 600),
    ];

    let result = coalesce(events).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].kind, EventKind::ReactionRemoved);
    assert_eq!(result[0].occurred_at, base + Duration::from_millis(900));
}

/// Tests that different messages are coalesced independently.
///
/// Expected: Ok with one event per message that has a non-zero net
#[test]
fn subjects_are_coalesced_independently() {
    let base = Instant::now();
    let events = vec![
        event(EventKind::ReactionAdded, 1, base, 0),
        event(EventKind::ReactionAdded, 2, base, 10),
        event(EventKind::ReactionRemoved, 1, base, 20),
        event(EventKind::ReactionRemoved, 3, base, 30),
    ];

    let result = coalesce(events).unwrap();

    assert_eq!(
        result,
        vec![
            event(EventKind::ReactionAdded, 2, base, 10),
            event(EventKind::ReactionRemoved, 3, base, 30),
        ]
    );
}

/// Tests that coalescing an already coalesced queue changes nothing.
///
/// Expected: Ok with identical output on the second pass
#[test]
fn coalescing_is_idempotent() {
    let base = Instant::now();
    let events = vec![
        event(EventKind::ReactionAdded, 5, base, 0),
        event(EventKind::ReactionRemoved, 4, base, 10),
        event(EventKind::ReactionRemoved, 5, base, 20),
        event(EventKind::ReactionAdded, 5, base, 30),
        event(EventKind::ReactionAdded, 6, base, 40),
    ];

    let once = coalesce(events).unwrap();
    let twice = coalesce(once.clone()).unwrap();

    assert_eq!(once, twice);
}

/// Tests that two additions without a removal in between are rejected.
///
/// The gateway never delivers a double add for one user, so this indicates a
/// corrupted queue.
///
/// Expected: Err(InvalidNetCount) with net 2
#[test]
fn double_add_is_an_invariant_violation() {
    let base = Instant::now();
    let events = vec![
        event(EventKind::ReactionAdded, 8, base, 0),
        event(EventKind::ReactionAdded, 8, base, 10),
    ];

    let result = coalesce(events);

    assert!(matches!(
        result,
        Err(ProcessorError::InvalidNetCount { net: 2, subject }) if subject == message(8)
    ));
}

/// Tests that two removals without an addition in between are rejected.
///
/// Expected: Err(InvalidNetCount) with net -2
#[test]
fn double_remove_is_an_invariant_violation() {
    let base = Instant::now();
    let events = vec![
        event(EventKind::ReactionRemoved, 8, base, 0),
        event(EventKind::ReactionRemoved, 8, base, 10),
    ];

    let result = coalesce(events);

    assert!(matches!(
        result,
        Err(ProcessorError::InvalidNetCount { net: -2, .. })
    ));
}

/// Tests that an empty queue coalesces to nothing.
///
/// Expected: Ok with no events
#[test]
fn empty_queue_stays_empty() {
    assert!(coalesce(Vec::new()).unwrap().is_empty());
}
