//! Debounced per-user reaction event processor.
//!
//! Gateway reaction notifications arrive in bursts: members misclick, toggle a
//! reaction back and forth, or react to several messages in a row. Executing a
//! role update for every raw notification would burn through Discord rate
//! limits and spam the report channel, so the processor queues events per user,
//! coalesces each queue into its net effect and only executes an event once it
//! has been left untouched for the quiescence threshold.
//!
//! # Control flow
//!
//! - [`EventProcessor::submit`] appends an event to the user's queue and wakes
//!   the drain loop. It never blocks on the loop itself.
//! - The drain loop is a single tokio task. Each wake-up runs one drain pass:
//!   coalesce every queue, sort by time, execute the events older than the
//!   threshold through [`EventActions`] and keep the rest.
//! - While events are still pending the loop rearms a single delayed wake-up.
//!   A fresh submission supersedes (cancels) the armed wake-up.
//! - Once every queue is empty the processor is idle and
//!   [`EventProcessor::wait_for_idle`] callers are released.

pub mod coalesce;
pub mod event;

#[cfg(test)]
mod test;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serenity::async_trait;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::error::{processor::ProcessorError, AppError};
use crate::processor::coalesce::coalesce;
use crate::processor::event::{Event, EventKind, Subject};

/// Default minimum age of an event before it is executed.
pub const DEFAULT_QUIESCENCE_THRESHOLD: Duration = Duration::from_millis(1000);

/// Default delay before the drain loop checks on still-pending events.
pub const DEFAULT_REWAKE_DELAY: Duration = Duration::from_millis(500);

/// Timing tunables of the processor. Neither affects coalescing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Minimum time an event must sit unchanged before it is executed.
    pub quiescence_threshold: Duration,
    /// Delay of the self-armed wake-up while events are still pending.
    pub rewake_delay: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            quiescence_threshold: DEFAULT_QUIESCENCE_THRESHOLD,
            rewake_delay: DEFAULT_REWAKE_DELAY,
        }
    }
}

/// Callbacks executed for net events once they pass the quiescence threshold.
///
/// Callbacks run sequentially on the drain loop task. An error returned from a
/// callback is logged and does not affect any other queued event.
#[async_trait]
pub trait EventActions: Send + Sync {
    /// Called when a user's net reaction on `subject` is an addition.
    async fn on_reaction_added(&self, user_id: u64, subject: Subject) -> Result<(), AppError>;

    /// Called when a user's net reaction on `subject` is a removal.
    async fn on_reaction_removed(&self, user_id: u64, subject: Subject) -> Result<(), AppError>;
}

/// Per-user pending queues. Empty queues are never stored.
type Queues = BTreeMap<u64, Vec<Event>>;

/// Lifecycle of the processor as observed by idle waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    /// At least one event is queued or executing.
    Busy,
    /// Every queue is empty.
    Idle,
    /// The drain loop was stopped.
    Stopped,
}

/// State shared between the submitting side and the drain loop.
struct Shared {
    queues: Mutex<Queues>,
    /// Wake signal of the drain loop. `notify_one` keeps a permit when the loop
    /// is busy so a submission during a drain pass is never lost.
    wake: Notify,
    /// Only changed while holding `queues`.
    activity: watch::Sender<Activity>,
}

impl Shared {
    /// Moves from `from` to `to`, leaving any other state untouched.
    fn transition(&self, from: Activity, to: Activity) {
        self.activity.send_if_modified(|activity| {
            if *activity == from {
                *activity = to;
                true
            } else {
                false
            }
        });
    }
}

/// Handle to the running processor.
///
/// Dropping the handle stops the drain loop; events still pending at that
/// point are discarded.
pub struct EventProcessor {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl EventProcessor {
    /// Spawns the drain loop on the current tokio runtime.
    ///
    /// # Arguments
    /// - `config` - Quiescence threshold and rewake delay
    /// - `actions` - Callbacks invoked for executed net events
    ///
    /// # Returns
    /// - `EventProcessor` - Handle used to submit events and wait for idle
    pub fn start(config: ProcessorConfig, actions: Arc<dyn EventActions>) -> Self {
        let (activity, _) = watch::channel(Activity::Idle);
        let shared = Arc::new(Shared {
            queues: Mutex::new(BTreeMap::new()),
            wake: Notify::new(),
            activity,
        });

        let drainer = Drainer {
            shared: shared.clone(),
            actions,
            config,
        };
        let task = tokio::spawn(drainer.run());

        tracing::debug!(
            "Event processor started (threshold {:?}, rewake delay {:?})",
            config.quiescence_threshold,
            config.rewake_delay
        );

        Self { shared, task }
    }

    /// Records a raw event for `user_id`, stamped with the current instant.
    ///
    /// Any user id is accepted. Returns as soon as the event is queued.
    pub fn submit(&self, kind: EventKind, user_id: u64, subject: Subject) {
        self.submit_event(user_id, Event::new(kind, subject, Instant::now()));
    }

    /// Queues an already constructed event and wakes the drain loop.
    pub(crate) fn submit_event(&self, user_id: u64, event: Event) {
        {
            let mut queues = self.shared.queues.lock();
            queues.entry(user_id).or_default().push(event);
            self.shared.transition(Activity::Idle, Activity::Busy);
        }

        tracing::trace!("Queued {:?} for user {} on {}", event.kind, user_id, event.subject);

        self.shared.wake.notify_one();
    }

    /// Waits until every queued event has been executed or cancelled out.
    ///
    /// Returns immediately when nothing is pending. Any number of callers may
    /// wait concurrently; all of them are released together.
    ///
    /// # Returns
    /// - `Ok(())` - All queues are empty
    /// - `Err(ProcessorError::Stopped)` - The drain loop was stopped first
    pub async fn wait_for_idle(&self) -> Result<(), ProcessorError> {
        let mut activity = self.shared.activity.subscribe();

        let activity = *activity
            .wait_for(|activity| *activity != Activity::Busy)
            .await
            .map_err(|_| ProcessorError::Stopped)?;

        match activity {
            Activity::Stopped => Err(ProcessorError::Stopped),
            _ => Ok(()),
        }
    }

    /// Number of users that currently have pending events.
    pub fn pending_users(&self) -> usize {
        self.shared.queues.lock().len()
    }

    /// Stops the drain loop. Pending events are discarded.
    pub fn shutdown(&self) {
        let pending = self.pending_users();
        if pending > 0 {
            tracing::warn!(
                "Stopping event processor with {} users still having pending events",
                pending
            );
        }

        self.stop();
    }

    fn stop(&self) {
        self.task.abort();
        self.shared.activity.send_replace(Activity::Stopped);
    }
}

impl Drop for EventProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The drain loop: owns the callbacks and the rearm deadline.
struct Drainer {
    shared: Arc<Shared>,
    actions: Arc<dyn EventActions>,
    config: ProcessorConfig,
}

impl Drainer {
    async fn run(self) {
        let mut rearm: Option<Instant> = None;

        loop {
            match rearm.take() {
                Some(deadline) => {
                    tokio::select! {
                        _ = self.shared.wake.notified() => {
                            tracing::trace!("Rearmed wake-up superseded by new events");
                        }
                        _ = time::sleep_until(deadline) => {
                            tracing::debug!("Rearmed wake-up fired");
                        }
                    }
                }
                None => self.shared.wake.notified().await,
            }

            tracing::debug!("Event processor waking up");

            let pending = self.drain().await;
            if pending > 0 {
                tracing::debug!(
                    "{} users left with unprocessed events, checking on them in {:?}",
                    pending,
                    self.config.rewake_delay
                );
                rearm = Some(Instant::now() + self.config.rewake_delay);
            } else {
                tracing::debug!("No events left, hibernating");
            }
        }
    }

    /// Runs one drain pass and returns the number of users still pending.
    async fn drain(&self) -> usize {
        let due = {
            let mut queues = self.shared.queues.lock();
            coalesce_queues(&mut queues);
            take_due(&mut queues, Instant::now(), self.config.quiescence_threshold)
        };

        for (user_id, event) in due {
            self.execute(user_id, event).await;
        }

        // Submissions made while the callbacks ran are still queued here and
        // their wake permit makes the loop come around immediately.
        let queues = self.shared.queues.lock();
        if queues.is_empty() {
            self.shared.transition(Activity::Busy, Activity::Idle);
        }

        queues.len()
    }

    async fn execute(&self, user_id: u64, event: Event) {
        tracing::debug!(
            "Executing {:?} for user {} on {}",
            event.kind,
            user_id,
            event.subject
        );

        let result = match event.kind {
            EventKind::ReactionAdded => {
                self.actions.on_reaction_added(user_id, event.subject).await
            }
            EventKind::ReactionRemoved => {
                self.actions.on_reaction_removed(user_id, event.subject).await
            }
        };

        if let Err(e) = result {
            tracing::error!(
                "Failed to execute {:?} for user {} on {}: {}",
                event.kind,
                user_id,
                event.subject,
                e
            );
        }
    }
}

/// Replaces every queue with its coalesced form and prunes empty queues.
///
/// A queue that violates the toggle invariant is dropped as a whole; the other
/// users' queues are unaffected.
fn coalesce_queues(queues: &mut Queues) {
    for (user_id, events) in queues.iter_mut() {
        match coalesce(std::mem::take(events)) {
            Ok(coalesced) => *events = coalesced,
            Err(e) => {
                tracing::error!("Dropping pending events of user {}: {}", user_id, e);
            }
        }
    }

    queues.retain(|_, events| !events.is_empty());
}

/// Removes and returns the events that are at least `threshold` old.
///
/// Each queue is sorted by `occurred_at` (stable) first, so due events come out
/// per user in chronological order and users in ascending id order.
fn take_due(queues: &mut Queues, now: Instant, threshold: Duration) -> Vec<(u64, Event)> {
    let mut due = Vec::new();

    for (&user_id, events) in queues.iter_mut() {
        events.sort_by_key(|event| event.occurred_at);

        let (ready, pending): (Vec<Event>, Vec<Event>) = events
            .drain(..)
            .partition(|event| now.saturating_duration_since(event.occurred_at) >= threshold);

        *events = pending;
        due.extend(ready.into_iter().map(|event| (user_id, event)));
    }

    queues.retain(|_, events| !events.is_empty());

    due
}
