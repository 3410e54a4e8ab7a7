use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serenity::async_trait;
use tokio::time::{sleep, Instant};

use crate::error::{processor::ProcessorError, AppError};
use crate::processor::coalesce::coalesce;
use crate::processor::event::{Event, EventKind, MessageReference, Subject};
use crate::processor::{EventActions, EventProcessor, ProcessorConfig};

mod coalesce;

/// A callback invocation observed by [`RecordingActions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Added(u64, Subject),
    Removed(u64, Subject),
}

/// Records every callback invocation together with the instant it happened.
#[derive(Default)]
struct RecordingActions {
    calls: Mutex<Vec<(Call, Instant)>>,
    failing_users: Vec<u64>,
}

impl RecordingActions {
    fn failing_for(users: &[u64]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_users: users.to_vec(),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(call, _)| *call).collect()
    }

    fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call, user_id: u64) -> Result<(), AppError> {
        self.calls.lock().push((call, Instant::now()));

        if self.failing_users.contains(&user_id) {
            return Err(AppError::NotFound(format!("member {user_id}")));
        }

        Ok(())
    }
}

#[async_trait]
impl EventActions for RecordingActions {
    async fn on_reaction_added(&self, user_id: u64, subject: Subject) -> Result<(), AppError> {
        self.record(Call::Added(user_id, subject), user_id)
    }

    async fn on_reaction_removed(&self, user_id: u64, subject: Subject) -> Result<(), AppError> {
        self.record(Call::Removed(user_id, subject), user_id)
    }
}

fn message(message_id: u64) -> Subject {
    Subject::Message(MessageReference::new(1000, message_id))
}

fn start(actions: &Arc<RecordingActions>) -> EventProcessor {
    EventProcessor::start(ProcessorConfig::default(), actions.clone())
}
