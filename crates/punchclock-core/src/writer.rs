//! Background writer for attendance records
//!
//! The state machine never waits for the durable sink. It hands each record
//! to the writer task, which appends records in submission order and retries
//! failed appends with exponential backoff. A record that still cannot be
//! written after the last attempt is reported as
//! [`CoreEvent::PunchNotRecorded`].

use punchclock_api::AttendanceEvent;
use punchclock_config::WriteRetryPolicy;
use punchclock_store::EventSink;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::{AttendanceError, AttendanceResult, CoreEvent};

enum WriterCommand {
    Append(AttendanceEvent),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Cheap to clone; the task exits once every
/// handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct EventWriter {
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl EventWriter {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn(
        sink: Arc<dyn EventSink>,
        policy: WriteRetryPolicy,
        notify: mpsc::UnboundedSender<CoreEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(sink, policy, rx, notify));
        Self { tx }
    }

    /// Queue a record for appending. Fails only if the writer task is gone.
    pub fn submit(&self, event: AttendanceEvent) -> AttendanceResult<()> {
        self.tx
            .send(WriterCommand::Append(event))
            .map_err(|_| AttendanceError::WriteFailure("event writer is not running".into()))
    }

    /// Wait until every record submitted so far has been appended or given up on
    pub async fn flush(&self) -> AttendanceResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(WriterCommand::Flush(done_tx))
            .map_err(|_| AttendanceError::WriteFailure("event writer is not running".into()))?;
        done_rx
            .await
            .map_err(|_| AttendanceError::WriteFailure("event writer stopped".into()))
    }

    /// A handle whose task has already exited
    #[cfg(test)]
    pub(crate) fn stopped() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }
}

async fn run(
    sink: Arc<dyn EventSink>,
    policy: WriteRetryPolicy,
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
    notify: mpsc::UnboundedSender<CoreEvent>,
) {
    debug!("Event writer started");

    while let Some(command) = rx.recv().await {
        match command {
            WriterCommand::Append(event) => append_with_retry(&*sink, &policy, &event, &notify).await,
            WriterCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Event writer stopped");
}

async fn append_with_retry(
    sink: &dyn EventSink,
    policy: &WriteRetryPolicy,
    event: &AttendanceEvent,
    notify: &mpsc::UnboundedSender<CoreEvent>,
) {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match sink.append(event) {
            Ok(record_id) => {
                debug!(
                    record_id,
                    employee = %event.employee_name,
                    status = %event.event_type,
                    attempt,
                    "Attendance record written"
                );
                return;
            }
            Err(e) if attempt < max_attempts => {
                let backoff = policy.backoff_for(attempt);
                warn!(
                    employee = %event.employee_name,
                    status = %event.event_type,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Failed to write attendance record, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    employee = %event.employee_name,
                    status = %event.event_type,
                    attempts = attempt,
                    error = %e,
                    "Giving up on attendance record"
                );
                let _ = notify.send(CoreEvent::PunchNotRecorded {
                    employee_name: event.employee_name.clone(),
                    event_type: event.event_type,
                    attempts: attempt,
                    error: e.to_string(),
                });
                return;
            }
        }
    }
}
