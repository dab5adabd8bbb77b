//! Auto-logout timer
//!
//! After every punch the kiosk shows a confirmation for a short window and
//! then returns to the login view. The timer models that window: each `arm`
//! replaces whatever was pending, so only the most recent arm ever fires.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Arm ids are unique across every timer in the process, so a firing can
/// never be mistaken for one from another device session.
static NEXT_ARM_ID: AtomicU64 = AtomicU64::new(1);

/// Delivered when an armed timer elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogoutDue {
    pub arm_id: u64,
}

struct PendingArm {
    arm_id: u64,
    handle: JoinHandle<()>,
}

/// Cancelable, re-armable delayed logout.
///
/// Must be armed from within a tokio runtime.
pub struct AutoLogoutTimer {
    delay: Duration,
    tx: mpsc::UnboundedSender<LogoutDue>,
    pending: Option<PendingArm>,
}

impl AutoLogoutTimer {
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<LogoutDue>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
        }
    }

    /// Schedule a logout after the delay, cancelling any pending one.
    /// Returns the id the firing will carry.
    pub fn arm(&mut self) -> u64 {
        self.cancel();

        let arm_id = NEXT_ARM_ID.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the kiosk is shutting down
            let _ = tx.send(LogoutDue { arm_id });
        });

        trace!(arm_id, delay_ms = delay.as_millis() as u64, "Auto-logout armed");
        self.pending = Some(PendingArm { arm_id, handle });
        arm_id
    }

    /// Drop the pending arm, if any
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            trace!(arm_id = pending.arm_id, "Auto-logout cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a firing. Returns false for firings of superseded or cancelled
    /// arms, which must be ignored.
    pub fn acknowledge(&mut self, due: LogoutDue) -> bool {
        match &self.pending {
            Some(pending) if pending.arm_id == due.arm_id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for AutoLogoutTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
