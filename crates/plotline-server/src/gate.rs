//! Auto-resetting rendezvous gates.
//!
//! A [`Gate`] is a one-shot signal with bounded await: one side signals,
//! the other awaits with a timeout, and the gate resets itself on the way
//! out of every await whether it succeeded or timed out. A stale signal
//! can therefore never satisfy a future wait, which is what keeps the
//! strictly one-outstanding-at-a-time protocol exchanges honest.
//!
//! Gates are not owned by any single task; any context may signal or
//! await. The session uses three per service: client attached, render
//! acknowledged, and image received.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// A single-writer, auto-resetting rendezvous primitive.
#[derive(Debug, Default)]
pub struct Gate {
    signaled: AtomicBool,
    notify: Notify,
}

impl Gate {
    /// Create an unsignaled gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the gate. Idempotent: signaling twice before an await still
    /// satisfies only one await.
    pub fn signal(&self) {
        self.signaled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Await the signal for at most `timeout`.
    ///
    /// Returns `true` if the gate was signaled before the deadline and
    /// `false` on timeout. In both cases the gate is reset before control
    /// returns, so a signal is consumed exactly once and a late signal
    /// only satisfies the next await.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking the flag, so a signal
            // arriving between the check and the sleep still wakes us.
            notified.as_mut().enable();

            if self.take() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                self.take();
                return false;
            }
        }
    }

    /// Consume the signal, resetting the gate.
    fn take(&self) -> bool {
        self.signaled.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn signaled_gate_satisfies_one_wait() {
        let gate = Gate::new();
        gate.signal();
        gate.signal();

        assert!(gate.wait(SHORT).await);
        // The double signal was consumed by the single successful wait.
        assert!(!gate.wait(SHORT).await);
    }

    #[tokio::test]
    async fn timeout_returns_false_and_resets() {
        let gate = Gate::new();
        assert!(!gate.wait(SHORT).await);

        // A signal after the timed-out wait satisfies the next wait only.
        gate.signal();
        assert!(gate.wait(SHORT).await);
        assert!(!gate.wait(SHORT).await);
    }

    #[tokio::test]
    async fn concurrent_signal_wakes_the_waiter() {
        let gate = Arc::new(Gate::new());
        let signaler = Arc::clone(&gate);
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signaler.signal();
        });

        assert!(gate.wait(Duration::from_secs(2)).await);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn waits_do_not_leak_across_each_other() {
        let gate = Arc::new(Gate::new());

        // First wait times out; its reset must not eat a later signal.
        assert!(!gate.wait(Duration::from_millis(10)).await);
        gate.signal();
        assert!(gate.wait(SHORT).await);
    }
}
