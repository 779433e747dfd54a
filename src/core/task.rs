//! Debounced, cancellable tasks.
//!
//! Every scheduled task gets a generation number. Scheduling again (or cancelling)
//! moves the generation forward, which invalidates older handles. A stale task never
//! starts if it is still waiting out its delay; if it was already running it completes,
//! but its result is discarded.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    generation: Arc<AtomicU64>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether no newer task has been scheduled and this one was not cancelled.
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.id
    }

    /// Invalidates this task. Has no effect once a newer task exists.
    pub fn cancel(&self) {
        let _ = self.generation.compare_exchange(
            self.id,
            self.id + 1,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Supersedes whatever is pending and returns the handle of the new task.
    pub fn schedule(&self) -> TaskHandle {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        TaskHandle {
            id,
            generation: Arc::clone(&self.generation),
        }
    }

    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Waits out the delay, then runs `task` if nothing newer was scheduled meanwhile.
    ///
    /// Returns `None` when the task was superseded, either before it started or
    /// while it was running.
    pub async fn run<F, Fut, T>(&self, task: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let handle = self.schedule();
        self.run_with(&handle, task).await
    }

    pub async fn run_with<F, Fut, T>(&self, handle: &TaskHandle, task: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        tokio::time::sleep(self.delay).await;
        if !handle.is_current() {
            debug!(task = handle.id, "Debounced task superseded before start");
            return None;
        }

        let output = task().await;
        if !handle.is_current() {
            debug!(task = handle.id, "Debounced task superseded, discarding result");
            return None;
        }
        Some(output)
    }
}
