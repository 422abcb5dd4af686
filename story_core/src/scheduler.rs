//! Cancellable delayed tasks on a single-threaded virtual timeline.
//!
//! Tasks are plain data. The owner advances the timeline from its update
//! tick and acts on whatever comes due. A cancelled task never comes due.

use std::time::Duration;

/// Handle returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TimerHandle,
    due: Duration,
    task: T,
}

/// A queue of delayed tasks.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_handle: u64,
    queue: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            queue: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to come due after `delay`.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.queue.push(Scheduled {
            handle,
            due: self.now + delay,
            task,
        });
        handle
    }

    /// Cancel a pending task. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.handle != handle);
        self.queue.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.queue.iter().any(|s| s.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the timeline forward and return the tasks that came due,
    /// ordered by due time and then by scheduling order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now += elapsed;
        let now = self.now;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|s| s.due <= now);
        self.queue = pending;

        due.sort_by_key(|s| (s.due, s.handle.0));
        due.into_iter().map(|s| s.task).collect()
    }
}
