//! Cooperative task timeline.
//!
//! Execution is single-threaded and driven by the host's UI loop. Instead of
//! closures captured in timer callbacks, every piece of deferred work is a
//! [`Task`] value scheduled on the [`Timeline`] — due either on the next
//! animation-frame tick or after a clock delay. The host pumps the timeline
//! (`tick_frame` on every frame, `advance` as its clock moves) and the engine
//! dispatches whatever comes due.
//!
//! Keeping suspension points as data gives the two properties the engine
//! needs: teardown can cancel everything bound to a component, and tests can
//! drive time deterministically.

/// Deferred unit of work, dispatched by the engine when due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Push the camera's input buffer into committed state.
    CommitCamera,
    /// Re-run asset URL repair on one surface.
    RepairAssets { slot: usize },
    /// Re-run style injection on one surface.
    Reinject { slot: usize },
    /// Run the deferred style-extraction pass on one surface.
    Extract { slot: usize },
    /// Mirror the pending scroll of a comparison pair.
    SyncScroll { pair: usize },
    /// Retry resolving a comparison pair's scrollable contexts.
    AttachRetry { pair: usize, attempt: usize },
}

/// Cancellation handle returned by every `schedule_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    /// Next animation-frame tick.
    Frame,
    /// Clock time in ms.
    At(u64),
}

#[derive(Debug, Clone)]
struct Entry {
    handle: TaskHandle,
    due: Due,
    task: Task,
}

/// Pending deferred work, ordered by due time then scheduling order.
#[derive(Debug, Default)]
pub struct Timeline {
    entries: Vec<Entry>,
    next_handle: u64,
    now_ms: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The host clock as of the last `advance`.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedule for the next frame tick.
    pub fn schedule_frame(&mut self, task: Task) -> TaskHandle {
        self.push(Due::Frame, task)
    }

    /// Schedule for `delay_ms` from the current clock.
    pub fn schedule_after(&mut self, delay_ms: u64, task: Task) -> TaskHandle {
        self.push(Due::At(self.now_ms.saturating_add(delay_ms)), task)
    }

    fn push(&mut self, due: Due, task: Task) -> TaskHandle {
        self.next_handle += 1;
        let handle = TaskHandle(self.next_handle);
        self.entries.push(Entry { handle, due, task });
        handle
    }

    pub fn cancel(&mut self, handle: TaskHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    /// Cancel every pending task matching the predicate. Teardown and mode
    /// switches use this to drop work bound to dead surfaces.
    pub fn cancel_matching(&mut self, mut predicate: impl FnMut(&Task) -> bool) {
        self.entries.retain(|e| !predicate(&e.task));
    }

    /// Whether any pending task matches (used to coalesce frame work).
    pub fn has_pending(&self, mut predicate: impl FnMut(&Task) -> bool) -> bool {
        self.entries.iter().any(|e| predicate(&e.task))
    }

    pub fn is_idle(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain everything due on a frame tick, in scheduling order.
    pub fn take_frame_due(&mut self) -> Vec<Task> {
        let mut due = Vec::new();
        self.entries.retain(|e| {
            if e.due == Due::Frame {
                due.push(e.task.clone());
                false
            } else {
                true
            }
        });
        due
    }

    /// Advance the clock and drain everything now due, earliest first.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Task> {
        self.now_ms = self.now_ms.max(now_ms);
        let mut due: Vec<(u64, Task)> = Vec::new();
        let now = self.now_ms;
        self.entries.retain(|e| match e.due {
            Due::At(at) if at <= now => {
                due.push((at, e.task.clone()));
                false
            }
            _ => true,
        });
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, task)| task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_tasks_drain_in_order() {
        let mut timeline = Timeline::new();
        timeline.schedule_frame(Task::CommitCamera);
        timeline.schedule_frame(Task::Reinject { slot: 0 });
        timeline.schedule_after(10, Task::RepairAssets { slot: 0 });

        let due = timeline.take_frame_due();
        assert_eq!(due, vec![Task::CommitCamera, Task::Reinject { slot: 0 }]);
        assert!(!timeline.is_idle());
    }

    #[test]
    fn advance_releases_by_due_time() {
        let mut timeline = Timeline::new();
        timeline.schedule_after(500, Task::Extract { slot: 1 });
        timeline.schedule_after(100, Task::RepairAssets { slot: 1 });

        assert!(timeline.advance(50).is_empty());
        assert_eq!(timeline.advance(500).len(), 2);
        assert!(timeline.is_idle());
    }

    #[test]
    fn earlier_deadline_runs_first_regardless_of_scheduling_order() {
        let mut timeline = Timeline::new();
        timeline.schedule_after(300, Task::Extract { slot: 0 });
        timeline.schedule_after(100, Task::RepairAssets { slot: 0 });
        let due = timeline.advance(1000);
        assert_eq!(
            due,
            vec![Task::RepairAssets { slot: 0 }, Task::Extract { slot: 0 }]
        );
    }

    #[test]
    fn cancel_by_handle() {
        let mut timeline = Timeline::new();
        let handle = timeline.schedule_after(100, Task::Extract { slot: 0 });
        timeline.cancel(handle);
        assert!(timeline.advance(1000).is_empty());
    }

    #[test]
    fn cancel_matching_drops_surface_bound_work() {
        let mut timeline = Timeline::new();
        timeline.schedule_after(100, Task::RepairAssets { slot: 0 });
        timeline.schedule_after(100, Task::RepairAssets { slot: 1 });
        timeline.schedule_frame(Task::CommitCamera);

        timeline.cancel_matching(|t| matches!(t, Task::RepairAssets { slot: 0 }));
        assert!(!timeline.has_pending(|t| matches!(t, Task::RepairAssets { slot: 0 })));
        assert!(timeline.has_pending(|t| matches!(t, Task::RepairAssets { slot: 1 })));
        assert!(timeline.has_pending(|t| *t == Task::CommitCamera));
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut timeline = Timeline::new();
        timeline.advance(500);
        timeline.advance(200);
        assert_eq!(timeline.now(), 500);
    }
}
