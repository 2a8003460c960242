//! Comparison scroll synchronization.
//!
//! Mirrors scroll offsets between each modified/original surface pair. The
//! per-pair lifecycle is an explicit state machine:
//!
//! ```text
//!   Idle ─▶ AttachPending { attempt } ─▶ Attached ─▶ (detach) ─▶ Idle
//!                  │        ▲
//!                  └────────┘ bounded, increasing retry delays
//!                  └──────────▶ Error (retries exhausted)
//! ```
//!
//! Direction handling replaces the classic pair of `syncing-from-X` flags
//! with a single authoritative *initiator token* per pair: the first side to
//! scroll in a tick owns the pending sync, the mirrored write arms a one-shot
//! echo suppression for the counterpart, and a scroll from the counterpart
//! while the token is held is treated as that echo. Under genuinely rapid
//! bidirectional input this drops the second direction for one tick and
//! converges on the next — eventual convergence, never a feedback loop.

use restyle_protocol::SurfaceHandle;

use crate::surface::SurfaceManager;
use crate::timeline::{Task, TaskHandle, Timeline};

/// Attach lifecycle of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    /// Waiting for both scrollable contexts; `attempt` indexes the backoff.
    AttachPending { attempt: usize },
    Attached,
    /// Retries exhausted. Comparison stays usable without sync.
    Error,
}

/// Which side of a pair initiated the pending sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSide {
    Modified,
    Original,
}

impl SyncSide {
    fn other(self) -> SyncSide {
        match self {
            SyncSide::Modified => SyncSide::Original,
            SyncSide::Original => SyncSide::Modified,
        }
    }
}

/// One synchronized modified/original pair, by surface slot.
#[derive(Debug)]
pub struct SurfacePair {
    pub modified: usize,
    pub original: usize,
    pub phase: SyncPhase,
    /// Who owns the pending mirror, if any.
    initiator: Option<SyncSide>,
    /// Side whose next scroll event is our own mirrored write.
    suppress_echo: Option<SyncSide>,
    pending_sync: Option<TaskHandle>,
    pending_retry: Option<TaskHandle>,
}

impl SurfacePair {
    fn new(modified: usize, original: usize) -> Self {
        Self {
            modified,
            original,
            phase: SyncPhase::Idle,
            initiator: None,
            suppress_echo: None,
            pending_sync: None,
            pending_retry: None,
        }
    }

    fn side_of(&self, slot: usize) -> Option<SyncSide> {
        if slot == self.modified {
            Some(SyncSide::Modified)
        } else if slot == self.original {
            Some(SyncSide::Original)
        } else {
            None
        }
    }

    fn slot_of(&self, side: SyncSide) -> usize {
        match side {
            SyncSide::Modified => self.modified,
            SyncSide::Original => self.original,
        }
    }
}

/// All live pairs plus the shared attach backoff.
#[derive(Debug, Default)]
pub struct ScrollSync {
    pairs: Vec<SurfacePair>,
}

impl ScrollSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[SurfacePair] {
        &self.pairs
    }

    pub fn phase(&self, pair: usize) -> Option<SyncPhase> {
        self.pairs.get(pair).map(|p| p.phase)
    }

    /// Whether any pair failed to attach.
    pub fn has_error(&self) -> bool {
        self.pairs.iter().any(|p| p.phase == SyncPhase::Error)
    }

    /// Replace the pair set and start attaching. Existing pairs detach first.
    pub fn begin<H: SurfaceHandle>(
        &mut self,
        pairs: Vec<(usize, usize)>,
        manager: &SurfaceManager<H>,
        delays: &[u64],
        timeline: &mut Timeline,
    ) {
        self.detach_all(timeline);
        self.pairs = pairs
            .into_iter()
            .map(|(modified, original)| SurfacePair::new(modified, original))
            .collect();
        for index in 0..self.pairs.len() {
            self.pairs[index].phase = SyncPhase::AttachPending { attempt: 0 };
            self.try_attach(index, manager, delays, timeline);
        }
    }

    /// Attempt to resolve a pair's scrollable contexts; on failure schedule
    /// the next bounded retry.
    pub fn try_attach<H: SurfaceHandle>(
        &mut self,
        index: usize,
        manager: &SurfaceManager<H>,
        delays: &[u64],
        timeline: &mut Timeline,
    ) {
        let Some(pair) = self.pairs.get_mut(index) else {
            return;
        };
        let SyncPhase::AttachPending { attempt } = pair.phase else {
            return;
        };
        if let Some(handle) = pair.pending_retry.take() {
            timeline.cancel(handle);
        }

        let ready = |slot: usize| {
            manager
                .slot(slot)
                .is_some_and(|s| s.initialized && s.handle.is_loaded())
        };
        if ready(pair.modified) && ready(pair.original) {
            pair.phase = SyncPhase::Attached;
            tracing::debug!(pair = index, "scroll sync attached");
            return;
        }

        match delays.get(attempt) {
            Some(&delay) => {
                pair.phase = SyncPhase::AttachPending { attempt: attempt + 1 };
                pair.pending_retry = Some(timeline.schedule_after(
                    delay,
                    Task::AttachRetry {
                        pair: index,
                        attempt: attempt + 1,
                    },
                ));
            }
            None => {
                pair.phase = SyncPhase::Error;
                tracing::warn!(pair = index, "scroll sync attach retries exhausted");
            }
        }
    }

    /// A surface finished loading: re-drive any pair waiting on it.
    pub fn on_surface_loaded<H: SurfaceHandle>(
        &mut self,
        slot: usize,
        manager: &SurfaceManager<H>,
        delays: &[u64],
        timeline: &mut Timeline,
    ) {
        for index in 0..self.pairs.len() {
            let waiting = {
                let pair = &self.pairs[index];
                pair.side_of(slot).is_some()
                    && matches!(pair.phase, SyncPhase::AttachPending { .. })
            };
            if waiting {
                self.try_attach(index, manager, delays, timeline);
            }
        }
    }

    /// A scroll/wheel/touch event landed on `slot`. Schedules a mirror on
    /// the next frame tick unless the event is the echo of our own write.
    pub fn on_scroll(&mut self, slot: usize, timeline: &mut Timeline) {
        for (index, pair) in self.pairs.iter_mut().enumerate() {
            let Some(side) = pair.side_of(slot) else {
                continue;
            };
            if pair.phase != SyncPhase::Attached {
                continue;
            }
            if pair.suppress_echo == Some(side) {
                // Our mirrored write coming back around; consume it.
                pair.suppress_echo = None;
                continue;
            }
            match pair.initiator {
                None => {
                    pair.initiator = Some(side);
                    if pair.pending_sync.is_none() {
                        pair.pending_sync =
                            Some(timeline.schedule_frame(Task::SyncScroll { pair: index }));
                    }
                }
                // The token holder keeps scrolling: offset is read at run
                // time, nothing to do. A competing scroll from the other
                // side within the same tick loses to the token.
                Some(_) => {}
            }
        }
    }

    /// Run the pending mirror for a pair (frame-tick dispatch).
    pub fn run_sync<H: SurfaceHandle>(
        &mut self,
        index: usize,
        manager: &mut SurfaceManager<H>,
    ) {
        let Some(pair) = self.pairs.get_mut(index) else {
            return;
        };
        pair.pending_sync = None;
        let Some(side) = pair.initiator.take() else {
            return;
        };
        if pair.phase != SyncPhase::Attached {
            return;
        }
        let offset = match manager.slot(pair.slot_of(side)) {
            Some(slot) => slot.handle.scroll_offset(),
            None => return,
        };
        let counterpart = pair.slot_of(side.other());
        if let Some(slot) = manager.slot_mut(counterpart) {
            slot.handle.set_scroll_offset(offset);
            pair.suppress_echo = Some(side.other());
        }
    }

    /// Tear everything down: cancel pending work, forget pairs.
    pub fn detach_all(&mut self, timeline: &mut Timeline) {
        for pair in &mut self.pairs {
            if let Some(handle) = pair.pending_sync.take() {
                timeline.cancel(handle);
            }
            if let Some(handle) = pair.pending_retry.take() {
                timeline.cancel(handle);
            }
        }
        timeline.cancel_matching(|task| {
            matches!(task, Task::SyncScroll { .. } | Task::AttachRetry { .. })
        });
        self.pairs.clear();
    }
}
