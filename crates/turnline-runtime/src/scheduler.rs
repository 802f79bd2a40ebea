#![forbid(unsafe_code)]

//! Frame gate and named timer slots.
//!
//! The timeline never sleeps and never owns a clock. Hosts pass the current
//! [`Instant`] into every entry point; the types here only remember *when*
//! something should happen, and the host's event loop wakes the controller
//! at [`TimerSet::next_deadline`].
//!
//! # Frame gate
//!
//! All per-frame work (geometry, track sync, active decision, render) runs in
//! one pass per animation frame. [`FrameGate::request`] returns `true` only
//! for the first request since the last frame, so any number of scroll and
//! resize signals within one frame cost a single pass.
//!
//! # Timers
//!
//! Each [`TimerKind`] has exactly one slot. Arming a kind replaces its
//! deadline, which gives debounce semantics for free: a burst of structural
//! changes keeps pushing the rebuild out until the document settles.

use std::time::Duration;

use web_time::Instant;

/// Coalesces frame requests to at most one per animation frame.
#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    pending: bool,
    frames: u64,
    coalesced: u64,
}

impl FrameGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a frame. Returns `true` when the host must be asked for an
    /// animation-frame callback, `false` when one is already pending.
    pub fn request(&mut self) -> bool {
        if self.pending {
            self.coalesced += 1;
            return false;
        }
        self.pending = true;
        true
    }

    /// Consume the pending request at the start of a frame callback.
    ///
    /// Returns `false` for spurious callbacks with nothing requested.
    pub fn begin_frame(&mut self) -> bool {
        if !std::mem::take(&mut self.pending) {
            return false;
        }
        self.frames += 1;
        true
    }

    /// Drop a pending request without running it.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Frames that actually ran.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Requests dropped because a frame was already pending.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

/// Logical passes that run on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Debounced marker rebuild after a structural change.
    Rebuild,
    /// Debounced refresh of the secondary list view.
    ListRefresh,
    /// Settle delay before the idle-time min-gap correction is queued.
    IdleCorrection,
    /// Deferred commit of a rate-limited active-marker change.
    ActiveCommit,
    /// Grace period before an empty turn list is believed.
    EmptyGrace,
    /// Next discovery attempt while bootstrapping.
    Bootstrap,
}

impl TimerKind {
    pub const ALL: [Self; 6] = [
        Self::Rebuild,
        Self::ListRefresh,
        Self::IdleCorrection,
        Self::ActiveCommit,
        Self::EmptyGrace,
        Self::Bootstrap,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::Rebuild => 0,
            Self::ListRefresh => 1,
            Self::IdleCorrection => 2,
            Self::ActiveCommit => 3,
            Self::EmptyGrace => 4,
            Self::Bootstrap => 5,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rebuild => "rebuild",
            Self::ListRefresh => "list_refresh",
            Self::IdleCorrection => "idle_correction",
            Self::ActiveCommit => "active_commit",
            Self::EmptyGrace => "empty_grace",
            Self::Bootstrap => "bootstrap",
        }
    }
}

/// One deadline slot per [`TimerKind`].
#[derive(Debug, Clone, Default)]
pub struct TimerSet {
    deadlines: [Option<Instant>; 6],
}

impl TimerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire at `deadline`, replacing any earlier arming.
    pub fn arm(&mut self, kind: TimerKind, deadline: Instant) {
        let replaced = self.deadlines[kind.slot()].replace(deadline).is_some();
        tracing::trace!(
            target: "turnline.controller",
            timer = kind.as_str(),
            replaced,
            "timer armed"
        );
    }

    /// Arm `kind` to fire `delay` after `now`.
    pub fn arm_after(&mut self, kind: TimerKind, now: Instant, delay: Duration) {
        self.arm(kind, now + delay);
    }

    /// Arm `kind` only if it is not already armed. Returns `true` if armed now.
    pub fn arm_if_idle(&mut self, kind: TimerKind, now: Instant, delay: Duration) -> bool {
        if self.is_armed(kind) {
            return false;
        }
        self.arm_after(kind, now, delay);
        true
    }

    /// Disarm `kind`. Returns `true` if it was armed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let was_armed = self.deadlines[kind.slot()].take().is_some();
        if was_armed {
            tracing::trace!(target: "turnline.controller", timer = kind.as_str(), "timer cancelled");
        }
        was_armed
    }

    /// Disarm every timer. Returns how many were armed.
    pub fn cancel_all(&mut self) -> usize {
        self.deadlines
            .iter_mut()
            .filter_map(Option::take)
            .count()
    }

    #[must_use]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadlines[kind.slot()].is_some()
    }

    #[must_use]
    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.deadlines[kind.slot()]
    }

    /// Earliest armed deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.iter().flatten().min().copied()
    }

    /// Disarm and return every kind due at `now`, earliest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(Instant, TimerKind)> = TimerKind::ALL
            .iter()
            .filter_map(|kind| {
                let deadline = self.deadlines[kind.slot()]?;
                (deadline <= now).then_some((deadline, *kind))
            })
            .collect();
        due.sort();
        for (_, kind) in &due {
            self.deadlines[kind.slot()] = None;
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }

    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.deadlines.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn frame_gate_coalesces_requests() {
        let mut gate = FrameGate::new();
        assert!(gate.request());
        assert!(!gate.request());
        assert!(!gate.request());
        assert_eq!(gate.coalesced(), 2);

        assert!(gate.begin_frame());
        assert!(!gate.begin_frame());
        assert_eq!(gate.frames(), 1);

        assert!(gate.request());
    }

    #[test]
    fn frame_gate_cancel_drops_request() {
        let mut gate = FrameGate::new();
        gate.request();
        gate.cancel();
        assert!(!gate.is_pending());
        assert!(!gate.begin_frame());
    }

    #[test]
    fn rearming_replaces_deadline() {
        let t0 = Instant::now();
        let mut timers = TimerSet::new();
        timers.arm_after(TimerKind::Rebuild, t0, ms(350));
        timers.arm_after(TimerKind::Rebuild, t0 + ms(200), ms(350));

        assert_eq!(timers.deadline(TimerKind::Rebuild), Some(t0 + ms(550)));
        assert!(timers.take_due(t0 + ms(400)).is_empty());
        assert_eq!(timers.take_due(t0 + ms(550)), vec![TimerKind::Rebuild]);
        assert!(!timers.is_armed(TimerKind::Rebuild));
    }

    #[test]
    fn arm_if_idle_keeps_first_deadline() {
        let t0 = Instant::now();
        let mut timers = TimerSet::new();
        assert!(timers.arm_if_idle(TimerKind::EmptyGrace, t0, ms(800)));
        assert!(!timers.arm_if_idle(TimerKind::EmptyGrace, t0 + ms(500), ms(800)));
        assert_eq!(timers.deadline(TimerKind::EmptyGrace), Some(t0 + ms(800)));
    }

    #[test]
    fn take_due_orders_by_deadline() {
        let t0 = Instant::now();
        let mut timers = TimerSet::new();
        timers.arm_after(TimerKind::ListRefresh, t0, ms(150));
        timers.arm_after(TimerKind::ActiveCommit, t0, ms(50));
        timers.arm_after(TimerKind::IdleCorrection, t0, ms(140));
        timers.arm_after(TimerKind::Rebuild, t0, ms(350));

        assert_eq!(timers.next_deadline(), Some(t0 + ms(50)));
        assert_eq!(
            timers.take_due(t0 + ms(200)),
            vec![
                TimerKind::ActiveCommit,
                TimerKind::IdleCorrection,
                TimerKind::ListRefresh
            ]
        );
        assert_eq!(timers.armed_count(), 1);
        assert_eq!(timers.next_deadline(), Some(t0 + ms(350)));
    }

    #[test]
    fn cancel_all_is_idempotent() {
        let t0 = Instant::now();
        let mut timers = TimerSet::new();
        for kind in TimerKind::ALL {
            timers.arm_after(kind, t0, ms(10));
        }
        assert_eq!(timers.cancel_all(), 6);
        assert_eq!(timers.cancel_all(), 0);
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn cancel_reports_state() {
        let t0 = Instant::now();
        let mut timers = TimerSet::new();
        assert!(!timers.cancel(TimerKind::Bootstrap));
        timers.arm_after(TimerKind::Bootstrap, t0, ms(300));
        assert!(timers.cancel(TimerKind::Bootstrap));
        assert!(!timers.is_armed(TimerKind::Bootstrap));
    }
}
