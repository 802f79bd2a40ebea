#![forbid(unsafe_code)]

//! The timeline controller.
//!
//! [`TimelineController`] owns every piece of timeline state and is the only
//! thing a host talks to. It is driven entirely from outside:
//!
//! | Host event                    | Call                                   |
//! |-------------------------------|----------------------------------------|
//! | attach                        | [`start`](TimelineController::start)   |
//! | signal queued on the channel  | [`pump`](TimelineController::pump)     |
//! | wake-up at `next_deadline()`  | [`tick`](TimelineController::tick)     |
//! | animation frame               | [`on_animation_frame`](TimelineController::on_animation_frame) |
//! | idle callback                 | [`on_idle`](TimelineController::on_idle) |
//! | detach                        | [`destroy`](TimelineController::destroy) |
//!
//! Every entry point takes the current [`Instant`] and a [`TimelineHost`];
//! the controller never reads a clock and never holds on to the host.
//!
//! # Per-frame pipeline
//!
//! Scroll and resize signals only *request* a frame. Within the frame the
//! controller runs, in order: geometry recompute (if the markers or track
//! size changed), track scroll sync, active-marker decision, render. Any
//! number of requests before the frame runs collapse into this one pass.
//!
//! # Teardown
//!
//! [`destroy`](TimelineController::destroy) cancels every timer, drops the
//! frame request, the drag session, and the tooltip, and disconnects the
//! signal channel. Every later call is a no-op.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};

use turnline_core::discovery::DiscoveryChain;
use turnline_core::geometry::{Point, Rect, Size};
use turnline_core::marker::{Marker, MarkerModel, RebuildOutcome, SourceRef, TurnRecord};
use turnline_layout::drag::{DragConstraintEngine, DragRelease, DragUpdate, PositionSnapshot};
use turnline_layout::text::TextMeasure;
use turnline_layout::tooltip::{TooltipLayout, TooltipLayoutEngine};
use turnline_layout::track::{GeometryEngine, SliderThumb, TrackGeometry};
use web_time::Instant;

use crate::bootstrap::{Bootstrap, BootstrapState, BootstrapStep};
use crate::config::{ConfigError, TimelineConfig};
use crate::persistence::{
    MemoryStore, POSITION_KEY, PersistenceGate, SettingsStore, starred_key,
};
use crate::scheduler::{FrameGate, TimerKind, TimerSet};
use crate::scroll_sync::{
    ActiveDecision, ActiveState, ScrollMetrics, compute_active_by_scroll, compute_track_scroll,
};

/// Notifications from the host's observers.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineSignal {
    /// The document's turn structure changed.
    Mutated,
    /// The track's host region changed height.
    TrackResized { height: f64 },
    /// The window viewport changed size.
    ViewportResized(Size),
    /// The main scroll region scrolled or changed size.
    Scrolled(ScrollMetrics),
    /// The user grabbed (`true`) or released the track's scroll handle.
    SliderDrag(bool),
    /// The track became visible or hidden.
    Visibility(bool),
}

/// Everything a renderer needs for one frame of the track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFrame<'a> {
    pub markers: &'a [Marker],
    pub geometry: TrackGeometry,
    /// Indices of markers inside the track viewport plus its buffer.
    pub visible: Range<usize>,
    pub thumb: Option<SliderThumb>,
    pub active_id: Option<&'a str>,
    /// Marker-set version the frame was computed for.
    pub version: u64,
}

/// Side effects of the timeline, implemented by the embedder.
pub trait TimelineHost {
    /// Draw the track.
    fn render(&mut self, frame: &TrackFrame<'_>);

    /// The active marker changed (after rate limiting).
    fn marker_activated(&mut self, id: &str);

    /// Bring the turn behind `target` into view in the main document.
    fn request_scroll_to(&mut self, target: SourceRef);

    fn show_tooltip(&mut self, id: &str, layout: &TooltipLayout);

    fn hide_tooltip(&mut self);

    /// A drag gesture finished at `snapshot`.
    fn persist_position(&mut self, snapshot: &PositionSnapshot);

    /// Refresh the secondary list view.
    fn refresh_list(&mut self, markers: &[Marker]);

    /// Schedule one call to
    /// [`on_animation_frame`](TimelineController::on_animation_frame).
    fn request_frame(&mut self);
}

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, not started.
    Created,
    /// Waiting for discovery to find turns.
    Bootstrapping,
    /// Turns found; the timeline is live.
    Active,
    /// Discovery gave up. The timeline stays dormant.
    Inactive,
    /// Torn down.
    Destroyed,
}

#[derive(Debug, Clone, Copy)]
struct QueuedCorrection {
    since: Instant,
    version: u64,
}

/// Owns and drives one timeline instance.
pub struct TimelineController {
    config: TimelineConfig,
    model: MarkerModel,
    track: GeometryEngine,
    active: ActiveState,
    tooltip: TooltipLayoutEngine,
    drag: DragConstraintEngine,
    discovery: DiscoveryChain,
    bootstrap: Bootstrap,
    persistence: PersistenceGate<Box<dyn SettingsStore>>,
    timers: TimerSet,
    frame: FrameGate,
    sender: Sender<TimelineSignal>,
    receiver: Option<Receiver<TimelineSignal>>,
    scroll: ScrollMetrics,
    track_height: f64,
    viewport: Size,
    slider_dragging: bool,
    visible: bool,
    geometry_dirty: bool,
    queued_correction: Option<QueuedCorrection>,
    last_turn_count: usize,
    tooltip_for: Option<String>,
    scope: Option<String>,
    starred: BTreeSet<String>,
    position: Option<PositionSnapshot>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for TimelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineController")
            .field("lifecycle", &self.lifecycle)
            .field("markers", &self.model.len())
            .field("version", &self.model.version())
            .field("active_id", &self.active.active_id())
            .field("discovery", &self.discovery)
            .field("timers", &self.timers.armed_count())
            .field("persistence_enabled", &self.persistence.is_enabled())
            .finish_non_exhaustive()
    }
}

impl TimelineController {
    /// Build a controller. Fails if `config` does not validate.
    ///
    /// Starts with an empty discovery chain and an in-memory settings store.
    pub fn new(config: TimelineConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let (sender, receiver) = mpsc::channel();
        let store: Box<dyn SettingsStore> = Box::new(MemoryStore::new());
        Ok(Self {
            model: MarkerModel::new(config.to_summary_rules()),
            track: GeometryEngine::new(config.to_track_config()),
            active: ActiveState::new(config.sync.min_active_change_interval()),
            tooltip: TooltipLayoutEngine::new(config.to_tooltip_config()),
            drag: DragConstraintEngine::new(config.to_drag_config()),
            discovery: DiscoveryChain::new(),
            bootstrap: Bootstrap::new(
                config.schedule.bootstrap_max_attempts,
                config.schedule.bootstrap_interval(),
            ),
            persistence: PersistenceGate::new(store),
            timers: TimerSet::new(),
            frame: FrameGate::new(),
            sender,
            receiver: Some(receiver),
            scroll: ScrollMetrics::default(),
            track_height: 0.0,
            viewport: Size::default(),
            slider_dragging: false,
            visible: true,
            geometry_dirty: false,
            queued_correction: None,
            last_turn_count: 0,
            tooltip_for: None,
            scope: None,
            starred: BTreeSet::new(),
            position: None,
            lifecycle: Lifecycle::Created,
            config,
        })
    }

    /// Use `chain` to find turns at startup and after structural changes.
    #[must_use]
    pub fn with_discovery(mut self, chain: DiscoveryChain) -> Self {
        self.discovery = chain;
        self
    }

    /// Persist settings through `store`.
    #[must_use]
    pub fn with_store(mut self, store: impl SettingsStore + 'static) -> Self {
        let store: Box<dyn SettingsStore> = Box::new(store);
        self.persistence = PersistenceGate::new(store);
        self
    }

    /// A sender for [`TimelineSignal`]s. Drained by [`pump`](Self::pump).
    #[must_use]
    pub fn sender(&self) -> Sender<TimelineSignal> {
        self.sender.clone()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Begin bootstrapping: try discovery now and keep retrying on a timer.
    pub fn start<H: TimelineHost + ?Sized>(&mut self, now: Instant, host: &mut H) {
        if self.lifecycle != Lifecycle::Created {
            return;
        }
        self.lifecycle = Lifecycle::Bootstrapping;
        tracing::debug!(
            target: "turnline.controller",
            strategies = self.discovery.len(),
            "timeline started"
        );
        self.run_bootstrap(now, host);
    }

    /// Tear down. Returns `false` if already destroyed.
    pub fn destroy<H: TimelineHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let cancelled = self.timers.cancel_all();
        self.frame.cancel();
        self.drag.cancel();
        if self.tooltip_for.take().is_some() {
            host.hide_tooltip();
        }
        self.receiver = None;
        self.queued_correction = None;
        self.lifecycle = Lifecycle::Destroyed;
        tracing::debug!(target: "turnline.controller", cancelled, "timeline destroyed");
        true
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == Lifecycle::Destroyed
    }

    // -----------------------------------------------------------------------
    // Event loop entry points
    // -----------------------------------------------------------------------

    /// Drain and apply queued signals. Returns how many were handled.
    pub fn pump<H: TimelineHost + ?Sized>(&mut self, now: Instant, host: &mut H) -> usize {
        let Some(receiver) = &self.receiver else {
            return 0;
        };
        let signals: Vec<TimelineSignal> = receiver.try_iter().collect();
        let count = signals.len();
        for signal in signals {
            self.handle_signal(signal, now, host);
        }
        count
    }

    /// Fire due timers and overdue idle work. Returns how many timers fired.
    pub fn tick<H: TimelineHost + ?Sized>(&mut self, now: Instant, host: &mut H) -> usize {
        if self.is_destroyed() {
            return 0;
        }
        let due = self.timers.take_due(now);
        let fired = due.len();
        for kind in due {
            self.fire(kind, now, host);
        }
        if self
            .idle_fallback_deadline()
            .is_some_and(|deadline| now >= deadline)
        {
            tracing::trace!(target: "turnline.controller", "idle callback overdue; correcting now");
            self.run_correction(host);
        }
        fired
    }

    /// The host's idle callback: run queued low-priority work.
    pub fn on_idle<H: TimelineHost + ?Sized>(&mut self, _now: Instant, host: &mut H) {
        if self.is_destroyed() {
            return;
        }
        self.run_correction(host);
    }

    /// When the host should next call [`tick`](Self::tick).
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timers.next_deadline(), self.idle_fallback_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run the per-frame pipeline. Returns `false` when no frame was pending.
    pub fn on_animation_frame<H: TimelineHost + ?Sized>(
        &mut self,
        now: Instant,
        host: &mut H,
    ) -> bool {
        if self.is_destroyed() || !self.frame.begin_frame() {
            return false;
        }

        if std::mem::take(&mut self.geometry_dirty) {
            self.track
                .recompute(self.model.markers_mut(), self.track_height);
        }

        if let Some(scroll_top) = compute_track_scroll(
            self.model.markers(),
            self.track.geometry(),
            &self.scroll,
            self.config.sync.reference_fraction,
            self.slider_dragging,
        ) {
            self.track.set_track_scroll(scroll_top);
        }

        self.decide_active(now, host);

        if self.visible {
            let markers = self.model.markers();
            let frame = TrackFrame {
                markers,
                geometry: *self.track.geometry(),
                visible: self
                    .track
                    .visible_range(markers, self.config.track.visible_buffer),
                thumb: self.track.slider_thumb(),
                active_id: self.active.active_id(),
                version: self.model.version(),
            };
            tracing::trace!(
                target: "turnline.controller",
                markers = markers.len(),
                visible_start = frame.visible.start,
                visible_end = frame.visible.end,
                track_scroll = frame.geometry.track_scroll_top,
                "frame rendered"
            );
            host.render(&frame);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Turn records
    // -----------------------------------------------------------------------

    /// Replace the turn list.
    ///
    /// An empty list while markers are shown does not clear them right
    /// away: the markers stay until the empty-grace timer confirms the
    /// document really has no turns.
    pub fn apply_turns<H: TimelineHost + ?Sized>(
        &mut self,
        records: &[TurnRecord],
        now: Instant,
        host: &mut H,
    ) {
        if self.is_destroyed() {
            return;
        }
        self.last_turn_count = records.len();

        match self.model.rebuild(records) {
            RebuildOutcome::TransientlyEmpty { .. } => {
                if !self.model.is_empty()
                    && self.timers.arm_if_idle(
                        TimerKind::EmptyGrace,
                        now,
                        self.config.schedule.empty_grace(),
                    )
                {
                    tracing::debug!(
                        target: "turnline.controller",
                        shown = self.model.len(),
                        "turn list empty; waiting before clearing"
                    );
                }
            }
            RebuildOutcome::Rebuilt { count, version } => {
                self.timers.cancel(TimerKind::EmptyGrace);
                if self.lifecycle != Lifecycle::Active {
                    self.lifecycle = Lifecycle::Active;
                    self.timers.cancel(TimerKind::Bootstrap);
                }
                self.model
                    .set_starred(self.starred.iter().map(String::as_str));
                self.after_marker_change(now, host);
                tracing::debug!(
                    target: "turnline.controller",
                    count,
                    version,
                    "turns applied"
                );
            }
        }
    }

    fn after_marker_change<H: TimelineHost + ?Sized>(&mut self, now: Instant, host: &mut H) {
        let model = &self.model;
        self.active.retain_known(|id| model.index_of(id).is_some());
        if self.active.commit_deadline().is_none() {
            self.timers.cancel(TimerKind::ActiveCommit);
        }
        if self
            .tooltip_for
            .as_deref()
            .is_some_and(|id| self.model.get(id).is_none())
        {
            self.hide_tooltip(host);
        }
        self.geometry_dirty = true;
        self.request_frame(host);
        self.timers
            .arm_after(TimerKind::ListRefresh, now, self.config.schedule.list_refresh());
    }

    // -----------------------------------------------------------------------
    // Signals and timers
    // -----------------------------------------------------------------------

    fn handle_signal<H: TimelineHost + ?Sized>(
        &mut self,
        signal: TimelineSignal,
        now: Instant,
        host: &mut H,
    ) {
        tracing::trace!(target: "turnline.controller", ?signal, "signal");
        match signal {
            TimelineSignal::Mutated => {
                if matches!(self.lifecycle, Lifecycle::Bootstrapping | Lifecycle::Active) {
                    self.timers.arm_after(
                        TimerKind::Rebuild,
                        now,
                        self.config.schedule.rebuild_debounce(),
                    );
                }
            }
            TimelineSignal::TrackResized { height } => {
                self.track_height = if height.is_finite() { height.max(0.0) } else { 0.0 };
                self.geometry_dirty = true;
                self.request_frame(host);
                self.timers.arm_after(
                    TimerKind::IdleCorrection,
                    now,
                    self.config.schedule.idle_correction(),
                );
            }
            TimelineSignal::ViewportResized(size) => {
                self.viewport = size;
                self.hide_tooltip(host);
                self.request_frame(host);
            }
            TimelineSignal::Scrolled(metrics) => {
                self.scroll = metrics;
                self.request_frame(host);
            }
            TimelineSignal::SliderDrag(dragging) => self.set_slider_drag(dragging, host),
            TimelineSignal::Visibility(visible) => {
                self.visible = visible;
                if visible {
                    self.request_frame(host);
                }
            }
        }
    }

    fn fire<H: TimelineHost + ?Sized>(&mut self, kind: TimerKind, now: Instant, host: &mut H) {
        tracing::debug!(target: "turnline.controller", timer = kind.as_str(), "timer fired");
        match kind {
            TimerKind::Rebuild => match self.discovery.first_match() {
                Some(found) => self.apply_turns(&found.turns, now, host),
                None => {
                    tracing::trace!(
                        target: "turnline.controller",
                        "no discovery strategy matched; markers kept"
                    );
                }
            },
            TimerKind::ListRefresh => host.refresh_list(self.model.markers()),
            TimerKind::IdleCorrection => {
                self.queued_correction = Some(QueuedCorrection {
                    since: now,
                    version: self.model.version(),
                });
            }
            TimerKind::ActiveCommit => {
                if let Some(id) = self.active.fire(now) {
                    host.marker_activated(&id);
                    self.request_frame(host);
                }
            }
            TimerKind::EmptyGrace => {
                if self.last_turn_count == 0 && !self.model.is_empty() {
                    tracing::debug!(target: "turnline.controller", "empty turn list confirmed");
                    self.model.clear();
                    self.active.reset();
                    self.after_marker_change(now, host);
                }
            }
            TimerKind::Bootstrap => self.run_bootstrap(now, host),
        }
    }

    fn run_bootstrap<H: TimelineHost + ?Sized>(&mut self, now: Instant, host: &mut H) {
        match self.bootstrap.attempt(&self.discovery, now) {
            BootstrapStep::Found(found) => self.apply_turns(&found.turns, now, host),
            BootstrapStep::RetryAt(at) => self.timers.arm(TimerKind::Bootstrap, at),
            BootstrapStep::Exhausted => {
                if self.lifecycle == Lifecycle::Bootstrapping {
                    self.lifecycle = Lifecycle::Inactive;
                }
            }
            BootstrapStep::Finished => {}
        }
    }

    fn idle_fallback_deadline(&self) -> Option<Instant> {
        self.queued_correction
            .map(|queued| queued.since + self.config.schedule.idle_timeout())
    }

    fn run_correction<H: TimelineHost + ?Sized>(&mut self, host: &mut H) {
        let Some(queued) = self.queued_correction.take() else {
            return;
        };
        if !self.model.is_current(queued.version) {
            tracing::trace!(
                target: "turnline.controller",
                queued = queued.version,
                current = self.model.version(),
                "stale correction dropped"
            );
            return;
        }
        self.track.reapply(self.model.markers_mut());
        self.request_frame(host);
    }

    fn decide_active<H: TimelineHost + ?Sized>(&mut self, now: Instant, host: &mut H) {
        let line = self
            .scroll
            .reference_line(self.config.sync.reference_fraction);
        let markers = self.model.markers();
        let Some(index) = compute_active_by_scroll(markers, line) else {
            return;
        };
        match self.active.propose(&markers[index].id, now) {
            ActiveDecision::Committed(id) => {
                self.timers.cancel(TimerKind::ActiveCommit);
                host.marker_activated(&id);
            }
            ActiveDecision::Deferred { deadline } => {
                self.timers.arm(TimerKind::ActiveCommit, deadline);
            }
            ActiveDecision::PendingCancelled => {
                self.timers.cancel(TimerKind::ActiveCommit);
            }
            ActiveDecision::Unchanged => {}
        }
    }

    fn request_frame<H: TimelineHost + ?Sized>(&mut self, host: &mut H) {
        if !self.is_destroyed() && self.frame.request() {
            host.request_frame();
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// A marker was clicked: make it active now and scroll to its turn.
    ///
    /// Returns `false` for unknown ids.
    pub fn activate_marker<H: TimelineHost + ?Sized>(
        &mut self,
        id: &str,
        now: Instant,
        host: &mut H,
    ) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let Some(target) = self.model.get(id).map(|m| m.source_ref) else {
            return false;
        };
        self.timers.cancel(TimerKind::ActiveCommit);
        if self.active.commit_now(id, now) {
            host.marker_activated(id);
        }
        host.request_scroll_to(target);
        self.request_frame(host);
        true
    }

    /// Move the active marker by `delta` positions, clamped to the list.
    ///
    /// With no active marker, positive steps start at the first marker and
    /// negative ones at the last. Returns the id navigated to.
    pub fn step_active<H: TimelineHost + ?Sized>(
        &mut self,
        delta: isize,
        now: Instant,
        host: &mut H,
    ) -> Option<String> {
        let last = self.model.len().checked_sub(1)?;
        let current = self
            .active
            .active_id()
            .and_then(|id| self.model.index_of(id));
        let target = match current {
            Some(index) => index.saturating_add_signed(delta).min(last),
            None if delta < 0 => last,
            None => 0,
        };
        let id = self.model.markers()[target].id.clone();
        self.activate_marker(&id, now, host).then_some(id)
    }

    // -----------------------------------------------------------------------
    // Stars
    // -----------------------------------------------------------------------

    /// Load the starred ids stored for `scope` (usually one conversation)
    /// and apply them to the markers.
    pub fn set_scope<H: TimelineHost + ?Sized>(&mut self, scope: impl Into<String>, host: &mut H) {
        if self.is_destroyed() {
            return;
        }
        let scope = scope.into();
        let ids: Vec<String> = self
            .persistence
            .load(&starred_key(&scope))
            .unwrap_or_default();
        self.starred = ids.into_iter().collect();
        self.model
            .set_starred(self.starred.iter().map(String::as_str));
        tracing::debug!(
            target: "turnline.controller",
            scope = scope.as_str(),
            starred = self.starred.len(),
            "scope set"
        );
        self.scope = Some(scope);
        self.request_frame(host);
    }

    /// Flip the starred flag of `id`. Returns the new flag, or `None` for
    /// unknown ids.
    pub fn toggle_star<H: TimelineHost + ?Sized>(&mut self, id: &str, host: &mut H) -> Option<bool> {
        if self.is_destroyed() {
            return None;
        }
        let starred = self.model.toggle_star(id)?;
        if starred {
            self.starred.insert(id.to_string());
        } else {
            self.starred.remove(id);
        }
        if let Some(scope) = &self.scope {
            let key = starred_key(scope);
            if self.starred.is_empty() {
                self.persistence.remove(&key);
            } else {
                let ids: Vec<&str> = self.starred.iter().map(String::as_str).collect();
                self.persistence.save(&key, &ids);
            }
        }
        self.request_frame(host);
        Some(starred)
    }

    // -----------------------------------------------------------------------
    // Tooltip
    // -----------------------------------------------------------------------

    /// Lay out and show the tooltip of `id` beside `anchor`.
    pub fn show_tooltip<M, H>(
        &mut self,
        id: &str,
        anchor: Rect,
        measure: &M,
        host: &mut H,
    ) -> Option<TooltipLayout>
    where
        M: TextMeasure + ?Sized,
        H: TimelineHost + ?Sized,
    {
        if self.is_destroyed() {
            return None;
        }
        let marker = self.model.get(id)?;
        let layout = self
            .tooltip
            .layout(anchor, self.viewport, &marker.summary, measure);
        host.show_tooltip(id, &layout);
        self.tooltip_for = Some(id.to_string());
        Some(layout)
    }

    pub fn hide_tooltip<H: TimelineHost + ?Sized>(&mut self, host: &mut H) {
        if self.tooltip_for.take().is_some() {
            host.hide_tooltip();
        }
    }

    // -----------------------------------------------------------------------
    // Panel drag and slider
    // -----------------------------------------------------------------------

    pub fn begin_drag(&mut self, pointer: Point, rect: Rect) {
        if !self.is_destroyed() {
            self.drag.begin(pointer, rect);
        }
    }

    pub fn drag_move(&mut self, pointer: Point) -> Option<DragUpdate> {
        if self.is_destroyed() {
            return None;
        }
        self.drag.update(pointer, self.viewport)
    }

    /// Finish the drag: store and report the in-bounds position.
    pub fn end_drag<H: TimelineHost + ?Sized>(&mut self, host: &mut H) -> Option<DragRelease> {
        if self.is_destroyed() {
            return None;
        }
        let release = self.drag.end(self.viewport)?;
        self.position = Some(release.snapshot);
        self.persistence.save(POSITION_KEY, &release.snapshot);
        host.persist_position(&release.snapshot);
        Some(release)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Panel rectangle for the current viewport from the last saved
    /// position. Hosts call this on attach and after viewport resizes.
    pub fn restore_position(&mut self) -> Option<Rect> {
        if self.is_destroyed() {
            return None;
        }
        if self.position.is_none() {
            self.position = self.persistence.load(POSITION_KEY);
        }
        let snapshot = self.position?;
        self.drag.restore(&snapshot, self.viewport)
    }

    /// The track's scroll handle was grabbed or released.
    pub fn set_slider_drag<H: TimelineHost + ?Sized>(&mut self, dragging: bool, host: &mut H) {
        if self.slider_dragging == dragging {
            return;
        }
        self.slider_dragging = dragging;
        if !dragging {
            self.request_frame(host);
        }
    }

    /// Scroll the track to match a dragged thumb. Returns the applied offset.
    pub fn drag_slider_to<H: TimelineHost + ?Sized>(&mut self, thumb_top: f64, host: &mut H) -> f64 {
        if self.is_destroyed() {
            return 0.0;
        }
        let scroll = self.track.scroll_for_thumb_top(thumb_top);
        let applied = self.track.set_track_scroll(scroll);
        self.request_frame(host);
        applied
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    #[must_use]
    pub fn model(&self) -> &MarkerModel {
        &self.model
    }

    #[must_use]
    pub fn geometry(&self) -> &TrackGeometry {
        self.track.geometry()
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active.active_id()
    }

    #[must_use]
    pub fn pending_active_id(&self) -> Option<&str> {
        self.active.pending_id()
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// The marker whose tooltip is showing.
    #[must_use]
    pub fn tooltip_marker(&self) -> Option<&str> {
        self.tooltip_for.as_deref()
    }

    #[must_use]
    pub fn bootstrap_state(&self) -> BootstrapState {
        self.bootstrap.state()
    }

    #[must_use]
    pub fn persistence_enabled(&self) -> bool {
        self.persistence.is_enabled()
    }

    #[must_use]
    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    #[must_use]
    pub fn frame_pending(&self) -> bool {
        self.frame.is_pending()
    }
}
