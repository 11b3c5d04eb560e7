//! Temporal range control.
//!
//! Two handles live on a normalized track `[0, 100]` that maps linearly onto
//! a fixed timestamp domain. Dragging is an explicit state machine; the
//! control enforces `start + min_gap <= end` after every gesture step and
//! reports the new `[start, end]` pair on every pointer move.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DAY_MS, DEFAULT_DOMAIN_DAYS, DEFAULT_WINDOW_DAYS, MIN_GAP, POSITION_MAX, POSITION_MIN,
};
use crate::time::Timestamp;

/// Inclusive timestamp interval, `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(a: Timestamp, b: Timestamp) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Fixed timestamp domain backing the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDomain {
    start: Timestamp,
    end: Timestamp,
}

impl TimeDomain {
    /// A zero-width domain is widened to one millisecond so the mapping
    /// stays invertible.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        let range = TimeRange::new(start, end);
        Self {
            start: range.start,
            end: range.end.max(range.start + 1),
        }
    }

    /// One year ending at `now`.
    pub fn last_year(now: Timestamp) -> Self {
        Self::new(now - DEFAULT_DOMAIN_DAYS * DAY_MS, now)
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn as_range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }

    fn span(&self) -> f64 {
        (self.end - self.start) as f64
    }

    /// Timestamp → track position. Out-of-domain dates clamp to the ends.
    pub fn date_to_position(&self, ts: Timestamp) -> f64 {
        let ts = ts.clamp(self.start, self.end);
        (ts - self.start) as f64 / self.span() * POSITION_MAX
    }

    /// Track position → timestamp, rounded to the nearest millisecond.
    pub fn position_to_date(&self, pos: f64) -> Timestamp {
        let pos = clamp(pos, POSITION_MIN, POSITION_MAX);
        let offset = (pos / POSITION_MAX * self.span()).round() as i64;
        (self.start + offset).clamp(self.start, self.end)
    }

    /// Clamp a range into the domain.
    pub fn clamp_range(&self, range: TimeRange) -> TimeRange {
        TimeRange::new(
            range.start.clamp(self.start, self.end),
            range.end.clamp(self.start, self.end),
        )
    }
}

/// `f64::clamp` panics when `lo > hi`; handle positions never should, but a
/// degenerate gap must not abort a gesture.
fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Which part of the control a drag grabbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Start,
    End,
    /// The band between the handles; moves the whole window.
    Range,
}

/// Drag gesture state. Anchors are captured on entry so a gesture never
/// accumulates clamping error across moves.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    DraggingStart {
        anchor_pointer: f64,
        anchor_start: f64,
    },
    DraggingEnd {
        anchor_pointer: f64,
        anchor_end: f64,
    },
    DraggingRange {
        anchor_pointer: f64,
        anchor_start: f64,
        width: f64,
    },
}

impl Handle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" => Some(Handle::Start),
            "end" => Some(Handle::End),
            "range" => Some(Handle::Range),
            _ => None,
        }
    }
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        !matches!(self, DragState::Idle)
    }
}

/// Quick-select windows ending at the domain end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    LastWeek,
    LastMonth,
    LastQuarter,
    All,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::LastWeek,
        Preset::LastMonth,
        Preset::LastQuarter,
        Preset::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::LastWeek => "last-week",
            Preset::LastMonth => "last-month",
            Preset::LastQuarter => "last-quarter",
            Preset::All => "all",
        }
    }

    /// Accepts both `last-week` and `last_week`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    fn days(self) -> Option<i64> {
        match self {
            Preset::LastWeek => Some(7),
            Preset::LastMonth => Some(DEFAULT_WINDOW_DAYS),
            Preset::LastQuarter => Some(90),
            Preset::All => None,
        }
    }
}

/// Pixel geometry of the rendered track, for converting pointer events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub left_px: f64,
    pub width_px: f64,
}

impl Track {
    pub fn to_position(&self, x_px: f64) -> f64 {
        if self.width_px <= 0.0 {
            return POSITION_MIN;
        }
        clamp(
            (x_px - self.left_px) / self.width_px * POSITION_MAX,
            POSITION_MIN,
            POSITION_MAX,
        )
    }
}

type ChangeListener = Box<dyn FnMut(TimeRange) + Send>;

pub struct RangeControl {
    domain: TimeDomain,
    start_pos: f64,
    end_pos: f64,
    min_gap: f64,
    drag: DragState,
    on_change: Option<ChangeListener>,
}

impl fmt::Debug for RangeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeControl")
            .field("domain", &self.domain)
            .field("start_pos", &self.start_pos)
            .field("end_pos", &self.end_pos)
            .field("min_gap", &self.min_gap)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl RangeControl {
    /// New control showing the default window.
    pub fn new(domain: TimeDomain) -> Self {
        let mut control = Self {
            domain,
            start_pos: POSITION_MIN,
            end_pos: POSITION_MAX,
            min_gap: MIN_GAP,
            drag: DragState::Idle,
            on_change: None,
        };
        control.place(control.default_window());
        control
    }

    /// Start from explicit handle positions. Positions are normalized the
    /// same way a drag would leave them.
    pub fn with_positions(mut self, start_pos: f64, end_pos: f64) -> Self {
        let (lo, hi) = if start_pos <= end_pos {
            (start_pos, end_pos)
        } else {
            (end_pos, start_pos)
        };
        self.start_pos = clamp(lo, POSITION_MIN, POSITION_MAX);
        self.end_pos = clamp(hi, POSITION_MIN, POSITION_MAX);
        self.enforce_gap();
        self
    }

    /// Register the listener fired on every range change.
    pub fn set_on_change(&mut self, listener: impl FnMut(TimeRange) + Send + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    pub fn domain(&self) -> TimeDomain {
        self.domain
    }

    pub fn start_pos(&self) -> f64 {
        self.start_pos
    }

    pub fn end_pos(&self) -> f64 {
        self.end_pos
    }

    pub fn min_gap(&self) -> f64 {
        self.min_gap
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(
            self.domain.position_to_date(self.start_pos),
            self.domain.position_to_date(self.end_pos),
        )
    }

    /// Enter a drag. Refused while another drag holds the pointer.
    pub fn begin_drag(&mut self, handle: Handle, pointer_pos: f64) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        let anchor_pointer = clamp(pointer_pos, POSITION_MIN, POSITION_MAX);
        self.drag = match handle {
            Handle::Start => DragState::DraggingStart {
                anchor_pointer,
                anchor_start: self.start_pos,
            },
            Handle::End => DragState::DraggingEnd {
                anchor_pointer,
                anchor_end: self.end_pos,
            },
            Handle::Range => DragState::DraggingRange {
                anchor_pointer,
                anchor_start: self.start_pos,
                width: self.end_pos - self.start_pos,
            },
        };
        true
    }

    /// Apply a pointer move. Returns the live range, or `None` when idle.
    pub fn move_pointer(&mut self, pointer_pos: f64) -> Option<TimeRange> {
        let pointer = clamp(pointer_pos, POSITION_MIN, POSITION_MAX);
        match self.drag {
            DragState::Idle => return None,
            DragState::DraggingStart {
                anchor_pointer,
                anchor_start,
            } => {
                let candidate = anchor_start + (pointer - anchor_pointer);
                self.start_pos = clamp(candidate, POSITION_MIN, self.end_pos - self.min_gap);
            }
            DragState::DraggingEnd {
                anchor_pointer,
                anchor_end,
            } => {
                let candidate = anchor_end + (pointer - anchor_pointer);
                self.end_pos = clamp(candidate, self.start_pos + self.min_gap, POSITION_MAX);
            }
            DragState::DraggingRange {
                anchor_pointer,
                anchor_start,
                width,
            } => {
                let candidate = anchor_start + (pointer - anchor_pointer);
                self.start_pos = clamp(candidate, POSITION_MIN, POSITION_MAX - width);
                self.end_pos = self.start_pos + width;
            }
        }
        let range = self.range();
        self.emit(range);
        Some(range)
    }

    /// Leave the drag. Returns the finalized range, or `None` when idle.
    pub fn end_drag(&mut self) -> Option<TimeRange> {
        if !self.drag.is_dragging() {
            return None;
        }
        self.drag = DragState::Idle;
        Some(self.range())
    }

    /// Restore the default window (last 30 days of the domain).
    pub fn reset(&mut self) -> TimeRange {
        self.drag = DragState::Idle;
        self.set_range(self.default_window())
    }

    pub fn apply_preset(&mut self, preset: Preset) -> TimeRange {
        let range = match preset.days() {
            Some(days) => TimeRange::new(self.domain.end() - days * DAY_MS, self.domain.end()),
            None => self.domain.as_range(),
        };
        self.set_range(range)
    }

    /// Place the handles on a range, clamped to the domain with the gap
    /// enforced. Fires the change listener.
    pub fn set_range(&mut self, range: TimeRange) -> TimeRange {
        self.place(range);
        let range = self.range();
        self.emit(range);
        range
    }

    fn default_window(&self) -> TimeRange {
        TimeRange::new(
            self.domain.end() - DEFAULT_WINDOW_DAYS * DAY_MS,
            self.domain.end(),
        )
    }

    fn place(&mut self, range: TimeRange) {
        let range = self.domain.clamp_range(range);
        self.start_pos = self.domain.date_to_position(range.start);
        self.end_pos = self.domain.date_to_position(range.end);
        self.enforce_gap();
    }

    /// Widen a too-narrow window backwards, or forwards at the track start.
    fn enforce_gap(&mut self) {
        if self.end_pos - self.start_pos >= self.min_gap {
            return;
        }
        self.start_pos = self.end_pos - self.min_gap;
        if self.start_pos < POSITION_MIN {
            self.start_pos = POSITION_MIN;
            self.end_pos = self.min_gap;
        }
    }

    fn emit(&mut self, range: TimeRange) {
        if let Some(listener) = self.on_change.as_mut() {
            listener(range);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::{Arc, Mutex};

    const NOW: Timestamp = 1_771_632_000_000;

    fn control(start: f64, end: f64) -> RangeControl {
        RangeControl::new(TimeDomain::last_year(NOW)).with_positions(start, end)
    }

    #[test]
    fn test_start_handle_clamped_against_end() {
        let mut c = control(20.0, 50.0);
        assert!(c.begin_drag(Handle::Start, 20.0));
        c.move_pointer(90.0);
        assert_abs_diff_eq!(c.start_pos(), 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.end_pos(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_start_handle_clamped_at_zero() {
        let mut c = control(20.0, 50.0);
        c.begin_drag(Handle::Start, 20.0);
        c.move_pointer(-40.0);
        assert_abs_diff_eq!(c.start_pos(), 0.0);
    }

    #[test]
    fn test_end_handle_clamped_both_ways() {
        let mut c = control(20.0, 50.0);
        c.begin_drag(Handle::End, 50.0);
        c.move_pointer(0.0);
        assert_abs_diff_eq!(c.end_pos(), 25.0, epsilon = 1e-9);
        c.move_pointer(100.0);
        assert_abs_diff_eq!(c.end_pos(), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.start_pos(), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_range_drag_preserves_width() {
        let mut c = control(20.0, 50.0);
        c.begin_drag(Handle::Range, 30.0);
        c.move_pointer(60.0);
        assert_abs_diff_eq!(c.start_pos(), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.end_pos(), 80.0, epsilon = 1e-9);

        c.move_pointer(100.0);
        assert_abs_diff_eq!(c.start_pos(), 70.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.end_pos(), 100.0, epsilon = 1e-9);

        c.move_pointer(0.0);
        assert_abs_diff_eq!(c.start_pos(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.end_pos(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_anchor_prevents_clamp_drift() {
        let mut c = control(20.0, 50.0);
        c.begin_drag(Handle::Start, 20.0);
        c.move_pointer(95.0);
        c.move_pointer(25.0);
        assert_abs_diff_eq!(c.start_pos(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_every_move_fires_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut c = control(20.0, 50.0);
        c.set_on_change(move |r| sink.lock().unwrap().push(r));

        c.begin_drag(Handle::End, 50.0);
        c.move_pointer(55.0);
        c.move_pointer(60.0);
        c.move_pointer(65.0);
        let finished = c.end_drag().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(*seen.last().unwrap(), finished);
    }

    #[test]
    fn test_second_drag_refused_while_dragging() {
        let mut c = control(20.0, 50.0);
        assert!(c.begin_drag(Handle::Start, 20.0));
        assert!(!c.begin_drag(Handle::End, 50.0));
        assert!(matches!(c.drag_state(), DragState::DraggingStart { .. }));
        c.end_drag();
        assert!(c.begin_drag(Handle::End, 50.0));
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let mut c = control(20.0, 50.0);
        assert_eq!(c.move_pointer(80.0), None);
        assert_eq!(c.end_drag(), None);
        assert_abs_diff_eq!(c.start_pos(), 20.0);
    }

    #[test]
    fn test_position_date_roundtrip() {
        let d = TimeDomain::last_year(NOW);
        for offset in [0, 1, 999, 86_400_123, 200 * DAY_MS + 17, 365 * DAY_MS] {
            let ts = d.start() + offset;
            let back = d.position_to_date(d.date_to_position(ts));
            assert!((back - ts).abs() <= 1, "{ts} -> {back}");
        }
    }

    #[test]
    fn test_mapping_clamps_outside_domain() {
        let d = TimeDomain::last_year(NOW);
        assert_abs_diff_eq!(d.date_to_position(d.start() - DAY_MS), 0.0);
        assert_abs_diff_eq!(d.date_to_position(d.end() + DAY_MS), 100.0);
        assert_eq!(d.position_to_date(-5.0), d.start());
        assert_eq!(d.position_to_date(250.0), d.end());
    }

    #[test]
    fn test_reset_restores_last_30_days() {
        let mut c = control(0.0, 10.0);
        let r = c.reset();
        assert_eq!(r.end, NOW);
        assert!((r.start - (NOW - 30 * DAY_MS)).abs() <= 1);
        assert!(!c.drag_state().is_dragging());
    }

    #[test]
    fn test_reset_cancels_drag() {
        let mut c = control(20.0, 50.0);
        c.begin_drag(Handle::Range, 30.0);
        c.reset();
        assert_eq!(c.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_preset_all_covers_domain() {
        let mut c = control(20.0, 50.0);
        let r = c.apply_preset(Preset::All);
        assert_eq!(r, c.domain().as_range());
    }

    #[test]
    fn test_set_range_widens_narrow_window() {
        let mut c = control(20.0, 50.0);
        let r = c.set_range(TimeRange::new(NOW - DAY_MS, NOW));
        assert_abs_diff_eq!(c.end_pos() - c.start_pos(), MIN_GAP, epsilon = 1e-9);
        assert_eq!(r.end, NOW);
    }

    #[test]
    fn test_narrow_window_at_track_start_widens_forward() {
        let c = control(0.0, 1.0);
        assert_abs_diff_eq!(c.start_pos(), 0.0);
        assert_abs_diff_eq!(c.end_pos(), MIN_GAP);
    }

    #[test]
    fn test_track_pixel_conversion() {
        let t = Track {
            left_px: 100.0,
            width_px: 400.0,
        };
        assert_abs_diff_eq!(t.to_position(300.0), 50.0);
        assert_abs_diff_eq!(t.to_position(0.0), 0.0);
        assert_abs_diff_eq!(t.to_position(900.0), 100.0);

        let degenerate = Track {
            left_px: 0.0,
            width_px: 0.0,
        };
        assert_abs_diff_eq!(degenerate.to_position(10.0), 0.0);
    }

    #[test]
    fn test_reversed_time_range_is_ordered() {
        let r = TimeRange::new(10, 5);
        assert_eq!((r.start, r.end), (5, 10));
        assert!(r.contains(7));
        assert!(!r.contains(11));
    }

    #[test]
    fn test_preset_and_handle_names() {
        for preset in Preset::ALL {
            assert_eq!(Preset::parse(preset.as_str()), Some(preset));
        }
        assert_eq!(Preset::parse("LAST_QUARTER"), Some(Preset::LastQuarter));
        assert_eq!(Preset::parse("yesterday"), None);
        assert_eq!(Handle::parse(" Range"), Some(Handle::Range));
        assert_eq!(Handle::parse("middle"), None);
    }
}
