use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{BACKGROUND, RenderMode, Scene, Surface};
use crate::constants::MIN_FRAME_INTERVAL_MS;
use crate::ranking::ResultRecord;
use crate::time::Timestamp;
use crate::timeline::TimeRange;

/// Handle to one radar animation session.
///
/// The host's frame loop holds a clone and stops once `on_frame` reports
/// [`FrameOutcome::Stopped`]. Cancelling is idempotent and visible from
/// every clone immediately.
#[derive(Clone, Debug)]
pub struct AnimationToken {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl AnimationToken {
    fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[derive(Clone, Debug)]
pub enum ViewState {
    Static,
    Animating {
        token: AnimationToken,
        last_frame: Timestamp,
    },
}

/// What the host has to do after a mode switch.
#[derive(Clone, Debug)]
pub enum ModeChange {
    Unchanged,
    /// Drawn once, nothing to schedule.
    Static,
    /// Start a frame loop driving `on_frame` with this token.
    StartAnimation(AnimationToken),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// Too soon after the previous frame; try again on the next tick.
    Throttled,
    /// The token was cancelled or replaced. Stop the loop.
    Stopped,
}

/// Owns the surface, the current mode and the data being shown.
pub struct SpatialView<S: Surface> {
    surface: S,
    mode: RenderMode,
    results: Vec<ResultRecord>,
    time_range: Option<TimeRange>,
    scene: Scene,
    state: ViewState,
    next_token: u64,
    redraws: u64,
}

impl<S: Surface> SpatialView<S> {
    /// Starts in the default (static) mode. Nothing is drawn until the
    /// first mode switch, data change or resize.
    pub fn new(surface: S) -> Self {
        let scene = Scene::build(&[], None, surface.dimensions());
        Self {
            surface,
            mode: RenderMode::default(),
            results: Vec::new(),
            time_range: None,
            scene,
            state: ViewState::Static,
            next_token: 0,
            redraws: 0,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Frames painted since construction.
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, ViewState::Animating { .. })
    }

    /// Switch modes. Any running animation is cancelled before the new mode
    /// paints its first frame.
    pub fn set_mode(&mut self, mode: RenderMode, now: Timestamp) -> ModeChange {
        if mode == self.mode && (self.is_animating() || !mode.is_animated()) {
            return ModeChange::Unchanged;
        }

        self.stop_animation();
        self.mode = mode;

        if mode.is_animated() {
            self.next_token += 1;
            let token = AnimationToken::new(self.next_token);
            self.state = ViewState::Animating {
                token: token.clone(),
                last_frame: now,
            };
            self.redraw(now);
            ModeChange::StartAnimation(token)
        } else {
            self.redraw(now);
            ModeChange::Static
        }
    }

    pub fn set_results(&mut self, results: Vec<ResultRecord>, now: Timestamp) {
        self.results = results;
        self.refresh(now);
    }

    pub fn set_time_range(&mut self, range: Option<TimeRange>, now: Timestamp) {
        self.time_range = range;
        self.refresh(now);
    }

    /// Pick up the surface's new size and paint one frame right away, in
    /// every mode.
    pub fn resize(&mut self, width: f64, height: f64, now: Timestamp) {
        self.surface.resize(width, height);
        self.rebuild_scene();
        self.redraw(now);
        if let ViewState::Animating { last_frame, .. } = &mut self.state {
            *last_frame = now;
        }
    }

    /// Advance the animation. Never draws for a cancelled or superseded
    /// token.
    pub fn on_frame(&mut self, token: &AnimationToken, now: Timestamp) -> FrameOutcome {
        if token.is_cancelled() {
            return FrameOutcome::Stopped;
        }
        let ViewState::Animating {
            token: current,
            last_frame,
        } = &mut self.state
        else {
            return FrameOutcome::Stopped;
        };
        if current.id != token.id {
            return FrameOutcome::Stopped;
        }
        if now - *last_frame < MIN_FRAME_INTERVAL_MS {
            return FrameOutcome::Throttled;
        }
        *last_frame = now;
        self.redraw(now);
        FrameOutcome::Drawn
    }

    /// Stop animating. The view stays usable; a later `set_mode` can start
    /// a fresh animation.
    pub fn teardown(&mut self) {
        self.stop_animation();
    }

    fn stop_animation(&mut self) {
        if let ViewState::Animating { token, .. } = &self.state {
            token.cancel();
        }
        self.state = ViewState::Static;
    }

    fn refresh(&mut self, now: Timestamp) {
        self.rebuild_scene();
        // A running animation shows the new data on its next frame.
        if !self.is_animating() {
            self.redraw(now);
        }
    }

    fn rebuild_scene(&mut self) {
        self.scene = Scene::build(&self.results, self.time_range, self.surface.dimensions());
    }

    fn redraw(&mut self, now: Timestamp) {
        self.surface.clear(BACKGROUND);
        self.mode.renderer().draw(&self.scene, &mut self.surface, now);
        self.redraws += 1;
    }
}

impl<S: Surface> Drop for SpatialView<S> {
    fn drop(&mut self) {
        self.stop_animation();
    }
}
