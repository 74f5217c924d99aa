//! Two-finger pinch zoom over a scrollable pane.
//!
//! While fingers move, the content is only scaled visually about the gesture
//! midpoint. On release the scale is committed, the host re-renders the
//! content at the new scale, and once that render has been laid out the
//! scroll offset is corrected so the point under the midpoint stays put.

use kurbo::{Point, Vec2};
use tracing::debug;

/// Distances below this are treated as a degenerate start.
const MIN_START_DISTANCE: f64 = 1.0;

/// Bounds on the committed render scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self { min: 1.0, max: 3.0 }
    }
}

impl ScaleLimits {
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min > 0.0 && min <= max);
        Self { min, max }
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.min;
        }
        scale.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Idle,
    Tracking,
    LiveScaling,
}

/// Visual-only scale applied during a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveTransform {
    /// Scale relative to the committed render.
    pub ratio: f64,
    /// Transform origin in content-local coordinates.
    pub origin: Point,
}

/// Outcome of a finished gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchCommit {
    pub scale: f64,
    pub ratio: f64,
    /// Scroll offset to apply once the new render is laid out.
    pub scroll: Vec2,
}

/// What the gesture handler needs from the host's scroll container.
pub trait ScrollPane {
    /// Top-left of the pane in viewport coordinates.
    fn pane_offset(&self) -> Point;
    fn scroll(&self) -> Vec2;
    fn set_scroll(&mut self, scroll: Vec2);
    fn set_visual_transform(&mut self, transform: LiveTransform);
    fn clear_visual_transform(&mut self);
    /// Re-render the content at `scale`. Layout completion is reported back
    /// through [`PointerInput::LayoutComplete`].
    fn request_render(&mut self, scale: f64);
}

/// Input events, with touch positions in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    TouchStart(Vec<Point>),
    TouchMove(Vec<Point>),
    /// Touches still down after a finger lifted.
    TouchEnd(Vec<Point>),
    TouchCancel,
    /// Platform pinch gestures (`gesturestart`) that would zoom the whole page.
    NativeGestureStart,
    NativeGestureChange,
    LayoutComplete,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    start_distance: f64,
    midpoint: Point,
    candidate_scale: f64,
    moved: bool,
}

/// Pinch-zoom state machine for one viewer.
#[derive(Debug, Clone)]
pub struct PinchZoom {
    limits: ScaleLimits,
    committed_scale: f64,
    gesture: Option<Gesture>,
    pending_scroll: Option<Vec2>,
}

impl Default for PinchZoom {
    fn default() -> Self {
        Self::new(ScaleLimits::default())
    }
}

fn finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

impl PinchZoom {
    pub fn new(limits: ScaleLimits) -> Self {
        Self {
            limits,
            committed_scale: limits.min,
            gesture: None,
            pending_scroll: None,
        }
    }

    pub fn limits(&self) -> ScaleLimits {
        self.limits
    }

    pub fn committed_scale(&self) -> f64 {
        self.committed_scale
    }

    pub fn phase(&self) -> PinchPhase {
        match self.gesture {
            None => PinchPhase::Idle,
            Some(g) if g.moved => PinchPhase::LiveScaling,
            Some(_) => PinchPhase::Tracking,
        }
    }

    /// Scroll offset waiting for the next layout pass, if any.
    pub fn pending_scroll(&self) -> Option<Vec2> {
        self.pending_scroll
    }

    /// Dispatch one input event. Returns true when the platform's default
    /// handling of the event should be prevented.
    pub fn handle<P: ScrollPane>(&mut self, event: &PointerInput, pane: &mut P) -> bool {
        match event {
            PointerInput::TouchStart(touches) => {
                self.touch_start(touches, pane);
                false
            }
            PointerInput::TouchMove(touches) => self.touch_move(touches, pane),
            PointerInput::TouchEnd(remaining) => {
                self.touch_end(remaining, pane);
                false
            }
            PointerInput::TouchCancel => {
                self.cancel(pane);
                false
            }
            PointerInput::NativeGestureStart | PointerInput::NativeGestureChange => true,
            PointerInput::LayoutComplete => {
                self.after_layout(pane);
                false
            }
        }
    }

    /// Begin tracking when at least two fingers are down.
    pub fn touch_start<P: ScrollPane>(&mut self, touches: &[Point], pane: &mut P) {
        let [a, b] = match touches {
            [a, b, ..] => [*a, *b],
            _ => return,
        };
        if self.gesture.take().is_some() {
            pane.clear_visual_transform();
        }
        if !finite(a) || !finite(b) {
            return;
        }
        let start_distance = a.distance(b);
        if start_distance < MIN_START_DISTANCE {
            debug!("Ignoring pinch start with finger distance {:.3}", start_distance);
            return;
        }
        self.gesture = Some(Gesture {
            start_distance,
            midpoint: a.midpoint(b),
            candidate_scale: self.committed_scale,
            moved: false,
        });
    }

    /// Update the visual scale. Returns true while a gesture is active.
    pub fn touch_move<P: ScrollPane>(&mut self, touches: &[Point], pane: &mut P) -> bool {
        let committed = self.committed_scale;
        let limits = self.limits;
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        let [a, b] = match touches {
            [a, b, ..] => [*a, *b],
            _ => return false,
        };
        if !finite(a) || !finite(b) {
            return true;
        }

        let raw_ratio = a.distance(b) / gesture.start_distance;
        gesture.candidate_scale = limits.clamp(committed * raw_ratio);
        gesture.moved = true;

        let origin = gesture.midpoint - pane.pane_offset().to_vec2() + pane.scroll();
        pane.set_visual_transform(LiveTransform {
            ratio: gesture.candidate_scale / committed,
            origin,
        });
        true
    }

    /// Commit when fewer than two fingers remain.
    pub fn touch_end<P: ScrollPane>(&mut self, remaining: &[Point], pane: &mut P) -> Option<PinchCommit> {
        if remaining.len() >= 2 {
            return None;
        }
        let gesture = self.gesture.take()?;

        let ratio = gesture.candidate_scale / self.committed_scale;
        let offset = gesture.midpoint - pane.pane_offset();
        let scroll = pane.scroll() * ratio + offset * (ratio - 1.0);

        pane.clear_visual_transform();
        self.committed_scale = gesture.candidate_scale;
        self.pending_scroll = Some(scroll);
        pane.request_render(self.committed_scale);

        debug!(
            "Pinch committed: scale={:.3} ratio={:.3} scroll=({:.1}, {:.1})",
            self.committed_scale, ratio, scroll.x, scroll.y
        );
        Some(PinchCommit {
            scale: self.committed_scale,
            ratio,
            scroll,
        })
    }

    /// Abandon the gesture without changing the scale.
    pub fn cancel<P: ScrollPane>(&mut self, pane: &mut P) {
        if self.gesture.take().is_some() {
            pane.clear_visual_transform();
        }
    }

    /// Apply the corrected scroll after the re-render's layout pass, once.
    pub fn after_layout<P: ScrollPane>(&mut self, pane: &mut P) -> Option<Vec2> {
        let scroll = self.pending_scroll.take()?;
        pane.set_scroll(scroll);
        Some(scroll)
    }
}
