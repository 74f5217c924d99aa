//! Keep the reading position when the viewer changes width.

use kurbo::Vec2;
use tracing::debug;

use crate::pinch::ScrollPane;

/// Scales the scroll offset by `new_width / old_width` on resize and applies
/// it after the next layout pass.
#[derive(Debug, Clone)]
pub struct ResizeTracker {
    width: f64,
    pending_scroll: Option<Vec2>,
}

impl ResizeTracker {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            pending_scroll: None,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn pending_scroll(&self) -> Option<Vec2> {
        self.pending_scroll
    }

    /// Record a new viewer width. Returns true when a scroll correction was scheduled.
    pub fn on_resize<P: ScrollPane>(&mut self, new_width: f64, pane: &P) -> bool {
        if !new_width.is_finite() || new_width <= 0.0 {
            return false;
        }
        let old_width = self.width;
        self.width = new_width;
        if new_width == old_width || old_width <= 0.0 {
            return false;
        }

        let ratio = new_width / old_width;
        self.pending_scroll = Some(pane.scroll() * ratio);
        debug!("Viewer resized {:.0} -> {:.0}, scroll ratio {:.3}", old_width, new_width, ratio);
        true
    }

    pub fn after_layout<P: ScrollPane>(&mut self, pane: &mut P) -> Option<Vec2> {
        let scroll = self.pending_scroll.take()?;
        pane.set_scroll(scroll);
        Some(scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinch::tests::FakePane;
    use kurbo::Point;

    #[test]
    fn test_scroll_scales_with_width() {
        let mut pane = FakePane::new(Point::ORIGIN, Vec2::new(20.0, 600.0));
        let mut tracker = ResizeTracker::new(400.0);

        assert!(tracker.on_resize(800.0, &pane));
        assert_eq!(pane.scroll_sets, 0);
        assert_eq!(tracker.after_layout(&mut pane), Some(Vec2::new(40.0, 1200.0)));
        assert_eq!(tracker.after_layout(&mut pane), None);
        assert_eq!(pane.scroll_sets, 1);
        assert_eq!(tracker.width(), 800.0);
    }

    #[test]
    fn test_same_width_is_noop() {
        let pane = FakePane::new(Point::ORIGIN, Vec2::new(0.0, 100.0));
        let mut tracker = ResizeTracker::new(400.0);
        assert!(!tracker.on_resize(400.0, &pane));
        assert!(!tracker.on_resize(0.0, &pane));
        assert!(tracker.pending_scroll().is_none());
    }
}
