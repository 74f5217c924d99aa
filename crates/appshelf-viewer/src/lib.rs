//! Document viewer interaction: pinch zoom, resize handling, layout.

pub mod layout;
pub mod pinch;
pub mod resize;

pub use layout::{format_size, ViewerLayout, SIDEBAR_WIDTH};
pub use pinch::{LiveTransform, PinchCommit, PinchPhase, PinchZoom, PointerInput, ScaleLimits, ScrollPane};
pub use resize::ResizeTracker;
