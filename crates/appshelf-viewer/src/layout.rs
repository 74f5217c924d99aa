//! Viewer geometry and labels.

use serde::Serialize;

/// Width of the notes sidebar when open.
pub const SIDEBAR_WIDTH: f64 = 44.0;

/// Width available to the page, given the viewer width and sidebar state.
pub fn effective_width(viewer_width: f64, sidebar_open: bool) -> f64 {
    let width = if sidebar_open {
        viewer_width - SIDEBAR_WIDTH
    } else {
        viewer_width
    };
    width.max(0.0)
}

/// Pixel width to render pages at for the committed scale.
pub fn page_render_width(viewer_width: f64, sidebar_open: bool, scale: f64) -> f64 {
    effective_width(viewer_width, sidebar_open) * scale
}

/// Vertical offset for a note created by tapping the sidebar at `tap_y`.
pub fn annotation_offset(tap_y: f64, pane_top: f64, scroll_top: f64) -> f64 {
    (tap_y - pane_top + scroll_top).max(0.0)
}

/// `"312 KB"` below one MiB, `"4.2 MB"` above.
pub fn format_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes < MIB {
        format!("{} KB", (bytes / 1024.0).round())
    } else {
        format!("{:.1} MB", bytes / MIB)
    }
}

/// Library listing line under a document name.
pub fn document_summary(page_count: i64, size_bytes: u64) -> String {
    if page_count > 0 {
        format!("{} pages · {}", page_count, format_size(size_bytes))
    } else {
        format_size(size_bytes)
    }
}

/// Snapshot of viewer layout handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerLayout {
    pub viewer_width: f64,
    pub sidebar_open: bool,
    pub scale: f64,
    pub page_width: f64,
}

impl ViewerLayout {
    pub fn new(viewer_width: f64, sidebar_open: bool, scale: f64) -> Self {
        Self {
            viewer_width,
            sidebar_open,
            scale,
            page_width: page_render_width(viewer_width, sidebar_open, scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_width() {
        assert_eq!(page_render_width(400.0, false, 1.0), 400.0);
        assert_eq!(page_render_width(400.0, true, 2.0), 712.0);
        assert_eq!(ViewerLayout::new(30.0, true, 1.0).page_width, 0.0);
    }

    #[test]
    fn test_annotation_offset() {
        assert_eq!(annotation_offset(300.0, 60.0, 1000.0), 1240.0);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(10), "0 KB");
        assert_eq!(format_size(1536), "2 KB");
        assert_eq!(format_size(512 * 1024), "512 KB");
        assert_eq!(format_size(3 * 1024 * 1024 + 300 * 1024), "3.3 MB");
        assert_eq!(document_summary(12, 2048), "12 pages · 2 KB");
        assert_eq!(document_summary(0, 2048), "2 KB");
    }
}
