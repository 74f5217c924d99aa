//! Registries for the shell's home screen and the spec viewer.

use serde::Serialize;

/// One tool listed on the home screen.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AppEntry {
    pub name: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

pub const APPS: &[AppEntry] = &[
    AppEntry { name: "Countdown", path: "/countdown", description: "Countdown timer" },
    AppEntry { name: "Pomodoro", path: "/pomodoro", description: "Work/break interval timer" },
    AppEntry { name: "Notes", path: "/notes", description: "Scratch notes pad" },
    AppEntry { name: "PDF Viewer", path: "/pdf", description: "PDF library with Q&A notes" },
    AppEntry { name: "Options Lab", path: "/options", description: "Black-Scholes pricer and greeks" },
    AppEntry { name: "Rainfall", path: "/rainfall", description: "Monthly rainfall distributions" },
    AppEntry { name: "Research", path: "/research", description: "Literature search" },
    AppEntry { name: "Specs", path: "/specs", description: "Markdown spec viewer" },
];

/// A markdown document available in the spec viewer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpecEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

pub const SPECS: &[SpecEntry] = &[
    SpecEntry { key: "global-styles", label: "Global Styles", icon: "🎨" },
    SpecEntry { key: "pdf-viewer", label: "PDF Viewer", icon: "📄" },
    SpecEntry { key: "research", label: "Research", icon: "🔬" },
];

pub fn find_app(path: &str) -> Option<&'static AppEntry> {
    APPS.iter().find(|a| a.path == path)
}

pub fn find_spec(key: &str) -> Option<&'static SpecEntry> {
    SPECS.iter().find(|s| s.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_unique() {
        let mut paths: Vec<_> = APPS.iter().map(|a| a.path).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), APPS.len());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(find_app("/pdf").unwrap().name, "PDF Viewer");
        assert!(find_spec("research").is_some());
        assert!(find_spec("../etc/passwd").is_none());
    }
}
