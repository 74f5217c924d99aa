//! User settings: colour theme and spec-viewer typography.
//!
//! Settings are a plain value loaded once at startup through a
//! [`KeyValueStore`] and written back whenever they change. Nothing here is
//! global; the shell owns the loaded value and hands it to whoever needs it.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

pub const THEME_KEY: &str = "theme";
pub const TYPOGRAPHY_KEY: &str = "specs-settings";

/// String key-value persistence used for settings and other small records.
pub trait KeyValueStore {
    fn get_value(&self, key: &str) -> Result<Option<String>>;
    fn put_value(&self, key: &str, value: &str) -> Result<()>;
    /// Returns whether a value was removed.
    fn delete_value(&self, key: &str) -> Result<bool>;
}

/// Colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Parse a stored value; anything unrecognised is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    /// Value of the document-level `data-theme` attribute (empty for dark).
    pub fn data_attribute(self) -> &'static str {
        match self {
            Theme::Dark => "",
            Theme::Light => "light",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typography of the markdown spec viewer. Sizes are in rem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub font_size: f64,
    pub line_height: f64,
    pub side_padding: f64,
    pub h1_size: f64,
    pub h2_size: f64,
    pub h3_size: f64,
    pub paragraph_gap: f64,
    pub list_indent: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_size: 0.88,
            line_height: 1.65,
            side_padding: 1.00,
            h1_size: 1.80,
            h2_size: 1.05,
            h3_size: 0.92,
            paragraph_gap: 0.75,
            list_indent: 1.40,
        }
    }
}

/// Slider bounds for one typography field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SliderSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: &'static str,
    pub css_var: &'static str,
}

pub const SLIDERS: [SliderSpec; 8] = [
    SliderSpec { key: "fontSize", label: "Body font size", min: 0.68, max: 1.20, step: 0.01, unit: "rem", css_var: "--sm-fs" },
    SliderSpec { key: "lineHeight", label: "Line height", min: 1.10, max: 2.20, step: 0.05, unit: "", css_var: "--sm-lh" },
    SliderSpec { key: "sidePadding", label: "Side margin", min: 0.00, max: 2.50, step: 0.05, unit: "rem", css_var: "--sm-side" },
    SliderSpec { key: "h1Size", label: "H1 size", min: 1.20, max: 2.80, step: 0.05, unit: "rem", css_var: "--sm-h1" },
    SliderSpec { key: "h2Size", label: "H2 size", min: 0.82, max: 1.60, step: 0.05, unit: "rem", css_var: "--sm-h2" },
    SliderSpec { key: "h3Size", label: "H3 size", min: 0.75, max: 1.40, step: 0.05, unit: "rem", css_var: "--sm-h3" },
    SliderSpec { key: "paragraphGap", label: "Paragraph gap", min: 0.10, max: 1.50, step: 0.05, unit: "rem", css_var: "--sm-pg" },
    SliderSpec { key: "listIndent", label: "List indent", min: 0.50, max: 3.00, step: 0.10, unit: "rem", css_var: "--sm-li" },
];

impl Typography {
    fn values(&self) -> [f64; 8] {
        [
            self.font_size,
            self.line_height,
            self.side_padding,
            self.h1_size,
            self.h2_size,
            self.h3_size,
            self.paragraph_gap,
            self.list_indent,
        ]
    }

    fn fields_mut(&mut self) -> [&mut f64; 8] {
        [
            &mut self.font_size,
            &mut self.line_height,
            &mut self.side_padding,
            &mut self.h1_size,
            &mut self.h2_size,
            &mut self.h3_size,
            &mut self.paragraph_gap,
            &mut self.list_indent,
        ]
    }

    /// Clamp every field into its slider range. Non-finite values reset to the default.
    pub fn clamped(mut self) -> Self {
        let defaults = Typography::default().values();
        for ((field, spec), default) in self.fields_mut().into_iter().zip(SLIDERS.iter()).zip(defaults) {
            *field = if field.is_finite() {
                field.clamp(spec.min, spec.max)
            } else {
                default
            };
        }
        self
    }

    /// CSS custom properties applied to the rendered markdown container.
    pub fn css_vars(&self) -> Vec<(&'static str, String)> {
        SLIDERS
            .iter()
            .zip(self.values())
            .map(|(spec, v)| (spec.css_var, format!("{}{}", v, spec.unit)))
            .collect()
    }

    /// `css_vars` joined into an inline style declaration.
    pub fn css_declarations(&self) -> String {
        self.css_vars()
            .into_iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// All persisted user settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub typography: Typography,
}

impl Settings {
    /// Load settings, falling back to defaults for anything missing or unreadable.
    ///
    /// Only a storage failure is an error; malformed stored values are logged and ignored.
    pub fn load(kv: &impl KeyValueStore) -> Result<Self> {
        let theme = match kv.get_value(THEME_KEY)? {
            Some(raw) => Theme::parse(&raw).unwrap_or_else(|| {
                warn!("Ignoring unknown stored theme {:?}", raw);
                Theme::default()
            }),
            None => Theme::default(),
        };

        let typography = match kv.get_value(TYPOGRAPHY_KEY)? {
            Some(raw) => match serde_json::from_str::<Typography>(&raw) {
                Ok(t) => t.clamped(),
                Err(e) => {
                    warn!("Ignoring unreadable typography settings: {}", e);
                    Typography::default()
                }
            },
            None => Typography::default(),
        };

        debug!("Loaded settings: theme={}", theme);
        Ok(Self { theme, typography })
    }

    /// Persist both entries.
    pub fn save(&self, kv: &impl KeyValueStore) -> Result<()> {
        kv.put_value(THEME_KEY, self.theme.as_str())?;
        kv.put_value(TYPOGRAPHY_KEY, &serde_json::to_string(&self.typography)?)?;
        Ok(())
    }

    /// Flip the theme and persist the change.
    ///
    /// The in-memory value only changes once the write succeeded.
    pub fn toggle_theme(&mut self, kv: &impl KeyValueStore) -> Result<Theme> {
        let next = self.theme.toggled();
        kv.put_value(THEME_KEY, next.as_str())?;
        self.theme = next;
        Ok(next)
    }

    /// Replace typography (clamped) and persist the change.
    pub fn set_typography(&mut self, typography: Typography, kv: &impl KeyValueStore) -> Result<Typography> {
        let next = typography.clamped();
        kv.put_value(TYPOGRAPHY_KEY, &serde_json::to_string(&next)?)?;
        self.typography = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryKv(RefCell<HashMap<String, String>>);

    impl KeyValueStore for MemoryKv {
        fn get_value(&self, key: &str) -> Result<Option<String>> {
            Ok(self.0.borrow().get(key).cloned())
        }
        fn put_value(&self, key: &str, value: &str) -> Result<()> {
            self.0.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }
        fn delete_value(&self, key: &str) -> Result<bool> {
            Ok(self.0.borrow_mut().remove(key).is_some())
        }
    }

    struct FailingKv;

    impl KeyValueStore for FailingKv {
        fn get_value(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn put_value(&self, key: &str, _value: &str) -> Result<()> {
            Err(crate::Error::StorageUnavailable(format!("cannot write {}", key)))
        }
        fn delete_value(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_failed_write_leaves_settings_unchanged() {
        let mut settings = Settings::default();
        assert!(settings.toggle_theme(&FailingKv).is_err());
        assert_eq!(settings.theme, Theme::Dark);

        let wide = Typography { font_size: 1.1, ..Default::default() };
        assert!(settings.set_typography(wide, &FailingKv).is_err());
        assert_eq!(settings.typography, Typography::default());
    }

    #[test]
    fn test_defaults_when_empty() {
        let kv = MemoryKv::default();
        let settings = Settings::load(&kv).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn test_round_trip() {
        let kv = MemoryKv::default();
        let mut settings = Settings::default();
        settings.toggle_theme(&kv).unwrap();
        settings
            .set_typography(Typography { font_size: 1.0, ..Default::default() }, &kv)
            .unwrap();

        let loaded = Settings::load(&kv).unwrap();
        assert_eq!(loaded.theme, Theme::Light);
        assert_eq!(loaded.typography.font_size, 1.0);
    }

    #[test]
    fn test_partial_typography_merges_defaults() {
        let kv = MemoryKv::default();
        kv.put_value(TYPOGRAPHY_KEY, r#"{"lineHeight": 2.0}"#).unwrap();
        let loaded = Settings::load(&kv).unwrap();
        assert_eq!(loaded.typography.line_height, 2.0);
        assert_eq!(loaded.typography.font_size, 0.88);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let kv = MemoryKv::default();
        kv.put_value(TYPOGRAPHY_KEY, r#"{"fontSize": 9.0, "listIndent": -1}"#).unwrap();
        let loaded = Settings::load(&kv).unwrap();
        assert_eq!(loaded.typography.font_size, 1.20);
        assert_eq!(loaded.typography.list_indent, 0.50);
    }

    #[test]
    fn test_garbage_falls_back() {
        let kv = MemoryKv::default();
        kv.put_value(THEME_KEY, "sepia").unwrap();
        kv.put_value(TYPOGRAPHY_KEY, "not json").unwrap();
        let loaded = Settings::load(&kv).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_css_vars() {
        let vars = Typography::default().css_vars();
        assert_eq!(vars[0], ("--sm-fs", "0.88rem".to_string()));
        assert_eq!(vars[1], ("--sm-lh", "1.65".to_string()));
        assert!(Typography::default().css_declarations().contains("--sm-li: 1.4rem;"));
    }
}
