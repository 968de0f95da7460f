//! Theme system for the Flightdeck TUI.
//!
//! Themes are plain values: constructed once at startup (from the CLI flag
//! or the config file) and passed into the model and render functions.
//! Nothing here is global or mutable after construction.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Theme name identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    /// Default palette
    #[default]
    Default,
    /// Dark palette (enhanced contrast)
    Dark,
    /// Light palette (for bright environments)
    Light,
    /// Minimal palette (reduced color use)
    Minimal,
}

impl ThemeName {
    /// Get the display name for this theme.
    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeName::Default => "Default",
            ThemeName::Dark => "Dark",
            ThemeName::Light => "Light",
            ThemeName::Minimal => "Minimal",
        }
    }

    /// Parse a theme name from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" => Some(ThemeName::Default),
            "dark" => Some(ThemeName::Dark),
            "light" => Some(ThemeName::Light),
            "minimal" => Some(ThemeName::Minimal),
            _ => None,
        }
    }
}

/// Color palette for a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeColors {
    /// Primary headers and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, dim info)
    pub text_dim: Color,
    /// Unfocused borders
    pub border_dim: Color,
    /// Selected menu / list row
    pub selection: Color,
    /// Status: success / completed step
    pub status_ok: Color,
    /// Status: warning / in-progress step
    pub status_warning: Color,
    /// Status: error / failed step
    pub status_error: Color,
}

/// Complete theme definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: ThemeName,
    pub colors: ThemeColors,
}

impl Theme {
    /// Resolve a theme by name.
    pub fn named(name: ThemeName) -> Self {
        match name {
            ThemeName::Default => Self::default_theme(),
            ThemeName::Dark => Self::dark_theme(),
            ThemeName::Light => Self::light_theme(),
            ThemeName::Minimal => Self::minimal_theme(),
        }
    }

    pub fn default_theme() -> Self {
        Self {
            name: ThemeName::Default,
            colors: ThemeColors {
                header: Color::Cyan,
                hotkey: Color::Yellow,
                text: Color::White,
                text_dim: Color::Gray,
                border_dim: Color::DarkGray,
                selection: Color::Cyan,
                status_ok: Color::Green,
                status_warning: Color::Yellow,
                status_error: Color::Red,
            },
        }
    }

    pub fn dark_theme() -> Self {
        Self {
            name: ThemeName::Dark,
            colors: ThemeColors {
                header: Color::LightBlue,
                hotkey: Color::LightYellow,
                text: Color::White,
                text_dim: Color::DarkGray,
                border_dim: Color::Black,
                selection: Color::LightYellow,
                status_ok: Color::LightGreen,
                status_warning: Color::LightYellow,
                status_error: Color::LightRed,
            },
        }
    }

    pub fn light_theme() -> Self {
        Self {
            name: ThemeName::Light,
            colors: ThemeColors {
                header: Color::Blue,
                hotkey: Color::Magenta,
                text: Color::Black,
                text_dim: Color::DarkGray,
                border_dim: Color::Gray,
                selection: Color::Blue,
                status_ok: Color::Green,
                status_warning: Color::Rgb(180, 120, 0),
                status_error: Color::Red,
            },
        }
    }

    pub fn minimal_theme() -> Self {
        Self {
            name: ThemeName::Minimal,
            colors: ThemeColors {
                header: Color::White,
                hotkey: Color::White,
                text: Color::White,
                text_dim: Color::Gray,
                border_dim: Color::DarkGray,
                selection: Color::White,
                status_ok: Color::White,
                status_warning: Color::Gray,
                status_error: Color::White,
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

/// Persisted theme choice.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ThemeConfig {
    theme: ThemeName,
}

/// Config file path (`~/.flightdeck/theme.json`).
fn config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".flightdeck").join("theme.json"))
}

/// Load the configured theme, preferring an explicit CLI override. Falls
/// back to the default theme when neither is present or the file is
/// unreadable.
pub fn load_theme(cli_override: Option<&str>) -> Theme {
    if let Some(name) = cli_override.and_then(ThemeName::parse) {
        return Theme::named(name);
    }

    let from_config = config_path()
        .and_then(|path| fs::read_to_string(path).ok())
        .and_then(|raw| serde_json::from_str::<ThemeConfig>(&raw).ok())
        .map(|cfg| cfg.theme);

    Theme::named(from_config.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_name_parsing() {
        assert_eq!(ThemeName::parse("dark"), Some(ThemeName::Dark));
        assert_eq!(ThemeName::parse("DARK"), Some(ThemeName::Dark));
        assert_eq!(ThemeName::parse("minimal"), Some(ThemeName::Minimal));
        assert_eq!(ThemeName::parse("neon"), None);
    }

    #[test]
    fn test_named_round_trip() {
        for name in [
            ThemeName::Default,
            ThemeName::Dark,
            ThemeName::Light,
            ThemeName::Minimal,
        ] {
            assert_eq!(Theme::named(name).name, name);
        }
    }

    #[test]
    fn test_cli_override_wins() {
        let theme = load_theme(Some("dark"));
        assert_eq!(theme.name, ThemeName::Dark);
    }

    #[test]
    fn test_unknown_override_falls_back() {
        let theme = load_theme(Some("not-a-theme"));
        // Unknown names are ignored; config/default applies.
        assert!(matches!(
            theme.name,
            ThemeName::Default | ThemeName::Dark | ThemeName::Light | ThemeName::Minimal
        ));
    }

    #[test]
    fn test_theme_config_serde() {
        let cfg: ThemeConfig = serde_json::from_str(r#"{"theme": "light"}"#).unwrap();
        assert_eq!(cfg.theme, ThemeName::Light);
        let raw = serde_json::to_string(&cfg).unwrap();
        assert!(raw.contains("light"));
    }
}
