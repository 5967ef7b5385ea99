//! Theme selection and the styles the timeline view draws with.
//!
//! Palettes come from the `ratatui-themes` crate; `T` cycles them at runtime
//! and the choice is saved to the config file.

use ratatui::style::{Color, Modifier, Style};
use ratatui_themes::ThemeName;
use serde::{Deserialize, Serialize};

/// Theme wrapper around `ThemeName` from ratatui-themes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub ThemeName);

impl Theme {
    /// The theme after this one
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.next())
    }

    /// Display name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0.display_name()
    }

    /// Colors for this theme
    #[must_use]
    pub fn colors(&self) -> ThemeColors {
        ThemeColors::from_name(self.0)
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Colors of the timeline UI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    /// Background
    pub bg: Color,
    /// Popup and header background
    pub bg_raised: Color,
    /// Text
    pub fg: Color,
    /// Read rows, dates, hints
    pub fg_dim: Color,
    /// Titles and the unread marker
    pub primary: Color,
    /// Notification signs and reply marks
    pub secondary: Color,
    /// Loading indicator
    pub warning: Color,
    /// Failures
    pub error: Color,
    /// Borders
    pub border: Color,
    /// Selected row background
    pub selection: Color,
}

impl ThemeColors {
    fn from_name(name: ThemeName) -> Self {
        let p = name.palette();
        Self {
            bg: p.bg,
            bg_raised: lighten(p.bg, 12),
            fg: p.fg,
            fg_dim: p.muted,
            primary: p.accent,
            secondary: p.secondary,
            warning: p.warning,
            error: p.error,
            border: p.muted,
            selection: p.selection,
        }
    }

    /// Unread row
    #[must_use]
    pub fn unread(&self) -> Style {
        Style::default().fg(self.fg).add_modifier(Modifier::BOLD)
    }

    /// Read row
    #[must_use]
    pub fn read(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    /// Selected row
    #[must_use]
    pub fn selected(&self) -> Style {
        Style::default().bg(self.selection).fg(self.fg)
    }

    /// Unread dot, titles
    #[must_use]
    pub fn accent(&self) -> Style {
        Style::default().fg(self.primary).add_modifier(Modifier::BOLD)
    }

    /// Notification sign and reply mark
    #[must_use]
    pub fn mark(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    /// Dates and secondary text
    #[must_use]
    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    /// Loading indicator
    #[must_use]
    pub fn busy(&self) -> Style {
        Style::default().fg(self.warning)
    }

    /// Error text and error modal border
    #[must_use]
    pub fn failure(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    /// Block border
    #[must_use]
    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Key hint in the status bar
    #[must_use]
    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.secondary).add_modifier(Modifier::BOLD)
    }

    /// Popup body
    #[must_use]
    pub fn popup(&self) -> Style {
        Style::default().bg(self.bg_raised).fg(self.fg)
    }
}

fn lighten(color: Color, amount: u8) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            r.saturating_add(amount),
            g.saturating_add(amount),
            b.saturating_add(amount),
        ),
        other => other,
    }
}
