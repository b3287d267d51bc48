//! Terminal color palettes.
//!
//! Muted base colors with accents reserved for focus, badges and notices.

use ratatui::style::{Color, Modifier, Style};

use crate::session::NoticeLevel;

pub mod colors {
    use ratatui::style::Color;

    pub const BG_DEEP: Color = Color::Rgb(26, 27, 38); // #1a1b26
    pub const BG_SURFACE: Color = Color::Rgb(36, 40, 59); // #24283b
    pub const BG_HIGHLIGHT: Color = Color::Rgb(41, 46, 66); // #292e42
    pub const BORDER: Color = Color::Rgb(59, 66, 97); // #3b4261
    pub const BORDER_FOCUS: Color = Color::Rgb(125, 145, 200); // #7d91c8

    pub const TEXT_PRIMARY: Color = Color::Rgb(192, 202, 245); // #c0caf5
    pub const TEXT_SECONDARY: Color = Color::Rgb(169, 177, 214); // #a9b1d6
    /// Lightened to stay readable on BG_DEEP.
    pub const TEXT_MUTED: Color = Color::Rgb(105, 114, 158); // #696e9e
    pub const TEXT_DISABLED: Color = Color::Rgb(68, 75, 106); // #444b6a

    pub const ACCENT_PRIMARY: Color = Color::Rgb(122, 162, 247); // #7aa2f7
    pub const ACCENT_SECONDARY: Color = Color::Rgb(187, 154, 247); // #bb9af7
    pub const ACCENT_TERTIARY: Color = Color::Rgb(125, 207, 255); // #7dcfff

    pub const STATUS_SUCCESS: Color = Color::Rgb(115, 218, 202); // #73daca
    pub const STATUS_WARNING: Color = Color::Rgb(224, 175, 104); // #e0af68
    pub const STATUS_ERROR: Color = Color::Rgb(247, 118, 142); // #f7768e
    pub const STATUS_INFO: Color = Color::Rgb(125, 207, 255); // #7dcfff

    // Result type badges
    pub const KIND_STUDY: Color = Color::Rgb(122, 162, 247); // #7aa2f7
    pub const KIND_INDICATION: Color = Color::Rgb(158, 206, 106); // #9ece6a
    pub const KIND_PROCEDURE: Color = Color::Rgb(255, 158, 100); // #ff9e64
}

#[derive(Clone, Copy, Debug)]
pub struct ThemePalette {
    pub accent: Color,
    pub accent_alt: Color,
    pub bg: Color,
    pub fg: Color,
    pub surface: Color,
    pub hint: Color,
    pub disabled: Color,
    pub border: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub stripe_even: Color,
    pub stripe_odd: Color,
}

impl ThemePalette {
    pub fn light() -> Self {
        Self {
            accent: Color::Rgb(47, 107, 231),
            accent_alt: Color::Rgb(124, 93, 198),
            bg: Color::Rgb(250, 250, 252),
            fg: Color::Rgb(36, 41, 46),
            surface: Color::Rgb(240, 241, 245),
            hint: Color::Rgb(125, 134, 144),
            disabled: Color::Rgb(190, 196, 204),
            border: Color::Rgb(216, 222, 228),
            success: Color::Rgb(45, 138, 72),
            warning: Color::Rgb(177, 133, 41),
            error: Color::Rgb(207, 34, 46),
            info: Color::Rgb(9, 105, 218),
            stripe_even: Color::Rgb(250, 250, 252),
            stripe_odd: Color::Rgb(240, 241, 245),
        }
    }

    pub fn dark() -> Self {
        Self {
            accent: colors::ACCENT_PRIMARY,
            accent_alt: colors::ACCENT_SECONDARY,
            bg: colors::BG_DEEP,
            fg: colors::TEXT_PRIMARY,
            surface: colors::BG_SURFACE,
            hint: colors::TEXT_MUTED,
            disabled: colors::TEXT_DISABLED,
            border: colors::BORDER,
            success: colors::STATUS_SUCCESS,
            warning: colors::STATUS_WARNING,
            error: colors::STATUS_ERROR,
            info: colors::STATUS_INFO,
            stripe_even: colors::BG_DEEP,
            stripe_odd: colors::BG_HIGHLIGHT,
        }
    }

    pub fn title(self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title_subtle(self) -> Style {
        Style::default().fg(self.fg).add_modifier(Modifier::BOLD)
    }

    pub fn hint_style(self) -> Style {
        Style::default().fg(self.hint)
    }

    pub fn disabled_style(self) -> Style {
        Style::default().fg(self.disabled)
    }

    pub fn border_style(self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn border_focus_style(self) -> Style {
        Style::default().fg(colors::BORDER_FOCUS)
    }

    pub fn surface_style(self) -> Style {
        Style::default().bg(self.surface)
    }

    /// Row background, alternating so adjacent result blocks stay distinct.
    pub fn stripe(self, index: usize) -> Style {
        let bg = if index % 2 == 0 {
            self.stripe_even
        } else {
            self.stripe_odd
        };
        Style::default().bg(bg)
    }

    pub fn notice_style(self, level: NoticeLevel) -> Style {
        let fg = match level {
            NoticeLevel::Success => self.success,
            NoticeLevel::Info => self.info,
            NoticeLevel::Error => self.error,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }

    /// Badge color for a result `type` tag. Unknown tags use the accent.
    pub fn kind_style(self, kind: &str) -> Style {
        let fg = match kind.to_ascii_lowercase().as_str() {
            "study" | "studies" => colors::KIND_STUDY,
            "indication" | "indications" => colors::KIND_INDICATION,
            "procedure" | "procedures" => colors::KIND_PROCEDURE,
            _ => self.accent,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }

    pub fn badge_style(self) -> Style {
        Style::default().fg(colors::TEXT_SECONDARY).bg(self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_badges_are_case_insensitive() {
        let p = ThemePalette::dark();
        assert_eq!(p.kind_style("Study"), p.kind_style("study"));
        assert_eq!(p.kind_style("unknown").fg, Some(p.accent));
    }

    #[test]
    fn stripes_alternate() {
        let p = ThemePalette::light();
        assert_ne!(p.stripe(0), p.stripe(1));
        assert_eq!(p.stripe(0), p.stripe(2));
    }
}
