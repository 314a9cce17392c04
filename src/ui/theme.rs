//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

use crate::app::state::ToastLevel;
use crate::config::ThemeMode;
use crate::core::clause::RiskBand;

/// Central theme; every widget asks it for styles so switching the mode in
/// the settings popup recolours everything on the next frame.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    mode: ThemeMode,
}

impl Theme {
    pub fn new(mode: ThemeMode) -> Self {
        Self { mode }
    }

    fn fg(&self) -> Color {
        match self.mode {
            ThemeMode::Dark => Color::White,
            ThemeMode::Light => Color::Black,
        }
    }

    fn muted(&self) -> Color {
        match self.mode {
            ThemeMode::Dark => Color::DarkGray,
            ThemeMode::Light => Color::Gray,
        }
    }

    fn accent(&self) -> Color {
        match self.mode {
            ThemeMode::Dark => Color::Cyan,
            ThemeMode::Light => Color::Blue,
        }
    }

    // ── content ────────────────────────────────────────────────
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.fg())
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.muted())
    }

    pub fn heading_style(&self) -> Style {
        Style::default()
            .fg(self.accent())
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        match self.mode {
            ThemeMode::Dark => Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            ThemeMode::Light => Style::default()
                .bg(Color::Gray)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// The clause whose explanation is showing.
    pub fn explained_style(&self) -> Style {
        Style::default()
            .fg(self.accent())
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn risk_style(&self, band: RiskBand) -> Style {
        match band {
            RiskBand::Low => Style::default().fg(Color::Green),
            RiskBand::Medium => Style::default().fg(Color::Yellow),
            RiskBand::High => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        }
    }

    pub fn stat_value_style(&self) -> Style {
        Style::default()
            .fg(self.accent())
            .add_modifier(Modifier::BOLD)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.muted())
    }

    pub fn focused_border_style(&self) -> Style {
        Style::default().fg(self.accent())
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style(&self) -> Style {
        match self.mode {
            ThemeMode::Dark => Style::default().bg(Color::DarkGray).fg(Color::White),
            ThemeMode::Light => Style::default().bg(Color::Gray).fg(Color::Black),
        }
    }

    pub fn input_style(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(self.fg())
        }
    }

    pub fn toast_style(&self, level: ToastLevel) -> Style {
        let color = match level {
            ToastLevel::Info => self.accent(),
            ToastLevel::Success => Color::Green,
            ToastLevel::Error => Color::Red,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}
