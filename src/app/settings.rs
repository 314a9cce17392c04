//! Settings menu model (data only).
//!
//! Keeping these definitions outside the input handler lets both the handler
//! and the popup renderer consume the same source of truth.

use super::state::{ActiveView, AppState, ToastLevel};
use crate::config::{ExplainTransport, ThemeMode};

/// A single item in the settings menu.
pub enum SettingsItem {
    /// Opens a submenu.
    Submenu {
        label: &'static str,
        view: ActiveView,
    },
    /// Cycles through a finite set of values.
    Cycle {
        label: &'static str,
        value: fn(&AppState) -> String,
        cycle: fn(&mut AppState),
    },
}

impl SettingsItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submenu { label, .. } | Self::Cycle { label, .. } => label,
        }
    }
}

/// Offered reveal speeds, in ms per character.
const CADENCES: &[u64] = &[1, 2, 5, 10, 20, 40];
const CHUNK_GAPS: &[u64] = &[0, 2, 10, 50];

fn next_in<T: Copy + PartialEq>(values: &[T], current: T) -> T {
    let idx = values.iter().position(|v| *v == current);
    match idx {
        Some(i) => values[(i + 1) % values.len()],
        None => values[0],
    }
}

/// Write the config out, surfacing failures as a toast.
fn persist(s: &mut AppState, message: String) {
    match s.config.save() {
        Ok(()) => s.toast(ToastLevel::Info, message),
        Err(e) => s.toast(ToastLevel::Error, format!("Could not save settings: {e}")),
    }
}

/// All items shown in the settings popup, in display order.
pub static SETTINGS_ITEMS: &[SettingsItem] = &[
    SettingsItem::Submenu {
        label: "Controls",
        view: ActiveView::ControlsSubmenu,
    },
    SettingsItem::Cycle {
        label: "Theme",
        value: |s| s.config.theme.label().to_string(),
        cycle: |s| {
            s.config.theme = next_in(ThemeMode::ALL, s.config.theme);
            let msg = format!("Theme: {}", s.config.theme.label());
            persist(s, msg);
        },
    },
    SettingsItem::Cycle {
        label: "Reveal Speed",
        value: |s| format!("{}ms/char", s.config.cadence_ms),
        cycle: |s| {
            s.config.cadence_ms = next_in(CADENCES, s.config.cadence_ms);
            s.revealer.set_cadence(s.config.cadence());
            let msg = format!("Reveal speed: {}ms per character", s.config.cadence_ms);
            persist(s, msg);
        },
    },
    SettingsItem::Cycle {
        label: "Chunk Pause",
        value: |s| format!("{}ms", s.config.chunk_gap_ms),
        cycle: |s| {
            s.config.chunk_gap_ms = next_in(CHUNK_GAPS, s.config.chunk_gap_ms);
            s.revealer.set_cadence(s.config.cadence());
            let msg = format!("Pause between chunks: {}ms", s.config.chunk_gap_ms);
            persist(s, msg);
        },
    },
    SettingsItem::Cycle {
        label: "Explanation Transport",
        value: |s| s.config.transport.label().to_string(),
        cycle: |s| {
            s.config.transport = next_in(ExplainTransport::ALL, s.config.transport);
            let msg = format!("Explanations: {}", s.config.transport.label());
            persist(s, msg);
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_in_wraps_and_recovers_from_unknown() {
        assert_eq!(next_in(CADENCES, 2), 5);
        assert_eq!(next_in(CADENCES, 40), 1);
        assert_eq!(next_in(CADENCES, 3), 1);
    }
}
