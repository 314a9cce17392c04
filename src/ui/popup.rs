//! Popup overlay widgets: settings, controls, review options, upload
//! prompt and the summary checklist.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::app::form::{ReviewForm, TextField, UploadPrompt};
use crate::app::settings::{SettingsItem, SETTINGS_ITEMS};
use crate::app::state::AppState;
use crate::config::{Action, AppConfig};
use crate::core::checklist::Checklist;

use super::layout::centered_fixed;
use super::theme::Theme;

fn popup_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(theme.heading_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style())
}

fn row_style(theme: &Theme, selected: bool) -> (&'static str, Style) {
    if selected {
        (" ▸ ", theme.selected_style())
    } else {
        ("   ", theme.text_style())
    }
}

// ───────────────────────────────────────── settings popup ────

pub struct SettingsPopup<'a> {
    pub state: &'a AppState,
    pub theme: Theme,
}

impl Widget for SettingsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let height = (SETTINGS_ITEMS.len() as u16) + 6;
        let popup = centered_fixed(48, height, area);
        Clear.render(popup, buf);

        let block = popup_block("Settings", &theme);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![Line::raw("")];
        for (i, item) in SETTINGS_ITEMS.iter().enumerate() {
            let (prefix, style) = row_style(&theme, i == self.state.settings_selected);
            let value = match item {
                SettingsItem::Submenu { .. } => "›".to_string(),
                SettingsItem::Cycle { value, .. } => value(self.state),
            };
            let label_col = format!("{prefix}{:<24}", item.label());
            lines.push(Line::from(vec![
                Span::styled(label_col, style),
                Span::styled(value, theme.stat_value_style()),
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Enter/Space: change  Esc: close",
            theme.dim_style(),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── controls popup ────

/// Interactive controls / keybinding popup overlay.
pub struct ControlsPopup<'a> {
    pub config: &'a AppConfig,
    pub selected: usize,
    pub awaiting_rebind: bool,
    pub theme: Theme,
}

impl Widget for ControlsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let height = (Action::ALL.len() as u16) + 7;
        let popup = centered_fixed(52, height, area);
        Clear.render(popup, buf);

        let block = popup_block("Controls", &theme);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![Line::raw("")];

        for (i, &action) in Action::ALL.iter().enumerate() {
            let is_selected = i == self.selected;
            let (prefix, base_style) = row_style(&theme, is_selected);

            let keys_display = if is_selected && self.awaiting_rebind {
                "Press a key…".to_string()
            } else {
                self.config.display_bindings(action)
            };
            let mut key_style = Style::default().fg(Color::Yellow);
            if is_selected {
                key_style = key_style.patch(theme.selected_style());
            }
            if is_selected && self.awaiting_rebind {
                key_style = key_style.add_modifier(Modifier::SLOW_BLINK);
            }

            // Label left-aligned, keys right-aligned.
            let label_col = format!("{prefix}{:<22}", action.label());
            let keys_width = (inner.width as usize).saturating_sub(label_col.chars().count()).max(1);
            let keys_col = format!("{keys_display:>keys_width$}");

            lines.push(Line::from(vec![
                Span::styled(label_col, base_style),
                Span::styled(keys_col, key_style),
            ]));
        }

        lines.push(Line::raw(""));
        let (reset_prefix, reset_style) = row_style(&theme, self.selected == Action::ALL.len());
        lines.push(Line::from(Span::styled(
            format!("{reset_prefix}⟳ Reset to defaults"),
            reset_style,
        )));

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Enter: add key  Del: clear  Esc: back",
            theme.dim_style(),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── review options ────

pub struct ReviewFormPopup<'a> {
    pub form: &'a ReviewForm,
    pub theme: Theme,
}

impl Widget for ReviewFormPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let popup = centered_fixed(56, 11, area);
        Clear.render(popup, buf);

        let block = popup_block("Review Contract", &theme);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![
            Line::from(Span::styled(format!("  {}", self.form.title), theme.title_style())),
            Line::raw(""),
        ];
        for (i, (label, value)) in self.form.rows().into_iter().enumerate() {
            let (prefix, style) = row_style(&theme, i == self.form.selected);
            lines.push(Line::from(vec![
                Span::styled(format!("{prefix}{label:<16}"), style),
                Span::styled(format!("◂ {value} ▸"), theme.stat_value_style()),
            ]));
        }
        lines.push(Line::raw(""));
        let (prefix, style) = row_style(&theme, self.form.selected == ReviewForm::ROWS - 1);
        lines.push(Line::from(Span::styled(format!("{prefix}Start review"), style)));
        lines.push(Line::from(Span::styled(
            "  Enter/Space: change  Esc: cancel",
            theme.dim_style(),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── upload prompt ─────

/// A labelled input line, with a block cursor on the focused field.
pub fn field_line<'a>(field: &TextField, focused: bool, theme: &Theme) -> Line<'a> {
    let marker = if focused { "▸ " } else { "  " };
    let mut value = field.display();
    if focused {
        let at = value
            .char_indices()
            .nth(field.cursor())
            .map_or(value.len(), |(i, _)| i);
        value.insert(at, '▏');
    }
    Line::from(vec![
        Span::styled(format!("{marker}{:<12}", field.label), theme.text_style()),
        Span::styled(value, theme.input_style(focused)),
    ])
}

pub struct UploadPopup<'a> {
    pub prompt: &'a UploadPrompt,
    pub theme: Theme,
}

impl Widget for UploadPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let popup = centered_fixed(72, 9, area);
        Clear.render(popup, buf);

        let block = popup_block("Upload Contract", &theme);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![Line::raw("")];
        for (i, field) in self.prompt.fields.iter().enumerate() {
            lines.push(field_line(field, i == self.prompt.focus, &theme));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Only PDF files are accepted.  Tab: next field  Enter: upload  Esc: cancel",
            theme.dim_style(),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

// ───────────────────────────────────────── checklist ─────────

pub struct ChecklistPopup<'a> {
    pub checklist: &'a Checklist,
    pub scroll: u16,
    pub theme: Theme,
}

impl Widget for ChecklistPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let width = area.width.saturating_sub(8).clamp(20, 100);
        let height = area.height.saturating_sub(4).max(6);
        let popup = centered_fixed(width, height, area);
        Clear.render(popup, buf);

        let block = popup_block("Summary Checklist", &theme);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = Vec::new();
        if !self.checklist.heading.is_empty() {
            lines.push(Line::from(Span::styled(
                self.checklist.heading.clone(),
                theme.heading_style(),
            )));
            lines.push(Line::raw(""));
        }
        for item in &self.checklist.items {
            lines.push(Line::from(vec![
                Span::styled("☐ ", theme.stat_value_style()),
                Span::styled(item.title.clone(), theme.text_style().add_modifier(Modifier::BOLD)),
            ]));
            for text in item.description.lines() {
                lines.push(Line::from(Span::styled(format!("  {text}"), theme.text_style())));
            }
            lines.push(Line::raw(""));
        }
        if !self.checklist.footer.is_empty() {
            lines.push(Line::from(Span::styled(
                self.checklist.footer.clone(),
                theme.dim_style().add_modifier(Modifier::ITALIC),
            )));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(inner, buf);
    }
}
