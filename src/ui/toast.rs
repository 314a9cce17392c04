//! Transient notifications stacked in the top-right corner.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::app::state::{Toast, ToastLevel};

use super::theme::Theme;

const MAX_WIDTH: u16 = 48;

pub struct ToastStack<'a> {
    pub toasts: &'a [Toast],
    pub theme: Theme,
}

fn icon(level: ToastLevel) -> &'static str {
    match level {
        ToastLevel::Info => "i",
        ToastLevel::Success => "✓",
        ToastLevel::Error => "✗",
    }
}

impl Widget for ToastStack<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = MAX_WIDTH.min(area.width.saturating_sub(2));
        if width < 12 {
            return;
        }

        // Newest on top.
        let mut y = area.y + 1;
        for toast in self.toasts.iter().rev() {
            let text = format!("{} {}", icon(toast.level), toast.message);
            let inner_width = (width - 2) as usize;
            let lines = text.chars().count().div_ceil(inner_width).clamp(1, 3) as u16;
            let height = lines + 2;
            if y + height > area.y + area.height {
                break;
            }

            let rect = Rect::new(area.x + area.width - width - 1, y, width, height);
            Clear.render(rect, buf);
            let style = self.theme.toast_style(toast.level);
            Paragraph::new(Line::from(Span::styled(text, style)))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(style),
                )
                .render(rect, buf);
            y += height;
        }
    }
}
