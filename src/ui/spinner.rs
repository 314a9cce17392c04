//! Activity spinner shown while a request or reveal is in flight.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::Widget,
};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner glyph for the given tick.
pub fn frame(tick: u64) -> &'static str {
    FRAMES[(tick % FRAMES.len() as u64) as usize]
}

/// `⠹ label` right-aligned on the first row of `area`, i.e. over a block's
/// top border.  Draws nothing when hidden or when it would not fit.
pub struct BusyIndicator<'a> {
    pub visible: bool,
    pub tick: u64,
    pub label: &'a str,
    pub style: Style,
}

impl Widget for BusyIndicator<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.visible || area.height == 0 {
            return;
        }
        let text = format!(" {} {} ", frame(self.tick), self.label);
        let width = text.chars().count() as u16;
        let Some(x) = area.width.checked_sub(width + 2).map(|pad| area.x + pad) else {
            return;
        };
        if x < area.x + 2 {
            return;
        }
        buf.set_span(x, area.y, &Span::styled(text, self.style.add_modifier(Modifier::BOLD)), width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_wrap_around() {
        assert_eq!(frame(0), frame(10));
        assert_ne!(frame(0), frame(1));
    }

    #[test]
    fn hidden_indicator_leaves_buffer_untouched() {
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        BusyIndicator {
            visible: false,
            tick: 0,
            label: "loading",
            style: Style::default(),
        }
        .render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
