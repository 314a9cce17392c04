//! Scrollable single-selection list.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, StatefulWidget, Widget},
};

// ───────────────────────────────────────── state ─────────────

/// Selected index and scroll offset, kept across frames.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListState {
    pub selected: usize,
    /// First visible row.
    pub offset: usize,
}

impl ListState {
    pub fn select_next(&mut self, len: usize) {
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Ensure the selected row is visible within a viewport of `height` rows.
    pub fn clamp_scroll(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected - height + 1;
        }
    }

    /// Map a click at `row` (relative to the list's inner area) to an item.
    pub fn index_at(&self, row: usize, len: usize) -> Option<usize> {
        let idx = self.offset + row;
        (idx < len).then_some(idx)
    }
}

// ───────────────────────────────────────── widget ────────────

/// A list of pre-styled rows; one row per item, clipped to the width.
pub struct SelectList<'a> {
    rows: Vec<Line<'a>>,
    block: Option<Block<'a>>,
    highlight: Style,
    /// Draw the highlight even when the list doesn't have focus.
    show_selection: bool,
}

impl<'a> SelectList<'a> {
    pub fn new(rows: Vec<Line<'a>>) -> Self {
        Self {
            rows,
            block: None,
            highlight: Style::default(),
            show_selection: true,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn highlight(mut self, style: Style) -> Self {
        self.highlight = style;
        self
    }

    pub fn show_selection(mut self, show: bool) -> Self {
        self.show_selection = show;
        self
    }
}

impl StatefulWidget for SelectList<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ListState) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if !self.rows.is_empty() {
            state.selected = state.selected.min(self.rows.len() - 1);
        }
        state.clamp_scroll(inner.height as usize);

        for (i, line) in self
            .rows
            .into_iter()
            .enumerate()
            .skip(state.offset)
            .take(inner.height as usize)
        {
            let y = inner.y + (i - state.offset) as u16;
            let row = Rect::new(inner.x, y, inner.width, 1);
            if self.show_selection && i == state.selected {
                buf.set_style(row, self.highlight);
                let prefix = Line::from("▸ ");
                buf.set_line(inner.x, y, &prefix, 2);
                buf.set_line(inner.x + 2, y, &line, inner.width.saturating_sub(2));
            } else {
                buf.set_line(inner.x + 2, y, &line, inner.width.saturating_sub(2));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_follows_selection() {
        let mut state = ListState::default();
        for _ in 0..7 {
            state.select_next(10);
        }
        state.clamp_scroll(5);
        assert_eq!(state.selected, 7);
        assert_eq!(state.offset, 3);

        state.selected = 1;
        state.clamp_scroll(5);
        assert_eq!(state.offset, 1);
        assert_eq!(state.index_at(2, 10), Some(3));
        assert_eq!(state.index_at(20, 10), None);
    }

    #[test]
    fn next_stops_at_end() {
        let mut state = ListState::default();
        state.select_next(0);
        assert_eq!(state.selected, 0);
        state.select_next(2);
        state.select_next(2);
        assert_eq!(state.selected, 1);
        state.select_prev();
        state.select_prev();
        assert_eq!(state.selected, 0);
    }
}
