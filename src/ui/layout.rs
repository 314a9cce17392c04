//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Primary screen layout: a one-line header (route + user), the page body,
/// and a bottom status bar.
pub struct AppLayout {
    pub header_area: Rect,
    pub body_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            header_area: chunks[0],
            body_area: chunks[1],
            status_area: chunks[2],
        }
    }
}

/// Review page: clauses on the left, the interpretation above the flagged
/// clause details on the right.
pub struct ReviewLayout {
    pub clauses_area: Rect,
    pub interpretation_area: Rect,
    pub risks_area: Rect,
}

impl ReviewLayout {
    /// The interpretation pane grows once a clause is being explained.
    pub fn from_area(area: Rect, explaining: bool) -> Self {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        let top = if explaining { 50 } else { 25 };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(top), Constraint::Percentage(100 - top)])
            .split(cols[1]);

        Self {
            clauses_area: cols[0],
            interpretation_area: rows[0],
            risks_area: rows[1],
        }
    }
}

/// Whether (col, row) falls inside `area`.
pub fn contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

/// Row index inside a bordered block, or `None` on the border.
pub fn inner_row(area: Rect, row: u16) -> Option<usize> {
    let top = area.y + 1;
    let bottom = area.y + area.height.saturating_sub(1);
    (row >= top && row < bottom).then(|| (row - top) as usize)
}

/// A centered rectangle with fixed dimensions, clamped to the available area.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_takes_remaining_height() {
        let layout = AppLayout::from_area(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.header_area.height, 1);
        assert_eq!(layout.status_area.y, 23);
        assert_eq!(layout.body_area.height, 22);
    }

    #[test]
    fn inner_row_skips_borders() {
        let area = Rect::new(0, 2, 10, 5);
        assert_eq!(inner_row(area, 2), None);
        assert_eq!(inner_row(area, 3), Some(0));
        assert_eq!(inner_row(area, 5), Some(2));
        assert_eq!(inner_row(area, 6), None);
        assert!(contains(area, 9, 6));
        assert!(!contains(area, 10, 6));
    }
}
