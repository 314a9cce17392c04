//! Contract history page.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};

use crate::api::client::Page;
use crate::app::state::ToastLevel;
use crate::core::model::Contract;

use super::list::{ListState, SelectList};
use super::theme::Theme;

pub struct ContractsPage<'a> {
    pub contracts: &'a [Contract],
    pub page: Page,
    pub has_next_page: bool,
    pub reviews_running: &'a [String],
    pub load_error: Option<&'a str>,
    pub theme: Theme,
}

/// `title … pages  reviewed  uploaded` laid out to `width` columns.
fn row_text(title: &str, pages: &str, status: &str, date: &str, width: usize) -> String {
    let tail = format!(" {pages:>6}  {status:<12} {date:>10}");
    let title_width = width.saturating_sub(tail.chars().count() + 2).max(8);
    let mut title: String = title.chars().take(title_width).collect();
    let pad = title_width.saturating_sub(title.chars().count());
    title.push_str(&" ".repeat(pad));
    format!("{title}{tail}")
}

impl StatefulWidget for ContractsPage<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ListState) {
        let theme = self.theme;
        let block = Block::default()
            .title(format!(" Contract History · page {} ", self.page.page))
            .title_style(theme.title_style())
            .borders(Borders::ALL)
            .border_style(theme.border_style());
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 || inner.width == 0 {
            return;
        }

        let width = inner.width as usize;
        let header = Line::from(Span::styled(
            format!("  {}", row_text("Title", "Pages", "Review", "Uploaded", width)),
            theme.heading_style(),
        ));
        buf.set_line(inner.x, inner.y, &header, inner.width);

        let body = Rect::new(inner.x, inner.y + 1, inner.width, inner.height - 1);

        if let Some(err) = self.load_error {
            let line = Line::from(Span::styled(format!("  {err}"), theme.toast_style(ToastLevel::Error)));
            buf.set_line(body.x, body.y, &line, body.width);
            return;
        }
        if self.contracts.is_empty() {
            let hint = if self.page.page > 1 {
                "  No more contracts."
            } else {
                "  No contracts yet. Press the upload key to add a PDF."
            };
            let line = Line::from(Span::styled(hint, theme.dim_style()));
            buf.set_line(body.x, body.y, &line, body.width);
            return;
        }

        let rows = self
            .contracts
            .iter()
            .map(|c| {
                let pages = c.pages.map(|p| p.to_string()).unwrap_or_else(|| "–".into());
                let status = if self.reviews_running.contains(&c.id) {
                    "reviewing…"
                } else if c.has_review {
                    "reviewed"
                } else {
                    "not reviewed"
                };
                let date = c
                    .created_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let style = if c.has_review {
                    theme.text_style()
                } else {
                    theme.dim_style()
                };
                Line::from(Span::styled(
                    row_text(&c.title, &pages, status, &date, width),
                    style,
                ))
            })
            .collect();

        SelectList::new(rows)
            .highlight(theme.selected_style())
            .render(body, buf, state);

        if self.has_next_page {
            let more = Line::from(Span::styled(" more › ", theme.dim_style()));
            let y = area.y + area.height.saturating_sub(1);
            buf.set_line(area.x + area.width.saturating_sub(10), y, &more, 8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_text_pads_and_truncates_title() {
        let row = row_text("A very long contract title indeed", "3", "reviewed", "2024-05-01", 50);
        assert_eq!(row.chars().count(), 48);
        assert!(row.starts_with("A very long"));
        assert!(row.ends_with("2024-05-01"));
    }
}
