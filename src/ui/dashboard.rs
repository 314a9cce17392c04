//! Analytics and profile pages.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::core::model::{Analytics, User};

use super::theme::Theme;

// ───────────────────────────────────────── analytics ─────────

/// `(title, value)` for each stat card, in display order.
pub fn stat_cards(analytics: &Analytics) -> [(&'static str, u64); 4] {
    [
        ("Total clauses analysed", analytics.total_clauses),
        ("Total contracts reviewed", analytics.total_contracts),
        ("Total pages scanned", analytics.total_pages),
        ("Total risks identified", analytics.total_risky_clauses),
    ]
}

pub struct AnalyticsPage<'a> {
    pub analytics: Option<&'a Analytics>,
    pub loading: bool,
    pub load_error: Option<&'a str>,
    pub theme: Theme,
}

impl Widget for AnalyticsPage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let outer = Block::default()
            .title(" Analytics ")
            .title_style(theme.title_style())
            .borders(Borders::ALL)
            .border_style(theme.border_style());
        let inner = outer.inner(area);
        outer.render(area, buf);

        let Some(analytics) = self.analytics else {
            let message = match (self.load_error, self.loading) {
                (Some(_), _) => "Error loading analytics data",
                (None, true) => "Loading…",
                (None, false) => "No analytics yet.",
            };
            Paragraph::new(message).style(theme.dim_style()).render(inner, buf);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(inner);
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(rows[0]);

        for ((title, value), card) in stat_cards(analytics).into_iter().zip(cards.iter()) {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme.border_style());
            Paragraph::new(vec![
                Line::from(Span::styled(title, theme.dim_style())),
                Line::raw(""),
                Line::from(Span::styled(value.to_string(), theme.stat_value_style())),
            ])
            .block(block)
            .render(*card, buf);
        }

        // Per contract type breakdown.
        let mut by_type: Vec<_> = analytics.contracts_reviewed.iter().collect();
        by_type.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        let mut lines = vec![Line::raw(""), Line::from(Span::styled("Reviewed by contract type", theme.heading_style()))];
        if by_type.is_empty() {
            lines.push(Line::from(Span::styled("  none yet", theme.dim_style())));
        }
        for (kind, count) in by_type {
            let label = kind.replace('_', " ");
            lines.push(Line::from(vec![
                Span::styled(format!("  {label:<32}"), theme.text_style()),
                Span::styled(count.to_string(), theme.stat_value_style()),
            ]));
        }
        Paragraph::new(lines).render(rows[1], buf);
    }
}

// ───────────────────────────────────────── profile ───────────

pub struct ProfilePage<'a> {
    pub user: Option<&'a User>,
    pub logout_key: String,
    pub theme: Theme,
}

impl Widget for ProfilePage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let block = Block::default()
            .title(" Profile ")
            .title_style(theme.title_style())
            .borders(Borders::ALL)
            .border_style(theme.border_style());

        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {label:<12}"), theme.dim_style()),
                Span::styled(value, theme.text_style()),
            ])
        };

        let mut lines = vec![Line::raw("")];
        match self.user {
            Some(user) => {
                lines.push(Line::from(Span::styled(
                    format!("  {}", user.display_name()),
                    theme.heading_style(),
                )));
                lines.push(Line::raw(""));
                lines.push(field("Email", user.email.clone()));
                lines.push(field("First name", user.first_name.clone().unwrap_or_default()));
                lines.push(field("Last name", user.last_name.clone().unwrap_or_default()));
            }
            None => lines.push(Line::from(Span::styled("  Loading…", theme.dim_style()))),
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("  {}: log out", self.logout_key),
            theme.dim_style(),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
