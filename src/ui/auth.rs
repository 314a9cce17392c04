//! Login / registration page.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::app::form::{AuthForm, AuthMode};

use super::layout::centered_fixed;
use super::popup::field_line;
use super::spinner;
use super::theme::Theme;

pub struct AuthPage<'a> {
    pub form: &'a AuthForm,
    pub tick: u64,
    pub theme: Theme,
}

impl Widget for AuthPage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let (title, subtitle, other) = match self.form.mode {
            AuthMode::Login => ("Sign in", "Welcome back", "Ctrl+r: create an account"),
            AuthMode::Register => ("Create account", "Review contracts in minutes", "Ctrl+r: sign in instead"),
        };

        let height = self.form.fields.len() as u16 + 10;
        let card = centered_fixed(60, height, area);
        Clear.render(card, buf);

        let block = Block::default()
            .title(format!(" {title} "))
            .title_style(theme.heading_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.focused_border_style());
        let inner = block.inner(card);
        block.render(card, buf);

        let mut lines = vec![
            Line::from(Span::styled(format!("  {subtitle}"), theme.dim_style())),
            Line::raw(""),
        ];
        for (i, field) in self.form.fields.iter().enumerate() {
            lines.push(field_line(field, i == self.form.focus, &theme));
        }
        lines.push(Line::raw(""));

        if self.form.mode == AuthMode::Register {
            let mark = if self.form.accept_terms { "[x]" } else { "[ ]" };
            lines.push(Line::from(vec![
                Span::styled(format!("  {mark} "), theme.stat_value_style()),
                Span::styled("I accept the terms and conditions (Ctrl+t)", theme.text_style()),
            ]));
            lines.push(Line::raw(""));
        }

        if self.form.submitting {
            lines.push(Line::from(Span::styled(
                format!("  {} Please wait…", spinner::frame(self.tick)),
                theme.stat_value_style(),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "  Tab: next field  Enter: submit  Esc: quit",
                theme.dim_style(),
            )));
        }
        lines.push(Line::from(Span::styled(format!("  {other}"), theme.dim_style())));

        Paragraph::new(lines).render(inner, buf);
    }
}
