//! Contract review page: clause list, interpretation pane and the flagged
//! clause details.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget, Wrap},
};

use crate::app::reveal::RevealPhase;
use crate::app::state::{AppState, ReviewFocus};
use crate::core::clause::{ClauseRow, RiskBand};

use super::layout::ReviewLayout;
use super::list::SelectList;
use super::spinner::BusyIndicator;
use super::theme::Theme;

pub const ANALYSING: &str = "Analysing clause...";
pub const IDLE_HINT: &str = "Click on a clause to get an explanation.";

/// Text for the interpretation pane.
pub fn interpretation_text(phase: RevealPhase, revealed: &str, explaining: bool) -> &str {
    match phase {
        RevealPhase::Waiting => ANALYSING,
        _ if !revealed.is_empty() => revealed,
        RevealPhase::Revealing => ANALYSING,
        _ if explaining => "",
        _ => IDLE_HINT,
    }
}

fn first_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn render_review(state: &mut AppState, area: Rect, buf: &mut Buffer, theme: Theme) {
    let title = state
        .review
        .as_ref()
        .map(|r| r.contract.title.clone())
        .unwrap_or_else(|| "Review".into());

    if state.review.is_none() {
        let block = Block::default()
            .title(format!(" {title} "))
            .title_style(theme.title_style())
            .borders(Borders::ALL)
            .border_style(theme.border_style());
        let message = match (&state.load_error, state.loading) {
            (Some(err), _) => err.clone(),
            (None, true) => "Loading review…".into(),
            (None, false) => "No review yet. Press the review key to run one.".into(),
        };
        Paragraph::new(message)
            .style(theme.dim_style())
            .block(block)
            .render(area, buf);
        return;
    }

    let layout = ReviewLayout::from_area(area, state.explained.is_some());

    // ── clauses ───────────────────────────────────────────────
    let clause_focus = state.review_focus == ReviewFocus::Clauses;
    let rows = state
        .clause_rows
        .iter()
        .enumerate()
        .map(|(i, row)| clause_line(row, state.explained == Some(i), &theme))
        .collect();
    let block = Block::default()
        .title(format!(" {title} · {} clauses ", state.clause_rows.len()))
        .title_style(theme.title_style())
        .borders(Borders::ALL)
        .border_style(if clause_focus {
            theme.focused_border_style()
        } else {
            theme.border_style()
        });
    SelectList::new(rows)
        .block(block)
        .highlight(theme.selected_style())
        .show_selection(clause_focus)
        .render(layout.clauses_area, buf, &mut state.clause_list);

    // ── interpretation ────────────────────────────────────────
    let text = interpretation_text(
        state.revealer.phase(),
        state.revealer.revealed(),
        state.explained.is_some(),
    );
    let mut lines = Vec::new();
    if let Some(row) = state.explained_clause() {
        lines.push(Line::from(Span::styled(
            format!("Clause {}", row.number),
            theme.heading_style(),
        )));
    }
    lines.extend(text.lines().map(|l| Line::from(Span::styled(l.to_string(), theme.text_style()))));
    let block = Block::default()
        .title(" Interpretation ")
        .title_style(theme.title_style())
        .borders(Borders::ALL)
        .border_style(theme.border_style());
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block)
        .render(layout.interpretation_area, buf);
    BusyIndicator {
        visible: state.revealer.is_active(),
        tick: state.tick,
        label: "explaining",
        style: theme.stat_value_style(),
    }
    .render(layout.interpretation_area, buf);

    // ── high risk clauses ─────────────────────────────────────
    render_risks(state, layout.risks_area, buf, theme);
}

fn clause_line<'a>(row: &ClauseRow, explained: bool, theme: &Theme) -> Line<'a> {
    let mut number_style = theme.dim_style();
    let mut text_style = theme.text_style();
    if let Some(band) = row.band() {
        number_style = theme.risk_style(band);
        text_style = theme.risk_style(band).remove_modifier(Modifier::BOLD);
    }
    if explained {
        text_style = text_style.patch(theme.explained_style());
    }
    let mut spans = vec![Span::styled(format!("{:>4} ", row.number), number_style)];
    if let Some(band) = row.band() {
        spans.push(Span::styled(format!("[{}] ", band.label()), theme.risk_style(band)));
    }
    spans.push(Span::styled(first_line(&row.content), text_style));
    Line::from(spans)
}

fn render_risks(state: &mut AppState, area: Rect, buf: &mut Buffer, theme: Theme) {
    let focus = state.review_focus == ReviewFocus::RiskyClauses;
    let block = Block::default()
        .title(format!(" High Risk Clauses ({}) ", state.risky_rows.len()))
        .title_style(theme.title_style())
        .borders(Borders::ALL)
        .border_style(if focus {
            theme.focused_border_style()
        } else {
            theme.border_style()
        });

    if state.risky_rows.is_empty() {
        Paragraph::new("No risky clauses were found.")
            .style(theme.dim_style())
            .block(block)
            .render(area, buf);
        return;
    }

    let inner = block.inner(area);
    block.render(area, buf);

    // List of flagged clauses on top, details of the selected one below.
    let list_height = (state.risky_rows.len() as u16).min(inner.height / 3).max(1);
    let list_area = Rect::new(inner.x, inner.y, inner.width, list_height);
    let detail_area = Rect::new(
        inner.x,
        inner.y + list_height,
        inner.width,
        inner.height.saturating_sub(list_height),
    );

    let rows = state
        .risky_rows
        .iter()
        .filter_map(|&i| state.clause_rows.get(i))
        .map(|row| clause_line(row, false, &theme))
        .collect();
    SelectList::new(rows)
        .highlight(theme.selected_style())
        .show_selection(focus)
        .render(list_area, buf, &mut state.risky_list);

    let Some(risk) = state.selected_clause().and_then(|row| row.risk.as_ref()) else {
        Paragraph::new("Select a flagged clause to see its assessment.")
            .style(theme.dim_style())
            .render(detail_area, buf);
        return;
    };

    let band = RiskBand::from_level(risk.risk_level);
    let label = |s: &'static str| Span::styled(s, theme.heading_style());
    let lines = vec![
        Line::raw(""),
        Line::from(vec![
            label("Risk level: "),
            Span::styled(band.label(), theme.risk_style(band)),
            Span::raw("   "),
            label("Type: "),
            Span::styled(risk.risk_type.replace('_', " "), theme.text_style()),
        ]),
        Line::raw(""),
        Line::from(label("Concerns")),
        Line::from(Span::styled(risk.concerns.clone(), theme.text_style())),
        Line::raw(""),
        Line::from(label("Recommendations")),
        Line::from(Span::styled(risk.recommendations.clone(), theme.text_style())),
    ];
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(detail_area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpretation_placeholders() {
        assert_eq!(interpretation_text(RevealPhase::Idle, "", false), IDLE_HINT);
        assert_eq!(interpretation_text(RevealPhase::Waiting, "", true), ANALYSING);
        assert_eq!(interpretation_text(RevealPhase::Revealing, "Ri", true), "Ri");
        assert_eq!(interpretation_text(RevealPhase::Complete, "Risk", true), "Risk");
        // Cancelled mid-reveal: keep what was shown.
        assert_eq!(interpretation_text(RevealPhase::Idle, "Ri", true), "Ri");
        assert_eq!(interpretation_text(RevealPhase::Complete, "", true), "");
    }

    #[test]
    fn clause_preview_collapses_whitespace() {
        assert_eq!(first_line("  The   Supplier\nshall  "), "The Supplier shall");
    }
}
