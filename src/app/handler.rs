//! Input handling: maps key/mouse/paste events to state mutations.

use std::path::PathBuf;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::config::{Action, KeyBind};
use crate::ui::layout::{contains, inner_row, AppLayout, ReviewLayout};

use super::form::{FormOutcome, ReviewForm};
use super::route::Route;
use super::settings::{SettingsItem, SETTINGS_ITEMS};
use super::state::{ActiveView, AppState, Command, ReviewFocus, ToastLevel};

/// Total selectable rows in the controls submenu (actions + "Reset").
pub fn controls_item_count() -> usize {
    Action::ALL.len() + 1
}

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Page => handle_page_key(state, key),
        ActiveView::SettingsMenu => handle_settings_key(state, key),
        ActiveView::ControlsSubmenu => {
            if state.awaiting_rebind {
                handle_rebind_key(state, key);
            } else {
                handle_controls_key(state, key);
            }
        }
        ActiveView::ReviewForm => handle_review_form_key(state, key),
        ActiveView::UploadPrompt => handle_upload_key(state, key),
        ActiveView::Checklist => handle_checklist_key(state, key),
    }
}

/// Bracketed paste goes to whichever text field has focus.
pub fn handle_paste(state: &mut AppState, text: &str) {
    match (state.active_view, state.route()) {
        (ActiveView::UploadPrompt, _) => state.upload_prompt.paste(text),
        (ActiveView::Page, Route::Login | Route::Register) => state.auth_form.paste(text),
        _ => {}
    }
}

// ── Pages (configurable bindings) ───────────────────────────────

fn handle_page_key(state: &mut AppState, key: KeyEvent) {
    if matches!(state.route(), Route::Login | Route::Register) {
        handle_auth_key(state, key);
        return;
    }

    if matches!(state.route(), Route::Review { .. }) && key.code == KeyCode::Tab {
        toggle_review_focus(state);
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };

    match action {
        Action::Quit => state.should_quit = true,
        Action::OpenSettings => {
            state.active_view = ActiveView::SettingsMenu;
            state.settings_selected = 0;
        }
        Action::GoContracts => state.navigate(Route::Contracts),
        Action::GoAnalytics => state.navigate(Route::Analytics),
        Action::GoProfile => state.navigate(Route::Profile),
        Action::Logout => state.logout(),
        Action::Back => state.go_back(),
        Action::Refresh => state.nav.reload(),
        _ => match state.route().clone() {
            Route::Contracts => handle_contracts_action(state, action),
            Route::Review { contract_id } => handle_review_action(state, action, contract_id),
            _ => {}
        },
    }
}

fn handle_auth_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+r flips between the two forms.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
        state.switch_auth_mode();
        return;
    }

    match state.auth_form.handle_key(key) {
        FormOutcome::Submit => submit_auth_form(state),
        FormOutcome::Cancel => state.should_quit = true,
        FormOutcome::Edited | FormOutcome::Ignored => {}
    }
}

fn submit_auth_form(state: &mut AppState) {
    if state.auth_form.submitting {
        return;
    }
    if let Err(reason) = state.auth_form.validate() {
        state.toast(ToastLevel::Error, reason);
        return;
    }
    let command = match state.route() {
        Route::Register => Command::Register(state.auth_form.register_request()),
        _ => Command::SignIn {
            email: state.auth_form.email().to_string(),
            password: state.auth_form.password().to_string(),
        },
    };
    state.auth_form.submitting = true;
    state.commands.push(command);
}

fn handle_contracts_action(state: &mut AppState, action: Action) {
    let len = state.contracts.len();
    match action {
        Action::MoveUp => state.contracts_list.select_prev(),
        Action::MoveDown => state.contracts_list.select_next(len),
        Action::Select => {
            if let Some(contract) = state.contracts.get(state.contracts_list.selected) {
                let route = Route::Review {
                    contract_id: contract.id.clone(),
                };
                state.navigate(route);
            }
        }
        Action::NextPage => {
            if state.has_next_page {
                state.page.page += 1;
                state.contracts_list.selected = 0;
                state.nav.reload();
            }
        }
        Action::PrevPage => {
            if state.page.page > 1 {
                state.page.page -= 1;
                state.contracts_list.selected = 0;
                state.nav.reload();
            }
        }
        Action::Upload => {
            if state.uploading {
                state.toast(ToastLevel::Info, "An upload is already in progress");
                return;
            }
            state.upload_prompt = Default::default();
            state.active_view = ActiveView::UploadPrompt;
        }
        Action::RunReview => {
            if let Some(contract) = state.contracts.get(state.contracts_list.selected) {
                let form = ReviewForm::new(contract.id.clone(), contract.title.clone());
                open_review_form(state, form);
            }
        }
        _ => {}
    }
}

fn handle_review_action(state: &mut AppState, action: Action, contract_id: String) {
    match action {
        Action::MoveUp => match state.review_focus {
            ReviewFocus::Clauses => state.clause_list.select_prev(),
            ReviewFocus::RiskyClauses => state.risky_list.select_prev(),
        },
        Action::MoveDown => match state.review_focus {
            ReviewFocus::Clauses => state.clause_list.select_next(state.clause_rows.len()),
            ReviewFocus::RiskyClauses => state.risky_list.select_next(state.risky_rows.len()),
        },
        Action::Select => {
            if let Some(index) = state.selected_clause_index() {
                state.explain_clause(index);
            }
        }
        Action::Checklist => {
            if state.checklist.as_ref().is_some_and(|c| !c.is_empty()) {
                state.checklist_scroll = 0;
                state.active_view = ActiveView::Checklist;
            } else {
                state.toast(ToastLevel::Info, "No checklist for this contract yet");
            }
        }
        Action::RunReview => {
            let title = state
                .review
                .as_ref()
                .map(|r| r.contract.title.clone())
                .unwrap_or_default();
            open_review_form(state, ReviewForm::new(contract_id, title));
        }
        _ => {}
    }
}

fn toggle_review_focus(state: &mut AppState) {
    state.review_focus = match state.review_focus {
        ReviewFocus::Clauses if !state.risky_rows.is_empty() => ReviewFocus::RiskyClauses,
        _ => ReviewFocus::Clauses,
    };
}

fn open_review_form(state: &mut AppState, form: ReviewForm) {
    if state.reviews_running.contains(&form.contract_id) {
        state.toast(ToastLevel::Info, "A review of this contract is already running");
        return;
    }
    state.review_form = Some(form);
    state.active_view = ActiveView::ReviewForm;
}

// ── Overlays (hardcoded keys) ───────────────────────────────────

fn handle_review_form_key(state: &mut AppState, key: KeyEvent) {
    let Some(form) = state.review_form.as_mut() else {
        state.active_view = ActiveView::Page;
        return;
    };
    match form.handle_key(key) {
        FormOutcome::Submit => {
            let contract_id = form.contract_id.clone();
            let title = form.title.clone();
            let request = form.request.clone();
            state.review_form = None;
            state.active_view = ActiveView::Page;
            state.reviews_running.push(contract_id.clone());
            state.commands.push(Command::RunReview { contract_id, request });
            state.toast(ToastLevel::Info, format!("Reviewing \"{title}\"… this can take a while"));
        }
        FormOutcome::Cancel => {
            state.review_form = None;
            state.active_view = ActiveView::Page;
        }
        FormOutcome::Edited | FormOutcome::Ignored => {}
    }
}

fn handle_upload_key(state: &mut AppState, key: KeyEvent) {
    match state.upload_prompt.handle_key(key) {
        FormOutcome::Submit => {
            let path = state.upload_prompt.path().to_string();
            if path.is_empty() {
                state.toast(ToastLevel::Error, "Enter the path of a PDF file");
                return;
            }
            let title = state.upload_prompt.title();
            state.active_view = ActiveView::Page;
            state.uploading = true;
            state.commands.push(Command::Upload {
                path: PathBuf::from(expand_home(&path)),
                title,
            });
        }
        FormOutcome::Cancel => state.active_view = ActiveView::Page,
        FormOutcome::Edited | FormOutcome::Ignored => {}
    }
}

/// `~/x` → `$HOME/x`.
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{home}/{rest}"),
        _ => path.to_string(),
    }
}

fn handle_checklist_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c') => {
            state.active_view = ActiveView::Page;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.checklist_scroll = state.checklist_scroll.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.checklist_scroll = state.checklist_scroll.saturating_add(1);
        }
        KeyCode::PageUp => state.checklist_scroll = state.checklist_scroll.saturating_sub(10),
        KeyCode::PageDown => state.checklist_scroll = state.checklist_scroll.saturating_add(10),
        _ => {}
    }
}

// ── Settings menu (hardcoded keys) ──────────────────────────────

fn handle_settings_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.active_view = ActiveView::Page;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.settings_selected = state.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.settings_selected < SETTINGS_ITEMS.len() - 1 {
                state.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            if let Some(item) = SETTINGS_ITEMS.get(state.settings_selected) {
                match item {
                    SettingsItem::Submenu { view, .. } => {
                        state.active_view = *view;
                        state.controls_selected = 0;
                    }
                    SettingsItem::Cycle { cycle, .. } => cycle(state),
                }
            }
        }
        _ => {}
    }
}

// ── Controls submenu (hardcoded navigation, interactive rebinding) ──

fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let item_count = controls_item_count();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.active_view = ActiveView::Page;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.active_view = ActiveView::SettingsMenu;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.controls_selected = state.controls_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.controls_selected < item_count - 1 {
                state.controls_selected += 1;
            }
        }
        KeyCode::Enter => {
            if state.controls_selected < Action::ALL.len() {
                state.awaiting_rebind = true;
            } else {
                state.config.reset_defaults();
                save_bindings(state);
            }
        }
        KeyCode::Delete | KeyCode::Backspace => {
            if let Some(&action) = Action::ALL.get(state.controls_selected) {
                state.config.bindings.insert(action, Vec::new());
                save_bindings(state);
            }
        }
        _ => {}
    }
}

/// Capture the next key press as a new binding.
fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }
    // Ctrl+c stays reserved for quitting.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return;
    }

    if let Some(&action) = Action::ALL.get(state.controls_selected) {
        state.config.add_binding(action, KeyBind::from_key_event(key));
        save_bindings(state);
    }
    state.awaiting_rebind = false;
}

fn save_bindings(state: &mut AppState) {
    if let Err(e) = state.config.save() {
        state.toast(ToastLevel::Error, format!("Could not save bindings: {e}"));
    }
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.  Only the page lists react; overlays are
/// keyboard-driven.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    if state.active_view != ActiveView::Page {
        return;
    }
    let body = AppLayout::from_area(state.terminal_area).body_area;

    match state.route().clone() {
        Route::Contracts => match mouse.kind {
            MouseEventKind::ScrollUp => state.contracts_list.select_prev(),
            MouseEventKind::ScrollDown => state.contracts_list.select_next(state.contracts.len()),
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(row) = inner_row(body, mouse.row) else {
                    return;
                };
                // Skip the table header row.
                let Some(row) = row.checked_sub(1) else {
                    return;
                };
                if let Some(index) = state.contracts_list.index_at(row, state.contracts.len()) {
                    if state.contracts_list.selected == index {
                        handle_contracts_action(state, Action::Select);
                    } else {
                        state.contracts_list.selected = index;
                    }
                }
            }
            _ => {}
        },
        Route::Review { .. } => {
            let layout = ReviewLayout::from_area(body, state.explained.is_some());
            let in_clauses = contains(layout.clauses_area, mouse.column, mouse.row);
            let in_risks = contains(layout.risks_area, mouse.column, mouse.row);
            match mouse.kind {
                MouseEventKind::ScrollUp if in_clauses => state.clause_list.select_prev(),
                MouseEventKind::ScrollDown if in_clauses => {
                    state.clause_list.select_next(state.clause_rows.len())
                }
                MouseEventKind::ScrollUp if in_risks => state.risky_list.select_prev(),
                MouseEventKind::ScrollDown if in_risks => {
                    state.risky_list.select_next(state.risky_rows.len())
                }
                MouseEventKind::Down(MouseButton::Left) if in_clauses => {
                    let Some(row) = inner_row(layout.clauses_area, mouse.row) else {
                        return;
                    };
                    if let Some(index) = state.clause_list.index_at(row, state.clause_rows.len()) {
                        state.review_focus = ReviewFocus::Clauses;
                        state.explain_clause(index);
                    }
                }
                MouseEventKind::Down(MouseButton::Left) if in_risks => {
                    let Some(row) = inner_row(layout.risks_area, mouse.row) else {
                        return;
                    };
                    if let Some(index) = state.risky_list.index_at(row, state.risky_rows.len()) {
                        state.review_focus = ReviewFocus::RiskyClauses;
                        state.risky_list.selected = index;
                        let clause = state.risky_rows[index];
                        state.explain_clause(clause);
                    }
                }
                _ => {}
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::reveal::Revealer;
    use crate::config::AppConfig;
    use crate::core::model::{ContractWithReview, User};
    use crate::core::reveal::Cadence;
    use crate::store::AuthStore;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut AppState, s: &str) {
        for ch in s.chars() {
            handle_key(state, key(KeyCode::Char(ch)));
        }
    }

    fn state(start: Route, signed_in: bool) -> AppState {
        let auth = AuthStore::in_memory();
        if signed_in {
            let user = User {
                id: None,
                email: "ada@example.com".into(),
                first_name: None,
                last_name: None,
            };
            auth.set_session("tok".into(), user).unwrap();
        }
        let (revealer, _rx) = Revealer::new(Cadence::default());
        AppState::new(start, AppConfig::default(), auth, revealer)
    }

    fn with_review(state: &mut AppState) {
        let review: ContractWithReview = serde_json::from_value(serde_json::json!({
            "_id": "c1",
            "title": "NDA",
            "clauses": [
                {"key": "clause-1", "content": "One."},
                {"key": "clause-2", "content": "Two."},
                {"key": "clause-3", "content": "Three."}
            ],
            "review": {
                "_id": "r1",
                "contract_id": "c1",
                "risky_clauses": [{
                    "key": "clause-3", "content": "Three.", "risk_type": "ip",
                    "risk_level": 2, "concerns": "", "recommendations": ""
                }]
            }
        }))
        .unwrap();
        let generation = state.begin_load();
        state.apply_api_update(crate::app::api_runtime::ApiUpdate::ContractReview {
            generation,
            contract_id: "c1".into(),
            result: Ok(review),
        });
    }

    #[test]
    fn login_form_queues_sign_in() {
        let mut s = state(Route::Login, false);
        type_str(&mut s, "ada@example.com");
        handle_key(&mut s, key(KeyCode::Tab));
        handle_paste(&mut s, "pw");
        handle_key(&mut s, key(KeyCode::Enter));

        assert_eq!(
            s.commands,
            vec![Command::SignIn {
                email: "ada@example.com".into(),
                password: "pw".into(),
            }]
        );
        // A second Enter while the request is in flight does nothing.
        handle_key(&mut s, key(KeyCode::Enter));
        assert_eq!(s.commands.len(), 1);
    }

    #[test]
    fn typing_q_on_login_does_not_quit() {
        let mut s = state(Route::Login, false);
        type_str(&mut s, "q");
        assert!(!s.should_quit);
        assert_eq!(s.auth_form.fields[0].value(), "q");
    }

    #[test]
    fn invalid_login_is_toasted_not_sent() {
        let mut s = state(Route::Login, false);
        handle_key(&mut s, key(KeyCode::Tab));
        handle_key(&mut s, key(KeyCode::Enter));
        assert!(s.commands.is_empty());
        assert_eq!(s.toasts.len(), 1);
    }

    #[test]
    fn ctrl_r_switches_to_register() {
        let mut s = state(Route::Login, false);
        handle_key(&mut s, KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(s.route(), &Route::Register);
        assert_eq!(s.nav.depth(), 1);
        assert_eq!(s.auth_form.fields.len(), 4);
    }

    #[test]
    fn selecting_clauses_explains_the_latest_one() {
        let mut s = state(
            Route::Review {
                contract_id: "c1".into(),
            },
            true,
        );
        with_review(&mut s);

        handle_key(&mut s, key(KeyCode::Enter));
        handle_key(&mut s, key(KeyCode::Down));
        handle_key(&mut s, key(KeyCode::Enter));

        assert_eq!(s.explained, Some(1));
        let clauses: Vec<_> = s
            .commands
            .iter()
            .map(|c| match c {
                Command::Explain { clause, .. } => clause.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(clauses, vec!["One.", "Two."]);
    }

    #[test]
    fn tab_moves_to_risky_clauses() {
        let mut s = state(
            Route::Review {
                contract_id: "c1".into(),
            },
            true,
        );
        with_review(&mut s);
        handle_key(&mut s, key(KeyCode::Tab));
        assert_eq!(s.review_focus, ReviewFocus::RiskyClauses);
        handle_key(&mut s, key(KeyCode::Enter));
        assert_eq!(s.explained, Some(2));
        assert_eq!(s.clause_list.selected, 2);
    }

    #[test]
    fn checklist_popup_needs_a_checklist() {
        let mut s = state(
            Route::Review {
                contract_id: "c1".into(),
            },
            true,
        );
        with_review(&mut s);
        handle_key(&mut s, key(KeyCode::Char('c')));
        assert_eq!(s.active_view, ActiveView::Page);
        assert_eq!(s.toasts.len(), 1);
    }

    #[test]
    fn review_form_queues_review() {
        let mut s = state(
            Route::Review {
                contract_id: "c1".into(),
            },
            true,
        );
        with_review(&mut s);
        handle_key(&mut s, key(KeyCode::Char('v')));
        assert_eq!(s.active_view, ActiveView::ReviewForm);
        for _ in 0..3 {
            handle_key(&mut s, key(KeyCode::Down));
        }
        handle_key(&mut s, key(KeyCode::Enter));

        assert_eq!(s.active_view, ActiveView::Page);
        assert_eq!(s.reviews_running, vec!["c1".to_string()]);
        assert!(matches!(s.commands.last(), Some(Command::RunReview { contract_id, .. }) if contract_id == "c1"));

        // Running already: the form won't open again.
        handle_key(&mut s, key(KeyCode::Char('v')));
        assert_eq!(s.active_view, ActiveView::Page);
    }

    #[test]
    fn navigation_and_back() {
        let mut s = state(Route::Contracts, true);
        handle_key(&mut s, key(KeyCode::Char('a')));
        assert_eq!(s.route(), &Route::Analytics);
        handle_key(&mut s, key(KeyCode::Backspace));
        assert_eq!(s.route(), &Route::Contracts);
        handle_key(&mut s, key(KeyCode::Char('q')));
        assert!(s.should_quit);
    }

    #[test]
    fn logout_returns_to_login() {
        let mut s = state(Route::Profile, true);
        handle_key(&mut s, KeyEvent::new(KeyCode::Char('L'), KeyModifiers::SHIFT));
        assert!(!s.auth.is_authenticated());
        assert_eq!(s.route(), &Route::Login);
    }

    #[test]
    fn upload_prompt_expands_home_and_queues() {
        let mut s = state(Route::Contracts, true);
        handle_key(&mut s, key(KeyCode::Char('u')));
        assert_eq!(s.active_view, ActiveView::UploadPrompt);
        handle_paste(&mut s, "/tmp/msa.pdf");
        handle_key(&mut s, key(KeyCode::Enter));
        handle_key(&mut s, key(KeyCode::Enter));

        assert_eq!(
            s.commands,
            vec![Command::Upload {
                path: PathBuf::from("/tmp/msa.pdf"),
                title: "msa".into(),
            }]
        );
        assert!(s.uploading);
    }

    #[test]
    fn paging_needs_a_full_page() {
        let mut s = state(Route::Contracts, true);
        s.nav.take_pending_load();
        handle_key(&mut s, key(KeyCode::PageDown));
        assert_eq!(s.page.page, 1);
        s.has_next_page = true;
        handle_key(&mut s, key(KeyCode::PageDown));
        assert_eq!(s.page.page, 2);
        assert!(s.nav.take_pending_load());
        handle_key(&mut s, key(KeyCode::PageUp));
        assert_eq!(s.page.page, 1);
    }
}
