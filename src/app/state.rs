//! Central application state.
//!
//! All mutable state lives here so that rendering is a pure function over
//! `&AppState` and input handling a mutation of `&mut AppState`.  Side
//! effects that need the network are queued as [`Command`]s and executed by
//! the event loop.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::api::client::Page;
use crate::api::ApiError;
use crate::config::AppConfig;
use crate::core::checklist::{parse_checklist, Checklist};
use crate::core::clause::{build_clause_rows, ClauseRow};
use crate::core::model::{Analytics, Contract, ContractWithReview, RegisterRequest, ReviewRequest};
use crate::store::AuthStore;
use crate::ui::list::ListState;

use super::api_runtime::ApiUpdate;
use super::form::{AuthForm, ReviewForm, UploadPrompt};
use super::reveal::{Applied, RevealUpdate, Revealer};
use super::route::{Navigator, Route};

/// How long a toast stays up.
pub const TOAST_TTL: Duration = Duration::from_secs(4);

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    /// The current route's page.
    #[default]
    Page,
    SettingsMenu,
    ControlsSubmenu,
    ReviewForm,
    UploadPrompt,
    Checklist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

/// Which list has the cursor on the review page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewFocus {
    #[default]
    Clauses,
    RiskyClauses,
}

/// Work for the event loop; see `main.rs`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SignIn { email: String, password: String },
    Register(RegisterRequest),
    RunReview { contract_id: String, request: ReviewRequest },
    Upload { path: PathBuf, title: String },
    Explain { contract_id: String, clause: String },
}

pub struct AppState {
    pub nav: Navigator,
    pub config: AppConfig,
    pub auth: AuthStore,
    pub should_quit: bool,
    pub active_view: ActiveView,
    /// Last full terminal area; mouse hit-testing needs it.
    pub terminal_area: Rect,
    /// Spinner frame counter.
    pub tick: u64,
    pub toasts: Vec<Toast>,
    pub commands: Vec<Command>,

    /// Bumped on every page load; older results are dropped.
    pub load_generation: u64,
    /// A page load is in flight.
    pub loading: bool,
    /// Set when the last page load failed; shown instead of the content.
    pub load_error: Option<String>,

    // ── settings ──────────────────────────────────────────────
    pub settings_selected: usize,
    pub controls_selected: usize,
    /// Waiting for a key press to bind to the selected action.
    pub awaiting_rebind: bool,

    // ── auth pages ────────────────────────────────────────────
    pub auth_form: AuthForm,

    // ── contracts ─────────────────────────────────────────────
    pub contracts: Vec<Contract>,
    pub contracts_list: ListState,
    pub page: Page,
    /// The last page came back full, so there may be another.
    pub has_next_page: bool,
    pub upload_prompt: UploadPrompt,
    pub review_form: Option<ReviewForm>,
    /// Contract ids with a review running.
    pub reviews_running: Vec<String>,
    pub uploading: bool,

    // ── review ────────────────────────────────────────────────
    pub review: Option<ContractWithReview>,
    pub clause_rows: Vec<ClauseRow>,
    pub clause_list: ListState,
    /// Indices into `clause_rows` of the flagged clauses.
    pub risky_rows: Vec<usize>,
    pub risky_list: ListState,
    pub review_focus: ReviewFocus,
    /// Clause whose explanation is (being) revealed.
    pub explained: Option<usize>,
    pub revealer: Revealer,
    pub checklist: Option<Checklist>,
    pub checklist_scroll: u16,

    // ── analytics ─────────────────────────────────────────────
    pub analytics: Option<Analytics>,
}

impl AppState {
    pub fn new(start: Route, config: AppConfig, auth: AuthStore, revealer: Revealer) -> Self {
        let page = Page {
            page: 1,
            limit: config.page_size,
        };
        let auth_form = match start {
            Route::Register => AuthForm::register(),
            _ => AuthForm::login(),
        };
        let mut state = Self {
            nav: Navigator::new(start),
            config,
            auth,
            should_quit: false,
            active_view: ActiveView::default(),
            terminal_area: Rect::default(),
            tick: 0,
            toasts: Vec::new(),
            commands: Vec::new(),
            load_generation: 0,
            loading: false,
            load_error: None,
            settings_selected: 0,
            controls_selected: 0,
            awaiting_rebind: false,
            auth_form,
            contracts: Vec::new(),
            contracts_list: ListState::default(),
            page,
            has_next_page: false,
            upload_prompt: UploadPrompt::default(),
            review_form: None,
            reviews_running: Vec::new(),
            uploading: false,
            review: None,
            clause_rows: Vec::new(),
            clause_list: ListState::default(),
            risky_rows: Vec::new(),
            risky_list: ListState::default(),
            review_focus: ReviewFocus::default(),
            explained: None,
            revealer,
            checklist: None,
            checklist_scroll: 0,
            analytics: None,
        };
        state.resolve_route();
        state
    }

    pub fn route(&self) -> &Route {
        self.nav.current()
    }

    // ── navigation ────────────────────────────────────────────

    pub fn navigate(&mut self, route: Route) {
        self.leave_page();
        self.nav.push(route);
        self.enter_page();
    }

    pub fn go_back(&mut self) {
        if self.nav.depth() > 1 {
            self.leave_page();
            self.nav.back();
            self.enter_page();
        }
    }

    /// Swap Login ↔ Register without growing the history.
    pub fn switch_auth_mode(&mut self) {
        let next = match self.route() {
            Route::Login => Route::Register,
            Route::Register => Route::Login,
            _ => return,
        };
        self.nav.replace(next);
        self.enter_page();
    }

    /// Re-run the auth guard, e.g. after the auth store changed.
    pub fn resolve_route(&mut self) {
        let before = self.route().clone();
        if self.nav.resolve(self.auth.is_authenticated()) {
            self.leave_page_for(&before);
            self.enter_page();
        }
    }

    fn leave_page(&mut self) {
        let current = self.route().clone();
        self.leave_page_for(&current);
    }

    fn leave_page_for(&mut self, route: &Route) {
        self.active_view = ActiveView::Page;
        if matches!(route, Route::Review { .. }) {
            self.revealer.clear();
            self.explained = None;
        }
    }

    fn enter_page(&mut self) {
        self.load_error = None;
        match self.route() {
            Route::Login => self.auth_form = AuthForm::login(),
            Route::Register => self.auth_form = AuthForm::register(),
            _ => {}
        }
    }

    /// Start a page load: bump the generation and clear stale data.
    /// Returns the new generation.
    pub fn begin_load(&mut self) -> u64 {
        self.load_generation = self.load_generation.wrapping_add(1);
        self.loading = true;
        self.load_error = None;
        if let Route::Review { contract_id } = self.route() {
            let same = self
                .review
                .as_ref()
                .is_some_and(|r| &r.contract.id == contract_id);
            if !same {
                self.set_review(None);
            }
        }
        self.load_generation
    }

    // ── toasts ────────────────────────────────────────────────

    pub fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Error => tracing::warn!("{message}"),
            _ => tracing::info!("{message}"),
        }
        self.toasts.push(Toast {
            message,
            level,
            expires_at: Instant::now() + TOAST_TTL,
        });
        if self.toasts.len() > 4 {
            self.toasts.remove(0);
        }
    }

    pub fn expire_toasts(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    // ── review page ───────────────────────────────────────────

    fn set_review(&mut self, review: Option<ContractWithReview>) {
        self.revealer.clear();
        self.explained = None;
        self.clause_list = ListState::default();
        self.risky_list = ListState::default();
        self.review_focus = ReviewFocus::Clauses;
        self.checklist_scroll = 0;
        self.clause_rows = review.as_ref().map(build_clause_rows).unwrap_or_default();
        self.risky_rows = self
            .clause_rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.risk.is_some())
            .map(|(i, _)| i)
            .collect();
        self.checklist = review
            .as_ref()
            .and_then(|r| r.review.as_ref())
            .and_then(|r| r.summary_checklist.as_deref())
            .map(parse_checklist);
        self.review = review;
    }

    /// The clause under the cursor, whichever list has focus.
    pub fn selected_clause_index(&self) -> Option<usize> {
        match self.review_focus {
            ReviewFocus::Clauses => {
                (self.clause_list.selected < self.clause_rows.len()).then_some(self.clause_list.selected)
            }
            ReviewFocus::RiskyClauses => self.risky_rows.get(self.risky_list.selected).copied(),
        }
    }

    pub fn selected_clause(&self) -> Option<&ClauseRow> {
        self.selected_clause_index().and_then(|i| self.clause_rows.get(i))
    }

    /// Explain the clause at `index` in `clause_rows`: point the clause list
    /// at it and queue the request.  Any reveal in progress is cancelled by
    /// the event loop when it starts the new one.
    pub fn explain_clause(&mut self, index: usize) {
        let Some(row) = self.clause_rows.get(index) else {
            return;
        };
        let Route::Review { contract_id } = self.route() else {
            return;
        };
        let command = Command::Explain {
            contract_id: contract_id.clone(),
            clause: row.content.clone(),
        };
        self.clause_list.selected = index;
        self.explained = Some(index);
        self.commands.push(command);
    }

    pub fn explained_clause(&self) -> Option<&ClauseRow> {
        self.explained.and_then(|i| self.clause_rows.get(i))
    }

    // ── background results ────────────────────────────────────

    pub fn apply_reveal_update(&mut self, update: RevealUpdate) {
        if let Applied::Failed(message) = self.revealer.apply(update) {
            self.toast(ToastLevel::Error, format!("Could not explain clause: {message}"));
        }
    }

    pub fn apply_api_update(&mut self, update: ApiUpdate) {
        match update {
            ApiUpdate::SignedIn(result) => {
                self.auth_form.submitting = false;
                match result {
                    // The auth watcher re-runs the guard and lands on the dashboard.
                    Ok(user) => self.toast(ToastLevel::Success, format!("Welcome, {}", user.display_name())),
                    Err(e) => self.api_failed("Invalid credentials", e),
                }
            }
            ApiUpdate::Registered(result) => {
                self.auth_form.submitting = false;
                match result {
                    Ok(user) => {
                        let email = user.email.clone();
                        self.toast(ToastLevel::Success, "Account created, please log in");
                        self.switch_auth_mode();
                        if let Some(field) = self.auth_form.fields.iter_mut().find(|f| f.label == "Email") {
                            field.set(&email);
                        }
                        self.auth_form.focus = 1;
                    }
                    Err(e) => self.api_failed("Failed to register", e),
                }
            }
            ApiUpdate::CurrentUser(result) => {
                if self.route() == &Route::Profile {
                    self.loading = false;
                }
                match result {
                    Ok(user) => {
                        if let Err(e) = self.auth.set_user(user) {
                            tracing::error!("could not persist user: {e}");
                        }
                    }
                    Err(e) => self.api_failed("Could not load profile", e),
                }
            }
            ApiUpdate::Contracts {
                generation,
                page,
                result,
            } => {
                if generation != self.load_generation {
                    return;
                }
                self.loading = false;
                match result {
                    Ok(contracts) => {
                        self.has_next_page = contracts.len() as u32 >= page.limit;
                        self.page = page;
                        self.contracts = contracts;
                        self.contracts_list.selected =
                            self.contracts_list.selected.min(self.contracts.len().saturating_sub(1));
                    }
                    Err(e) => {
                        self.load_error = Some(e.to_string());
                        self.api_failed("Could not load contracts", e);
                    }
                }
            }
            ApiUpdate::ContractReview {
                generation,
                contract_id,
                result,
            } => {
                if generation != self.load_generation {
                    return;
                }
                self.loading = false;
                match result {
                    Ok(review) => {
                        tracing::debug!(%contract_id, clauses = review.contract.clauses.len(), "review loaded");
                        self.set_review(Some(review));
                    }
                    Err(e) => {
                        self.load_error = Some(e.to_string());
                        self.api_failed("Could not load the review", e);
                    }
                }
            }
            ApiUpdate::ReviewFinished { contract_id, result } => {
                self.reviews_running.retain(|id| id != &contract_id);
                match result {
                    Ok(review) => {
                        let title = review.contract.title.clone();
                        self.toast(ToastLevel::Success, format!("Review of \"{title}\" is ready"));
                        if let Some(c) = self.contracts.iter_mut().find(|c| c.id == contract_id) {
                            c.has_review = true;
                        }
                        if matches!(self.route(), Route::Review { contract_id: id } if *id == contract_id) {
                            self.set_review(Some(review));
                        }
                    }
                    Err(e) => self.api_failed("Review failed", e),
                }
            }
            ApiUpdate::Uploaded(result) => {
                self.uploading = false;
                match result {
                    Ok(contract) => {
                        self.toast(ToastLevel::Success, format!("Uploaded \"{}\"", contract.title));
                        if self.route() == &Route::Contracts {
                            self.nav.reload();
                        }
                    }
                    Err(e) => self.api_failed("Upload failed", e),
                }
            }
            ApiUpdate::Analytics { generation, result } => {
                if generation != self.load_generation {
                    return;
                }
                self.loading = false;
                match result {
                    Ok(analytics) => self.analytics = Some(analytics),
                    Err(e) => {
                        self.load_error = Some(e.to_string());
                        self.api_failed("Could not load analytics", e);
                    }
                }
            }
        }
    }

    /// Toast the failure.  A 401 also drops the session; the auth watcher
    /// then sends the user back to the login form.
    fn api_failed(&mut self, what: &str, err: ApiError) {
        if err.is_unauthorized() && self.auth.is_authenticated() {
            self.toast(ToastLevel::Error, "Session expired, please log in again");
            if let Err(e) = self.auth.clear() {
                tracing::error!("could not clear session: {e}");
            }
            return;
        }
        self.toast(ToastLevel::Error, format!("{what}: {err}"));
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.auth.clear() {
            self.toast(ToastLevel::Error, format!("Could not log out: {e}"));
            return;
        }
        self.contracts.clear();
        self.analytics = None;
        self.set_review(None);
        self.resolve_route();
        self.toast(ToastLevel::Info, "Logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::User;
    use crate::core::reveal::Cadence;

    fn user() -> User {
        User {
            id: Some("u1".into()),
            email: "ada@example.com".into(),
            first_name: Some("Ada".into()),
            last_name: None,
        }
    }

    fn state(start: Route, signed_in: bool) -> AppState {
        let auth = AuthStore::in_memory();
        if signed_in {
            auth.set_session("tok".into(), user()).unwrap();
        }
        let (revealer, _rx) = Revealer::new(Cadence::default());
        AppState::new(start, AppConfig::default(), auth, revealer)
    }

    fn contract_with_review(id: &str) -> ContractWithReview {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": "NDA",
            "clauses": [
                {"key": "clause-1", "content": "Definitions."},
                {"key": "clause-2", "content": "Unlimited liability."}
            ],
            "review": {
                "_id": "r1",
                "contract_id": id,
                "risky_clauses": [{
                    "key": "clause-2",
                    "content": "Unlimited liability.",
                    "risk_type": "liability",
                    "risk_level": 3,
                    "concerns": "Uncapped.",
                    "recommendations": "Add a cap."
                }],
                "summary_checklist": "Check: - **Cap** - Add a liability cap."
            }
        }))
        .unwrap()
    }

    #[test]
    fn unauthenticated_start_lands_on_login() {
        let s = state(Route::Analytics, false);
        assert_eq!(s.route(), &Route::Login);
        let s = state(Route::Login, true);
        assert_eq!(s.route(), &Route::Contracts);
    }

    #[test]
    fn stale_page_results_are_dropped() {
        let mut s = state(Route::Analytics, true);
        let old = s.begin_load();
        let current = s.begin_load();
        assert_ne!(old, current);

        s.apply_api_update(ApiUpdate::Analytics {
            generation: old,
            result: Ok(Analytics {
                total_contracts: 99,
                ..Analytics::default()
            }),
        });
        assert!(s.analytics.is_none());
        assert!(s.loading);

        s.apply_api_update(ApiUpdate::Analytics {
            generation: current,
            result: Ok(Analytics::default()),
        });
        assert!(s.analytics.is_some());
        assert!(!s.loading);
    }

    #[test]
    fn review_load_builds_rows_checklist_and_risky_index() {
        let route = Route::Review {
            contract_id: "c1".into(),
        };
        let mut s = state(route, true);
        let generation = s.begin_load();
        s.apply_api_update(ApiUpdate::ContractReview {
            generation,
            contract_id: "c1".into(),
            result: Ok(contract_with_review("c1")),
        });
        assert_eq!(s.clause_rows.len(), 2);
        assert_eq!(s.risky_rows, vec![1]);
        assert_eq!(s.checklist.as_ref().map(|c| c.items.len()), Some(1));

        s.review_focus = ReviewFocus::RiskyClauses;
        assert_eq!(s.selected_clause().map(|r| r.key.as_str()), Some("clause-2"));
    }

    #[test]
    fn explaining_queues_clause_text() {
        let route = Route::Review {
            contract_id: "c1".into(),
        };
        let mut s = state(route, true);
        let generation = s.begin_load();
        s.apply_api_update(ApiUpdate::ContractReview {
            generation,
            contract_id: "c1".into(),
            result: Ok(contract_with_review("c1")),
        });

        s.explain_clause(1);
        assert_eq!(s.explained, Some(1));
        assert_eq!(s.clause_list.selected, 1);
        assert_eq!(
            s.commands,
            vec![Command::Explain {
                contract_id: "c1".into(),
                clause: "Unlimited liability.".into(),
            }]
        );
        s.explain_clause(7);
        assert_eq!(s.commands.len(), 1);
    }

    #[test]
    fn leaving_review_forgets_explanation() {
        let route = Route::Review {
            contract_id: "c1".into(),
        };
        let mut s = state(route, true);
        s.explained = Some(0);
        s.navigate(Route::Analytics);
        assert_eq!(s.explained, None);
        assert_eq!(s.revealer.revealed(), "");
    }

    #[test]
    fn unauthorized_result_logs_out() {
        let mut s = state(Route::Contracts, true);
        let generation = s.begin_load();
        s.apply_api_update(ApiUpdate::Contracts {
            generation,
            page: s.page,
            result: Err(ApiError::Unauthorized),
        });
        assert!(!s.auth.is_authenticated());
        assert!(s.toasts.iter().any(|t| t.level == ToastLevel::Error));
        s.resolve_route();
        assert_eq!(s.route(), &Route::Login);
    }

    #[test]
    fn full_page_means_there_may_be_more() {
        let mut s = state(Route::Contracts, true);
        let generation = s.begin_load();
        let page = Page { page: 1, limit: 1 };
        let contract: Contract = contract_with_review("c1").contract;
        s.apply_api_update(ApiUpdate::Contracts {
            generation,
            page,
            result: Ok(vec![contract]),
        });
        assert!(s.has_next_page);
        assert_eq!(s.page, page);
    }

    #[test]
    fn registration_switches_to_login_with_email_filled() {
        let mut s = state(Route::Register, false);
        s.apply_api_update(ApiUpdate::Registered(Ok(user())));
        assert_eq!(s.route(), &Route::Login);
        assert_eq!(s.auth_form.email(), "ada@example.com");
        assert_eq!(s.auth_form.focus, 1);
    }

    #[test]
    fn toasts_expire() {
        let mut s = state(Route::Login, false);
        s.toast(ToastLevel::Info, "hello");
        s.expire_toasts(Instant::now());
        assert_eq!(s.toasts.len(), 1);
        s.expire_toasts(Instant::now() + TOAST_TTL + Duration::from_millis(1));
        assert!(s.toasts.is_empty());
    }
}
