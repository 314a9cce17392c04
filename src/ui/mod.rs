//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the application state and turns it into cells on the
//! terminal.  No network or disk I/O happens here.

pub mod auth;
pub mod contracts;
pub mod dashboard;
pub mod layout;
pub mod list;
pub mod popup;
pub mod review;
pub mod spinner;
pub mod theme;
pub mod toast;

use ratatui::{
    text::{Line, Span},
    widgets::{Paragraph, StatefulWidget, Widget},
    Frame,
};

use crate::app::route::Route;
use crate::app::state::{ActiveView, AppState};
use crate::config::Action;

use self::layout::AppLayout;
use self::theme::Theme;

/// Actions worth advertising in the status bar for `route`.
fn route_hints(route: &Route) -> &'static [Action] {
    match route {
        Route::Login | Route::Register => &[],
        Route::Contracts => &[
            Action::Select,
            Action::Upload,
            Action::RunReview,
            Action::NextPage,
            Action::GoAnalytics,
            Action::OpenSettings,
            Action::Quit,
        ],
        Route::Review { .. } => &[
            Action::Select,
            Action::Checklist,
            Action::RunReview,
            Action::Back,
            Action::OpenSettings,
            Action::Quit,
        ],
        Route::Analytics | Route::Profile => &[
            Action::GoContracts,
            Action::Refresh,
            Action::Logout,
            Action::OpenSettings,
            Action::Quit,
        ],
    }
}

/// Render one frame.
pub fn draw(frame: &mut Frame, state: &mut AppState) {
    let area = frame.area();
    state.terminal_area = area;
    let theme = Theme::new(state.config.theme);
    let route = state.route().clone();

    if matches!(route, Route::Login | Route::Register) {
        frame.render_widget(
            auth::AuthPage {
                form: &state.auth_form,
                tick: state.tick,
                theme,
            },
            area,
        );
        frame.render_widget(
            toast::ToastStack {
                toasts: &state.toasts,
                theme,
            },
            area,
        );
        return;
    }

    let layout = AppLayout::from_area(area);

    // ── header ────────────────────────────────────────────────
    let user = state
        .auth
        .user()
        .map(|u| u.display_name())
        .unwrap_or_default();
    let header = Line::from(vec![
        Span::styled(" juris ", theme.title_style()),
        Span::styled(format!("› {} ", route.title()), theme.heading_style()),
        Span::styled(format!(" {user}"), theme.dim_style()),
    ]);
    frame.render_widget(Paragraph::new(header), layout.header_area);
    frame.render_widget(
        spinner::BusyIndicator {
            visible: state.loading || state.uploading || !state.reviews_running.is_empty(),
            tick: state.tick,
            label: if state.uploading {
                "uploading"
            } else if !state.reviews_running.is_empty() {
                "reviewing"
            } else {
                "loading"
            },
            style: theme.stat_value_style(),
        },
        layout.header_area,
    );

    // ── body ──────────────────────────────────────────────────
    let buf = frame.buffer_mut();
    match &route {
        Route::Contracts => {
            let page = contracts::ContractsPage {
                contracts: &state.contracts,
                page: state.page,
                has_next_page: state.has_next_page,
                reviews_running: &state.reviews_running,
                load_error: state.load_error.as_deref(),
                theme,
            };
            page.render(layout.body_area, buf, &mut state.contracts_list);
        }
        Route::Review { .. } => review::render_review(state, layout.body_area, buf, theme),
        Route::Analytics => dashboard::AnalyticsPage {
            analytics: state.analytics.as_ref(),
            loading: state.loading,
            load_error: state.load_error.as_deref(),
            theme,
        }
        .render(layout.body_area, buf),
        Route::Profile => {
            let user = state.auth.user();
            dashboard::ProfilePage {
                user: user.as_ref(),
                logout_key: state.config.short_binding(Action::Logout),
                theme,
            }
            .render(layout.body_area, buf);
        }
        Route::Login | Route::Register => {}
    }

    // ── status bar ────────────────────────────────────────────
    let hint = match state.active_view {
        ActiveView::Page => state.config.status_bar_hint(route_hints(&route)),
        _ => String::new(),
    };
    frame.render_widget(
        Paragraph::new(hint).style(theme.status_bar_style()),
        layout.status_area,
    );

    // ── overlays ──────────────────────────────────────────────
    match state.active_view {
        ActiveView::Page => {}
        ActiveView::SettingsMenu => frame.render_widget(popup::SettingsPopup { state: &*state, theme }, area),
        ActiveView::ControlsSubmenu => frame.render_widget(
            popup::ControlsPopup {
                config: &state.config,
                selected: state.controls_selected,
                awaiting_rebind: state.awaiting_rebind,
                theme,
            },
            area,
        ),
        ActiveView::ReviewForm => {
            if let Some(form) = &state.review_form {
                frame.render_widget(popup::ReviewFormPopup { form, theme }, area);
            }
        }
        ActiveView::UploadPrompt => frame.render_widget(
            popup::UploadPopup {
                prompt: &state.upload_prompt,
                theme,
            },
            area,
        ),
        ActiveView::Checklist => {
            if let Some(checklist) = &state.checklist {
                frame.render_widget(
                    popup::ChecklistPopup {
                        checklist,
                        scroll: state.checklist_scroll,
                        theme,
                    },
                    area,
                );
            }
        }
    }

    frame.render_widget(
        toast::ToastStack {
            toasts: &state.toasts,
            theme,
        },
        area,
    );
}
