//! Navigation: named routes, a back-stack, and the auth guard.

/// Every page the app can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    /// Contract history (the dashboard index).
    Contracts,
    Review { contract_id: String },
    Analytics,
    Profile,
}

impl Route {
    /// Pages that need a token.
    pub fn is_private(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::Register => "/register".into(),
            Route::Contracts => "/dashboard/history".into(),
            Route::Review { contract_id } => format!("/dashboard/contract/{contract_id}/review"),
            Route::Analytics => "/dashboard/analytics".into(),
            Route::Profile => "/dashboard/profile".into(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Contracts => "Contracts",
            Route::Review { .. } => "Review",
            Route::Analytics => "Analytics",
            Route::Profile => "Profile",
        }
    }

    /// Inverse of [`Route::path`].  `/` and `/dashboard` land on the
    /// contract list.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] | ["dashboard"] | ["dashboard", "history"] => Some(Route::Contracts),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["dashboard", "analytics"] => Some(Route::Analytics),
            ["dashboard", "profile"] => Some(Route::Profile),
            ["dashboard", "contract", id] | ["dashboard", "contract", id, "review"] => {
                Some(Route::Review {
                    contract_id: (*id).to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Where `route` actually leads given the auth state: private pages bounce
/// to the login form, and the login/register forms bounce a signed-in user
/// to the dashboard.
pub fn guard(route: Route, authenticated: bool) -> Route {
    match (route.is_private(), authenticated) {
        (true, false) => Route::Login,
        (false, true) => Route::Contracts,
        _ => route,
    }
}

/// Back-stack of visited routes.
#[derive(Debug)]
pub struct Navigator {
    stack: Vec<Route>,
    /// Set by [`Navigator::reload`] and by every route change; the event
    /// loop clears it once it has (re)fetched the page's data.
    pending_load: bool,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            stack: vec![start],
            pending_load: true,
        }
    }

    pub fn current(&self) -> &Route {
        // The stack is never empty: `back` keeps the root.
        &self.stack[self.stack.len() - 1]
    }

    pub fn push(&mut self, route: Route) {
        if *self.current() != route {
            self.stack.push(route);
        }
        self.pending_load = true;
    }

    /// Swap the current route without growing the stack.
    pub fn replace(&mut self, route: Route) {
        if let Some(top) = self.stack.last_mut() {
            *top = route;
        }
        self.pending_load = true;
    }

    /// Pop one level.  Returns `false` at the root.
    pub fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            self.pending_load = true;
            true
        } else {
            false
        }
    }

    pub fn reload(&mut self) {
        self.pending_load = true;
    }

    /// Take the pending-load flag.
    pub fn take_pending_load(&mut self) -> bool {
        std::mem::take(&mut self.pending_load)
    }

    /// Apply the guard to the current route.  A redirect resets the stack,
    /// so "back" cannot return to a page the user may no longer see.
    /// Returns `true` when the route changed.
    pub fn resolve(&mut self, authenticated: bool) -> bool {
        let current = self.current().clone();
        let target = guard(current.clone(), authenticated);
        if target == current {
            return false;
        }
        tracing::debug!(from = %current.path(), to = %target.path(), "route guard redirect");
        self.stack = vec![target];
        self.pending_load = true;
        true
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str) -> Route {
        Route::Review {
            contract_id: id.into(),
        }
    }

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Login,
            Route::Register,
            Route::Contracts,
            review("66a1"),
            Route::Analytics,
            Route::Profile,
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/"), Some(Route::Contracts));
        assert_eq!(Route::parse("/dashboard/"), Some(Route::Contracts));
        assert_eq!(Route::parse("/dashboard/contract/abc"), Some(review("abc")));
        assert_eq!(Route::parse("/404"), None);
    }

    #[test]
    fn guard_redirects_both_ways() {
        assert_eq!(guard(Route::Analytics, false), Route::Login);
        assert_eq!(guard(review("x"), false), Route::Login);
        assert_eq!(guard(Route::Login, true), Route::Contracts);
        assert_eq!(guard(Route::Register, true), Route::Contracts);
        assert_eq!(guard(Route::Register, false), Route::Register);
        assert_eq!(guard(review("x"), true), review("x"));
    }

    #[test]
    fn push_back_and_root() {
        let mut nav = Navigator::new(Route::Contracts);
        assert!(nav.take_pending_load());
        assert!(!nav.take_pending_load());

        nav.push(review("a"));
        nav.push(review("a"));
        assert_eq!(nav.depth(), 2);
        assert!(nav.take_pending_load());

        assert!(nav.back());
        assert_eq!(nav.current(), &Route::Contracts);
        assert!(!nav.back());
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn resolve_resets_stack_on_redirect() {
        let mut nav = Navigator::new(Route::Contracts);
        nav.push(review("a"));
        nav.take_pending_load();

        // Logout.
        assert!(nav.resolve(false));
        assert_eq!(nav.current(), &Route::Login);
        assert_eq!(nav.depth(), 1);
        assert!(nav.take_pending_load());

        // Nothing to do while the state is consistent.
        assert!(!nav.resolve(false));

        // Login again.
        assert!(nav.resolve(true));
        assert_eq!(nav.current(), &Route::Contracts);
    }

    #[test]
    fn replace_keeps_depth() {
        let mut nav = Navigator::new(Route::Contracts);
        nav.push(Route::Analytics);
        nav.replace(Route::Profile);
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.current(), &Route::Profile);
    }
}
