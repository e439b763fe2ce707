use std::fmt;

/// Screens of the client, addressed by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Jobs,
    JobDetail(String),
    Login,
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            "/jobs" => Route::Jobs,
            "/login" => Route::Login,
            _ => match trimmed.strip_prefix("/jobs/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::JobDetail(id.to_string()),
                _ => Route::NotFound,
            },
        }
    }

    /// Views that need a live credential.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Home | Route::Jobs | Route::JobDetail(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Jobs => write!(f, "/jobs"),
            Route::JobDetail(id) => write!(f, "/jobs/{}", id),
            Route::Login => write!(f, "/login"),
            Route::NotFound => write!(f, "/not-found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded {
    Render(Route),
    /// Always taken with history replaced.
    Redirect(Route),
}

/// Gate a destination on credential presence.
pub fn guard(destination: Route, credential_present: bool) -> Guarded {
    if destination.is_protected() && !credential_present {
        Guarded::Redirect(Route::Login)
    } else {
        Guarded::Render(destination)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Push,
    Replace,
}

/// History stack; the last entry is the current screen.
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            history: vec![initial],
        }
    }

    pub fn current(&self) -> &Route {
        // history is never empty: `back` refuses to pop the last entry
        &self.history[self.history.len() - 1]
    }

    #[allow(dead_code)]
    pub fn history(&self) -> &[Route] {
        &self.history
    }

    pub fn navigate(&mut self, to: Route, mode: NavMode) {
        tracing::debug!(to = %to, ?mode, "navigate");
        match mode {
            NavMode::Push => self.history.push(to),
            NavMode::Replace => {
                let last = self.history.len() - 1;
                self.history[last] = to;
            }
        }
    }

    pub fn back(&mut self) -> bool {
        if self.history.len() > 1 {
            self.history.pop();
            true
        } else {
            false
        }
    }

    /// Run the guard on the current screen, redirecting if it refuses.
    pub fn enforce(&mut self, credential_present: bool) -> &Route {
        if let Guarded::Redirect(to) = guard(self.current().clone(), credential_present) {
            tracing::info!(from = %self.current(), to = %to, "redirecting: no credential");
            self.navigate(to, NavMode::Replace);
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse("/jobs"), Route::Jobs);
        assert_eq!(Route::parse("/jobs/"), Route::Jobs);
        assert_eq!(Route::parse("/jobs/abc-1"), Route::JobDetail("abc-1".to_string()));
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/jobs/a/b"), Route::NotFound);
        assert_eq!(Route::parse("/nowhere"), Route::NotFound);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let detail = Route::JobDetail("42".to_string());
        assert_eq!(detail.to_string(), "/jobs/42");
        assert_eq!(Route::parse(&detail.to_string()), detail);
        assert_eq!(Route::Home.to_string(), "/");
    }

    #[test]
    fn test_guard_without_credential() {
        assert_eq!(guard(Route::Jobs, false), Guarded::Redirect(Route::Login));
        assert_eq!(
            guard(Route::JobDetail("1".to_string()), false),
            Guarded::Redirect(Route::Login)
        );
        assert_eq!(guard(Route::Home, false), Guarded::Redirect(Route::Login));
        assert_eq!(guard(Route::Login, false), Guarded::Render(Route::Login));
        assert_eq!(guard(Route::NotFound, false), Guarded::Render(Route::NotFound));
    }

    #[test]
    fn test_guard_with_credential_renders_unchanged() {
        let detail = Route::JobDetail("1".to_string());
        assert_eq!(guard(detail.clone(), true), Guarded::Render(detail));
    }

    #[test]
    fn test_redirect_replaces_history() {
        let mut nav = Navigator::new(Route::Login);
        nav.navigate(Route::Jobs, NavMode::Push);
        assert_eq!(nav.enforce(false), &Route::Login);

        // The protected entry is gone: back cannot land on it.
        assert!(!nav.history().contains(&Route::Jobs));
        assert!(nav.back());
        assert_eq!(nav.current(), &Route::Login);
        assert!(!nav.back());
    }

    #[test]
    fn test_back_from_detail() {
        let mut nav = Navigator::new(Route::Home);
        nav.navigate(Route::Jobs, NavMode::Push);
        nav.navigate(Route::JobDetail("7".to_string()), NavMode::Push);
        assert_eq!(nav.enforce(true), &Route::JobDetail("7".to_string()));
        assert!(nav.back());
        assert_eq!(nav.current(), &Route::Jobs);
    }
}
