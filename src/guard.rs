//! Role-gated access to application views.
//!
//! A guard checks the stored session once, when it is mounted. Later logins,
//! logouts or role changes made through another client sharing the same
//! storage are only seen by the next guard that gets mounted.

use log::debug;

use crate::auth::{Role, SessionStore};
use crate::interceptor::Route;

/// Outcome of checking a session against a required role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Not checked yet
    Unknown,
    Authorized,
    Unauthorized,
}

/// What a guarded view should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutput<T> {
    Loading,
    Render(T),
    Redirect(Route),
}

impl<T> GuardOutput<T> {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardOutput::Render(_))
    }

    pub fn redirect_target(&self) -> Option<Route> {
        match self {
            GuardOutput::Redirect(route) => Some(*route),
            _ => None,
        }
    }
}

/// Authorized iff a session exists and its user has exactly `role`
pub fn evaluate(store: &SessionStore, role: Role) -> GuardDecision {
    if store.load().is_none() {
        return GuardDecision::Unauthorized;
    }
    match store.current_user() {
        Some(user) if user.role == role => GuardDecision::Authorized,
        _ => GuardDecision::Unauthorized,
    }
}

/// Guard for a view reserved to one role
#[derive(Debug, Clone)]
pub struct RouteGuard {
    required: Role,
    decision: GuardDecision,
}

impl RouteGuard {
    pub fn new(required: Role) -> Self {
        Self {
            required,
            decision: GuardDecision::Unknown,
        }
    }

    pub fn required_role(&self) -> Role {
        self.required
    }

    /// Check the session. Only the first call has an effect.
    pub fn mount(&mut self, store: &SessionStore) -> GuardDecision {
        if self.decision == GuardDecision::Unknown {
            self.decision = evaluate(store, self.required);
            debug!("Guard for {} mounted: {:?}", self.required, self.decision);
        }
        self.decision
    }

    pub fn decision(&self) -> GuardDecision {
        self.decision
    }

    pub fn render<T>(&self, children: T) -> GuardOutput<T> {
        match self.decision {
            GuardDecision::Unknown => GuardOutput::Loading,
            GuardDecision::Authorized => GuardOutput::Render(children),
            GuardDecision::Unauthorized => GuardOutput::Redirect(Route::Login),
        }
    }
}

/// Guard for the login and register views: a logged-in user is sent home
#[derive(Debug, Clone, Default)]
pub struct PublicGuard {
    home: Option<Option<Route>>,
}

impl PublicGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, store: &SessionStore) {
        if self.home.is_none() {
            let home = store
                .load()
                .and(store.current_user())
                .map(|user| Route::Home(user.role));
            self.home = Some(home);
        }
    }

    pub fn render<T>(&self, children: T) -> GuardOutput<T> {
        match self.home {
            None => GuardOutput::Loading,
            Some(None) => GuardOutput::Render(children),
            Some(Some(home)) => GuardOutput::Redirect(home),
        }
    }
}

/// Who may open a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Open to everyone; logged-in users are sent to their home
    Public,
    /// Static error views
    Open,
    Role(Role),
    /// Unknown path
    Unmatched,
}

/// Path to access rule mapping of the application
#[derive(Debug, Clone)]
pub struct RouteTable {
    exact: Vec<(&'static str, RouteAccess)>,
    prefixes: Vec<(&'static str, RouteAccess)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            exact: vec![
                ("/login", RouteAccess::Public),
                ("/register", RouteAccess::Public),
                ("/forbidden", RouteAccess::Open),
                ("/not-found", RouteAccess::Open),
                ("/server-error", RouteAccess::Open),
                ("/", RouteAccess::Role(Role::Estudiante)),
                ("/inicio", RouteAccess::Role(Role::Estudiante)),
                ("/publicaciones", RouteAccess::Role(Role::Estudiante)),
                ("/solicitud", RouteAccess::Role(Role::Estudiante)),
                ("/perfil", RouteAccess::Role(Role::Estudiante)),
            ],
            prefixes: vec![
                ("/jefe", RouteAccess::Role(Role::Jefe)),
                ("/tutor", RouteAccess::Role(Role::Tutor)),
                ("/admin", RouteAccess::Role(Role::Admin)),
            ],
        }
    }
}

impl RouteTable {
    pub fn access(&self, path: &str) -> RouteAccess {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        if let Some((_, access)) = self.exact.iter().find(|(p, _)| *p == path) {
            return *access;
        }

        self.prefixes
            .iter()
            .find(|(prefix, _)| {
                path == *prefix
                    || path
                        .strip_prefix(prefix)
                        .map_or(false, |rest| rest.starts_with('/'))
            })
            .map(|(_, access)| *access)
            .unwrap_or(RouteAccess::Unmatched)
    }

    /// Decide what to show for `path` given the stored session
    pub fn resolve<T>(&self, path: &str, store: &SessionStore, children: T) -> GuardOutput<T> {
        match self.access(path) {
            RouteAccess::Open => GuardOutput::Render(children),
            RouteAccess::Public => {
                let mut guard = PublicGuard::new();
                guard.mount(store);
                guard.render(children)
            }
            RouteAccess::Role(role) => {
                let mut guard = RouteGuard::new(role);
                guard.mount(store);
                guard.render(children)
            }
            RouteAccess::Unmatched => GuardOutput::Redirect(Route::Login),
        }
    }
}
