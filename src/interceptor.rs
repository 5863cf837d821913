//! What happens after a request fails for good: which notice the user sees and
//! which view the application is sent to.
//!
//! Routing on errors is a declarative table ([`ErrorRoutes`]) handed to a
//! [`Navigator`], so the embedding application decides how navigation is
//! performed.

use log::{error, info, warn};
use reqwest::{Method, StatusCode};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::auth::Role;
use crate::error::{Error, ErrorKind, FieldErrors};

/// Application views the client can send the user to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Forbidden,
    NotFound,
    ServerError,
    /// Landing page of a role
    Home(Role),
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Forbidden => "/forbidden",
            Route::NotFound => "/not-found",
            Route::ServerError => "/server-error",
            Route::Home(Role::Estudiante) => "/inicio",
            Route::Home(Role::Jefe) => "/jefe/inicio",
            Route::Home(Role::Tutor) => "/tutor/inicio",
            Route::Home(Role::Admin) => "/admin/inicio",
        }
    }

    /// Error views are static pages linking back to the application root
    pub fn is_error_view(&self) -> bool {
        matches!(self, Route::Forbidden | Route::NotFound | Route::ServerError)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Performs navigation on behalf of the client
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Routes kept by a [`HistoryNavigator`] unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Navigator that records where the client asked to go. Only the latest
/// `limit` routes are kept.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<VecDeque<Route>>,
    limit: usize,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    /// Recorded routes, oldest first
    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The last route navigated to
    pub fn current(&self) -> Option<Route> {
        self.history.lock().ok().and_then(|h| h.back().copied())
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        info!("Navigating to {}", route);
        if let Ok(mut history) = self.history.lock() {
            if history.len() == self.limit {
                history.pop_front();
            }
            history.push_back(route);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-visible message (a toast in a graphical client)
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub field_errors: FieldErrors,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            field_errors: FieldErrors::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn with_field_errors(mut self, fields: FieldErrors) -> Self {
        self.field_errors = fields;
        self
    }
}

/// Shows notices to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier writing notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Error => error!("{} {:?}", notice.message, notice.field_errors),
        }
    }
}

/// Notifier queueing notices until the application drains them
#[derive(Debug, Default)]
pub struct NoticeQueue {
    notices: Mutex<VecDeque<Notice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut q| q.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NoticeQueue {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push_back(notice);
        }
    }
}

/// Which request methods a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    fn matches(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(m) => m == method,
        }
    }
}

/// Send the user to `route` when a request with a matching method fails with `status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub status: StatusCode,
    pub methods: MethodFilter,
    pub route: Route,
}

/// Error status to view mapping. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRoutes {
    rules: Vec<RouteRule>,
}

impl Default for ErrorRoutes {
    /// 403 → forbidden, 404 on reads → not found, 500 → server error
    fn default() -> Self {
        Self::empty()
            .with_rule(StatusCode::FORBIDDEN, MethodFilter::Any, Route::Forbidden)
            .with_rule(
                StatusCode::NOT_FOUND,
                MethodFilter::Only(Method::GET),
                Route::NotFound,
            )
            .with_rule(
                StatusCode::INTERNAL_SERVER_ERROR,
                MethodFilter::Any,
                Route::ServerError,
            )
    }
}

impl ErrorRoutes {
    /// A table that never navigates
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, status: StatusCode, methods: MethodFilter, route: Route) -> Self {
        self.rules.push(RouteRule {
            status,
            methods,
            route,
        });
        self
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn route_for(&self, method: &Method, status: StatusCode) -> Option<Route> {
        self.rules
            .iter()
            .find(|rule| rule.status == status && rule.methods.matches(method))
            .map(|rule| rule.route)
    }
}

pub const MSG_CONNECTION: &str = "Error de conexión. Verifica tu internet";
pub const MSG_BAD_REQUEST: &str = "Datos inválidos";
pub const MSG_UNAUTHORIZED: &str = "No autorizado. Por favor inicia sesión nuevamente";
pub const MSG_FORBIDDEN: &str = "No tienes permisos para realizar esta acción";
pub const MSG_NOT_FOUND: &str = "Recurso no encontrado";
pub const MSG_SERVER: &str = "Error del servidor. Intenta más tarde";
pub const MSG_GENERIC: &str = "Error al procesar la solicitud";

/// Notice and navigation decided for one failed request
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorAction {
    pub notice: Option<Notice>,
    pub route: Option<Route>,
}

/// Applies the user-facing side effects of a failed request
#[derive(Clone)]
pub struct ErrorPolicy {
    routes: ErrorRoutes,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl ErrorPolicy {
    pub fn new(routes: ErrorRoutes, navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            routes,
            navigator,
            notifier,
        }
    }

    pub fn routes(&self) -> &ErrorRoutes {
        &self.routes
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Decide what the user sees for `err` raised by a `method` request
    pub fn resolve(&self, method: &Method, err: &Error) -> ErrorAction {
        let route = err
            .status()
            .and_then(|status| self.routes.route_for(method, status));

        let notice = match (err, err.kind()) {
            (_, ErrorKind::Transport) => Notice::error(MSG_CONNECTION),
            (Error::Api { body, .. }, ErrorKind::Validation) => {
                Notice::error(body.message.clone().unwrap_or_else(|| MSG_BAD_REQUEST.to_string()))
                    .with_field_errors(body.fields.clone())
            }
            (_, ErrorKind::Authentication) => Notice::error(MSG_UNAUTHORIZED),
            (_, ErrorKind::Authorization) => Notice::error(MSG_FORBIDDEN),
            (_, ErrorKind::NotFound) => Notice::error(MSG_NOT_FOUND),
            (_, ErrorKind::Server) => Notice::error(MSG_SERVER),
            (Error::Api { body, .. }, _) => {
                Notice::error(body.message.clone().unwrap_or_else(|| MSG_GENERIC.to_string()))
            }
            (other, _) => Notice::error(format!("Error inesperado: {}", other)),
        };

        ErrorAction {
            notice: Some(notice),
            route,
        }
    }

    /// Resolve and perform the side effects for `err`
    pub fn apply(&self, method: &Method, err: &Error) -> ErrorAction {
        let action = self.resolve(method, err);
        if let Some(notice) = &action.notice {
            self.notifier.notify(notice.clone());
        }
        if let Some(route) = action.route {
            self.navigator.navigate(route);
        }
        action
    }

    /// Send the user to the login view
    pub fn force_login(&self) {
        self.navigator.navigate(Route::Login);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorBody;

    fn api_error(status: u16, text: &str) -> Error {
        Error::Api {
            status,
            body: ApiErrorBody::parse(text),
        }
    }

    fn policy() -> (ErrorPolicy, Arc<HistoryNavigator>, Arc<NoticeQueue>) {
        let navigator = Arc::new(HistoryNavigator::new());
        let notices = Arc::new(NoticeQueue::new());
        let policy = ErrorPolicy::new(ErrorRoutes::default(), navigator.clone(), notices.clone());
        (policy, navigator, notices)
    }

    #[test]
    fn test_history_is_bounded() {
        let navigator = HistoryNavigator::with_limit(2);
        navigator.navigate(Route::Login);
        navigator.navigate(Route::Forbidden);
        navigator.navigate(Route::NotFound);
        assert_eq!(navigator.history(), vec![Route::Forbidden, Route::NotFound]);
        assert_eq!(navigator.current(), Some(Route::NotFound));

        let default = HistoryNavigator::new();
        for _ in 0..DEFAULT_HISTORY_LIMIT + 10 {
            default.navigate(Route::ServerError);
        }
        assert_eq!(default.history().len(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_default_routes() {
        let routes = ErrorRoutes::default();
        assert_eq!(routes.route_for(&Method::GET, StatusCode::FORBIDDEN), Some(Route::Forbidden));
        assert_eq!(routes.route_for(&Method::POST, StatusCode::FORBIDDEN), Some(Route::Forbidden));
        assert_eq!(routes.route_for(&Method::GET, StatusCode::NOT_FOUND), Some(Route::NotFound));
        assert_eq!(routes.route_for(&Method::DELETE, StatusCode::NOT_FOUND), None);
        assert_eq!(routes.route_for(&Method::PATCH, StatusCode::NOT_FOUND), None);
        assert_eq!(
            routes.route_for(&Method::PUT, StatusCode::INTERNAL_SERVER_ERROR),
            Some(Route::ServerError)
        );
        assert_eq!(routes.route_for(&Method::GET, StatusCode::BAD_REQUEST), None);
    }

    #[test]
    fn test_bad_request_carries_field_errors() {
        let (policy, navigator, notices) = policy();
        let err = api_error(400, r#"{"titulo": ["Este campo es requerido."]}"#);

        let action = policy.apply(&Method::POST, &err);
        assert_eq!(action.route, None);
        assert!(navigator.history().is_empty());

        let notice = notices.drain().pop().unwrap();
        assert_eq!(notice.message, MSG_BAD_REQUEST);
        assert_eq!(notice.field_errors["titulo"], vec!["Este campo es requerido."]);
    }

    #[test]
    fn test_server_message_preferred_for_bad_request() {
        let (policy, _, notices) = policy();
        policy.apply(&Method::POST, &api_error(400, r#"{"error": "La solicitud no está en proceso"}"#));
        assert_eq!(notices.drain()[0].message, "La solicitud no está en proceso");
    }

    #[test]
    fn test_status_routing() {
        let (policy, navigator, _) = policy();
        policy.apply(&Method::POST, &api_error(403, "{}"));
        policy.apply(&Method::GET, &api_error(404, "{}"));
        policy.apply(&Method::DELETE, &api_error(404, "{}"));
        policy.apply(&Method::GET, &api_error(500, ""));
        assert_eq!(
            navigator.history(),
            vec![Route::Forbidden, Route::NotFound, Route::ServerError]
        );
    }

    #[test]
    fn test_unmatched_status_uses_generic_notice() {
        let (policy, navigator, notices) = policy();
        policy.apply(&Method::GET, &api_error(409, ""));
        assert_eq!(notices.drain()[0].message, MSG_GENERIC);
        assert!(navigator.current().is_none());
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home(Role::Jefe).path(), "/jefe/inicio");
        assert_eq!(Route::Home(Role::Estudiante).path(), "/inicio");
        assert!(Route::ServerError.is_error_view());
        assert!(!Route::Login.is_error_view());
    }
}
