//! ECE Rust Client Library
//!
//! A client for the ECE academic workflow API: authentication with refreshing
//! JWT sessions, student publications, ECE modality requests, tutor opinions
//! and the administration endpoints.

pub mod admin;
pub mod auth;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod interceptor;
pub mod listing;
pub mod opinions;
pub mod publications;
pub mod requests;
pub mod storage;
pub mod users;
pub mod validation;

use std::sync::Arc;

use crate::admin::{NotificationsClient, SystemConfigClient, SystemLogsClient};
use crate::auth::{Auth, Role, SessionStore};
use crate::config::ClientOptions;
use crate::error::Result;
use crate::fetch::HttpClient;
use crate::guard::{GuardOutput, RouteGuard, RouteTable};
use crate::interceptor::{ErrorPolicy, ErrorRoutes, HistoryNavigator, LogNotifier, Navigator, Notifier};
use crate::opinions::{TutorOpinionsClient, TutorStudentsClient};
use crate::publications::PublicationsClient;
use crate::requests::EceRequestsClient;
use crate::storage::{FileStorage, MemoryStorage, Storage};
use crate::users::UsersClient;

/// The main entry point for the ECE client
#[derive(Debug)]
pub struct EceClient {
    /// Client options
    pub options: ClientOptions,
    http: HttpClient,
    auth: Auth,
}

impl EceClient {
    /// Create a new client for the API at `api_base_url`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ece_client::EceClient;
    ///
    /// let client = EceClient::new("http://127.0.0.1:8000/api").unwrap();
    /// ```
    pub fn new(api_base_url: &str) -> Result<Self> {
        Self::new_with_options(ClientOptions::default().with_api_base_url(api_base_url))
    }

    /// Create a new client with custom options.
    ///
    /// The session is kept in `options.storage_path` when set, in memory
    /// otherwise. The latest routes are recorded by a [`HistoryNavigator`] and notices
    /// go to the log until replaced.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ece_client::{EceClient, config::ClientOptions};
    ///
    /// let options = ClientOptions::from_env()
    ///     .unwrap()
    ///     .with_storage_path("/tmp/ece-session.json");
    /// let client = EceClient::new_with_options(options).unwrap();
    /// ```
    pub fn new_with_options(options: ClientOptions) -> Result<Self> {
        let storage: Arc<dyn Storage> = match &options.storage_path {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };
        let policy = ErrorPolicy::new(
            ErrorRoutes::default(),
            Arc::new(HistoryNavigator::new()),
            Arc::new(LogNotifier),
        );

        let http = HttpClient::new(&options, SessionStore::new(storage), Arc::new(policy))?;
        let auth = Auth::new(http.clone());

        Ok(Self { options, http, auth })
    }

    fn rebuild(mut self, session: SessionStore, policy: ErrorPolicy) -> Self {
        self.http = self.http.with_context(session, Arc::new(policy));
        self.auth = Auth::new(self.http.clone());
        self
    }

    /// Keep the session in `storage`
    pub fn with_storage(self, storage: Arc<dyn Storage>) -> Self {
        let policy = self.http.policy().as_ref().clone();
        self.rebuild(SessionStore::new(storage), policy)
    }

    /// Perform error and logout navigation through `navigator`
    pub fn with_navigator(self, navigator: Arc<dyn Navigator>) -> Self {
        let current = self.http.policy();
        let policy = ErrorPolicy::new(current.routes().clone(), navigator, current.notifier().clone());
        let session = self.http.session().clone();
        self.rebuild(session, policy)
    }

    /// Show notices through `notifier`
    pub fn with_notifier(self, notifier: Arc<dyn Notifier>) -> Self {
        let current = self.http.policy();
        let policy = ErrorPolicy::new(current.routes().clone(), current.navigator().clone(), notifier);
        let session = self.http.session().clone();
        self.rebuild(session, policy)
    }

    /// Replace the error status to view table
    pub fn with_error_routes(self, routes: ErrorRoutes) -> Self {
        let current = self.http.policy();
        let policy = ErrorPolicy::new(routes, current.navigator().clone(), current.notifier().clone());
        let session = self.http.session().clone();
        self.rebuild(session, policy)
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The session shared by every request of this client
    pub fn session(&self) -> &SessionStore {
        self.http.session()
    }

    /// The underlying HTTP client, for endpoints without a façade
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn publications(&self) -> PublicationsClient {
        PublicationsClient::new(self.http.clone())
    }

    pub fn requests(&self) -> EceRequestsClient {
        EceRequestsClient::new(self.http.clone())
    }

    pub fn opinions(&self) -> TutorOpinionsClient {
        TutorOpinionsClient::new(self.http.clone())
    }

    pub fn tutor_students(&self) -> TutorStudentsClient {
        TutorStudentsClient::new(self.http.clone())
    }

    pub fn users(&self) -> UsersClient {
        UsersClient::new(self.http.clone())
    }

    pub fn system_logs(&self) -> SystemLogsClient {
        SystemLogsClient::new(self.http.clone())
    }

    pub fn system_config(&self) -> SystemConfigClient {
        SystemConfigClient::new(self.http.clone())
    }

    pub fn notifications(&self) -> NotificationsClient {
        NotificationsClient::new(self.http.clone())
    }

    /// A guard for `role`, already checked against the current session
    pub fn guard(&self, role: Role) -> RouteGuard {
        let mut guard = RouteGuard::new(role);
        guard.mount(self.session());
        guard
    }

    /// Decide what to show for an application path
    pub fn resolve_route<T>(&self, path: &str, children: T) -> GuardOutput<T> {
        RouteTable::default().resolve(path, self.session(), children)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Credentials, Role, Session, UserSummary};
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::guard::{GuardDecision, GuardOutput};
    pub use crate::interceptor::{Notice, Route};
    pub use crate::EceClient;
}
