//! Authentication and the current user's session

mod session;
mod types;

use log::{info, warn};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::endpoints;
use crate::error::{Error, FieldErrors, Result};
use crate::fetch::{HttpClient, RequestBody, RequestOptions};

pub use session::*;
pub use types::*;

/// Counters returned by the profile statistics endpoint. The keys depend on
/// the role of the current user.
pub type ProfileStats = BTreeMap<String, i64>;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Client for authentication and the current user's profile
#[derive(Debug, Clone)]
pub struct Auth {
    http: HttpClient,
}

impl Auth {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn store(&self) -> &SessionStore {
        self.http.session()
    }

    fn start_session(&self, response: AuthResponse) -> Result<Session> {
        let session = Session::new(
            response.tokens.access,
            response.tokens.refresh,
            Some(response.user),
        );
        self.store().persist(&session)?;
        Ok(session)
    }

    /// Log in and persist the new session
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let response: AuthResponse = self
            .http
            .request(
                Method::POST,
                endpoints::LOGIN,
                RequestBody::json(credentials)?,
                RequestOptions::new().no_refresh(),
            )
            .await?;

        info!("Logged in as {} ({})", response.user.username, response.user.role);
        self.start_session(response)
    }

    /// Create an account and log into it.
    ///
    /// Mismatching passwords are rejected without contacting the server.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<Session> {
        if payload.password != payload.password2 {
            let mut fields = FieldErrors::new();
            fields.insert(
                "password2".to_string(),
                vec!["Las contraseñas no coinciden".to_string()],
            );
            return Err(Error::Validation(fields));
        }

        let response: AuthResponse = self
            .http
            .request(
                Method::POST,
                endpoints::REGISTER,
                RequestBody::json(payload)?,
                RequestOptions::new().no_refresh(),
            )
            .await?;

        info!("Registered {} ({})", response.user.username, response.user.role);
        self.start_session(response)
    }

    /// Log out. The server is told on a best-effort basis; local storage is
    /// always cleared.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh_token) = self.store().refresh_token() {
            let result = self
                .http
                .request::<Value>(
                    Method::POST,
                    endpoints::LOGOUT,
                    RequestBody::Json(json!({ "refresh_token": refresh_token })),
                    RequestOptions::new().silent(),
                )
                .await;
            if let Err(err) = result {
                warn!("Logout request failed, clearing local session anyway: {}", err);
            }
        }

        self.store().clear_all()?;
        info!("Logged out");
        Ok(())
    }

    /// Fetch the profile of the current user
    pub async fn get_profile(&self) -> Result<UserSummary> {
        self.http.get(endpoints::PROFILE).await
    }

    /// Update the profile. The stored user is replaced by the server's answer.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserSummary> {
        let user: UserSummary = self.http.patch(endpoints::PROFILE, update).await?;
        self.store().set_user(&user)?;
        Ok(user)
    }

    /// Change the password, returning the server's confirmation message
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<Option<String>> {
        let body = PasswordChange {
            old_password,
            new_password,
            new_password2: new_password,
        };
        let response: MessageResponse = self.http.post(endpoints::CHANGE_PASSWORD, &body).await?;
        Ok(response.message)
    }

    /// Change the password after checking the confirmation locally
    pub async fn change_password_confirmed(
        &self,
        old_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Option<String>> {
        if new_password != confirmation {
            let mut fields = FieldErrors::new();
            fields.insert(
                "new_password2".to_string(),
                vec!["Las contraseñas no coinciden".to_string()],
            );
            return Err(Error::Validation(fields));
        }
        self.change_password(old_password, new_password).await
    }

    /// Re-fetch the current user and overwrite the cached copy
    pub async fn refresh_user(&self) -> Result<UserRefresh> {
        let previous = self.store().current_user();
        let user: UserSummary = self.http.get(endpoints::USERS_ME).await?;
        self.store().set_user(&user)?;

        let role_changed = previous.map_or(false, |p| p.role != user.role);
        if role_changed {
            info!("Role of {} changed to {}", user.username, user.role);
        }
        Ok(UserRefresh { user, role_changed })
    }

    /// Role-dependent counters for the current user
    pub async fn profile_stats(&self) -> Result<ProfileStats> {
        self.http.get(endpoints::PROFILE_STATS).await
    }

    /// The cached user
    pub fn current_user(&self) -> Option<UserSummary> {
        self.store().current_user()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store().load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store().is_authenticated()
    }

    /// Name to greet the current user with
    pub fn display_name(&self) -> String {
        self.current_user()
            .map(|user| user.display_name().to_string())
            .unwrap_or_else(|| "Usuario".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOptions;
    use crate::interceptor::{ErrorPolicy, ErrorRoutes, HistoryNavigator, NoticeQueue};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(uri: &str) -> Auth {
        let policy = ErrorPolicy::new(
            ErrorRoutes::default(),
            Arc::new(HistoryNavigator::new()),
            Arc::new(NoticeQueue::new()),
        );
        let options = ClientOptions::default().with_api_base_url(uri);
        Auth::new(HttpClient::new(&options, SessionStore::in_memory(), Arc::new(policy)).unwrap())
    }

    fn user_json(role: &str) -> Value {
        json!({ "id": 2, "username": "ana", "email": "ana@uci.cu", "role": role, "first_name": "Ana" })
    }

    #[tokio::test]
    async fn test_register_password_mismatch_is_local() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let payload = RegisterPayload {
            username: "ana".into(),
            email: "ana@uci.cu".into(),
            password: "secreto123".into(),
            password2: "secreto124".into(),
            ..Default::default()
        };
        let err = auth(&server.uri()).register(&payload).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("password2"));
    }

    #[tokio::test]
    async fn test_update_profile_overwrites_cached_user() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/auth/profile/"))
            .and(body_json(json!({ "telefono": "55512345" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("tutor")))
            .mount(&server)
            .await;

        let auth = auth(&server.uri());
        let stale: UserSummary = serde_json::from_value(json!({
            "id": 2, "username": "ana", "role": "tutor", "matricula": "2020-1"
        }))
        .unwrap();
        auth.store().persist(&Session::new("a".into(), "r".into(), Some(stale))).unwrap();

        let update = ProfileUpdate {
            telefono: Some("55512345".into()),
            ..Default::default()
        };
        auth.update_profile(&update).await.unwrap();

        let cached = auth.current_user().unwrap();
        assert_eq!(cached.matricula, None);
        assert_eq!(cached.display_name(), "Ana");
    }

    #[tokio::test]
    async fn test_change_password_sends_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/change-password/"))
            .and(body_json(json!({
                "old_password": "viejo",
                "new_password": "nuevo1234",
                "new_password2": "nuevo1234"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "message": "Contraseña actualizada exitosamente" })),
            )
            .mount(&server)
            .await;

        let auth = auth(&server.uri());
        let message = auth.change_password("viejo", "nuevo1234").await.unwrap();
        assert_eq!(message.as_deref(), Some("Contraseña actualizada exitosamente"));

        assert!(auth
            .change_password_confirmed("viejo", "nuevo1234", "otro")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_refresh_user_reports_role_change() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/users/me/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("jefe")))
            .mount(&server)
            .await;

        let auth = auth(&server.uri());
        let cached: UserSummary = serde_json::from_value(user_json("tutor")).unwrap();
        auth.store().persist(&Session::new("a".into(), "r".into(), Some(cached))).unwrap();

        let refreshed = auth.refresh_user().await.unwrap();
        assert!(refreshed.role_changed);
        assert_eq!(auth.current_user().unwrap().role, Role::Jefe);
    }

    #[tokio::test]
    async fn test_profile_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/profile/stats/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "total_alumnos": 4, "opiniones_emitidas": 7 })),
            )
            .mount(&server)
            .await;

        let stats = auth(&server.uri()).profile_stats().await.unwrap();
        assert_eq!(stats["opiniones_emitidas"], 7);
    }

    #[test]
    fn test_login_persists_session() {
        tokio_test::block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/auth/login/"))
                .and(body_json(json!({ "username": "ana", "password": "secreto123" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "user": user_json("estudiante"),
                    "tokens": { "access": "acc", "refresh": "ref" },
                    "message": "Login exitoso"
                })))
                .mount(&server)
                .await;

            let auth = auth(&server.uri());
            let session = auth
                .login(&Credentials::new("ana", "secreto123"))
                .await
                .unwrap();
            assert_eq!(session.refresh_token, "ref");
            assert_eq!(auth.current_session(), Some(session));
            assert_eq!(auth.display_name(), "Ana");
        });
    }

    #[test]
    fn test_logout_without_session_makes_no_request() {
        tokio_test::block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/auth/logout/"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            let auth = auth(&server.uri());
            auth.logout().await.unwrap();
            assert!(!auth.is_authenticated());
        });
    }

    #[test]
    fn test_display_name_fallback() {
        let auth = auth("http://localhost:8000/api");
        assert_eq!(auth.display_name(), "Usuario");
    }
}
