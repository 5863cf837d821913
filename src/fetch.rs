//! HTTP client wrapper for the ECE API.
//!
//! Every request reads the access token from the [`SessionStore`] right before
//! it is sent. A 401 triggers one token refresh and one replay of the request;
//! any other failure is handed to the [`ErrorPolicy`].

use log::{debug, info, warn};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

use crate::auth::{RefreshResponse, SessionStore};
use crate::config::ClientOptions;
use crate::endpoints;
use crate::error::{Error, Result};
use crate::interceptor::ErrorPolicy;

/// Which attempt of a request is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    /// Replay after a token refresh. Never refreshed again.
    Retried,
}

/// Lifecycle of one outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Sent,
    Success,
    Failed401Retrying,
    Failed401Final,
    FailedOther,
}

/// A file attached to a multipart request
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// A file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime: None,
            bytes,
        }
    }

    /// Read a file from disk
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::general(format!("not a file path: {}", path.display())))?;
        let bytes = std::fs::read(path)
            .map_err(|e| Error::general(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(file_name, bytes))
    }

    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime = Some(mime.to_string());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Multipart body kept in memory so it can be sent again after a refresh
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: &str, value: impl ToString) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a text field when `value` is set
    pub fn text_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Attach a file
    pub fn file(mut self, field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        self.files.push(FilePart {
            field: field.to_string(),
            file_name: file_name.to_string(),
            mime: None,
            bytes,
        });
        self
    }

    /// Attach a file with an explicit content type
    pub fn file_with_mime(mut self, field: &str, file_name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        self.files.push(FilePart {
            field: field.to_string(),
            file_name: file_name.to_string(),
            mime: Some(mime.to_string()),
            bytes,
        });
        self
    }

    /// Attach an [`Upload`]
    pub fn upload(mut self, field: &str, upload: &Upload) -> Self {
        self.files.push(FilePart {
            field: field.to_string(),
            file_name: upload.file_name.clone(),
            mime: upload.mime.clone(),
            bytes: upload.bytes.clone(),
        });
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Build a fresh transport form
    pub fn to_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(mime) = &file.mime {
                part = part.mime_str(mime)?;
            }
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

/// Body of a request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Serialize `body` as JSON
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self> {
        Ok(RequestBody::Json(serde_json::to_value(body)?))
    }
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query string pairs, in order
    pub query: Vec<(String, String)>,
    /// Skip the refresh cycle and every notice or navigation
    pub silent: bool,
    /// Treat a 401 as an ordinary failure (credential endpoints)
    pub no_refresh: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn no_refresh(mut self) -> Self {
        self.no_refresh = true;
        self
    }
}

/// Authenticated HTTP client shared by every façade
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    http: Client,
    session: SessionStore,
    policy: Arc<ErrorPolicy>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

impl HttpClient {
    /// Create a new HttpClient
    pub fn new(options: &ClientOptions, session: SessionStore, policy: Arc<ErrorPolicy>) -> Result<Self> {
        let base_url = options.normalized_base_url();
        Url::parse(&base_url)?;

        let http = Client::builder()
            .timeout(options.request_timeout)
            .user_agent(options.user_agent.clone())
            .build()?;

        Ok(Self {
            base_url,
            http,
            session,
            policy,
        })
    }

    /// Same transport and base URL, different session and error policy
    pub(crate) fn with_context(&self, session: SessionStore, policy: Arc<ErrorPolicy>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            session,
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn policy(&self) -> &Arc<ErrorPolicy> {
        &self.policy
    }

    /// Absolute URL of an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build(
        &self,
        method: &Method,
        path: &str,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<RequestBuilder> {
        let mut url = Url::parse(&self.url(path))?;
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(options.query.iter());
        }

        let mut req = self
            .http
            .request(method.clone(), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        // Read at dispatch so a replay picks up a refreshed token
        match self.session.access_token() {
            Some(token) => req = req.bearer_auth(token),
            None => debug!("No access token stored, sending {} {} unauthenticated", method, path),
        }

        req = match body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(value),
            RequestBody::Multipart(form) => req.multipart(form.to_form()?),
        };

        Ok(req)
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<Response> {
        let response = self.build(method, path, body, options)?.send().await?;
        Ok(response)
    }

    /// Send a request and decode the JSON response
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<T> {
        let mut attempt = Attempt::First;

        loop {
            debug!("{} {} [{:?}, {:?}]", method, path, RequestState::Sent, attempt);

            let response = match self.dispatch(&method, path, &body, &options).await {
                Ok(response) => response,
                Err(err) => return Err(self.fail(&method, path, &options, err)),
            };

            let status = response.status();
            if status.is_success() {
                debug!("{} {} [{:?}, {}]", method, path, RequestState::Success, status);
                return decode(response).await;
            }

            let err = Error::from_response(response).await;

            let may_refresh = !options.silent && !options.no_refresh;
            if status == StatusCode::UNAUTHORIZED && attempt == Attempt::First && may_refresh {
                debug!("{} {} [{:?}]", method, path, RequestState::Failed401Retrying);
                match self.refresh_access_token().await {
                    Ok(()) => {
                        attempt = Attempt::Retried;
                        continue;
                    }
                    Err(cause) => {
                        debug!("{} {} [{:?}]", method, path, RequestState::Failed401Final);
                        return Err(self.expire_session(cause));
                    }
                }
            }

            return Err(self.fail(&method, path, &options, err));
        }
    }

    fn fail(&self, method: &Method, path: &str, options: &RequestOptions, err: Error) -> Error {
        debug!("{} {} [{:?}]: {}", method, path, RequestState::FailedOther, err);
        if !options.silent {
            self.policy.apply(method, &err);
        }
        err
    }

    /// Clear the session and send the user to log in again
    fn expire_session(&self, cause: Error) -> Error {
        warn!("Session could not be refreshed: {}", cause);
        if let Err(err) = self.session.clear() {
            warn!("Failed to clear session: {}", err);
        }
        self.policy.force_login();
        Error::SessionExpired(Box::new(cause))
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Uses the bare transport: a failure here is never refreshed again.
    pub async fn refresh_access_token(&self) -> Result<()> {
        let refresh_token = self.session.refresh_token().ok_or(Error::MissingSession)?;

        info!("Refreshing access token");
        let response = self
            .http
            .post(self.url(endpoints::TOKEN_REFRESH))
            .json(&json!({ "refresh": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response(response).await);
        }

        let tokens: RefreshResponse = response.json().await?;
        let refresh_token = tokens.refresh.unwrap_or(refresh_token);
        self.session.update_tokens(&tokens.access, &refresh_token)?;
        info!("Access token refreshed");
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub async fn get_with<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.request(Method::GET, path, RequestBody::Empty, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::POST, path, RequestBody::json(body)?, RequestOptions::default())
            .await
    }

    /// POST without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::POST, path, RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::PUT, path, RequestBody::json(body)?, RequestOptions::default())
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::PATCH, path, RequestBody::json(body)?, RequestOptions::default())
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request::<Value>(Method::DELETE, path, RequestBody::Empty, RequestOptions::default())
            .await
            .map(|_| ())
    }

    pub async fn multipart<T: DeserializeOwned>(&self, method: Method, path: &str, form: MultipartForm) -> Result<T> {
        self.request(method, path, RequestBody::Multipart(form), RequestOptions::default())
            .await
    }
}

/// Empty bodies (204) decode as JSON `null`
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
