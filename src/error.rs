//! Error handling for the ECE client

use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field name to error messages, as returned by the API or produced locally.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Unified error type for the ECE client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or transport errors (no usable response received)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT decoding errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The server answered with a non-success status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: ApiErrorBody },

    /// A 401 could not be recovered by refreshing the access token
    #[error("Session expired: {0}")]
    SessionExpired(#[source] Box<Error>),

    /// No session is stored
    #[error("Missing session")]
    MissingSession,

    /// Client-side field validation failed before dispatch
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// A business rule blocked the operation before dispatch
    #[error("Operation rejected: {0}")]
    BusinessRule(String),

    /// Persisted client storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

/// Error taxonomy used to decide the user-facing behaviour of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received
    Transport,
    /// 401 (after a failed refresh when it comes from the interceptor)
    Authentication,
    /// 403
    Authorization,
    /// 404
    NotFound,
    /// 5xx
    Server,
    /// 400 or local field validation
    Validation,
    /// Rejected locally by a business rule
    BusinessRule,
    /// Anything else
    Other,
}

impl Error {
    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new business rule error
    pub fn business_rule<T: fmt::Display>(msg: T) -> Self {
        Error::BusinessRule(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Build an API error from a failed response, consuming its body
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Error::Api {
            status,
            body: ApiErrorBody::parse(&text),
        }
    }

    /// HTTP status carried by this error, if a response was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => StatusCode::from_u16(*status).ok(),
            Error::Http(err) => err.status(),
            Error::SessionExpired(_) => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(err) => match err.status() {
                Some(status) => ErrorKind::from_status(status.as_u16()),
                None => ErrorKind::Transport,
            },
            Error::Api { status, .. } => ErrorKind::from_status(*status),
            Error::SessionExpired(_) | Error::MissingSession => ErrorKind::Authentication,
            Error::Validation(_) => ErrorKind::Validation,
            Error::BusinessRule(_) => ErrorKind::BusinessRule,
            _ => ErrorKind::Other,
        }
    }

    /// Field errors attached to this error, if any
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Error::Api { body, .. } if !body.fields.is_empty() => Some(&body.fields),
            Error::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl ErrorKind {
    fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Other,
        }
    }
}

/// Error body returned by the API.
///
/// The server answers failures with one of `{"error": ..}`, `{"detail": ..}`,
/// `{"message": ..}` or a map of field name to messages. Anything else is kept
/// as raw text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub fields: FieldErrors,
    pub raw: String,
}

impl ApiErrorBody {
    /// Parse a response body
    pub fn parse(text: &str) -> Self {
        let mut body = ApiErrorBody {
            raw: text.to_string(),
            ..Default::default()
        };

        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) else {
            return body;
        };

        for (key, value) in map {
            match (key.as_str(), value) {
                ("message" | "error" | "detail", Value::String(msg)) => {
                    if body.message.is_none() {
                        body.message = Some(msg);
                    }
                }
                (_, Value::String(msg)) => {
                    body.fields.entry(key).or_default().push(msg);
                }
                (_, Value::Array(items)) => {
                    let messages = items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect::<Vec<_>>();
                    if !messages.is_empty() {
                        body.fields.entry(key).or_default().extend(messages);
                    }
                }
                _ => {}
            }
        }

        if body.message.is_none() {
            body.message = body
                .fields
                .get("non_field_errors")
                .and_then(|messages| messages.first().cloned());
        }

        body
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}", message),
            None if !self.fields.is_empty() => write!(f, "{:?}", self.fields),
            None => write!(f, "{}", self.raw),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
