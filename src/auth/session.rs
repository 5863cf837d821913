//! Session management for authentication

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::types::UserSummary;
use crate::error::Error;
use crate::storage::{MemoryStorage, Storage};

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key of the serialized current user
pub const USER_KEY: &str = "user";
/// Storage key of the session timeout preference, in minutes
pub const SESSION_TIMEOUT_KEY: &str = "session_timeout";

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The current user, if known
    pub user: Option<UserSummary>,
}

#[derive(Debug, Deserialize)]
struct ExpClaim {
    exp: Option<i64>,
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, refresh_token: String, user: Option<UserSummary>) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
        }
    }

    /// Expiry of the access token, read from its `exp` claim.
    ///
    /// The signature is not checked; the server remains the authority.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>, Error> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<ExpClaim>(&self.access_token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data
            .claims
            .exp
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single()))
    }

    /// Whether the access token expires within `window` from now.
    /// Tokens without a readable `exp` claim are reported as not expiring.
    pub fn expires_within(&self, window: Duration) -> bool {
        match self.expires_at() {
            Ok(Some(expires_at)) => {
                let window = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::zero());
                expires_at - Utc::now() < window
            }
            _ => false,
        }
    }
}

/// Handle on the persisted session.
///
/// Cloning shares the same underlying storage. The store is the only writer of
/// the session keys; concurrent writers sharing the storage (another client on
/// the same session file) are not coordinated.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// A store backed by a fresh [`MemoryStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!("Failed to read {} from session storage: {}", key, err);
                None
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// The cached user, if one is stored and readable
    pub fn current_user(&self) -> Option<UserSummary> {
        let raw = self.read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!("Stored user is not readable: {}", err);
                None
            }
        }
    }

    /// True when an access token is stored
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// The stored session. Both tokens must be present; a half-stored
    /// session is reported and treated as absent.
    pub fn load(&self) -> Option<Session> {
        match (self.access_token(), self.refresh_token()) {
            (Some(access_token), Some(refresh_token)) => Some(Session {
                access_token,
                refresh_token,
                user: self.current_user(),
            }),
            (None, None) => None,
            (access, refresh) => {
                warn!(
                    "Partial session in storage (access: {}, refresh: {}), ignoring it",
                    access.is_some(),
                    refresh.is_some()
                );
                None
            }
        }
    }

    /// Store a whole session, replacing whatever was there
    pub fn persist(&self, session: &Session) -> Result<(), Error> {
        let mut entries = vec![
            (ACCESS_TOKEN_KEY, session.access_token.clone()),
            (REFRESH_TOKEN_KEY, session.refresh_token.clone()),
        ];
        match &session.user {
            Some(user) => {
                entries.push((USER_KEY, serde_json::to_string(user)?));
                self.storage.set_many(&entries)
            }
            None => {
                self.storage.set_many(&entries)?;
                self.storage.remove(USER_KEY)
            }
        }
    }

    /// Replace both tokens after a refresh
    pub fn update_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), Error> {
        self.storage.set_many(&[
            (ACCESS_TOKEN_KEY, access_token.to_string()),
            (REFRESH_TOKEN_KEY, refresh_token.to_string()),
        ])
    }

    /// Overwrite the cached user wholesale
    pub fn set_user(&self, user: &UserSummary) -> Result<(), Error> {
        self.storage.set(USER_KEY, &serde_json::to_string(user)?)
    }

    /// Remove the tokens and the user
    pub fn clear(&self) -> Result<(), Error> {
        info!("Clearing stored session");
        self.storage
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])
    }

    /// Remove everything from the storage, preferences included
    pub fn clear_all(&self) -> Result<(), Error> {
        info!("Clearing all client storage");
        self.storage.clear()
    }

    pub fn session_timeout_minutes(&self) -> Option<u32> {
        self.read(SESSION_TIMEOUT_KEY)?.parse().ok()
    }

    pub fn set_session_timeout_minutes(&self, minutes: u32) -> Result<(), Error> {
        self.storage.set(SESSION_TIMEOUT_KEY, &minutes.to_string())
    }
}
