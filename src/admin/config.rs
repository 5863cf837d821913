//! System configuration entries

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::SessionStore;
use crate::endpoints::{self, SYSTEM_CONFIG};
use crate::error::{Error, Result};
use crate::fetch::{HttpClient, RequestOptions};
use crate::listing::{ActionResponse, Listing};

/// Key of the session timeout setting, in minutes
pub const SESSION_TIMEOUT_SETTING: &str = "tiempo_sesion";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: i64,
    pub key: String,
    /// Stored as text; JSON encoded for non-string values
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_active() -> bool {
    true
}

impl ConfigEntry {
    /// The value decoded as JSON, or as a plain string when it is not JSON
    pub fn parsed_value(&self) -> Value {
        serde_json::from_str(&self.value).unwrap_or_else(|_| Value::String(self.value.clone()))
    }
}

/// Body used to create or replace an entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigValue {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConfigValue {
    /// Strings are sent as they are, anything else JSON encoded
    pub fn new(key: &str, value: &Value, description: Option<&str>) -> Self {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            key: key.to_string(),
            value,
            description: description.map(str::to_string),
        }
    }
}

/// Client for the system configuration
#[derive(Debug, Clone)]
pub struct SystemConfigClient {
    http: HttpClient,
}

impl SystemConfigClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<ConfigEntry>> {
        let listing: Listing<ConfigEntry> = self.http.get(SYSTEM_CONFIG).await?;
        Ok(listing.into_items())
    }

    /// The entry stored under `key`, if any
    pub async fn get(&self, key: &str) -> Result<Option<ConfigEntry>> {
        let listing: Listing<ConfigEntry> = self
            .http
            .get_with(SYSTEM_CONFIG, RequestOptions::new().query("key", key))
            .await?;
        // The server may ignore the filter and return everything
        Ok(listing.into_items().into_iter().find(|entry| entry.key == key))
    }

    pub async fn put(&self, id: i64, value: &ConfigValue) -> Result<ConfigEntry> {
        self.http.put(&endpoints::detail(SYSTEM_CONFIG, id), value).await
    }

    pub async fn post(&self, value: &ConfigValue) -> Result<ConfigEntry> {
        self.http.post(SYSTEM_CONFIG, value).await
    }

    /// Replace the entry for `key`, creating it when missing
    pub async fn upsert(&self, key: &str, value: &Value, description: Option<&str>) -> Result<ConfigEntry> {
        let body = ConfigValue::new(key, value, description);
        match self.get(key).await? {
            Some(existing) => self.put(existing.id, &body).await,
            None => self.post(&body).await,
        }
    }

    pub async fn toggle_active(&self, id: i64) -> Result<ActionResponse<ConfigEntry>> {
        self.http
            .post_empty(&endpoints::detail_action(SYSTEM_CONFIG, id, "toggle_active"))
            .await
    }

    /// Store the session timeout setting as the local preference
    pub fn apply_session_timeout(entries: &[ConfigEntry], session: &SessionStore) -> Result<Option<u32>> {
        let Some(entry) = entries.iter().find(|e| e.key == SESSION_TIMEOUT_SETTING) else {
            return Ok(None);
        };
        let minutes = match entry.parsed_value() {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|m| *m > 0)
        .ok_or_else(|| Error::config(format!("invalid {}: {}", SESSION_TIMEOUT_SETTING, entry.value)))?;

        session.set_session_timeout_minutes(minutes)?;
        info!("Session timeout set to {} minutes", minutes);
        Ok(Some(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, value: &str) -> ConfigEntry {
        ConfigEntry {
            id: 1,
            key: key.to_string(),
            value: value.to_string(),
            description: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_parsed_value() {
        assert_eq!(entry("tiempo_sesion", "60").parsed_value(), json!(60));
        assert_eq!(entry("requiere_2fa", "false").parsed_value(), json!(false));
        assert_eq!(
            entry("nombre_universidad", "Universidad de las Ciencias Informáticas").parsed_value(),
            json!("Universidad de las Ciencias Informáticas")
        );
    }

    #[test]
    fn test_config_value_encoding() {
        assert_eq!(ConfigValue::new("k", &json!(true), None).value, "true");
        assert_eq!(ConfigValue::new("k", &json!("texto"), None).value, "texto");
    }

    #[test]
    fn test_apply_session_timeout() {
        let session = SessionStore::in_memory();
        let entries = vec![entry("email_contacto", "soporte@uci.cu"), entry("tiempo_sesion", "45")];
        assert_eq!(SystemConfigClient::apply_session_timeout(&entries, &session).unwrap(), Some(45));
        assert_eq!(session.session_timeout_minutes(), Some(45));

        assert_eq!(SystemConfigClient::apply_session_timeout(&[], &session).unwrap(), None);
        assert!(SystemConfigClient::apply_session_timeout(&[entry("tiempo_sesion", "nunca")], &session).is_err());
    }
}
