//! Security and system notifications for administrators

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::endpoints::{self, NOTIFICATIONS};
use crate::error::Result;
use crate::fetch::{HttpClient, RequestOptions};
use crate::listing::{ActionResponse, Listing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "Información",
            Self::Warning => "Advertencia",
            Self::Error => "Error",
            Self::Critical => "Crítico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    FailedLogin,
    SimultaneousAccess,
    SystemError,
    DbError,
    UnauthorizedAttempt,
    PostApprovalModification,
    UserLocked,
    IpBlocked,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailedLogin => "failed_login",
            Self::SimultaneousAccess => "simultaneous_access",
            Self::SystemError => "system_error",
            Self::DbError => "db_error",
            Self::UnauthorizedAttempt => "unauthorized_attempt",
            Self::PostApprovalModification => "post_approval_modification",
            Self::UserLocked => "user_locked",
            Self::IpBlocked => "ip_blocked",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FailedLogin => "Intento Fallido de Login",
            Self::SimultaneousAccess => "Acceso Simultáneo",
            Self::SystemError => "Error del Sistema",
            Self::DbError => "Error de Base de Datos",
            Self::UnauthorizedAttempt => "Operación No Autorizada",
            Self::PostApprovalModification => "Modificación Post-Aprobación",
            Self::UserLocked => "Usuario Bloqueado",
            Self::IpBlocked => "IP Bloqueada",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminNotification {
    pub id: i64,
    pub notification_type: NotificationType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub read_at: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub notification_type: Option<NotificationType>,
    pub severity: Option<Severity>,
    pub is_read: Option<bool>,
    pub is_resolved: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    /// Read but not resolved
    pub pending: u64,
    #[serde(default)]
    pub resolved: u64,
    #[serde(default)]
    pub by_severity: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
}

/// Client for administrator notifications
#[derive(Debug, Clone)]
pub struct NotificationsClient {
    http: HttpClient,
}

impl NotificationsClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, filter: &NotificationFilter) -> Result<Vec<AdminNotification>> {
        let options = RequestOptions::new()
            .query_opt("notification_type", filter.notification_type.map(|t| t.as_str()))
            .query_opt("severity", filter.severity.map(|s| s.as_str()))
            .query_opt("is_read", filter.is_read)
            .query_opt("is_resolved", filter.is_resolved);
        let listing: Listing<AdminNotification> = self.http.get_with(NOTIFICATIONS, options).await?;
        Ok(listing.into_items())
    }

    pub async fn mark_read(&self, id: i64) -> Result<ActionResponse<AdminNotification>> {
        self.http
            .post_empty(&endpoints::detail_action(NOTIFICATIONS, id, "mark_read"))
            .await
    }

    pub async fn resolve(&self, id: i64) -> Result<ActionResponse<AdminNotification>> {
        self.http
            .post_empty(&endpoints::detail_action(NOTIFICATIONS, id, "resolve"))
            .await
    }

    pub async fn stats(&self) -> Result<NotificationStats> {
        self.http
            .get(&endpoints::list_action(NOTIFICATIONS, "stats"))
            .await
    }

    /// Number of unread notifications, for badges
    pub async fn unread_count(&self) -> Result<u64> {
        Ok(self.stats().await?.unread)
    }
}
