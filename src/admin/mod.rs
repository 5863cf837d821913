//! Administration: audit log, system configuration and notifications

pub mod config;
pub mod logs;
pub mod notifications;

pub use config::{ConfigEntry, ConfigValue, SystemConfigClient, SESSION_TIMEOUT_SETTING};
pub use logs::{LogAction, LogFilter, SystemLog, SystemLogsClient};
pub use notifications::{
    AdminNotification, NotificationFilter, NotificationStats, NotificationType, NotificationsClient,
    Severity,
};
