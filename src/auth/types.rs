//! Types for authentication and user management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Role of a user. Each role has its own area of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Estudiante,
    Jefe,
    Tutor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Estudiante, Role::Jefe, Role::Tutor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Estudiante => "estudiante",
            Self::Jefe => "jefe",
            Self::Tutor => "tutor",
            Self::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Estudiante => "Estudiante",
            Self::Jefe => "Jefe de Departamento",
            Self::Tutor => "Tutor",
            Self::Admin => "Administrador",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::general(format!("unknown role: {}", s)))
    }
}

/// Cached mirror of the current user, possibly stale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matricula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anno: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub especialidad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grado_academico: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

impl UserSummary {
    /// First name if set, else the username
    pub fn display_name(&self) -> &str {
        match self.first_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }

    /// "First Last", falling back to the username
    pub fn full_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Registration form
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anno: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grado_academico: Option<String>,
}

/// Profile fields that can be updated. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anno: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grado_academico: Option<String>,
}

/// Token pair issued on login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Response of the login and registration endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub tokens: TokenPair,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the token refresh endpoint. `refresh` is only present when
/// the server rotates refresh tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordChange<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
    pub new_password2: &'a str,
}

/// Result of re-fetching the current user
#[derive(Debug, Clone)]
pub struct UserRefresh {
    pub user: UserSummary,
    /// The server reports a different role than the cached copy had
    pub role_changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_codes() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("student".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_summary_from_login_payload() {
        let user: UserSummary = serde_json::from_value(serde_json::json!({
            "id": 4,
            "username": "mperez",
            "email": "mperez@estudiantes.uci.cu",
            "first_name": "",
            "last_name": "Pérez",
            "role": "estudiante",
            "anno": 3
        }))
        .unwrap();

        assert_eq!(user.role, Role::Estudiante);
        assert_eq!(user.display_name(), "mperez");
        assert_eq!(user.full_name(), "Pérez");
        assert_eq!(user.anno, Some(3));
    }
}
