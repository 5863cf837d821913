//! User administration

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::auth::{Role, UserSummary};
use crate::endpoints::{self, USERS};
use crate::error::Result;
use crate::fetch::{HttpClient, RequestOptions};
use crate::listing::Listing;

/// Account fields an administrator can change. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserStats {
    pub total: u64,
    pub activos: u64,
    pub inactivos: u64,
    #[serde(default)]
    pub por_rol: BTreeMap<String, u64>,
}

/// Client for the user administration endpoints
#[derive(Debug, Clone)]
pub struct UsersClient {
    http: HttpClient,
}

impl UsersClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// List users, optionally of one role and activity state
    pub async fn list(&self, role: Option<Role>, active: Option<bool>) -> Result<Vec<UserSummary>> {
        let options = RequestOptions::new()
            .query_opt("role", role.map(|r| r.as_str()))
            .query_opt("activo", active);
        let listing: Listing<UserSummary> = self.http.get_with(USERS, options).await?;
        Ok(listing.into_items())
    }

    pub async fn get(&self, id: i64) -> Result<UserSummary> {
        self.http.get(&endpoints::detail(USERS, id)).await
    }

    pub async fn me(&self) -> Result<UserSummary> {
        self.http.get(endpoints::USERS_ME).await
    }

    /// Active students
    pub async fn students(&self) -> Result<Vec<UserSummary>> {
        self.http.get(endpoints::USERS_STUDENTS).await
    }

    /// Active tutors
    pub async fn tutors(&self) -> Result<Vec<UserSummary>> {
        self.http.get(endpoints::USERS_TUTORS).await
    }

    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<UserSummary> {
        self.http.patch(&endpoints::detail(USERS, id), update).await
    }

    /// Enable or disable an account
    pub async fn set_active(&self, id: i64, active: bool) -> Result<UserSummary> {
        self.http
            .patch(&endpoints::detail(USERS, id), &json!({ "activo": active }))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.http.delete(&endpoints::detail(USERS, id)).await
    }

    pub async fn stats(&self) -> Result<UserStats> {
        self.http.get(endpoints::USERS_STATS).await
    }
}
