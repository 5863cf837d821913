//! Types for ECE modality requests

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fetch::{MultipartForm, Upload};

/// Workflow state of an ECE request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    EnProceso,
    Pendiente,
    Aprobada,
    Rechazada,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnProceso => "en_proceso",
            Self::Pendiente => "pendiente",
            Self::Aprobada => "aprobada",
            Self::Rechazada => "rechazada",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::EnProceso => "En Proceso",
            Self::Pendiente => "Pendiente de Revisión",
            Self::Aprobada => "Aprobada",
            Self::Rechazada => "Rechazada",
        }
    }

    /// Not decided yet
    pub fn is_active(&self) -> bool {
        matches!(self, Self::EnProceso | Self::Pendiente)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EceRequest {
    pub id: i64,
    pub student: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_matricula: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: RequestStatus,
    #[serde(default)]
    pub reviewed_by: Option<i64>,
    #[serde(default)]
    pub reviewed_by_name: Option<String>,
    #[serde(default)]
    pub review_comments: Option<String>,
    #[serde(default)]
    pub review_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A new request: the signed document and an optional description
#[derive(Debug, Clone)]
pub struct NewEceRequest {
    pub file: Upload,
    pub description: Option<String>,
}

impl NewEceRequest {
    pub fn new(file: Upload) -> Self {
        Self {
            file,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub(crate) fn to_form(&self) -> MultipartForm {
        MultipartForm::new()
            .upload("file", &self.file)
            .text_opt("description", self.description.as_ref().filter(|d| !d.is_empty()))
    }
}

/// Fields to change on a request in progress
#[derive(Debug, Clone, Default)]
pub struct EceRequestUpdate {
    pub file: Option<Upload>,
    pub description: Option<String>,
}

impl EceRequestUpdate {
    pub(crate) fn to_form(&self) -> MultipartForm {
        let form = MultipartForm::new().text_opt("description", self.description.as_ref());
        match &self.file {
            Some(file) => form.upload("file", file),
            None => form,
        }
    }
}

/// Query filters for listing requests
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub student: Option<i64>,
    pub reviewed_by: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestStats {
    pub total: u64,
    /// In progress or waiting for review
    pub pendientes: u64,
    pub aprobadas: u64,
    pub rechazadas: u64,
    #[serde(default)]
    pub estudiantes_activos: u64,
    #[serde(default)]
    pub tasa_aprobacion: f64,
}

/// Request counters of one month
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthlyCount {
    /// Short Spanish month name ("Ene", "Feb", ...)
    pub mes: String,
    pub solicitudes: u64,
    pub aprobadas: u64,
    pub rechazadas: u64,
    pub pendientes: u64,
}
