//! Types for scientific publications

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::fetch::{MultipartForm, Upload};

/// Workflow state of a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    EnProceso,
    Pending,
    Approved,
    Rejected,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnProceso => "en_proceso",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::EnProceso => "En Proceso",
            Self::Pending => "Pendiente de Revisión",
            Self::Approved => "Aprobada",
            Self::Rejected => "Rechazada",
        }
    }

    /// Only drafts can be edited or submitted
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::EnProceso)
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nivel {
    #[serde(rename = "1")]
    Uno,
    #[serde(rename = "2")]
    Dos,
    #[serde(rename = "3")]
    Tres,
}

impl Nivel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uno => "1",
            Self::Dos => "2",
            Self::Tres => "3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Uno => "Nivel 1",
            Self::Dos => "Nivel 2",
            Self::Tres => "Nivel 3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: i64,
    pub student: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_matricula: Option<String>,
    #[serde(default)]
    pub tutor: Option<i64>,
    #[serde(default)]
    pub tutor_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub pages: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default, rename = "abstract")]
    pub summary: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    pub nivel: Nivel,
    pub status: PublicationStatus,
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

/// A new publication, sent as a multipart form
#[derive(Debug, Clone)]
pub struct NewPublication {
    pub titulo: String,
    pub autores: String,
    pub nivel: Nivel,
    pub fecha_publicacion: Option<NaiveDate>,
    pub revista: Option<String>,
    pub volumen: Option<String>,
    pub paginas: Option<String>,
    pub doi: Option<String>,
    pub resumen: Option<String>,
    pub archivo: Option<Upload>,
}

impl NewPublication {
    pub fn new(titulo: &str, autores: &str, nivel: Nivel) -> Self {
        Self {
            titulo: titulo.to_string(),
            autores: autores.to_string(),
            nivel,
            fecha_publicacion: None,
            revista: None,
            volumen: None,
            paginas: None,
            doi: None,
            resumen: None,
            archivo: None,
        }
    }

    pub(crate) fn to_form(&self) -> MultipartForm {
        let form = MultipartForm::new()
            .text("titulo", &self.titulo)
            .text("autores", &self.autores)
            .text("nivel", self.nivel.as_str())
            .text_opt("fecha_publicacion", self.fecha_publicacion.map(|d| d.format("%Y-%m-%d")))
            .text_opt("revista", self.revista.as_ref())
            .text_opt("volumen", self.volumen.as_ref())
            .text_opt("paginas", self.paginas.as_ref())
            .text_opt("doi", self.doi.as_ref())
            .text_opt("resumen", self.resumen.as_ref());
        match &self.archivo {
            Some(file) => form.upload("archivo", file),
            None => form,
        }
    }
}

/// Fields to change on a draft. Unset fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct PublicationUpdate {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub summary: Option<String>,
    pub nivel: Option<Nivel>,
    pub file: Option<Upload>,
}

impl PublicationUpdate {
    pub(crate) fn to_form(&self) -> MultipartForm {
        let form = MultipartForm::new()
            .text_opt("title", self.title.as_ref())
            .text_opt("authors", self.authors.as_ref())
            .text_opt("publication_date", self.publication_date.map(|d| d.format("%Y-%m-%d")))
            .text_opt("journal", self.journal.as_ref())
            .text_opt("volume", self.volume.as_ref())
            .text_opt("pages", self.pages.as_ref())
            .text_opt("doi", self.doi.as_ref())
            .text_opt("abstract", self.summary.as_ref())
            .text_opt("nivel", self.nivel.map(|n| n.as_str()));
        match &self.file {
            Some(file) => form.upload("file", file),
            None => form,
        }
    }
}

/// Decision of a department head. `comments` is sent even when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewDecision {
    pub is_approved: bool,
    pub comments: String,
}

impl ReviewDecision {
    pub fn new(is_approved: bool, comments: Option<&str>) -> Self {
        Self {
            is_approved,
            comments: comments.unwrap_or_default().to_string(),
        }
    }
}

/// Query filters for listing publications
#[derive(Debug, Clone, Default)]
pub struct PublicationFilter {
    pub status: Option<PublicationStatus>,
    pub nivel: Option<Nivel>,
    pub student: Option<i64>,
    pub tutor: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicationStats {
    pub total: u64,
    pub pendientes: u64,
    pub aprobadas: u64,
    pub rechazadas: u64,
    pub en_proceso: u64,
    #[serde(default)]
    pub por_nivel: BTreeMap<String, u64>,
    #[serde(default)]
    pub tasa_aprobacion: f64,
}

/// Approved publications of one level
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LevelCount {
    pub nivel: String,
    pub cantidad: u64,
    #[serde(default)]
    pub color: Option<String>,
}
