//! Tutor opinions on publications and tutor/student assignments

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use crate::endpoints::{self, TUTOR_OPINIONS, TUTOR_STUDENTS};
use crate::error::Result;
use crate::fetch::{HttpClient, RequestOptions};
use crate::listing::Listing;
use crate::publications::Publication;

/// What a tutor recommends for a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Aprobada,
    Rechazada,
    Revision,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aprobada => "aprobada",
            Self::Rechazada => "rechazada",
            Self::Revision => "revision",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Aprobada => "Aprobada",
            Self::Rechazada => "Rechazada",
            Self::Revision => "Requiere Revisión",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorOpinion {
    pub id: i64,
    pub publication: i64,
    #[serde(default)]
    pub publication_title: Option<String>,
    pub tutor: i64,
    #[serde(default)]
    pub tutor_name: Option<String>,
    pub opinion: String,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of a new or edited opinion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpinionDraft {
    pub opinion: String,
    pub recommendation: Recommendation,
}

impl OpinionDraft {
    pub fn new(opinion: &str, recommendation: Recommendation) -> Self {
        Self {
            opinion: opinion.to_string(),
            recommendation,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpinionFilter {
    pub publication: Option<i64>,
    pub tutor: Option<i64>,
    pub recommendation: Option<Recommendation>,
}

/// Client for tutor opinions
#[derive(Debug, Clone)]
pub struct TutorOpinionsClient {
    http: HttpClient,
}

impl TutorOpinionsClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, filter: &OpinionFilter) -> Result<Vec<TutorOpinion>> {
        let options = RequestOptions::new()
            .query_opt("publication", filter.publication)
            .query_opt("tutor", filter.tutor)
            .query_opt("recommendation", filter.recommendation.map(|r| r.as_str()));
        let listing: Listing<TutorOpinion> = self.http.get_with(TUTOR_OPINIONS, options).await?;
        Ok(listing.into_items())
    }

    /// Opinions written by the current tutor
    pub async fn list_mine(&self) -> Result<Vec<TutorOpinion>> {
        let listing: Listing<TutorOpinion> = self
            .http
            .get(&endpoints::list_action(TUTOR_OPINIONS, "my_opinions"))
            .await?;
        Ok(listing.into_items())
    }

    /// Publications of the tutor's students still waiting for an opinion
    pub async fn pending_publications(&self) -> Result<Vec<Publication>> {
        let listing: Listing<Publication> = self
            .http
            .get(&endpoints::list_action(TUTOR_OPINIONS, "pending_publications"))
            .await?;
        Ok(listing.into_items())
    }

    pub async fn get(&self, id: i64) -> Result<TutorOpinion> {
        self.http.get(&endpoints::detail(TUTOR_OPINIONS, id)).await
    }

    pub async fn create(&self, publication_id: i64, draft: &OpinionDraft) -> Result<TutorOpinion> {
        let body = json!({
            "publication": publication_id,
            "opinion": draft.opinion,
            "recommendation": draft.recommendation,
        });
        self.http.post(TUTOR_OPINIONS, &body).await
    }

    pub async fn update(&self, id: i64, draft: &OpinionDraft) -> Result<TutorOpinion> {
        self.http
            .patch(&endpoints::detail(TUTOR_OPINIONS, id), draft)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.http.delete(&endpoints::detail(TUTOR_OPINIONS, id)).await
    }
}

/// Assignment of a student to a tutor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorStudent {
    pub id: i64,
    pub tutor: i64,
    #[serde(default)]
    pub tutor_name: Option<String>,
    pub student: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_matricula: Option<String>,
    #[serde(default)]
    pub student_carrera: Option<String>,
    #[serde(default)]
    pub assigned_date: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Percentage, clamped to 0..=100 when read
    #[serde(default, deserialize_with = "clamped_percent")]
    pub progress: u8,
    #[serde(default)]
    pub pending_publications: u64,
}

fn default_true() -> bool {
    true
}

fn clamped_percent<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(raw.clamp(0, 100) as u8)
}

/// Client for tutor/student assignments
#[derive(Debug, Clone)]
pub struct TutorStudentsClient {
    http: HttpClient,
}

impl TutorStudentsClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<TutorStudent>> {
        let options = RequestOptions::new().query_opt("is_active", active_only.then_some("true"));
        let listing: Listing<TutorStudent> = self.http.get_with(TUTOR_STUDENTS, options).await?;
        Ok(listing.into_items())
    }

    /// Active students of the current tutor
    pub async fn my_students(&self) -> Result<Vec<TutorStudent>> {
        let listing: Listing<TutorStudent> = self
            .http
            .get(&endpoints::list_action(TUTOR_STUDENTS, "my_students"))
            .await?;
        Ok(listing.into_items())
    }

    /// Active tutors of the current student
    pub async fn my_tutors(&self) -> Result<Vec<TutorStudent>> {
        let listing: Listing<TutorStudent> = self
            .http
            .get(&endpoints::list_action(TUTOR_STUDENTS, "my_tutors"))
            .await?;
        Ok(listing.into_items())
    }

    pub async fn assign(&self, tutor_id: i64, student_id: i64) -> Result<TutorStudent> {
        self.http
            .post(TUTOR_STUDENTS, &json!({ "tutor": tutor_id, "student": student_id }))
            .await
    }

    /// Progress is capped at 100
    pub async fn update_progress(&self, id: i64, progress: u8) -> Result<TutorStudent> {
        self.http
            .patch(
                &endpoints::detail(TUTOR_STUDENTS, id),
                &json!({ "progress": progress.min(100) }),
            )
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.http.delete(&endpoints::detail(TUTOR_STUDENTS, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opinion_from_api() {
        let opinion: TutorOpinion = serde_json::from_value(json!({
            "id": 1,
            "publication": 5,
            "publication_title": "Redes",
            "tutor": 2,
            "opinion": "Buen trabajo",
            "recommendation": "revision",
            "recommendation_display": "Requiere Revisión"
        }))
        .unwrap();
        assert_eq!(opinion.recommendation, Recommendation::Revision);
        assert_eq!(opinion.recommendation.label(), "Requiere Revisión");
    }

    #[test]
    fn test_assignment_defaults() {
        let relation: TutorStudent =
            serde_json::from_value(json!({ "id": 1, "tutor": 2, "student": 3 })).unwrap();
        assert!(relation.is_active);
        assert_eq!(relation.progress, 0);
    }

    #[test]
    fn test_progress_out_of_range_is_clamped() {
        let listing: Listing<TutorStudent> = serde_json::from_value(json!([
            { "id": 1, "tutor": 2, "student": 3, "progress": -5 },
            { "id": 2, "tutor": 2, "student": 4, "progress": 300 },
            { "id": 3, "tutor": 2, "student": 5, "progress": null }
        ]))
        .unwrap();
        let progress = listing.into_items().iter().map(|r| r.progress).collect::<Vec<_>>();
        assert_eq!(progress, vec![0, 100, 0]);
    }
}
