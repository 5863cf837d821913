//! Scientific publications of students

mod types;

use reqwest::Method;

use crate::endpoints::{self, PUBLICATIONS};
use crate::error::Result;
use crate::fetch::{HttpClient, RequestBody, RequestOptions};
use crate::listing::{ActionResponse, Listing};

pub use types::*;

/// Client for the publications endpoints
#[derive(Debug, Clone)]
pub struct PublicationsClient {
    http: HttpClient,
}

impl PublicationsClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// List publications visible to the current user
    pub async fn list(&self, filter: &PublicationFilter) -> Result<Vec<Publication>> {
        let options = RequestOptions::new()
            .query_opt("status", filter.status.map(|s| s.as_str()))
            .query_opt("nivel", filter.nivel.map(|n| n.as_str()))
            .query_opt("student", filter.student)
            .query_opt("tutor", filter.tutor)
            .query_opt("search", filter.search.as_ref())
            .query_opt("ordering", filter.ordering.as_ref());
        let listing: Listing<Publication> = self.http.get_with(PUBLICATIONS, options).await?;
        Ok(listing.into_items())
    }

    /// Publications of the current student
    pub async fn list_mine(&self) -> Result<Vec<Publication>> {
        let listing: Listing<Publication> = self
            .http
            .get(&endpoints::list_action(PUBLICATIONS, "my_publications"))
            .await?;
        Ok(listing.into_items())
    }

    /// Publications waiting for a department head
    pub async fn pending_review(&self) -> Result<Vec<Publication>> {
        let listing: Listing<Publication> = self
            .http
            .get(&endpoints::list_action(PUBLICATIONS, "pending_review"))
            .await?;
        Ok(listing.into_items())
    }

    pub async fn get(&self, id: i64) -> Result<Publication> {
        self.http.get(&endpoints::detail(PUBLICATIONS, id)).await
    }

    /// Register a new publication. It starts as a draft.
    pub async fn create(&self, publication: &NewPublication) -> Result<Publication> {
        self.http
            .multipart(Method::POST, PUBLICATIONS, publication.to_form())
            .await
    }

    pub async fn update(&self, id: i64, update: &PublicationUpdate) -> Result<Publication> {
        self.http
            .multipart(Method::PATCH, &endpoints::detail(PUBLICATIONS, id), update.to_form())
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.http.delete(&endpoints::detail(PUBLICATIONS, id)).await
    }

    /// Send a draft to review
    pub async fn submit_for_review(&self, id: i64) -> Result<ActionResponse<Publication>> {
        self.http
            .post_empty(&endpoints::detail_action(PUBLICATIONS, id, "submit_for_review"))
            .await
    }

    /// Approve or reject a publication.
    ///
    /// The comment is optional here; requiring one for rejections is up to
    /// the caller.
    pub async fn review(
        &self,
        id: i64,
        approved: bool,
        comments: Option<&str>,
    ) -> Result<ActionResponse<Publication>> {
        self.http
            .request(
                Method::POST,
                &endpoints::detail_action(PUBLICATIONS, id, "review"),
                RequestBody::json(&ReviewDecision::new(approved, comments))?,
                RequestOptions::default(),
            )
            .await
    }

    pub async fn stats(&self) -> Result<PublicationStats> {
        self.http
            .get(&endpoints::list_action(PUBLICATIONS, "stats"))
            .await
    }

    /// Approved publications grouped by level
    pub async fn by_level(&self) -> Result<Vec<LevelCount>> {
        self.http
            .get(&endpoints::list_action(PUBLICATIONS, "by_level"))
            .await
    }
}
