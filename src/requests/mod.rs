//! ECE modality requests

mod types;

use log::warn;
use reqwest::Method;

use crate::endpoints::{self, ECE_REQUESTS};
use crate::error::{Error, Result};
use crate::fetch::{HttpClient, RequestBody, RequestOptions};
use crate::interceptor::{Notice, NoticeLevel, Notifier};
use crate::listing::{ActionResponse, Listing};
use crate::publications::ReviewDecision;

pub use types::*;

pub const MSG_ACTIVE_REQUEST: &str = "Ya tienes una solicitud en proceso. Espera a que sea revisada.";
pub const MSG_APPROVED_REQUEST: &str = "Ya tienes una solicitud aprobada. No puedes enviar otra.";

/// Client for the ECE requests endpoints
#[derive(Debug, Clone)]
pub struct EceRequestsClient {
    http: HttpClient,
}

impl EceRequestsClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, filter: &RequestFilter) -> Result<Vec<EceRequest>> {
        let options = RequestOptions::new()
            .query_opt("status", filter.status.map(|s| s.as_str()))
            .query_opt("student", filter.student)
            .query_opt("reviewed_by", filter.reviewed_by)
            .query_opt("search", filter.search.as_ref())
            .query_opt("ordering", filter.ordering.as_ref());
        let listing: Listing<EceRequest> = self.http.get_with(ECE_REQUESTS, options).await?;
        Ok(listing.into_items())
    }

    /// Requests of the current student
    pub async fn list_mine(&self) -> Result<Vec<EceRequest>> {
        let listing: Listing<EceRequest> = self
            .http
            .get(&endpoints::list_action(ECE_REQUESTS, "my_requests"))
            .await?;
        Ok(listing.into_items())
    }

    pub async fn pending_review(&self) -> Result<Vec<EceRequest>> {
        let listing: Listing<EceRequest> = self
            .http
            .get(&endpoints::list_action(ECE_REQUESTS, "pending_review"))
            .await?;
        Ok(listing.into_items())
    }

    pub async fn get(&self, id: i64) -> Result<EceRequest> {
        self.http.get(&endpoints::detail(ECE_REQUESTS, id)).await
    }

    pub async fn create(&self, request: &NewEceRequest) -> Result<EceRequest> {
        self.http
            .multipart(Method::POST, ECE_REQUESTS, request.to_form())
            .await
    }

    /// Create a request unless `existing` already holds an undecided or an
    /// approved one. A blocked submission is reported through `notifier` and
    /// never reaches the server.
    pub async fn create_unless_active(
        &self,
        existing: &[EceRequest],
        request: &NewEceRequest,
        notifier: &dyn Notifier,
    ) -> Result<EceRequest> {
        if existing.iter().any(|r| r.status.is_active()) {
            warn!("Blocked new ECE request: another one is still in review");
            notifier.notify(Notice::warning(MSG_ACTIVE_REQUEST));
            return Err(Error::business_rule(MSG_ACTIVE_REQUEST));
        }
        if existing.iter().any(|r| r.status == RequestStatus::Aprobada) {
            notifier.notify(Notice::new(NoticeLevel::Info, MSG_APPROVED_REQUEST));
            return Err(Error::business_rule(MSG_APPROVED_REQUEST));
        }
        self.create(request).await
    }

    pub async fn update(&self, id: i64, update: &EceRequestUpdate) -> Result<EceRequest> {
        self.http
            .multipart(Method::PATCH, &endpoints::detail(ECE_REQUESTS, id), update.to_form())
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.http.delete(&endpoints::detail(ECE_REQUESTS, id)).await
    }

    pub async fn submit_for_review(&self, id: i64) -> Result<ActionResponse<EceRequest>> {
        self.http
            .post_empty(&endpoints::detail_action(ECE_REQUESTS, id, "submit_for_review"))
            .await
    }

    /// Approve or reject a request. The comment is not checked here.
    pub async fn review(
        &self,
        id: i64,
        approved: bool,
        comments: Option<&str>,
    ) -> Result<ActionResponse<EceRequest>> {
        self.http
            .request(
                Method::POST,
                &endpoints::detail_action(ECE_REQUESTS, id, "review"),
                RequestBody::json(&ReviewDecision::new(approved, comments))?,
                RequestOptions::default(),
            )
            .await
    }

    pub async fn stats(&self) -> Result<RequestStats> {
        self.http
            .get(&endpoints::list_action(ECE_REQUESTS, "stats"))
            .await
    }

    /// Requests per month of `year`; the server's current year when `None`
    pub async fn monthly_report(&self, year: Option<i32>) -> Result<Vec<MonthlyCount>> {
        self.http
            .get_with(
                &endpoints::list_action(ECE_REQUESTS, "monthly_report"),
                RequestOptions::new().query_opt("year", year),
            )
            .await
    }
}
