//! Async HTTP client for the Lost & Found portal backend
//!
//! Covers the three endpoints the claim workflow needs: the public item
//! listing, remote question generation and claim submission. Every request
//! carries the bearer token found in the session store, if any.

use crate::api::error_payload::ErrorPayload;
use crate::api::models::{
    ClaimOutcome, ClaimSubmission, GenerateQuestionsRequest, GenerateQuestionsResponse,
};
use crate::api::ClaimsBackend;
use crate::core::config::PortalConfig;
use crate::core::error::{ClaimError, Result};
use crate::core::types::Item;
use crate::questions::{ItemContext, QuestionSource};
use crate::session::SessionStore;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;

/// Client for the portal REST API
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl PortalClient {
    /// Create a client using `config` for the URL and timeouts
    pub fn new(config: &PortalConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-2xx response into a `ClaimError`
    ///
    /// A 401 also drops the stored token so the next login starts clean.
    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Backend rejected the session token, clearing it");
            self.session.clear_token()?;
            return Err(ClaimError::Unauthorized);
        }

        let message = ErrorPayload::parse(&body).message_or(
            status
                .canonical_reason()
                .unwrap_or("Request failed"),
        );
        Err(ClaimError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetch the public list of found items
    pub async fn public_items(&self) -> Result<Vec<Item>> {
        let response = self
            .authorized(self.client.get(self.url("items/public")))
            .send()
            .await?;
        let response = self.check(response).await?;
        let items: Vec<Item> = response.json().await?;
        tracing::debug!("Fetched {} public items", items.len());
        Ok(items)
    }

    /// Ask the backend to generate verification questions for an item
    pub async fn generate_questions(&self, item: &ItemContext) -> Result<Vec<String>> {
        let request = GenerateQuestionsRequest {
            item_keyword: &item.item_keyword,
            description: &item.description,
            location: &item.location,
            secret_message: &item.secret_message,
        };

        let response = self
            .authorized(self.client.post(self.url("claims/generate-questions")))
            .json(&request)
            .send()
            .await?;
        let response = self.check(response).await?;
        let body: GenerateQuestionsResponse = response.json().await?;
        Ok(body.questions)
    }

    /// Post a claim as a multipart form
    pub async fn submit_claim(&self, submission: &ClaimSubmission) -> Result<ClaimOutcome> {
        let form = claim_form(submission)?;
        let response = self
            .authorized(self.client.post(self.url("claims/ai-powered")))
            .multipart(form)
            .send()
            .await?;
        let response = self.check(response).await?;
        let outcome: ClaimOutcome = response.json().await?;
        tracing::info!(
            item_id = %submission.item_id,
            claim_id = outcome.claim_id.as_deref().unwrap_or("-"),
            "Claim submitted"
        );
        Ok(outcome)
    }
}

fn claim_form(submission: &ClaimSubmission) -> Result<Form> {
    let mut form = Form::new()
        .text("item_id", submission.item_id.clone())
        .text("product_type", submission.product_type.clone())
        .text("description", submission.description.clone())
        .text("identification_marks", submission.identification_marks.clone())
        .text("lost_location", submission.lost_location.clone())
        .text("approximate_date", submission.approximate_date.clone())
        .text("match_percentage", submission.match_percentage.to_string())
        .text("qa_data", serde_json::to_string(&submission.qa_data)?);

    if let Some(image) = &submission.proof_image {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        form = form.part("proof_image", part);
    }

    Ok(form)
}

#[async_trait]
impl QuestionSource for PortalClient {
    async fn fetch_questions(&self, item: &ItemContext) -> Result<Vec<String>> {
        self.generate_questions(item).await
    }
}

#[async_trait]
impl ClaimsBackend for PortalClient {
    async fn public_items(&self) -> Result<Vec<Item>> {
        PortalClient::public_items(self).await
    }

    async fn submit_claim(&self, submission: &ClaimSubmission) -> Result<ClaimOutcome> {
        PortalClient::submit_claim(self, submission).await
    }
}
