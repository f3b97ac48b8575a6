use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::debug;

use super::MarkStore;
use crate::credentials::Session;
use crate::error::{JudgeError, Result};
use crate::marks::{
    EditRequest, EditRequestStatus, Event, MarkRecord, NewEditRequest, NewMarkRecord,
    PerformanceTier, Student,
};

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusPatch {
    status: EditRequestStatus,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// REST client for the remote document store.
///
/// Reads are retried with exponential backoff on transient failures; writes
/// are sent once and any failure is handed back to the caller.
pub struct HttpStore {
    client: Client,
    base_url: Url,
    token: String,
    retries: usize,
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        session: &Session,
        timeout: Duration,
        retries: usize,
    ) -> Result<Self> {
        session.ensure_authenticated()?;

        let base_url = Url::parse(base_url).map_err(|e| {
            JudgeError::Transient(format!("invalid store url '{}': {}", base_url, e))
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("judge-desk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JudgeError::Transient(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: session.token.clone(),
            retries,
        })
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                JudgeError::Transient(format!("store url {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET with retries. A 404 is an absent document, not an error.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retries);

        RetryIf::spawn(
            strategy,
            || self.get_once::<T>(url.clone()),
            JudgeError::is_retryable,
        )
        .await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        decode(&url, &bytes).map(Some)
    }

    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        Ok(self.get_json::<Vec<T>>(url).await?.unwrap_or_default())
    }

    async fn post<B: Serialize>(&self, url: Url, body: &B) -> Result<String> {
        debug!(%url, "POST");
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let bytes = check_status(response)?
            .bytes()
            .await
            .map_err(transport_error)?;
        let created: Created = decode(&url, &bytes)?;
        Ok(created.id)
    }

    async fn send_update<B: Serialize>(
        &self,
        request: reqwest::RequestBuilder,
        body: &B,
        what: String,
    ) -> Result<()> {
        let response = request
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(JudgeError::NotFound(what));
        }
        check_status(response)?;
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> JudgeError {
    JudgeError::Transient(e.to_string())
}

/// A body that does not parse is the store's fault and is not retried.
fn decode<T: DeserializeOwned>(url: &Url, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| JudgeError::Store(format!("malformed response from {}: {}", url, e)))
}

/// Error for a non-success status. 404 is handled by the callers, since its
/// meaning differs between reads and updates.
fn status_error(status: StatusCode, url: &Url) -> Option<JudgeError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(JudgeError::Auth(format!(
            "store rejected credentials ({})",
            status
        )));
    }
    if !status.is_success() {
        return Some(JudgeError::Transient(format!("{} returned {}", url, status)));
    }
    None
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    match status_error(response.status(), response.url()) {
        Some(error) => Err(error),
        None => Ok(response),
    }
}

impl MarkStore for HttpStore {
    async fn fetch_mark_record(
        &self,
        student_id: &str,
        event_id: &str,
        tier: PerformanceTier,
    ) -> Result<Option<MarkRecord>> {
        let url = self.url(
            &["marks"],
            &[
                ("studentId", student_id),
                ("eventId", event_id),
                ("performanceTier", tier.as_str()),
            ],
        )?;
        let records: Vec<MarkRecord> = self.get_list(url).await?;
        Ok(records.into_iter().next())
    }

    async fn fetch_tier_records(&self, tier: PerformanceTier) -> Result<Vec<MarkRecord>> {
        let url = self.url(&["marks"], &[("performanceTier", tier.as_str())])?;
        self.get_list(url).await
    }

    async fn save_mark_record(&self, payload: &NewMarkRecord) -> Result<String> {
        let url = self.url(&["marks"], &[])?;
        self.post(url, payload).await
    }

    async fn update_mark_record(&self, mark_id: &str, payload: &NewMarkRecord) -> Result<()> {
        let url = self.url(&["marks", mark_id], &[])?;
        self.send_update(self.client.put(url), payload, format!("mark record {}", mark_id))
            .await
    }

    async fn fetch_edit_request(&self, mark_id: &str) -> Result<Option<EditRequest>> {
        let url = self.url(&["editRequests"], &[("markId", mark_id)])?;
        let requests: Vec<EditRequest> = self.get_list(url).await?;
        Ok(requests
            .into_iter()
            .max_by_key(|request| request.created_at))
    }

    async fn create_edit_request(&self, payload: &NewEditRequest) -> Result<String> {
        let url = self.url(&["editRequests"], &[])?;
        self.post(url, payload).await
    }

    async fn update_edit_request_status(
        &self,
        request_id: &str,
        status: EditRequestStatus,
    ) -> Result<()> {
        let url = self.url(&["editRequests", request_id], &[])?;
        let patch = StatusPatch {
            status,
            updated_at: chrono::Utc::now(),
        };
        self.send_update(
            self.client.patch(url),
            &patch,
            format!("edit request {}", request_id),
        )
        .await
    }

    async fn list_edit_requests(
        &self,
        status: Option<EditRequestStatus>,
    ) -> Result<Vec<EditRequest>> {
        let url = match status {
            Some(status) => self.url(&["editRequests"], &[("status", status.as_str())])?,
            None => self.url(&["editRequests"], &[])?,
        };
        self.get_list(url).await
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        let url = self.url(&["students"], &[])?;
        self.get_list(url).await
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let url = self.url(&["events"], &[])?;
        self.get_list(url).await
    }
}
