//! HTTP exchanges with the recognition service.
//!
//! Two requests exist: the submission POST and the polling GET. Both carry
//! `Authorization: Basic <api_key>` with the key passed through verbatim.
//! Non-success statuses are returned as [`SightError::Transport`] with the
//! response body attached; nothing is retried here.

use crate::error::SightError;
use crate::output::PageBatch;
use crate::pipeline::encode::SubmissionPayload;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// What the service did with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Accepted for asynchronous processing; poll this URL.
    Polling(String),
    /// Recognized immediately (single small file).
    Recognized(String),
}

#[derive(Debug, Deserialize)]
struct SubmissionResponse {
    #[serde(rename = "PollingURL")]
    polling_url: Option<String>,
    #[serde(rename = "RecognizedText")]
    recognized_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(rename = "Pages")]
    pages: PageBatch,
}

/// Interpret a successful submission response body.
///
/// `PollingURL` wins when both fields are present.
pub fn parse_submission(body: &str) -> Result<SubmissionOutcome, SightError> {
    let resp: SubmissionResponse = parse_json(body)?;
    match (resp.polling_url, resp.recognized_text) {
        (Some(url), _) => Ok(SubmissionOutcome::Polling(url)),
        (None, Some(text)) => Ok(SubmissionOutcome::Recognized(text)),
        (None, None) => Err(SightError::protocol(
            "unexpected response shape: PollingURL and RecognizedText are both null or missing",
        )),
    }
}

/// Interpret a successful poll response body.
pub fn parse_poll(body: &str) -> Result<PageBatch, SightError> {
    let resp: PollResponse = parse_json(body)?;
    Ok(resp.pages)
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, SightError> {
    serde_json::from_str(body).map_err(|e| SightError::protocol(e.to_string()))
}

/// Authenticated HTTP client for one recognition call.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    authorization: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(http: reqwest::Client, api_key: &str) -> Self {
        Self {
            http,
            authorization: format!("Basic {api_key}"),
        }
    }

    /// POST the payload to `endpoint`.
    pub async fn submit(
        &self,
        endpoint: &str,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionOutcome, SightError> {
        debug!("POST {} ({} files)", endpoint, payload.len());
        let request = self
            .http
            .post(endpoint)
            .header(AUTHORIZATION, &self.authorization)
            .json(payload);
        let body = send(endpoint, request).await?;
        parse_submission(&body)
    }

    /// GET the polling URL once.
    pub async fn poll(&self, url: &str) -> Result<PageBatch, SightError> {
        let request = self.http.get(url).header(AUTHORIZATION, &self.authorization);
        let body = send(url, request).await?;
        let pages = parse_poll(&body)?;
        debug!("GET {} → {} pages", url, pages.len());
        Ok(pages)
    }
}

/// Send a request and return the body of a success response.
async fn send(url: &str, request: reqwest::RequestBuilder) -> Result<String, SightError> {
    let network = |e: reqwest::Error| SightError::Network {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let response = request.send().await.map_err(network)?;
    let status = response.status();

    if !status.is_success() {
        return Err(SightError::Transport {
            url: url.to_string(),
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    response.text().await.map_err(network)
}
