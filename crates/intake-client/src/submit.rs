//! Submission endpoint client

use async_trait::async_trait;
use intake_core::{
    FlightGateway, FlightPayload, IntakeConfig, IntakeError, SubmissionReceipt, SubmitError,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

/// Posts flight payloads with the static `token` and `candidate` headers
#[derive(Debug, Clone)]
pub struct HttpFlightGateway {
    client: Client,
    url: String,
}

impl HttpFlightGateway {
    /// Build a gateway; `timeout` of `None` leaves requests unbounded
    pub fn new(
        url: impl Into<String>,
        token: &str,
        candidate: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, SubmitError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut token = header_value("token", token)?;
        token.set_sensitive(true);
        headers.insert("token", token);
        headers.insert("candidate", header_value("candidate", candidate)?);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SubmitError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Build from configuration, checking credentials are present
    pub fn from_config(config: &IntakeConfig) -> Result<Self, IntakeError> {
        config.validate_for_submission()?;
        let submission = &config.submission;
        Ok(Self::new(
            submission.url.clone(),
            submission.token.as_deref().unwrap_or_default(),
            submission.candidate.as_deref().unwrap_or_default(),
            timeout_from_secs(config.http.timeout_secs),
        )?)
    }

    /// Endpoint URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FlightGateway for HttpFlightGateway {
    async fn submit(&self, payload: &FlightPayload) -> Result<SubmissionReceipt, SubmitError> {
        tracing::info!(
            "Submitting flight {} ({} guest(s)) to {}",
            payload.flight_number,
            payload.num_of_guests,
            self.url
        );

        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!("Submission rejected with status {}", status.as_u16());
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(parse_receipt(&body))
    }
}

/// Success bodies are informational; anything unparseable counts as an empty receipt
fn parse_receipt(body: &str) -> SubmissionReceipt {
    if body.trim().is_empty() {
        return SubmissionReceipt::default();
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        tracing::warn!("Submission succeeded with unreadable body: {}", e);
        SubmissionReceipt::default()
    })
}

/// `message` from a JSON error body, also looking one level into `error`
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let text = |v: &serde_json::Value| v.as_str().map(str::to_string);

    text(&value["message"])
        .or_else(|| text(&value["error"]["message"]))
        .or_else(|| text(&value["error"]))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, SubmitError> {
    HeaderValue::from_str(value)
        .map_err(|_| SubmitError::InvalidRequest(format!("{name} header is not valid ASCII")))
}

pub(crate) fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
