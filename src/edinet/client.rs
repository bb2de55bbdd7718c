// src/edinet/client.rs
use crate::edinet::models::{DocumentListResponse, Filing};
use crate::utils::error::EdinetError;
use chrono::NaiveDate;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const EDINET_BASE_URL: &str = "https://disclosure.edinet-fsa.go.jp/api/v2";
const EDINET_USER_AGENT: &str = "yuho-index/0.1 (annual report index builder)";
// type=2 asks for document metadata including filer and form code.
const DOCUMENT_LIST_TYPE: &str = "2";
// Backoff delays are capped so a long retry chain cannot stall a build
// for minutes on a single date.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Client for the EDINET document list API with a minimum inter-call
/// interval and bounded exponential-backoff retry.
pub struct EdinetClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    min_interval: Duration,
    max_attempts: u32,
    last_call: Mutex<Option<Instant>>,
}

impl EdinetClient {
    pub fn new(
        api_key: Option<String>,
        min_interval: Duration,
        max_attempts: u32,
    ) -> Result<Self, EdinetError> {
        let http = reqwest::Client::builder()
            .user_agent(EDINET_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: EDINET_BASE_URL.to_string(),
            api_key,
            min_interval,
            max_attempts: max_attempts.max(1),
            last_call: Mutex::new(None),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Lists all filings submitted on the given date, retrying transient and
    /// structured upstream errors alike until the retry budget is exhausted.
    /// Zero filings is a legitimate (empty) success.
    pub async fn list_filings(&self, date: NaiveDate) -> Result<Vec<Filing>, EdinetError> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let mut backoff = self.min_interval.max(Duration::from_millis(500));
        let mut last_error: Option<EdinetError> = None;

        for attempt in 1..=self.max_attempts {
            self.respect_min_interval().await;

            match self.fetch_document_list(&date_str).await {
                Ok(filings) => {
                    tracing::debug!("{}: {} filings (attempt {})", date_str, filings.len(), attempt);
                    return Ok(filings);
                }
                Err(e) => {
                    tracing::warn!(
                        "{}: attempt {}/{} failed: {}",
                        date_str,
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        }

        Err(EdinetError::RetriesExhausted {
            date: date_str,
            attempts: self.max_attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts made".to_string()),
        })
    }

    /// Sleeps long enough that consecutive upstream calls are never closer
    /// together than the configured interval.
    async fn respect_min_interval(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }

    async fn fetch_document_list(&self, date: &str) -> Result<Vec<Filing>, EdinetError> {
        let url = format!("{}/documents.json", self.base_url);

        let mut request = self
            .http
            .get(&url)
            .query(&[("date", date), ("type", DOCUMENT_LIST_TYPE)]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("Subscription-Key", key.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EdinetError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: DocumentListResponse =
            serde_json::from_str(&body).map_err(|e| EdinetError::Parse {
                date: date.to_string(),
                source: e,
            })?;

        // The service reports failures inside the body with HTTP 200.
        if parsed.metadata.status != "200" {
            let status: u16 = parsed.metadata.status.parse().unwrap_or(0);
            return Err(EdinetError::Api {
                status,
                message: parsed.metadata.message,
            });
        }

        Ok(parsed.results)
    }
}
