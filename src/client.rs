//! HTTP client for the RSVP API.
//!
//! What a page needs to render an RSVP button: toggle, initial status, the
//! attending count (optionally polled), and a best-effort public IP for the
//! toggle payload. Counts are pull-only; there is no push channel.

use crate::domain::EventWithRsvpCount;
use crate::handlers::{ApiResponse, AttendanceResponse, CountResponse, ErrorResponse, ToggleRequest};
use anyhow::{anyhow, Context, Result};
use futures::stream::{self, Stream};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Default service for [`RsvpClient::lookup_public_ip`].
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

const IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Shortest polling period accepted by [`RsvpClient::watch_attending_count`].
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Deserialize)]
struct IpLookupResponse {
    ip: Option<String>,
}

/// Typed client for one RSVP API deployment.
#[derive(Debug, Clone)]
pub struct RsvpClient {
    // ---
    base_url: Url,
    http: Client,
}

impl RsvpClient {
    // ---
    /// Create a client for the API rooted at `base_url` (e.g. `http://127.0.0.1:8080`
    /// or `https://club.example/api`).
    pub fn new(base_url: &str) -> Result<Self> {
        // ---
        Self::with_http_client(base_url, Client::new())
    }

    pub fn with_http_client(base_url: &str, http: Client) -> Result<Self> {
        // ---
        let mut url = Url::parse(base_url).with_context(|| format!("invalid base URL {base_url}"))?;
        if url.cannot_be_a_base() {
            return Err(anyhow!("invalid base URL {base_url}: not a hierarchical URL"));
        }

        // Relative joins replace the last segment unless the path ends in '/'
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self { base_url: url, http })
    }

    fn url(&self, path: &str) -> Result<Url> {
        // ---
        self.base_url
            .join(path)
            .with_context(|| format!("invalid request path {path}"))
    }

    /// Unwrap `{ "data": ... }` or turn `{ "error": ... }` into an error.
    async fn read_data<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
        // ---
        let status = response.status();
        if status.is_success() {
            let body: ApiResponse<T> = response
                .json()
                .await
                .with_context(|| format!("{action}: malformed response"))?;
            return Ok(body.data);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(anyhow!("{action}: {message} ({status})"))
    }

    /// Flip this browser's RSVP. Returns `true` when now attending.
    pub async fn toggle_rsvp(
        &self,
        event_id: Uuid,
        fingerprint: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<bool> {
        // ---
        let request = ToggleRequest {
            fingerprint: fingerprint.to_string(),
            ip_address,
            user_agent,
        };

        let response = self
            .http
            .post(self.url(&format!("events/{event_id}/rsvp"))?)
            .json(&request)
            .send()
            .await
            .context("Failed to toggle RSVP")?;

        let body: AttendanceResponse = Self::read_data(response, "Failed to toggle RSVP").await?;
        Ok(body.attending)
    }

    /// Whether this browser currently holds an `attending` RSVP.
    pub async fn attending_status(&self, event_id: Uuid, fingerprint: &str) -> Result<bool> {
        // ---
        let response = self
            .http
            .get(self.url(&format!("events/{event_id}/rsvp"))?)
            .query(&[("fingerprint", fingerprint)])
            .send()
            .await
            .context("Failed to check existing RSVP")?;

        let body: AttendanceResponse =
            Self::read_data(response, "Failed to check existing RSVP").await?;
        Ok(body.attending)
    }

    /// Current attending count for the event.
    pub async fn attending_count(&self, event_id: Uuid) -> Result<i64> {
        // ---
        let response = self
            .http
            .get(self.url(&format!("events/{event_id}/rsvp/count"))?)
            .send()
            .await
            .context("Failed to fetch RSVP count")?;

        let body: CountResponse = Self::read_data(response, "Failed to fetch RSVP count").await?;
        Ok(body.count)
    }

    /// Event details including the RSVP count.
    pub async fn event_details(&self, event_id: Uuid) -> Result<EventWithRsvpCount> {
        // ---
        let response = self
            .http
            .get(self.url(&format!("events/{event_id}"))?)
            .send()
            .await
            .context("Failed to fetch event details")?;

        Self::read_data(response, "Failed to fetch event details").await
    }

    /// Poll the attending count: the first item is fetched immediately, then
    /// one per `interval`. Failed polls are yielded as errors and polling
    /// continues; the caller decides whether to keep showing the last count.
    ///
    /// Must be called from within a Tokio runtime. Periods shorter than
    /// [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn watch_attending_count(
        &self,
        event_id: Uuid,
        interval: Duration,
    ) -> impl Stream<Item = Result<i64>> + Send + 'static {
        // ---
        let client = self.clone();
        let ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));

        stream::unfold((client, ticker), move |(client, mut ticker)| async move {
            ticker.tick().await;
            let count = client.attending_count(event_id).await;
            Some((count, (client, ticker)))
        })
    }

    /// Best-effort lookup of the caller's public IP address.
    ///
    /// Gives up after five seconds; any failure is logged and yields `None`.
    pub async fn lookup_public_ip(&self, lookup_url: &str) -> Option<String> {
        // ---
        let result = async {
            let response = self
                .http
                .get(lookup_url)
                .timeout(IP_LOOKUP_TIMEOUT)
                .send()
                .await?
                .error_for_status()?;
            let body: IpLookupResponse = response.json().await?;
            Ok::<_, reqwest::Error>(body.ip)
        }
        .await;

        match result {
            Ok(ip) => ip.filter(|ip| !ip.is_empty()),
            Err(err) => {
                tracing::warn!("Could not fetch IP address: {err}");
                None
            }
        }
    }
}
