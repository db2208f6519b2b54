//! Fire-and-forget downloads of season catalogue files.
//!
//! The loader never waits on the network: it hands a [`FetchRequest`] to a
//! [`SeasonFetcher`] and returns. Completed downloads arrive later as
//! [`FetchResponse`] values on a channel owned by the caller, who feeds them
//! back into `SeasonDatabase::handle_fetch_response`.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    SeasonGet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub kind: RequestKind,
    pub url: String,
    /// Cache file name the downloaded body belongs to.
    pub filename: String,
}

impl FetchRequest {
    #[must_use]
    pub fn season(remote_location: &str, filename: &str) -> Self {
        Self {
            kind: RequestKind::SeasonGet,
            url: format!("{remote_location}{filename}"),
            filename: filename.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub request: FetchRequest,
    /// Response body, or a description of the transport failure.
    pub body: Result<String, String>,
}

/// Issues requests without blocking the caller.
pub trait SeasonFetcher {
    fn request(&self, request: FetchRequest);
}

/// Downloads with `reqwest` on a tokio runtime and reports back on a channel.
#[derive(Clone)]
pub struct HttpSeasonFetcher {
    client: Client,
    runtime: Handle,
    responses: UnboundedSender<FetchResponse>,
}

impl HttpSeasonFetcher {
    /// Creates a fetcher using a shared HTTP client.
    #[must_use]
    pub const fn new(
        client: Client,
        runtime: Handle,
        responses: UnboundedSender<FetchResponse>,
    ) -> Self {
        Self {
            client,
            runtime,
            responses,
        }
    }

    /// Creates a fetcher with its own client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(
        timeout: Duration,
        user_agent: &str,
        runtime: Handle,
        responses: UnboundedSender<FetchResponse>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::new(client, runtime, responses))
    }
}

impl SeasonFetcher for HttpSeasonFetcher {
    fn request(&self, request: FetchRequest) {
        let client = self.client.clone();
        let responses = self.responses.clone();

        info!(url = %request.url, kind = ?request.kind, "Requesting season data");

        self.runtime.spawn(async move {
            let body = fetch_text(&client, &request.url)
                .await
                .map_err(|e| format!("{e:#}"));

            if let Err(e) = &body {
                warn!(url = %request.url, error = %e, "Season download failed");
            }

            if responses.send(FetchResponse { request, body }).is_err() {
                debug!("Season response receiver dropped");
            }
        });
    }
}

async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    client
        .get(url)
        .send()
        .await
        .context("Failed to send request")?
        .error_for_status()
        .context("Request returned error status")?
        .text()
        .await
        .context("Failed to read response body")
}
