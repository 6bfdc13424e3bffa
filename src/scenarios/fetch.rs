//! Page downloads over HTTP, the I/O-bound scenario.

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::FetchConfig;
use crate::parallel::{self, Comparison, TaskError};

/// A downloaded page. The body is kept out of serialized reports.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedPage {
    pub url: String,
    pub bytes: usize,
    #[serde(skip)]
    pub body: String,
}

/// HTTP client with a fixed per-request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fanout/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `url` and return its body.
    ///
    /// Deadline overruns map to [`TaskError::Timeout`], unreachable hosts to
    /// [`TaskError::Connection`] and non-2xx answers to [`TaskError::HttpStatus`].
    pub async fn fetch(&self, url: &str) -> Result<String, TaskError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| classify(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaskError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|err| classify(url, err))
    }

    /// Fetch `url` into a [`FetchedPage`]
    pub async fn page(&self, url: String) -> Result<FetchedPage, TaskError> {
        let body = self.fetch(&url).await?;
        Ok(FetchedPage {
            bytes: body.len(),
            url,
            body,
        })
    }
}

/// One-off fetch with its own client
pub async fn fetch(url: &str, timeout: Duration) -> Result<String, TaskError> {
    let fetcher = HttpFetcher::new(timeout).map_err(TaskError::external)?;
    fetcher.fetch(url).await
}

fn classify(url: &str, err: reqwest::Error) -> TaskError {
    if err.is_timeout() {
        TaskError::Timeout(format!("{url}: {err}"))
    } else if err.is_connect() {
        TaskError::Connection(format!("{url}: {err}"))
    } else {
        TaskError::External(format!("{url}: {err}"))
    }
}

/// Fetch every configured URL sequentially, then all at once
pub async fn run(settings: &FetchConfig) -> Result<Comparison<FetchedPage>> {
    let fetcher = HttpFetcher::new(settings.timeout())?;
    let comparison = parallel::compare_async(settings.urls.clone(), move |url| {
        let fetcher = fetcher.clone();
        async move { fetcher.page(url).await }
    })
    .await?;
    Ok(comparison)
}
