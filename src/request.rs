use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::{Error, Result};

/// One authenticated browsing session. Owns the HTTP client and its cookie jar,
/// every request of a run goes through it.
#[derive(Debug)]
pub struct Session {
    client: Client,
    base: Url,
    failure_markers: Vec<String>,
    page_timeout: Duration,
}

impl Session {
    /// Builds the client. `timeout_secs` bounds connecting and each read; whole pages are
    /// also bounded in total, asset streams are not.
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(&config.user_agent)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base: Url::parse(&config.base_url)?,
            failure_markers: config.login_failure_markers.clone(),
            page_timeout: timeout,
        })
    }

    /// Site origin every relative link is resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Posts the login form. The site answers 200 either way, so success is
    /// decided by [`login_rejected`] on the response body.
    pub async fn authenticate(&self, handle: &str, secret: &str) -> Result<bool> {
        let login_url = self.base.join("/login/")?;
        let form = [
            ("action", "login"),
            ("name", handle),
            ("pass", secret),
            ("login", "Login to FurAffinity"),
        ];

        let res = self
            .client
            .post(login_url.clone())
            .timeout(self.page_timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::fetch(login_url.as_str(), e))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| Error::fetch(login_url.as_str(), e))?;

        let accepted = status.is_success() && !login_rejected(&body, self.failure_markers.as_slice());
        if accepted {
            info!(handle, "login accepted");
        } else {
            debug!(handle, %status, "login rejected");
        }
        Ok(accepted)
    }

    /// Requests a page and returns its HTML.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let res = self.get(url, Some(self.page_timeout)).await?;
        res.text().await.map_err(|e| Error::fetch(url, e))
    }

    /// Sends a GET and checks the status, leaving the body unread for streaming.
    /// Only connecting and each read are time-limited, so a slow but live transfer finishes.
    pub async fn fetch_stream(&self, url: &str) -> Result<Response> {
        self.get(url, None).await
    }

    async fn get(&self, url: &str, total: Option<Duration>) -> Result<Response> {
        debug!(url, "GET");
        let mut req = self.client.get(url);
        if let Some(total) = total {
            req = req.timeout(total);
        }
        req.send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| Error::fetch(url, e))
    }
}

/// True when the login response body carries any of the failure markers.
pub fn login_rejected<S: AsRef<str>>(body: &str, markers: &[S]) -> bool {
    markers
        .iter()
        .map(AsRef::as_ref)
        .filter(|marker| !marker.is_empty())
        .any(|marker| body.contains(marker))
}
