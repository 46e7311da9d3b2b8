//! Single-request retrieval from an HTTP endpoint.

use std::time::Duration;

use analytics_core::error::{AnalyticsError, Result};
use reqwest::blocking::{Client, Response};

use crate::retriever::{FetchedBlob, Retriever};

/// Map a transport-level reqwest failure.
pub(crate) fn transport(err: reqwest::Error) -> AnalyticsError {
    AnalyticsError::Http(err.to_string())
}

/// Fail on any non-2xx status.
pub(crate) fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(AnalyticsError::HttpStatus {
            status: status.as_u16(),
            url: resp.url().to_string(),
        });
    }
    Ok(resp)
}

/// Fetches one export with a single GET. Any failure aborts the run.
pub struct UrlRetriever {
    client: Client,
    url: String,
    token: Option<String>,
}

impl UrlRetriever {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("site-analytics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            url: url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Retriever for UrlRetriever {
    fn name(&self) -> &'static str {
        "url"
    }

    fn fetch(&self) -> Result<Vec<FetchedBlob>> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = check_status(request.send().map_err(transport)?)?;
        let text = resp.text().map_err(transport)?;

        Ok(vec![FetchedBlob {
            name: self.url.clone(),
            text,
        }])
    }
}
