//! HTTP transport seam
//!
//! The DEX client builds a fully signed [`ApiRequest`] and hands it to an
//! [`HttpTransport`]. Production uses [`ReqwestTransport`]; tests swap in a
//! recording stub so no network is touched.

use super::signer::HttpMethod;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A signed request ready to send
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path including the `/api/v5` prefix
    pub path: String,
    /// Encoded query string, exactly as signed (no leading `?`)
    pub query: String,
    pub body: Option<String>,
    pub headers: Vec<(&'static str, String)>,
}

impl ApiRequest {
    /// Path plus `?query` when a query is present
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// Decoded value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends signed requests and returns the raw response body
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<String>;
}

/// `reqwest`-backed transport
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for `base_url` (e.g. `https://www.okx.com`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid OKX base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<String> {
        let url = format!("{}{}", self.base_url, request.path_and_query());

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        tracing::debug!(method = request.method.as_str(), path = %request.path, "Sending OKX request");

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, path = %request.path, "OKX request failed");
            return Err(Error::Upstream(format!("HTTP {}: {}", status, body)));
        }

        Ok(body)
    }
}

#[cfg(test)]
pub(crate) use stub::StubTransport;

#[cfg(test)]
mod stub {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Recording transport returning canned bodies in order
    #[derive(Default)]
    pub(crate) struct StubTransport {
        responses: Mutex<VecDeque<std::result::Result<String, String>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_json(&self, body: serde_json::Value) -> &Self {
            self.responses.lock().push_back(Ok(body.to_string()));
            self
        }

        pub fn push_failure(&self, message: &str) -> &Self {
            self.responses.lock().push_back(Err(message.to_string()));
            self
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn send(&self, request: ApiRequest) -> Result<String> {
            self.requests.lock().push(request);
            match self.responses.lock().pop_front() {
                Some(Ok(body)) => Ok(body),
                Some(Err(message)) => Err(Error::Upstream(message)),
                None => Err(Error::Upstream("no stubbed response".to_string())),
            }
        }
    }
}
