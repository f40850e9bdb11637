use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::foundation::error::{InkframeError, InkframeResult};

const USER_AGENT: &str = concat!("inkframe/", env!("CARGO_PKG_VERSION"));
const DEFAULT_MAX_BODY: u64 = 20 * 1024 * 1024;

/// Blocking HTTP client with a single global timeout per request.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    timeout: Duration,
    max_body: u64,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .field("max_body", &self.max_body)
            .finish()
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            timeout,
            max_body: DEFAULT_MAX_BODY,
        }
    }

    pub fn with_max_body(mut self, max_body: u64) -> Self {
        self.max_body = max_body;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> InkframeResult<T> {
        let mut req = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json");
        for (k, v) in query {
            req = req.query(*k, *v);
        }
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let mut response = req.call().map_err(|e| upstream(url, e))?;
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| upstream(url, e))
    }

    pub fn get_bytes(&self, url: &str, headers: &[(&str, &str)]) -> InkframeResult<Vec<u8>> {
        let mut req = self.agent.get(url).header("User-Agent", USER_AGENT);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let mut response = req.call().map_err(|e| upstream(url, e))?;
        response
            .body_mut()
            .with_config()
            .limit(self.max_body)
            .read_to_vec()
            .map_err(|e| upstream(url, e))
    }

    /// POST a JSON body; returns the response bytes and content type.
    pub fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(&str, &str)],
    ) -> InkframeResult<(Vec<u8>, Option<String>)> {
        let mut req = self.agent.post(url).header("User-Agent", USER_AGENT);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let mut response = req.send_json(body).map_err(|e| upstream(url, e))?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_body)
            .read_to_vec()
            .map_err(|e| upstream(url, e))?;
        Ok((bytes, content_type))
    }
}

fn upstream(url: &str, err: ureq::Error) -> InkframeError {
    // Query strings may carry API keys.
    let shown = url.split('?').next().unwrap_or(url);
    InkframeError::upstream(format!("{shown}: {err}"))
}
