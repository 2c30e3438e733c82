//! Blocking HTTP client for the instance status endpoint.

use std::time::Duration;

use tracing::debug;

use floodgate_core::{CountSource, FloodgateError, FloodgateResult};

const INSTANCE_PATH: &str = "/api/v1/instance";

#[derive(Debug)]
pub struct InstanceSampler {
    client: ureq::Agent,
    url: String,
}

impl InstanceSampler {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("floodgate/", env!("CARGO_PKG_VERSION")))
            .build();
        let url = format!("{}{INSTANCE_PATH}", base_url.trim_end_matches('/'));
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Blocking I/O
    pub fn fetch_stats(&self) -> FloodgateResult<serde_json::Value> {
        let resp = self.client.get(&self.url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => {
                FloodgateError::Fetch(format!("{} returned HTTP {code}", self.url))
            }
            ureq::Error::Transport(t) => FloodgateError::Fetch(format!("{}: {t}", self.url)),
        })?;
        debug!(url = %self.url, status = resp.status(), "instance stats fetched");
        resp.into_json()
            .map_err(|e| FloodgateError::Fetch(format!("{}: invalid JSON body: {e}", self.url)))
    }
}

impl CountSource for InstanceSampler {
    fn fetch_user_count(&self) -> FloodgateResult<Option<u64>> {
        let stats = self.fetch_stats()?;
        Ok(parse_user_count(&stats))
    }
}

/// Extract `stats.user_count`. Absent or non-integer counts yield `None`.
pub fn parse_user_count(body: &serde_json::Value) -> Option<u64> {
    body.get("stats")?.get("user_count")?.as_u64()
}
