use crate::{
    executor::{RequestExecutor, DEFAULT_TIMEOUT},
    http_client::{HttpClient, HyperHttpClient},
};
use std::{sync::Arc, time::Duration};

#[derive(Debug, Clone)]
pub struct RunnerConfiguration {
    timeout: Duration,
    http_client: Option<Arc<dyn HttpClient + Send + Sync>>,
}

impl RunnerConfiguration {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            http_client: None,
        }
    }

    /// Bounds every single round trip. Exceeding it aborts the scenario.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient + Send + Sync> {
        self.http_client
            .clone()
            .unwrap_or_else(|| Arc::new(HyperHttpClient::new()))
    }

    pub fn set_http_client(&mut self, http_client: Arc<dyn HttpClient + Send + Sync>) {
        self.http_client = Some(http_client);
    }

    pub(crate) fn executor(&self) -> RequestExecutor {
        RequestExecutor::new(self.http_client(), self.timeout)
    }
}

impl Default for RunnerConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
