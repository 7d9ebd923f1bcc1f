// Plugin liveness probe
//
// Consulted once after a transport failure to decide whether the failed
// call is worth repeating. The probe owns its own bounded retry policy.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use tracing::{debug, warn};

use crate::auth::Plugin;
use crate::contact::plugin_url;
use crate::transport::{Transport, TransportRequest};

/// Plugin status endpoint, relative to the plugin root.
pub const STATUS_PATH: &str = "/ODIM/v1/Status";

/// Answers "is this plugin alive right now?".
pub trait HealthCheck: Send + Sync {
    fn is_alive(&self, plugin: &Plugin) -> impl Future<Output = bool> + Send;
}

/// Retry policy for the status probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolling {
    pub max_retry_attempt: u32,
    pub retry_interval: Duration,
    pub response_timeout: Duration,
}

impl Default for StatusPolling {
    fn default() -> Self {
        Self {
            max_retry_attempt: 3,
            retry_interval: Duration::from_secs(1),
            response_timeout: Duration::from_secs(3),
        }
    }
}

/// [`HealthCheck`] that polls the plugin's status endpoint.
///
/// Sends `GET /ODIM/v1/Status` with the plugin's basic credentials, up to
/// `max_retry_attempt` times. Any 2xx answer means alive.
#[derive(Debug, Clone)]
pub struct PluginStatusProbe<T> {
    transport: T,
    scheme: String,
    policy: StatusPolling,
}

impl<T: Transport> PluginStatusProbe<T> {
    pub fn new(transport: T, policy: StatusPolling) -> Self {
        Self {
            transport,
            scheme: "https".into(),
            policy,
        }
    }

    /// Override the URL scheme (plain `http` for local test plugins).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    async fn probe_once(&self, plugin: &Plugin) -> bool {
        let url = match plugin_url(&self.scheme, plugin, STATUS_PATH) {
            Ok(url) => url,
            Err(e) => {
                warn!(plugin_id = %plugin.id, error = %e, "cannot build status URL");
                return false;
            }
        };
        let request = TransportRequest {
            url,
            method: Method::GET,
            resource_path: STATUS_PATH.to_owned(),
            token: None,
            basic_auth: Some(plugin.basic_auth()),
            body: None,
        };

        match tokio::time::timeout(self.policy.response_timeout, self.transport.send(request)).await
        {
            Ok(Ok(resp)) => (200..300).contains(&resp.status),
            Ok(Err(e)) => {
                debug!(plugin_id = %plugin.id, error = %e, "status probe failed");
                false
            }
            Err(_) => {
                debug!(plugin_id = %plugin.id, "status probe timed out");
                false
            }
        }
    }
}

impl<T: Transport> HealthCheck for PluginStatusProbe<T> {
    async fn is_alive(&self, plugin: &Plugin) -> bool {
        let attempts = self.policy.max_retry_attempt.max(1);
        for attempt in 1..=attempts {
            if self.probe_once(plugin).await {
                debug!(plugin_id = %plugin.id, attempt, "plugin is alive");
                return true;
            }
            if attempt < attempts {
                tokio::time::sleep(self.policy.retry_interval).await;
            }
        }
        warn!(plugin_id = %plugin.id, attempts, "plugin did not answer status probe");
        false
    }
}
