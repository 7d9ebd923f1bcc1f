// Contact-plugin protocol
//
// One south-bound call against a plugin: translate the resource path,
// pick credentials by the plugin's preferred auth scheme, send, gate a
// single resend on the plugin health check when the network fails, and
// translate a successful body back into aggregator URLs.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth::{BasicAuth, Plugin};
use crate::error::{Error, status_message};
use crate::health::HealthCheck;
use crate::remap::UrlTranslation;
use crate::token_cache::TokenCache;
use crate::transport::{Transport, TransportRequest};

/// Status summary of a contact: numeric code plus symbolic message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseStatus {
    pub code: u16,
    pub message: String,
}

impl ResponseStatus {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Describes one outbound call. Built fresh for every attempt.
#[derive(Debug, Clone)]
pub struct ContactRequest {
    pub plugin: Plugin,
    /// Aggregator-form resource path; south-bound translation happens on send.
    pub resource: String,
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub token: Option<SecretString>,
    pub basic_auth: Option<BasicAuth>,
}

impl ContactRequest {
    pub fn new(plugin: Plugin, method: Method, resource: impl Into<String>) -> Self {
        Self {
            plugin,
            resource: resource.into(),
            method,
            body: None,
            token: None,
            basic_auth: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }
}

/// Result of a successful contact.
#[derive(Debug, Clone)]
pub struct ContactOutcome {
    /// North-bound translated body.
    pub body: Bytes,
    /// `X-Auth-Token` from the response; only login calls carry one.
    pub auth_token: Option<SecretString>,
    pub status: ResponseStatus,
}

impl ContactOutcome {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: self.text(),
        })
    }
}

/// Absolute endpoint for `path` on `plugin`.
pub(crate) fn plugin_url(scheme: &str, plugin: &Plugin, path: &str) -> Result<Url, Error> {
    Ok(Url::parse(&format!(
        "{scheme}://{}:{}{path}",
        plugin.ip, plugin.port
    ))?)
}

/// Client for every plugin the aggregator talks to.
///
/// Owns the transport and health-check collaborators and shares the
/// process-wide [`TokenCache`] and [`UrlTranslation`] tables.
pub struct PluginClient<T, H> {
    transport: T,
    health: H,
    tokens: Arc<TokenCache>,
    translation: Arc<UrlTranslation>,
    scheme: String,
}

impl<T: Transport, H: HealthCheck> PluginClient<T, H> {
    pub fn new(
        transport: T,
        health: H,
        tokens: Arc<TokenCache>,
        translation: Arc<UrlTranslation>,
    ) -> Self {
        Self {
            transport,
            health,
            tokens,
            translation,
            scheme: "https".into(),
        }
    }

    /// Override the URL scheme (plain `http` for local test plugins).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn translation(&self) -> &UrlTranslation {
        &self.translation
    }

    pub fn health(&self) -> &H {
        &self.health
    }

    fn transport_request(&self, request: &ContactRequest) -> Result<TransportRequest, Error> {
        let resource_path = self.translation.south_bound_path(&request.resource);
        let url = plugin_url(&self.scheme, &request.plugin, &resource_path)?;

        let (token, basic_auth) = if request.plugin.uses_token_auth() {
            (request.token.clone(), None)
        } else {
            (None, request.basic_auth.clone())
        };

        Ok(TransportRequest {
            url,
            method: request.method.clone(),
            resource_path,
            token,
            basic_auth,
            body: request.body.clone(),
        })
    }

    /// Perform one call against the plugin.
    ///
    /// `error_prefix` names the operation and is prepended to every error.
    /// Only 200 and 201 count as success; anything else comes back as
    /// [`Error::Rejected`] carrying the plugin's real status and raw body.
    /// A network failure is resent once, and only if the plugin passes its
    /// health check.
    pub async fn contact(
        &self,
        request: &ContactRequest,
        error_prefix: &str,
    ) -> Result<ContactOutcome, Error> {
        let outbound = self.transport_request(request)?;
        debug!(
            plugin_id = %request.plugin.id,
            method = %outbound.method,
            path = %outbound.resource_path,
            "contacting plugin"
        );

        let response = match self.transport.send(outbound.clone()).await {
            Ok(resp) => Ok(resp),
            Err(e) if e.is_transport_failure() => {
                warn!(plugin_id = %request.plugin.id, error = %e, "plugin call failed, checking plugin status");
                if self.health.is_alive(&request.plugin).await {
                    self.transport.send(outbound).await
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        };
        let response = response.map_err(|e| {
            let e = e.with_context(error_prefix);
            error!("{e}");
            e
        })?;

        if !matches!(response.status, 200 | 201) {
            warn!(
                plugin_id = %request.plugin.id,
                status = response.status,
                "{error_prefix}plugin rejected request"
            );
            return Err(Error::Rejected {
                context: error_prefix.to_owned(),
                status: response.status,
                body: response.body,
            });
        }

        let auth_token = response.auth_token();
        Ok(ContactOutcome {
            body: self.translation.north_bound_body(response.body),
            auth_token,
            status: ResponseStatus::new(response.status, status_message::SUCCESS),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::test_support::{ScriptedHealth, ScriptedTransport, Step, basic_plugin, client, token_plugin};

    #[tokio::test]
    async fn basic_auth_plugin_gets_credentials_and_no_token() {
        let transport = ScriptedTransport::new([Step::json(200, r#"{"Id":"1"}"#)]);
        let client = client(transport.clone(), ScriptedHealth::alive());
        let plugin = basic_plugin();
        let request = ContactRequest::new(plugin.clone(), Method::GET, "/redfish/v1/Systems/1")
            .with_basic_auth(plugin.basic_auth())
            .with_token(SecretString::from("ignored".to_owned()));

        client.contact(&request, "get: ").await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let auth = calls[0].basic_auth.as_ref().unwrap();
        assert_eq!(auth.username, "admin");
        assert_eq!(auth.password.expose_secret(), "secret");
        assert!(calls[0].token.is_none());
        assert!(client.tokens().is_empty());
    }

    #[tokio::test]
    async fn token_plugin_sends_token_and_translated_path() {
        let transport = ScriptedTransport::new([Step::json(
            200,
            r#"{"@odata.id":"/ODIM/v1/Systems/1"}"#,
        )]);
        let client = client(transport.clone(), ScriptedHealth::alive());
        let request = ContactRequest::new(token_plugin(), Method::GET, "/redfish/v1/Systems/1")
            .with_token(SecretString::from("tok-1".to_owned()));

        let outcome = client.contact(&request, "get: ").await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].url.as_str(), "https://10.0.0.5:45001/ODIM/v1/Systems/1");
        assert_eq!(calls[0].resource_path, "/ODIM/v1/Systems/1");
        assert_eq!(calls[0].token.as_ref().unwrap().expose_secret(), "tok-1");
        assert!(calls[0].basic_auth.is_none());
        assert_eq!(outcome.text(), r#"{"@odata.id":"/redfish/v1/Systems/1"}"#);
        assert_eq!(outcome.status.code, 200);
    }

    #[tokio::test]
    async fn non_success_keeps_raw_body_and_status() {
        let transport = ScriptedTransport::new([Step::json(
            404,
            r#"{"error":"/ODIM/v1/Systems/9 not found"}"#,
        )]);
        let client = client(transport, ScriptedHealth::alive());
        let request = ContactRequest::new(token_plugin(), Method::GET, "/redfish/v1/Systems/9");

        let err = client.contact(&request, "get /redfish/v1/Systems/9: ").await.unwrap_err();

        assert_eq!(err.status().code, 404);
        assert_eq!(
            err.body().unwrap(),
            br#"{"error":"/ODIM/v1/Systems/9 not found"}"#
        );
        assert!(err.to_string().starts_with("get /redfish/v1/Systems/9: "));
    }

    #[tokio::test]
    async fn created_counts_as_success() {
        let transport = ScriptedTransport::new([Step::json(201, "{}")]);
        let client = client(transport, ScriptedHealth::alive());
        let request = ContactRequest::new(token_plugin(), Method::POST, "/redfish/v1/Systems");

        let outcome = client.contact(&request, "post: ").await.unwrap();
        assert_eq!(outcome.status.code, 201);
    }

    #[tokio::test]
    async fn transport_failure_resent_once_when_plugin_alive() {
        let transport = ScriptedTransport::new([Step::unreachable(), Step::json(200, "{}")]);
        let health = ScriptedHealth::alive();
        let client = client(transport.clone(), health.clone());
        let request = ContactRequest::new(token_plugin(), Method::GET, "/redfish/v1/Managers");

        client.contact(&request, "get: ").await.unwrap();

        assert_eq!(transport.calls().len(), 2);
        assert_eq!(health.probes(), 1);
    }

    #[tokio::test]
    async fn transport_failure_propagates_when_plugin_down() {
        let transport = ScriptedTransport::new([Step::unreachable(), Step::json(200, "{}")]);
        let health = ScriptedHealth::dead();
        let client = client(transport.clone(), health.clone());
        let request = ContactRequest::new(token_plugin(), Method::GET, "/redfish/v1/Managers");

        let err = client.contact(&request, "get managers: ").await.unwrap_err();

        assert!(err.is_transport_failure());
        assert_eq!(err.status().code, 500);
        assert!(err.to_string().starts_with("get managers: "));
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(health.probes(), 1);
    }

    #[tokio::test]
    async fn second_transport_failure_is_not_retried() {
        let transport = ScriptedTransport::new([Step::unreachable(), Step::unreachable()]);
        let client = client(transport.clone(), ScriptedHealth::alive());
        let request = ContactRequest::new(token_plugin(), Method::GET, "/redfish/v1/Managers");

        let err = client.contact(&request, "get: ").await.unwrap_err();

        assert!(err.is_transport_failure());
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn body_read_failure_is_internal_without_health_check() {
        let transport = ScriptedTransport::new([Step::body_read_error()]);
        let health = ScriptedHealth::alive();
        let client = client(transport, health.clone());
        let request = ContactRequest::new(token_plugin(), Method::GET, "/redfish/v1/Managers");

        let err = client.contact(&request, "get: ").await.unwrap_err();

        assert!(matches!(err, Error::BodyRead { .. }));
        assert_eq!(err.status().code, 500);
        assert_eq!(health.probes(), 0);
    }
}
