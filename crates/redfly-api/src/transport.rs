// South-bound HTTP transport.
//
// `Transport` is the seam between the contact protocol and the network:
// the protocol decides *what* to send (endpoint, credentials, body) and a
// transport performs the call. `ReqwestTransport` is the production
// implementation; tests substitute scripted transports.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::auth::BasicAuth;
use crate::error::Error;

/// Header carrying the plugin session token, both ways.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// TLS verification mode for plugin connections.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use the aggregator's root CA from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (lab plugins with self-signed certs).
    #[default]
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("redfly/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// One outbound call, fully resolved.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Absolute endpoint (`https://{ip}:{port}{resource_path}`).
    pub url: Url,
    pub method: Method,
    /// Plugin-form resource path (already south-bound translated).
    pub resource_path: String,
    /// Bearer material for token plugins; `None` for basic-auth plugins.
    pub token: Option<SecretString>,
    pub basic_auth: Option<BasicAuth>,
    pub body: Option<serde_json::Value>,
}

/// What came back from the plugin, body fully read.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    /// The session token the plugin handed out, if any.
    pub fn auth_token(&self) -> Option<SecretString> {
        self.headers
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.to_owned()))
    }
}

/// Performs the actual network call for a [`TransportRequest`].
///
/// Implementations report calls that never produced a response as
/// [`Error::Transport`] or [`Error::Unreachable`], and failures reading
/// the body of a response that did arrive as [`Error::BodyRead`].
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, Error>> + Send;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    /// Wrap a pre-built client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self.http.request(request.method, request.url);
        if let Some(ref auth) = request.basic_auth {
            builder = builder.basic_auth(&auth.username, Some(auth.password.expose_secret()));
        }
        if let Some(ref token) = request.token {
            builder = builder.header(AUTH_TOKEN_HEADER, token.expose_secret());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|source| Error::Transport {
            context: String::new(),
            source,
        })?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::BodyRead {
                context: String::new(),
                reason: e.to_string(),
            })?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
