// Scripted collaborators for unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::SecretString;

use crate::auth::{AuthType, Plugin};
use crate::contact::PluginClient;
use crate::error::Error;
use crate::health::HealthCheck;
use crate::remap::UrlTranslation;
use crate::token_cache::TokenCache;
use crate::transport::{AUTH_TOKEN_HEADER, Transport, TransportRequest, TransportResponse};

pub(crate) enum Step {
    Respond(TransportResponse),
    Unreachable,
    BodyReadError,
}

impl Step {
    pub(crate) fn json(status: u16, body: &str) -> Self {
        Self::Respond(TransportResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_owned()),
        })
    }

    pub(crate) fn status(status: u16) -> Self {
        Self::json(status, "")
    }

    pub(crate) fn login(token: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_str(token).unwrap());
        Self::Respond(TransportResponse {
            status: 201,
            headers,
            body: Bytes::from_static(b"{}"),
        })
    }

    pub(crate) fn unreachable() -> Self {
        Self::Unreachable
    }

    pub(crate) fn body_read_error() -> Self {
        Self::BodyReadError
    }
}

/// Replays a fixed list of responses and records every request.
#[derive(Clone)]
pub(crate) struct ScriptedTransport {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<Mutex<Vec<TransportRequest>>>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        let endpoint = request.url.to_string();
        self.calls.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(resp)) => Ok(resp),
            Some(Step::BodyReadError) => Err(Error::BodyRead {
                context: String::new(),
                reason: "connection reset mid-body".into(),
            }),
            Some(Step::Unreachable) => Err(Error::Unreachable {
                context: String::new(),
                endpoint,
                reason: "connection refused".into(),
            }),
            None => Err(Error::Unreachable {
                context: String::new(),
                endpoint,
                reason: "script exhausted".into(),
            }),
        }
    }
}

/// Fixed health-check answer that counts how often it was asked.
#[derive(Clone)]
pub(crate) struct ScriptedHealth {
    alive: bool,
    probes: Arc<AtomicUsize>,
}

impl ScriptedHealth {
    pub(crate) fn alive() -> Self {
        Self {
            alive: true,
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn dead() -> Self {
        Self {
            alive: false,
            ..Self::alive()
        }
    }

    pub(crate) fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl HealthCheck for ScriptedHealth {
    async fn is_alive(&self, _plugin: &Plugin) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.alive
    }
}

pub(crate) fn token_plugin() -> Plugin {
    Plugin {
        id: "GRF".into(),
        ip: "10.0.0.5".into(),
        port: 45001,
        username: "admin".into(),
        password: SecretString::from("secret".to_owned()),
        preferred_auth_type: AuthType::XAuthToken,
    }
}

pub(crate) fn basic_plugin() -> Plugin {
    Plugin {
        id: "ILO".into(),
        preferred_auth_type: AuthType::BasicAuth,
        ..token_plugin()
    }
}

pub(crate) fn client(
    transport: ScriptedTransport,
    health: ScriptedHealth,
) -> PluginClient<ScriptedTransport, ScriptedHealth> {
    PluginClient::new(
        transport,
        health,
        Arc::new(TokenCache::new()),
        Arc::new(UrlTranslation::default()),
    )
}
