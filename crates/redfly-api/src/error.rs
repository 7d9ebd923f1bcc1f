use thiserror::Error;

/// Symbolic status messages attached to [`ResponseStatus`](crate::ResponseStatus).
pub mod status_message {
    pub const INTERNAL_ERROR: &str = "InternalError";
    pub const NO_VALID_SESSION: &str = "NoValidSession";
    pub const GENERAL_ERROR: &str = "GeneralError";
    pub const SUCCESS: &str = "Success";
}

/// Top-level error type for the `redfly-api` crate.
///
/// Covers every failure mode of a plugin contact: transport, body read,
/// plugin rejection, and session creation. Every variant produced by
/// [`PluginClient::contact`](crate::PluginClient::contact) carries the
/// caller-supplied prefix naming the operation that was attempted.
/// `redfly-core` maps these into resource-level failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login produced no token for a token-authenticated plugin.
    #[error("unable to create session with plugin {plugin_id}")]
    SessionUnavailable { plugin_id: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("{context}{source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Transport failure reported by a non-reqwest transport.
    #[error("{context}plugin unreachable at {endpoint}: {reason}")]
    Unreachable {
        context: String,
        endpoint: String,
        reason: String,
    },

    /// The response arrived but its body could not be read.
    #[error("{context}error while trying to read response body: {reason}")]
    BodyRead { context: String, reason: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Plugin ──────────────────────────────────────────────────────
    /// The plugin answered with something other than 200 or 201.
    ///
    /// The raw body is kept so callers can forward the plugin's own
    /// error payload north.
    #[error("{context}plugin returned HTTP {status}")]
    Rejected {
        context: String,
        status: u16,
        body: bytes::Bytes,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON (de)serialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the plugin rejected the call with 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401, .. })
    }

    /// Returns `true` if the call never produced an HTTP response.
    ///
    /// These are the failures gated by the plugin health check.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Unreachable { .. })
    }

    /// Prepend an operation description, for errors that carry one.
    pub(crate) fn with_context(self, prefix: &str) -> Self {
        match self {
            Self::Transport { context, source } => Self::Transport {
                context: format!("{prefix}{context}"),
                source,
            },
            Self::Unreachable {
                context,
                endpoint,
                reason,
            } => Self::Unreachable {
                context: format!("{prefix}{context}"),
                endpoint,
                reason,
            },
            Self::BodyRead { context, reason } => Self::BodyRead {
                context: format!("{prefix}{context}"),
                reason,
            },
            Self::Rejected {
                context,
                status,
                body,
            } => Self::Rejected {
                context: format!("{prefix}{context}"),
                status,
                body,
            },
            other => other,
        }
    }

    /// The raw plugin body, when the plugin answered at all.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Status summary reported alongside this error.
    pub fn status(&self) -> crate::ResponseStatus {
        match self {
            Self::SessionUnavailable { .. } => {
                crate::ResponseStatus::new(401, status_message::NO_VALID_SESSION)
            }
            Self::Rejected { status, .. } => {
                crate::ResponseStatus::new(*status, status_message::GENERAL_ERROR)
            }
            _ => crate::ResponseStatus::new(500, status_message::INTERNAL_ERROR),
        }
    }
}
