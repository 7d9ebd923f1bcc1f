// ── Core error types ──
//
// Resource-level failures. The `From<redfly_api::Error>` impl translates
// contact-layer errors so callers only ever see a status code, a message,
// and (for plugin rejections) the plugin's own payload.

use serde_json::Value;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Session errors ───────────────────────────────────────────────
    #[error("unable to create session with plugin {plugin_id}")]
    SessionUnavailable { plugin_id: String },

    // ── Plugin errors ────────────────────────────────────────────────
    /// The plugin answered with a non-success status.
    #[error("{message}")]
    Plugin {
        status: u16,
        message: String,
        /// The plugin's payload, parsed as JSON when possible.
        body: Value,
    },

    // ── Request errors ───────────────────────────────────────────────
    /// The north-bound payload failed validation.
    #[error("request payload validation failed: {0}")]
    InvalidRequest(String),

    // ── Credential errors ────────────────────────────────────────────
    #[error("error while trying to decrypt device password: {0}")]
    Decryption(String),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(entity_type: &str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.into(),
        }
    }

    /// HTTP status the north-bound caller should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidRequest(_) => 400,
            Self::SessionUnavailable { .. } => 401,
            Self::Plugin { status, .. } => *status,
            Self::Decryption(_) | Self::Internal(_) => 500,
        }
    }
}

// ── Conversion from contact-layer errors ─────────────────────────────

impl From<redfly_api::Error> for CoreError {
    fn from(err: redfly_api::Error) -> Self {
        match err {
            redfly_api::Error::SessionUnavailable { plugin_id } => {
                Self::SessionUnavailable { plugin_id }
            }
            redfly_api::Error::Rejected { status, ref body, .. } => {
                let body = serde_json::from_slice(body)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
                Self::Plugin {
                    status,
                    message: err.to_string(),
                    body,
                }
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejection_keeps_status_and_parsed_body() {
        let api = redfly_api::Error::Rejected {
            context: "get: ".into(),
            status: 403,
            body: br#"{"error":{"code":"Forbidden"}}"#.to_vec().into(),
        };
        let err = CoreError::from(api);
        assert_eq!(err.status_code(), 403);
        match err {
            CoreError::Plugin { body, message, .. } => {
                assert_eq!(body, json!({ "error": { "code": "Forbidden" } }));
                assert_eq!(message, "get: plugin returned HTTP 403");
            }
            other => panic!("expected Plugin error, got: {other:?}"),
        }
    }

    #[test]
    fn non_json_rejection_body_is_kept_as_text() {
        let api = redfly_api::Error::Rejected {
            context: String::new(),
            status: 502,
            body: b"bad gateway".to_vec().into(),
        };
        match CoreError::from(api) {
            CoreError::Plugin { body, .. } => assert_eq!(body, json!("bad gateway")),
            other => panic!("expected Plugin error, got: {other:?}"),
        }
    }

    #[test]
    fn session_failure_maps_to_unauthorized() {
        let err = CoreError::from(redfly_api::Error::SessionUnavailable {
            plugin_id: "GRF".into(),
        });
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "unable to create session with plugin GRF");
    }
}
