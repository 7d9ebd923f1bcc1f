// Retry-on-unauthorized coordinator
//
// A 401 from a token plugin means the cached session went stale. The
// coordinator walks a small state machine:
//
//   Authenticated --401--> Reauthenticating --login ok--> Authenticated
//                                           \--no token--> Failed
//
// and reissues the original request exactly once from the re-authenticated
// state. A second 401 is handed back unchanged.

use tracing::{debug, warn};

use crate::contact::{ContactOutcome, ContactRequest, PluginClient};
use crate::error::Error;
use crate::health::HealthCheck;
use crate::transport::Transport;

/// Where a plugin session stands during a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Reauthenticating,
    Failed,
}

impl SessionState {
    /// The plugin rejected the current token.
    pub fn on_unauthorized(self) -> Self {
        match self {
            Self::Authenticated => Self::Reauthenticating,
            Self::Reauthenticating | Self::Failed => Self::Failed,
        }
    }

    /// A fresh login finished, with or without a token.
    pub fn on_login(self, obtained_token: bool) -> Self {
        match (self, obtained_token) {
            (Self::Reauthenticating, true) => Self::Authenticated,
            _ => Self::Failed,
        }
    }
}

impl<T: Transport, H: HealthCheck> PluginClient<T, H> {
    /// Handle a failed contact.
    ///
    /// If `failure` is a 401 and the plugin uses token auth, log in again
    /// (ignoring the cache) and reissue `request` once with the new token.
    /// Any other failure is returned unchanged. No token from the login
    /// short-circuits with [`Error::SessionUnavailable`] and no further call.
    pub async fn retry_after_reauth(
        &self,
        request: &ContactRequest,
        failure: Error,
        error_prefix: &str,
    ) -> Result<ContactOutcome, Error> {
        if !failure.is_unauthorized() || !request.plugin.uses_token_auth() {
            return Err(failure);
        }

        let state = SessionState::Authenticated.on_unauthorized();
        debug!(plugin_id = %request.plugin.id, ?state, "plugin rejected session token");

        let token = self.login(&request.plugin).await;
        let state = state.on_login(token.is_some());

        match (state, token) {
            (SessionState::Authenticated, Some(token)) => {
                debug!(plugin_id = %request.plugin.id, "reissuing request with new session");
                let retried = request.clone().with_token(token);
                self.contact(&retried, error_prefix).await
            }
            _ => {
                warn!(plugin_id = %request.plugin.id, ?state, "unable to re-authenticate");
                Err(Error::SessionUnavailable {
                    plugin_id: request.plugin.id.clone(),
                })
            }
        }
    }

    /// [`contact`](Self::contact) followed by
    /// [`retry_after_reauth`](Self::retry_after_reauth) on failure.
    pub async fn contact_with_retry(
        &self,
        request: &ContactRequest,
        error_prefix: &str,
    ) -> Result<ContactOutcome, Error> {
        match self.contact(request, error_prefix).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => self.retry_after_reauth(request, e, error_prefix).await,
        }
    }

    /// Authenticate `request` the way its plugin expects: a session token
    /// for token plugins, the plugin's own basic credentials otherwise.
    pub async fn authorize(&self, request: ContactRequest) -> Result<ContactRequest, Error> {
        if request.plugin.uses_token_auth() {
            let token = self
                .get_token(&request.plugin)
                .await
                .ok_or_else(|| Error::SessionUnavailable {
                    plugin_id: request.plugin.id.clone(),
                })?;
            Ok(request.with_token(token))
        } else {
            let auth = request.plugin.basic_auth();
            Ok(request.with_basic_auth(auth))
        }
    }
}
