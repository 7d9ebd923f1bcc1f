// Plugin session management
//
// Token plugins are logged into once and the issued `X-Auth-Token` is reused
// from the cache until the plugin rejects it. Login failure is logged and
// reported as `None`; callers turn that into "unable to create session".

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::Plugin;
use crate::contact::{ContactRequest, PluginClient};
use crate::health::HealthCheck;
use crate::transport::Transport;

/// Plugin login resource.
pub const LOGIN_PATH: &str = "/ODIM/v1/Sessions";

impl<T: Transport, H: HealthCheck> PluginClient<T, H> {
    /// A usable token for `plugin`: the cached one if present, otherwise
    /// a fresh login.
    pub async fn get_token(&self, plugin: &Plugin) -> Option<SecretString> {
        if let Some(token) = self.tokens().get(&plugin.id) {
            return Some(token);
        }
        self.login(plugin).await
    }

    /// Create a new session with `plugin`, bypassing the cache.
    ///
    /// `POST /ODIM/v1/Sessions` with the plugin's credentials. On success
    /// the returned token replaces any cached one.
    pub async fn login(&self, plugin: &Plugin) -> Option<SecretString> {
        debug!(plugin_id = %plugin.id, "creating plugin session");

        let request = ContactRequest::new(plugin.clone(), Method::POST, LOGIN_PATH).with_body(
            json!({
                "Username": plugin.username,
                "Password": plugin.password.expose_secret(),
            }),
        );

        let token = match self
            .contact(&request, "error while logging in to plugin: ")
            .await
        {
            Ok(outcome) => outcome.auth_token,
            Err(e) => {
                warn!(plugin_id = %plugin.id, "{e}");
                None
            }
        };

        match token {
            Some(token) => {
                self.tokens().store(&plugin.id, token.clone());
                Some(token)
            }
            None => {
                warn!(plugin_id = %plugin.id, "plugin login returned no session token");
                None
            }
        }
    }
}
