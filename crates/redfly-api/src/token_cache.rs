// Per-plugin session token cache
//
// One token per plugin id, last writer wins. A single mutex guards the whole
// map and is only ever held for one read or write, never across a network
// call. Tokens have no expiry: the plugin answering 401 is the only signal
// that a cached token went stale, at which point it is overwritten.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tracing::trace;

/// Shared mapping from plugin id to its current session token.
///
/// Construct one per process and hand it to every [`PluginClient`](crate::PluginClient)
/// by `Arc`.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: Mutex<HashMap<String, SecretString>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SecretString>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `token` for `plugin_id`, replacing whatever was there.
    pub fn store(&self, plugin_id: &str, token: SecretString) {
        trace!(plugin_id, "caching plugin session token");
        self.lock().insert(plugin_id.to_owned(), token);
    }

    /// The token currently cached for `plugin_id`, if any.
    pub fn get(&self, plugin_id: &str) -> Option<SecretString> {
        self.lock().get(plugin_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
