// redfly-api: plugin contact layer for a Redfish aggregator
//
// Sessions with south-bound plugins, the contact protocol with its
// health-gated resend and 401 re-authentication, and the URL translation
// between the aggregator's namespace and each plugin's.

pub mod auth;
pub mod contact;
pub mod error;
pub mod health;
pub mod remap;
pub mod retry;
pub mod session;
pub mod token_cache;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use auth::{AuthType, BasicAuth, Plugin};
pub use contact::{ContactOutcome, ContactRequest, PluginClient, ResponseStatus};
pub use error::Error;
pub use health::{HealthCheck, PluginStatusProbe, StatusPolling};
pub use remap::{SegmentTable, UrlTranslation};
pub use retry::SessionState;
pub use session::LOGIN_PATH;
pub use token_cache::TokenCache;
pub use transport::{
    AUTH_TOKEN_HEADER, ReqwestTransport, TlsMode, Transport, TransportConfig, TransportRequest,
    TransportResponse,
};
