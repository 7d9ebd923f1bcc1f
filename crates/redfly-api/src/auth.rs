use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Which authentication scheme a plugin expects on south-bound calls.
///
/// Marker enum (no data) -- the credentials live on [`Plugin`] and
/// [`BasicAuth`]. Parsing is case-insensitive (`"xauthtoken"` is accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthType {
    /// Session login, then `X-Auth-Token` on every call.
    XAuthToken,
    /// HTTP basic auth on every call, no session.
    BasicAuth,
}

impl AuthType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XAuthToken => "XAuthToken",
            Self::BasicAuth => "BasicAuth",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("XAuthToken") {
            Ok(Self::XAuthToken)
        } else if s.eq_ignore_ascii_case("BasicAuth") {
            Ok(Self::BasicAuth)
        } else {
            Err(format!(
                "unknown auth type '{s}', expected 'XAuthToken' or 'BasicAuth'"
            ))
        }
    }
}

impl TryFrom<String> for AuthType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AuthType> for String {
    fn from(value: AuthType) -> Self {
        value.as_str().to_owned()
    }
}

/// Username/password pair sent as HTTP basic auth.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// A device-management backend the aggregator proxies to.
///
/// Looked up by id from the inventory; treated as immutable for the
/// duration of a contact attempt.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub id: String,
    pub ip: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub preferred_auth_type: AuthType,
}

impl Plugin {
    pub fn uses_token_auth(&self) -> bool {
        self.preferred_auth_type == AuthType::XAuthToken
    }

    /// The plugin's own credentials as a basic-auth pair.
    pub fn basic_auth(&self) -> BasicAuth {
        BasicAuth {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
