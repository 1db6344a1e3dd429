//! API key credential for the Black Forest Labs service.
//!
//! The server never negotiates credentials itself: a pre-issued key is read
//! from the environment and passed through verbatim on every outbound call.
//! [`ApiKey`] keeps the secret out of `Debug` and `Display` output so it cannot
//! leak into traces or tool results.

use std::fmt;

use crate::error::Error;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BFL_API_KEY";

/// Header used to attach the key to service requests.
pub const API_KEY_HEADER: &str = "x-key";

/// An opaque, pre-issued API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key. Blank keys are treated as absent.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Expose the secret for use in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Turn an optional key into the key or an authentication error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` naming the environment variable when
    /// no key was configured.
    pub fn require(key: Option<&ApiKey>) -> Result<&ApiKey, Error> {
        key.ok_or_else(|| Error::authentication(format!("{} not set", API_KEY_ENV)))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***redacted***")
    }
}
