//! Vendor API keys supplied through the process environment.

use std::fmt;

pub const ARK_API_KEY_ENV: &str = "ARK_API_KEY";
pub const REMOVE_BG_API_KEY_ENV: &str = "REMOVE_BG_API_KEY";

/// An API key whose `Debug`/`Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank values so an empty env var counts as unset.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub ark: Option<ApiKey>,
    pub remove_bg: Option<ApiKey>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            ark: std::env::var(ARK_API_KEY_ENV).ok().and_then(ApiKey::new),
            remove_bg: std::env::var(REMOVE_BG_API_KEY_ENV)
                .ok()
                .and_then(ApiKey::new),
        }
    }
}
