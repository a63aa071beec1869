//! Marketplace credential handling.
//!
//! Cloverly authenticates with a private key carried in a bearer header of the
//! form `Bearer private_key:<key>`. The key is never logged; `Debug` redacts it.

use std::fmt;

use crate::error::{OffsetError, OffsetResult};

/// Environment variable consulted when the inbound request has no key.
pub const PRIVATE_KEY_ENV: &str = "ABSOLVE_PRIVATE_KEY";

/// Marketplace private key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a private key. Empty (or whitespace-only) keys are rejected.
    pub fn new(key: impl Into<String>) -> OffsetResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(OffsetError::validation("Missing Cloverly API private key."));
        }
        Ok(Self(key))
    }

    /// Read the key from `ABSOLVE_PRIVATE_KEY`, ignoring empty values.
    pub fn from_env() -> Option<Self> {
        std::env::var(PRIVATE_KEY_ENV)
            .ok()
            .and_then(|key| Self::new(key).ok())
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer private_key:{}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
