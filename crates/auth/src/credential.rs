use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque bearer token identifying an authenticated session.
///
/// The token is never interpreted client-side. `Debug` is redacted so a
/// credential can sit inside logged structures without leaking.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Credential(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential is empty")]
    Empty,

    #[error("credential contains whitespace")]
    Whitespace,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialError> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        if token.chars().any(char::is_whitespace) {
            return Err(CredentialError::Whitespace);
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl TryFrom<String> for Credential {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Credential> for String {
    fn from(value: Credential) -> Self {
        value.0
    }
}
