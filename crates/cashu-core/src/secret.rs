//! Secrets
//!
//! The secret string committed to by a proof. Either a random 32-byte nonce
//! (hex encoded) or a NUT-10 well-known secret JSON array.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::hex;

/// Secret errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid length
    #[error("Invalid secret length: `{0}`")]
    InvalidLength(u64),
    /// Hex Error
    #[error(transparent)]
    Hex(#[from] hex::Error),
    /// Serde Json error
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

/// The secret data that allows spending ecash
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create new [`Secret`]
    pub fn new<S>(secret: S) -> Self
    where
        S: Into<String>,
    {
        Self(secret.into())
    }

    /// Generate a random [`Secret`]: 32 bytes of entropy, hex encoded
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut random_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        Self(hex::encode(random_bytes))
    }

    /// [`Secret`] as str
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// [`Secret`] as bytes (the UTF-8 encoding of the secret string)
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// [`Secret`] to bytes
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.clone().into_bytes()
    }

    /// Check if secret is a NUT-10 well-known secret
    pub fn is_spending_conditions(&self) -> bool {
        serde_json::from_str::<crate::nuts::nut10::Secret>(&self.0).is_ok()
    }
}

impl FromStr for Secret {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Secret> for crate::nuts::nut10::Secret {
    type Error = Error;

    fn try_from(unchecked_secret: Secret) -> Result<crate::nuts::nut10::Secret, Self::Error> {
        Ok(serde_json::from_str(&unchecked_secret.0)?)
    }
}

impl TryFrom<&Secret> for crate::nuts::nut10::Secret {
    type Error = Error;

    fn try_from(unchecked_secret: &Secret) -> Result<crate::nuts::nut10::Secret, Self::Error> {
        Ok(serde_json::from_str(&unchecked_secret.0)?)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn generate_secret_length() {
        let secret = Secret::generate();

        // 32 bytes of entropy as 64 hex chars
        assert_eq!(secret.as_str().len(), 64);
        assert!(hex::decode(secret.as_str()).is_ok());
    }

    #[test]
    fn secrets_are_unique() {
        let a = Secret::generate();
        let b = Secret::generate();

        assert_ne!(a, b);
    }

    #[test]
    fn parse_plain_secret() {
        let secret_str = "407915bc212be61a77e3e6d2aeb4c727980bda51cd06a6afc29e2861768a7837";
        let secret = Secret::from_str(secret_str).unwrap();

        assert_eq!(secret.as_str(), secret_str);
        assert!(!secret.is_spending_conditions());
    }
}
