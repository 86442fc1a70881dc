//! NUT-22: Access tokens
//!
//! <https://github.com/cashubtc/nuts/blob/main/22.md>
//!
//! Mints may gate endpoints behind a bearer token plus a supply of single-use
//! access-token proofs. The wallet keeps a pool of signed access proofs and
//! spends one per protected request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::nut00::{BlindSignature, BlindedMessage};
use super::nut01::PublicKey;
use super::nut02::Id;
use crate::dhke::hash_to_curve;
use crate::secret::Secret;

/// NUT22 Error
#[derive(Debug, Error)]
pub enum Error {
    /// DLEQ proof not included
    #[error("DLEQ proof not included for access proof")]
    DleqProofNotIncluded,
    /// Core error
    #[error(transparent)]
    Core(#[from] crate::error::Error),
}

/// Access token settings advertised in mint info
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Whether access tokens are required
    #[serde(default)]
    pub mandatory: bool,
    /// Max number of access-token proofs that can be requested at once
    #[serde(default)]
    pub bat_max_mint: u64,
    /// Endpoints behind the access-token requirement
    #[serde(default)]
    pub protected_endpoints: Vec<ProtectedEndpoint>,
}

/// An endpoint behind the access-token requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtectedEndpoint {
    /// HTTP method
    pub method: String,
    /// Endpoint path
    pub path: String,
}

/// A single-use access proof
///
/// Same shape as an ecash proof but redeemable only as an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessProof {
    /// `Keyset id` of the auth keyset
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Secret message
    pub secret: Secret,
    /// Unblinded signature
    #[serde(rename = "C")]
    pub c: PublicKey,
}

impl AccessProof {
    /// Y of the access proof
    pub fn y(&self) -> Result<PublicKey, Error> {
        Ok(hash_to_curve(self.secret.as_bytes())?)
    }
}

/// Request for a batch of access-token proofs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    /// Outputs to be signed by the auth keyset
    pub outputs: Vec<BlindedMessage>,
}

/// Response carrying signed access-token promises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    /// Blind signatures
    pub signatures: Vec<BlindSignature>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(!settings.mandatory);
        assert_eq!(settings.bat_max_mint, 0);
        assert!(settings.protected_endpoints.is_empty());
    }

    #[test]
    fn test_settings_deserialization() {
        let json = r#"{
            "mandatory": true,
            "bat_max_mint": 50,
            "protected_endpoints": [
                {"method": "POST", "path": "/v1/swap"},
                {"method": "POST", "path": "/v1/mint/bolt11"}
            ]
        }"#;

        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.mandatory);
        assert_eq!(settings.bat_max_mint, 50);
        assert_eq!(settings.protected_endpoints.len(), 2);
    }
}
