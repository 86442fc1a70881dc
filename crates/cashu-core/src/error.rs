//! Errors for protocol models and crypto

use thiserror::Error;

/// Core error
#[derive(Debug, Error)]
pub enum Error {
    /// No valid point could be found on the curve
    #[error("No valid point on curve")]
    HashToCurveFailed,
    /// Not a valid compressed secp256k1 point
    #[error("Invalid point")]
    InvalidPoint,
    /// Blinding the message failed
    #[error("Blinding failed")]
    BlindingFailed,
    /// Unblinding the signature failed
    #[error("Unblinding failed")]
    UnblindingFailed,
    /// DLEQ proof did not verify
    #[error("DLEQ verification failed")]
    DleqVerificationFailed,
    /// Unblinded message did not verify against the key
    #[error("Token not verified")]
    TokenNotVerified,
    /// Mint does not have a key for the amount
    #[error("No key for amount")]
    AmountKey,
    /// Secp256k1 error
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
    /// Hex error
    #[error(transparent)]
    Hex(#[from] crate::util::hex::Error),
    /// Custom error
    #[error("`{0}`")]
    Custom(String),
}
