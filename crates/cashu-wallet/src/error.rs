//! Wallet errors
//!
//! One enum for every failure the wallet can surface. Retryability is a
//! property of the kind, not of call-site logic; the networking layer asks
//! [`Error::is_retryable`] and the coordinator asks
//! [`Error::is_definitive_failure`] before rolling back pending proofs.

use std::fmt;

use cashu_core::nuts::Id;
use cashu_core::Amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Wallet Error
#[derive(Debug, Error)]
pub enum Error {
    // Cryptographic
    /// Point could not be decoded
    #[error("Invalid point")]
    InvalidPoint,
    /// Hash to curve gave up
    #[error("Hash to curve failed")]
    HashToCurveFailed,
    /// Blinding failed
    #[error("Blinding failed")]
    BlindingFailed,
    /// Unblinding failed
    #[error("Unblinding failed")]
    UnblindingFailed,
    /// DLEQ verification failed
    #[error("Could not verify DLEQ proof")]
    DleqVerificationFailed,
    /// Signature invalid
    #[error("Invalid signature")]
    InvalidSignature,
    /// Hex string invalid
    #[error("Invalid hex string")]
    InvalidHexString,
    /// Mnemonic invalid
    #[error("Invalid mnemonic")]
    InvalidMnemonic,

    // Network
    /// Generic network error
    #[error("Network error: {0}")]
    Network(String),
    /// Could not connect to the mint
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Mint is unreachable or down
    #[error("Mint unavailable")]
    MintUnavailable,
    /// Local rate limit exceeded
    #[error("Rate limited")]
    RateLimited,
    /// Circuit breaker is open
    #[error("Circuit open")]
    CircuitOpen,
    /// Operation timed out
    #[error("Operation timeout")]
    Timeout,
    /// Transient failure worth retrying
    #[error("Temporary failure: {0}")]
    TemporaryFailure(String),

    // Protocol / HTTP
    /// Mint error body (NUT-00 `{detail, code}`)
    #[error("Mint error {code}: {detail}")]
    Http {
        /// Machine readable error code
        code: u16,
        /// Human readable detail
        detail: String,
    },
    /// Unsupported protocol version
    #[error("Unsupported version")]
    UnsupportedVersion,
    /// Operation is not supported by this wallet
    #[error("Unsupported operation")]
    UnsupportedOperation,
    /// Capability is not advertised by the mint
    #[error("Mint does not support NUT-{nut_id}")]
    CapabilityNotSupported {
        /// The missing NUT
        nut_id: u8,
    },

    // Validation
    /// Token string could not be parsed
    #[error("Invalid token format")]
    InvalidTokenFormat,
    /// Token parsed but its contents are inconsistent
    #[error("Invalid token structure")]
    InvalidTokenStructure,
    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    /// Amount below mint minimum
    #[error("Amount too small")]
    AmountTooSmall,
    /// Amount above mint maximum
    #[error("Amount too large")]
    AmountTooLarge,
    /// Required field missing from a response
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    /// Keyset id does not match its keys
    #[error("Invalid keyset id: {0}")]
    InvalidKeysetId(Id),
    /// Keyset unknown
    #[error("Keyset not found: {0}")]
    KeysetNotFound(Id),
    /// Keyset can no longer sign
    #[error("Keyset inactive: {0}")]
    KeysetInactive(Id),
    /// Mint advertises no active keyset for the unit
    #[error("No active keyset")]
    NoActiveKeyset,
    /// Unit mismatch
    #[error("Invalid unit")]
    InvalidUnit,
    /// Amount is not a valid denomination
    #[error("Invalid denomination")]
    InvalidDenomination,
    /// Mint does not have a key for amount
    #[error("No key for amount")]
    AmountKey,

    // Wallet / state
    /// Wallet not initialized
    #[error("Wallet not initialized")]
    NotInitialized,
    /// Wallet already initialized
    #[error("Wallet already initialized")]
    AlreadyInitialized,
    /// Operation requires a seed
    #[error("Wallet was not initialized with a mnemonic")]
    NotInitializedWithMnemonic,
    /// Wallet is in the wrong state for the call
    #[error("Invalid wallet state: {0}")]
    InvalidWalletState(String),
    /// Not enough funds
    #[error("Insufficient balance: needed {needed}, available {available}")]
    BalanceInsufficient {
        /// Amount required
        needed: Amount,
        /// Amount available
        available: Amount,
    },
    /// No proofs can be selected
    #[error("No spendable proofs")]
    NoSpendableProofs,
    /// Proof set failed validation
    #[error("Invalid proof set")]
    InvalidProofSet,
    /// Proof was already spent at the mint
    #[error("Proof already spent")]
    ProofAlreadySpent,
    /// Proof not found in the store
    #[error("Proof not found")]
    ProofNotFound,
    /// State machine rejected the transition
    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Rejected event
        event: String,
    },
    /// Transaction id unknown
    #[error("Transaction not found")]
    TransactionNotFound,

    // Quote
    /// Quote not yet payable
    #[error("Quote pending")]
    QuotePending,
    /// Quote expired
    #[error("Quote expired")]
    QuoteExpired,
    /// Quote unknown to the mint
    #[error("Quote not found")]
    QuoteNotFound,
    /// Invoice expired
    #[error("Invoice expired")]
    InvoiceExpired,
    /// Invoice was already paid
    #[error("Invoice already paid")]
    InvoiceAlreadyPaid,
    /// Lightning payment failed
    #[error("Payment failed")]
    PaymentFailed,

    // HTLC / P2PK
    /// HTLC preimage does not match
    #[error("Invalid preimage")]
    InvalidPreimage,
    /// Locktime has not expired yet
    #[error("Locktime not expired")]
    LocktimeNotExpired,
    /// Proof kind does not match the expected spending condition
    #[error("Invalid proof type")]
    InvalidProofType,
    /// Witness missing or malformed
    #[error("Invalid witness")]
    InvalidWitness,

    // Storage
    /// Backing store failed
    #[error("Storage error: {0}")]
    Storage(String),
    /// Secure store has no data for the key
    #[error("No data in secure store")]
    NoKeychainData,

    /// Custom
    #[error("`{0}`")]
    Custom(String),

    // Conversions
    /// Core model error
    #[error(transparent)]
    Cashu(#[from] cashu_core::error::Error),
    /// Amount error
    #[error(transparent)]
    Amount(#[from] cashu_core::amount::Error),
    /// Secret error
    #[error(transparent)]
    Secret(#[from] cashu_core::secret::Error),
    /// Mint URL error
    #[error(transparent)]
    MintUrl(#[from] cashu_core::mint_url::Error),
    /// NUT00 error
    #[error(transparent)]
    NUT00(#[from] cashu_core::nuts::nut00::Error),
    /// NUT02 error
    #[error(transparent)]
    NUT02(#[from] cashu_core::nuts::nut02::Error),
    /// NUT04 error
    #[error(transparent)]
    NUT04(#[from] cashu_core::nuts::nut04::Error),
    /// NUT11 error
    #[error(transparent)]
    NUT11(#[from] cashu_core::nuts::nut11::Error),
    /// NUT12 error
    #[error(transparent)]
    NUT12(#[from] cashu_core::nuts::nut12::Error),
    /// NUT13 error
    #[error(transparent)]
    NUT13(#[from] cashu_core::nuts::nut13::Error),
    /// NUT14 error
    #[error(transparent)]
    NUT14(#[from] cashu_core::nuts::nut14::Error),
    /// NUT20 error
    #[error(transparent)]
    NUT20(#[from] cashu_core::nuts::nut20::Error),
    /// Bip32 error
    #[error(transparent)]
    Bip32(#[from] bitcoin::bip32::Error),
    /// Bip39 error
    #[error(transparent)]
    Bip39(#[from] bip39::Error),
    /// Invoice parse error
    #[error(transparent)]
    Invoice(#[from] lightning_invoice::ParseOrSemanticError),
    /// Serde Json error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// Url parse error
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether the networking layer may retry the request that produced this
    /// error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::ConnectionFailed(_)
            | Self::MintUnavailable
            | Self::Timeout
            | Self::TemporaryFailure(_) => true,
            // 408 and 429 plus server errors retry, other statuses are final
            Self::Http { code, .. } => {
                matches!(code, 408 | 429) || (500..=599).contains(code)
            }
            _ => false,
        }
    }

    /// Whether the mint definitely rejected the request without updating its
    /// state. Only then is it safe to roll pending proofs back; on ambiguous
    /// failures they stay pending until reconciled via checkstate.
    pub fn is_definitive_failure(&self) -> bool {
        match self {
            Self::Http { code, .. } => (400..500).contains(code),
            Self::Network(_)
            | Self::ConnectionFailed(_)
            | Self::MintUnavailable
            | Self::RateLimited
            | Self::CircuitOpen
            | Self::Timeout
            | Self::TemporaryFailure(_)
            | Self::Storage(_) => false,
            _ => true,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::ConnectionFailed(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

/// Error body returned by the mint (NUT-00)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine readable error code
    #[serde(default)]
    pub code: u16,
    /// Human readable description
    #[serde(default)]
    pub detail: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {}, detail: {}", self.code, self.detail)
    }
}

impl ErrorResponse {
    /// Decode an error response from a json [`Value`], falling back to the
    /// raw body when it does not match the NUT-00 shape
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<ErrorResponse>(value.clone()) {
            Ok(res) => res,
            Err(_) => Self {
                code: 0,
                detail: value.to_string(),
            },
        }
    }
}

impl From<ErrorResponse> for Error {
    fn from(err: ErrorResponse) -> Error {
        // Cashu error codes that deserve their own kind
        match err.code {
            11001 => Error::ProofAlreadySpent,
            20001 | 20005 => Error::QuotePending,
            20004 => Error::PaymentFailed,
            _ => Error::Http {
                code: err.code,
                detail: err.detail,
            },
        }
    }
}
