//! NUT-05: Melting Tokens
//!
//! <https://github.com/cashubtc/nuts/blob/main/05.md>

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::nut00::{BlindSignature, BlindedMessage, CurrencyUnit, PaymentMethod, Proofs};
use super::nut15::Mpp;
use crate::{Amount, Bolt11Invoice};

/// NUT05 Error
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown Quote State
    #[error("Unknown quote state")]
    UnknownState,
    /// Amount overflow
    #[error("Amount overflow")]
    AmountOverflow,
}

/// Melt quote request [NUT-05]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuoteBolt11Request {
    /// Bolt11 invoice to be paid
    pub request: Bolt11Invoice,
    /// Unit wallet would like to pay with
    pub unit: CurrencyUnit,
    /// Payment options: multi-path amount [NUT-15]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<MeltOptions>,
}

/// Melt quote options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeltOptions {
    /// Multi-path payment option
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpp: Option<Mpp>,
}

impl MeltOptions {
    /// MPP options for a partial amount in msat
    pub fn new_mpp<A>(amount_msat: A) -> Self
    where
        A: Into<Amount>,
    {
        Self {
            mpp: Some(Mpp {
                amount: amount_msat.into(),
            }),
        }
    }
}

/// Possible states of a melt quote
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteState {
    /// Quote has not been paid
    #[default]
    Unpaid,
    /// Paying is in progress
    Pending,
    /// Lightning payment succeeded
    Paid,
    /// Quote is unknown to the mint
    Unknown,
    /// Payment failed
    Failed,
}

impl fmt::Display for QuoteState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unpaid => write!(f, "UNPAID"),
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for QuoteState {
    type Err = Error;

    fn from_str(state: &str) -> Result<Self, Self::Err> {
        match state {
            "UNPAID" => Ok(Self::Unpaid),
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "UNKNOWN" => Ok(Self::Unknown),
            "FAILED" => Ok(Self::Failed),
            _ => Err(Error::UnknownState),
        }
    }
}

/// Melt quote response [NUT-05]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuoteBolt11Response {
    /// Quote Id
    pub quote: String,
    /// The amount that needs to be provided
    pub amount: Amount,
    /// The fee reserve that is required
    pub fee_reserve: Amount,
    /// Quote state
    pub state: QuoteState,
    /// Unix timestamp until the quote is valid
    pub expiry: u64,
    /// Bolt11 payment preimage, once paid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_preimage: Option<String>,
    /// Change [NUT-08]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Vec<BlindSignature>>,
}

impl MeltQuoteBolt11Response {
    /// Total amount of change returned by the mint
    pub fn change_amount(&self) -> Result<Amount, Error> {
        match &self.change {
            Some(change) => Amount::try_sum(change.iter().map(|b| b.amount))
                .map_err(|_| Error::AmountOverflow),
            None => Ok(Amount::ZERO),
        }
    }
}

/// Melt request [NUT-05]
///
/// Carries NUT-08 blank outputs for fee return when `outputs` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltBolt11Request {
    /// Quote ID
    pub quote: String,
    /// Proofs
    pub inputs: Proofs,
    /// Blinded messages for change [NUT-08]
    ///
    /// Amount field of the blinded messages `SHOULD` be set to zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<BlindedMessage>>,
}

impl MeltBolt11Request {
    /// Total [`Amount`] of proofs
    pub fn proofs_amount(&self) -> Result<Amount, Error> {
        Amount::try_sum(self.inputs.iter().map(|proof| proof.amount))
            .map_err(|_| Error::AmountOverflow)
    }
}

/// Melt method settings
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeltMethodSettings {
    /// Payment Method e.g. bolt11
    pub method: PaymentMethod,
    /// Currency Unit e.g. sat
    pub unit: CurrencyUnit,
    /// Min Amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<Amount>,
    /// Max Amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Amount>,
}

/// Melt Settings
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settings {
    /// Methods to melt
    pub methods: Vec<MeltMethodSettings>,
    /// Melting disabled
    pub disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_melt_quote_response_deserialize() {
        let json = r#"{"quote":"m-1","amount":1024,"fee_reserve":256,"state":"UNPAID","expiry":1701704757}"#;
        let response: MeltQuoteBolt11Response = serde_json::from_str(json).unwrap();

        assert_eq!(response.amount, Amount::from(1024));
        assert_eq!(response.fee_reserve, Amount::from(256));
        assert_eq!(response.state, QuoteState::Unpaid);
        assert!(response.change.is_none());
    }

    #[test]
    fn test_mpp_option_serialization() {
        let options = MeltOptions::new_mpp(Amount::from(50000));

        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"mpp":{"amount":50000}}"#);

        let parsed: MeltOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }
}
