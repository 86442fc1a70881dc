//! Wallet types

use cashu_core::nuts::{
    CurrencyUnit, MeltQuoteState, MintQuoteState, Proof, Proofs, ProofsMethods, PublicKey,
    SecretKey, SpendingConditions, State,
};
use cashu_core::{Amount, MintUrl};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A proof with the bookkeeping the wallet tracks alongside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInfo {
    /// Proof
    pub proof: Proof,
    /// y = hash_to_curve(secret)
    pub y: PublicKey,
    /// Mint Url
    pub mint_url: MintUrl,
    /// Lifecycle state
    pub state: State,
    /// Spending conditions, when the secret is a NUT-10 secret
    pub spending_condition: Option<SpendingConditions>,
    /// Unit
    pub unit: CurrencyUnit,
}

impl ProofInfo {
    /// Create new [`ProofInfo`]
    pub fn new(
        proof: Proof,
        mint_url: MintUrl,
        state: State,
        unit: CurrencyUnit,
    ) -> Result<Self, Error> {
        let y = proof.y()?;

        let spending_condition: Option<SpendingConditions> = (&proof.secret).try_into().ok();

        Ok(Self {
            proof,
            y,
            mint_url,
            state,
            spending_condition,
            unit,
        })
    }

    /// Check if the proof matches the given filters
    pub fn matches_conditions(
        &self,
        mint_url: &Option<MintUrl>,
        unit: &Option<CurrencyUnit>,
        state: &Option<Vec<State>>,
    ) -> bool {
        if let Some(mint_url) = mint_url {
            if mint_url.ne(&self.mint_url) {
                return false;
            }
        }

        if let Some(unit) = unit {
            if unit.ne(&self.unit) {
                return false;
            }
        }

        if let Some(state) = state {
            if !state.contains(&self.state) {
                return false;
            }
        }

        true
    }
}

/// Mint quote tracked by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuote {
    /// Quote id
    pub id: String,
    /// Mint Url
    pub mint_url: MintUrl,
    /// Amount of quote
    pub amount: Amount,
    /// Unit of quote
    pub unit: CurrencyUnit,
    /// Payment request to fulfil
    pub request: String,
    /// Quote state
    pub state: MintQuoteState,
    /// Expiration time of quote
    pub expiry: u64,
    /// Secret key the quote is locked to [NUT-20]
    pub secret_key: Option<SecretKey>,
}

impl MintQuote {
    /// Check if the quote has expired. An expiry of zero means the mint gave
    /// none.
    pub fn is_expired(&self, current_time: u64) -> bool {
        self.expiry != 0 && current_time > self.expiry
    }
}

/// Melt quote tracked by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuote {
    /// Quote id
    pub id: String,
    /// Quote unit
    pub unit: CurrencyUnit,
    /// Quote amount
    pub amount: Amount,
    /// Payment request to pay
    pub request: String,
    /// Quote fee reserve
    pub fee_reserve: Amount,
    /// Quote state
    pub state: MeltQuoteState,
    /// Expiration time of quote
    pub expiry: u64,
    /// Payment preimage once paid
    pub payment_preimage: Option<String>,
}

/// Result of a completed melt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Melted {
    /// Terminal state of the quote
    pub state: MeltQuoteState,
    /// Preimage of the settled payment
    pub preimage: Option<String>,
    /// Change proofs from the NUT-08 fee return
    pub change: Option<Proofs>,
    /// Amount melted
    pub amount: Amount,
    /// Fee paid, after the fee return
    pub fee_paid: Amount,
}

impl Melted {
    /// Create [`Melted`] from the inputs spent and the change returned
    pub fn from_proofs(
        state: MeltQuoteState,
        preimage: Option<String>,
        quote_amount: Amount,
        proofs: Proofs,
        change_proofs: Option<Proofs>,
    ) -> Result<Self, Error> {
        let proofs_amount = proofs.total_amount()?;
        let change_amount = match &change_proofs {
            Some(change_proofs) => change_proofs.total_amount()?,
            None => Amount::ZERO,
        };

        let fee_paid = proofs_amount
            .checked_sub(
                quote_amount
                    .checked_add(change_amount)
                    .ok_or(cashu_core::amount::Error::AmountOverflow)?,
            )
            .ok_or(cashu_core::amount::Error::AmountOverflow)?;

        Ok(Self {
            state,
            preimage,
            change: change_proofs,
            amount: quote_amount,
            fee_paid,
        })
    }

    /// Total amount deducted from the wallet
    pub fn total_amount(&self) -> Amount {
        self.amount
            .checked_add(self.fee_paid)
            .expect("fee is validated when calculated")
    }
}

/// Direction of a recorded transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    /// Funds entered the wallet: mint, receive
    Incoming,
    /// Funds left the wallet: melt, send
    Outgoing,
}

/// Entry in the optional wallet history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Mint Url
    pub mint_url: MintUrl,
    /// Direction
    pub direction: TransactionDirection,
    /// Amount moved
    pub amount: Amount,
    /// Fee paid
    pub fee: Amount,
    /// Unit
    pub unit: CurrencyUnit,
    /// Ys of the proofs involved
    pub ys: Vec<PublicKey>,
    /// Unix timestamp
    pub timestamp: u64,
    /// Optional memo
    pub memo: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use cashu_core::nuts::Id;
    use cashu_core::secret::Secret;

    use super::*;

    fn test_proof(amount: u64) -> Proof {
        Proof::new(
            Amount::from(amount),
            Id::from_str("009a1f293253e41e").unwrap(),
            Secret::generate(),
            PublicKey::from_hex(
                "02bc9097997d81afb2cc7346b5e4345a9346bd2a506eb7958598a72f0cf85163ea",
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_melted_fee_paid() {
        let melted = Melted::from_proofs(
            MeltQuoteState::Paid,
            Some("preimage".to_string()),
            Amount::from(64),
            vec![test_proof(64)],
            None,
        )
        .unwrap();

        assert_eq!(melted.amount, Amount::from(64));
        assert_eq!(melted.fee_paid, Amount::ZERO);
        assert_eq!(melted.total_amount(), Amount::from(64));
    }

    #[test]
    fn test_melted_with_change() {
        let melted = Melted::from_proofs(
            MeltQuoteState::Paid,
            Some("preimage".to_string()),
            Amount::from(31),
            vec![test_proof(64)],
            Some(vec![test_proof(32)]),
        )
        .unwrap();

        assert_eq!(melted.amount, Amount::from(31));
        assert_eq!(melted.fee_paid, Amount::from(1));
        assert_eq!(melted.total_amount(), Amount::from(32));
    }

    #[test]
    fn test_matches_conditions() {
        let mint_url = MintUrl::from_str("https://example.com").unwrap();
        let proof_info = ProofInfo::new(
            test_proof(64),
            mint_url.clone(),
            State::Unspent,
            CurrencyUnit::Sat,
        )
        .unwrap();

        assert!(proof_info.matches_conditions(&Some(mint_url.clone()), &None, &None));
        assert!(!proof_info.matches_conditions(
            &Some(MintUrl::from_str("https://different.com").unwrap()),
            &None,
            &None
        ));

        assert!(proof_info.matches_conditions(&None, &Some(CurrencyUnit::Sat), &None));
        assert!(!proof_info.matches_conditions(&None, &Some(CurrencyUnit::Msat), &None));

        assert!(proof_info.matches_conditions(&None, &None, &Some(vec![State::Unspent])));
        assert!(!proof_info.matches_conditions(&None, &None, &Some(vec![State::Spent])));

        assert!(proof_info.matches_conditions(&None, &None, &None));
    }
}
