//! Receive
//!
//! Parse a token and swap its proofs for wallet-owned ones. Foreign proofs
//! are never trusted as balance; only the swapped outputs count.

use std::str::FromStr;

use cashu_core::amount::SplitTarget;
use cashu_core::dhke::construct_proofs;
use cashu_core::nuts::{
    Kind, PreMintSecrets, Proofs, ProofsMethods, SecretKey, State, SwapRequest, Token,
};
use cashu_core::util::unix_time;
use cashu_core::Amount;
use tracing::instrument;

use super::Wallet;
use crate::error::Error;
use crate::fees::calculate_fee;
use crate::types::{ProofInfo, Transaction, TransactionDirection};

/// Keys and preimages a receiver may need to unlock P2PK or HTLC tokens
#[derive(Debug, Clone, Default)]
pub struct ReceiveOptions {
    /// Keys to sign P2PK-locked proofs with
    pub p2pk_signing_keys: Vec<SecretKey>,
    /// Preimages for HTLC-locked proofs
    pub preimages: Vec<String>,
}

impl Wallet {
    /// Receive a serialized token
    #[instrument(skip_all)]
    pub async fn receive(
        &self,
        token_str: &str,
        options: ReceiveOptions,
    ) -> Result<Amount, Error> {
        let token = Token::from_str(token_str).map_err(|_| Error::InvalidTokenFormat)?;

        self.receive_token(&token, options).await
    }

    /// Receive an already parsed token
    #[instrument(skip_all)]
    pub async fn receive_token(
        &self,
        token: &Token,
        options: ReceiveOptions,
    ) -> Result<Amount, Error> {
        let _guard = self.begin_op().await?;
        self.ensure_not_cancelled()?;

        let token_mint = token.mint_url().map_err(|_| Error::InvalidTokenStructure)?;
        if token_mint != self.mint_url {
            return Err(Error::ValidationFailed(format!(
                "Token is for mint {token_mint}, wallet uses {}",
                self.mint_url
            )));
        }

        if let Some(unit) = token.unit() {
            if unit != self.unit {
                return Err(Error::InvalidUnit);
            }
        }

        let mut proofs = token.proofs();
        if proofs.is_empty() {
            return Err(Error::InvalidTokenStructure);
        }

        // Unlock spending conditions where we can
        for proof in proofs.iter_mut() {
            if let Some(conditions) = proof.spending_conditions() {
                match conditions.kind() {
                    Kind::P2PK => {
                        for key in &options.p2pk_signing_keys {
                            proof.sign_p2pk(key.clone())?;
                        }
                    }
                    Kind::HTLC => {
                        let preimage = options
                            .preimages
                            .first()
                            .cloned()
                            .ok_or(Error::InvalidPreimage)?;
                        proof.add_preimage(preimage);
                    }
                }
            }
        }

        self.refresh_keysets().await?;
        let active_keyset = self.active_keyset().await?;
        let fees = self.keyset_fees().await?;

        let input_total = proofs.total_amount()?;
        let fee = calculate_fee(&proofs.count_by_keyset(), &fees)?;
        let output_total = input_total.checked_sub(fee).ok_or(Error::AmountTooSmall)?;

        let count = output_total.split_targeted(&SplitTarget::None)?.len() as u32;
        let counter = self
            .localstore
            .increment_keyset_counter(&active_keyset.id, count)
            .await?;
        let premints = PreMintSecrets::from_seed(
            active_keyset.id,
            counter,
            &self.seed,
            output_total,
            &SplitTarget::None,
        )?;

        let request = SwapRequest::new(proofs, premints.blinded_messages());

        let response = self.client.post_swap(request).await?;

        let keys = self.load_keyset_keys(active_keyset.id).await?;
        let new_proofs: Proofs =
            construct_proofs(response.signatures, premints.rs(), premints.secrets(), &keys)?;

        let received = new_proofs.total_amount()?;

        let mut added = Vec::with_capacity(new_proofs.len());
        for proof in &new_proofs {
            added.push(ProofInfo::new(
                proof.clone(),
                self.mint_url.clone(),
                State::Unspent,
                self.unit.clone(),
            )?);
        }

        self.localstore.update_proofs(added, vec![]).await?;

        self.localstore
            .add_transaction(Transaction {
                mint_url: self.mint_url.clone(),
                direction: TransactionDirection::Incoming,
                amount: received,
                fee,
                unit: self.unit.clone(),
                ys: new_proofs.ys()?,
                timestamp: unix_time(),
                memo: token.memo().clone(),
            })
            .await?;

        Ok(received)
    }
}
