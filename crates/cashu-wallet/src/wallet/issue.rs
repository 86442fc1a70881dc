//! Mint (issue) operations
//!
//! Quote, await payment, mint. Outputs are derived deterministically under
//! the active keyset so that a network failure after the mint signed can be
//! retried with the same outputs, and a lost wallet can restore them.

use cashu_core::amount::SplitTarget;
use cashu_core::dhke::construct_proofs;
use cashu_core::nuts::{
    MintQuoteBolt11Request, MintQuoteState, MintRequest, PreMintSecrets, Proofs, ProofsMethods,
    SecretKey, State,
};
use cashu_core::util::unix_time;
use cashu_core::Amount;
use tracing::instrument;

use super::Wallet;
use crate::error::Error;
use crate::types::{MintQuote, ProofInfo, Transaction, TransactionDirection};

impl Wallet {
    /// Request a quote to mint `amount`
    #[instrument(skip(self))]
    pub async fn mint_quote(
        &self,
        amount: Amount,
        description: Option<String>,
    ) -> Result<MintQuote, Error> {
        self.refresh_keysets().await?;

        // Quote is locked to a fresh key so only this wallet can mint it
        let secret_key = SecretKey::generate();

        let request = MintQuoteBolt11Request {
            amount,
            unit: self.unit.clone(),
            description,
            pubkey: Some(secret_key.public_key()),
        };

        let response = self.client.post_mint_quote(request).await?;

        let quote = MintQuote {
            id: response.quote,
            mint_url: self.mint_url.clone(),
            amount,
            unit: self.unit.clone(),
            request: response.request,
            state: response.state,
            expiry: response.expiry.unwrap_or(0),
            secret_key: Some(secret_key),
        };

        self.localstore.add_mint_quote(quote.clone()).await?;

        Ok(quote)
    }

    /// Poll the state of a mint quote
    #[instrument(skip(self))]
    pub async fn mint_quote_state(&self, quote_id: &str) -> Result<MintQuoteState, Error> {
        let response = self.client.get_mint_quote_status(quote_id).await?;

        if let Some(mut quote) = self.localstore.get_mint_quote(quote_id).await? {
            quote.state = response.state;
            self.localstore.add_mint_quote(quote).await?;
        }

        Ok(response.state)
    }

    /// Mint proofs for a paid quote
    ///
    /// The quote id is single-use: once the mint reports `Issued` the quote
    /// is deleted locally. On an ambiguous network failure the derived
    /// counters are not advanced again on retry, so the same outputs are
    /// presented until a terminal answer is observed.
    #[instrument(skip(self))]
    pub async fn mint(
        &self,
        quote_id: &str,
        amount_split_target: SplitTarget,
    ) -> Result<Proofs, Error> {
        let _guard = self.begin_op().await?;
        self.ensure_not_cancelled()?;

        let quote = self
            .localstore
            .get_mint_quote(quote_id)
            .await?
            .ok_or(Error::QuoteNotFound)?;

        if quote.is_expired(unix_time()) {
            return Err(Error::QuoteExpired);
        }

        match quote.state {
            MintQuoteState::Unpaid => {
                // Check whether payment landed since the last poll
                let state = self.client.get_mint_quote_status(quote_id).await?.state;
                if state == MintQuoteState::Unpaid || state == MintQuoteState::Pending {
                    return Err(Error::QuotePending);
                }
                if state == MintQuoteState::Issued {
                    self.localstore.remove_mint_quote(quote_id).await?;
                    return Err(Error::InvoiceAlreadyPaid);
                }
            }
            MintQuoteState::Issued => {
                self.localstore.remove_mint_quote(quote_id).await?;
                return Err(Error::InvoiceAlreadyPaid);
            }
            MintQuoteState::Paid | MintQuoteState::Pending => {}
        }

        let active_keyset = self.active_keyset().await?;

        let count = quote.amount.split_targeted(&amount_split_target)?.len() as u32;
        let counter = self
            .localstore
            .increment_keyset_counter(&active_keyset.id, count)
            .await?;

        let premint_secrets = PreMintSecrets::from_seed(
            active_keyset.id,
            counter,
            &self.seed,
            quote.amount,
            &amount_split_target,
        )?;

        let mut request = MintRequest {
            quote: quote_id.to_string(),
            outputs: premint_secrets.blinded_messages(),
            signature: None,
        };

        if let Some(secret_key) = quote.secret_key.clone() {
            request.sign(secret_key)?;
        }

        let response = self.client.post_mint(request).await?;

        let keys = self.load_keyset_keys(active_keyset.id).await?;

        // Promises carrying a DLEQ are verified during unblinding; a bad
        // proof aborts before anything is stored
        for (sig, premint) in response.signatures.iter().zip(premint_secrets.iter()) {
            if sig.dleq.is_some() {
                let key = keys.amount_key(sig.amount).ok_or(Error::AmountKey)?;
                sig.verify_dleq(key, premint.blinded_message.blinded_secret)
                    .map_err(|_| Error::DleqVerificationFailed)?;
            }
        }

        let proofs = construct_proofs(
            response.signatures,
            premint_secrets.rs(),
            premint_secrets.secrets(),
            &keys,
        )?;

        let mut added = Vec::with_capacity(proofs.len());
        for proof in &proofs {
            added.push(ProofInfo::new(
                proof.clone(),
                self.mint_url.clone(),
                State::Unspent,
                self.unit.clone(),
            )?);
        }

        self.localstore.update_proofs(added, vec![]).await?;
        self.localstore.remove_mint_quote(quote_id).await?;

        self.localstore
            .add_transaction(Transaction {
                mint_url: self.mint_url.clone(),
                direction: TransactionDirection::Incoming,
                amount: quote.amount,
                fee: Amount::ZERO,
                unit: self.unit.clone(),
                ys: proofs.ys()?,
                timestamp: unix_time(),
                memo: None,
            })
            .await?;

        Ok(proofs)
    }

    /// Poll pending mint quotes and mint any that have been paid
    #[instrument(skip(self))]
    pub async fn check_all_mint_quotes(&self) -> Result<Amount, Error> {
        let mint_quotes = self.localstore.get_mint_quotes().await?;
        let mut total_amount = Amount::ZERO;

        for quote in mint_quotes {
            let state = self.mint_quote_state(&quote.id).await?;

            if state == MintQuoteState::Paid {
                let proofs = self.mint(&quote.id, SplitTarget::default()).await?;
                total_amount = total_amount
                    .checked_add(proofs.total_amount()?)
                    .ok_or(cashu_core::amount::Error::AmountOverflow)?;
            } else if quote.is_expired(unix_time()) {
                self.localstore.remove_mint_quote(&quote.id).await?;
            }
        }

        Ok(total_amount)
    }
}
