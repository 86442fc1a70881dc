//! Melt
//!
//! Redeem proofs to pay a Lightning invoice. Inputs covering
//! `amount + fee_reserve` go pending before the call; blank outputs ride
//! along so the unused part of the fee reserve comes back as change (NUT-08).
//! A payment that cannot be confirmed failed keeps its inputs pending until a
//! terminal quote state is observed.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use cashu_core::dhke::construct_proofs;
use cashu_core::nuts::{
    MeltBolt11Request, MeltOptions, MeltQuoteBolt11Request, MeltQuoteState, PreMintSecrets,
    Proofs, ProofsMethods, State,
};
use cashu_core::util::unix_time;
use cashu_core::{Amount, Bolt11Invoice};
use tracing::instrument;

use super::Wallet;
use crate::error::Error;
use crate::types::{MeltQuote, Melted, ProofInfo, Transaction, TransactionDirection};

/// How often and how long an unsettled melt is polled before the operation
/// detaches and leaves its inputs pending
const MELT_POLL_ATTEMPTS: u32 = 10;
const MELT_POLL_INTERVAL: Duration = Duration::from_secs(3);

impl Wallet {
    /// Request a quote to pay `request`
    #[instrument(skip(self, request))]
    pub async fn melt_quote(
        &self,
        request: String,
        options: Option<MeltOptions>,
    ) -> Result<MeltQuote, Error> {
        let invoice = Bolt11Invoice::from_str(&request)?;

        if options.is_some() {
            // Partial payments need NUT-15 support on the mint side
            let info = self.client.get_mint_info().await?;
            if !info.supports_mpp(&cashu_core::nuts::PaymentMethod::Bolt11, &self.unit) {
                return Err(Error::CapabilityNotSupported { nut_id: 15 });
            }
        }

        let quote_request = MeltQuoteBolt11Request {
            request: invoice,
            unit: self.unit.clone(),
            options,
        };

        let response = self.client.post_melt_quote(quote_request).await?;

        let quote = MeltQuote {
            id: response.quote,
            unit: self.unit.clone(),
            amount: response.amount,
            request,
            fee_reserve: response.fee_reserve,
            state: response.state,
            expiry: response.expiry,
            payment_preimage: response.payment_preimage,
        };

        self.localstore.add_melt_quote(quote.clone()).await?;

        Ok(quote)
    }

    /// Poll the state of a melt quote
    #[instrument(skip(self))]
    pub async fn melt_quote_state(&self, quote_id: &str) -> Result<MeltQuoteState, Error> {
        let response = self.client.get_melt_quote_status(quote_id).await?;

        if let Some(mut quote) = self.localstore.get_melt_quote(quote_id).await? {
            quote.state = response.state;
            quote.payment_preimage = response.payment_preimage.clone();
            self.localstore.add_melt_quote(quote).await?;
        }

        Ok(response.state)
    }

    /// Pay the invoice of a previously quoted melt
    #[instrument(skip(self))]
    pub async fn melt(&self, quote_id: &str) -> Result<Melted, Error> {
        let _guard = self.begin_op().await?;
        self.ensure_not_cancelled()?;

        let quote = self
            .localstore
            .get_melt_quote(quote_id)
            .await?
            .ok_or(Error::QuoteNotFound)?;

        if quote.expiry != 0 && quote.expiry < unix_time() {
            return Err(Error::QuoteExpired);
        }

        let needed = quote
            .amount
            .checked_add(quote.fee_reserve)
            .ok_or(cashu_core::amount::Error::AmountOverflow)?;

        // Inputs must cover exactly amount + fee_reserve; anything beyond the
        // reserve would be kept by the mint, so a preparatory swap makes
        // change first
        let available = self.get_unspent_proofs().await?;
        let selected = super::proofs::select_proofs(available, needed)?;
        let selected_total = Amount::try_sum(selected.iter().map(|p| p.proof.amount))?;

        let selected_ys: Vec<_> = selected.iter().map(|p| p.y).collect();
        self.localstore
            .update_proofs_state(selected_ys, State::Pending)
            .await?;

        let inputs: Vec<ProofInfo> = if selected_total == needed {
            selected
        } else {
            let exact = self
                .swap_proofs(selected, Some(needed), cashu_core::amount::SplitTarget::None, None)
                .await?;

            let ys = exact.ys()?;
            self.localstore
                .update_proofs_state(ys.clone(), State::Pending)
                .await?;
            self.localstore.get_proofs_by_ys(&ys).await?
        };

        let input_proofs: Proofs = inputs.iter().map(|p| p.proof.clone()).collect();

        // Blank outputs for the fee return; the mint assigns the amounts
        let active_keyset = self.active_keyset().await?;
        let blank_count = PreMintSecrets::blank(active_keyset.id, quote.fee_reserve)?.len() as u32;
        let counter = self
            .localstore
            .increment_keyset_counter(&active_keyset.id, blank_count)
            .await?;
        let blank_premints = PreMintSecrets::from_seed_blank(
            active_keyset.id,
            counter,
            &self.seed,
            quote.fee_reserve,
        )?;

        let request = MeltBolt11Request {
            quote: quote_id.to_string(),
            inputs: input_proofs.clone(),
            outputs: Some(blank_premints.blinded_messages()),
        };

        let response = match self.client.post_melt(request).await {
            Ok(response) => response,
            Err(err) if err.is_definitive_failure() => {
                self.handle_spend_failure(&inputs, &err).await?;
                return Err(err);
            }
            Err(err) => {
                // Outcome unknown: the payment may still settle. Keep inputs
                // pending and poll the quote to a terminal state.
                tracing::warn!("Melt response lost, polling quote {quote_id}: {err}");
                return self
                    .poll_melt_to_terminal(quote_id, &quote, inputs, input_proofs, blank_premints)
                    .await;
            }
        };

        if response.state == MeltQuoteState::Pending {
            return self
                .poll_melt_to_terminal(quote_id, &quote, inputs, input_proofs, blank_premints)
                .await;
        }

        self.settle_melt(
            &quote,
            inputs,
            input_proofs,
            blank_premints,
            response.state,
            response.payment_preimage,
            response.change,
        )
        .await
    }

    /// Apply a terminal melt response to the store
    #[allow(clippy::too_many_arguments)]
    async fn settle_melt(
        &self,
        quote: &MeltQuote,
        inputs: Vec<ProofInfo>,
        input_proofs: Proofs,
        blank_premints: PreMintSecrets,
        state: MeltQuoteState,
        payment_preimage: Option<String>,
        change: Option<Vec<cashu_core::nuts::BlindSignature>>,
    ) -> Result<Melted, Error> {
        match state {
            MeltQuoteState::Paid => {
                let change_proofs = match change {
                    Some(signatures) if !signatures.is_empty() => {
                        let keys = self.load_keyset_keys(blank_premints.keyset_id).await?;

                        // The mint signs as many blanks as the change needs;
                        // pair them up in order
                        let count = signatures.len();
                        let proofs = construct_proofs(
                            signatures,
                            blank_premints.rs()[..count].to_vec(),
                            blank_premints.secrets()[..count].to_vec(),
                            &keys,
                        )?;
                        Some(proofs)
                    }
                    _ => None,
                };

                let mut added = Vec::new();
                if let Some(change_proofs) = &change_proofs {
                    for proof in change_proofs {
                        added.push(ProofInfo::new(
                            proof.clone(),
                            self.mint_url.clone(),
                            State::Unspent,
                            self.unit.clone(),
                        )?);
                    }
                }

                let spent_ys = inputs.iter().map(|p| p.y).collect();
                self.localstore.update_proofs(added, spent_ys).await?;
                self.localstore.remove_melt_quote(&quote.id).await?;

                let melted = Melted::from_proofs(
                    state,
                    payment_preimage,
                    quote.amount,
                    input_proofs,
                    change_proofs,
                )?;

                self.localstore
                    .add_transaction(Transaction {
                        mint_url: self.mint_url.clone(),
                        direction: TransactionDirection::Outgoing,
                        amount: melted.amount,
                        fee: melted.fee_paid,
                        unit: self.unit.clone(),
                        ys: inputs.iter().map(|p| p.y).collect(),
                        timestamp: unix_time(),
                        memo: None,
                    })
                    .await?;

                Ok(melted)
            }
            MeltQuoteState::Unpaid | MeltQuoteState::Failed => {
                self.rollback_proofs(&inputs).await?;
                Err(Error::PaymentFailed)
            }
            MeltQuoteState::Unknown => {
                self.rollback_proofs(&inputs).await?;
                Err(Error::QuoteNotFound)
            }
            // Callers resolve pending states through the polling loop before
            // settling; inputs stay pending if this is ever hit
            MeltQuoteState::Pending => Err(Error::QuotePending),
        }
    }

    /// Poll a melt quote until it reaches a terminal state, then settle.
    /// Gives up after a bounded number of attempts, leaving inputs pending
    /// for the next reconciliation.
    async fn poll_melt_to_terminal(
        &self,
        quote_id: &str,
        quote: &MeltQuote,
        inputs: Vec<ProofInfo>,
        input_proofs: Proofs,
        blank_premints: PreMintSecrets,
    ) -> Result<Melted, Error> {
        for _ in 0..MELT_POLL_ATTEMPTS {
            tokio::time::sleep(MELT_POLL_INTERVAL).await;

            let response = match self.client.get_melt_quote_status(quote_id).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::debug!("Melt poll failed: {err}");
                    continue;
                }
            };

            match response.state {
                MeltQuoteState::Pending => continue,
                state => {
                    return self
                        .settle_melt(
                            quote,
                            inputs,
                            input_proofs,
                            blank_premints,
                            state,
                            response.payment_preimage,
                            response.change,
                        )
                        .await;
                }
            }
        }

        tracing::warn!("Melt quote {quote_id} still pending; inputs stay pending");
        Err(Error::QuotePending)
    }
}

/// One partial payment of a multi-path melt
#[derive(Debug, Clone)]
pub struct MeltPlan {
    /// Wallet that pays this part
    pub wallet: Arc<Wallet>,
    /// Partial amount in msat, carried in the quote's MPP option
    pub amount_msat: Amount,
}

/// Pay one invoice across several mints with NUT-15 partial payments.
///
/// Every plan's inputs go pending, all parts run in parallel and the
/// combined outcome is surfaced. Parts are atomic per wallet: a successful
/// part keeps its change, a failed part is rolled back by its own wallet's
/// melt path. No MPP status is persisted; callers wanting history use the
/// per-wallet transaction log.
#[instrument(skip(plans))]
pub async fn multi_path_melt(request: &str, plans: Vec<MeltPlan>) -> Result<Vec<Melted>, Error> {
    if plans.is_empty() {
        return Err(Error::ValidationFailed("No melt plans given".to_string()));
    }

    // Quote every part first so a mint missing NUT-15 fails the whole
    // payment before any proofs are reserved
    let mut quotes = Vec::with_capacity(plans.len());
    for plan in &plans {
        let quote = plan
            .wallet
            .melt_quote(
                request.to_string(),
                Some(MeltOptions::new_mpp(plan.amount_msat)),
            )
            .await?;
        quotes.push(quote);
    }

    let results = futures::future::join_all(
        plans
            .iter()
            .zip(quotes.iter())
            .map(|(plan, quote)| {
                let wallet = Arc::clone(&plan.wallet);
                let quote_id = quote.id.clone();
                async move { wallet.melt(&quote_id).await }
            }),
    )
    .await;

    let mut melted = Vec::with_capacity(results.len());
    let mut failures = Vec::new();

    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(part) => melted.push(part),
            Err(err) => failures.push(format!("part {i}: {err}")),
        }
    }

    if failures.is_empty() {
        Ok(melted)
    } else {
        Err(Error::Custom(format!(
            "Multi-path melt incomplete ({}/{} parts paid): {}",
            melted.len(),
            melted.len() + failures.len(),
            failures.join("; ")
        )))
    }
}
