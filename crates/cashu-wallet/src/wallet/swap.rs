//! Swap
//!
//! Exchange a set of proofs for a fresh set of equal total minus the mint's
//! input fee. Inputs are marked pending before the request leaves the wallet;
//! definitive rejections roll them back, ambiguous failures leave them
//! pending for later reconciliation, and a spent-token rejection finalizes
//! them.

use cashu_core::amount::SplitTarget;
use cashu_core::dhke::construct_proofs;
use cashu_core::nuts::{
    PreMintSecrets, Proofs, ProofsMethods, SpendingConditions, State, SwapRequest,
};
use cashu_core::Amount;
use tracing::instrument;

use super::Wallet;
use crate::error::Error;
use crate::fees::calculate_fee;
use crate::types::ProofInfo;

impl Wallet {
    /// Swap available proofs so that `amount` becomes payable exactly.
    ///
    /// Returns the proofs matching `amount` (or every new proof when `amount`
    /// is `None`); change stays in the store as available balance.
    #[instrument(skip(self))]
    pub async fn swap(
        &self,
        amount: Option<Amount>,
        amount_split_target: SplitTarget,
        spending_conditions: Option<SpendingConditions>,
    ) -> Result<Proofs, Error> {
        let _guard = self.begin_op().await?;

        let target = match amount {
            Some(amount) => amount,
            None => self.total_balance().await?,
        };

        let inputs = self.reserve_proofs(target, State::Pending).await?;

        self.swap_proofs(inputs, amount, amount_split_target, spending_conditions)
            .await
    }

    /// Swap the given reserved inputs. Callers hold the operation guard.
    pub(crate) async fn swap_proofs(
        &self,
        inputs: Vec<ProofInfo>,
        amount: Option<Amount>,
        amount_split_target: SplitTarget,
        spending_conditions: Option<SpendingConditions>,
    ) -> Result<Proofs, Error> {
        self.ensure_not_cancelled()?;

        let input_proofs: Proofs = inputs.iter().map(|p| p.proof.clone()).collect();
        let input_total = input_proofs.total_amount()?;

        let active_keyset = self.active_keyset().await?;
        let fees = self.keyset_fees().await?;
        let fee = calculate_fee(&input_proofs.count_by_keyset(), &fees)?;

        let output_total = input_total
            .checked_sub(fee)
            .ok_or(Error::BalanceInsufficient {
                needed: fee,
                available: input_total,
            })?;

        let desired_amount = amount.unwrap_or(output_total);
        let change_amount =
            output_total
                .checked_sub(desired_amount)
                .ok_or(Error::BalanceInsufficient {
                    needed: desired_amount,
                    available: output_total,
                })?;

        // Desired outputs, under conditions when given; conditioned secrets
        // cannot be derived from the seed
        let desired_premint = match &spending_conditions {
            Some(conditions) => PreMintSecrets::with_conditions(
                active_keyset.id,
                desired_amount,
                &amount_split_target,
                conditions,
            )?,
            None => {
                let count = desired_amount
                    .split_targeted(&amount_split_target)?
                    .len() as u32;
                let counter = self
                    .localstore
                    .increment_keyset_counter(&active_keyset.id, count)
                    .await?;

                PreMintSecrets::from_seed(
                    active_keyset.id,
                    counter,
                    &self.seed,
                    desired_amount,
                    &amount_split_target,
                )?
            }
        };

        let change_premint = {
            let count = change_amount.split_targeted(&SplitTarget::None)?.len() as u32;
            let counter = self
                .localstore
                .increment_keyset_counter(&active_keyset.id, count)
                .await?;

            PreMintSecrets::from_seed(
                active_keyset.id,
                counter,
                &self.seed,
                change_amount,
                &SplitTarget::None,
            )?
        };

        let mut outputs = desired_premint.clone();
        outputs.combine(change_premint);

        let request = SwapRequest::new(input_proofs, outputs.blinded_messages());

        let response = match self.client.post_swap(request).await {
            Ok(response) => response,
            Err(err) => {
                self.handle_spend_failure(&inputs, &err).await?;
                return Err(err);
            }
        };

        let keys = self.load_keyset_keys(active_keyset.id).await?;

        let new_proofs = construct_proofs(
            response.signatures,
            outputs.rs(),
            outputs.secrets(),
            &keys,
        )
        .map_err(|e| match e {
            cashu_core::error::Error::DleqVerificationFailed => Error::DleqVerificationFailed,
            other => Error::Cashu(other),
        })?;

        // Split returned proofs back into the desired part and the change
        let desired_secrets: Vec<_> = desired_premint.secrets();
        let (returned, change): (Proofs, Proofs) = new_proofs
            .into_iter()
            .partition(|p| desired_secrets.contains(&p.secret));

        let mut added = Vec::with_capacity(returned.len() + change.len());
        for proof in returned.iter().chain(change.iter()) {
            added.push(ProofInfo::new(
                proof.clone(),
                self.mint_url.clone(),
                State::Unspent,
                self.unit.clone(),
            )?);
        }

        // Finalize inputs and insert outputs in one store update
        let spent_ys = inputs.iter().map(|p| p.y).collect();
        self.localstore.update_proofs(added, spent_ys).await?;

        Ok(returned)
    }

    /// Route a failed spend per error class: roll back on definitive
    /// rejection, finalize on token-already-spent, keep pending when the
    /// outcome at the mint is unknown.
    pub(crate) async fn handle_spend_failure(
        &self,
        inputs: &[ProofInfo],
        err: &Error,
    ) -> Result<(), Error> {
        match err {
            Error::ProofAlreadySpent => {
                tracing::warn!("Inputs already spent at mint; finalizing");
                self.finalize_proofs(inputs).await
            }
            e if e.is_definitive_failure() => {
                tracing::debug!("Definitive failure; rolling inputs back: {e}");
                self.rollback_proofs(inputs).await
            }
            e => {
                tracing::warn!("Ambiguous failure; inputs stay pending: {e}");
                Ok(())
            }
        }
    }
}
