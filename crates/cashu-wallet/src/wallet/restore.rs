//! Restoration
//!
//! Rebuild a wallet's proofs from its seed (NUT-09 + NUT-13). Counters are
//! scanned in batches per keyset; signatures the mint retained are unblinded,
//! partitioned by spendable state, and the counter is left one past the
//! highest signed counter observed.

use cashu_core::dhke::construct_proofs;
use cashu_core::nuts::{PreMintSecrets, RestoreRequest, State};
use cashu_core::Amount;
use tracing::instrument;

use super::{Wallet, WalletEvent};
use crate::error::Error;
use crate::types::ProofInfo;

impl Wallet {
    /// Scan the mint for proofs derivable from this wallet's seed and insert
    /// the unspent ones.
    ///
    /// Returns the restored spendable amount. Fully cancellable between
    /// batches.
    #[instrument(skip(self))]
    pub async fn restore_from_seed(&self) -> Result<Amount, Error> {
        let _guard = self
            .begin_op_kind(WalletEvent::BeginRestore, WalletEvent::RestoreComplete)
            .await?;

        let batch_size = self.config.restoration_batch_size.max(1);
        let stop_after = self.config.restoration_stop_after_empty_batches.max(1);

        let keysets = self.fetch_keysets().await?;

        let mut restored_total = Amount::ZERO;

        for keyset in keysets {
            self.ensure_not_cancelled()?;

            let keys = self.load_keyset_keys(keyset.id).await?;

            let mut start_counter = self
                .localstore
                .get_keyset_counter(&keyset.id)
                .await?
                .unwrap_or(0);
            let mut empty_batches = 0u32;
            let mut max_signed_counter: Option<u32> = None;

            while empty_batches < stop_after {
                self.ensure_not_cancelled()?;

                let end_counter = start_counter + batch_size - 1;

                tracing::debug!(
                    "Restore scan keyset {} counters {start_counter}..={end_counter}",
                    keyset.id
                );

                let premints = PreMintSecrets::restore_batch(
                    keyset.id,
                    &self.seed,
                    start_counter,
                    end_counter,
                )?;

                let response = self
                    .client
                    .post_restore(RestoreRequest {
                        outputs: premints.blinded_messages(),
                    })
                    .await?;

                if response.signatures.is_empty() {
                    empty_batches += 1;
                    start_counter = end_counter + 1;
                    continue;
                }

                empty_batches = 0;

                // Match returned outputs back to the premints they came from
                let mut rs = Vec::with_capacity(response.outputs.len());
                let mut secrets = Vec::with_capacity(response.outputs.len());

                for output in &response.outputs {
                    let premint = premints
                        .iter()
                        .enumerate()
                        .find(|(_, pm)| {
                            pm.blinded_message.blinded_secret == output.blinded_secret
                        })
                        .ok_or_else(|| {
                            Error::ValidationFailed(
                                "Restore response contains unknown output".to_string(),
                            )
                        })?;

                    max_signed_counter = Some(
                        max_signed_counter
                            .unwrap_or(0)
                            .max(start_counter + premint.0 as u32),
                    );
                    rs.push(premint.1.r.clone());
                    secrets.push(premint.1.secret.clone());
                }

                let proofs = construct_proofs(response.signatures, rs, secrets, &keys)?;

                // Partition by on-mint state; only unspent ones come back
                let states = self.check_proofs_spent(&proofs).await?;

                let mut added = Vec::new();
                for (proof, state) in proofs.into_iter().zip(states) {
                    if state == State::Unspent {
                        restored_total = restored_total
                            .checked_add(proof.amount)
                            .ok_or(cashu_core::amount::Error::AmountOverflow)?;
                        added.push(ProofInfo::new(
                            proof,
                            self.mint_url.clone(),
                            State::Unspent,
                            self.unit.clone(),
                        )?);
                    }
                }

                self.localstore.update_proofs(added, vec![]).await?;

                start_counter = end_counter + 1;
            }

            // Leave the counter one past the last signature the mint saw
            if let Some(max_signed) = max_signed_counter {
                let current = self
                    .localstore
                    .get_keyset_counter(&keyset.id)
                    .await?
                    .unwrap_or(0);
                let target = max_signed + 1;

                if target > current {
                    self.localstore
                        .increment_keyset_counter(&keyset.id, target - current)
                        .await?;
                }
            }
        }

        // Persist a snapshot of the counter table alongside the seed
        let counters = self.localstore.get_keyset_counters().await?;
        self.secure_store.save_counters(&counters).await?;

        Ok(restored_total)
    }
}
