//! Proof selection and reconciliation

use cashu_core::nuts::{CheckStateRequest, Proofs, ProofsMethods, PublicKey, State};
use cashu_core::Amount;
use tracing::instrument;

use super::Wallet;
use crate::error::Error;
use crate::types::ProofInfo;

impl Wallet {
    /// Proofs currently available to spend
    pub async fn get_unspent_proofs(&self) -> Result<Vec<ProofInfo>, Error> {
        self.localstore
            .get_proofs(
                Some(self.mint_url.clone()),
                Some(self.unit.clone()),
                Some(vec![State::Unspent]),
            )
            .await
    }

    /// Proofs that are tied up in in-flight or unredeemed operations
    pub async fn get_pending_proofs(&self) -> Result<Vec<ProofInfo>, Error> {
        self.localstore
            .get_proofs(
                Some(self.mint_url.clone()),
                Some(self.unit.clone()),
                Some(vec![State::Pending, State::Reserved]),
            )
            .await
    }

    /// Select available proofs covering at least `target` and mark them with
    /// `state` in one step. Callers hold the operation lock, which is what
    /// makes the select-and-mark atomic against concurrent operations.
    pub(crate) async fn reserve_proofs(
        &self,
        target: Amount,
        state: State,
    ) -> Result<Vec<ProofInfo>, Error> {
        let available = self.get_unspent_proofs().await?;

        let selected = select_proofs(available, target)?;

        let ys: Vec<PublicKey> = selected.iter().map(|p| p.y).collect();
        self.localstore.update_proofs_state(ys, state).await?;

        Ok(selected)
    }

    /// Return reserved proofs to the available pool
    pub(crate) async fn rollback_proofs(&self, proofs: &[ProofInfo]) -> Result<(), Error> {
        let ys: Vec<PublicKey> = proofs.iter().map(|p| p.y).collect();
        self.localstore.update_proofs_state(ys, State::Unspent).await
    }

    /// Remove spent proofs from the store
    pub(crate) async fn finalize_proofs(&self, proofs: &[ProofInfo]) -> Result<(), Error> {
        let ys: Vec<PublicKey> = proofs.iter().map(|p| p.y).collect();
        self.localstore.update_proofs(vec![], ys).await
    }

    /// Ask the mint which of the given proofs are spent [NUT-07]
    #[instrument(skip_all)]
    pub async fn check_proofs_spent(&self, proofs: &Proofs) -> Result<Vec<State>, Error> {
        let ys = proofs.ys()?;

        let response = self
            .client
            .post_check_state(CheckStateRequest { ys: ys.clone() })
            .await?;

        // Responses are matched up by Y, not by index
        ys.iter()
            .map(|y| {
                response
                    .states
                    .iter()
                    .find(|s| &s.y == y)
                    .map(|s| s.state)
                    .ok_or_else(|| Error::MissingRequiredField("state".to_string()))
            })
            .collect()
    }

    /// Reconcile local pending proofs against the mint: spent ones are
    /// finalized, unspent ones are returned to the available pool. Called on
    /// wallet startup and after ambiguous failures.
    #[instrument(skip(self))]
    pub async fn reconcile_pending(&self) -> Result<Amount, Error> {
        let _guard = self
            .begin_op_kind(
                super::WalletEvent::BeginSync,
                super::WalletEvent::SyncComplete,
            )
            .await?;

        let pending = self.get_pending_proofs().await?;

        if pending.is_empty() {
            return Ok(Amount::ZERO);
        }

        let proofs: Proofs = pending.iter().map(|p| p.proof.clone()).collect();
        let states = self.check_proofs_spent(&proofs).await?;

        let mut spent_ys = Vec::new();
        let mut unspent_ys = Vec::new();

        for (info, state) in pending.iter().zip(states) {
            match state {
                State::Spent => spent_ys.push(info.y),
                State::Unspent => unspent_ys.push(info.y),
                // Still part of an in-flight transaction at the mint
                State::Pending | State::Reserved => {}
            }
        }

        let recovered = Amount::try_sum(
            pending
                .iter()
                .filter(|p| unspent_ys.contains(&p.y))
                .map(|p| p.proof.amount),
        )?;

        self.localstore.update_proofs(vec![], spent_ys).await?;
        self.localstore
            .update_proofs_state(unspent_ys, State::Unspent)
            .await?;

        Ok(recovered)
    }
}

/// Select proofs totaling at least `target`.
///
/// Preference order: an exact single proof, an exact greedy subset, then the
/// smallest superset; change is recovered via swap by the caller. Ties break
/// toward fewer proofs, then lower total.
pub fn select_proofs(
    available: Vec<ProofInfo>,
    target: Amount,
) -> Result<Vec<ProofInfo>, Error> {
    if target == Amount::ZERO {
        return Ok(Vec::new());
    }

    let total_available = Amount::try_sum(available.iter().map(|p| p.proof.amount))?;

    if total_available < target {
        return Err(Error::BalanceInsufficient {
            needed: target,
            available: total_available,
        });
    }

    // Exact single proof
    if let Some(exact) = available.iter().find(|p| p.proof.amount == target) {
        return Ok(vec![exact.clone()]);
    }

    let mut sorted = available;
    sorted.sort_by(|a, b| b.proof.amount.cmp(&a.proof.amount));

    // Greedy descending without exceeding the target
    let mut selected: Vec<ProofInfo> = Vec::new();
    let mut selected_total = Amount::ZERO;

    for proof in &sorted {
        let candidate = selected_total
            .checked_add(proof.proof.amount)
            .ok_or(cashu_core::amount::Error::AmountOverflow)?;
        if candidate <= target {
            selected.push(proof.clone());
            selected_total = candidate;
        }

        if selected_total == target {
            return Ok(selected);
        }
    }

    // No exact cover exists; extend to the smallest superset. The smallest
    // single proof that covers the remainder beats piling on more proofs.
    let remaining = target - selected_total;

    let unselected: Vec<&ProofInfo> = sorted
        .iter()
        .filter(|p| !selected.iter().any(|s| s.y == p.y))
        .collect();

    if let Some(cover) = unselected
        .iter()
        .filter(|p| p.proof.amount >= remaining)
        .min_by_key(|p| p.proof.amount)
    {
        selected.push((*cover).clone());
        return Ok(selected);
    }

    // Otherwise add the remaining proofs smallest-first until covered
    for proof in unselected.into_iter().rev() {
        selected.push(proof.clone());
        selected_total = Amount::try_sum(selected.iter().map(|p| p.proof.amount))?;

        if selected_total >= target {
            return Ok(selected);
        }
    }

    Err(Error::NoSpendableProofs)
}
