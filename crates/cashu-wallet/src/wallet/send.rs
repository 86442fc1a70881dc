//! Send
//!
//! Detach proofs totaling the requested amount into a serialized token. When
//! the available denominations cannot hit the amount exactly a preparatory
//! swap makes change first. Sent proofs stay reserved until the receiver
//! redeems them or the sender reclaims them.

use cashu_core::amount::SplitTarget;
use cashu_core::nuts::{Proofs, ProofsMethods, PublicKey, State, Token};
use cashu_core::util::unix_time;
use cashu_core::Amount;
use tracing::instrument;

use super::proofs::select_proofs;
use super::Wallet;
use crate::error::Error;
use crate::types::{Transaction, TransactionDirection};

/// A send that has reserved its proofs and can be serialized
#[derive(Debug, Clone)]
pub struct PreparedSend {
    /// The token to hand to the receiver
    pub token: Token,
    /// Proofs inside the token, reserved in the store
    pub proofs: Proofs,
    /// Amount carried by the token
    pub amount: Amount,
}

impl std::fmt::Display for PreparedSend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

impl Wallet {
    /// Prepare a token worth exactly `amount`
    #[instrument(skip(self))]
    pub async fn send(&self, amount: Amount, memo: Option<String>) -> Result<PreparedSend, Error> {
        let _guard = self.begin_op().await?;
        self.ensure_not_cancelled()?;

        let available = self.get_unspent_proofs().await?;
        let selected = select_proofs(available, amount)?;
        let selected_total = Amount::try_sum(selected.iter().map(|p| p.proof.amount))?;

        let send_proofs: Proofs = if selected_total == amount {
            let ys: Vec<PublicKey> = selected.iter().map(|p| p.y).collect();
            self.localstore
                .update_proofs_state(ys, State::Reserved)
                .await?;

            selected.iter().map(|p| p.proof.clone()).collect()
        } else {
            // Selection overshoots; swap first so the token is exact
            let ys: Vec<PublicKey> = selected.iter().map(|p| p.y).collect();
            self.localstore
                .update_proofs_state(ys, State::Pending)
                .await?;

            let swapped = self
                .swap_proofs(selected, Some(amount), SplitTarget::default(), None)
                .await?;

            let ys = swapped.ys()?;
            self.localstore
                .update_proofs_state(ys, State::Reserved)
                .await?;

            swapped
        };

        let token = Token::new(
            self.mint_url.clone(),
            send_proofs.clone(),
            memo.clone(),
            self.unit.clone(),
        );

        self.localstore
            .add_transaction(Transaction {
                mint_url: self.mint_url.clone(),
                direction: TransactionDirection::Outgoing,
                amount,
                fee: Amount::ZERO,
                unit: self.unit.clone(),
                ys: send_proofs.ys()?,
                timestamp: unix_time(),
                memo,
            })
            .await?;

        Ok(PreparedSend {
            token,
            proofs: send_proofs,
            amount,
        })
    }

    /// Reclaim reserved send proofs the receiver has not redeemed.
    ///
    /// Checks with the mint first: redeemed proofs are finalized, unredeemed
    /// ones come back as balance.
    #[instrument(skip(self))]
    pub async fn reclaim_reserved(&self) -> Result<Amount, Error> {
        let _guard = self.begin_op().await?;

        let reserved = self
            .localstore
            .get_proofs(
                Some(self.mint_url.clone()),
                Some(self.unit.clone()),
                Some(vec![State::Reserved]),
            )
            .await?;

        if reserved.is_empty() {
            return Ok(Amount::ZERO);
        }

        let proofs: Proofs = reserved.iter().map(|p| p.proof.clone()).collect();
        let states = self.check_proofs_spent(&proofs).await?;

        let mut spent_ys = Vec::new();
        let mut unspent = Vec::new();

        for (info, state) in reserved.iter().zip(states) {
            match state {
                State::Spent => spent_ys.push(info.y),
                State::Unspent => unspent.push(info.clone()),
                State::Pending | State::Reserved => {}
            }
        }

        self.localstore.update_proofs(vec![], spent_ys).await?;

        let reclaimed = Amount::try_sum(unspent.iter().map(|p| p.proof.amount))?;
        self.rollback_proofs(&unspent).await?;

        Ok(reclaimed)
    }
}
