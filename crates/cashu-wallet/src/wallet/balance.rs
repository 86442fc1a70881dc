//! Balances

use cashu_core::nuts::State;
use cashu_core::Amount;

use super::Wallet;
use crate::error::Error;

impl Wallet {
    /// Spendable balance: the sum of available proofs
    pub async fn total_balance(&self) -> Result<Amount, Error> {
        self.localstore
            .get_balance(
                Some(self.mint_url.clone()),
                Some(self.unit.clone()),
                Some(vec![State::Unspent]),
            )
            .await
    }

    /// Balance tied up in in-flight operations and unredeemed sends
    pub async fn pending_balance(&self) -> Result<Amount, Error> {
        self.localstore
            .get_balance(
                Some(self.mint_url.clone()),
                Some(self.unit.clone()),
                Some(vec![State::Pending, State::Reserved]),
            )
            .await
    }
}
