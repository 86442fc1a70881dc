//! Wallet storage
//!
//! The core consumes storage only through [`WalletDatabase`]; the in-memory
//! implementation backs tests and ephemeral wallets, other backends are
//! supplied by the embedding application.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use cashu_core::nuts::{CurrencyUnit, Id, KeySet, KeySetInfo, Keys, PublicKey, State};
use cashu_core::{Amount, MintUrl};

use crate::error::Error;
use crate::types::{MeltQuote, MintQuote, ProofInfo, Transaction};

pub mod memory;

pub use memory::WalletMemoryDatabase;

/// Wallet storage trait
///
/// A selection and its pending-mark must be issued under the wallet's
/// operation lock so no two concurrent operations can reserve overlapping
/// proofs.
#[async_trait]
pub trait WalletDatabase: Debug + Send + Sync {
    /// Add mint keysets to storage
    async fn add_keysets(&self, mint_url: MintUrl, keysets: Vec<KeySetInfo>)
        -> Result<(), Error>;

    /// Get mint keysets for mint url
    async fn get_keysets(&self, mint_url: &MintUrl) -> Result<Option<Vec<KeySetInfo>>, Error>;

    /// Get keyset info by id
    async fn get_keyset_by_id(&self, keyset_id: &Id) -> Result<Option<KeySetInfo>, Error>;

    /// Add keys of a keyset to storage
    async fn add_keys(&self, keyset: KeySet) -> Result<(), Error>;

    /// Get keys of a keyset
    async fn get_keys(&self, id: &Id) -> Result<Option<Keys>, Error>;

    /// Add proofs and/or remove spent proofs by their Y values
    async fn update_proofs(
        &self,
        added: Vec<ProofInfo>,
        removed_ys: Vec<PublicKey>,
    ) -> Result<(), Error>;

    /// Set the state of the proofs with the given Y values
    async fn update_proofs_state(&self, ys: Vec<PublicKey>, state: State) -> Result<(), Error>;

    /// Get proofs matching the filters
    async fn get_proofs(
        &self,
        mint_url: Option<MintUrl>,
        unit: Option<CurrencyUnit>,
        state: Option<Vec<State>>,
    ) -> Result<Vec<ProofInfo>, Error>;

    /// Get proofs by their Y values. Missing Ys are skipped.
    async fn get_proofs_by_ys(&self, ys: &[PublicKey]) -> Result<Vec<ProofInfo>, Error>;

    /// Balance of proofs in the given states
    async fn get_balance(
        &self,
        mint_url: Option<MintUrl>,
        unit: Option<CurrencyUnit>,
        state: Option<Vec<State>>,
    ) -> Result<Amount, Error>;

    /// Atomically increment the keyset counter, returning the value before
    /// the increment
    async fn increment_keyset_counter(&self, keyset_id: &Id, count: u32) -> Result<u32, Error>;

    /// Get the keyset counter
    async fn get_keyset_counter(&self, keyset_id: &Id) -> Result<Option<u32>, Error>;

    /// All keyset counters
    async fn get_keyset_counters(&self) -> Result<HashMap<Id, u32>, Error>;

    /// Add mint quote to storage
    async fn add_mint_quote(&self, quote: MintQuote) -> Result<(), Error>;

    /// Get mint quote from storage
    async fn get_mint_quote(&self, quote_id: &str) -> Result<Option<MintQuote>, Error>;

    /// Get all mint quotes
    async fn get_mint_quotes(&self) -> Result<Vec<MintQuote>, Error>;

    /// Remove mint quote from storage
    async fn remove_mint_quote(&self, quote_id: &str) -> Result<(), Error>;

    /// Add melt quote to storage
    async fn add_melt_quote(&self, quote: MeltQuote) -> Result<(), Error>;

    /// Get melt quote from storage
    async fn get_melt_quote(&self, quote_id: &str) -> Result<Option<MeltQuote>, Error>;

    /// Remove melt quote from storage
    async fn remove_melt_quote(&self, quote_id: &str) -> Result<(), Error>;

    /// Append a transaction to the history log
    async fn add_transaction(&self, transaction: Transaction) -> Result<(), Error>;

    /// List transactions
    async fn list_transactions(&self) -> Result<Vec<Transaction>, Error>;
}
