//! In-memory wallet storage

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cashu_core::nuts::{CurrencyUnit, Id, KeySet, KeySetInfo, Keys, PublicKey, State};
use cashu_core::{Amount, MintUrl};
use tokio::sync::RwLock;

use super::WalletDatabase;
use crate::error::Error;
use crate::types::{MeltQuote, MintQuote, ProofInfo, Transaction};

/// In-memory wallet database
///
/// A single table of proofs keyed by Y plus side tables, all behind one lock.
#[derive(Debug, Clone, Default)]
pub struct WalletMemoryDatabase {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    mint_keysets: HashMap<MintUrl, Vec<KeySetInfo>>,
    keyset_keys: HashMap<Id, Keys>,
    proofs: HashMap<PublicKey, ProofInfo>,
    keyset_counter: HashMap<Id, u32>,
    mint_quotes: HashMap<String, MintQuote>,
    melt_quotes: HashMap<String, MeltQuote>,
    transactions: Vec<Transaction>,
}

impl WalletMemoryDatabase {
    /// Create an empty [`WalletMemoryDatabase`]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletDatabase for WalletMemoryDatabase {
    async fn add_keysets(
        &self,
        mint_url: MintUrl,
        keysets: Vec<KeySetInfo>,
    ) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        let existing = inner.mint_keysets.entry(mint_url).or_default();

        for keyset in keysets {
            match existing.iter_mut().find(|k| k.id == keyset.id) {
                Some(known) => *known = keyset,
                None => existing.push(keyset),
            }
        }

        Ok(())
    }

    async fn get_keysets(&self, mint_url: &MintUrl) -> Result<Option<Vec<KeySetInfo>>, Error> {
        Ok(self.inner.read().await.mint_keysets.get(mint_url).cloned())
    }

    async fn get_keyset_by_id(&self, keyset_id: &Id) -> Result<Option<KeySetInfo>, Error> {
        Ok(self
            .inner
            .read()
            .await
            .mint_keysets
            .values()
            .flatten()
            .find(|k| &k.id == keyset_id)
            .cloned())
    }

    async fn add_keys(&self, keyset: KeySet) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .keyset_keys
            .insert(keyset.id, keyset.keys);
        Ok(())
    }

    async fn get_keys(&self, id: &Id) -> Result<Option<Keys>, Error> {
        Ok(self.inner.read().await.keyset_keys.get(id).cloned())
    }

    async fn update_proofs(
        &self,
        added: Vec<ProofInfo>,
        removed_ys: Vec<PublicKey>,
    ) -> Result<(), Error> {
        let mut inner = self.inner.write().await;

        for y in removed_ys {
            inner.proofs.remove(&y);
        }

        for info in added {
            inner.proofs.insert(info.y, info);
        }

        Ok(())
    }

    async fn update_proofs_state(&self, ys: Vec<PublicKey>, state: State) -> Result<(), Error> {
        let mut inner = self.inner.write().await;

        for y in ys {
            match inner.proofs.get_mut(&y) {
                Some(info) => info.state = state,
                None => return Err(Error::ProofNotFound),
            }
        }

        Ok(())
    }

    async fn get_proofs(
        &self,
        mint_url: Option<MintUrl>,
        unit: Option<CurrencyUnit>,
        state: Option<Vec<State>>,
    ) -> Result<Vec<ProofInfo>, Error> {
        Ok(self
            .inner
            .read()
            .await
            .proofs
            .values()
            .filter(|p| p.matches_conditions(&mint_url, &unit, &state))
            .cloned()
            .collect())
    }

    async fn get_proofs_by_ys(&self, ys: &[PublicKey]) -> Result<Vec<ProofInfo>, Error> {
        let inner = self.inner.read().await;
        Ok(ys.iter().filter_map(|y| inner.proofs.get(y).cloned()).collect())
    }

    async fn get_balance(
        &self,
        mint_url: Option<MintUrl>,
        unit: Option<CurrencyUnit>,
        state: Option<Vec<State>>,
    ) -> Result<Amount, Error> {
        let proofs = self.get_proofs(mint_url, unit, state).await?;

        Ok(Amount::try_sum(
            proofs.iter().map(|p| p.proof.amount),
        )?)
    }

    async fn increment_keyset_counter(&self, keyset_id: &Id, count: u32) -> Result<u32, Error> {
        let mut inner = self.inner.write().await;
        let counter = inner.keyset_counter.entry(*keyset_id).or_insert(0);
        let before = *counter;
        *counter = counter
            .checked_add(count)
            .ok_or_else(|| Error::Storage("Keyset counter overflow".to_string()))?;
        Ok(before)
    }

    async fn get_keyset_counter(&self, keyset_id: &Id) -> Result<Option<u32>, Error> {
        Ok(self.inner.read().await.keyset_counter.get(keyset_id).copied())
    }

    async fn get_keyset_counters(&self) -> Result<HashMap<Id, u32>, Error> {
        Ok(self.inner.read().await.keyset_counter.clone())
    }

    async fn add_mint_quote(&self, quote: MintQuote) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .mint_quotes
            .insert(quote.id.clone(), quote);
        Ok(())
    }

    async fn get_mint_quote(&self, quote_id: &str) -> Result<Option<MintQuote>, Error> {
        Ok(self.inner.read().await.mint_quotes.get(quote_id).cloned())
    }

    async fn get_mint_quotes(&self) -> Result<Vec<MintQuote>, Error> {
        Ok(self.inner.read().await.mint_quotes.values().cloned().collect())
    }

    async fn remove_mint_quote(&self, quote_id: &str) -> Result<(), Error> {
        self.inner.write().await.mint_quotes.remove(quote_id);
        Ok(())
    }

    async fn add_melt_quote(&self, quote: MeltQuote) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .melt_quotes
            .insert(quote.id.clone(), quote);
        Ok(())
    }

    async fn get_melt_quote(&self, quote_id: &str) -> Result<Option<MeltQuote>, Error> {
        Ok(self.inner.read().await.melt_quotes.get(quote_id).cloned())
    }

    async fn remove_melt_quote(&self, quote_id: &str) -> Result<(), Error> {
        self.inner.write().await.melt_quotes.remove(quote_id);
        Ok(())
    }

    async fn add_transaction(&self, transaction: Transaction) -> Result<(), Error> {
        self.inner.write().await.transactions.push(transaction);
        Ok(())
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, Error> {
        Ok(self.inner.read().await.transactions.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use cashu_core::nuts::Proof;
    use cashu_core::secret::Secret;

    use super::*;

    fn proof_info(amount: u64, state: State) -> ProofInfo {
        let proof = Proof::new(
            Amount::from(amount),
            Id::from_str("009a1f293253e41e").unwrap(),
            Secret::generate(),
            PublicKey::from_hex(
                "02bc9097997d81afb2cc7346b5e4345a9346bd2a506eb7958598a72f0cf85163ea",
            )
            .unwrap(),
        );

        ProofInfo::new(
            proof,
            MintUrl::from_str("https://mint.example.com").unwrap(),
            state,
            CurrencyUnit::Sat,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_proof_lifecycle() {
        let db = WalletMemoryDatabase::new();

        let unspent = proof_info(4, State::Unspent);
        let pending = proof_info(8, State::Pending);

        db.update_proofs(vec![unspent.clone(), pending.clone()], vec![])
            .await
            .unwrap();

        // Balance only counts unspent
        let balance = db
            .get_balance(None, None, Some(vec![State::Unspent]))
            .await
            .unwrap();
        assert_eq!(balance, Amount::from(4));

        // Roll the pending proof back
        db.update_proofs_state(vec![pending.y], State::Unspent)
            .await
            .unwrap();
        let balance = db
            .get_balance(None, None, Some(vec![State::Unspent]))
            .await
            .unwrap();
        assert_eq!(balance, Amount::from(12));

        // Finalize one by removal
        db.update_proofs(vec![], vec![unspent.y]).await.unwrap();
        let proofs = db.get_proofs(None, None, None).await.unwrap();
        assert_eq!(proofs.len(), 1);
    }

    #[tokio::test]
    async fn test_update_state_of_missing_proof_errors() {
        let db = WalletMemoryDatabase::new();
        let missing = proof_info(1, State::Unspent);

        assert!(db
            .update_proofs_state(vec![missing.y], State::Pending)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_keyset_counter_monotonic() {
        let db = WalletMemoryDatabase::new();
        let id = Id::from_str("009a1f293253e41e").unwrap();

        assert_eq!(db.get_keyset_counter(&id).await.unwrap(), None);

        let before = db.increment_keyset_counter(&id, 3).await.unwrap();
        assert_eq!(before, 0);

        let before = db.increment_keyset_counter(&id, 2).await.unwrap();
        assert_eq!(before, 3);

        assert_eq!(db.get_keyset_counter(&id).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_quote_storage() {
        let db = WalletMemoryDatabase::new();

        let quote = MintQuote {
            id: "q-1".to_string(),
            mint_url: MintUrl::from_str("https://mint.example.com").unwrap(),
            amount: Amount::from(100),
            unit: CurrencyUnit::Sat,
            request: "lnbc...".to_string(),
            state: cashu_core::nuts::MintQuoteState::Unpaid,
            expiry: 0,
            secret_key: None,
        };

        db.add_mint_quote(quote.clone()).await.unwrap();
        assert_eq!(db.get_mint_quote("q-1").await.unwrap(), Some(quote));

        db.remove_mint_quote("q-1").await.unwrap();
        assert_eq!(db.get_mint_quote("q-1").await.unwrap(), None);
    }
}
