//! In-memory secure store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cashu_core::nuts::{Id, Proof};
use cashu_core::sensitive::SensitiveBytes;
use cashu_core::MintUrl;
use tokio::sync::RwLock;

use super::SecureStore;
use crate::error::Error;

/// Secure store that keeps everything in process memory. Secret buffers are
/// wiped on drop; nothing touches disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    mnemonic: Option<String>,
    seed: Option<SensitiveBytes>,
    access_tokens: HashMap<MintUrl, String>,
    access_proofs: HashMap<MintUrl, Vec<Proof>>,
    counters: HashMap<Id, u32>,
    has_counters: bool,
}

impl MemoryStore {
    /// Create an empty [`MemoryStore`]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn save_mnemonic(&self, mnemonic: &str) -> Result<(), Error> {
        self.inner.write().await.mnemonic = Some(mnemonic.to_string());
        Ok(())
    }

    async fn load_mnemonic(&self) -> Result<Option<String>, Error> {
        Ok(self.inner.read().await.mnemonic.clone())
    }

    async fn delete_mnemonic(&self) -> Result<(), Error> {
        self.inner.write().await.mnemonic = None;
        Ok(())
    }

    async fn save_seed(&self, seed: &[u8; 64]) -> Result<(), Error> {
        self.inner.write().await.seed = Some(SensitiveBytes::from(seed.as_slice()));
        Ok(())
    }

    async fn load_seed(&self) -> Result<Option<[u8; 64]>, Error> {
        let inner = self.inner.read().await;
        match &inner.seed {
            Some(bytes) => {
                let seed: [u8; 64] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("Stored seed has wrong length".to_string()))?;
                Ok(Some(seed))
            }
            None => Ok(None),
        }
    }

    async fn delete_seed(&self) -> Result<(), Error> {
        self.inner.write().await.seed = None;
        Ok(())
    }

    async fn save_access_token(&self, mint_url: &MintUrl, token: &str) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .access_tokens
            .insert(mint_url.clone(), token.to_string());
        Ok(())
    }

    async fn load_access_token(&self, mint_url: &MintUrl) -> Result<Option<String>, Error> {
        Ok(self.inner.read().await.access_tokens.get(mint_url).cloned())
    }

    async fn delete_access_token(&self, mint_url: &MintUrl) -> Result<(), Error> {
        self.inner.write().await.access_tokens.remove(mint_url);
        Ok(())
    }

    async fn save_access_proofs(&self, mint_url: &MintUrl, proofs: &[Proof]) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .access_proofs
            .insert(mint_url.clone(), proofs.to_vec());
        Ok(())
    }

    async fn load_access_proofs(&self, mint_url: &MintUrl) -> Result<Vec<Proof>, Error> {
        Ok(self
            .inner
            .read()
            .await
            .access_proofs
            .get(mint_url)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_counters(&self, counters: &HashMap<Id, u32>) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        inner.counters = counters.clone();
        inner.has_counters = true;
        Ok(())
    }

    async fn load_counters(&self) -> Result<HashMap<Id, u32>, Error> {
        Ok(self.inner.read().await.counters.clone())
    }

    async fn clear_all(&self) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
        Ok(())
    }

    async fn has_data(&self) -> Result<bool, Error> {
        let inner = self.inner.read().await;
        Ok(inner.mnemonic.is_some()
            || inner.seed.is_some()
            || !inner.access_tokens.is_empty()
            || !inner.access_proofs.is_empty()
            || inner.has_counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mnemonic_round_trip() {
        let store = MemoryStore::new();

        assert!(!store.has_data().await.unwrap());
        assert_eq!(store.load_mnemonic().await.unwrap(), None);

        store.save_mnemonic("zoo zoo zoo").await.unwrap();
        assert_eq!(
            store.load_mnemonic().await.unwrap(),
            Some("zoo zoo zoo".to_string())
        );
        assert!(store.has_data().await.unwrap());

        store.delete_mnemonic().await.unwrap();
        assert_eq!(store.load_mnemonic().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_seed_round_trip() {
        let store = MemoryStore::new();
        let seed = [7u8; 64];

        store.save_seed(&seed).await.unwrap();
        assert_eq!(store.load_seed().await.unwrap(), Some(seed));

        store.clear_all().await.unwrap();
        assert_eq!(store.load_seed().await.unwrap(), None);
        assert!(!store.has_data().await.unwrap());
    }
}
