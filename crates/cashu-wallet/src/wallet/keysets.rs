//! Keyset cache
//!
//! Keysets are fetched once and cached until the TTL lapses or an operation
//! invalidates them. Every fetched keyset has its id recomputed from the keys
//! before it is trusted; a mismatch is rejected.

use std::collections::HashMap;

use cashu_core::nuts::{Id, KeySet, KeySetInfo, Keys};
use tracing::instrument;

use super::Wallet;
use crate::error::Error;

impl Wallet {
    /// Refresh the cached keysets from the mint if the cache is stale
    #[instrument(skip(self))]
    pub async fn refresh_keysets(&self) -> Result<Vec<KeySetInfo>, Error> {
        {
            let fetched_at = self.keysets_fetched_at.lock().await;
            if let Some(at) = *fetched_at {
                if at.elapsed() < self.config.keyset_cache_ttl {
                    if let Some(keysets) = self.localstore.get_keysets(&self.mint_url).await? {
                        return Ok(keysets);
                    }
                }
            }
        }

        self.fetch_keysets().await
    }

    /// Fetch keysets from the mint unconditionally and refresh the cache
    #[instrument(skip(self))]
    pub async fn fetch_keysets(&self) -> Result<Vec<KeySetInfo>, Error> {
        let response = self.client.get_mint_keysets().await?;

        let keysets: Vec<KeySetInfo> = response
            .keysets
            .into_iter()
            .filter(|keyset| keyset.unit == self.unit)
            .collect();

        self.localstore
            .add_keysets(self.mint_url.clone(), keysets.clone())
            .await?;

        *self.keysets_fetched_at.lock().await = Some(tokio::time::Instant::now());

        Ok(keysets)
    }

    /// Drop the TTL so the next use refetches
    pub async fn invalidate_keyset_cache(&self) {
        *self.keysets_fetched_at.lock().await = None;
    }

    /// The active keyset new outputs are produced under: active, matching
    /// unit, lowest input fee
    #[instrument(skip(self))]
    pub async fn active_keyset(&self) -> Result<KeySetInfo, Error> {
        let keysets = self.refresh_keysets().await?;

        keysets
            .into_iter()
            .filter(|k| k.active && k.unit == self.unit)
            .min_by_key(|k| k.input_fee_ppk)
            .ok_or(Error::NoActiveKeyset)
    }

    /// Get the keys of a keyset, fetching and verifying them on cache miss
    #[instrument(skip(self))]
    pub async fn load_keyset_keys(&self, keyset_id: Id) -> Result<Keys, Error> {
        if let Some(keys) = self.localstore.get_keys(&keyset_id).await? {
            return Ok(keys);
        }

        let keyset = self.client.get_keyset_keys(keyset_id).await?;

        verify_keyset(&keyset)?;

        self.localstore.add_keys(keyset.clone()).await?;

        Ok(keyset.keys)
    }

    /// Fee table for the keysets of this mint
    pub(crate) async fn keyset_fees(&self) -> Result<HashMap<Id, u64>, Error> {
        Ok(self
            .refresh_keysets()
            .await?
            .into_iter()
            .map(|keyset| (keyset.id, keyset.input_fee_ppk))
            .collect())
    }
}

/// Validate a fetched keyset: recompute the id and check every key decodes
/// to a compressed point on a power-of-two amount
pub(crate) fn verify_keyset(keyset: &KeySet) -> Result<(), Error> {
    if !keyset.verify_id() {
        return Err(Error::InvalidKeysetId(keyset.id));
    }

    for (amount, _key) in keyset.keys.iter() {
        let amount = u64::from(*amount);
        if amount == 0 || !amount.is_power_of_two() {
            return Err(Error::InvalidDenomination);
        }
    }

    // Key validity itself is enforced by the PublicKey type: only 33-byte
    // compressed encodings that decode to curve points deserialize

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use cashu_core::nuts::CurrencyUnit;

    use super::*;

    const SHORT_KEYSET: &str = r#"
        {
            "1":"03a40f20667ed53513075dc51e715ff2046cad64eb68960632269ba7f0210e38bc",
            "2":"03fd4ce5a16b65576145949e6f99f445f8249fee17c606b688b504a849cdc452de",
            "4":"02648eccfa4c026960966276fa5a4cae46ce0fd432211a4f449bf84f13aa5f8303",
            "8":"02fdfd6796bfeac490cbee12f778f867f0a2c68f6508d17c649759ea0dc3547528"
        }
    "#;

    #[test]
    fn test_verify_keyset_accepts_valid() {
        let keys: Keys = serde_json::from_str(SHORT_KEYSET).unwrap();
        let keyset = KeySet {
            id: Id::from(&keys),
            unit: CurrencyUnit::Sat,
            keys,
        };

        assert!(verify_keyset(&keyset).is_ok());
    }

    #[test]
    fn test_verify_keyset_rejects_wrong_id() {
        let keys: Keys = serde_json::from_str(SHORT_KEYSET).unwrap();
        let keyset = KeySet {
            id: Id::from_str("00deadbeef123456").unwrap(),
            unit: CurrencyUnit::Sat,
            keys,
        };

        assert!(matches!(
            verify_keyset(&keyset),
            Err(Error::InvalidKeysetId(_))
        ));
    }

    #[test]
    fn test_verify_keyset_rejects_non_power_of_two() {
        let keys_json = r#"
        {
            "3":"03a40f20667ed53513075dc51e715ff2046cad64eb68960632269ba7f0210e38bc"
        }"#;
        let keys: Keys = serde_json::from_str(keys_json).unwrap();
        let keyset = KeySet {
            id: Id::from(&keys),
            unit: CurrencyUnit::Sat,
            keys,
        };

        assert!(matches!(
            verify_keyset(&keyset),
            Err(Error::InvalidDenomination)
        ));
    }
}
