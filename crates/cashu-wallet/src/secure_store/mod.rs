//! Secure storage for wallet secrets
//!
//! Mnemonic, raw seed, access tokens and keyset counters go through the
//! [`SecureStore`] trait. Implementations are interchangeable: in-memory for
//! tests, an envelope-encrypted file for desktops, platform keychains behind
//! the same trait elsewhere.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use cashu_core::nuts::{Id, Proof};
use cashu_core::MintUrl;

use crate::error::Error;

pub mod encrypted_file;
pub mod memory;

pub use encrypted_file::EncryptedFileStore;
pub use memory::MemoryStore;

/// Record kinds, used as authenticated associated data by encrypting stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// BIP-39 mnemonic phrase
    Mnemonic,
    /// Raw 64-byte seed
    Seed,
    /// NUT-22 access token for a mint
    AccessToken,
    /// NUT-22 access-token proofs for a mint
    AccessProofs,
    /// Keyset counter snapshot
    Counters,
}

impl RecordKind {
    /// Stable name of the record kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mnemonic => "mnemonic",
            Self::Seed => "seed",
            Self::AccessToken => "access_token",
            Self::AccessProofs => "access_proofs",
            Self::Counters => "counters",
        }
    }
}

/// Secure storage trait
#[async_trait]
pub trait SecureStore: Debug + Send + Sync {
    /// Save the mnemonic phrase
    async fn save_mnemonic(&self, mnemonic: &str) -> Result<(), Error>;

    /// Load the mnemonic phrase
    async fn load_mnemonic(&self) -> Result<Option<String>, Error>;

    /// Delete the mnemonic phrase
    async fn delete_mnemonic(&self) -> Result<(), Error>;

    /// Save raw seed bytes
    async fn save_seed(&self, seed: &[u8; 64]) -> Result<(), Error>;

    /// Load raw seed bytes
    async fn load_seed(&self) -> Result<Option<[u8; 64]>, Error>;

    /// Delete raw seed bytes
    async fn delete_seed(&self) -> Result<(), Error>;

    /// Save the access token for a mint
    async fn save_access_token(&self, mint_url: &MintUrl, token: &str) -> Result<(), Error>;

    /// Load the access token for a mint
    async fn load_access_token(&self, mint_url: &MintUrl) -> Result<Option<String>, Error>;

    /// Delete the access token for a mint
    async fn delete_access_token(&self, mint_url: &MintUrl) -> Result<(), Error>;

    /// Save the access-token proofs for a mint
    async fn save_access_proofs(&self, mint_url: &MintUrl, proofs: &[Proof]) -> Result<(), Error>;

    /// Load the access-token proofs for a mint
    async fn load_access_proofs(&self, mint_url: &MintUrl) -> Result<Vec<Proof>, Error>;

    /// Save the keyset counter table
    async fn save_counters(&self, counters: &HashMap<Id, u32>) -> Result<(), Error>;

    /// Load the keyset counter table
    async fn load_counters(&self) -> Result<HashMap<Id, u32>, Error>;

    /// Remove everything
    async fn clear_all(&self) -> Result<(), Error>;

    /// Whether any record exists
    async fn has_data(&self) -> Result<bool, Error>;
}
