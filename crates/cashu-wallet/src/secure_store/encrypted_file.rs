//! Envelope-encrypted file store
//!
//! Every record is sealed with AES-256-GCM under a key derived from the user
//! passphrase with PBKDF2-HMAC-SHA256 (200k iterations). A fresh 12-byte
//! nonce is drawn per write and the record kind is bound as associated data,
//! so records cannot be swapped for one another inside the file.

use std::collections::HashMap;
use std::path::PathBuf;

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use async_trait::async_trait;
use cashu_core::nuts::{Id, Proof};
use cashu_core::sensitive::SensitiveBytes;
use cashu_core::util::hex;
use cashu_core::MintUrl;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::sync::Mutex;

use super::{RecordKind, SecureStore};
use crate::error::Error;

const PBKDF2_ITERATIONS: u32 = 200_000;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileContents {
    salt: String,
    records: HashMap<String, SealedRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealedRecord {
    kind: String,
    nonce: String,
    ciphertext: String,
}

/// File-backed [`SecureStore`] with AES-GCM envelope encryption
pub struct EncryptedFileStore {
    path: PathBuf,
    key: SensitiveBytes,
    lock: Mutex<()>,
}

impl std::fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EncryptedFileStore {
    /// Open or create the store at `path`, deriving the envelope key from
    /// `passphrase`
    pub fn open(path: PathBuf, passphrase: &str) -> Result<Self, Error> {
        let salt = match Self::read_file(&path)? {
            Some(contents) => hex::decode(&contents.salt).map_err(|_| {
                Error::Storage("Secure store salt is not valid hex".to_string())
            })?,
            None => {
                let mut salt = vec![0u8; SALT_LEN];
                rand::thread_rng().fill_bytes(&mut salt);

                let contents = FileContents {
                    salt: hex::encode(&salt),
                    records: HashMap::new(),
                };
                Self::write_file(&path, &contents)?;
                salt
            }
        };

        let mut key = vec![0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            passphrase.as_bytes(),
            &salt,
            PBKDF2_ITERATIONS,
            &mut key,
        );

        Ok(Self {
            path,
            key: SensitiveBytes::new(key),
            lock: Mutex::new(()),
        })
    }

    fn read_file(path: &PathBuf) -> Result<Option<FileContents>, Error> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Storage(format!("Secure store corrupt: {e}")))?,
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    fn write_file(path: &PathBuf, contents: &FileContents) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }

        let bytes =
            serde_json::to_vec(contents).map_err(|e| Error::Storage(e.to_string()))?;
        std::fs::write(path, bytes).map_err(|e| Error::Storage(e.to_string()))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_slice()))
    }

    fn seal(&self, kind: RecordKind, plaintext: &[u8]) -> Result<SealedRecord, Error> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: kind.as_str().as_bytes(),
                },
            )
            .map_err(|_| Error::Storage("Encryption failed".to_string()))?;

        Ok(SealedRecord {
            kind: kind.as_str().to_string(),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        })
    }

    fn unseal(&self, kind: RecordKind, record: &SealedRecord) -> Result<Vec<u8>, Error> {
        let nonce_bytes = hex::decode(&record.nonce)
            .map_err(|_| Error::Storage("Secure store nonce is not valid hex".to_string()))?;
        let ciphertext = hex::decode(&record.ciphertext)
            .map_err(|_| Error::Storage("Secure store record is not valid hex".to_string()))?;

        self.cipher()
            .decrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &ciphertext,
                    aad: kind.as_str().as_bytes(),
                },
            )
            .map_err(|_| Error::Storage("Decryption failed; wrong passphrase?".to_string()))
    }

    async fn put(&self, key: String, kind: RecordKind, plaintext: &[u8]) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        let mut contents = Self::read_file(&self.path)?.unwrap_or_default();
        contents.records.insert(key, self.seal(kind, plaintext)?);
        Self::write_file(&self.path, &contents)
    }

    async fn get(&self, key: &str, kind: RecordKind) -> Result<Option<Vec<u8>>, Error> {
        let _guard = self.lock.lock().await;

        let contents = match Self::read_file(&self.path)? {
            Some(contents) => contents,
            None => return Ok(None),
        };

        match contents.records.get(key) {
            Some(record) => Ok(Some(self.unseal(kind, record)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        if let Some(mut contents) = Self::read_file(&self.path)? {
            contents.records.remove(key);
            Self::write_file(&self.path, &contents)?;
        }

        Ok(())
    }

    fn access_token_key(mint_url: &MintUrl) -> String {
        format!("access_token:{mint_url}")
    }

    fn access_proofs_key(mint_url: &MintUrl) -> String {
        format!("access_proofs:{mint_url}")
    }
}

#[async_trait]
impl SecureStore for EncryptedFileStore {
    async fn save_mnemonic(&self, mnemonic: &str) -> Result<(), Error> {
        self.put(
            "mnemonic".to_string(),
            RecordKind::Mnemonic,
            mnemonic.as_bytes(),
        )
        .await
    }

    async fn load_mnemonic(&self) -> Result<Option<String>, Error> {
        match self.get("mnemonic", RecordKind::Mnemonic).await? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes).map_err(|_| {
                Error::Storage("Stored mnemonic is not UTF-8".to_string())
            })?)),
            None => Ok(None),
        }
    }

    async fn delete_mnemonic(&self) -> Result<(), Error> {
        self.remove("mnemonic").await
    }

    async fn save_seed(&self, seed: &[u8; 64]) -> Result<(), Error> {
        self.put("seed".to_string(), RecordKind::Seed, seed.as_slice())
            .await
    }

    async fn load_seed(&self) -> Result<Option<[u8; 64]>, Error> {
        match self.get("seed", RecordKind::Seed).await? {
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
        self.remove("seed").await
    }

    async fn save_access_token(&self, mint_url: &MintUrl, token: &str) -> Result<(), Error> {
        self.put(
            Self::access_token_key(mint_url),
            RecordKind::AccessToken,
            token.as_bytes(),
        )
        .await
    }

    async fn load_access_token(&self, mint_url: &MintUrl) -> Result<Option<String>, Error> {
        match self
            .get(&Self::access_token_key(mint_url), RecordKind::AccessToken)
            .await?
        {
            Some(bytes) => Ok(Some(String::from_utf8(bytes).map_err(|_| {
                Error::Storage("Stored access token is not UTF-8".to_string())
            })?)),
            None => Ok(None),
        }
    }

    async fn delete_access_token(&self, mint_url: &MintUrl) -> Result<(), Error> {
        self.remove(&Self::access_token_key(mint_url)).await
    }

    async fn save_access_proofs(&self, mint_url: &MintUrl, proofs: &[Proof]) -> Result<(), Error> {
        let json = serde_json::to_vec(proofs)?;
        self.put(
            Self::access_proofs_key(mint_url),
            RecordKind::AccessProofs,
            &json,
        )
        .await
    }

    async fn load_access_proofs(&self, mint_url: &MintUrl) -> Result<Vec<Proof>, Error> {
        match self
            .get(&Self::access_proofs_key(mint_url), RecordKind::AccessProofs)
            .await?
        {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_counters(&self, counters: &HashMap<Id, u32>) -> Result<(), Error> {
        let table: HashMap<String, u32> = counters
            .iter()
            .map(|(id, count)| (id.to_string(), *count))
            .collect();
        let json = serde_json::to_vec(&table)?;
        self.put("counters".to_string(), RecordKind::Counters, &json)
            .await
    }

    async fn load_counters(&self) -> Result<HashMap<Id, u32>, Error> {
        use std::str::FromStr;

        match self.get("counters", RecordKind::Counters).await? {
            Some(bytes) => {
                let table: HashMap<String, u32> = serde_json::from_slice(&bytes)?;
                table
                    .into_iter()
                    .map(|(id, count)| {
                        Id::from_str(&id)
                            .map(|id| (id, count))
                            .map_err(Error::NUT02)
                    })
                    .collect()
            }
            None => Ok(HashMap::new()),
        }
    }

    async fn clear_all(&self) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        if let Some(mut contents) = Self::read_file(&self.path)? {
            contents.records.clear();
            Self::write_file(&self.path, &contents)?;
        }

        Ok(())
    }

    async fn has_data(&self) -> Result<bool, Error> {
        let _guard = self.lock.lock().await;

        Ok(Self::read_file(&self.path)?
            .map(|contents| !contents.records.is_empty())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(passphrase: &str) -> (tempfile::TempDir, EncryptedFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store =
            EncryptedFileStore::open(dir.path().join("wallet.store"), passphrase).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_round_trip_and_persistence() {
        let (dir, store) = temp_store("hunter2");

        store.save_mnemonic("zoo zoo zoo").await.unwrap();
        store.save_seed(&[9u8; 64]).await.unwrap();

        // Reopen with the same passphrase
        drop(store);
        let store =
            EncryptedFileStore::open(dir.path().join("wallet.store"), "hunter2").unwrap();

        assert_eq!(
            store.load_mnemonic().await.unwrap(),
            Some("zoo zoo zoo".to_string())
        );
        assert_eq!(store.load_seed().await.unwrap(), Some([9u8; 64]));
        assert!(store.has_data().await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_passphrase_fails() {
        let (dir, store) = temp_store("correct");

        store.save_mnemonic("zoo zoo zoo").await.unwrap();
        drop(store);

        let store =
            EncryptedFileStore::open(dir.path().join("wallet.store"), "wrong").unwrap();

        assert!(store.load_mnemonic().await.is_err());
    }

    #[tokio::test]
    async fn test_ciphertext_not_plaintext() {
        let (dir, store) = temp_store("hunter2");

        store.save_mnemonic("correct horse battery staple").await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("wallet.store")).unwrap();
        assert!(!raw.contains("correct horse battery staple"));
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (_dir, store) = temp_store("hunter2");

        store.save_mnemonic("zoo").await.unwrap();
        store
            .save_counters(&HashMap::from([(
                "009a1f293253e41e".parse().unwrap(),
                5u32,
            )]))
            .await
            .unwrap();

        store.clear_all().await.unwrap();
        assert!(!store.has_data().await.unwrap());
        assert_eq!(store.load_mnemonic().await.unwrap(), None);
        assert!(store.load_counters().await.unwrap().is_empty());
    }
}
