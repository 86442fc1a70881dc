//! Wallet
//!
//! One [`Wallet`] owns its proof store and talks to one mint in one unit.
//! All mutating operations are serialized through an internal lock; callers
//! may share the wallet freely behind an `Arc` and submit operations
//! concurrently, which are then applied in arrival order.

use std::str::FromStr;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use bip39::Mnemonic;
use cashu_core::nuts::CurrencyUnit;
use cashu_core::MintUrl;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use crate::client::{HttpClient, MintConnector};
use crate::database::{WalletDatabase, WalletMemoryDatabase};
use crate::error::Error;
use crate::policy::{NetworkPolicy, PolicyConfig, RetryPolicy};
use crate::secure_store::{MemoryStore, SecureStore};
use crate::seed;

pub mod balance;
pub mod issue;
pub mod keysets;
pub mod melt;
pub mod proofs;
pub mod receive;
pub mod restore;
pub mod send;
pub mod state;
pub mod swap;

pub use melt::{multi_path_melt, MeltPlan};
pub use receive::ReceiveOptions;
pub use send::PreparedSend;
pub use state::{WalletEvent, WalletState};

/// Configuration recognized by the wallet
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Mint url. Must be an absolute https URL unless `allow_insecure_mint`
    /// is set.
    pub mint_url: String,
    /// Currency unit, default sat
    pub unit: CurrencyUnit,
    /// Permit http mints; meant for local development only
    pub allow_insecure_mint: bool,
    /// Bounded retry attempts
    pub retry_attempts: u32,
    /// Base backoff delay
    pub retry_base_delay: Duration,
    /// Jitter upper bound added to each backoff
    pub retry_jitter: Duration,
    /// Rate limit per endpoint
    pub rate_limit_per_minute: u32,
    /// Rate limit burst capacity
    pub rate_limit_burst: u32,
    /// Consecutive failures before the breaker opens
    pub breaker_failure_threshold: u32,
    /// Breaker cooldown
    pub breaker_cooldown: Duration,
    /// How long cached keysets stay fresh
    pub keyset_cache_ttl: Duration,
    /// Counters scanned per restore batch
    pub restoration_batch_size: u32,
    /// Empty batches after which the restore scan stops
    pub restoration_stop_after_empty_batches: u32,
    /// BIP-39 passphrase
    pub passphrase: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            mint_url: String::new(),
            unit: CurrencyUnit::Sat,
            allow_insecure_mint: false,
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(200),
            retry_jitter: Duration::from_millis(50),
            rate_limit_per_minute: 60,
            rate_limit_burst: 10,
            breaker_failure_threshold: 5,
            breaker_cooldown: Duration::from_secs(30),
            keyset_cache_ttl: Duration::from_secs(2 * 60 * 60),
            restoration_batch_size: 100,
            restoration_stop_after_empty_batches: 3,
            passphrase: String::new(),
        }
    }
}

impl WalletConfig {
    fn policy_config(&self) -> PolicyConfig {
        PolicyConfig {
            rate_limit_per_minute: self.rate_limit_per_minute,
            rate_limit_burst: self.rate_limit_burst,
            rate_limit_max_wait: Duration::from_secs(10),
            breaker_failure_threshold: self.breaker_failure_threshold,
            breaker_cooldown: self.breaker_cooldown,
            retry: RetryPolicy {
                max_attempts: self.retry_attempts,
                base_delay: self.retry_base_delay,
                jitter: self.retry_jitter,
            },
        }
    }
}

/// Cashu wallet against a single mint
pub struct Wallet {
    /// The wallet's mint
    pub mint_url: MintUrl,
    /// The wallet's unit
    pub unit: CurrencyUnit,
    pub(crate) localstore: Arc<dyn WalletDatabase>,
    pub(crate) secure_store: Arc<dyn SecureStore>,
    pub(crate) client: Arc<dyn MintConnector>,
    pub(crate) seed: Zeroizing<[u8; 64]>,
    pub(crate) config: WalletConfig,
    lifecycle: Arc<StdMutex<WalletState>>,
    op_lock: Arc<Mutex<()>>,
    pub(crate) keysets_fetched_at: Arc<Mutex<Option<tokio::time::Instant>>>,
    pub(crate) cancel: CancellationToken,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("mint_url", &self.mint_url)
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Current lifecycle state
    pub fn state(&self) -> WalletState {
        *self.lifecycle.lock().expect("lifecycle lock poisoned")
    }

    /// Apply a lifecycle event, rejecting invalid transitions
    pub fn apply_event(&self, event: WalletEvent) -> Result<WalletState, Error> {
        let mut state = self.lifecycle.lock().expect("lifecycle lock poisoned");
        *state = state.transition(event)?;
        Ok(*state)
    }

    /// Lock the wallet
    pub fn lock(&self) -> Result<(), Error> {
        self.apply_event(WalletEvent::Lock).map(|_| ())
    }

    /// Unlock the wallet
    pub fn unlock(&self) -> Result<(), Error> {
        self.apply_event(WalletEvent::Unlock).map(|_| ())
    }

    /// Request cancellation of in-flight operations. Operations detach at the
    /// next suspension point; signed promises are never dropped.
    pub fn cancel_all(&self) {
        self.cancel.cancel();
    }

    /// Shut the wallet down
    pub fn shutdown(&self) -> Result<(), Error> {
        self.cancel_all();
        self.apply_event(WalletEvent::Shutdown).map(|_| ())
    }

    /// Wipe the mnemonic, seed and access material from the secure store
    pub async fn wipe_secrets(&self) -> Result<(), Error> {
        self.secure_store.clear_all().await
    }

    /// Persist the NUT-22 access token for this mint
    pub async fn save_access_token(&self, token: &str) -> Result<(), Error> {
        self.secure_store
            .save_access_token(&self.mint_url, token)
            .await
    }

    /// Load the NUT-22 access token for this mint
    pub async fn access_token(&self) -> Result<Option<String>, Error> {
        self.secure_store.load_access_token(&self.mint_url).await
    }

    /// Persist the pool of single-use access-token proofs for this mint
    pub async fn save_access_proofs(
        &self,
        proofs: &[cashu_core::nuts::Proof],
    ) -> Result<(), Error> {
        self.secure_store
            .save_access_proofs(&self.mint_url, proofs)
            .await
    }

    pub(crate) fn ensure_not_cancelled(&self) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::InvalidWalletState("operation cancelled".to_string()));
        }
        Ok(())
    }

    /// Begin an operation: waits for the wallet to be free and moves the
    /// lifecycle to [`WalletState::Transacting`] until the guard drops
    pub(crate) async fn begin_op(&self) -> Result<OperationGuard<'_>, Error> {
        self.begin_op_kind(WalletEvent::BeginTransaction, WalletEvent::TransactionComplete)
            .await
    }

    pub(crate) async fn begin_op_kind(
        &self,
        begin: WalletEvent,
        complete: WalletEvent,
    ) -> Result<OperationGuard<'_>, Error> {
        let permit = Arc::clone(&self.op_lock).lock_owned().await;

        self.apply_event(begin)?;

        Ok(OperationGuard {
            wallet: self,
            _permit: permit,
            complete_event: complete,
        })
    }
}

/// Holds the wallet in a busy lifecycle state for the duration of an
/// operation; restores it on drop so error paths cannot wedge the machine
pub(crate) struct OperationGuard<'a> {
    wallet: &'a Wallet,
    _permit: tokio::sync::OwnedMutexGuard<()>,
    complete_event: WalletEvent,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        let _ = self.wallet.apply_event(self.complete_event);
    }
}

/// Builder for [`Wallet`]
#[derive(Default)]
pub struct WalletBuilder {
    config: WalletConfig,
    mnemonic: Option<Mnemonic>,
    localstore: Option<Arc<dyn WalletDatabase>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    client: Option<Arc<dyn MintConnector>>,
    policy: Option<Arc<NetworkPolicy>>,
}

impl std::fmt::Debug for WalletBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WalletBuilder {
    /// Start building a wallet for `mint_url`
    pub fn new(mint_url: &str) -> Self {
        Self {
            config: WalletConfig {
                mint_url: mint_url.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: WalletConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the unit
    pub fn unit(mut self, unit: CurrencyUnit) -> Self {
        self.config.unit = unit;
        self
    }

    /// Permit an http mint (local development)
    pub fn allow_insecure_mint(mut self) -> Self {
        self.config.allow_insecure_mint = true;
        self
    }

    /// Set the mnemonic the seed derives from
    pub fn mnemonic(mut self, mnemonic: Mnemonic) -> Self {
        self.mnemonic = Some(mnemonic);
        self
    }

    /// Supply the proof database
    pub fn localstore(mut self, localstore: Arc<dyn WalletDatabase>) -> Self {
        self.localstore = Some(localstore);
        self
    }

    /// Supply the secure store
    pub fn secure_store(mut self, secure_store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(secure_store);
        self
    }

    /// Supply a custom mint connector (tests, proxies)
    pub fn client(mut self, client: Arc<dyn MintConnector>) -> Self {
        self.client = Some(client);
        self
    }

    /// Share a networking policy registry between wallets
    pub fn policy(mut self, policy: Arc<NetworkPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the wallet, validate configuration and persist the mnemonic
    pub async fn build(self) -> Result<Wallet, Error> {
        let mint_url = MintUrl::from_str(&self.config.mint_url)?;

        if !mint_url.is_https() && !self.config.allow_insecure_mint {
            return Err(Error::ValidationFailed(
                "mint_url must use https".to_string(),
            ));
        }

        let secure_store: Arc<dyn SecureStore> = self
            .secure_store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        // Resolve the mnemonic: supplied, persisted, or freshly generated
        let mnemonic = match self.mnemonic {
            Some(mnemonic) => mnemonic,
            None => match secure_store.load_mnemonic().await? {
                Some(phrase) => seed::parse_mnemonic(&phrase)?,
                None => seed::generate_mnemonic(128)?,
            },
        };

        secure_store.save_mnemonic(&mnemonic.to_string()).await?;

        let seed_bytes = seed::seed_from_mnemonic(&mnemonic, &self.config.passphrase);
        secure_store.save_seed(&seed_bytes).await?;

        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(NetworkPolicy::new(self.config.policy_config())));

        let client: Arc<dyn MintConnector> = match self.client {
            Some(client) => client,
            None => Arc::new(HttpClient::new(mint_url.clone(), policy)),
        };

        let localstore = self
            .localstore
            .unwrap_or_else(|| Arc::new(WalletMemoryDatabase::new()));

        let wallet = Wallet {
            mint_url,
            unit: self.config.unit.clone(),
            localstore,
            secure_store,
            client,
            seed: seed_bytes,
            config: self.config,
            lifecycle: Arc::new(StdMutex::new(WalletState::Initializing)),
            op_lock: Arc::new(Mutex::new(())),
            keysets_fetched_at: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
        };

        wallet.apply_event(WalletEvent::InitializeComplete)?;

        Ok(wallet)
    }
}
