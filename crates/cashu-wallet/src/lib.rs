//! Cashu wallet core.
//!
//! Holds proofs blind-signed by a mint and mediates the wallet operations
//! against it: mint, melt, swap, send and receive. Storage and transport are
//! trait boundaries; concrete backends are supplied at construction.

pub mod client;
pub mod database;
pub mod error;
pub mod fees;
pub mod policy;
pub mod secure_store;
pub mod seed;
pub mod types;
pub mod wallet;

pub use cashu_core::amount::SplitTarget;
pub use cashu_core::{self as cashu, Amount, Bolt11Invoice, MintUrl};

pub use self::client::{HttpClient, MintConnector};
pub use self::database::WalletDatabase;
pub use self::error::Error;
pub use self::secure_store::SecureStore;
pub use self::types::{Melted, MintQuote, ProofInfo};
pub use self::wallet::{Wallet, WalletBuilder, WalletConfig};

/// Wallet result type
pub type Result<T, E = Error> = std::result::Result<T, E>;
