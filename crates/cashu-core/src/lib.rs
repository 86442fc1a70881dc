//! Cashu protocol models and cryptography.
//!
//! Shared foundation for the wallet crate: amounts, secrets, mint URLs, the
//! blinded Diffie-Hellman key exchange, the NUT request/response types and the
//! `cashuA`/`cashuB` token codec.

pub mod amount;
pub mod dhke;
pub mod error;
pub mod mint_url;
pub mod nuts;
pub mod secret;
pub mod sensitive;
pub mod util;

pub use lightning_invoice::{self, Bolt11Invoice};

pub use self::amount::Amount;
pub use self::error::Error;
pub use self::mint_url::MintUrl;
pub use self::nuts::*;
pub use self::util::SECP256K1;

#[doc(hidden)]
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
