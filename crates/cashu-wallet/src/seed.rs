//! Mnemonic and seed handling
//!
//! The mnemonic is the only recoverable secret the wallet holds. Seed bytes
//! live in wipe-on-drop buffers.

use bip39::Mnemonic;
use cashu_core::sensitive::SensitiveBytes;
use zeroize::Zeroizing;

use crate::error::Error;

/// Supported entropy strengths, in bits, and the word counts they map to
pub const STRENGTHS: [(usize, usize); 5] = [(128, 12), (160, 15), (192, 18), (224, 21), (256, 24)];

/// Generate a new mnemonic with the given entropy strength in bits
pub fn generate_mnemonic(strength_bits: usize) -> Result<Mnemonic, Error> {
    if !STRENGTHS.iter().any(|(bits, _)| *bits == strength_bits) {
        return Err(Error::InvalidMnemonic);
    }

    let word_count = strength_bits * 3 / 32;
    Ok(Mnemonic::generate(word_count).map_err(|_| Error::InvalidMnemonic)?)
}

/// Parse and validate a mnemonic phrase
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, Error> {
    Ok(Mnemonic::parse(phrase).map_err(|_| Error::InvalidMnemonic)?)
}

/// Derive the 64-byte wallet seed from a mnemonic and optional passphrase
pub fn seed_from_mnemonic(mnemonic: &Mnemonic, passphrase: &str) -> Zeroizing<[u8; 64]> {
    Zeroizing::new(mnemonic.to_seed(passphrase))
}

/// Wrap seed bytes for persistence through the secure store
pub fn seed_to_sensitive(seed: &[u8; 64]) -> SensitiveBytes {
    SensitiveBytes::from(seed.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_strengths() {
        for (bits, words) in STRENGTHS {
            let mnemonic = generate_mnemonic(bits).unwrap();
            assert_eq!(mnemonic.word_count(), words);
        }

        assert!(generate_mnemonic(100).is_err());
    }

    #[test]
    fn test_parse_known_mnemonic() {
        let phrase = "half depart obvious quality work element tank gorilla view sugar picture humble";
        let mnemonic = parse_mnemonic(phrase).unwrap();
        assert_eq!(mnemonic.word_count(), 12);

        assert!(parse_mnemonic("not a real mnemonic phrase at all zero zero").is_err());
    }

    #[test]
    fn test_seed_derivation_with_passphrase() {
        let phrase = "half depart obvious quality work element tank gorilla view sugar picture humble";
        let mnemonic = parse_mnemonic(phrase).unwrap();

        let plain = seed_from_mnemonic(&mnemonic, "");
        let passworded = seed_from_mnemonic(&mnemonic, "hunter2");

        assert_ne!(plain.as_slice(), passworded.as_slice());
        assert_eq!(plain.len(), 64);
    }

    #[test]
    fn test_checksum_rejected() {
        // Last word carries the checksum; swapping it breaks validation
        let phrase =
            "half depart obvious quality work element tank gorilla view sugar picture abandon";
        assert!(parse_mnemonic(phrase).is_err());
    }
}
