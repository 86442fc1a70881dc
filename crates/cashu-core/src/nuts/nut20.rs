//! NUT-20: Signature on Mint Quote
//!
//! <https://github.com/cashubtc/nuts/blob/main/20.md>

use std::str::FromStr;

use bitcoin::secp256k1::schnorr::Signature;
use thiserror::Error;

use super::nut00::BlindedMessage;
use super::nut01::{PublicKey, SecretKey};
use super::nut04::MintRequest;

/// Nut20 Error
#[derive(Debug, Error)]
pub enum Error {
    /// Signature not provided
    #[error("Signature not provided")]
    SignatureMissing,
    /// Quote signature invalid
    #[error("Quote signature invalid signature")]
    InvalidSignature,
    /// Nut01 error
    #[error(transparent)]
    NUT01(#[from] super::nut01::Error),
}

/// Construct the NUT-20 message: `quote_id || B_0 || ... || B_n`, each
/// component as UTF-8 bytes with the blinded secrets hex-encoded
pub fn msg_to_sign(quote: &str, outputs: &[BlindedMessage]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(quote.len() + outputs.len() * 66);
    msg.extend_from_slice(quote.as_bytes());
    for output in outputs {
        msg.extend_from_slice(output.blinded_secret.to_hex().as_bytes());
    }
    msg
}

/// Sign a mint request with the quote's locking key
pub fn sign_mint_request(
    secret_key: &SecretKey,
    quote: &str,
    outputs: &[BlindedMessage],
) -> Result<String, Error> {
    let msg = msg_to_sign(quote, outputs);

    let signature: Signature = secret_key.sign(&msg)?;

    Ok(signature.to_string())
}

impl MintRequest {
    /// Verify the NUT-20 signature on this request
    pub fn verify_signature(&self, pubkey: PublicKey) -> Result<(), Error> {
        let signature = self.signature.as_ref().ok_or(Error::SignatureMissing)?;

        let signature = Signature::from_str(signature).map_err(|_| Error::InvalidSignature)?;

        let msg = msg_to_sign(&self.quote, &self.outputs);

        pubkey.verify(&msg, &signature)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{"quote":"9d745270-1405-46de-b5c5-e2762b4f5e00","outputs":[{"amount":1,"id":"00456a94ab4e1c46","B_":"0342e5bcc77f5b2a3c2afb40bb591a1e27da83cddc968abdc0ec4904201a201834"},{"amount":1,"id":"00456a94ab4e1c46","B_":"032fd3c4dc49a2844a89998d5e9d5b0f0b00dde9310063acb8a92e2fdafa4126d4"},{"amount":1,"id":"00456a94ab4e1c46","B_":"033b6fde50b6a0dfe61ad148fff167ad9cf8308ded5f6f6b2fe000a036c464c311"},{"amount":1,"id":"00456a94ab4e1c46","B_":"02be5a55f03e5c0aaea77595d574bce92c6d57a2a0fb2b5955c0b87e4520e06b53"},{"amount":1,"id":"00456a94ab4e1c46","B_":"02209fc2873f28521cbdde7f7b3bb1521002463f5979686fd156f23fe6a8aa2b79"}]}"#;

    #[test]
    fn test_msg_to_sign() {
        let request: MintRequest = serde_json::from_str(REQUEST).unwrap();

        let expected = "9d745270-1405-46de-b5c5-e2762b4f5e000342e5bcc77f5b2a3c2afb40bb591a1e27da83cddc968abdc0ec4904201a201834032fd3c4dc49a2844a89998d5e9d5b0f0b00dde9310063acb8a92e2fdafa4126d4033b6fde50b6a0dfe61ad148fff167ad9cf8308ded5f6f6b2fe000a036c464c31102be5a55f03e5c0aaea77595d574bce92c6d57a2a0fb2b5955c0b87e4520e06b5302209fc2873f28521cbdde7f7b3bb1521002463f5979686fd156f23fe6a8aa2b79";

        assert_eq!(
            msg_to_sign(&request.quote, &request.outputs),
            expected.as_bytes()
        );
    }

    #[test]
    fn test_valid_signature() {
        let pubkey = PublicKey::from_hex(
            "03d56ce4e446a85bbdaa547b4ec2b073d40ff802831352b8272b7dd7a4de5a7cac",
        )
        .unwrap();

        let mut request: MintRequest = serde_json::from_str(REQUEST).unwrap();
        request.signature = Some("d4b386f21f7aa7172f0994ee6e4dd966539484247ea71c99b81b8e09b1bb2acbc0026a43c221fd773471dc30d6a32b04692e6837ddaccf0830a63128308e4ee0".to_string());

        assert!(request.verify_signature(pubkey).is_ok());
    }

    #[test]
    fn test_sign_and_verify() {
        let mut request: MintRequest = serde_json::from_str(REQUEST).unwrap();

        let secret =
            SecretKey::from_hex("50d7fd7aa2b2fe4607f41f4ce6f8794fc184dd47b8cdfbe4b3d1249aa02d35aa")
                .unwrap();

        request.sign(secret.clone()).unwrap();

        assert!(request.verify_signature(secret.public_key()).is_ok());
    }

    #[test]
    fn test_invalid_signature() {
        let pubkey = PublicKey::from_hex(
            "03d56ce4e446a85bbdaa547b4ec2b073d40ff802831352b8272b7dd7a4de5a7cac",
        )
        .unwrap();

        let mut request: MintRequest = serde_json::from_str(REQUEST).unwrap();
        request.signature = Some("cb2b8e7ea69362dfe2a07093f2bbc319226db33db2ef686c940b5ec976bcbfc78df0cd35b3e998adf437b09ee2c950bd66dfe9eb64abd706e43ebc7c669c36c3".to_string());

        // Signature over a different message, verification must fail
        assert!(request.verify_signature(pubkey).is_err());
    }
}
