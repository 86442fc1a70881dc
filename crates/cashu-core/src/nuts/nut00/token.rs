//! Cashu Token serialization
//!
//! `cashuA` carries base64url JSON (V3), `cashuB` carries base64url CBOR
//! (V4). Decoding auto-detects on the prefix; the optional `cashu:` URI form
//! parses identically.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bitcoin::base64::engine::{general_purpose, GeneralPurpose};
use bitcoin::base64::{alphabet, Engine as _};
use serde::{Deserialize, Serialize};

use super::{Error, Proof, Proofs, Witness};
use crate::ensure;
use crate::mint_url::MintUrl;
use crate::nuts::nut12::ProofDleq;
use crate::nuts::{CurrencyUnit, Id};
use crate::secret::Secret;
use crate::Amount;

fn base64_decode(s: &str) -> Result<Vec<u8>, Error> {
    // Tokens circulate both with and without padding; accept either
    let decode_config = general_purpose::GeneralPurposeConfig::new()
        .with_decode_padding_mode(bitcoin::base64::engine::DecodePaddingMode::Indifferent);
    Ok(GeneralPurpose::new(&alphabet::URL_SAFE, decode_config).decode(s)?)
}

/// Token Enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    /// Token V3
    TokenV3(TokenV3),
    /// Token V4
    TokenV4(TokenV4),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::TokenV3(token) => token.to_string(),
            Self::TokenV4(token) => token.to_string(),
        };

        write!(f, "{token}")
    }
}

impl Token {
    /// Create a new [`Token`] in the V4 encoding
    pub fn new(
        mint_url: MintUrl,
        proofs: Proofs,
        memo: Option<String>,
        unit: CurrencyUnit,
    ) -> Self {
        let mut grouped: Vec<TokenV4Token> = Vec::new();
        let mut index: HashMap<Id, usize> = HashMap::new();

        // Group by keyset preserving first-seen order
        for proof in proofs {
            match index.get(&proof.keyset_id) {
                Some(i) => grouped[*i].proofs.push(proof.into()),
                None => {
                    index.insert(proof.keyset_id, grouped.len());
                    grouped.push(TokenV4Token::new(proof.keyset_id, vec![proof]));
                }
            }
        }

        Token::TokenV4(TokenV4 {
            mint_url,
            unit,
            memo,
            token: grouped,
        })
    }

    /// Proofs in [`Token`]
    pub fn proofs(&self) -> Proofs {
        match self {
            Self::TokenV3(token) => token.proofs(),
            Self::TokenV4(token) => token.proofs(),
        }
    }

    /// Total value of [`Token`]
    pub fn value(&self) -> Result<Amount, Error> {
        match self {
            Self::TokenV3(token) => token.value(),
            Self::TokenV4(token) => token.value(),
        }
    }

    /// [`Token`] memo
    pub fn memo(&self) -> &Option<String> {
        match self {
            Self::TokenV3(token) => &token.memo,
            Self::TokenV4(token) => &token.memo,
        }
    }

    /// Unit
    pub fn unit(&self) -> Option<CurrencyUnit> {
        match self {
            Self::TokenV3(token) => token.unit.clone(),
            Self::TokenV4(token) => Some(token.unit.clone()),
        }
    }

    /// Mint url
    pub fn mint_url(&self) -> Result<MintUrl, Error> {
        match self {
            Self::TokenV3(token) => {
                let mint_urls = token.mint_urls();

                ensure!(mint_urls.len() == 1, Error::UnsupportedToken);

                mint_urls.first().ok_or(Error::UnsupportedToken).cloned()
            }
            Self::TokenV4(token) => Ok(token.mint_url.clone()),
        }
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Optional URI form
        let s = s.strip_prefix("cashu:").unwrap_or(s);

        let (is_v3, s) = match (s.strip_prefix("cashuA"), s.strip_prefix("cashuB")) {
            (Some(s), None) => (true, s),
            (None, Some(s)) => (false, s),
            _ => return Err(Error::UnsupportedToken),
        };

        let decoded = base64_decode(s)?;

        match is_v3 {
            true => {
                let decoded_str = String::from_utf8(decoded)?;
                let token: TokenV3 = serde_json::from_str(&decoded_str)?;
                Ok(Token::TokenV3(token))
            }
            false => {
                let token: TokenV4 = ciborium::from_reader(&decoded[..])?;
                Ok(Token::TokenV4(token))
            }
        }
    }
}

/// Proofs of a single mint within a V3 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenV3Token {
    /// Url of mint
    pub mint: MintUrl,
    /// Proofs
    pub proofs: Vec<ProofV3>,
}

impl TokenV3Token {
    /// Create new [`TokenV3Token`]
    pub fn new(mint_url: MintUrl, proofs: Proofs) -> Self {
        Self {
            mint: mint_url,
            proofs: proofs.into_iter().map(ProofV3::from).collect(),
        }
    }
}

/// Token V3 (`cashuA`, JSON)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenV3 {
    /// Proofs in [`Token`] by mint
    pub token: Vec<TokenV3Token>,
    /// Token unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<CurrencyUnit>,
    /// Memo for token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl TokenV3 {
    /// Create new [`TokenV3`]
    pub fn new(
        mint_url: MintUrl,
        proofs: Proofs,
        memo: Option<String>,
        unit: Option<CurrencyUnit>,
    ) -> Result<Self, Error> {
        ensure!(!proofs.is_empty(), Error::ProofsRequired);

        Ok(Self {
            token: vec![TokenV3Token::new(mint_url, proofs)],
            unit,
            memo,
        })
    }

    /// Proofs, in entry order
    pub fn proofs(&self) -> Proofs {
        self.token
            .iter()
            .flat_map(|t| t.proofs.iter().map(ProofV3::to_proof))
            .collect()
    }

    /// Value; errors if duplicate proofs are found
    pub fn value(&self) -> Result<Amount, Error> {
        let proofs: Vec<&ProofV3> = self.token.iter().flat_map(|t| t.proofs.iter()).collect();
        let unique_count = proofs
            .iter()
            .map(|p| &p.secret)
            .collect::<std::collections::HashSet<_>>()
            .len();

        if unique_count != proofs.len() {
            return Err(Error::DuplicateProofs);
        }

        Ok(Amount::try_sum(proofs.iter().map(|p| p.amount))?)
    }

    /// Mint urls of entries, in order
    pub fn mint_urls(&self) -> Vec<MintUrl> {
        self.token.iter().map(|t| t.mint.clone()).collect()
    }
}

impl FromStr for TokenV3 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("cashu:").unwrap_or(s);
        let s = s.strip_prefix("cashuA").ok_or(Error::UnsupportedToken)?;

        let decoded = base64_decode(s)?;
        let decoded_str = String::from_utf8(decoded)?;
        let token: TokenV3 = serde_json::from_str(&decoded_str)?;
        Ok(token)
    }
}

impl fmt::Display for TokenV3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json_string = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        let encoded = general_purpose::URL_SAFE_NO_PAD.encode(json_string);
        write!(f, "cashuA{encoded}")
    }
}

impl From<TokenV4> for TokenV3 {
    fn from(token: TokenV4) -> Self {
        let proofs: Vec<ProofV3> = token
            .token
            .into_iter()
            .flat_map(|entry| {
                entry.proofs.into_iter().map(move |p| ProofV3 {
                    amount: p.amount,
                    keyset_id: entry.keyset_id,
                    secret: p.secret,
                    c: p.c,
                    witness: p.witness,
                    dleq: p.dleq,
                })
            })
            .collect();

        let token_v3_token = TokenV3Token {
            mint: token.mint_url,
            proofs,
        };
        TokenV3 {
            token: vec![token_v3_token],
            unit: Some(token.unit),
            memo: token.memo,
        }
    }
}

/// Proof within a V3 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofV3 {
    /// Amount
    pub amount: Amount,
    /// Keyset id
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Secret message
    pub secret: Secret,
    /// Unblinded signature
    #[serde(rename = "C")]
    pub c: crate::nuts::nut01::PublicKey,
    /// Witness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
    /// DLEQ Proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dleq: Option<ProofDleq>,
}

impl ProofV3 {
    fn to_proof(&self) -> Proof {
        Proof {
            amount: self.amount,
            keyset_id: self.keyset_id,
            secret: self.secret.clone(),
            c: self.c,
            witness: self.witness.clone(),
            dleq: self.dleq.clone(),
        }
    }
}

impl From<Proof> for ProofV3 {
    fn from(proof: Proof) -> ProofV3 {
        let Proof {
            amount,
            keyset_id,
            secret,
            c,
            witness,
            dleq,
        } = proof;
        ProofV3 {
            amount,
            keyset_id,
            secret,
            c,
            witness,
            dleq,
        }
    }
}

/// Token V4 (`cashuB`, CBOR)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenV4 {
    /// Mint Url
    #[serde(rename = "m")]
    pub mint_url: MintUrl,
    /// Token unit
    #[serde(rename = "u")]
    pub unit: CurrencyUnit,
    /// Memo for token
    #[serde(rename = "d", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Proofs grouped by keyset id. The same id may repeat across entries.
    #[serde(rename = "t")]
    pub token: Vec<TokenV4Token>,
}

impl TokenV4 {
    /// Proofs, in entry order
    pub fn proofs(&self) -> Proofs {
        self.token
            .iter()
            .flat_map(|t| t.proofs.iter().map(|p| p.to_proof(&t.keyset_id)))
            .collect()
    }

    /// Value; errors if duplicate proofs are found
    pub fn value(&self) -> Result<Amount, Error> {
        let proofs: Vec<&ProofV4> = self.token.iter().flat_map(|t| t.proofs.iter()).collect();
        let unique_count = proofs
            .iter()
            .map(|p| &p.secret)
            .collect::<std::collections::HashSet<_>>()
            .len();

        if unique_count != proofs.len() {
            return Err(Error::DuplicateProofs);
        }

        Ok(Amount::try_sum(proofs.iter().map(|p| p.amount))?)
    }
}

impl fmt::Display for TokenV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use serde::ser::Error;
        let mut data = Vec::new();
        ciborium::into_writer(self, &mut data).map_err(|e| fmt::Error::custom(e.to_string()))?;
        let encoded = general_purpose::URL_SAFE_NO_PAD.encode(data);
        write!(f, "cashuB{encoded}")
    }
}

impl FromStr for TokenV4 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("cashu:").unwrap_or(s);
        let s = s.strip_prefix("cashuB").ok_or(Error::UnsupportedToken)?;

        let decoded = base64_decode(s)?;
        let token: TokenV4 = ciborium::from_reader(&decoded[..])?;
        Ok(token)
    }
}

impl TryFrom<TokenV3> for TokenV4 {
    type Error = Error;
    fn try_from(token: TokenV3) -> Result<Self, Self::Error> {
        let mint_urls = token.mint_urls();

        ensure!(mint_urls.len() == 1, Error::UnsupportedToken);

        let mint_url = mint_urls.first().ok_or(Error::UnsupportedToken)?;

        let mut grouped: Vec<TokenV4Token> = Vec::new();
        let mut index: HashMap<Id, usize> = HashMap::new();

        for proof in token.token.into_iter().flat_map(|t| t.proofs) {
            match index.get(&proof.keyset_id) {
                Some(i) => grouped[*i].proofs.push(ProofV4 {
                    amount: proof.amount,
                    secret: proof.secret,
                    c: proof.c,
                    witness: proof.witness,
                    dleq: proof.dleq,
                }),
                None => {
                    index.insert(proof.keyset_id, grouped.len());
                    grouped.push(TokenV4Token {
                        keyset_id: proof.keyset_id,
                        proofs: vec![ProofV4 {
                            amount: proof.amount,
                            secret: proof.secret,
                            c: proof.c,
                            witness: proof.witness,
                            dleq: proof.dleq,
                        }],
                    });
                }
            }
        }

        Ok(TokenV4 {
            mint_url: mint_url.clone(),
            token: grouped,
            memo: token.memo,
            unit: token.unit.ok_or(Error::UnsupportedUnit)?,
        })
    }
}

/// Proofs of a single keyset within a V4 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenV4Token {
    /// `Keyset id`
    #[serde(
        rename = "i",
        serialize_with = "serialize_v4_keyset_id",
        deserialize_with = "deserialize_v4_keyset_id"
    )]
    pub keyset_id: Id,
    /// Proofs
    #[serde(rename = "p")]
    pub proofs: Vec<ProofV4>,
}

impl TokenV4Token {
    /// Create new [`TokenV4Token`]
    pub fn new(keyset_id: Id, proofs: Proofs) -> Self {
        Self {
            keyset_id,
            proofs: proofs.into_iter().map(|p| p.into()).collect(),
        }
    }
}

fn serialize_v4_keyset_id<S>(keyset_id: &Id, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_bytes(&keyset_id.to_bytes())
}

fn deserialize_v4_keyset_id<'de, D>(deserializer: D) -> Result<Id, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bytes = Vec::<u8>::deserialize(deserializer)?;
    Id::from_bytes(&bytes).map_err(serde::de::Error::custom)
}

/// Proof within a V4 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofV4 {
    /// Amount
    #[serde(rename = "a")]
    pub amount: Amount,
    /// Secret message
    #[serde(rename = "s")]
    pub secret: Secret,
    /// Unblinded signature, as a byte string
    #[serde(
        serialize_with = "serialize_v4_pubkey",
        deserialize_with = "deserialize_v4_pubkey"
    )]
    pub c: crate::nuts::nut01::PublicKey,
    /// Witness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
    /// DLEQ Proof
    #[serde(rename = "d")]
    pub dleq: Option<ProofDleq>,
}

impl ProofV4 {
    /// [`ProofV4`] into [`Proof`]
    pub fn to_proof(&self, keyset_id: &Id) -> Proof {
        Proof {
            amount: self.amount,
            keyset_id: *keyset_id,
            secret: self.secret.clone(),
            c: self.c,
            witness: self.witness.clone(),
            dleq: self.dleq.clone(),
        }
    }
}

impl From<Proof> for ProofV4 {
    fn from(proof: Proof) -> ProofV4 {
        let Proof {
            amount,
            secret,
            c,
            witness,
            dleq,
            keyset_id: _,
        } = proof;
        ProofV4 {
            amount,
            secret,
            c,
            witness,
            dleq,
        }
    }
}

fn serialize_v4_pubkey<S>(
    key: &crate::nuts::nut01::PublicKey,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_bytes(&key.to_bytes())
}

fn deserialize_v4_pubkey<'de, D>(deserializer: D) -> Result<crate::nuts::nut01::PublicKey, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bytes = Vec::<u8>::deserialize(deserializer)?;
    crate::nuts::nut01::PublicKey::from_slice(&bytes).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const V3_TOKEN: &str = "cashuAeyJ0b2tlbiI6W3sibWludCI6Imh0dHBzOi8vODMzMy5zcGFjZTozMzM4IiwicHJvb2ZzIjpbeyJhbW91bnQiOjIsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6IjQwNzkxNWJjMjEyYmU2MWE3N2UzZTZkMmFlYjRjNzI3OTgwYmRhNTFjZDA2YTZhZmMyOWUyODYxNzY4YTc4MzciLCJDIjoiMDJiYzkwOTc5OTdkODFhZmIyY2M3MzQ2YjVlNDM0NWE5MzQ2YmQyYTUwNmViNzk1ODU5OGE3MmYwY2Y4NTE2M2VhIn0seyJhbW91bnQiOjgsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6ImZlMTUxMDkzMTRlNjFkNzc1NmIwZjhlZTBmMjNhNjI0YWNhYTNmNGUwNDJmNjE0MzNjNzI4YzcwNTdiOTMxYmUiLCJDIjoiMDI5ZThlNTA1MGI4OTBhN2Q2YzA5NjhkYjE2YmMxZDVkNWZhMDQwZWExZGUyODRmNmVjNjlkNjEyOTlmNjcxMDU5In1dfV0sInVuaXQiOiJzYXQiLCJtZW1vIjoiVGhhbmsgeW91LiJ9";

    #[test]
    fn test_token_v3_decode() {
        let token = TokenV3::from_str(V3_TOKEN).unwrap();

        assert_eq!(
            token.token[0].mint,
            MintUrl::from_str("https://8333.space:3338").unwrap()
        );
        assert_eq!(
            token.token[0].proofs[0].keyset_id,
            Id::from_str("009a1f293253e41e").unwrap()
        );
        assert_eq!(token.unit.clone().unwrap(), CurrencyUnit::Sat);
        assert_eq!(token.memo.clone().unwrap(), "Thank you.");

        let proofs = token.proofs();
        assert_eq!(proofs.len(), 2);
        assert_eq!(proofs[0].amount, Amount::from(2));
        assert_eq!(proofs[1].amount, Amount::from(8));
        assert_eq!(
            proofs[0].secret.as_str(),
            "407915bc212be61a77e3e6d2aeb4c727980bda51cd06a6afc29e2861768a7837"
        );
        assert_eq!(token.value().unwrap(), Amount::from(10));
    }

    #[test]
    fn test_token_v3_byte_exact_round_trip() {
        let token = TokenV3::from_str(V3_TOKEN).unwrap();

        assert_eq!(token.to_string(), V3_TOKEN);
    }

    #[test]
    fn test_token_padding_accepted() {
        let token_str_with_padding = "cashuAeyJ0b2tlbiI6W3sibWludCI6Imh0dHBzOi8vODMzMy5zcGFjZTozMzM4IiwicHJvb2ZzIjpbeyJhbW91bnQiOjIsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6IjQwNzkxNWJjMjEyYmU2MWE3N2UzZTZkMmFlYjRjNzI3OTgwYmRhNTFjZDA2YTZhZmMyOWUyODYxNzY4YTc4MzciLCJDIjoiMDJiYzkwOTc5OTdkODFhZmIyY2M3MzQ2YjVlNDM0NWE5MzQ2YmQyYTUwNmViNzk1ODU5OGE3MmYwY2Y4NTE2M2VhIn0seyJhbW91bnQiOjgsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6ImZlMTUxMDkzMTRlNjFkNzc1NmIwZjhlZTBmMjNhNjI0YWNhYTNmNGUwNDJmNjE0MzNjNzI4YzcwNTdiOTMxYmUiLCJDIjoiMDI5ZThlNTA1MGI4OTBhN2Q2YzA5NjhkYjE2YmMxZDVkNWZhMDQwZWExZGUyODRmNmVjNjlkNjEyOTlmNjcxMDU5In1dfV0sInVuaXQiOiJzYXQiLCJtZW1vIjoiVGhhbmsgeW91IHZlcnkgbXVjaC4ifQ==";

        let token = TokenV3::from_str(token_str_with_padding).unwrap();

        let token_str_without_padding = "cashuAeyJ0b2tlbiI6W3sibWludCI6Imh0dHBzOi8vODMzMy5zcGFjZTozMzM4IiwicHJvb2ZzIjpbeyJhbW91bnQiOjIsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6IjQwNzkxNWJjMjEyYmU2MWE3N2UzZTZkMmFlYjRjNzI3OTgwYmRhNTFjZDA2YTZhZmMyOWUyODYxNzY4YTc4MzciLCJDIjoiMDJiYzkwOTc5OTdkODFhZmIyY2M3MzQ2YjVlNDM0NWE5MzQ2YmQyYTUwNmViNzk1ODU5OGE3MmYwY2Y4NTE2M2VhIn0seyJhbW91bnQiOjgsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6ImZlMTUxMDkzMTRlNjFkNzc1NmIwZjhlZTBmMjNhNjI0YWNhYTNmNGUwNDJmNjE0MzNjNzI4YzcwNTdiOTMxYmUiLCJDIjoiMDI5ZThlNTA1MGI4OTBhN2Q2YzA5NjhkYjE2YmMxZDVkNWZhMDQwZWExZGUyODRmNmVjNjlkNjEyOTlmNjcxMDU5In1dfV0sInVuaXQiOiJzYXQiLCJtZW1vIjoiVGhhbmsgeW91IHZlcnkgbXVjaC4ifQ";

        let token_without = TokenV3::from_str(token_str_without_padding).unwrap();

        assert_eq!(token, token_without);
    }

    #[test]
    fn test_token_v4_round_trip() {
        let keyset_id = Id::from_str("009a1f293253e41e").unwrap();
        let proofs = vec![
            Proof::new(
                Amount::from(2),
                keyset_id,
                Secret::from_str(
                    "407915bc212be61a77e3e6d2aeb4c727980bda51cd06a6afc29e2861768a7837",
                )
                .unwrap(),
                crate::nuts::nut01::PublicKey::from_hex(
                    "02bc9097997d81afb2cc7346b5e4345a9346bd2a506eb7958598a72f0cf85163ea",
                )
                .unwrap(),
            ),
            Proof::new(
                Amount::from(8),
                keyset_id,
                Secret::from_str(
                    "fe15109314e61d7756b0f8ee0f23a624acaa3f4e042f61433c728c7057b931be",
                )
                .unwrap(),
                crate::nuts::nut01::PublicKey::from_hex(
                    "029e8e5050b890a7d6c0968db16bc1d5d5fa040ea1de284f6ec69d61299f671059",
                )
                .unwrap(),
            ),
        ];

        let token = Token::new(
            MintUrl::from_str("http://localhost:3338").unwrap(),
            proofs,
            Some("Thank you".to_string()),
            CurrencyUnit::Sat,
        );

        let encoded = token.to_string();
        assert!(encoded.starts_with("cashuB"));

        let decoded = Token::from_str(&encoded).unwrap();
        assert_eq!(decoded, token);

        // Order of proofs and every field survive the trip
        assert_eq!(decoded.proofs(), token.proofs());
        assert_eq!(decoded.memo(), token.memo());
        assert_eq!(decoded.unit(), token.unit());

        // And re-encoding is stable
        assert_eq!(decoded.to_string(), encoded);
    }

    #[test]
    fn test_token_v4_multi_keyset_vector() {
        let token_str_multi_keysets = "cashuBo2F0gqJhaUgA_9SLj17PgGFwgaNhYQFhc3hAYWNjMTI0MzVlN2I4NDg0YzNjZjE4NTAxNDkyMThhZjkwZjcxNmE1MmJmNGE1ZWQzNDdlNDhlY2MxM2Y3NzM4OGFjWCECRFODGd5IXVW-07KaZCvuWHk3WrnnpiDhHki6SCQh88-iYWlIAK0mjE0fWCZhcIKjYWECYXN4QDEzMjNkM2Q0NzA3YTU4YWQyZTIzYWRhNGU5ZjFmNDlmNWE1YjRhYzdiNzA4ZWIwZDYxZjczOGY0ODMwN2U4ZWVhY1ghAjRWqhENhLSsdHrr2Cw7AFrKUL9Ffr1XN6RBT6w659lNo2FhAWFzeEA1NmJjYmNiYjdjYzY0MDZiM2ZhNWQ1N2QyMTc0ZjRlZmY4YjQ0MDJiMTc2OTI2ZDNhNTdkM2MzZGNiYjU5ZDU3YWNYIQJzEpxXGeWZN5qXSmJjY8MzxWyvwObQGr5G1YCCgHicY2FtdWh0dHA6Ly9sb2NhbGhvc3Q6MzMzOGF1Y3NhdA";

        let token = Token::from_str(token_str_multi_keysets).unwrap();
        let amount = token.value().expect("valid amount");

        assert_eq!(amount, Amount::from(4));
        assert_eq!(token.unit().unwrap(), CurrencyUnit::Sat);

        match token {
            Token::TokenV4(token) => {
                let ids: Vec<Id> = token.token.iter().map(|t| t.keyset_id).collect();

                assert_eq!(ids.len(), 2);
                assert!(ids.contains(&Id::from_str("00ffd48b8f5ecf80").unwrap()));
                assert!(ids.contains(&Id::from_str("00ad268c4d1f5826").unwrap()));

                assert_eq!("http://localhost:3338", &token.mint_url.to_string());
            }
            _ => {
                panic!("Token should be a v4 token")
            }
        }
    }

    #[test]
    fn test_token_uri_form() {
        let uri = format!("cashu:{V3_TOKEN}");
        let from_uri = Token::from_str(&uri).unwrap();
        let from_plain = Token::from_str(V3_TOKEN).unwrap();
        assert_eq!(from_uri, from_plain);
    }

    #[test]
    fn incorrect_tokens() {
        let incorrect_prefix = "casshuA".to_string() + &V3_TOKEN[6..];
        assert!(Token::from_str(&incorrect_prefix).is_err());

        let no_prefix = &V3_TOKEN[6..];
        assert!(Token::from_str(no_prefix).is_err());

        let unknown_version = "cashuC".to_string() + &V3_TOKEN[6..];
        assert!(Token::from_str(&unknown_version).is_err());

        let malformed = "cashuBa";
        assert!(Token::from_str(malformed).is_err());
    }

    #[test]
    fn test_token_with_duplicate_proofs() {
        let mint_url = MintUrl::from_str("https://example.com").unwrap();
        let keyset_id = Id::from_str("009a1f293253e41e").unwrap();

        let secret = Secret::generate();
        let proof = Proof {
            amount: Amount::from(10),
            keyset_id,
            secret: secret.clone(),
            c: "02bc9097997d81afb2cc7346b5e4345a9346bd2a506eb7958598a72f0cf85163ea"
                .parse()
                .unwrap(),
            witness: None,
            dleq: None,
        };

        let token = Token::new(
            mint_url.clone(),
            vec![proof.clone(), proof.clone()],
            None,
            CurrencyUnit::Sat,
        );

        assert!(token.value().is_err());

        let other = Proof {
            secret: Secret::generate(),
            ..proof.clone()
        };

        let token = Token::new(mint_url, vec![proof, other], None, CurrencyUnit::Sat);

        assert_eq!(token.value().unwrap(), Amount::from(20));
    }
}
