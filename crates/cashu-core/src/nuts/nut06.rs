//! NUT-06: Mint Information
//!
//! <https://github.com/cashubtc/nuts/blob/main/06.md>

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::nut01::PublicKey;
use super::{nut04, nut05, nut15, nut17, nut22};

/// Mint Version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintVersion {
    /// Mint Software name
    pub name: String,
    /// Mint Version
    pub version: String,
}

impl MintVersion {
    /// Create new [`MintVersion`]
    pub fn new(name: String, version: String) -> Self {
        Self { name, version }
    }
}

impl Serialize for MintVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let combined = format!("{}/{}", self.name, self.version);
        serializer.serialize_str(&combined)
    }
}

impl<'de> Deserialize<'de> for MintVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let combined = String::deserialize(deserializer)?;
        let (name, version) = combined
            .split_once('/')
            .ok_or_else(|| serde::de::Error::custom("Invalid version string"))?;
        Ok(MintVersion {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

/// Mint Info [NUT-06]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
    /// name of the mint and should be recognizable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// hex pubkey of the mint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<PublicKey>,
    /// implementation name and the version running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<MintVersion>,
    /// short description of the mint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// long description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_long: Option<String>,
    /// Contact info
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<ContactInfo>>,
    /// shows which NUTs the mint supports
    pub nuts: Nuts,
    /// Mint's icon URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// message of the day that the wallet must display to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
    /// server unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

impl MintInfo {
    /// Whether the mint supports NUT-15 multi-path payments for a unit/method
    pub fn supports_mpp(&self, method: &super::PaymentMethod, unit: &super::CurrencyUnit) -> bool {
        self.nuts
            .nut15
            .methods
            .iter()
            .any(|m| &m.method == method && &m.unit == unit)
    }

    /// Whether the mint requires NUT-22 access tokens
    pub fn requires_access_token(&self) -> bool {
        self.nuts.nut22.mandatory
    }
}

/// Contact info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact Method i.e. nostr
    pub method: String,
    /// Contact info i.e. npub...
    pub info: String,
}

/// Supported nuts and settings
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nuts {
    /// NUT04 Settings
    #[serde(default)]
    #[serde(rename = "4")]
    pub nut04: nut04::Settings,
    /// NUT05 Settings
    #[serde(default)]
    #[serde(rename = "5")]
    pub nut05: nut05::Settings,
    /// NUT07 Settings
    #[serde(default)]
    #[serde(rename = "7")]
    pub nut07: SupportedSettings,
    /// NUT08 Settings
    #[serde(default)]
    #[serde(rename = "8")]
    pub nut08: SupportedSettings,
    /// NUT09 Settings
    #[serde(default)]
    #[serde(rename = "9")]
    pub nut09: SupportedSettings,
    /// NUT10 Settings
    #[serde(default)]
    #[serde(rename = "10")]
    pub nut10: SupportedSettings,
    /// NUT11 Settings
    #[serde(default)]
    #[serde(rename = "11")]
    pub nut11: SupportedSettings,
    /// NUT12 Settings
    #[serde(default)]
    #[serde(rename = "12")]
    pub nut12: SupportedSettings,
    /// NUT14 Settings
    #[serde(default)]
    #[serde(rename = "14")]
    pub nut14: SupportedSettings,
    /// NUT15 Settings
    #[serde(default)]
    #[serde(rename = "15")]
    pub nut15: nut15::Settings,
    /// NUT17 Settings
    #[serde(default)]
    #[serde(rename = "17")]
    pub nut17: nut17::SupportedSettings,
    /// NUT19 Settings
    #[serde(default)]
    #[serde(rename = "19")]
    pub nut19: Nut19Settings,
    /// NUT20 Settings
    #[serde(default)]
    #[serde(rename = "20")]
    pub nut20: SupportedSettings,
    /// NUT22 Settings
    #[serde(default)]
    #[serde(rename = "22")]
    pub nut22: nut22::Settings,
}

/// Check state Settings
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedSettings {
    /// Whether the nut is supported
    pub supported: bool,
}

/// NUT-19 cached endpoint settings
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nut19Settings {
    /// Time to live of the cached responses
    pub ttl: Option<u64>,
    /// Cached endpoints
    #[serde(default)]
    pub cached_endpoints: Vec<CachedEndpoint>,
}

/// NUT-19 cached endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEndpoint {
    /// HTTP method
    pub method: String,
    /// Endpoint path
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_des_mint_info() {
        let mint_info_str = r#"{
            "name": "Cashu mint",
            "pubkey": "0296d0aa13b6a31cf0cd974249f28c7b7176d7274712c95a41c7d8066d3f29d679",
            "version": "Nutshell/0.15.3",
            "contact": [
                {"method": "nostr", "info": "npub1"},
                {"method": "email", "info": "contact@me.com"}
            ],
            "nuts": {
                "4": {
                    "methods": [{"method": "bolt11", "unit": "sat", "description": true}],
                    "disabled": false
                },
                "5": {
                    "methods": [{"method": "bolt11", "unit": "sat"}],
                    "disabled": false
                },
                "7": {"supported": true},
                "8": {"supported": true},
                "9": {"supported": true},
                "10": {"supported": true},
                "12": {"supported": true},
                "15": {"methods": [{"method": "bolt11", "unit": "sat"}]}
            },
            "motd": "Message to display to users."
        }"#;

        let info: MintInfo = serde_json::from_str(mint_info_str).unwrap();

        assert_eq!(info.name.as_deref(), Some("Cashu mint"));
        assert_eq!(
            info.version,
            Some(MintVersion::new(
                "Nutshell".to_string(),
                "0.15.3".to_string()
            ))
        );
        assert!(info.nuts.nut07.supported);
        assert!(info.supports_mpp(
            &crate::nuts::PaymentMethod::Bolt11,
            &crate::nuts::CurrencyUnit::Sat
        ));
        assert!(!info.requires_access_token());
    }
}
