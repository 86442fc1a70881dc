//! NUT-15: Multi-path payments
//!
//! <https://github.com/cashubtc/nuts/blob/main/15.md>

use serde::{Deserialize, Deserializer, Serialize};

use super::{CurrencyUnit, PaymentMethod};
use crate::Amount;

/// Multi-part payment option carried in a melt quote request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mpp {
    /// Partial amount, in msat
    pub amount: Amount,
}

/// Mpp Method Settings
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MppMethodSettings {
    /// Payment Method e.g. bolt11
    pub method: PaymentMethod,
    /// Currency Unit e.g. sat
    pub unit: CurrencyUnit,
}

/// Mpp Settings
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Settings {
    /// Method settings
    pub methods: Vec<MppMethodSettings>,
}

impl Settings {
    /// Check if methods is empty
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

// Mints have shipped both the bare-array and the object form
impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum SettingsFormat {
            Array(Vec<MppMethodSettings>),
            Object { methods: Vec<MppMethodSettings> },
        }

        let format = SettingsFormat::deserialize(deserializer)?;
        match format {
            SettingsFormat::Array(methods) => Ok(Settings { methods }),
            SettingsFormat::Object { methods } => Ok(Settings { methods }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_deserialization() {
        let array_json = r#"[{"method":"bolt11","unit":"sat"}]"#;
        let settings: Settings = serde_json::from_str(array_json).unwrap();
        assert_eq!(settings.methods.len(), 1);
        assert_eq!(settings.methods[0].method, PaymentMethod::Bolt11);
        assert_eq!(settings.methods[0].unit, CurrencyUnit::Sat);

        let object_json = r#"{"methods":[{"method":"bolt11","unit":"sat"}]}"#;
        let settings: Settings = serde_json::from_str(object_json).unwrap();
        assert_eq!(settings.methods.len(), 1);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings {
            methods: vec![MppMethodSettings {
                method: PaymentMethod::Bolt11,
                unit: CurrencyUnit::Sat,
            }],
        };

        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"methods":[{"method":"bolt11","unit":"sat"}]}"#);
    }
}
