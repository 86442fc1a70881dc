//! NUT-17: WebSocket subscriptions
//!
//! <https://github.com/cashubtc/nuts/blob/main/17.md>
//!
//! The wallet consumes these frames only as cache-invalidation signals; no
//! correctness depends on them.

use serde::{Deserialize, Serialize};

use super::nut04::MintQuoteBolt11Response;
use super::nut05::MeltQuoteBolt11Response;
use super::nut07::ProofState;
use super::{CurrencyUnit, PaymentMethod};

/// Subscription kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    /// Bolt11 mint quote updates
    Bolt11MintQuote,
    /// Bolt11 melt quote updates
    Bolt11MeltQuote,
    /// Proof state updates
    ProofState,
}

/// Subscribe request parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeParams {
    /// Kind of subscription
    pub kind: SubscriptionKind,
    /// Identifiers to watch: quote ids or Y points
    pub filters: Vec<String>,
    /// Client chosen subscription id
    #[serde(rename = "subId")]
    pub sub_id: String,
}

/// Notification payload carried by a WebSocket frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    /// Proof state update
    ProofState(ProofState),
    /// Melt quote update
    MeltQuoteBolt11Response(MeltQuoteBolt11Response),
    /// Mint quote update
    MintQuoteBolt11Response(MintQuoteBolt11Response),
}

/// A notification frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsNotification {
    /// Subscription id the notification is for
    #[serde(rename = "subId")]
    pub sub_id: String,
    /// The update
    pub payload: NotificationPayload,
}

/// Supported WebSocket settings advertised in mint info
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedSettings {
    /// Supported methods
    pub supported: Vec<SupportedMethods>,
}

/// Supported methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedMethods {
    /// Payment Method
    pub method: PaymentMethod,
    /// Unit
    pub unit: CurrencyUnit,
    /// Command types the mint pushes for this pair
    pub commands: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_deserialization() {
        let json = r#"{"subId":"sub-1","payload":{"Y":"02bc9097997d81afb2cc7346b5e4345a9346bd2a506eb7958598a72f0cf85163ea","state":"PENDING","witness":null}}"#;

        let notification: WsNotification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.sub_id, "sub-1");
        assert!(matches!(
            notification.payload,
            NotificationPayload::ProofState(_)
        ));
    }
}
