//! Stripe webhook event envelope and event kinds.
//!
//! Only the fields needed for routing and auditing are captured; the
//! polymorphic `data.object` stays raw JSON until a handler decodes it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "invoice.payment_succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default)]
    pub api_version: Option<String>,

    /// The delivered body, kept verbatim for the audit log.
    #[serde(skip)]
    raw: Option<serde_json::Value>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Parses the event type into a known kind.
    pub fn kind(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data.object)
    }

    /// Parses a delivered body, keeping the full JSON alongside the typed envelope.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: serde_json::Value = serde_json::from_slice(payload)?;
        let mut event = Self::deserialize(&raw)?;
        event.raw = Some(raw);
        Ok(event)
    }

    /// The event as delivered, or re-rendered when it was built in process.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => serde_json::to_value(self).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Stripe event kinds the reconciler handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StripeEventType {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaid,
    InvoicePaymentFailed,
    TrialWillEnd,
    /// Any type string outside the handled set.
    Unknown(String),
}

impl StripeEventType {
    /// Every handled kind, in routing-table order.
    pub const KNOWN: [StripeEventType; 8] = [
        StripeEventType::PaymentIntentSucceeded,
        StripeEventType::PaymentIntentFailed,
        StripeEventType::SubscriptionCreated,
        StripeEventType::SubscriptionUpdated,
        StripeEventType::SubscriptionDeleted,
        StripeEventType::InvoicePaid,
        StripeEventType::InvoicePaymentFailed,
        StripeEventType::TrialWillEnd,
    ];

    /// Parse event type from string. Never fails.
    pub fn parse(s: &str) -> Self {
        match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "customer.subscription.trial_will_end" => Self::TrialWillEnd,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentFailed => "payment_intent.payment_failed",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaid => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::TrialWillEnd => "customer.subscription.trial_will_end",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for StripeEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "customer.subscription.updated".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
            raw: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_kind_round_trips_its_string() {
        for kind in StripeEventType::KNOWN {
            assert_eq!(StripeEventType::parse(kind.as_str()), kind);
            assert!(kind.is_known());
        }
    }

    #[test]
    fn unrecognized_type_keeps_raw_string() {
        let kind = StripeEventType::parse("charge.refunded");
        assert_eq!(kind, StripeEventType::Unknown("charge.refunded".to_string()));
        assert_eq!(kind.as_str(), "charge.refunded");
        assert!(!kind.is_known());
    }

    #[test]
    fn deserializes_minimal_event() {
        let json = r#"{"id":"evt_1","type":"invoice.payment_succeeded","data":{"object":{"id":"in_1"}}}"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.kind(), StripeEventType::InvoicePaid);
        assert!(!event.is_live());
        assert!(event.api_version.is_none());
    }

    #[test]
    fn rejects_event_without_data_object() {
        let json = r#"{"id":"evt_1","type":"invoice.payment_succeeded","data":{}}"#;
        assert!(serde_json::from_str::<StripeEvent>(json).is_err());
    }

    #[test]
    fn rejects_event_without_type() {
        let json = r#"{"id":"evt_1","data":{"object":{}}}"#;
        assert!(serde_json::from_str::<StripeEvent>(json).is_err());
    }

    #[test]
    fn deserialize_object_decodes_typed_payload() {
        #[derive(Deserialize)]
        struct Obj {
            id: String,
        }

        let event = StripeEventBuilder::new()
            .object(serde_json::json!({"id": "sub_1"}))
            .build();

        let obj: Obj = event.deserialize_object().unwrap();
        assert_eq!(obj.id, "sub_1");
    }

    #[test]
    fn to_json_keeps_type_key() {
        let event = StripeEventBuilder::new().id("evt_9").build();
        let json = event.to_json();

        assert_eq!(json["id"], "evt_9");
        assert_eq!(json["type"], "customer.subscription.updated");
    }

    #[test]
    fn from_slice_keeps_unmodeled_fields() {
        let body = serde_json::json!({
            "id": "evt_raw",
            "object": "event",
            "type": "invoice.payment_succeeded",
            "created": 1700000000,
            "account": "acct_1",
            "pending_webhooks": 2,
            "request": {"id": "req_1", "idempotency_key": null},
            "data": {"object": {"id": "in_1"}}
        });

        let event = StripeEvent::from_slice(body.to_string().as_bytes()).unwrap();

        assert_eq!(event.id, "evt_raw");
        assert_eq!(event.kind(), StripeEventType::InvoicePaid);
        assert_eq!(event.to_json(), body);
    }

    #[test]
    fn from_slice_rejects_missing_data() {
        let result = StripeEvent::from_slice(br#"{"id":"evt_1","type":"invoice.paid"}"#);
        assert!(result.is_err());
    }
}
