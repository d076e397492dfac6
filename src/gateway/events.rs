//! Gateway webhook events
//!
//! Events arrive as JSON with a `type` string; they are parsed into a
//! closed variant type so the success/failure classification is exhaustive
//! instead of ad-hoc string branching at each call site.

use serde_json::Value;

use crate::models::{OrderStatus, payment_status};

/// Identifier an event carries for the payment it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRef {
    /// Gateway checkout session id
    Session(String),
    /// Gateway payment intent id
    Intent(String),
}

/// Effect class of an event on the order state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Payment confirmed: order -> PROCESSING, payment -> completed
    Success,
    /// Payment failed: order -> CANCELLED, payment -> failed
    Failure,
}

impl EventClass {
    pub fn target_order_status(&self) -> OrderStatus {
        match self {
            Self::Success => OrderStatus::Processing,
            Self::Failure => OrderStatus::Cancelled,
        }
    }

    pub fn target_payment_status(&self) -> &'static str {
        match self {
            Self::Success => payment_status::COMPLETED,
            Self::Failure => payment_status::FAILED,
        }
    }
}

/// Parsed gateway webhook event
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    CheckoutCompleted {
        session_id: String,
        payment_intent_id: Option<String>,
    },
    ChargeSucceeded {
        payment_intent_id: String,
        receipt_url: Option<String>,
    },
    PaymentIntentSucceeded {
        payment_intent_id: String,
    },
    /// Charge mutated after creation; only terminal charge statuses map to
    /// an effect class.
    ChargeUpdated {
        payment_intent_id: String,
        status: String,
        receipt_url: Option<String>,
    },
    PaymentFailed {
        payment_intent_id: String,
    },
    /// Acknowledged without mutation
    Unknown {
        event_type: String,
    },
}

impl GatewayEvent {
    /// Parse a signed, well-formed webhook body. Events whose payload is
    /// missing the identifier they are defined by degrade to `Unknown`.
    pub fn parse(event: &Value) -> Self {
        let event_type = event["type"].as_str().unwrap_or("");
        let obj = &event["data"]["object"];

        let intent = |o: &Value| {
            o["payment_intent"]
                .as_str()
                .or_else(|| o["id"].as_str())
                .map(String::from)
        };

        match event_type {
            "checkout.session.completed" => match obj["id"].as_str() {
                Some(id) => Self::CheckoutCompleted {
                    session_id: id.to_string(),
                    payment_intent_id: obj["payment_intent"].as_str().map(String::from),
                },
                None => Self::unknown(event_type),
            },
            "charge.succeeded" => match intent(obj) {
                Some(id) => Self::ChargeSucceeded {
                    payment_intent_id: id,
                    receipt_url: obj["receipt_url"].as_str().map(String::from),
                },
                None => Self::unknown(event_type),
            },
            "payment_intent.succeeded" => match obj["id"].as_str() {
                Some(id) => Self::PaymentIntentSucceeded {
                    payment_intent_id: id.to_string(),
                },
                None => Self::unknown(event_type),
            },
            "charge.updated" => match intent(obj) {
                Some(id) => Self::ChargeUpdated {
                    payment_intent_id: id,
                    status: obj["status"].as_str().unwrap_or("").to_string(),
                    receipt_url: obj["receipt_url"].as_str().map(String::from),
                },
                None => Self::unknown(event_type),
            },
            "payment_intent.payment_failed" => match obj["id"].as_str() {
                Some(id) => Self::PaymentFailed {
                    payment_intent_id: id.to_string(),
                },
                None => Self::unknown(event_type),
            },
            other => Self::unknown(other),
        }
    }

    fn unknown(event_type: &str) -> Self {
        Self::Unknown {
            event_type: event_type.to_string(),
        }
    }

    /// Classification table: event kind -> effect class.
    ///
    /// `None` means acknowledge without mutation (unknown events, or a
    /// charge update to a non-terminal status).
    pub fn class(&self) -> Option<EventClass> {
        match self {
            Self::CheckoutCompleted { .. }
            | Self::ChargeSucceeded { .. }
            | Self::PaymentIntentSucceeded { .. } => Some(EventClass::Success),
            Self::ChargeUpdated { status, .. } => match status.as_str() {
                "succeeded" => Some(EventClass::Success),
                "failed" => Some(EventClass::Failure),
                _ => None,
            },
            Self::PaymentFailed { .. } => Some(EventClass::Failure),
            Self::Unknown { .. } => None,
        }
    }

    /// The payment identifier this event is strictly scoped to
    pub fn payment_ref(&self) -> Option<PaymentRef> {
        match self {
            Self::CheckoutCompleted { session_id, .. } => {
                Some(PaymentRef::Session(session_id.clone()))
            }
            Self::ChargeSucceeded {
                payment_intent_id, ..
            }
            | Self::PaymentIntentSucceeded { payment_intent_id }
            | Self::ChargeUpdated {
                payment_intent_id, ..
            }
            | Self::PaymentFailed { payment_intent_id } => {
                Some(PaymentRef::Intent(payment_intent_id.clone()))
            }
            Self::Unknown { .. } => None,
        }
    }

    pub fn receipt_url(&self) -> Option<&str> {
        match self {
            Self::ChargeSucceeded { receipt_url, .. }
            | Self::ChargeUpdated { receipt_url, .. } => receipt_url.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkout_completed_is_success_scoped_to_session() {
        let event = GatewayEvent::parse(&json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_123", "payment_intent": "pi_123" } }
        }));
        assert_eq!(event.class(), Some(EventClass::Success));
        assert_eq!(
            event.payment_ref(),
            Some(PaymentRef::Session("cs_123".into()))
        );
    }

    #[test]
    fn charge_events_are_scoped_to_their_intent() {
        let event = GatewayEvent::parse(&json!({
            "type": "charge.succeeded",
            "data": { "object": { "id": "ch_1", "payment_intent": "pi_9",
                                  "receipt_url": "https://pay.example/r/1" } }
        }));
        assert_eq!(event.class(), Some(EventClass::Success));
        assert_eq!(event.payment_ref(), Some(PaymentRef::Intent("pi_9".into())));
        assert_eq!(event.receipt_url(), Some("https://pay.example/r/1"));
    }

    #[test]
    fn charge_updated_classifies_by_terminal_status() {
        let succeeded = GatewayEvent::parse(&json!({
            "type": "charge.updated",
            "data": { "object": { "payment_intent": "pi_1", "status": "succeeded" } }
        }));
        assert_eq!(succeeded.class(), Some(EventClass::Success));

        let failed = GatewayEvent::parse(&json!({
            "type": "charge.updated",
            "data": { "object": { "payment_intent": "pi_1", "status": "failed" } }
        }));
        assert_eq!(failed.class(), Some(EventClass::Failure));

        let pending = GatewayEvent::parse(&json!({
            "type": "charge.updated",
            "data": { "object": { "payment_intent": "pi_1", "status": "pending" } }
        }));
        assert_eq!(pending.class(), None);
    }

    #[test]
    fn failure_class_targets_cancelled() {
        let event = GatewayEvent::parse(&json!({
            "type": "payment_intent.payment_failed",
            "data": { "object": { "id": "pi_2" } }
        }));
        let class = event.class().unwrap();
        assert_eq!(class.target_order_status(), OrderStatus::Cancelled);
        assert_eq!(class.target_payment_status(), payment_status::FAILED);
    }

    #[test]
    fn unknown_event_types_have_no_effect() {
        let event = GatewayEvent::parse(&json!({
            "type": "customer.created",
            "data": { "object": { "id": "cus_1" } }
        }));
        assert!(matches!(event, GatewayEvent::Unknown { .. }));
        assert_eq!(event.class(), None);
        assert_eq!(event.payment_ref(), None);
    }

    #[test]
    fn missing_identifier_degrades_to_unknown() {
        let event = GatewayEvent::parse(&json!({
            "type": "checkout.session.completed",
            "data": { "object": {} }
        }));
        assert!(matches!(event, GatewayEvent::Unknown { .. }));
    }
}
