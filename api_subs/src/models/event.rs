use std::collections::HashMap;

use common::error::{AppError, Res};
use serde::Deserialize;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// The parts of a gateway event the reconciler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_id: String,
    pub event_type: String,
    pub customer_email: Option<String>,
    pub price_id: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    object: serde_json::Value,
}

#[derive(Default, Deserialize)]
struct CheckoutObject {
    customer_details: Option<CustomerDetails>,
    customer_email: Option<String>,
    line_items: Option<LineItems>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(Deserialize)]
struct LineItems {
    #[serde(default)]
    data: Vec<LineItem>,
}

#[derive(Deserialize)]
struct LineItem {
    price: Option<LineItemPrice>,
}

#[derive(Deserialize)]
struct LineItemPrice {
    id: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PaymentEvent {
    /// Reads an event body. Only the envelope is mandatory; the customer email
    /// and price are picked from wherever the event carries them.
    pub fn from_payload(raw: &[u8]) -> Res<Self> {
        let envelope: Envelope = serde_json::from_slice(raw)
            .map_err(|e| AppError::MalformedPayload(format!("Unreadable event: {}", e)))?;

        let object: CheckoutObject = envelope
            .data
            .and_then(|data| serde_json::from_value(data.object).ok())
            .unwrap_or_default();

        let customer_email = non_empty(object.customer_details.and_then(|c| c.email))
            .or_else(|| non_empty(object.customer_email));

        let price_id = non_empty(
            object
                .line_items
                .and_then(|items| items.data.into_iter().next())
                .and_then(|item| item.price)
                .map(|price| price.id),
        )
        .or_else(|| non_empty(object.metadata.and_then(|mut m| m.remove("price_id"))));

        Ok(PaymentEvent {
            event_id: envelope.id,
            event_type: envelope.type_,
            customer_email,
            price_id,
        })
    }
}
