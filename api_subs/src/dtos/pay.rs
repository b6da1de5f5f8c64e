use db::models::user::SubscriptionTier;
use serde::{Deserialize, Serialize};

use crate::models::sub::SubscriptionPlan;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub tier: SubscriptionTier,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Acknowledgement returned to the payment gateway.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionPlansResponse {
    pub plans: Vec<SubscriptionPlan>,
}
