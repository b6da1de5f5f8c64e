use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::Actor,
};
use db::user::UserStore;
use stripe::Client;

use crate::{
    dtos::pay::{CheckoutRequest, CheckoutResponse, WebhookAck},
    misc::signature::SIGNATURE_HEADER,
    models::sub::PriceTable,
    services::{
        self,
        webhook::{WebhookContext, WebhookOutcome},
    },
};

/// Starts the hosted checkout for a paid tier.
///
/// # Input
/// - `req`: `{ tier: "Monthly" | "Yearly", success_url, cancel_url }`
///
/// # Output
/// - Success: `{ url }` of the hosted checkout page
/// - Error: 400 for the Free tier or malformed URLs
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/pay/checkout', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     tier: 'Yearly',
///     success_url: `${window.location.origin}/dashboard?checkout=success`,
///     cancel_url: `${window.location.origin}/pricing`
///   })
/// });
/// const { url } = await response.json();
/// window.location.href = url;
/// ```
#[post("/checkout")]
async fn post_checkout(
    actor: web::ReqData<Actor>,
    req: web::Json<CheckoutRequest>,
    client: web::Data<Client>,
    prices: web::Data<PriceTable>,
) -> Res<impl Responder> {
    let price_id = prices
        .price_for(req.tier)
        .ok_or_else(|| AppError::BadRequest("The Free tier needs no checkout".to_string()))?;

    let session =
        services::pay::create_subscription_session(&client, &actor, price_id, &req).await?;
    let url = session
        .url
        .ok_or_else(|| AppError::Internal("Checkout session has no URL".to_string()))?;

    Success::ok(CheckoutResponse { url })
}

fn ack(status: &'static str) -> HttpResponse {
    HttpResponse::Ok().json(WebhookAck {
        received: true,
        status,
    })
}

/// Receives payment gateway events. The raw body is needed untouched for
/// signature verification.
///
/// Processed events, including ones for unknown customers, are acknowledged
/// with 200 so the gateway stops retrying. Rejected signatures and malformed
/// events answer 400; store failures answer 500 so the gateway retries.
#[post("/webhook")]
async fn post_webhook(
    req: HttpRequest,
    payload: web::Bytes,
    store: web::Data<Arc<dyn UserStore>>,
    prices: web::Data<PriceTable>,
    config: web::Data<Arc<Config>>,
) -> Res<HttpResponse> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Signature("Missing signature header".to_string()))?;

    let ctx = WebhookContext {
        store: store.get_ref().as_ref(),
        prices: &prices,
        webhook_secret: &config.stripe.webhook_secret,
    };

    match services::webhook::handle_event(&payload, signature, &ctx).await {
        Ok(outcome) => {
            if let WebhookOutcome::Updated { user_id, tier } = &outcome {
                log::info!("Webhook moved {} to {}", user_id, tier);
            }
            Ok(ack(outcome.status()))
        }
        Err(AppError::NotFound(message)) => {
            log::warn!("Acknowledging webhook without a matching user: {}", message);
            Ok(ack("user_not_found"))
        }
        Err(error) => Err(error),
    }
}
