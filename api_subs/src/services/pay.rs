use std::collections::HashMap;

use common::{
    error::{AppError, Res},
    jwt::Actor,
};
use stripe::{CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession};

use crate::dtos::pay::CheckoutRequest;

fn ensure_url(field: &str, value: &str) -> Res<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| AppError::BadRequest(format!("{} is not a valid URL: {}", field, e)))
}

/// Creates a subscription checkout session for the actor.
/// The price id and the actor id travel in the session metadata, so the
/// completion event can be reconciled without line items.
pub async fn create_subscription_session(
    client: &Client,
    actor: &Actor,
    price_id: &str,
    req: &CheckoutRequest,
) -> Res<CheckoutSession> {
    ensure_url("success_url", &req.success_url)?;
    ensure_url("cancel_url", &req.cancel_url)?;

    let metadata = HashMap::from([
        ("price_id".to_string(), price_id.to_string()),
        ("user_id".to_string(), actor.id.clone()),
    ]);

    let params = CreateCheckoutSession {
        payment_method_types: Some(vec![stripe::CreateCheckoutSessionPaymentMethodTypes::Card]),
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Subscription),
        success_url: Some(req.success_url.as_str()),
        cancel_url: Some(req.cancel_url.as_str()),
        customer_email: Some(actor.email.as_str()),
        client_reference_id: Some(actor.id.as_str()),
        metadata: Some(metadata),
        ..Default::default()
    };

    let session = CheckoutSession::create(client, params)
        .await
        .map_err(AppError::from)?;
    log::info!(
        "Created checkout session {} for {} ({})",
        session.id,
        actor.id,
        price_id
    );
    Ok(session)
}
