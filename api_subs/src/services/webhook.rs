use chrono::Utc;
use common::error::{AppError, Res};
use db::{models::user::SubscriptionTier, user::UserStore};

use crate::{
    misc::signature::verify_signature,
    models::{
        event::{CHECKOUT_COMPLETED, PaymentEvent},
        sub::PriceTable,
    },
};

/// Everything the reconciler needs, passed in per call.
pub struct WebhookContext<'a> {
    pub store: &'a dyn UserStore,
    pub prices: &'a PriceTable,
    pub webhook_secret: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Updated {
        user_id: String,
        tier: SubscriptionTier,
    },
    Ignored {
        event_type: String,
    },
    /// Logged and acknowledged; no tier was touched.
    UnmappedPrice {
        price_id: String,
    },
}

impl WebhookOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            WebhookOutcome::Updated { .. } => "updated",
            WebhookOutcome::Ignored { .. } => "ignored",
            WebhookOutcome::UnmappedPrice { .. } => "unmapped_price",
        }
    }
}

/// Applies a verified checkout completion to the buyer's subscription tier.
///
/// Replaying the same event writes the same tier again.
pub async fn handle_event(
    raw_payload: &[u8],
    signature_header: &str,
    ctx: &WebhookContext<'_>,
) -> Res<WebhookOutcome> {
    verify_signature(
        raw_payload,
        signature_header,
        ctx.webhook_secret,
        Utc::now().timestamp(),
    )
    .inspect_err(|e| log::warn!("Rejected webhook call: {}", e))?;

    let event = PaymentEvent::from_payload(raw_payload)?;
    log::info!("Processing webhook event {} ({})", event.event_id, event.event_type);

    if event.event_type != CHECKOUT_COMPLETED {
        log::info!("Unhandled event type: {}", event.event_type);
        return Ok(WebhookOutcome::Ignored {
            event_type: event.event_type,
        });
    }

    let (Some(email), Some(price_id)) = (event.customer_email, event.price_id) else {
        return Err(AppError::MalformedPayload(format!(
            "Event {} carries no customer email or price",
            event.event_id
        )));
    };

    let Some(tier) = ctx.prices.tier_for(&price_id) else {
        log::error!(
            "Event {} references unknown price {}; no tier change for {}",
            event.event_id,
            price_id,
            email
        );
        return Ok(WebhookOutcome::UnmappedPrice { price_id });
    };

    let users = ctx.store.find_users_by_email(&email).await?;
    let user = match users.as_slice() {
        [] => {
            return Err(AppError::NotFound(format!(
                "No user with email {} for event {}",
                email, event.event_id
            )));
        }
        [user] => user,
        [user, ..] => {
            log::warn!(
                "{} users share email {}; updating the oldest ({})",
                users.len(),
                email,
                user.id
            );
            user
        }
    };

    let updated = ctx.store.set_subscription_tier(&user.id, tier).await?;
    log::info!(
        "Subscription of {} set to {} by event {}",
        updated.id,
        updated.subscription_tier,
        event.event_id
    );

    Ok(WebhookOutcome::Updated {
        user_id: updated.id,
        tier: updated.subscription_tier,
    })
}
