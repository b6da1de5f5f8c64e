use common::env_config::Config;
use common::error::{AppError, Res};
use common::jwt::Actor;
use db::dtos::user::UserCreateRequest;
use db::models::user::{SubscriptionTier, User};
use db::user::UserStore;

/// Creates the record of a freshly signed-up actor. Calling it again for the
/// same actor returns the existing record untouched.
pub async fn signup(store: &dyn UserStore, actor: &Actor) -> Res<User> {
    let user = store
        .create_user(UserCreateRequest {
            id: actor.id.clone(),
            email: actor.email.clone(),
        })
        .await?;
    log::info!("Signed up user {} ({})", user.id, user.email);
    Ok(user)
}

pub async fn get_profile(store: &dyn UserStore, actor: &Actor) -> Res<User> {
    store
        .get_user(&actor.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("No account exists for this identity".to_string()))
}

fn ensure_admin(config: &Config, actor: &Actor) -> Res<()> {
    if config.is_admin(&actor.email) {
        Ok(())
    } else {
        log::warn!("Actor {} attempted an admin action", actor.id);
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Administrative tier change, bypassing the payment flow.
pub async fn override_tier(
    store: &dyn UserStore,
    config: &Config,
    actor: &Actor,
    user_id: &str,
    tier: SubscriptionTier,
) -> Res<User> {
    ensure_admin(config, actor)?;
    let user = store.set_subscription_tier(user_id, tier).await?;
    log::info!(
        "Admin {} set subscription of {} to {}",
        actor.id,
        user_id,
        tier
    );
    Ok(user)
}

/// Administrative reset of the usage counter.
pub async fn reset_usage(
    store: &dyn UserStore,
    config: &Config,
    actor: &Actor,
    user_id: &str,
) -> Res<User> {
    ensure_admin(config, actor)?;
    let user = store.reset_generation_count(user_id).await?;
    log::info!("Admin {} reset generation count of {}", actor.id, user_id);
    Ok(user)
}
