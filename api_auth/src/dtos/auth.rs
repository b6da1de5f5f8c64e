use common::jwt::Actor;
use db::models::user::{SubscriptionTier, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    /// Identity token issued by the identity provider.
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub actor: Actor,
}

/// User record plus the quota state the dashboard reflects.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub can_generate: bool,
    /// `null` when the tier is unlimited.
    pub remaining_generations: Option<i64>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        ProfileResponse {
            can_generate: limiter::quota::can_generate(
                user.subscription_tier,
                user.generation_count,
            ),
            remaining_generations: limiter::quota::remaining_generations(
                user.subscription_tier,
                user.generation_count,
            ),
            user,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TierOverrideRequest {
    pub tier: SubscriptionTier,
}
