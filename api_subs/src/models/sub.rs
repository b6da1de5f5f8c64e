use common::env_config::StripeConfig;
use db::models::user::SubscriptionTier;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPlan {
    pub tier: SubscriptionTier,
    pub price_id: String,
    pub interval: &'static str,
}

/// Maps gateway price ids to the tier they grant.
#[derive(Debug, Clone)]
pub struct PriceTable {
    monthly: String,
    yearly: String,
}

impl PriceTable {
    pub fn new(monthly: &str, yearly: &str) -> Self {
        PriceTable {
            monthly: monthly.to_string(),
            yearly: yearly.to_string(),
        }
    }

    pub fn from_config(config: &StripeConfig) -> Self {
        Self::new(&config.monthly_price_id, &config.yearly_price_id)
    }

    pub fn tier_for(&self, price_id: &str) -> Option<SubscriptionTier> {
        if price_id == self.monthly {
            Some(SubscriptionTier::Monthly)
        } else if price_id == self.yearly {
            Some(SubscriptionTier::Yearly)
        } else {
            None
        }
    }

    /// `None` for Free, which is never sold.
    pub fn price_for(&self, tier: SubscriptionTier) -> Option<&str> {
        match tier {
            SubscriptionTier::Free => None,
            SubscriptionTier::Monthly => Some(&self.monthly),
            SubscriptionTier::Yearly => Some(&self.yearly),
        }
    }

    pub fn plans(&self) -> Vec<SubscriptionPlan> {
        vec![
            SubscriptionPlan {
                tier: SubscriptionTier::Monthly,
                price_id: self.monthly.clone(),
                interval: "month",
            },
            SubscriptionPlan {
                tier: SubscriptionTier::Yearly,
                price_id: self.yearly.clone(),
                interval: "year",
            },
        ]
    }
}
