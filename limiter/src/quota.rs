//! Generation quota per subscription tier.
//!
//! Paid tiers are unlimited. The Free tier gets a lifetime allowance of
//! [`FREE_GENERATION_LIMIT`] generations; it never refills.

use db::models::user::SubscriptionTier;

pub const FREE_GENERATION_LIMIT: i64 = 1;

/// Decides whether an actor with `tier` and `generation_count` past generations
/// may start a new one.
pub fn can_generate(tier: SubscriptionTier, generation_count: i64) -> bool {
    match tier {
        SubscriptionTier::Free => generation_count < FREE_GENERATION_LIMIT,
        SubscriptionTier::Monthly | SubscriptionTier::Yearly => true,
    }
}

/// Generations left before the gate closes. `None` means unlimited.
pub fn remaining_generations(tier: SubscriptionTier, generation_count: i64) -> Option<i64> {
    match tier {
        SubscriptionTier::Free => Some((FREE_GENERATION_LIMIT - generation_count).max(0)),
        SubscriptionTier::Monthly | SubscriptionTier::Yearly => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_tiers_always_generate() {
        for tier in [SubscriptionTier::Monthly, SubscriptionTier::Yearly] {
            for count in [0, 1, 2, 50, i64::MAX] {
                assert!(can_generate(tier, count), "{tier} at {count}");
            }
            assert_eq!(remaining_generations(tier, 10), None);
        }
    }

    #[test]
    fn free_tier_gets_exactly_one_generation() {
        assert!(can_generate(SubscriptionTier::Free, 0));
        for count in [1, 2, 7, i64::MAX] {
            assert!(!can_generate(SubscriptionTier::Free, count));
        }
    }

    #[test]
    fn free_remaining_never_goes_negative() {
        assert_eq!(remaining_generations(SubscriptionTier::Free, 0), Some(1));
        assert_eq!(remaining_generations(SubscriptionTier::Free, 1), Some(0));
        assert_eq!(remaining_generations(SubscriptionTier::Free, 5), Some(0));
    }
}
