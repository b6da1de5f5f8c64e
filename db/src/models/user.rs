use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubscriptionTier {
    #[default]
    Free,
    Monthly,
    Yearly,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Monthly => "Monthly",
            SubscriptionTier::Yearly => "Yearly",
        }
    }

    pub fn is_paid(&self) -> bool {
        *self != SubscriptionTier::Free
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(SubscriptionTier::Free),
            "Monthly" => Ok(SubscriptionTier::Monthly),
            "Yearly" => Ok(SubscriptionTier::Yearly),
            other => Err(format!("Unknown subscription tier: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub subscription_tier: SubscriptionTier,
    pub generation_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Row as stored in Postgres; the tier column is plain text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub email: String,
    pub subscription_tier: String,
    pub generation_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            subscription_tier: row.subscription_tier.parse()?,
            id: row.id,
            email: row.email,
            generation_count: row.generation_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
