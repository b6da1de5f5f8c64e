use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::error::{AppError, Res};
use tokio::sync::Mutex;

use crate::{
    dtos::user::UserCreateRequest,
    models::user::{SubscriptionTier, User},
    user::UserStore,
};

/// In-process user store with the same semantics as the Postgres one.
/// Used for local runs (`DATABASE_URL=memory`) and tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, bypassing signup defaults.
    pub async fn insert(&self, user: User) {
        self.users.lock().await.insert(user.id.clone(), user);
    }

    /// Creates a record with the given tier and usage count.
    pub async fn seed(&self, id: &str, email: &str, tier: SubscriptionTier, count: i64) -> User {
        let now = Utc::now().naive_utc();
        let user = User {
            id: id.to_string(),
            email: email.to_string(),
            subscription_tier: tier,
            generation_count: count,
            created_at: now,
            updated_at: now,
        };
        self.insert(user.clone()).await;
        user
    }
}

/// Matches Postgres `lower(email) = lower($1)`, which folds non-ASCII letters too.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, data: UserCreateRequest) -> Res<User> {
        let mut users = self.users.lock().await;
        if let Some(existing) = users.get(&data.id) {
            return Ok(existing.clone());
        }
        if users
            .values()
            .any(|user| same_email(&user.email, &data.email))
        {
            return Err(AppError::BadRequest(
                "Email is already registered".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let user = User {
            id: data.id.clone(),
            email: data.email,
            subscription_tier: SubscriptionTier::Free,
            generation_count: 0,
            created_at: now,
            updated_at: now,
        };
        users.insert(data.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Res<Option<User>> {
        Ok(self.users.lock().await.get(user_id).cloned())
    }

    async fn find_users_by_email(&self, email: &str) -> Res<Vec<User>> {
        let users = self.users.lock().await;
        let mut matches: Vec<User> = users
            .values()
            .filter(|user| same_email(&user.email, email))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn set_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) -> Res<User> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        user.subscription_tier = tier;
        user.updated_at = Utc::now().naive_utc();
        Ok(user.clone())
    }

    async fn increment_generation_count(&self, user_id: &str) -> Res<i64> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        user.generation_count += 1;
        user.updated_at = Utc::now().naive_utc();
        Ok(user.generation_count)
    }

    async fn reset_generation_count(&self, user_id: &str) -> Res<User> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        user.generation_count = 0;
        user.updated_at = Utc::now().naive_utc();
        Ok(user.clone())
    }
}
