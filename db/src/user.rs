use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use common::error::{AppError, Res};
use sqlx::PgPool;

use crate::{
    dtos::user::UserCreateRequest,
    models::user::{SubscriptionTier, User, UserRow},
};

/// Operations the service consumes from the user record store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts `{tier: Free, generation_count: 0}` for a new actor.
    /// Returns the existing record when the id is already present.
    async fn create_user(&self, data: UserCreateRequest) -> Res<User>;

    async fn get_user(&self, user_id: &str) -> Res<Option<User>>;

    /// Case-insensitive email lookup, oldest record first.
    async fn find_users_by_email(&self, email: &str) -> Res<Vec<User>>;

    async fn set_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) -> Res<User>;

    /// Atomically adds one to the usage counter and returns the new value.
    async fn increment_generation_count(&self, user_id: &str) -> Res<i64>;

    async fn reset_generation_count(&self, user_id: &str) -> Res<User>;
}

pub struct PgUserStore {
    pool: Arc<PgPool>,
}

impl PgUserStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn to_user(row: UserRow) -> Res<User> {
    User::try_from(row).map_err(AppError::Internal)
}

fn not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}

/// Maps unique violations (duplicate email) to a client error.
fn map_insert_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return AppError::BadRequest("Email is already registered".to_string());
        }
    }
    AppError::from(error)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, data: UserCreateRequest) -> Res<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&data.id)
        .bind(&data.email)
        .execute(&*self.pool)
        .await
        .map_err(map_insert_error)?;

        self.get_user(&data.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {} vanished after insert", data.id)))
    }

    async fn get_user(&self, user_id: &str) -> Res<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(to_user).transpose()
    }

    async fn find_users_by_email(&self, email: &str) -> Res<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE lower(email) = lower($1) ORDER BY created_at ASC",
        )
        .bind(email)
        .fetch_all(&*self.pool)
        .await?;
        rows.into_iter().map(to_user).collect()
    }

    async fn set_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) -> Res<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET subscription_tier = $1, updated_at = (now() AT TIME ZONE 'utc')
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(tier.as_str())
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?;
        row.map(to_user).transpose()?.ok_or_else(|| not_found(user_id))
    }

    async fn increment_generation_count(&self, user_id: &str) -> Res<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET generation_count = generation_count + 1, updated_at = (now() AT TIME ZONE 'utc')
            WHERE id = $1
            RETURNING generation_count
            "#,
        )
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?
        .ok_or_else(|| not_found(user_id))
    }

    async fn reset_generation_count(&self, user_id: &str) -> Res<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET generation_count = 0, updated_at = (now() AT TIME ZONE 'utc')
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?;
        row.map(to_user).transpose()?.ok_or_else(|| not_found(user_id))
    }
}

/// Bounds every call of the wrapped store by `limit`.
pub struct TimedUserStore<S> {
    inner: S,
    limit: Duration,
}

impl<S: UserStore> TimedUserStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = Res<T>> + Send,
    ) -> Res<T> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(res) => res,
            Err(_) => Err(AppError::Store(format!(
                "{} timed out after {}s",
                operation,
                self.limit.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl<S: UserStore> UserStore for TimedUserStore<S> {
    async fn create_user(&self, data: UserCreateRequest) -> Res<User> {
        self.bounded("create_user", self.inner.create_user(data)).await
    }

    async fn get_user(&self, user_id: &str) -> Res<Option<User>> {
        self.bounded("get_user", self.inner.get_user(user_id)).await
    }

    async fn find_users_by_email(&self, email: &str) -> Res<Vec<User>> {
        self.bounded("find_users_by_email", self.inner.find_users_by_email(email))
            .await
    }

    async fn set_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) -> Res<User> {
        self.bounded(
            "set_subscription_tier",
            self.inner.set_subscription_tier(user_id, tier),
        )
        .await
    }

    async fn increment_generation_count(&self, user_id: &str) -> Res<i64> {
        self.bounded(
            "increment_generation_count",
            self.inner.increment_generation_count(user_id),
        )
        .await
    }

    async fn reset_generation_count(&self, user_id: &str) -> Res<User> {
        self.bounded(
            "reset_generation_count",
            self.inner.reset_generation_count(user_id),
        )
        .await
    }
}
