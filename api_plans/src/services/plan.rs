use std::{sync::Arc, time::Duration};

use common::{
    error::{AppError, Res},
    jwt::Actor,
};
use db::user::UserStore;
use limiter::quota;

use crate::{dtos::plan::PlanForm, services::generator::PlanGenerator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Generator output, untouched.
    pub markdown: String,
    /// `None` if the usage counter could not be written.
    pub generation_count: Option<i64>,
}

/// Runs a plan request end to end: validation, quota gate, generation and
/// usage accounting for the calling actor.
pub struct PlanService {
    store: Arc<dyn UserStore>,
    generator: Arc<dyn PlanGenerator>,
    generator_timeout: Duration,
}

impl PlanService {
    pub fn new(
        store: Arc<dyn UserStore>,
        generator: Arc<dyn PlanGenerator>,
        generator_timeout: Duration,
    ) -> Self {
        PlanService {
            store,
            generator,
            generator_timeout,
        }
    }

    pub async fn request_plan(&self, actor: &Actor, form: PlanForm) -> Res<PlanOutcome> {
        let request = form.validate()?;

        let user = self
            .store
            .get_user(&actor.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("No account exists for this identity".to_string()))?;

        if !quota::can_generate(user.subscription_tier, user.generation_count) {
            log::info!(
                "User {} on {} tier reached the generation limit ({} used)",
                user.id,
                user.subscription_tier,
                user.generation_count
            );
            return Err(AppError::QuotaExceeded(
                "Upgrade your subscription to generate more plans".to_string(),
            ));
        }

        let markdown = tokio::time::timeout(self.generator_timeout, self.generator.generate(&request))
            .await
            .map_err(|_| {
                log::warn!("Plan generation for {} timed out", user.id);
                AppError::GenerationTimeout(self.generator_timeout.as_secs())
            })??;

        if markdown.trim().is_empty() {
            return Err(AppError::Generation("Generator returned an empty plan".to_string()));
        }

        let generation_count = match self.store.increment_generation_count(&user.id).await {
            Ok(count) => Some(count),
            Err(e) => {
                log::error!(
                    "Plan delivered to {} but usage counter was not written: {}",
                    user.id,
                    e
                );
                None
            }
        };

        log::info!(
            "Generated {} plan for {} ({} via {})",
            user.subscription_tier,
            user.id,
            request.app_category,
            request.build_tool
        );

        Ok(PlanOutcome {
            markdown,
            generation_count,
        })
    }
}
