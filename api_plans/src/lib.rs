use actix_web::web;

pub mod export;

pub mod routes {
    pub mod plan;
}

pub mod services {
    pub mod generator;
    pub mod plan;
}

pub mod dtos {
    pub mod plan;
}

pub fn mount_plans() -> actix_web::Scope {
    web::scope("/plan").service(routes::plan::post_plan)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use actix_web::{App, body::to_bytes, http::StatusCode, test, web};
    use common::{
        env_config::Config,
        jwt::{generate_jwt, identity_claims},
    };
    use db::{memory::MemoryUserStore, models::user::SubscriptionTier, user::UserStore};
    use serde_json::{Value, json};

    use super::*;
    use crate::services::plan::{
        PlanService,
        tests::{CountingGenerator, PLAN},
    };

    struct Harness {
        config: Arc<Config>,
        store: Arc<MemoryUserStore>,
        generator: Arc<CountingGenerator>,
    }

    impl Harness {
        async fn new(tier: SubscriptionTier, count: i64) -> Self {
            let store = Arc::new(MemoryUserStore::new());
            store.seed("u1", "u1@example.com", tier, count).await;
            Harness {
                config: Config::for_tests(),
                store,
                generator: Arc::new(CountingGenerator::returning(PLAN)),
            }
        }

        fn bearer(&self) -> (String, String) {
            let token = generate_jwt(
                &identity_claims("u1", "u1@example.com", 3600),
                &self.config.jwt_config.secret,
            )
            .unwrap();
            ("Authorization".to_string(), format!("Bearer {}", token))
        }

        fn service(&self) -> web::Data<PlanService> {
            web::Data::new(PlanService::new(
                self.store.clone(),
                self.generator.clone(),
                Duration::from_secs(5),
            ))
        }
    }

    macro_rules! app {
        ($h:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($h.config.clone()))
                    .app_data($h.service())
                    .wrap(extractor::middleware())
                    .service(
                        web::scope("/api/dashboard")
                            .wrap(api_auth::auth_middleware())
                            .service(mount_plans()),
                    ),
            )
            .await
        };
    }

    fn plant_body() -> Value {
        json!({
            "idea_text": "A plant watering reminder app with care tips",
            "app_category": "Mobile App",
            "build_tool": "Windsurf"
        })
    }

    #[actix_web::test]
    async fn plan_is_returned_as_json() {
        let h = Harness::new(SubscriptionTier::Free, 0).await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/dashboard/plan")
            .insert_header(h.bearer())
            .set_json(plant_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["markdown"], PLAN);
        assert_eq!(body["generation_count"], 1);
        assert_eq!(body["file_name"], "braindump_plan.md");
        assert_eq!(h.generator.calls(), 1);
    }

    #[actix_web::test]
    async fn download_answers_markdown_file() {
        let h = Harness::new(SubscriptionTier::Yearly, 3).await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/dashboard/plan?download=true")
            .insert_header(h.bearer())
            .set_json(plant_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-disposition").unwrap(),
            "attachment; filename=\"braindump_plan.md\""
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, PLAN.as_bytes());
        assert_eq!(h.store.get_user("u1").await.unwrap().unwrap().generation_count, 4);
    }

    #[actix_web::test]
    async fn exhausted_quota_answers_payment_required() {
        let h = Harness::new(SubscriptionTier::Free, 1).await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/dashboard/plan")
            .insert_header(h.bearer())
            .set_json(plant_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(h.generator.calls(), 0);
    }

    #[actix_web::test]
    async fn invalid_form_lists_issues() {
        let h = Harness::new(SubscriptionTier::Free, 0).await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/dashboard/plan")
            .insert_header(h.bearer())
            .set_json(json!({ "idea_text": "short", "app_category": "Web App" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        let issues = body["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(h.generator.calls(), 0);
    }

    #[actix_web::test]
    async fn anonymous_request_is_rejected() {
        let h = Harness::new(SubscriptionTier::Free, 0).await;
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/dashboard/plan")
            .set_json(plant_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.generator.calls(), 0);
    }
}
