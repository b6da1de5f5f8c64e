use actix_session::{
    SessionMiddleware, config::PersistentSession, storage::CookieSessionStore,
};
use actix_web::{
    cookie::{Key, SameSite, time::Duration},
    web,
};
use middleware::auth::AuthMiddleware;
use sha2::{Digest, Sha512};

pub mod middleware {
    pub mod auth;
}

pub mod routes {
    pub mod admin;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod user;
}

pub mod dtos {
    pub mod auth;
}

pub const SESSION_COOKIE_NAME: &str = "braindump_session";

/// Cookie session holding the identity token between requests.
/// The signing key is derived from `SESSION_KEY`, so any length of secret works.
pub fn session_middleware(
    cookie_secure: bool,
    session_key: &str,
) -> SessionMiddleware<CookieSessionStore> {
    let key = Key::from(Sha512::digest(session_key.as_bytes()).as_slice());

    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.to_string())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::days(7)))
        .build()
}

pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}

pub fn mount_auth() -> actix_web::Scope {
    web::scope("/auth")
        .service(routes::session::post_session)
        .service(routes::session::get_session)
        .service(routes::session::delete_session)
        .service(
            web::scope("/signup")
                .wrap(auth_middleware())
                .service(routes::user::post_signup),
        )
}

pub fn mount_user() -> actix_web::Scope {
    web::scope("/me").service(routes::user::get_me)
}

pub fn mount_admin() -> actix_web::Scope {
    web::scope("/admin").service(
        web::scope("/users")
            .wrap(auth_middleware())
            .service(routes::admin::put_user_tier)
            .service(routes::admin::post_reset_usage),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test, web};
    use common::{
        env_config::Config,
        jwt::{generate_jwt, identity_claims},
    };
    use db::{
        memory::MemoryUserStore,
        models::user::SubscriptionTier,
        user::UserStore,
    };
    use serde_json::{Value, json};

    use super::*;

    fn bearer(config: &Config, id: &str, email: &str) -> (String, String) {
        let token = generate_jwt(
            &identity_claims(id, email, 3600),
            &config.jwt_config.secret,
        )
        .unwrap();
        ("Authorization".to_string(), format!("Bearer {}", token))
    }

    macro_rules! app {
        ($config:expr, $store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($config.clone()))
                    .app_data(web::Data::new($store.clone()))
                    .wrap(extractor::middleware())
                    .wrap(session_middleware(false, "test-session-key"))
                    .service(
                        web::scope("/api")
                            .service(mount_auth())
                            .service(
                                web::scope("/dashboard")
                                    .wrap(auth_middleware())
                                    .service(mount_user()),
                            )
                            .service(mount_admin()),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn signup_is_idempotent_and_starts_free() {
        let config = Config::for_tests();
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let app = app!(config, store);

        for expected in [StatusCode::CREATED, StatusCode::CREATED] {
            let req = test::TestRequest::post()
                .uri("/api/auth/signup")
                .insert_header(bearer(&config, "u1", "a@x.com"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["subscription_tier"], "Free");
            assert_eq!(body["generation_count"], 0);
            assert_eq!(body["can_generate"], true);
        }

        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[actix_web::test]
    async fn signup_without_identity_is_rejected() {
        let config = Config::for_tests();
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let app = app!(config, store);

        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(store.get_user("u1").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn me_reports_quota_state() {
        let config = Config::for_tests();
        let memory = MemoryUserStore::new();
        memory
            .seed("u1", "a@x.com", SubscriptionTier::Free, 1)
            .await;
        let store: Arc<dyn UserStore> = Arc::new(memory);
        let app = app!(config, store);

        let req = test::TestRequest::get()
            .uri("/api/dashboard/me")
            .insert_header(bearer(&config, "u1", "a@x.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["can_generate"], false);
        assert_eq!(body["remaining_generations"], 0);
    }

    #[actix_web::test]
    async fn me_without_record_is_unauthorized() {
        let config = Config::for_tests();
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let app = app!(config, store);

        let req = test::TestRequest::get()
            .uri("/api/dashboard/me")
            .insert_header(bearer(&config, "ghost", "ghost@x.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn session_cookie_carries_identity() {
        let config = Config::for_tests();
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let app = app!(config, store);

        let token = generate_jwt(
            &identity_claims("u1", "a@x.com", 3600),
            &config.jwt_config.secret,
        )
        .unwrap();
        let req = test::TestRequest::post()
            .uri("/api/auth/session")
            .set_json(json!({ "token": token }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE_NAME)
            .unwrap()
            .into_owned();

        let req = test::TestRequest::get()
            .uri("/api/auth/session")
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["actor"]["id"], "u1");
    }

    #[actix_web::test]
    async fn forged_session_token_is_rejected() {
        let config = Config::for_tests();
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let app = app!(config, store);

        let forged = generate_jwt(&identity_claims("u1", "a@x.com", 3600), "other").unwrap();
        let req = test::TestRequest::post()
            .uri("/api/auth/session")
            .set_json(json!({ "token": forged }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn admin_routes_require_admin_email() {
        let config = Config::for_tests();
        let memory = MemoryUserStore::new();
        memory
            .seed("u1", "a@x.com", SubscriptionTier::Free, 1)
            .await;
        let store: Arc<dyn UserStore> = Arc::new(memory);
        let app = app!(config, store);

        let req = test::TestRequest::put()
            .uri("/api/admin/users/u1/tier")
            .insert_header(bearer(&config, "u1", "a@x.com"))
            .set_json(json!({ "tier": "Monthly" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.subscription_tier, SubscriptionTier::Free);

        let req = test::TestRequest::put()
            .uri("/api/admin/users/u1/tier")
            .insert_header(bearer(&config, "root", "Admin@Example.com"))
            .set_json(json!({ "tier": "Monthly" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/admin/users/u1/reset-usage")
            .insert_header(bearer(&config, "root", "admin@example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.subscription_tier, SubscriptionTier::Monthly);
        assert_eq!(user.generation_count, 0);
    }
}
