mod cors;

use std::{sync::Arc, time::Duration};

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_plans::services::{
    generator::{LlmPlanGenerator, PlanGenerator},
    plan::PlanService,
};
use api_subs::models::sub::PriceTable;
use common::env_config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let origin = config.cors_allowed_origin.clone();
    let cookie_secure = !origin.contains("localhost");

    // init logger
    logger::setup(config.console_logging_enabled).expect("Failed to set up logger");
    if config.stripe.webhook_secret.is_empty() {
        log::warn!("STRIPE_WEBHOOK_SECRET is not set; payment webhooks will be refused");
    }

    // init user store
    let store = db::connect(&config)
        .await
        .expect("Failed to set up user store");

    // payment gateway
    let client = common::stripe::create_client(&config.stripe.secret_key);
    let prices = PriceTable::from_config(&config.stripe);

    // plan generation
    let generator: Arc<dyn PlanGenerator> =
        Arc::new(LlmPlanGenerator::new(config.generator.clone()));
    let plans = web::Data::new(PlanService::new(
        store.clone(),
        generator,
        Duration::from_secs(config.generator.timeout_secs),
    ));

    log::info!(
        "Starting {} server on {}:{}",
        config.environment,
        config.server_host,
        config.server_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(prices.clone()))
            .app_data(plans.clone())
            .wrap(limiter::global_middleware(config_data.global_rate_limit)) // 5th
            .wrap(logger::middleware(config_data.console_logging_enabled)) // 4th
            .wrap(extractor::middleware()) // 3rd
            .wrap(cors::middleware(&origin)) // 2nd
            .wrap(api_auth::session_middleware(
                cookie_secure,
                &config_data.session_key,
            )) // 1st
            .service(
                web::scope("/api")
                    .service(api_auth::mount_auth())
                    .service(api_subs::mount_webhook())
                    .service(api_subs::mount_subs())
                    .service(
                        web::scope("/dashboard")
                            .wrap(api_auth::auth_middleware())
                            .service(api_auth::mount_user())
                            .service(api_plans::mount_plans())
                            .service(api_subs::mount_pay()),
                    )
                    .service(api_auth::mount_admin()),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
