use std::sync::Arc;

use actix_web::{Responder, post, put, web};
use common::{env_config::Config, error::Res, http::Success, jwt::Actor};
use db::user::UserStore;

use crate::{
    dtos::auth::{ProfileResponse, TierOverrideRequest},
    services,
};

/// Sets a user's subscription tier without going through the payment flow.
/// Restricted to actors whose verified email is listed in `ADMIN_EMAILS`.
#[put("/{user_id}/tier")]
async fn put_user_tier(
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
    req: web::Json<TierOverrideRequest>,
    store: web::Data<Arc<dyn UserStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let store = store.get_ref().as_ref();
    let user = services::user::override_tier(store, &config, &actor, &path, req.tier).await?;
    Success::ok(ProfileResponse::from(user))
}

#[post("/{user_id}/reset-usage")]
async fn post_reset_usage(
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
    store: web::Data<Arc<dyn UserStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let store = store.get_ref().as_ref();
    let user = services::user::reset_usage(store, &config, &actor, &path).await?;
    Success::ok(ProfileResponse::from(user))
}
