use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use common::{error::Res, http::Success, jwt::Actor};
use db::user::UserStore;

use crate::{dtos::auth::ProfileResponse, services};

/// Creates the user record for the signed-in actor.
///
/// Called once by the web app right after the identity provider finished the
/// signup. The record starts on the Free tier with no generations used.
/// Repeated calls return the existing record.
///
/// # Output
/// - Success: 201 with the user record
/// - Error: 401 without a verified identity, 400 if the email belongs to another account
#[post("")]
async fn post_signup(
    actor: web::ReqData<Actor>,
    store: web::Data<Arc<dyn UserStore>>,
) -> Res<impl Responder> {
    let user = services::user::signup(store.get_ref().as_ref(), &actor).await?;
    Success::created(ProfileResponse::from(user))
}

/// Endpoint to retrieve the current actor's record and quota state.
///
/// # Output
/// - Success: the user record with `can_generate` and `remaining_generations`
/// - Error: 401 if no valid token is provided or no record exists for it
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/me', {
///   headers: { 'Authorization': `Bearer ${idToken}` }
/// });
/// const me = await response.json();
/// // { id, email, subscription_tier: "Free", generation_count: 0,
/// //   can_generate: true, remaining_generations: 1, ... }
/// ```
#[get("")]
async fn get_me(
    actor: web::ReqData<Actor>,
    store: web::Data<Arc<dyn UserStore>>,
) -> Res<impl Responder> {
    let user = services::user::get_profile(store.get_ref().as_ref(), &actor).await?;
    Success::ok(ProfileResponse::from(user))
}
