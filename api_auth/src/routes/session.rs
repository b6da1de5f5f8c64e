use std::sync::Arc;

use actix_session::Session;
use actix_web::{HttpMessage, HttpRequest, Responder, delete, get, post, web};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::http::Success;
use common::jwt::{self, Actor, IdentityClaims};
use extractor::SESSION_TOKEN_KEY;
use serde_json::json;

use crate::dtos::auth::{SessionRequest, SessionResponse};

/// Stores an identity token issued by the identity provider in the cookie session.
///
/// The token is verified before it is stored, and again on every later request,
/// so the cookie never acts as a trusted identity on its own.
///
/// # Input
/// - `req`: JSON payload with the provider-issued `token`
///
/// # Output
/// - Success: 200 with the verified actor `{ id, email }`
/// - Error: 401 if the token fails verification
///
/// # Frontend Example
/// ```javascript
/// const idToken = await currentUser.getIdToken();
/// await fetch('/api/auth/session', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ token: idToken })
/// });
/// ```
#[post("/session")]
async fn post_session(
    req: web::Json<SessionRequest>,
    config: web::Data<Arc<Config>>,
    session: Session,
) -> Res<impl Responder> {
    let claims = jwt::validate_jwt(&req.token, &config.jwt_config)?;

    session.renew();
    session
        .insert(SESSION_TOKEN_KEY, &req.token)
        .map_err(|_| AppError::Internal("Failed to insert token cookie".to_string()))?;

    Success::ok(SessionResponse {
        actor: Actor::from(claims),
    })
}

/// Returns the identity verified for the current request, whether it came
/// from the bearer header or the session cookie.
#[get("/session")]
async fn get_session(req: HttpRequest) -> Res<impl Responder> {
    let claims = req
        .extensions()
        .get::<Res<IdentityClaims>>()
        .map(|claims| {
            claims
                .as_ref()
                .map(|claims| claims.clone())
                .map_err(|e| AppError::Unauthorized(e.to_string()))
        })
        .unwrap_or_else(|| Err(AppError::Unauthorized("No active session".to_string())))?;

    Success::ok(SessionResponse {
        actor: Actor::from(claims),
    })
}

/// Signs the actor out by dropping the session cookie.
#[delete("/session")]
async fn delete_session(session: Session) -> Res<impl Responder> {
    session.purge();
    Success::ok(json!({ "signed_out": true }))
}
