use actix_web::{HttpMessage, dev::ServiceRequest};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    env_config::JwtConfig,
    error::{AppError, Res},
};

/// Claims of an identity token issued by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdentityClaims {
    /// Actor id.
    pub sub: String,
    pub email: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// The verified identity of the caller, passed explicitly into every privileged call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: String,
    pub email: String,
}

impl From<IdentityClaims> for Actor {
    fn from(claims: IdentityClaims) -> Self {
        Actor {
            id: claims.sub,
            email: claims.email,
        }
    }
}

/// Verifies signature, expiry and (when configured) issuer of an identity token.
pub fn validate_jwt(token: &str, config: &JwtConfig) -> Res<IdentityClaims> {
    let mut validation = Validation::default();
    if let Some(issuer) = &config.issuer {
        // tokens without `iss` must fail too
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[issuer]);
    }

    let token_data = jsonwebtoken::decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid identity token: {}", e)))?;

    let claims = token_data.claims;
    if claims.sub.trim().is_empty() || claims.email.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "Identity token has no subject or email".to_string(),
        ));
    }
    Ok(claims)
}

/// Returns the verified actor stored on the request by the extraction middleware.
pub fn get_actor_or_error(req: &ServiceRequest) -> Res<Actor> {
    match req.extensions().get::<Res<IdentityClaims>>() {
        Some(Ok(claims)) => Ok(Actor::from(claims.clone())),
        Some(Err(error)) => Err(AppError::Unauthorized(error.to_string())),
        None => Err(AppError::Unauthorized(
            "No authorization token provided".to_string(),
        )),
    }
}

/// Signs identity claims with the shared secret. Used by tooling and tests that
/// stand in for the identity provider.
pub fn generate_jwt(claims: &IdentityClaims, secret: &str) -> Res<String> {
    jsonwebtoken::encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Claims for `id`/`email` expiring `valid_for_secs` from now.
pub fn identity_claims(id: &str, email: &str, valid_for_secs: i64) -> IdentityClaims {
    IdentityClaims {
        sub: id.to_string(),
        email: email.to_string(),
        exp: (Utc::now().timestamp() + valid_for_secs).max(0) as usize,
        iss: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(id: &str, email: &str, secret: &str, valid_for_secs: i64) -> String {
        generate_jwt(&identity_claims(id, email, valid_for_secs), secret).unwrap()
    }

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            issuer: None,
        }
    }

    #[test]
    fn accepts_token_signed_with_shared_secret() {
        let token = sign("uid-1", "a@example.com", "test-secret", 3600);
        let claims = validate_jwt(&token, &config()).unwrap();
        assert_eq!(claims.sub, "uid-1");
        assert_eq!(Actor::from(claims).email, "a@example.com");
    }

    #[test]
    fn rejects_forged_and_expired_tokens() {
        let forged = sign("uid-1", "a@example.com", "other", 3600);
        assert!(matches!(
            validate_jwt(&forged, &config()),
            Err(AppError::Unauthorized(_))
        ));

        let expired = sign("uid-1", "a@example.com", "test-secret", -7200);
        assert!(validate_jwt(&expired, &config()).is_err());
    }

    fn sign_with_issuer(issuer: &str) -> String {
        let claims = IdentityClaims {
            iss: Some(issuer.to_string()),
            ..identity_claims("uid-1", "a@example.com", 3600)
        };
        generate_jwt(&claims, "test-secret").unwrap()
    }

    #[test]
    fn enforces_issuer_when_configured() {
        let config = JwtConfig {
            issuer: Some("https://issuer.example.com".to_string()),
            ..config()
        };

        let without_issuer = sign("uid-1", "a@example.com", "test-secret", 3600);
        assert!(matches!(
            validate_jwt(&without_issuer, &config),
            Err(AppError::Unauthorized(_))
        ));

        let wrong_issuer = sign_with_issuer("https://elsewhere.example.com");
        assert!(validate_jwt(&wrong_issuer, &config).is_err());

        let right_issuer = sign_with_issuer("https://issuer.example.com");
        assert_eq!(validate_jwt(&right_issuer, &config).unwrap().sub, "uid-1");
    }
}
