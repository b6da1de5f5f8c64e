use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_session::SessionExt;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use futures::future::{Ready, ok};

use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::{self, IdentityClaims},
};

use crate::SESSION_TOKEN_KEY;

/// Verifies the identity token of every request, if one is present, and stores
/// the outcome as `Res<IdentityClaims>` in the request extensions.
///
/// The token is read from `Authorization: Bearer <token>` first and from the
/// cookie session second. Nothing here rejects a request; guards downstream
/// decide whether an identity is required.
pub struct ExtractionMiddleware {}

impl ExtractionMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ExtractionMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for ExtractionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = ExtractionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ExtractionMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct ExtractionMiddlewareService<S> {
    service: Rc<S>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

fn session_token(req: &ServiceRequest) -> Option<String> {
    match req.get_session().get::<String>(SESSION_TOKEN_KEY) {
        Ok(token) => token,
        Err(e) => {
            log::warn!("Unreadable session cookie: {}", e);
            None
        }
    }
}

impl<S, B> Service<ServiceRequest> for ExtractionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);

        let config = match req.app_data::<web::Data<Arc<Config>>>() {
            Some(config) => config.get_ref().clone(),
            None => {
                return Box::pin(async move {
                    Ok(req.error_response(AppError::Internal(
                        "Configuration is not registered".to_string(),
                    )))
                });
            }
        };

        let token = bearer_token(&req).or_else(|| session_token(&req));

        Box::pin(async move {
            if let Some(token) = token {
                let claims_res = jwt::validate_jwt(&token, &config.jwt_config);
                if let Err(e) = &claims_res {
                    log::debug!("Rejected identity token: {}", e);
                }
                req.extensions_mut().insert::<Res<IdentityClaims>>(claims_res);
            }
            srv.call(req).await.map(|res| res.map_into_boxed_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpMessage, HttpRequest, HttpResponse, test, web};
    use common::jwt::{generate_jwt, identity_claims};

    use super::*;

    async fn whoami(req: HttpRequest) -> HttpResponse {
        let body = match req.extensions().get::<Res<IdentityClaims>>() {
            Some(Ok(claims)) => claims.sub.clone(),
            Some(Err(_)) => "invalid".to_string(),
            None => "anonymous".to_string(),
        };
        HttpResponse::Ok().body(body)
    }

    async fn call(token: Option<String>) -> String {
        let config = Config::for_tests();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .wrap(ExtractionMiddleware::new())
                .route("/", web::get().to(whoami)),
        )
        .await;

        let mut req = test::TestRequest::get().uri("/");
        if let Some(token) = token {
            req = req.insert_header(("Authorization", format!("Bearer {}", token)));
        }
        let body = test::call_and_read_body(&app, req.to_request()).await;
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn stores_verified_claims() {
        let secret = &Config::for_tests().jwt_config.secret;
        let token = generate_jwt(&identity_claims("uid-1", "a@example.com", 600), secret).unwrap();
        assert_eq!(call(Some(token)).await, "uid-1");
    }

    #[actix_web::test]
    async fn marks_forged_tokens_invalid() {
        let token = generate_jwt(&identity_claims("uid-1", "a@example.com", 600), "forged").unwrap();
        assert_eq!(call(Some(token)).await, "invalid");
    }

    #[actix_web::test]
    async fn leaves_anonymous_requests_alone() {
        assert_eq!(call(None).await, "anonymous");
    }
}
