use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

/// Validation message attached to a single request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    // === APPLICATION ERRORS ===
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("Generation limit reached: {0}")]
    QuotaExceeded(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Webhook signature error: {0}")]
    Signature(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequests(String),

    #[error("Plan generation failed: {0}")]
    Generation(String),

    #[error("Plan generation timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("Store operation failed: {0}")]
    Store(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may resubmit the same request and expect a different result.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            AppError::Generation(_)
                | AppError::GenerationTimeout(_)
                | AppError::Reqwest(_)
                | AppError::Persistence(_)
                | AppError::Store(_)
        )
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "error": err_msg })
            } else {
                serde_json::json!({ "error": "Internal server error" })
            }
        };
        let to_json = || serde_json::json!({ "error": self.to_string() });

        match self {
            // === CONVERSION ERRORS ===
            AppError::Persistence(error) => {
                log::error!("Persistence error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::JWT(error) => {
                log::error!("JWT error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Reqwest(error) => {
                log::error!("Reqwest error: {}", error);
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "Upstream service unavailable",
                    "retriable": true,
                }))
            }
            AppError::Stripe(error) => {
                log::error!("Stripe error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }

            // === APPLICATION ERRORS ===
            AppError::Validation(issues) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": self.to_string(),
                "issues": issues,
            })),
            AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(to_json()),
            AppError::QuotaExceeded(_) => HttpResponse::PaymentRequired().json(to_json()),
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(to_json()),
            AppError::NotFound(_) => HttpResponse::NotFound().json(to_json()),
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(to_json()),
            AppError::Signature(_) => HttpResponse::BadRequest().json(to_json()),
            AppError::MalformedPayload(_) => HttpResponse::BadRequest().json(to_json()),
            AppError::TooManyRequests(_) => HttpResponse::TooManyRequests().json(to_json()),

            AppError::Generation(error) => {
                log::error!("Generation error: {}", error);
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "An unexpected error occurred. Please try again.",
                    "retriable": true,
                }))
            }
            AppError::GenerationTimeout(_) => {
                log::error!("{}", self);
                HttpResponse::GatewayTimeout().json(serde_json::json!({
                    "error": self.to_string(),
                    "retriable": true,
                }))
            }
            AppError::Store(error) => {
                log::error!("Store error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }
            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
