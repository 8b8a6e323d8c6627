use actix_web::HttpResponse;
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    // === APPLICATION ERRORS ===
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    /// Operational misconfiguration. The caller sees a generic 500; the
    /// specific missing key only reaches the server log.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure of an external provider call. `public` is the static message
    /// returned to the caller; `detail` is logged server-side only.
    #[error("{public}")]
    Upstream { public: String, detail: String },

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Wraps a provider failure so the caller only ever sees `public`.
    pub fn upstream(public: &str, detail: impl std::fmt::Display) -> Self {
        AppError::Upstream {
            public: public.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        match self {
            // === CONVERSION ERRORS ===
            // Raw provider and infrastructure errors never serialize into a
            // response body. Log and normalize.
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
            AppError::Jwt(error) => {
                log::error!("Token error: {}", error);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
            AppError::Reqwest(error) => {
                log::error!("Reqwest error: {}", error);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
            AppError::Stripe(error) => {
                log::error!("Stripe error: {}", error);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }

            // === APPLICATION ERRORS ===
            AppError::Unauthorized(message) => {
                HttpResponse::Unauthorized().json(serde_json::json!({ "error": message }))
            }
            AppError::BadRequest(message) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
            }

            AppError::Config(detail) => {
                log::error!("Configuration error: {}", detail);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
            AppError::Upstream { public, detail } => {
                log::error!("Upstream failure: {}", detail);
                HttpResponse::InternalServerError().json(serde_json::json!({ "error": public }))
            }
            AppError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
