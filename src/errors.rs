use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use derive_more::derive::{Display, Error as DeriveMoreError};
use validator::ValidationErrors;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError{
    #[error("Cant bind to the Socket")]
    SocketBind,
    #[error("Cant connect to the DB")]
    DbConnect,
    #[error("Cant run the DB migrations")]
    Migration,
    #[error("Cant start the server")]
    ServerStart,
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("Payment provider error")]
    PaymentProvider(String),
    #[error("Payments are not configured")]
    PaymentUnavailable,
    #[error("Internal Server Error")]
    Database(#[from] sqlx::Error),
    #[error("Internal Server Error")]
    InternalError
}

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Display, DeriveMoreError, Serialize, Deserialize)]
#[display("error :{}", error)]
pub struct CustomError{
    pub error:String
}

impl CustomError {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        // errors() also carries nested struct and list failures
        let mut fields = errors
            .errors()
            .keys()
            .map(|field| field.to_string())
            .collect::<Vec<_>>();
        fields.sort();
        AppError::Validation(format!("Invalid fields: {}", fields.join(", ")))
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Database(e) => tracing::error!(error = %e, "database error"),
            AppError::PaymentProvider(e) => tracing::error!(error = %e, "payment provider error"),
            _ => {}
        }
        HttpResponse::build(self.status_code()).json(CustomError::new(self.to_string()))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::PaymentUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DbConnect
            | AppError::Migration
            | AppError::ServerStart
            | AppError::SocketBind
            | AppError::Config(_)
            | AppError::Database(_)
            | AppError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn test_database_errors_are_not_leaked(){
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: CustomError = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "Internal Server Error");
    }

    #[test]
    fn test_status_mapping(){
        assert_eq!(AppError::NotFound("Course not found").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("nope").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("busy").status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::PaymentUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::PaymentProvider("timeout".into()).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_nested_validation_errors_are_named(){
        use validator::Validate;

        use crate::schema::lecture::{EditLecture, VideoInfo};

        let body = EditLecture{
            video_info: Some(VideoInfo{video_url: "ftp//nope".to_string(), public_id: None}),
            ..Default::default()
        };

        let err = AppError::from(body.validate().unwrap_err());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Invalid fields: video"), "{err}");
    }
}
