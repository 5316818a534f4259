use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("{}", limit_message(.remaining))]
    LimitExceeded { remaining: i64 },

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Payment gateway error")]
    Gateway(#[from] reqwest::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

fn limit_message(remaining: &i64) -> String {
    if *remaining <= 0 {
        "Maximum order limit reached for this asset".to_string()
    } else {
        format!("Order limit exceeded. You can only add {remaining} more of this asset")
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<i64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::LimitExceeded { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let remaining = match &self {
            AppError::LimitExceeded { remaining } => Some((*remaining).max(0)),
            _ => None,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                remaining,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_message_never_reports_negative_remaining() {
        let err = AppError::LimitExceeded { remaining: -3 };
        assert_eq!(err.to_string(), "Maximum order limit reached for this asset");

        let err = AppError::LimitExceeded { remaining: 0 };
        assert_eq!(err.to_string(), "Maximum order limit reached for this asset");
    }

    #[test]
    fn limit_message_reports_remaining_quantity() {
        let err = AppError::LimitExceeded { remaining: 2 };
        assert!(err.to_string().contains("only add 2 more"));
    }

    #[test]
    fn not_found_names_the_record() {
        assert_eq!(AppError::NotFound("Asset").to_string(), "Asset not found");
    }
}
