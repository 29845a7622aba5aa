//! Application error type shared by every handler.
//!
//! Errors carry a category used for logging and map onto HTTP responses:
//! missing rows become 404s, failed role checks become redirects or 403s,
//! and everything else is a 500 with the detail kept out of the body.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("login required")]
    LoginRequired,

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    #[error("insufficient payment: {paid_cents} tendered against a total of {total_cents}")]
    InsufficientPayment { total_cents: i64, paid_cents: i64 },

    #[error("nothing to sell")]
    EmptySale,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Error category used in structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::LoginRequired | AppError::Forbidden => "access",
            AppError::Validation(_) => "validation",
            AppError::InsufficientStock { .. }
            | AppError::InsufficientPayment { .. }
            | AppError::EmptySale => "sale_rejected",
            AppError::Database(_) => "database",
            AppError::Template(_) => "template",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired => StatusCode::SEE_OTHER,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_)
            | AppError::InsufficientStock { .. }
            | AppError::InsufficientPayment { .. }
            | AppError::EmptySale => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::LoginRequired => return Redirect::to("/login").into_response(),
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                tracing::error!(category = self.category(), error = %self, "request failed");
            }
            _ => {
                tracing::debug!(category = self.category(), error = %self, "request rejected");
            }
        }

        let body = match &self {
            AppError::NotFound(what) => format!("<h1>404</h1><p>{what} not found</p>"),
            AppError::Forbidden => "<h1>403</h1><p>No tienes permiso para esta página</p>".into(),
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                "<h1>500</h1><p>Error interno del servidor</p>".into()
            }
            other => format!("<h1>Error</h1><p>{other}</p>"),
        };

        (self.status(), Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_cover_every_variant() {
        assert_eq!(AppError::NotFound("product").category(), "not_found");
        assert_eq!(AppError::Forbidden.category(), "access");
        assert_eq!(AppError::EmptySale.category(), "sale_rejected");
        assert_eq!(
            AppError::Validation("price".into()).category(),
            "validation"
        );
    }

    #[test]
    fn statuses_match_semantics() {
        assert_eq!(AppError::NotFound("order").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InsufficientPayment {
                total_cents: 5000,
                paid_cents: 1000
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
