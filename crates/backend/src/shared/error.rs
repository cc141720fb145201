use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::shared::error::{ApiErrorBody, CatalogError, ErrorKind};
use thiserror::Error;

/// Error returned by every handler; rendered as [`ApiErrorBody`] JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Catalog(CatalogError::Validation(message.into()))
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ApiError::Catalog(CatalogError::not_found(what))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Catalog(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::CyclicHierarchy | ErrorKind::DuplicateIdentifier => {
                    StatusCode::CONFLICT
                }
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Http | ErrorKind::Transport => StatusCode::BAD_GATEWAY,
                ErrorKind::Decode => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ApiErrorBody {
        match self {
            ApiError::Catalog(err) => err.to_body(),
            // Internal details stay in the server log
            ApiError::Database(_) | ApiError::Internal(_) => ApiErrorBody {
                kind: ErrorKind::Http,
                message: "internal server error".to_string(),
                ids: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("request rejected ({}): {}", status.as_u16(), self);
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::error::TreeError;

    #[test]
    fn test_status_per_kind() {
        assert_eq!(
            ApiError::validation("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(CatalogError::cyclic(vec![1.into(), 1.into()])).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CatalogError::Tree(TreeError::DuplicateIdentifier(1.into()))).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CatalogError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let body = ApiError::from(anyhow::anyhow!("secret path /etc")).body();
        assert_eq!(body.message, "internal server error");
    }
}
