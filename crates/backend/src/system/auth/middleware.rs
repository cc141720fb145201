use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use contracts::shared::error::CatalogError;

use crate::shared::error::ApiError;
use crate::shared::state::AppState;

/// Requires `Authorization: Bearer <token>` with one of the configured
/// tokens. Passes everything through when no tokens are configured.
pub async fn require_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.auth.is_enabled() {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if state.auth.accepts(token) => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Rejected request to {} with unknown token", req.uri().path());
            Err(CatalogError::Unauthorized.into())
        }
        None => Err(CatalogError::Unauthorized.into()),
    }
}
