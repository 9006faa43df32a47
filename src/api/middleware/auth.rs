use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    api::state::AppState,
    error::AppError,
};

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Pulls the admin secret from `Authorization: Bearer <secret>` or, failing
/// that, from the `X-Admin-Password` header.
fn presented_secret(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    bearer.or_else(|| {
        headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    })
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let secret = presented_secret(request.headers()).ok_or(AppError::Unauthorized)?;

    let grant = state.service_context.admin_gate.authorize(secret)?;

    tracing::debug!("Admin request authorized: {} {}", request.method(), request.uri().path());

    // Handlers take the grant as proof of authorization
    request.extensions_mut().insert(grant);

    Ok(next.run(request).await)
}
