use crate::AppState;
use crate::api::error::AppError;
use crate::utils::auth::validate_jwt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

/// Resolves the acting user from a bearer token (header or `?token=`) and
/// stores its `Claims` in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let token = if let Some(t) = auth_header {
        Some(t)
    } else {
        // Try query parameter
        let query = req.uri().query().unwrap_or_default();
        serde_urlencoded::from_str::<AuthQuery>(query)
            .ok()
            .and_then(|q| q.token)
    };

    let token = token.ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;
    let claims = validate_jwt(&token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
