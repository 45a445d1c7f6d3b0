use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::core::app_error::AppError;
use crate::core::token::{self, Claims};

fn claims_from_headers(headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

    token::verify(token).map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
}

/// Requires a bearer token with the admin role; attaches the decoded
/// claims as a request extension.
pub async fn admin_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    let claims = claims_from_headers(req.headers())?;
    if claims.role != "admin" {
        return Err(AppError::ForbiddenResource("Admin token required".into()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
