//! mediashare/crates/ms-api/src/middleware.rs Middleware
//!
//! Request logging, CORS, and caller identification.

use crate::error::ApiError;
use crate::handlers::AppState;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::HttpRequest;
use ms_core::error::AppError;
use ms_core::models::User;
use uuid::Uuid;

/// Set by the upstream authentication layer to the id of the signed-in user.
pub const USER_ID_HEADER: &str = "X-User-Id";

// Returns a standard set of middleware for the Mediashare API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header(USER_ID_HEADER)
        .max_age(3600)
}

/// The signed-in user, if the request names one.
///
/// A header that is present but malformed, or that names nobody, is an
/// error rather than an anonymous request.
pub async fn optional_user(req: &HttpRequest, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(raw) = req.headers().get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let id = raw
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;
    Ok(Some(state.users.resolve(id).await?))
}

pub async fn require_user(req: &HttpRequest, state: &AppState) -> Result<User, ApiError> {
    optional_user(req, state)
        .await?
        .ok_or_else(|| AppError::Unauthorized("sign in required".into()).into())
}
