use axum::{extract::Request, middleware::Next, response::Response};

use agora_types::UserId;

use crate::error::AppError;

/// Set by the session layer in front of this service once it has resolved
/// the caller's session token to a user id.
pub const USER_HEADER: &str = "x-user-id";

/// The resolved caller, available to handlers as `Extension<Caller>`.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

/// Reject requests that carry no usable caller identity.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, AppError> {
    let user: UserId = req
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or(AppError::Unauthorized)?;

    req.extensions_mut().insert(Caller(user));
    Ok(next.run(req).await)
}
